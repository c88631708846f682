mod data_uri;
mod decoder;
mod frame;

pub use data_uri::DataUri;
pub use decoder::MediaDecoder;
pub use frame::{FrameFormat, VideoFrame};
