mod device;
#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst;
pub mod mock;
mod session;
mod types;

pub use device::{CameraDevice, VideoStream};
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst::GstCameraDevice;
pub use mock::{MockBehavior, MockCameraDevice};
pub use session::{CameraSession, StreamHandle};
pub use types::FacingMode;
