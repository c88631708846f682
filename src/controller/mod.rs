mod input;
mod types;

pub use input::InputModeController;
pub use types::{CameraView, Mode};
