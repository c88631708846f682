use serde::{Deserialize, Serialize};
use std::fmt;

/// Active input method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Text,
    Image,
    Camera,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Text => "text",
            Mode::Image => "image",
            Mode::Camera => "camera",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera mode sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraView {
    /// Live preview, or an empty preview when acquisition failed
    Previewing,
    /// A still is held and the stream is released
    Captured,
}
