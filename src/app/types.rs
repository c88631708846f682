use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Camera implementation selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackend {
    #[default]
    Mock,
    Gstreamer,
}

impl fmt::Display for CameraBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraBackend::Mock => write!(f, "mock"),
            CameraBackend::Gstreamer => write!(f, "gstreamer"),
        }
    }
}

impl FromStr for CameraBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(CameraBackend::Mock),
            "gstreamer" | "gst" | "v4l2" => Ok(CameraBackend::Gstreamer),
            other => Err(format!("unknown camera backend: {}", other)),
        }
    }
}
