use crate::camera::FacingMode;
use crate::controller::Mode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera error: {0}")]
    Device(#[from] DeviceError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),
}

/// Failures acquiring or reading the live camera stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Permission denied for {facing} camera")]
    PermissionDenied { facing: FacingMode },

    #[error("No {facing} camera available: {details}")]
    NotFound { facing: FacingMode, details: String },

    #[error("Camera stream is not producing frames yet")]
    NotReady,

    #[error("No camera stream is open")]
    NoStream,

    #[error("Camera backend failure: {details}")]
    Backend { details: String },
}

/// Failures turning files or frames into data URIs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Failed to read file {name}: {details}")]
    Read { name: String, details: String },

    #[error("Failed to encode still image: {details}")]
    Encode { details: String },

    #[error("Malformed data URI: {details}")]
    InvalidDataUri { details: String },

    #[error("Frame data size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },
}

/// Failures of the outbound analysis call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Transport failure: {details}")]
    Transport { details: String },

    #[error("Analysis service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed analysis response: {details}")]
    Protocol { details: String },

    #[error("No input to analyze in {mode} mode")]
    MissingInput { mode: Mode },

    #[error("An analysis request is already in flight")]
    Busy,

    #[error("Analysis task aborted: {details}")]
    Aborted { details: String },
}

impl AnalysisError {
    /// Transport and protocol failures are reported the same way
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AnalysisError::Transport { .. }
                | AnalysisError::Status { .. }
                | AnalysisError::Protocol { .. }
        )
    }
}

/// Failures of the API key store and verification flow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("API key is empty")]
    Empty,

    #[error("API key rejected: {reason}")]
    Rejected { reason: String },

    #[error("Failed to verify API key: {details}")]
    Verification { details: String },

    #[error("Key storage failure: {details}")]
    Storage { details: String },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Receiver lagged behind by {missed} events")]
    Lagged { missed: u64 },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ScannerError>;
