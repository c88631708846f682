use crate::controller::Mode;
use crate::error::DecodeError;
use crate::media::DataUri;
use std::fmt;

/// Why an incoming file was not taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectedKind {
    /// Declared (or guessed) media type is not `image/*`
    NotAnImage { media_type: Option<String> },
    /// Larger than the configured upload limit
    TooLarge { size: u64, limit: u64 },
    /// Reading or encoding failed
    DecodeFailed(DecodeError),
    /// Files are only taken while Image mode is active
    WrongMode { mode: Mode },
    /// A drop event carried no files
    Empty,
}

impl fmt::Display for RejectedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectedKind::NotAnImage { media_type } => write!(
                f,
                "not an image ({})",
                media_type.as_deref().unwrap_or("unknown type")
            ),
            RejectedKind::TooLarge { size, limit } => {
                write!(f, "file is {} bytes, limit is {} bytes", size, limit)
            }
            RejectedKind::DecodeFailed(e) => write!(f, "{}", e),
            RejectedKind::WrongMode { mode } => write!(f, "uploads are closed in {} mode", mode),
            RejectedKind::Empty => f.write_str("no file dropped"),
        }
    }
}

/// Result of offering a file to intake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Accepted(DataUri),
    Rejected(RejectedKind),
}

impl IntakeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IntakeOutcome::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&DataUri> {
        match self {
            IntakeOutcome::Accepted(uri) => Some(uri),
            IntakeOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectedKind> {
        match self {
            IntakeOutcome::Accepted(_) => None,
            IntakeOutcome::Rejected(kind) => Some(kind),
        }
    }
}
