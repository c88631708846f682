use super::{IncomingFile, IntakeOutcome, RejectedKind};
use crate::config::IntakeConfig;
use crate::error::DecodeError;
use crate::media::MediaDecoder;
use tracing::{debug, info, warn};

const IMAGE_PREFIX: &str = "image/";

/// Validates incoming files and decodes images into data URIs
#[derive(Debug, Clone)]
pub struct FileIntake {
    decoder: MediaDecoder,
    max_bytes: Option<u64>,
}

impl FileIntake {
    pub fn new(config: &IntakeConfig, decoder: MediaDecoder) -> Self {
        Self {
            decoder,
            max_bytes: config.max_file_size_bytes(),
        }
    }

    /// Upload limit in bytes, `None` when unlimited
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Accept `file` if it is an image, decoding it asynchronously
    pub async fn accept(&self, file: IncomingFile) -> IntakeOutcome {
        let name = file.name.clone();

        let media_type = match file.media_type() {
            Some(media_type) if media_type.starts_with(IMAGE_PREFIX) => media_type,
            other => {
                debug!("Ignoring {}: media type {:?} is not an image", name, other);
                return IntakeOutcome::Rejected(RejectedKind::NotAnImage { media_type: other });
            }
        };

        if let Some(limit) = self.max_bytes {
            match file.size().await {
                Ok(size) if size > limit => {
                    info!("Rejecting {}: {} bytes exceeds {} byte limit", name, size, limit);
                    return IntakeOutcome::Rejected(RejectedKind::TooLarge { size, limit });
                }
                Ok(_) => {}
                Err(e) => return Self::read_failed(name, e),
            }
        }

        let bytes = match file.read().await {
            Ok(bytes) => bytes,
            Err(e) => return Self::read_failed(name, e),
        };

        match self.decoder.encode_bytes(media_type, bytes).await {
            Ok(uri) => {
                debug!("Accepted {} as {}", name, uri.mime_type());
                IntakeOutcome::Accepted(uri)
            }
            Err(e) => {
                warn!("Failed to encode {}: {}", name, e);
                IntakeOutcome::Rejected(RejectedKind::DecodeFailed(e))
            }
        }
    }

    fn read_failed(name: String, error: std::io::Error) -> IntakeOutcome {
        warn!("Failed to read {}: {}", name, error);
        IntakeOutcome::Rejected(RejectedKind::DecodeFailed(DecodeError::Read {
            name,
            details: error.to_string(),
        }))
    }
}
