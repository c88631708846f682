use super::{DataUri, FrameFormat, VideoFrame};
use crate::error::DecodeError;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use tracing::{debug, trace};

/// Turns uploaded bytes and video frames into data URIs
#[derive(Debug, Clone, Copy)]
pub struct MediaDecoder {
    jpeg_quality: u8,
}

impl MediaDecoder {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Base64-encode file contents off the async worker threads
    pub async fn encode_bytes(
        &self,
        mime_type: String,
        bytes: Vec<u8>,
    ) -> Result<DataUri, DecodeError> {
        let len = bytes.len();
        let uri = tokio::task::spawn_blocking(move || DataUri::from_bytes(&mime_type, &bytes))
            .await
            .map_err(|e| DecodeError::Encode {
                details: format!("encoding task failed: {}", e),
            })?;

        trace!("Encoded {} bytes as {}", len, uri.mime_type());
        Ok(uri)
    }

    /// Encode a frame as a lossy JPEG still at its native resolution
    pub fn encode_frame(&self, frame: &VideoFrame) -> Result<DataUri, DecodeError> {
        if !frame.has_dimensions() {
            return Err(DecodeError::Encode {
                details: "frame has zero dimensions".to_string(),
            });
        }

        if frame.format == FrameFormat::Mjpeg {
            // Already JPEG encoded
            return Ok(DataUri::from_bytes("image/jpeg", &frame.data));
        }

        let rgb = frame.to_rgb24()?;
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
        encoder
            .encode(&rgb, frame.width, frame.height, ColorType::Rgb8)
            .map_err(|e| DecodeError::Encode {
                details: e.to_string(),
            })?;

        debug!(
            "Encoded {}x{} {:?} frame to {} byte JPEG (quality {})",
            frame.width,
            frame.height,
            frame.format,
            buf.len(),
            self.jpeg_quality
        );

        Ok(DataUri::from_bytes("image/jpeg", &buf))
    }

    /// `encode_frame` on the blocking pool
    pub async fn encode_frame_async(&self, frame: VideoFrame) -> Result<DataUri, DecodeError> {
        let decoder = *self;
        tokio::task::spawn_blocking(move || decoder.encode_frame(&frame))
            .await
            .map_err(|e| DecodeError::Encode {
                details: format!("encoding task failed: {}", e),
            })?
    }
}

impl Default for MediaDecoder {
    fn default() -> Self {
        Self::new(92)
    }
}
