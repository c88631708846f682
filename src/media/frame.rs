use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Frame format enumeration supporting different video formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Motion JPEG format - compressed JPEG frames
    Mjpeg,
    /// YUV 4:2:2 format - uncompressed YUV data
    Yuyv,
    /// RGB24 format - uncompressed RGB data
    Rgb24,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Mjpeg => 0, // Variable size, compressed
            FrameFormat::Yuyv => 2,
            FrameFormat::Rgb24 => 3,
        }
    }

    /// Check if format is compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, FrameFormat::Mjpeg)
    }
}

/// A single frame read from a live stream
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Timestamp when frame was read
    pub timestamp: SystemTime,
    /// Raw frame data
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    pub format: FrameFormat,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: FrameFormat) -> Self {
        Self {
            timestamp: SystemTime::now(),
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// A stream that has not negotiated its resolution reports 0x0
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Get the expected frame size for uncompressed formats
    pub fn expected_size(&self) -> Option<usize> {
        if self.format.is_compressed() {
            None
        } else {
            Some(self.width as usize * self.height as usize * self.format.bytes_per_pixel())
        }
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> Result<(), DecodeError> {
        match self.expected_size() {
            Some(expected) if self.data.len() != expected => Err(DecodeError::FrameSize {
                expected,
                actual: self.data.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Packed RGB24 pixels for uncompressed formats
    pub fn to_rgb24(&self) -> Result<Vec<u8>, DecodeError> {
        self.validate_size()?;

        match self.format {
            FrameFormat::Rgb24 => Ok(self.data.as_ref().clone()),
            FrameFormat::Yuyv => Ok(yuyv_to_rgb24(&self.data)),
            FrameFormat::Mjpeg => Err(DecodeError::Encode {
                details: "MJPEG frames are already encoded".to_string(),
            }),
        }
    }
}

/// BT.601 conversion, two pixels per Y0 U Y1 V macropixel
fn yuyv_to_rgb24(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 2 * 3);

    for chunk in data.chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;

        for y in [chunk[0], chunk[2]] {
            let y = y as f32;
            let r = y + 1.402 * v;
            let g = y - 0.344_136 * u - 0.714_136 * v;
            let b = y + 1.772 * u;
            rgb.push(r.clamp(0.0, 255.0) as u8);
            rgb.push(g.clamp(0.0, 255.0) as u8);
            rgb.push(b.clamp(0.0, 255.0) as u8);
        }
    }

    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_format_properties() {
        assert_eq!(FrameFormat::Mjpeg.bytes_per_pixel(), 0);
        assert_eq!(FrameFormat::Yuyv.bytes_per_pixel(), 2);
        assert_eq!(FrameFormat::Rgb24.bytes_per_pixel(), 3);

        assert!(FrameFormat::Mjpeg.is_compressed());
        assert!(!FrameFormat::Rgb24.is_compressed());
    }

    #[test]
    fn test_frame_size_validation() {
        let valid = VideoFrame::new(vec![0u8; 4 * 2 * 3], 4, 2, FrameFormat::Rgb24);
        assert!(valid.validate_size().is_ok());

        let invalid = VideoFrame::new(vec![0u8; 5], 4, 2, FrameFormat::Rgb24);
        assert_eq!(
            invalid.validate_size(),
            Err(DecodeError::FrameSize {
                expected: 24,
                actual: 5
            })
        );

        // Compressed frames have variable size
        let mjpeg = VideoFrame::new(vec![0u8; 100], 640, 480, FrameFormat::Mjpeg);
        assert!(mjpeg.validate_size().is_ok());
    }

    #[test]
    fn test_zero_dimensions() {
        let frame = VideoFrame::new(Vec::new(), 0, 0, FrameFormat::Rgb24);
        assert!(!frame.has_dimensions());
    }

    #[test]
    fn test_yuyv_grey_conversion() {
        // Neutral chroma keeps luma as grey
        let frame = VideoFrame::new(vec![128, 128, 64, 128], 2, 1, FrameFormat::Yuyv);
        let rgb = frame.to_rgb24().unwrap();

        assert_eq!(rgb, vec![128, 128, 128, 64, 64, 64]);
    }
}
