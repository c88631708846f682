use super::FacingMode;
use crate::error::DeviceError;
use crate::media::VideoFrame;
use async_trait::async_trait;

/// A source of live video streams, one per facing mode
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Open a stream constrained to `facing`
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, DeviceError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// A live stream. Only [`super::StreamHandle`] calls `stop`.
pub trait VideoStream: Send + Sync {
    /// Negotiated resolution, 0x0 until the first frame arrives
    fn dimensions(&self) -> (u32, u32);

    /// Latest frame at native resolution
    fn read_frame(&mut self) -> Result<VideoFrame, DeviceError>;

    /// Stop every track of the stream
    fn stop(&mut self);
}
