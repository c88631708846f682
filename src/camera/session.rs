use super::{CameraDevice, FacingMode, VideoStream};
use crate::error::{DeviceError, Result};
use crate::events::{EventBus, ScannerEvent};
use crate::media::{DataUri, MediaDecoder};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sole owner of an open stream.
///
/// Stopping happens in exactly one place, [`StreamHandle::stop`], which both
/// [`CameraSession::release`] and `Drop` call.
pub struct StreamHandle {
    facing: FacingMode,
    stream: Box<dyn VideoStream>,
    stopped: bool,
}

impl StreamHandle {
    fn new(facing: FacingMode, stream: Box<dyn VideoStream>) -> Self {
        Self {
            facing,
            stream,
            stopped: false,
        }
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.stream.dimensions()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stream.stop();
            self.stopped = true;
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if !self.stopped {
            warn!("{} camera stream dropped while open, stopping", self.facing);
            self.stop();
        }
    }
}

/// Acquires, captures from and releases the live camera stream
pub struct CameraSession {
    device: Arc<dyn CameraDevice>,
    decoder: MediaDecoder,
    event_bus: EventBus,
    stream: Option<StreamHandle>,
}

impl CameraSession {
    pub fn new(device: Arc<dyn CameraDevice>, decoder: MediaDecoder, event_bus: EventBus) -> Self {
        Self {
            device,
            decoder,
            event_bus,
            stream: None,
        }
    }

    /// Open a stream for `facing`, releasing any stream already held first
    pub async fn acquire(&mut self, facing: FacingMode) -> std::result::Result<(), DeviceError> {
        self.release();

        info!(
            "Opening {} camera via {} backend",
            facing,
            self.device.name()
        );

        let stream = self.device.open(facing).await.map_err(|e| {
            warn!("Failed to open {} camera: {}", facing, e);
            e
        })?;

        let handle = StreamHandle::new(facing, stream);
        let (width, height) = handle.dimensions();
        self.stream = Some(handle);

        info!("{} camera streaming at {}x{}", facing, width, height);
        self.event_bus.notify(ScannerEvent::CameraAcquired {
            facing,
            width,
            height,
        });

        Ok(())
    }

    /// Stop the held stream. No-op when nothing is held.
    pub fn release(&mut self) {
        if let Some(mut handle) = self.stream.take() {
            handle.stop();
            info!("{} camera released", handle.facing());
            self.event_bus.notify(ScannerEvent::CameraReleased {
                facing: handle.facing(),
            });
        } else {
            debug!("Camera release requested with no open stream");
        }
    }

    /// Capture the current frame as a JPEG still, then release the stream.
    ///
    /// The stream is kept open when the frame has no dimensions yet or when
    /// encoding fails.
    pub async fn capture_still(&mut self) -> Result<DataUri> {
        let handle = self.stream.as_mut().ok_or(DeviceError::NoStream)?;
        let frame = handle.stream.read_frame()?;

        if !frame.has_dimensions() {
            debug!("Capture requested before the stream produced a frame");
            return Err(DeviceError::NotReady.into());
        }

        let (width, height) = (frame.width, frame.height);
        let still = self.decoder.encode_frame_async(frame).await?;

        self.release();

        info!("Captured {}x{} still", width, height);
        self.event_bus.notify(ScannerEvent::StillCaptured {
            bytes: still.payload().len(),
        });

        Ok(still)
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Facing mode of the open stream
    pub fn facing(&self) -> Option<FacingMode> {
        self.stream.as_ref().map(StreamHandle::facing)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().map(StreamHandle::dimensions)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}
