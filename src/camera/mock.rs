use super::{CameraDevice, FacingMode, VideoStream};
use crate::error::DeviceError;
use crate::media::{FrameFormat, VideoFrame};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// How the mock device answers the next `open`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Stream synthetic RGB frames at the given resolution
    Ready { width: u32, height: u32 },
    /// Open succeeds but frames report 0x0
    NotReady,
    /// The user refused camera access
    PermissionDenied,
    /// No camera matches the requested facing mode
    NoDevice,
}

#[derive(Debug)]
struct MockState {
    behavior: Mutex<MockBehavior>,
    opened: AtomicUsize,
    active: Arc<AtomicUsize>,
    last_facing: Mutex<Option<FacingMode>>,
}

/// Camera device producing a synthetic gradient, for tests and the CLI `mock` backend
#[derive(Debug, Clone)]
pub struct MockCameraDevice {
    state: Arc<MockState>,
}

impl MockCameraDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_behavior(MockBehavior::Ready { width, height })
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            state: Arc::new(MockState {
                behavior: Mutex::new(behavior),
                opened: AtomicUsize::new(0),
                active: Arc::new(AtomicUsize::new(0)),
                last_facing: Mutex::new(None),
            }),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.state.behavior.lock() = behavior;
    }

    /// Number of successful opens so far
    pub fn open_count(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet stopped
    pub fn active_streams(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    pub fn last_facing(&self) -> Option<FacingMode> {
        *self.state.last_facing.lock()
    }
}

impl Default for MockCameraDevice {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

#[async_trait]
impl CameraDevice for MockCameraDevice {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, DeviceError> {
        let behavior = *self.state.behavior.lock();
        *self.state.last_facing.lock() = Some(facing);

        let (width, height) = match behavior {
            MockBehavior::Ready { width, height } => (width, height),
            MockBehavior::NotReady => (0, 0),
            MockBehavior::PermissionDenied => {
                return Err(DeviceError::PermissionDenied { facing });
            }
            MockBehavior::NoDevice => {
                return Err(DeviceError::NotFound {
                    facing,
                    details: "mock device has no matching camera".to_string(),
                });
            }
        };

        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.active.fetch_add(1, Ordering::SeqCst);
        debug!("Mock {} camera opened ({}x{})", facing, width, height);

        Ok(Box::new(MockStream {
            width,
            height,
            frame_counter: 0,
            active: Arc::clone(&self.state.active),
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockStream {
    width: u32,
    height: u32,
    frame_counter: u64,
    active: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for MockStream {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<VideoFrame, DeviceError> {
        if self.stopped {
            return Err(DeviceError::NoStream);
        }

        let frame_id = self.frame_counter;
        self.frame_counter += 1;
        let (width, height) = (self.width, self.height);

        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.push(((x as u64 + frame_id) % 256) as u8);
                data.push((y % 256) as u8);
                data.push((frame_id % 256) as u8);
            }
        }

        trace!("Generated mock frame {} ({}x{})", frame_id, width, height);
        Ok(VideoFrame::new(data, width, height, FrameFormat::Rgb24))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
