use crate::camera::FacingMode;
use crate::controller::Mode;
use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events emitted while input is collected and analyzed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScannerEvent {
    /// The active input mode changed
    ModeChanged { from: Mode, to: Mode },
    /// A live camera stream was opened
    CameraAcquired {
        facing: FacingMode,
        width: u32,
        height: u32,
    },
    /// The live camera stream was stopped
    CameraReleased { facing: FacingMode },
    /// Camera acquisition or capture failed
    DeviceFailed { error: String },
    /// A still was captured from the live stream
    StillCaptured { bytes: usize },
    /// An uploaded file was decoded into the image buffer
    ImageAccepted { name: String, mime_type: String },
    /// An uploaded file was not taken
    IntakeRejected { name: String, reason: String },
    /// An analysis request was dispatched
    AnalysisStarted { generation: u64, mode: Mode },
    /// The analysis result was stored
    AnalysisSucceeded { generation: u64 },
    /// The analysis request failed
    AnalysisFailed { generation: u64, error: String },
    /// A response arrived for input that is no longer current
    StaleResponseDiscarded { generation: u64, current: u64 },
}

impl ScannerEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            ScannerEvent::ModeChanged { from, to } => format!("Mode changed: {} -> {}", from, to),
            ScannerEvent::CameraAcquired {
                facing,
                width,
                height,
            } => format!("{} camera opened ({}x{})", facing, width, height),
            ScannerEvent::CameraReleased { facing } => format!("{} camera released", facing),
            ScannerEvent::DeviceFailed { error } => format!("Camera failure: {}", error),
            ScannerEvent::StillCaptured { bytes } => format!("Still captured ({} bytes)", bytes),
            ScannerEvent::ImageAccepted { name, mime_type } => {
                format!("Image accepted: {} ({})", name, mime_type)
            }
            ScannerEvent::IntakeRejected { name, reason } => {
                format!("Upload rejected: {} ({})", name, reason)
            }
            ScannerEvent::AnalysisStarted { generation, mode } => {
                format!("Analysis #{} started from {} input", generation, mode)
            }
            ScannerEvent::AnalysisSucceeded { generation } => {
                format!("Analysis #{} succeeded", generation)
            }
            ScannerEvent::AnalysisFailed { generation, error } => {
                format!("Analysis #{} failed: {}", generation, error)
            }
            ScannerEvent::StaleResponseDiscarded {
                generation,
                current,
            } => format!(
                "Discarded response for #{} (current generation {})",
                generation, current
            ),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ScannerEvent::ModeChanged { .. } => "mode_changed",
            ScannerEvent::CameraAcquired { .. } => "camera_acquired",
            ScannerEvent::CameraReleased { .. } => "camera_released",
            ScannerEvent::DeviceFailed { .. } => "device_failed",
            ScannerEvent::StillCaptured { .. } => "still_captured",
            ScannerEvent::ImageAccepted { .. } => "image_accepted",
            ScannerEvent::IntakeRejected { .. } => "intake_rejected",
            ScannerEvent::AnalysisStarted { .. } => "analysis_started",
            ScannerEvent::AnalysisSucceeded { .. } => "analysis_succeeded",
            ScannerEvent::AnalysisFailed { .. } => "analysis_failed",
            ScannerEvent::StaleResponseDiscarded { .. } => "stale_response_discarded",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ScannerEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<ScannerEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ScannerEvent) -> Result<usize, EventBusError> {
        match &event {
            ScannerEvent::DeviceFailed { error } => {
                warn!("Camera failure: {}", error);
            }
            ScannerEvent::AnalysisFailed { generation, error } => {
                error!("Analysis #{} failed: {}", generation, error);
            }
            ScannerEvent::AnalysisSucceeded { generation } => {
                info!("Analysis #{} succeeded", generation);
            }
            _ => {
                if self.debug_logging {
                    debug!("Event: {}", event.description());
                }
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish without caring whether anyone is listening
    pub fn notify(&self, event: ScannerEvent) {
        if let Err(e) = self.publish(event) {
            debug!("Event dropped: {}", e);
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &ScannerEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<ScannerEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(
        receiver: broadcast::Receiver<ScannerEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<ScannerEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::Lagged { missed: n });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Log each matching event until the bus closes. Failures log at warn.
    pub async fn log_until_closed(mut self) {
        loop {
            match self.recv().await {
                Ok(event) => match event {
                    ScannerEvent::DeviceFailed { .. } | ScannerEvent::AnalysisFailed { .. } => {
                        warn!("{}", event.description())
                    }
                    _ => info!("{}", event.description()),
                },
                Err(EventBusError::Lagged { .. }) => continue,
                Err(_) => break,
            }
        }
        debug!("Event logger '{}' stopped", self.name);
    }
}
