use super::{CameraView, Mode};
use crate::camera::{CameraSession, FacingMode};
use crate::error::{DeviceError, Result, ScannerError};
use crate::events::{EventBus, ScannerEvent};
use crate::intake::{DragEvent, DropZone, FileIntake, IncomingFile, IntakeOutcome, RejectedKind};
use crate::media::DataUri;
use tracing::{debug, info, warn};

/// Coordinates the Text / Image / Camera input modes.
///
/// Owns the camera session. Every transition ends in [`Self::sync_camera`],
/// which opens the stream only in Camera mode with no still held and
/// releases it otherwise.
pub struct InputModeController {
    mode: Mode,
    text: String,
    uploaded: Option<DataUri>,
    captured: Option<DataUri>,
    facing: FacingMode,
    session: CameraSession,
    intake: FileIntake,
    drop_zone: DropZone,
    device_error: Option<DeviceError>,
    last_error: Option<String>,
    event_bus: EventBus,
}

impl InputModeController {
    pub fn new(
        session: CameraSession,
        intake: FileIntake,
        facing: FacingMode,
        event_bus: EventBus,
    ) -> Self {
        Self {
            mode: Mode::Text,
            text: String::new(),
            uploaded: None,
            captured: None,
            facing,
            session,
            intake,
            drop_zone: DropZone::new(),
            device_error: None,
            last_error: None,
            event_bus,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn uploaded_image(&self) -> Option<&DataUri> {
        self.uploaded.as_ref()
    }

    pub fn captured_still(&self) -> Option<&DataUri> {
        self.captured.as_ref()
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Camera sub-state, `None` outside Camera mode
    pub fn camera_view(&self) -> Option<CameraView> {
        match (self.mode, &self.captured) {
            (Mode::Camera, Some(_)) => Some(CameraView::Captured),
            (Mode::Camera, None) => Some(CameraView::Previewing),
            _ => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_open()
    }

    pub fn stream_dimensions(&self) -> Option<(u32, u32)> {
        self.session.dimensions()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drop_zone.is_drag_active()
    }

    /// Last camera failure since the mode was entered
    pub fn device_error(&self) -> Option<&DeviceError> {
        self.device_error.as_ref()
    }

    /// Message for the user-facing error slot
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the active mode's buffer holds something to analyze
    pub fn has_input(&self) -> bool {
        match self.mode {
            Mode::Text => !self.text.is_empty(),
            Mode::Image => self.uploaded.is_some(),
            Mode::Camera => self.captured.is_some(),
        }
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }

    /// Switch input mode. Returns false when `mode` is already active.
    pub async fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            debug!("Mode {} already active", mode);
            return false;
        }

        let from = self.mode;
        if from == Mode::Camera {
            self.session.release();
        }

        match mode {
            Mode::Camera => self.uploaded = None,
            Mode::Text | Mode::Image => self.captured = None,
        }

        self.mode = mode;
        self.device_error = None;
        self.last_error = None;
        self.drop_zone.reset();

        info!("Input mode changed: {} -> {}", from, mode);
        self.event_bus
            .notify(ScannerEvent::ModeChanged { from, to: mode });

        self.sync_camera().await;
        true
    }

    /// Toggle front/back camera, reopening the preview if one is showing
    pub async fn flip_facing(&mut self) {
        self.session.release();
        self.facing = self.facing.flipped();
        info!("Camera facing mode set to {}", self.facing);

        self.sync_camera().await;
    }

    /// Capture the live frame into the still buffer.
    ///
    /// With a still already held this keeps it; use [`Self::recapture`] to retake.
    pub async fn capture(&mut self) -> Result<()> {
        if self.mode != Mode::Camera {
            return Err(DeviceError::NoStream.into());
        }
        if self.captured.is_some() {
            debug!("Capture ignored, a still is already held");
            return Ok(());
        }

        match self.session.capture_still().await {
            Ok(still) => {
                self.captured = Some(still);
                self.last_error = None;
                Ok(())
            }
            Err(ScannerError::Device(e)) => {
                self.record_device_error(e.clone());
                Err(e.into())
            }
            Err(e) => {
                warn!("Capture failed: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the still and go back to a live preview
    pub async fn recapture(&mut self) {
        if self.mode != Mode::Camera {
            debug!("Recapture ignored in {} mode", self.mode);
            return;
        }

        self.captured = None;
        self.last_error = None;
        self.device_error = None;
        self.sync_camera().await;
    }

    /// Feed a drag event to the drop surface.
    ///
    /// Returns the intake outcome for drops, `None` for highlight changes.
    pub async fn handle_drag(&mut self, event: DragEvent) -> Option<IntakeOutcome> {
        let is_drop = matches!(event, DragEvent::Drop(_));

        if self.mode != Mode::Image {
            return is_drop.then(|| self.reject(None, RejectedKind::WrongMode { mode: self.mode }));
        }

        match self.drop_zone.handle(event) {
            Some(file) => Some(self.ingest(file).await),
            None if is_drop => Some(self.reject(None, RejectedKind::Empty)),
            None => None,
        }
    }

    /// File chosen through the picker
    pub async fn pick_file(&mut self, file: IncomingFile) -> IntakeOutcome {
        if self.mode != Mode::Image {
            return self.reject(Some(file.name), RejectedKind::WrongMode { mode: self.mode });
        }

        self.ingest(file).await
    }

    pub fn clear_uploaded_image(&mut self) {
        if self.uploaded.take().is_some() {
            debug!("Uploaded image cleared");
        }
    }

    /// Release the camera before the owner goes away
    pub fn shutdown(&mut self) {
        self.session.release();
    }

    async fn ingest(&mut self, file: IncomingFile) -> IntakeOutcome {
        let name = file.name.clone();
        let outcome = self.intake.accept(file).await;

        match &outcome {
            IntakeOutcome::Accepted(uri) => {
                self.uploaded = Some(uri.clone());
                self.last_error = None;
                self.event_bus.notify(ScannerEvent::ImageAccepted {
                    name,
                    mime_type: uri.mime_type().to_string(),
                });
            }
            IntakeOutcome::Rejected(kind) => {
                if matches!(
                    kind,
                    RejectedKind::DecodeFailed(_) | RejectedKind::TooLarge { .. }
                ) {
                    self.last_error = Some(format!("Could not use {}: {}", name, kind));
                }
                self.event_bus.notify(ScannerEvent::IntakeRejected {
                    name,
                    reason: kind.to_string(),
                });
            }
        }

        outcome
    }

    fn reject(&self, name: Option<String>, kind: RejectedKind) -> IntakeOutcome {
        debug!("Intake rejected: {}", kind);
        self.event_bus.notify(ScannerEvent::IntakeRejected {
            name: name.unwrap_or_default(),
            reason: kind.to_string(),
        });
        IntakeOutcome::Rejected(kind)
    }

    async fn sync_camera(&mut self) {
        if self.mode == Mode::Camera && self.captured.is_none() {
            match self.session.acquire(self.facing).await {
                Ok(()) => self.device_error = None,
                Err(e) => self.record_device_error(e),
            }
        } else {
            self.session.release();
        }
    }

    fn record_device_error(&mut self, error: DeviceError) {
        debug!("Camera unavailable: {}", error);
        self.last_error = Some(error.to_string());
        self.event_bus.notify(ScannerEvent::DeviceFailed {
            error: error.to_string(),
        });
        self.device_error = Some(error);
    }
}

impl Drop for InputModeController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
