use super::ScannerBuilder;
use crate::analysis::{AnalysisOrchestrator, PendingAnalysis, RequestState};
use crate::config::ScannerConfig;
use crate::controller::{InputModeController, Mode};
use crate::error::{AnalysisError, Result};
use crate::events::{EventBus, EventFilter, EventReceiver, ScannerEvent};
use crate::intake::{DragEvent, IncomingFile, IntakeOutcome};
use crate::render::ResultRenderer;
use tokio::sync::broadcast;
use tracing::debug;

/// Input controller, analysis orchestrator and renderer behind one handle
pub struct Scanner {
    pub(super) config: ScannerConfig,
    pub(super) event_bus: EventBus,
    pub(super) controller: InputModeController,
    pub(super) orchestrator: AnalysisOrchestrator,
    pub(super) renderer: Box<dyn ResultRenderer>,
}

impl Scanner {
    pub fn builder(config: ScannerConfig) -> ScannerBuilder {
        ScannerBuilder::new(config)
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScannerEvent> {
        self.event_bus.subscribe()
    }

    /// Named subscription that only yields events passing `filter`
    pub fn event_receiver(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.event_bus.subscribe(), filter, name.to_string())
    }

    pub fn controller(&self) -> &InputModeController {
        &self.controller
    }

    pub fn orchestrator(&self) -> &AnalysisOrchestrator {
        &self.orchestrator
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    /// Switch mode. A real change also invalidates any result or request in flight.
    pub async fn set_mode(&mut self, mode: Mode) -> bool {
        let changed = self.controller.set_mode(mode).await;
        if changed {
            self.orchestrator.invalidate();
        }
        changed
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.controller.set_text(text);
    }

    pub async fn flip_facing(&mut self) {
        self.controller.flip_facing().await;
    }

    pub async fn capture(&mut self) -> Result<()> {
        self.controller.capture().await
    }

    pub async fn recapture(&mut self) {
        self.controller.recapture().await;
    }

    pub async fn handle_drag(&mut self, event: DragEvent) -> Option<IntakeOutcome> {
        self.controller.handle_drag(event).await
    }

    pub async fn pick_file(&mut self, file: IncomingFile) -> IntakeOutcome {
        self.controller.pick_file(file).await
    }

    pub fn clear_uploaded_image(&mut self) {
        self.controller.clear_uploaded_image();
    }

    pub fn can_analyze(&self) -> bool {
        self.orchestrator.can_analyze(&self.controller)
    }

    /// Analyze the active mode's input and wait for the verdict
    pub async fn analyze(&mut self) -> std::result::Result<String, AnalysisError> {
        self.orchestrator.analyze(&self.controller).await
    }

    /// Dispatch without waiting; input stays mutable while the request runs
    pub fn submit(&mut self) -> std::result::Result<PendingAnalysis, AnalysisError> {
        self.orchestrator.submit(&self.controller)
    }

    /// Apply a submitted request's response. Returns false if the input
    /// context changed since it was submitted.
    pub async fn complete(&mut self, pending: PendingAnalysis) -> bool {
        self.orchestrator.finish(pending).await
    }

    pub fn state(&self) -> RequestState {
        self.orchestrator.state()
    }

    pub fn result(&self) -> Option<&str> {
        self.orchestrator.result()
    }

    pub fn render_result(&self) -> Option<String> {
        self.orchestrator
            .result()
            .map(|narrative| self.renderer.render(narrative))
    }

    /// Most recent user-facing error, analysis errors first
    pub fn last_error(&self) -> Option<String> {
        if let Some(error) = self.orchestrator.last_error() {
            return Some(error.to_string());
        }
        self.controller.last_error().map(str::to_string)
    }

    pub(super) fn log_state(&self) {
        debug!(
            "Scanner state: mode={}, request={:?}, streaming={}",
            self.controller.mode(),
            self.orchestrator.state(),
            self.controller.is_streaming()
        );
    }
}
