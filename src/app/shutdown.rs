use super::Scanner;
use tracing::info;

impl Scanner {
    /// Release the camera and orphan any request still in flight
    pub fn shutdown(&mut self) {
        info!("Shutting down scanner");

        self.controller.shutdown();
        if self.orchestrator.is_busy() {
            info!("Discarding in-flight analysis");
        }
        self.orchestrator.invalidate();

        self.log_state();
    }
}

