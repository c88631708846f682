pub mod analysis;
pub mod app;
pub mod camera;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod events;
pub mod intake;
pub mod media;
pub mod render;

pub use analysis::{
    AnalysisOrchestrator, AnalysisRequest, AnalysisResponse, AnalysisTransport,
    HttpAnalysisClient, PendingAnalysis, RequestState, RequestTicket,
};
pub use app::{CameraBackend, Scanner, ScannerBuilder};
pub use camera::{
    CameraDevice, CameraSession, FacingMode, MockBehavior, MockCameraDevice, StreamHandle,
    VideoStream,
};
pub use config::ScannerConfig;
pub use controller::{CameraView, InputModeController, Mode};
pub use credentials::{
    ApiKey, CredentialProvider, KeyStore, KeyVerdict, KeyVerifier, StaticCredentials,
};
pub use error::{
    AnalysisError, CredentialError, DecodeError, DeviceError, EventBusError, Result, ScannerError,
};
pub use events::{EventBus, EventFilter, EventReceiver, ScannerEvent};
pub use intake::{DragEvent, DropZone, FileIntake, IncomingFile, IntakeOutcome, RejectedKind};
pub use media::{DataUri, FrameFormat, MediaDecoder, VideoFrame};
pub use render::{PlainRenderer, ResultRenderer, TerminalRenderer};

#[cfg(all(feature = "camera", target_os = "linux"))]
pub use camera::GstCameraDevice;
