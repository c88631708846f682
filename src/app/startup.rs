use super::{CameraBackend, Scanner};
use crate::analysis::{AnalysisOrchestrator, AnalysisTransport, HttpAnalysisClient};
use crate::camera::{CameraDevice, CameraSession, MockCameraDevice};
use crate::config::ScannerConfig;
use crate::controller::InputModeController;
use crate::credentials::{CredentialProvider, KeyStore};
use crate::error::Result;
use crate::events::EventBus;
use crate::intake::FileIntake;
use crate::media::MediaDecoder;
use crate::render::{ResultRenderer, TerminalRenderer};
use std::sync::Arc;
use tracing::{debug, info};

/// Wires configuration into a ready [`Scanner`]
pub struct ScannerBuilder {
    config: ScannerConfig,
    backend: CameraBackend,
    camera: Option<Arc<dyn CameraDevice>>,
    transport: Option<Arc<dyn AnalysisTransport>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    renderer: Option<Box<dyn ResultRenderer>>,
    debug_events: bool,
}

impl ScannerBuilder {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            backend: CameraBackend::default(),
            camera: None,
            transport: None,
            credentials: None,
            renderer: None,
            debug_events: false,
        }
    }

    pub fn camera_backend(mut self, backend: CameraBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Use this device instead of the configured backend
    pub fn camera(mut self, device: Arc<dyn CameraDevice>) -> Self {
        self.camera = Some(device);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn AnalysisTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Load the key store named in the configuration
    pub async fn with_key_store(mut self) -> Result<Self> {
        let store = KeyStore::open(&self.config.credentials.key_file).await?;
        self.credentials = Some(Arc::new(store));
        Ok(self)
    }

    pub fn renderer(mut self, renderer: Box<dyn ResultRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn debug_events(mut self, enabled: bool) -> Self {
        self.debug_events = enabled;
        self
    }

    pub fn build(self) -> Result<Scanner> {
        self.config.validate()?;

        let capacity = self.config.system.event_bus_capacity;
        let event_bus = if self.debug_events {
            EventBus::with_debug_logging(capacity)
        } else {
            EventBus::new(capacity)
        };

        let camera = match self.camera {
            Some(camera) => camera,
            None => create_camera(self.backend, &self.config)?,
        };
        info!("Camera backend: {}", camera.name());

        let transport: Arc<dyn AnalysisTransport> = match self.transport {
            Some(transport) => transport,
            None => {
                let client = HttpAnalysisClient::new(&self.config.analysis)?;
                debug!("Analysis endpoint: {}", client.endpoint());
                Arc::new(client)
            }
        };

        let decoder = MediaDecoder::new(self.config.camera.jpeg_quality);
        let session = CameraSession::new(camera, decoder, event_bus.clone());
        let intake = FileIntake::new(&self.config.intake, decoder);
        let controller = InputModeController::new(
            session,
            intake,
            self.config.camera.default_facing,
            event_bus.clone(),
        );

        let mut orchestrator = AnalysisOrchestrator::new(transport, event_bus.clone());
        if let Some(provider) = self.credentials {
            orchestrator =
                orchestrator.with_credentials(provider, self.config.analysis.attach_credential);
        }

        let renderer = self
            .renderer
            .unwrap_or_else(|| Box::new(TerminalRenderer::new()));

        Ok(Scanner {
            config: self.config,
            event_bus,
            controller,
            orchestrator,
            renderer,
        })
    }
}

fn create_camera(backend: CameraBackend, config: &ScannerConfig) -> Result<Arc<dyn CameraDevice>> {
    match backend {
        CameraBackend::Mock => Ok(Arc::new(MockCameraDevice::default())),
        #[cfg(all(feature = "camera", target_os = "linux"))]
        CameraBackend::Gstreamer => {
            let device = crate::camera::GstCameraDevice::new(config.camera.clone())?;
            Ok(Arc::new(device))
        }
        #[cfg(not(all(feature = "camera", target_os = "linux")))]
        CameraBackend::Gstreamer => {
            let _ = config;
            Err(crate::error::DeviceError::Backend {
                details: "built without the `camera` feature".to_string(),
            }
            .into())
        }
    }
}
