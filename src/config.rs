use crate::camera::FacingMode;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScannerConfig {
    pub analysis: AnalysisConfig,
    pub camera: CameraConfig,
    pub intake: IntakeConfig,
    pub credentials: CredentialsConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// URL the analysis request is POSTed to
    #[serde(default = "default_analysis_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_analysis_timeout")]
    pub timeout_seconds: u64,

    /// Attach the stored API key to analysis requests
    #[serde(default)]
    pub attach_credential: bool,

    /// Header carrying the API key when `attach_credential` is set
    #[serde(default = "default_credential_header")]
    pub credential_header: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Facing mode used when the camera is first opened
    #[serde(default = "default_facing")]
    pub default_facing: FacingMode,

    /// Device index (/dev/videoN) of the front-facing camera
    #[serde(default)]
    pub user_device: u32,

    /// Device index (/dev/videoN) of the rear-facing camera
    #[serde(default)]
    pub environment_device: u32,

    /// JPEG quality for captured stills (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Delay before the CLI captures from a freshly opened stream
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IntakeConfig {
    /// Largest accepted upload in megabytes, 0 disables the limit
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CredentialsConfig {
    /// File holding the saved API key
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,

    /// Endpoint that validates an API key before it is saved
    #[serde(default = "default_verify_endpoint")]
    pub verify_endpoint: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl CameraConfig {
    /// Device index for the requested facing mode
    pub fn device_for(&self, facing: FacingMode) -> u32 {
        match facing {
            FacingMode::User => self.user_device,
            FacingMode::Environment => self.environment_device,
        }
    }
}

impl IntakeConfig {
    /// Upload limit in bytes, `None` when unlimited
    pub fn max_file_size_bytes(&self) -> Option<u64> {
        (self.max_file_size_mb > 0).then(|| self.max_file_size_mb * 1024 * 1024)
    }
}

impl ScannerConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("ingredient-scanner.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("analysis.endpoint", default_analysis_endpoint())?
            .set_default("analysis.timeout_seconds", default_analysis_timeout())?
            .set_default("analysis.attach_credential", false)?
            .set_default("analysis.credential_header", default_credential_header())?
            .set_default("camera.default_facing", default_facing().as_str())?
            .set_default("camera.user_device", 0)?
            .set_default("camera.environment_device", 0)?
            .set_default("camera.jpeg_quality", default_jpeg_quality() as i64)?
            .set_default("camera.warmup_ms", default_warmup_ms())?
            .set_default("intake.max_file_size_mb", default_max_file_size_mb())?
            .set_default(
                "credentials.key_file",
                default_key_file().to_string_lossy().to_string(),
            )?
            .set_default("credentials.verify_endpoint", default_verify_endpoint())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // SCANNER_ANALYSIS__ENDPOINT -> analysis.endpoint
            .add_source(
                Environment::with_prefix("SCANNER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ScannerConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.endpoint.trim().is_empty() {
            return Err(ConfigError::Message(
                "Analysis endpoint must not be empty".to_string(),
            ));
        }

        if !self.analysis.endpoint.starts_with("http://")
            && !self.analysis.endpoint.starts_with("https://")
        {
            return Err(ConfigError::Message(format!(
                "Analysis endpoint must be an http(s) URL, got '{}'",
                self.analysis.endpoint
            )));
        }

        if self.analysis.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Analysis timeout must be greater than 0".to_string(),
            ));
        }

        if self.analysis.attach_credential && self.analysis.credential_header.trim().is_empty() {
            return Err(ConfigError::Message(
                "Credential header must be set when attach_credential is enabled".to_string(),
            ));
        }

        if self.camera.jpeg_quality == 0 || self.camera.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "Camera jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig {
                endpoint: default_analysis_endpoint(),
                timeout_seconds: default_analysis_timeout(),
                attach_credential: false,
                credential_header: default_credential_header(),
            },
            camera: CameraConfig {
                default_facing: default_facing(),
                user_device: 0,
                environment_device: 0,
                jpeg_quality: default_jpeg_quality(),
                warmup_ms: default_warmup_ms(),
            },
            intake: IntakeConfig {
                max_file_size_mb: default_max_file_size_mb(),
            },
            credentials: CredentialsConfig {
                key_file: default_key_file(),
                verify_endpoint: default_verify_endpoint(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_analysis_endpoint() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_analysis_timeout() -> u64 {
    60
}
fn default_credential_header() -> String {
    "X-API-Key".to_string()
}

fn default_facing() -> FacingMode {
    FacingMode::Environment
}
fn default_jpeg_quality() -> u8 {
    92
} // Matches the browser canvas default for image/jpeg
fn default_warmup_ms() -> u64 {
    500
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_key_file() -> PathBuf {
    PathBuf::from(".ingredient-scanner/api_key")
}
fn default_verify_endpoint() -> String {
    "https://ingredient-safety-analyzer.onrender.com/verify-key".to_string()
}

fn default_event_bus_capacity() -> usize {
    64
}
