use super::{AnalysisRequest, AnalysisResponse};
use crate::config::AnalysisConfig;
use crate::credentials::ApiKey;
use crate::error::AnalysisError;
use async_trait::async_trait;
use tracing::debug;

/// Carries an analysis request to the remote service
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        credential: Option<&ApiKey>,
    ) -> Result<AnalysisResponse, AnalysisError>;
}

/// JSON-over-HTTP transport
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    endpoint: String,
    credential_header: String,
}

impl HttpAnalysisClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AnalysisError::Transport {
                details: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credential_header: config.credential_header.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisTransport for HttpAnalysisClient {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        credential: Option<&ApiKey>,
    ) -> Result<AnalysisResponse, AnalysisError> {
        debug!("POST {} ({} request)", self.endpoint, request.kind());

        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = credential {
            builder = builder.header(self.credential_header.as_str(), key.expose());
        }

        let response = builder.send().await.map_err(|e| AnalysisError::Transport {
            details: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AnalysisError::Transport {
            details: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| AnalysisError::Transport {
                details: format!("response is not JSON: {}", e),
            })?;

        match value.get("message").and_then(|m| m.as_str()) {
            Some(message) => Ok(AnalysisResponse {
                message: message.to_string(),
            }),
            None => Err(AnalysisError::Protocol {
                details: "response has no string `message` field".to_string(),
            }),
        }
    }
}
