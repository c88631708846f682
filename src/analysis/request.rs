use crate::controller::{InputModeController, Mode};
use crate::error::AnalysisError;
use crate::media::DataUri;
use serde::{Deserialize, Serialize};

/// Outbound payload, serialized as `{"text": ...}` or `{"image": "data:..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisRequest {
    Text(String),
    Image(DataUri),
}

impl AnalysisRequest {
    /// Build from the active mode's buffer only
    pub fn from_input(input: &InputModeController) -> Result<Self, AnalysisError> {
        let mode = input.mode();
        let request = match mode {
            Mode::Text => Some(input.text())
                .filter(|text| !text.is_empty())
                .map(|text| AnalysisRequest::Text(text.to_string())),
            Mode::Image => input.uploaded_image().cloned().map(AnalysisRequest::Image),
            Mode::Camera => input.captured_still().cloned().map(AnalysisRequest::Image),
        };

        request.ok_or(AnalysisError::MissingInput { mode })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisRequest::Text(_) => "text",
            AnalysisRequest::Image(_) => "image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub message: String,
}
