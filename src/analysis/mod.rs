mod client;
mod orchestrator;
mod request;
#[cfg(test)]
mod tests;

pub use client::{AnalysisTransport, HttpAnalysisClient};
pub use orchestrator::{AnalysisOrchestrator, PendingAnalysis, RequestState, RequestTicket};
pub use request::{AnalysisRequest, AnalysisResponse};
