use super::*;
use crate::camera::{CameraSession, FacingMode, MockCameraDevice};
use crate::config::{AnalysisConfig, ScannerConfig};
use crate::controller::{InputModeController, Mode};
use crate::credentials::{ApiKey, StaticCredentials};
use crate::error::AnalysisError;
use crate::events::{EventBus, ScannerEvent};
use crate::intake::{FileIntake, IncomingFile};
use crate::media::{DataUri, MediaDecoder};
use async_trait::async_trait;
use mockito::Matcher;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

/// Transport that records requests and holds each reply until released
struct GatedTransport {
    gate: Notify,
    gated: bool,
    reply: Mutex<Result<String, AnalysisError>>,
    requests: Mutex<Vec<(AnalysisRequest, Option<String>)>>,
}

impl GatedTransport {
    fn replying(message: &str) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            gated: false,
            reply: Mutex::new(Ok(message.to_string())),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn gated(message: &str) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            gated: true,
            reply: Mutex::new(Ok(message.to_string())),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: AnalysisError) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            gated: false,
            reply: Mutex::new(Err(error)),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn release(&self) {
        self.gate.notify_one();
    }

    fn requests(&self) -> Vec<(AnalysisRequest, Option<String>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AnalysisTransport for GatedTransport {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        credential: Option<&ApiKey>,
    ) -> Result<AnalysisResponse, AnalysisError> {
        self.requests
            .lock()
            .push((request.clone(), credential.map(|k| k.expose().to_string())));

        if self.gated {
            self.gate.notified().await;
        }

        self.reply
            .lock()
            .clone()
            .map(|message| AnalysisResponse { message })
    }
}

fn create_test_controller(bus: &EventBus) -> InputModeController {
    let decoder = MediaDecoder::default();
    let session = CameraSession::new(Arc::new(MockCameraDevice::new(32, 24)), decoder, bus.clone());
    let intake = FileIntake::new(&ScannerConfig::default().intake, decoder);
    InputModeController::new(session, intake, FacingMode::Environment, bus.clone())
}

fn create_test_config(endpoint: String) -> AnalysisConfig {
    AnalysisConfig {
        endpoint,
        ..ScannerConfig::default().analysis
    }
}

#[tokio::test]
async fn test_text_request_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({ "text": "sugar, salt, water" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Generally safe."}"#)
        .create_async()
        .await;

    let bus = EventBus::new(32);
    let client = HttpAnalysisClient::new(&create_test_config(server.url())).unwrap();
    let mut orchestrator = AnalysisOrchestrator::new(Arc::new(client), bus.clone());
    let mut input = create_test_controller(&bus);
    input.set_text("sugar, salt, water");

    let result = orchestrator.analyze(&input).await;

    mock.assert_async().await;
    assert_eq!(result, Ok("Generally safe.".to_string()));
    assert_eq!(orchestrator.state(), RequestState::Succeeded);
    assert_eq!(orchestrator.result(), Some("Generally safe."));
}

#[tokio::test]
async fn test_image_request_body() {
    let uri = DataUri::from_bytes("image/png", &[1, 2, 3]);
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::Json(serde_json::json!({ "image": uri.to_string() })))
        .with_status(200)
        .with_body(r#"{"message":"ok"}"#)
        .create_async()
        .await;

    let client = HttpAnalysisClient::new(&create_test_config(server.url())).unwrap();
    let response = client
        .analyze(&AnalysisRequest::Image(uri), None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.message, "ok");
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = HttpAnalysisClient::new(&create_test_config(server.url())).unwrap();
    let result = client
        .analyze(&AnalysisRequest::Text("water".to_string()), None)
        .await;

    assert_eq!(
        result,
        Err(AnalysisError::Status {
            status: 500,
            body: "boom".to_string()
        })
    );
}

#[tokio::test]
async fn test_non_json_response_is_transport_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let client = HttpAnalysisClient::new(&create_test_config(server.url())).unwrap();
    let result = client
        .analyze(&AnalysisRequest::Text("water".to_string()), None)
        .await;

    assert!(matches!(result, Err(AnalysisError::Transport { .. })));
}

#[tokio::test]
async fn test_missing_message_is_protocol_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"result":"safe"}"#)
        .create_async()
        .await;

    let client = HttpAnalysisClient::new(&create_test_config(server.url())).unwrap();
    let result = client
        .analyze(&AnalysisRequest::Text("water".to_string()), None)
        .await;

    assert!(matches!(result, Err(AnalysisError::Protocol { .. })));
}

#[tokio::test]
async fn test_credential_header_is_sent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("x-api-key", "sk-test")
        .with_status(200)
        .with_body(r#"{"message":"ok"}"#)
        .create_async()
        .await;

    let client = HttpAnalysisClient::new(&create_test_config(server.url())).unwrap();
    let key = ApiKey::new("sk-test").unwrap();
    client
        .analyze(&AnalysisRequest::Text("water".to_string()), Some(&key))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_request() {
    let bus = EventBus::new(32);
    let client = HttpAnalysisClient::new(&create_test_config("http://127.0.0.1:9".to_string())).unwrap();
    let mut orchestrator = AnalysisOrchestrator::new(Arc::new(client), bus.clone());
    let mut input = create_test_controller(&bus);
    input.set_text("water");

    let result = orchestrator.analyze(&input).await;

    assert!(matches!(result, Err(AnalysisError::Transport { .. })));
    assert_eq!(orchestrator.state(), RequestState::Failed);
    assert!(orchestrator.result().is_none());

    // Failed still allows another attempt
    assert!(orchestrator.can_analyze(&input));
}

#[tokio::test]
async fn test_missing_input_per_mode() {
    let bus = EventBus::new(32);
    let transport = GatedTransport::replying("unused");
    let mut orchestrator = AnalysisOrchestrator::new(transport.clone(), bus.clone());
    let mut input = create_test_controller(&bus);

    for mode in [Mode::Text, Mode::Image, Mode::Camera] {
        input.set_mode(mode).await;
        assert_eq!(
            orchestrator.analyze(&input).await,
            Err(AnalysisError::MissingInput { mode })
        );
        assert_eq!(orchestrator.state(), RequestState::Idle);
    }

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_request_reads_only_active_mode() {
    let bus = EventBus::new(32);
    let transport = GatedTransport::replying("ok");
    let mut orchestrator = AnalysisOrchestrator::new(transport.clone(), bus.clone());
    let mut input = create_test_controller(&bus);

    input.set_text("flour");
    input.set_mode(Mode::Image).await;
    input
        .pick_file(IncomingFile::from_bytes("label.png", "image/png", vec![1, 2, 3]))
        .await;

    orchestrator.analyze(&input).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(requests[0].0, AnalysisRequest::Image(_)));
}

#[tokio::test]
async fn test_overlapping_request_is_busy() {
    let bus = EventBus::new(32);
    let transport = GatedTransport::gated("done");
    let mut orchestrator = AnalysisOrchestrator::new(transport.clone(), bus.clone());
    let mut input = create_test_controller(&bus);
    input.set_text("salt");

    let pending = orchestrator.submit(&input).unwrap();
    assert_eq!(orchestrator.state(), RequestState::InFlight);
    assert!(!orchestrator.can_analyze(&input));

    assert!(matches!(orchestrator.submit(&input), Err(AnalysisError::Busy)));
    assert_eq!(orchestrator.state(), RequestState::InFlight);

    transport.release();
    assert!(orchestrator.finish(pending).await);
    assert_eq!(orchestrator.result(), Some("done"));
}

#[tokio::test]
async fn test_invalidated_response_is_discarded() {
    let bus = EventBus::new(32);
    let mut rx = bus.subscribe();
    let transport = GatedTransport::gated("stale verdict");
    let mut orchestrator = AnalysisOrchestrator::new(transport.clone(), bus.clone());
    let mut input = create_test_controller(&bus);
    input.set_text("salt");

    let pending = orchestrator.submit(&input).unwrap();
    let ticket = pending.ticket();

    orchestrator.invalidate();
    assert_eq!(orchestrator.state(), RequestState::Idle);

    transport.release();
    assert!(!orchestrator.finish(pending).await);
    assert_eq!(orchestrator.state(), RequestState::Idle);
    assert!(orchestrator.result().is_none());

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(events.contains(&ScannerEvent::StaleResponseDiscarded {
        generation: ticket.generation(),
        current: orchestrator.generation(),
    }));
}

#[tokio::test]
async fn test_failure_clears_previous_result() {
    let bus = EventBus::new(32);
    let mut input = create_test_controller(&bus);
    input.set_text("salt");

    let mut orchestrator = AnalysisOrchestrator::new(GatedTransport::replying("first"), bus.clone());
    orchestrator.analyze(&input).await.unwrap();
    assert_eq!(orchestrator.result(), Some("first"));

    let (ticket, _lease) = orchestrator
        .begin(&AnalysisRequest::Text("salt".to_string()), Mode::Text)
        .unwrap();
    orchestrator.complete(
        ticket,
        Err(AnalysisError::Protocol {
            details: "no message".to_string(),
        }),
    );

    assert_eq!(orchestrator.state(), RequestState::Failed);
    assert!(orchestrator.result().is_none());
    assert!(orchestrator.last_error().is_some_and(|e| e.is_remote()));
}

#[tokio::test]
async fn test_cancelled_analyze_does_not_block_retry() {
    let bus = EventBus::new(32);
    let mut input = create_test_controller(&bus);
    input.set_text("sugar");

    let transport = GatedTransport::gated("retried");
    let mut orchestrator = AnalysisOrchestrator::new(transport.clone(), bus.clone());

    let cancelled = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        orchestrator.analyze(&input),
    )
    .await;
    assert!(cancelled.is_err());

    assert_eq!(orchestrator.state(), RequestState::Idle);
    assert!(!orchestrator.is_busy());
    assert!(orchestrator.can_analyze(&input));

    let pending = orchestrator.submit(&input).unwrap();
    transport.release();
    assert!(orchestrator.finish(pending).await);
    assert_eq!(orchestrator.result(), Some("retried"));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_dropped_pending_aborts_and_frees_orchestrator() {
    let bus = EventBus::new(32);
    let mut input = create_test_controller(&bus);
    input.set_text("sugar");

    let transport = GatedTransport::gated("second");
    let mut orchestrator = AnalysisOrchestrator::new(transport.clone(), bus.clone());

    let abandoned = orchestrator.submit(&input).unwrap();
    let abandoned_ticket = abandoned.ticket();
    drop(abandoned);

    assert_eq!(orchestrator.state(), RequestState::Idle);
    assert!(orchestrator.can_analyze(&input));

    let pending = orchestrator.submit(&input).unwrap();
    assert!(pending.ticket().generation() > abandoned_ticket.generation());
    assert_eq!(orchestrator.state(), RequestState::InFlight);

    // A late answer for the abandoned request no longer applies
    assert!(!orchestrator.complete(abandoned_ticket, Ok("first".to_string())));

    transport.release();
    assert!(orchestrator.finish(pending).await);
    assert_eq!(orchestrator.result(), Some("second"));
}

#[tokio::test]
async fn test_transport_failure_is_recorded() {
    let bus = EventBus::new(32);
    let transport = GatedTransport::failing(AnalysisError::Transport {
        details: "connection reset".to_string(),
    });
    let mut orchestrator = AnalysisOrchestrator::new(transport, bus.clone());
    let mut input = create_test_controller(&bus);
    input.set_text("salt");

    assert!(orchestrator.analyze(&input).await.is_err());
    assert_eq!(orchestrator.state(), RequestState::Failed);
    assert!(matches!(
        orchestrator.last_error(),
        Some(AnalysisError::Transport { .. })
    ));
}

#[tokio::test]
async fn test_credential_attached_only_when_enabled() {
    let bus = EventBus::new(32);
    let mut input = create_test_controller(&bus);
    input.set_text("salt");
    let provider = Arc::new(StaticCredentials::new(ApiKey::new("sk-1").unwrap()));

    let transport = GatedTransport::replying("ok");
    let mut orchestrator = AnalysisOrchestrator::new(transport.clone(), bus.clone())
        .with_credentials(provider.clone(), false);
    orchestrator.analyze(&input).await.unwrap();
    assert_eq!(transport.requests()[0].1, None);
    assert!(orchestrator.has_credential());

    let transport = GatedTransport::replying("ok");
    let mut orchestrator =
        AnalysisOrchestrator::new(transport.clone(), bus.clone()).with_credentials(provider, true);
    orchestrator.analyze(&input).await.unwrap();
    assert_eq!(transport.requests()[0].1, Some("sk-1".to_string()));
}

#[test]
fn test_request_serialization() {
    let text = AnalysisRequest::Text("sugar".to_string());
    assert_eq!(serde_json::to_string(&text).unwrap(), r#"{"text":"sugar"}"#);

    let image = AnalysisRequest::Image(DataUri::from_bytes("image/jpeg", &[0xFF]));
    assert_eq!(
        serde_json::to_value(&image).unwrap(),
        serde_json::json!({ "image": "data:image/jpeg;base64,/w==" })
    );
}
