use super::{AnalysisRequest, AnalysisTransport};
use crate::controller::{InputModeController, Mode};
use crate::credentials::{ApiKey, CredentialProvider};
use crate::error::AnalysisError;
use crate::events::{EventBus, ScannerEvent};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Identifies the input context a request was dispatched from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    mode: Mode,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Request awaiting its response. Abandoned once every lease handed out by
/// `begin` is gone, so it no longer blocks a new request.
#[derive(Debug)]
struct InFlight {
    generation: u64,
    lease: Weak<()>,
}

impl InFlight {
    fn is_abandoned(&self) -> bool {
        self.lease.strong_count() == 0
    }
}

/// A dispatched request whose response has not been applied yet.
///
/// Dropping it without [`AnalysisOrchestrator::finish`] aborts the request.
#[derive(Debug)]
pub struct PendingAnalysis {
    ticket: RequestTicket,
    handle: JoinHandle<Result<String, AnalysisError>>,
    _lease: Arc<()>,
}

impl PendingAnalysis {
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the response without applying it
    pub async fn wait(mut self) -> (RequestTicket, Result<String, AnalysisError>) {
        let outcome = (&mut self.handle).await.unwrap_or_else(|e| {
            Err(AnalysisError::Aborted {
                details: e.to_string(),
            })
        });
        (self.ticket, outcome)
    }
}

impl Drop for PendingAnalysis {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            debug!("Analysis #{} abandoned, aborting", self.ticket.generation);
            self.handle.abort();
        }
    }
}

/// Drives the request lifecycle: Idle -> InFlight -> Succeeded | Failed.
///
/// Every request gets a fresh generation. [`Self::invalidate`] also bumps it,
/// so a response that lands after the input context changed no longer
/// matches and is discarded in [`Self::complete`].
pub struct AnalysisOrchestrator {
    transport: Arc<dyn AnalysisTransport>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    attach_credential: bool,
    event_bus: EventBus,
    state: RequestState,
    result: Option<String>,
    last_error: Option<AnalysisError>,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl AnalysisOrchestrator {
    pub fn new(transport: Arc<dyn AnalysisTransport>, event_bus: EventBus) -> Self {
        Self {
            transport,
            credentials: None,
            attach_credential: false,
            event_bus,
            state: RequestState::Idle,
            result: None,
            last_error: None,
            generation: 0,
            in_flight: None,
        }
    }

    /// Provider queried for a key; it is only sent when `attach` is set
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>, attach: bool) -> Self {
        self.credentials = Some(provider);
        self.attach_credential = attach;
        self
    }

    /// An abandoned request reads as Idle
    pub fn state(&self) -> RequestState {
        match &self.in_flight {
            Some(request) if request.is_abandoned() => RequestState::Idle,
            _ => self.state,
        }
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn last_error(&self) -> Option<&AnalysisError> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|request| !request.is_abandoned())
    }

    pub fn has_credential(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(|provider| provider.api_key().is_some())
    }

    /// Whether `analyze` would dispatch right now
    pub fn can_analyze(&self, input: &InputModeController) -> bool {
        !self.is_busy() && input.has_input()
    }

    /// Full round trip: build, dispatch, wait, apply
    pub async fn analyze(&mut self, input: &InputModeController) -> Result<String, AnalysisError> {
        let request = AnalysisRequest::from_input(input)?;
        let (ticket, _lease) = self.begin(&request, input.mode())?;

        let credential = self.credential();
        let outcome = self
            .transport
            .analyze(&request, credential.as_ref())
            .await
            .map(|response| response.message);

        self.complete(ticket, outcome.clone());
        outcome
    }

    /// Dispatch on a spawned task; apply the response later with [`Self::finish`]
    pub fn submit(&mut self, input: &InputModeController) -> Result<PendingAnalysis, AnalysisError> {
        let request = AnalysisRequest::from_input(input)?;
        let (ticket, lease) = self.begin(&request, input.mode())?;

        let transport = Arc::clone(&self.transport);
        let credential = self.credential();
        let handle = tokio::spawn(async move {
            transport
                .analyze(&request, credential.as_ref())
                .await
                .map(|response| response.message)
        });

        Ok(PendingAnalysis {
            ticket,
            handle,
            _lease: lease,
        })
    }

    /// Wait for a submitted request and apply it. Returns false if it was stale.
    pub async fn finish(&mut self, pending: PendingAnalysis) -> bool {
        let (ticket, outcome) = pending.wait().await;
        self.complete(ticket, outcome)
    }

    /// Move to InFlight under a fresh generation.
    ///
    /// The request counts as in flight until it is completed, invalidated,
    /// or every clone of the returned lease is dropped.
    pub fn begin(
        &mut self,
        request: &AnalysisRequest,
        mode: Mode,
    ) -> Result<(RequestTicket, Arc<()>), AnalysisError> {
        if self.is_busy() {
            debug!("Analysis requested while another is in flight");
            return Err(AnalysisError::Busy);
        }
        if let Some(abandoned) = self.in_flight.take() {
            info!("Analysis #{} was abandoned by its caller", abandoned.generation);
        }

        let lease = Arc::new(());
        self.generation += 1;
        self.in_flight = Some(InFlight {
            generation: self.generation,
            lease: Arc::downgrade(&lease),
        });
        self.state = RequestState::InFlight;
        self.result = None;
        self.last_error = None;

        info!(
            "Analysis #{} started ({} request from {} mode)",
            self.generation,
            request.kind(),
            mode
        );
        self.event_bus.notify(ScannerEvent::AnalysisStarted {
            generation: self.generation,
            mode,
        });

        let ticket = RequestTicket {
            generation: self.generation,
            mode,
        };
        Ok((ticket, lease))
    }

    /// Apply a response. Returns false if the ticket is stale.
    pub fn complete(&mut self, ticket: RequestTicket, outcome: Result<String, AnalysisError>) -> bool {
        let current = self.in_flight.as_ref().map(|request| request.generation);
        if current != Some(ticket.generation) {
            info!(
                "Discarding response #{} (current generation {})",
                ticket.generation, self.generation
            );
            self.event_bus.notify(ScannerEvent::StaleResponseDiscarded {
                generation: ticket.generation,
                current: self.generation,
            });
            return false;
        }

        self.in_flight = None;
        match outcome {
            Ok(message) => {
                self.state = RequestState::Succeeded;
                self.result = Some(message);
                self.last_error = None;
                self.event_bus.notify(ScannerEvent::AnalysisSucceeded {
                    generation: ticket.generation,
                });
            }
            Err(error) => {
                self.state = RequestState::Failed;
                self.result = None;
                self.event_bus.notify(ScannerEvent::AnalysisFailed {
                    generation: ticket.generation,
                    error: error.to_string(),
                });
                self.last_error = Some(error);
            }
        }

        true
    }

    /// Forget the current result and orphan any request in flight
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if let Some(orphaned) = self.in_flight.take() {
            debug!("Analysis #{} orphaned by input change", orphaned.generation);
        }
        self.state = RequestState::Idle;
        self.result = None;
        self.last_error = None;
    }

    fn credential(&self) -> Option<ApiKey> {
        if !self.attach_credential {
            return None;
        }

        let key = self.credentials.as_ref().and_then(|provider| provider.api_key());
        if key.is_none() {
            warn!("Credential attachment enabled but no API key is stored");
        }
        key
    }
}
