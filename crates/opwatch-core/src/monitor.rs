//! Operation monitor: poll an operation until it reaches a terminal status
//!
//! A monitoring session has three parts:
//!
//! - the **coordinator** ([`Monitor::watch`]) which fetches the first snapshot,
//!   starts the presenter and the poller, and waits for one of two signals;
//! - the **poller**, a spawned task that fetches the operation every
//!   [`POLL_INTERVAL`] until it sees `done`/`error` or a fetch fails;
//! - the **presenter**, which shows progress while the coordinator waits.
//!
//! The poller reports through two one-shot channels. The terminal signal
//! carries the final [`Operation`] itself, so the coordinator never reads
//! state the poller may still be writing.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use opwatch_core::{HttpClient, NoopPresenter, wait_for_operation};
//!
//! let client = Arc::new(HttpClient::new("https://api.example.com", &token)?);
//! let elapsed = wait_for_operation(
//!     client,
//!     "https://api.example.com/v1/apps/my-app/operations/op_123",
//!     "my-app",
//!     None,
//!     &NoopPresenter,
//! )
//! .await?;
//! println!("Done in {:.3} seconds", elapsed);
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::client::{ApiError, OperationsApi};
use crate::error::{CoreError, Result};
use crate::operation::{Operation, OperationRef, OperationStatus};
use crate::progress::{Banner, Presenter, PresenterGuard};

/// Delay between two status fetches while an operation is pending
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Final result of a monitoring session
#[derive(Debug)]
pub enum PollOutcome {
    /// The operation finished with status `done`
    Completed { elapsed: Duration },
    /// The operation failed, or it could not be observed to the end
    Failed { reason: CoreError },
}

impl PollOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, PollOutcome::Completed { .. })
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            PollOutcome::Completed { elapsed } => Some(*elapsed),
            PollOutcome::Failed { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<Duration> {
        match self {
            PollOutcome::Completed { elapsed } => Ok(elapsed),
            PollOutcome::Failed { reason } => Err(reason),
        }
    }
}

/// Waits for operations to finish using an [`OperationsApi`]
#[derive(Clone)]
pub struct Monitor {
    client: Arc<dyn OperationsApi>,
}

impl Monitor {
    pub fn new(client: Arc<dyn OperationsApi>) -> Self {
        Self { client }
    }

    /// Watch `op_ref` until it is done, fails, or can no longer be fetched
    ///
    /// The presenter is started only once the first snapshot is known and
    /// is stopped before this returns, on every path.
    pub async fn watch(
        &self,
        op_ref: &OperationRef,
        label: Option<&str>,
        presenter: &dyn Presenter,
    ) -> PollOutcome {
        info!("Waiting for operation {}", op_ref);

        let initial = match self.client.fetch_operation(op_ref.app(), op_ref.id()).await {
            Ok(operation) => operation,
            Err(e) => {
                return PollOutcome::Failed {
                    reason: CoreError::fetch(op_ref.id(), e),
                };
            }
        };
        debug!(
            "Operation {} is '{}' with status {}",
            initial.id, initial.op_type, initial.status
        );

        let banner = Banner::for_operation(&initial, label);
        let outcome = {
            let spinner = PresenterGuard::start(presenter, &banner);
            let outcome = self.wait_terminal(op_ref).await;
            spinner.stop();
            outcome
        };

        match &outcome {
            PollOutcome::Completed { elapsed } => {
                info!("Operation {} done in {:?}", op_ref, elapsed)
            }
            PollOutcome::Failed { reason } => info!("Operation {} failed: {}", op_ref, reason),
        }
        presenter.report(&banner, &outcome);
        outcome
    }

    /// Run the poller and block until it reports
    async fn wait_terminal(&self, op_ref: &OperationRef) -> PollOutcome {
        let (done_tx, done_rx) = oneshot::channel::<Operation>();
        let (err_tx, err_rx) = oneshot::channel::<ApiError>();
        let cancel = CancellationToken::new();

        let poller = Poller {
            client: Arc::clone(&self.client),
            app: op_ref.app().to_string(),
            operation_id: op_ref.id().to_string(),
            interval: POLL_INTERVAL,
        };
        let handle = tokio::spawn(poller.run(cancel.clone(), done_tx, err_tx));
        // Stops the poller if this future is dropped before it reports
        let stop_poller = cancel.drop_guard();

        // A branch whose sender was dropped yields Err and is disabled, so the
        // sender that did fire always wins.
        let outcome = tokio::select! {
            Ok(err) = err_rx => PollOutcome::Failed {
                reason: CoreError::fetch(op_ref.id(), err),
            },
            Ok(operation) = done_rx => conclude(operation),
            else => PollOutcome::Failed {
                reason: CoreError::PollerStopped {
                    operation_id: op_ref.id().to_string(),
                },
            },
        };

        drop(stop_poller);
        if let Err(e) = handle.await {
            warn!("Poller for operation {} ended abnormally: {}", op_ref, e);
        }
        outcome
    }
}

/// Turn the snapshot carried by the terminal signal into an outcome
fn conclude(operation: Operation) -> PollOutcome {
    match &operation.status {
        OperationStatus::Done => PollOutcome::Completed {
            elapsed: operation.elapsed(),
        },
        OperationStatus::Error => PollOutcome::Failed {
            reason: CoreError::OperationFailed {
                op_type: operation.op_type.to_string(),
                detail: operation
                    .error_detail()
                    .unwrap_or("no error detail reported")
                    .to_string(),
                operation_id: operation.id,
            },
        },
        status => PollOutcome::Failed {
            reason: CoreError::UnexpectedStatus {
                operation_id: operation.id,
                status: status.to_string(),
            },
        },
    }
}

/// Background task fetching one operation until it is terminal
struct Poller {
    client: Arc<dyn OperationsApi>,
    app: String,
    operation_id: String,
    interval: Duration,
}

impl Poller {
    async fn run(
        self,
        cancel: CancellationToken,
        done_tx: oneshot::Sender<Operation>,
        err_tx: oneshot::Sender<ApiError>,
    ) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let fetched = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Poller for {} cancelled", self.operation_id);
                    return;
                }
                res = self.client.fetch_operation(&self.app, &self.operation_id) => res,
            };

            match fetched {
                Err(e) => {
                    debug!("Poll {} of {} failed: {}", attempt, self.operation_id, e);
                    let _ = err_tx.send(e);
                    return;
                }
                Ok(operation) if operation.status.is_terminal() => {
                    debug!(
                        "Poll {} of {}: terminal status {}",
                        attempt, self.operation_id, operation.status
                    );
                    let _ = done_tx.send(operation);
                    return;
                }
                Ok(operation) => {
                    if let OperationStatus::Unknown(raw) = &operation.status {
                        warn!(
                            "Operation {} reported unknown status '{}', still waiting",
                            self.operation_id, raw
                        );
                    }
                    trace!("Poll {} of {}: {:?}", attempt, self.operation_id, operation);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Poller for {} cancelled", self.operation_id);
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

/// Parse `location`, then wait for that operation to finish
///
/// Returns the elapsed time in seconds reported by the server. A malformed
/// location fails before any request is made.
pub async fn wait_for_operation(
    client: Arc<dyn OperationsApi>,
    location: &str,
    app: &str,
    label: Option<&str>,
    presenter: &dyn Presenter,
) -> Result<f64> {
    let op_ref = OperationRef::parse(location, app)?;
    Monitor::new(client)
        .watch(&op_ref, label, presenter)
        .await
        .into_result()
        .map(|elapsed| elapsed.as_secs_f64())
}

/// Fetch the operation at `location` once and return its attach URL verbatim
///
/// Does not wait for the operation to finish.
pub async fn attach_url(client: &dyn OperationsApi, location: &str, app: &str) -> Result<String> {
    let op_ref = OperationRef::parse(location, app)?;
    let operation = client
        .fetch_operation(op_ref.app(), op_ref.id())
        .await
        .map_err(|e| CoreError::fetch(op_ref.id(), e))?;

    operation
        .attach_url()
        .map(str::to_string)
        .ok_or_else(|| CoreError::MissingAttachUrl {
            operation_id: operation.id.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopPresenter;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LOCATION: &str = "https://api.example/apps/my-app/operations/op_123";

    fn operation(op_type: &str, status: &str) -> Operation {
        serde_json::from_value(json!({
            "id": "op_123",
            "type": op_type,
            "status": status,
            "created_at": "2026-01-01T10:00:00Z",
        }))
        .unwrap()
    }

    fn done(elapsed_ms: i64) -> Operation {
        let mut op = operation("restart", "done");
        op.finished_at = Some(op.created_at + chrono::Duration::milliseconds(elapsed_ms));
        op
    }

    fn failed(op_type: &str, detail: &str) -> Operation {
        let mut op = operation(op_type, "error");
        op.error = Some(detail.to_string());
        op
    }

    fn pending() -> Operation {
        operation("restart", "pending")
    }

    /// Replays a fixed list of responses, then reports `pending` forever
    struct ScriptedClient {
        script: Mutex<VecDeque<std::result::Result<Operation, ApiError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(script: Vec<std::result::Result<Operation, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OperationsApi for ScriptedClient {
        async fn fetch_operation(
            &self,
            app: &str,
            operation_id: &str,
        ) -> std::result::Result<Operation, ApiError> {
            assert_eq!(app, "my-app");
            assert_eq!(operation_id, "op_123");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(pending()))
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        events: Mutex<Vec<String>>,
    }

    impl RecordingPresenter {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Presenter for RecordingPresenter {
        fn start(&self, banner: &Banner) {
            self.events.lock().unwrap().push(format!("start {}", banner));
        }

        fn stop(&self) {
            self.events.lock().unwrap().push("stop".to_string());
        }

        fn report(&self, _banner: &Banner, outcome: &PollOutcome) {
            let kind = if outcome.is_completed() {
                "completed"
            } else {
                "failed"
            };
            self.events.lock().unwrap().push(format!("report {}", kind));
        }
    }

    fn op_ref() -> OperationRef {
        OperationRef::parse(LOCATION, "my-app").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_pending_done() {
        let client = ScriptedClient::new(vec![Ok(pending()), Ok(pending()), Ok(done(2500))]);
        let presenter = RecordingPresenter::default();

        let outcome = Monitor::new(client.clone())
            .watch(&op_ref(), None, &presenter)
            .await;

        assert_eq!(outcome.elapsed(), Some(Duration::from_millis(2500)));
        assert_eq!(client.calls(), 3);
        assert_eq!(
            presenter.events(),
            vec!["start Status:", "stop", "report completed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_n_plus_one_times() {
        for n in 0..5 {
            let mut script = vec![Ok(pending())];
            script.extend((0..n).map(|_| Ok(pending())));
            script.push(Ok(done(1200)));
            let client = ScriptedClient::new(script);

            let elapsed = Monitor::new(client.clone())
                .watch(&op_ref(), None, &RecordingPresenter::default())
                .await
                .into_result()
                .unwrap();

            assert_eq!(elapsed, Duration::from_millis(1200));
            // initial fetch + N pending polls + the final one
            assert_eq!(client.calls(), n + 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_error_stops_polling() {
        let client = ScriptedClient::new(vec![
            Ok(operation("scale", "pending")),
            Ok(failed("scale", "quota exceeded")),
        ]);
        let presenter = RecordingPresenter::default();

        let outcome = Monitor::new(client.clone())
            .watch(&op_ref(), None, &presenter)
            .await;

        let err = outcome.into_result().unwrap_err();
        assert!(err.is_operation_failure());
        let msg = err.to_string();
        assert!(msg.contains("scale"), "{msg}");
        assert!(msg.contains("quota exceeded"), "{msg}");
        assert_eq!(err.operation_id(), Some("op_123"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(client.calls(), 2);
        assert_eq!(
            presenter.events(),
            vec!["start Status:", "stop", "report failed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_on_poll_k_stops_polling() {
        let client = ScriptedClient::new(vec![
            Ok(pending()),
            Ok(pending()),
            Err(ApiError::ConnectionError("connection reset".to_string())),
        ]);
        let presenter = RecordingPresenter::default();

        let err = Monitor::new(client.clone())
            .watch(&op_ref(), None, &presenter)
            .await
            .into_result()
            .unwrap_err();

        assert!(matches!(err, CoreError::Fetch { .. }));
        assert!(err.to_string().contains("op_123"));
        assert!(err.to_string().contains("connection reset"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(client.calls(), 3);
        assert_eq!(
            presenter.events(),
            vec!["start Status:", "stop", "report failed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_error_never_starts_presenter() {
        let client = ScriptedClient::new(vec![Err(ApiError::NotFound {
            message: "no such operation".to_string(),
        })]);
        let presenter = RecordingPresenter::default();

        let err = Monitor::new(client.clone())
            .watch(&op_ref(), None, &presenter)
            .await
            .into_result()
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(client.calls(), 1);
        assert!(presenter.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_polling() {
        let client = ScriptedClient::new(vec![
            Ok(pending()),
            Ok(operation("restart", "paused")),
            Ok(operation("restart", "")),
            Ok(done(800)),
        ]);

        let outcome = Monitor::new(client.clone())
            .watch(&op_ref(), None, &NoopPresenter)
            .await;

        assert!(outcome.is_completed());
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_off_banner_shows_label() {
        let client = ScriptedClient::new(vec![
            Ok(operation("start-one-off", "pending")),
            Ok(done(100)),
        ]);
        let presenter = RecordingPresenter::default();

        Monitor::new(client.clone())
            .watch(&op_ref(), Some("one-off-1234"), &presenter)
            .await;

        assert_eq!(
            presenter.events()[0],
            "start -----> Starting container one-off-1234"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_done_still_confirms_with_poller() {
        let client = ScriptedClient::new(vec![Ok(done(300)), Ok(done(300))]);

        let outcome = Monitor::new(client.clone())
            .watch(&op_ref(), None, &NoopPresenter)
            .await;

        assert!(outcome.is_completed());
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_watch_stops_poller_and_presenter() {
        let client = ScriptedClient::new(vec![]);
        let presenter = RecordingPresenter::default();
        let monitor = Monitor::new(client.clone());
        let op_ref = op_ref();

        let res = tokio::time::timeout(
            Duration::from_millis(3500),
            monitor.watch(&op_ref, None, &presenter),
        )
        .await;
        assert!(res.is_err());
        assert_eq!(presenter.events(), vec!["start Status:", "stop"]);

        let calls = client.calls();
        assert!(calls >= 4);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(client.calls(), calls);
    }

    struct PanickingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OperationsApi for PanickingClient {
        async fn fetch_operation(
            &self,
            _app: &str,
            _operation_id: &str,
        ) -> std::result::Result<Operation, ApiError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(pending())
            } else {
                panic!("simulated client bug");
            }
        }
    }

    #[tokio::test]
    async fn test_poller_panic_is_reported() {
        let client = Arc::new(PanickingClient {
            calls: AtomicUsize::new(0),
        });
        let presenter = RecordingPresenter::default();

        let err = Monitor::new(client)
            .watch(&op_ref(), None, &presenter)
            .await
            .into_result()
            .unwrap_err();

        assert!(matches!(err, CoreError::PollerStopped { .. }));
        assert_eq!(
            presenter.events(),
            vec!["start Status:", "stop", "report failed"]
        );
    }

    #[test]
    fn test_conclude_rejects_non_terminal() {
        let outcome = conclude(pending());
        let err = outcome.into_result().unwrap_err();
        assert!(matches!(err, CoreError::UnexpectedStatus { .. }));
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn test_conclude_error_without_detail() {
        let err = conclude(operation("stop", "error"))
            .into_result()
            .unwrap_err();
        assert!(err.to_string().contains("stop"));
        assert!(err.to_string().contains("no error detail reported"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_operation_malformed_location_makes_no_request() {
        let client = ScriptedClient::new(vec![]);

        let err = wait_for_operation(
            client.clone(),
            "::not a url::",
            "my-app",
            None,
            &NoopPresenter,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::ReferenceParse { .. }));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_operation_returns_seconds() {
        let client = ScriptedClient::new(vec![Ok(pending()), Ok(pending()), Ok(done(2500))]);

        let elapsed = wait_for_operation(client, LOCATION, "my-app", None, &NoopPresenter)
            .await
            .unwrap();

        assert_eq!(elapsed, 2.5);
    }

    #[tokio::test]
    async fn test_attach_url_is_returned_verbatim() {
        let url = "wss://attach.example/containers/one-off-1234?token=a%2Fb&x=1";
        let mut op = operation("start-one-off", "pending");
        op.start_one_off_data = Some(crate::operation::StartOneOffData {
            attach_url: url.to_string(),
        });
        let client = ScriptedClient::new(vec![Ok(op)]);

        let attach = attach_url(client.as_ref(), LOCATION, "my-app").await.unwrap();

        assert_eq!(attach, url);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_attach_url_missing() {
        let client = ScriptedClient::new(vec![Ok(operation("start-one-off", "pending"))]);

        let err = attach_url(client.as_ref(), LOCATION, "my-app")
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::MissingAttachUrl { .. }));
    }

    #[tokio::test]
    async fn test_attach_url_fetch_error() {
        let client = ScriptedClient::new(vec![Err(ApiError::AuthenticationFailed {
            message: "token expired".to_string(),
        })]);

        let err = attach_url(client.as_ref(), LOCATION, "my-app")
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
    }
}
