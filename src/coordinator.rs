use crate::api::ApiClient;
use crate::channel::{EventChannel, Subscription};
use crate::error::{Error, Result};
use crate::models::{
    CompletionEvent, EvaluationRecord, ModelInfo, ProgressEvent, RunRequest, ScenarioInfo,
};
use crate::store::SavedSelection;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

/// Lifecycle of one evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Submitting,
    Running,
    Finalizing,
}

/// One accumulated result and its lazily fetched log
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub record: EvaluationRecord,
    /// Full log text; `None` until finalization, and afterwards when the
    /// fetch failed or no path was recorded
    pub log: Option<String>,
}

/// Subscriptions held for the duration of one run
#[derive(Debug)]
pub struct RunHandle {
    progress: Subscription<ProgressEvent>,
    completion: Subscription<CompletionEvent>,
}

impl RunHandle {
    /// Deregister both listeners. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        self.progress.unsubscribe();
        self.completion.unsubscribe();
    }

    /// Whether the listeners are still registered
    pub fn is_active(&self) -> bool {
        self.progress.is_active() || self.completion.is_active()
    }
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunSummary {
    /// Message carried by the completion signal
    pub message: String,
    pub outcomes: Vec<RunOutcome>,
    /// Number of (model, scenario) pairs that reported a result
    pub completed: usize,
    /// Number of pairs the run covered
    pub total: usize,
    /// Non-fatal problems collected along the way
    pub warnings: Vec<String>,
    /// Refreshed history list, or `None` when the refresh itself failed
    pub history: Option<Vec<EvaluationRecord>>,
}

/// Drives one evaluation run from submission to finalized state.
///
/// Owns the selection sets and the accumulated results. Exactly one run can
/// be in flight: `submit` is only allowed from `Idle`, and progress and
/// completion events are only honored while `Running`.
#[derive(Debug)]
pub struct RunCoordinator {
    state: RunState,
    models: Vec<ModelInfo>,
    scenarios: Vec<ScenarioInfo>,
    selected_models: HashSet<String>,
    selected_scenarios: HashSet<String>,
    progress: f64,
    status: String,
    outcomes: Vec<RunOutcome>,
    completed: usize,
    total: usize,
    warnings: Vec<String>,
    event_timeout: Duration,
}

impl RunCoordinator {
    /// Create a coordinator over the fetched catalogs
    pub fn new(
        models: Vec<ModelInfo>,
        scenarios: Vec<ScenarioInfo>,
        event_timeout: Duration,
    ) -> Self {
        Self {
            state: RunState::Idle,
            models,
            scenarios,
            selected_models: HashSet::new(),
            selected_scenarios: HashSet::new(),
            progress: 0.0,
            status: String::new(),
            outcomes: Vec::new(),
            completed: 0,
            total: 0,
            warnings: Vec::new(),
            event_timeout,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn selected_models(&self) -> &HashSet<String> {
        &self.selected_models
    }

    pub fn selected_scenarios(&self) -> &HashSet<String> {
        &self.selected_scenarios
    }

    /// Toggle one model id; returns whether it is now selected
    pub fn toggle_model(&mut self, id: &str) -> bool {
        toggle(&mut self.selected_models, id)
    }

    /// Toggle one scenario id; returns whether it is now selected
    pub fn toggle_scenario(&mut self, id: &str) -> bool {
        toggle(&mut self.selected_scenarios, id)
    }

    /// Select every model in the catalog
    pub fn select_all_models(&mut self) {
        self.selected_models = self.models.iter().map(|m| m.id.clone()).collect();
    }

    /// Select every scenario in the catalog
    pub fn select_all_scenarios(&mut self) {
        self.selected_scenarios = self.scenarios.iter().map(|s| s.id.clone()).collect();
    }

    pub fn clear_models(&mut self) {
        self.selected_models.clear();
    }

    pub fn clear_scenarios(&mut self) {
        self.selected_scenarios.clear();
    }

    /// Re-apply a saved selection. Ids that no longer exist in the catalogs
    /// are dropped silently, like stale entries from an earlier session.
    pub fn restore_selection(&mut self, saved: &SavedSelection) {
        let known_models: HashSet<&str> = self.models.iter().map(|m| m.id.as_str()).collect();
        let known_scenarios: HashSet<&str> =
            self.scenarios.iter().map(|s| s.id.as_str()).collect();

        for id in &saved.selected_models {
            if known_models.contains(id.as_str()) {
                self.selected_models.insert(id.clone());
            }
        }
        for id in &saved.selected_scenarios {
            if known_scenarios.contains(id.as_str()) {
                self.selected_scenarios.insert(id.clone());
            }
        }
    }

    /// Snapshot of the current selection for persistence
    pub fn saved_selection(&self) -> SavedSelection {
        SavedSelection::from_sets(&self.selected_models, &self.selected_scenarios)
    }

    /// Submit a run covering the current selection.
    ///
    /// The selection is validated before anything goes on the wire; the
    /// event subscriptions are registered before the request is issued so no
    /// event can slip past them. On failure the coordinator is back in
    /// `Idle` with the selection untouched, ready for a retry.
    pub async fn submit(&mut self, api: &ApiClient, channel: &EventChannel) -> Result<RunHandle> {
        if self.state != RunState::Idle {
            return Err(Error::Validation(
                "a run is already in flight".to_string(),
            ));
        }
        self.validate_selection()?;

        self.progress = 0.0;
        self.status.clear();
        self.outcomes.clear();
        self.warnings.clear();
        self.completed = 0;
        self.total = self.selected_models.len() * self.selected_scenarios.len();

        let mut handle = RunHandle {
            progress: channel.subscribe_progress(),
            completion: channel.subscribe_completion(),
        };

        self.state = RunState::Submitting;
        match api.submit_run(&self.build_request()).await {
            Ok(accepted) => {
                if let Some(message) = accepted.message {
                    self.status = message;
                }
                self.state = RunState::Running;
                Ok(handle)
            }
            Err(error) => {
                handle.unsubscribe();
                self.state = RunState::Idle;
                Err(error)
            }
        }
    }

    /// Apply one progress event.
    ///
    /// Events outside a running state are dropped. The latest percentage and
    /// status always win; no monotonicity is assumed. A carried result is
    /// accumulated with its log still unfetched, and a carried error string
    /// becomes a non-fatal warning — only the backend decides whether the
    /// run continues.
    pub fn handle_progress(&mut self, event: ProgressEvent) {
        if self.state != RunState::Running {
            return;
        }

        self.progress = event.progress.clamp(0.0, 100.0);
        self.status = event.status;

        if let Some(record) = event.result {
            self.outcomes.push(RunOutcome {
                record,
                log: None,
            });
            self.completed += 1;
        }
        if let Some(error) = event.error {
            tracing::warn!(%error, "backend reported a failure for one pair");
            self.warnings.push(error);
        }
    }

    /// Finalize after the completion signal.
    ///
    /// Deregisters the listeners, fetches the log of every accumulated
    /// result (individual failures leave that result without a log and do
    /// not abort the rest), then refreshes the history list wholesale.
    pub async fn finalize(
        &mut self,
        completion: CompletionEvent,
        handle: &mut RunHandle,
        api: &ApiClient,
    ) -> Result<RunSummary> {
        if self.state != RunState::Running {
            return Err(Error::Validation("no run is being tracked".to_string()));
        }

        self.state = RunState::Finalizing;
        handle.unsubscribe();
        self.status = completion.message.clone();

        for outcome in &mut self.outcomes {
            match api.fetch_log(&outcome.record.evaluation_log).await {
                Ok(text) => outcome.log = Some(text),
                Err(error) => {
                    tracing::warn!(evaluation = %outcome.record.id, %error, "evaluation log unavailable");
                    self.warnings.push(error.to_string());
                }
            }
        }

        let history = match api.fetch_evaluations().await {
            Ok(records) => Some(records),
            Err(error) => {
                tracing::warn!(%error, "failed to refresh evaluation history");
                self.warnings.push(error.to_string());
                None
            }
        };

        self.state = RunState::Idle;

        Ok(RunSummary {
            message: completion.message,
            outcomes: std::mem::take(&mut self.outcomes),
            completed: self.completed,
            total: self.total,
            warnings: std::mem::take(&mut self.warnings),
            history,
        })
    }

    /// Drive a submitted run to completion.
    ///
    /// Events are handled in delivery order; queued progress is drained
    /// before the completion signal is honored, so results published ahead
    /// of it are never lost. Each wait is bounded by the configured event
    /// timeout.
    pub async fn track(
        &mut self,
        mut handle: RunHandle,
        api: &ApiClient,
        mut on_progress: impl FnMut(&ProgressEvent),
    ) -> Result<RunSummary> {
        loop {
            let next = tokio::time::timeout(self.event_timeout, async {
                tokio::select! {
                    biased;
                    progress = handle.progress.recv() => RunEvent::Progress(progress),
                    completion = handle.completion.recv() => RunEvent::Completion(completion),
                }
            })
            .await;

            match next {
                Err(_) => {
                    handle.unsubscribe();
                    self.state = RunState::Idle;
                    return Err(Error::Timeout(self.event_timeout.as_secs()));
                }
                Ok(RunEvent::Progress(Some(event))) => {
                    on_progress(&event);
                    self.handle_progress(event);
                }
                Ok(RunEvent::Completion(Some(completion))) => {
                    return self.finalize(completion, &mut handle, api).await;
                }
                Ok(RunEvent::Progress(None)) | Ok(RunEvent::Completion(None)) => {
                    handle.unsubscribe();
                    self.state = RunState::Idle;
                    return Err(Error::ChannelClosed);
                }
            }
        }
    }

    fn validate_selection(&self) -> Result<()> {
        if self.selected_models.is_empty() {
            return Err(Error::Validation("select at least one model".to_string()));
        }
        if self.selected_scenarios.is_empty() {
            return Err(Error::Validation(
                "select at least one scenario".to_string(),
            ));
        }

        let known_models: HashSet<&str> = self.models.iter().map(|m| m.id.as_str()).collect();
        let known_scenarios: HashSet<&str> =
            self.scenarios.iter().map(|s| s.id.as_str()).collect();

        let mut unknown: Vec<&str> = self
            .selected_models
            .iter()
            .map(String::as_str)
            .filter(|id| !known_models.contains(id))
            .chain(
                self.selected_scenarios
                    .iter()
                    .map(String::as_str)
                    .filter(|id| !known_scenarios.contains(id)),
            )
            .collect();

        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(Error::Validation(format!(
                "unknown ids: {}",
                unknown.join(", ")
            )));
        }

        Ok(())
    }

    fn build_request(&self) -> RunRequest {
        let selection = self.saved_selection();
        RunRequest {
            model_ids: selection.selected_models,
            scenario_ids: selection.selected_scenarios,
        }
    }
}

enum RunEvent {
    Progress(Option<ProgressEvent>),
    Completion(Option<CompletionEvent>),
}

fn toggle(set: &mut HashSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::models::{Metrics, ModelRef, ScenarioRef};
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;

    fn catalogs() -> (Vec<ModelInfo>, Vec<ScenarioInfo>) {
        let models = vec![
            ModelInfo {
                id: "m1".to_string(),
                name: "GPT-Eval".to_string(),
                description: None,
            },
            ModelInfo {
                id: "m2".to_string(),
                name: "Claude".to_string(),
                description: None,
            },
        ];
        let scenarios = vec![
            ScenarioInfo {
                id: "s1".to_string(),
                title: "Install Firefox".to_string(),
                category: Some("installer".to_string()),
                description: None,
            },
            ScenarioInfo {
                id: "s2".to_string(),
                title: "Patch Office".to_string(),
                category: Some("update".to_string()),
                description: None,
            },
        ];
        (models, scenarios)
    }

    fn coordinator() -> RunCoordinator {
        let (models, scenarios) = catalogs();
        RunCoordinator::new(models, scenarios, Duration::from_secs(5))
    }

    fn client_for(server: &mockito::Server) -> ApiClient {
        let config = ClientConfig {
            base_url: server.url(),
            ..ClientConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    fn record_with_log(id: &str, log_path: &str) -> EvaluationRecord {
        EvaluationRecord {
            id: id.to_string(),
            model: ModelRef {
                name: "GPT-Eval".to_string(),
            },
            scenario: ScenarioRef {
                title: "Install Firefox".to_string(),
                category: None,
            },
            metrics: Metrics {
                trust_score: 0.9,
                hallucinations_found: 1,
                hallucinations_corrected: 1,
            },
            raw_model_output: "raw".to_string(),
            advisor_corrected_output: "corrected".to_string(),
            detailed_hallucination_report: vec![],
            detailed_corrections_log: vec![],
            timestamp: Utc.with_ymd_and_hms(2025, 11, 4, 12, 0, 0).unwrap(),
            evaluation_log: log_path.to_string(),
        }
    }

    fn status_event(percent: f64, status: &str) -> ProgressEvent {
        ProgressEvent {
            progress: percent,
            status: status.to_string(),
            result: None,
            error: None,
        }
    }

    fn result_event(percent: f64, record: EvaluationRecord) -> ProgressEvent {
        ProgressEvent {
            progress: percent,
            status: "pair finished".to_string(),
            result: Some(record),
            error: None,
        }
    }

    #[test]
    fn test_toggle_and_select_all() {
        let mut coordinator = coordinator();

        assert!(coordinator.toggle_model("m1"));
        assert!(!coordinator.toggle_model("m1"));
        assert!(coordinator.selected_models().is_empty());

        coordinator.select_all_models();
        coordinator.select_all_scenarios();
        assert_eq!(coordinator.selected_models().len(), 2);
        assert_eq!(coordinator.selected_scenarios().len(), 2);

        coordinator.clear_scenarios();
        assert!(coordinator.selected_scenarios().is_empty());
    }

    #[test]
    fn test_restore_selection_drops_stale_ids() {
        let mut coordinator = coordinator();
        let saved = SavedSelection {
            selected_models: vec!["m1".to_string(), "retired".to_string()],
            selected_scenarios: vec!["s2".to_string()],
        };

        coordinator.restore_selection(&saved);

        assert!(coordinator.selected_models().contains("m1"));
        assert!(!coordinator.selected_models().contains("retired"));
        assert!(coordinator.selected_scenarios().contains("s2"));
    }

    #[tokio::test]
    async fn test_submit_empty_selection_sends_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/evaluations/run")
            .expect(0)
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.toggle_model("m1");

        let result = coordinator.submit(&api, &channel).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(coordinator.state(), RunState::Idle);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_unknown_id_sends_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/evaluations/run")
            .expect(0)
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.toggle_model("m1");
        coordinator.toggle_scenario("ghost");

        let err = coordinator.submit(&api, &channel).await.unwrap_err();

        assert!(err.to_string().contains("ghost"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_failure_returns_to_idle_and_keeps_selection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/evaluations/run")
            .with_status(200)
            .with_body(r#"{"error": "backend busy"}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.toggle_model("m1");
        coordinator.toggle_scenario("s1");

        let err = coordinator.submit(&api, &channel).await.unwrap_err();

        assert!(matches!(err, Error::Submission(_)));
        assert_eq!(coordinator.state(), RunState::Idle);
        assert!(coordinator.selected_models().contains("m1"));
        assert!(coordinator.selected_scenarios().contains("s1"));

        // The same selection can be submitted again once the backend
        // recovers; the newer mock takes precedence over the failing one.
        server
            .mock("POST", "/api/evaluations/run")
            .with_status(200)
            .with_body(r#"{"message": "started"}"#)
            .create_async()
            .await;

        let handle = coordinator.submit(&api, &channel).await.unwrap();
        assert_eq!(coordinator.state(), RunState::Running);
        assert!(handle.is_active());
    }

    #[tokio::test]
    async fn test_submit_while_running_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/evaluations/run")
            .with_status(200)
            .with_body(r#"{"message": "started"}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.toggle_model("m1");
        coordinator.toggle_scenario("s1");

        let _handle = coordinator.submit(&api, &channel).await.unwrap();
        let err = coordinator.submit(&api, &channel).await.unwrap_err();

        assert!(err.to_string().contains("already in flight"));
    }

    #[tokio::test]
    async fn test_submit_resets_progress_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/evaluations/run")
            .match_body(Matcher::Json(serde_json::json!({
                "model_ids": ["m1", "m2"],
                "scenario_ids": ["s1"]
            })))
            .with_status(200)
            .with_body(r#"{"message": "started"}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.select_all_models();
        coordinator.toggle_scenario("s1");

        let _handle = coordinator.submit(&api, &channel).await.unwrap();

        assert_eq!(coordinator.progress(), 0.0);
        assert_eq!(coordinator.completed(), 0);
        assert_eq!(coordinator.total(), 2);
    }

    #[tokio::test]
    async fn test_track_accumulates_results_and_finalizes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/evaluations/run")
            .with_status(200)
            .with_body(r#"{"message": "started"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/evaluations/logs")
            .match_query(Matcher::UrlEncoded("path".into(), "logs/a.log".into()))
            .with_status(200)
            .with_body("log a")
            .create_async()
            .await;
        server
            .mock("GET", "/api/evaluations/logs")
            .match_query(Matcher::UrlEncoded("path".into(), "logs/b.log".into()))
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/api/evaluations/logs")
            .match_query(Matcher::UrlEncoded("path".into(), "logs/c.log".into()))
            .with_status(200)
            .with_body("log c")
            .create_async()
            .await;
        server
            .mock("GET", "/api/evaluations")
            .with_status(200)
            .with_body(
                r#"[{"id": "h1", "model": {"name": "GPT-Eval"},
                     "scenario": {"title": "Install Firefox"},
                     "metrics": {"trust_score": 0.9},
                     "timestamp": "2025-11-04T12:00:00Z"}]"#,
            )
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.toggle_model("m1");
        coordinator.toggle_scenario("s1");
        coordinator.toggle_scenario("s2");

        let handle = coordinator.submit(&api, &channel).await.unwrap();

        // Interleave status-only updates, out-of-order percentages, a pair
        // failure, and three result-carrying events before the completion
        // signal.
        channel.publish_progress(status_event(5.0, "warming up"));
        channel.publish_progress(result_event(30.0, record_with_log("e1", "logs/a.log")));
        channel.publish_progress(status_event(10.0, "late update"));
        channel.publish_progress(ProgressEvent {
            progress: 60.0,
            status: "one pair failed".to_string(),
            result: None,
            error: Some("model timed out".to_string()),
        });
        channel.publish_progress(result_event(80.0, record_with_log("e2", "logs/b.log")));
        channel.publish_progress(result_event(95.0, record_with_log("e3", "logs/c.log")));
        channel.publish_completion(CompletionEvent {
            message: "Evaluation finished".to_string(),
        });

        let mut seen_events = 0;
        let summary = coordinator
            .track(handle, &api, |_| seen_events += 1)
            .await
            .unwrap();

        assert_eq!(seen_events, 6);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.message, "Evaluation finished");
        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.outcomes[0].log.as_deref(), Some("log a"));
        assert!(summary.outcomes[1].log.is_none());
        assert_eq!(summary.outcomes[2].log.as_deref(), Some("log c"));
        assert_eq!(summary.warnings.len(), 2);
        assert_eq!(summary.history.as_ref().map(|h| h.len()), Some(1));
        assert_eq!(coordinator.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_result_count_matches_result_carrying_events() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/evaluations/run")
            .with_status(200)
            .with_body(r#"{"message": "started"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/evaluations/logs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("log")
            .create_async()
            .await;
        server
            .mock("GET", "/api/evaluations")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.toggle_model("m1");
        coordinator.toggle_scenario("s1");

        let handle = coordinator.submit(&api, &channel).await.unwrap();

        // Two results buried among five non-result events, in no particular
        // percentage order.
        channel.publish_progress(status_event(90.0, "a"));
        channel.publish_progress(status_event(10.0, "b"));
        channel.publish_progress(result_event(50.0, record_with_log("e1", "logs/a.log")));
        channel.publish_progress(status_event(20.0, "c"));
        channel.publish_progress(status_event(70.0, "d"));
        channel.publish_progress(result_event(40.0, record_with_log("e2", "logs/a.log")));
        channel.publish_progress(status_event(99.0, "e"));
        channel.publish_completion(CompletionEvent {
            message: "done".to_string(),
        });

        let summary = coordinator.track(handle, &api, |_| {}).await.unwrap();

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.outcomes.len(), 2);
        // The latest delivered percentage wins even though it is lower than
        // an earlier one.
        assert_eq!(coordinator.progress(), 99.0);
    }

    #[tokio::test]
    async fn test_result_without_log_path_is_kept_without_log() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/evaluations/run")
            .with_status(200)
            .with_body(r#"{"message": "started"}"#)
            .create_async()
            .await;
        let logs_mock = server
            .mock("GET", "/api/evaluations/logs")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        server
            .mock("GET", "/api/evaluations")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let mut coordinator = coordinator();
        coordinator.toggle_model("m1");
        coordinator.toggle_scenario("s1");

        let handle = coordinator.submit(&api, &channel).await.unwrap();
        channel.publish_progress(result_event(100.0, record_with_log("e1", "")));
        channel.publish_completion(CompletionEvent {
            message: "done".to_string(),
        });

        let summary = coordinator.track(handle, &api, |_| {}).await.unwrap();

        assert_eq!(summary.outcomes.len(), 1);
        assert!(summary.outcomes[0].log.is_none());
        assert_eq!(summary.warnings.len(), 1);
        logs_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_track_times_out_without_events() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/evaluations/run")
            .with_status(200)
            .with_body(r#"{"message": "started"}"#)
            .create_async()
            .await;

        let api = client_for(&server);
        let channel = EventChannel::new();
        let (models, scenarios) = catalogs();
        let mut coordinator =
            RunCoordinator::new(models, scenarios, Duration::from_millis(50));
        coordinator.toggle_model("m1");
        coordinator.toggle_scenario("s1");

        let handle = coordinator.submit(&api, &channel).await.unwrap();
        let result = coordinator.track(handle, &api, |_| {}).await;

        assert!(matches!(result, Err(Error::Timeout(_))));
        assert_eq!(coordinator.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_progress_outside_running_state_is_dropped() {
        let mut coordinator = coordinator();
        coordinator.handle_progress(status_event(50.0, "stray event"));

        assert_eq!(coordinator.progress(), 0.0);
        assert!(coordinator.status().is_empty());
    }
}
