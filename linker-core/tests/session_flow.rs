//! End-to-end panel session flows against an in-process channel.
//!
//! The "host" is a crossbeam receiver the test drains; replies are injected as
//! `ChannelEvent::Message`. Each test gets its own temp database.

use crossbeam_channel::{Receiver, Sender};
use serde_json::{json, Value};

use linker_core::db::{StateStore, StoreKey};
use linker_core::protocol::Request;
use linker_core::selection::SelectionTracker;
use linker_core::session::DEFAULT_BENIGN_MARKER;
use linker_core::{
    ChannelEvent, ChannelId, Connector, Context, ContextKind, LinkEdge, LinkerError, LinkerResult,
    NativeSessionManager, PanelState, PanelView, PredictionResult, Suggestion,
};

#[derive(Default)]
struct RecordingView {
    rendered: Vec<Vec<String>>,
    errors: Vec<String>,
    notices: Vec<String>,
    states: Vec<PanelState>,
}

impl RecordingView {
    fn last_render(&self) -> Option<&Vec<String>> {
        self.rendered.last()
    }
}

impl PanelView for RecordingView {
    fn render(&mut self, suggestions: &[Suggestion]) {
        self.rendered.push(suggestions.iter().map(|s| s.id.clone()).collect());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_owned());
    }

    fn show_notice(&mut self, message: &str) {
        self.notices.push(message.to_owned());
    }

    fn state_changed(&mut self, state: PanelState) {
        self.states.push(state);
    }
}

#[derive(Default)]
struct TestConnector {
    receivers: Vec<Receiver<Request>>,
    fail_with: Option<String>,
}

impl TestConnector {
    /// Drains everything sent on the most recent channel.
    fn sent(&self) -> Vec<Request> {
        self.receivers.last().map(|rx| rx.try_iter().collect()).unwrap_or_default()
    }
}

impl Connector for TestConnector {
    fn open(&mut self, _channel: ChannelId) -> LinkerResult<Sender<Request>> {
        if let Some(reason) = &self.fail_with {
            return Err(LinkerError::ChannelUnavailable(reason.clone()));
        }
        let (tx, rx) = crossbeam_channel::unbounded();
        self.receivers.push(rx);
        Ok(tx)
    }
}

type Manager = NativeSessionManager<RecordingView>;

async fn fresh_store() -> StateStore {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("state.db");
    StateStore::open(&path.to_string_lossy()).await.unwrap()
}

async fn activate(store: &StateStore, url: &str) -> Manager {
    NativeSessionManager::activate(store.clone(), RecordingView::default(), url, DEFAULT_BENIGN_MARKER)
        .await
        .unwrap()
}

/// Connects and delivers `Opened`; returns the channel id.
async fn open(manager: &mut Manager, connector: &mut TestConnector) -> ChannelId {
    manager.connect(connector).unwrap();
    assert_eq!(manager.state(), PanelState::Connecting);
    let id = manager.channel_id().unwrap();
    manager.handle_channel_event(id, ChannelEvent::Opened).await.unwrap();
    id
}

async fn reply(manager: &mut Manager, id: ChannelId, value: Value) {
    manager.handle_channel_event(id, ChannelEvent::Message(value)).await.unwrap();
}

fn prediction_for(repository: &str, kind: ContextKind, id: &str) -> Request {
    Request::prediction(&Context { repository: repository.into(), kind, local_id: id.into() })
}

fn suggestion(id: &str, probability: f64) -> Value {
    json!({"Repo": "x/y", "Id": id, "Title": format!("title {id}"), "Probability": probability})
}

#[tokio::test]
async fn end_to_end_prediction_and_threshold_filtering() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;
    assert_eq!(manager.state(), PanelState::Disconnected);

    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    assert_eq!(
        connector.sent(),
        vec![
            Request::Threshold { repository: "x/y".into() },
            prediction_for("x/y", ContextKind::Issue, "42"),
        ]
    );
    assert_eq!(manager.state(), PanelState::AwaitingPrediction);

    reply(&mut manager, id, json!({"Threshold": 0.2})).await;
    reply(
        &mut manager,
        id,
        json!({"Suggestions": [{"Repo": "x/y", "Id": "7", "Title": "t", "Probability": 0.3}], "Error": null}),
    )
    .await;
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);

    manager.set_threshold(0.25).await.unwrap();
    assert_eq!(manager.view().last_render(), Some(&vec!["7".to_owned()]));
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);

    manager.set_threshold(0.35).await.unwrap();
    assert_eq!(manager.view().last_render(), Some(&Vec::new()));
    let notice = manager.view().notices.last().unwrap();
    assert!(notice.contains("No suggestions at or above 35%"), "{notice}");
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);
    assert!(connector.sent().is_empty(), "re-filtering never touches the channel");
}

#[tokio::test]
async fn threshold_hint_sizes_the_control() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/pull/1").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;

    reply(&mut manager, id, json!({"Threshold": 0.10})).await;
    let bounds = manager.session().thresholds;
    assert!((bounds.max - 0.20).abs() < 1e-12, "max was {}", bounds.max);
    assert!((bounds.value - 0.10).abs() < 1e-12, "threshold was {}", bounds.value);
    assert_eq!(
        store.threshold_hint("x/y").await.unwrap().map(|h| h.value),
        Some(0.10),
        "hint is durable"
    );
}

#[tokio::test]
async fn identical_context_reuses_the_persisted_result() {
    let store = fresh_store().await;
    let url = "https://github.com/x/y/issues/42";
    {
        let mut manager = activate(&store, url).await;
        let mut connector = TestConnector::default();
        let id = open(&mut manager, &mut connector).await;
        reply(&mut manager, id, json!({"Threshold": 0.2})).await;
        reply(&mut manager, id, json!({"Suggestions": [suggestion("7", 0.3), suggestion("8", 0.1)]})).await;
        assert!(manager.toggle("7").await.unwrap());
        // Panel closes here: everything in memory is dropped.
    }

    let mut manager = activate(&store, url).await;
    assert_eq!(
        manager.view().last_render(),
        Some(&vec!["7".to_owned()]),
        "restored view is rendered before connecting"
    );
    assert!(manager.session().selection.is_selected("7"));

    let mut connector = TestConnector::default();
    open(&mut manager, &mut connector).await;
    assert!(connector.sent().is_empty(), "no prediction or hint request for a known page");
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);
    assert_eq!(manager.view().last_render(), Some(&vec!["7".to_owned()]));
}

#[tokio::test]
async fn changed_context_clears_selection_and_requests_again() {
    let store = fresh_store().await;
    let persisted = Context { repository: "a/b".into(), kind: ContextKind::Issue, local_id: "3".into() };
    store.replace_context(&persisted, false).await.unwrap();
    store
        .save_result(&PredictionResult {
            suggestions: vec![Suggestion {
                repository: "a/b".into(),
                id: "9".into(),
                title: "old".into(),
                probability: 0.9,
            }],
            error: None,
        })
        .await
        .unwrap();
    store.save_selection(&SelectionTracker::from_ids(["9".to_owned()])).await.unwrap();

    let mut manager = activate(&store, "https://github.com/a/b/issues/4").await;
    assert!(manager.session().selection.is_empty());
    assert_eq!(manager.session().last_result, None);
    assert_eq!(store.get(StoreKey::Selected).await.unwrap(), None);
    assert_eq!(store.get(StoreKey::LocalId).await.unwrap().as_deref(), Some("4"));
    assert!(manager.view().rendered.is_empty(), "stale result is never shown");

    let mut connector = TestConnector::default();
    open(&mut manager, &mut connector).await;
    assert!(connector.sent().contains(&prediction_for("a/b", ContextKind::Issue, "4")));
    assert_eq!(manager.state(), PanelState::AwaitingPrediction);
}

#[tokio::test]
async fn recording_links_orients_edges_and_clears_selection() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/a/b/pull/5").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    connector.sent();

    reply(&mut manager, id, json!({"Threshold": 0.1})).await;
    reply(&mut manager, id, json!({"Suggestions": [suggestion("9", 0.5), suggestion("10", 0.05)]})).await;

    assert!(manager.toggle("9").await.unwrap());
    assert!(!manager.toggle("10").await.unwrap(), "hidden suggestions cannot be selected");
    assert!(!manager.toggle("404").await.unwrap());

    manager.record_selections().unwrap();
    assert_eq!(manager.state(), PanelState::RecordingSelections);
    assert_eq!(
        connector.sent(),
        vec![Request::LinkUpdate {
            repository: "a/b".into(),
            links: vec![LinkEdge("9".into(), "5".into())],
        }]
    );
    assert!(manager.session().selection.is_selected("9"), "kept until acknowledged");

    reply(&mut manager, id, json!({})).await;
    assert!(manager.session().selection.is_empty());
    assert_eq!(manager.session().last_result, None);
    assert_eq!(store.get(StoreKey::LastResult).await.unwrap(), None);
    assert_eq!(manager.state(), PanelState::AwaitingPrediction);
    assert_eq!(connector.sent(), vec![prediction_for("a/b", ContextKind::PullRequest, "5")]);
}

#[tokio::test]
async fn recording_from_an_issue_page_leads_with_the_page_id() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/5").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    connector.sent();

    reply(&mut manager, id, json!({"Suggestions": [suggestion("9", 0.5)]})).await;
    manager.toggle("9").await.unwrap();
    manager.record_selections().unwrap();
    assert_eq!(
        connector.sent(),
        vec![Request::LinkUpdate {
            repository: "x/y".into(),
            links: vec![LinkEdge("5".into(), "9".into())],
        }]
    );

    reply(&mut manager, id, json!({"Error": "database locked"})).await;
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);
    assert!(manager.session().selection.is_selected("9"), "a failed recording keeps the selection");
    assert!(manager.view().errors.last().unwrap().contains("database locked"));
}

#[tokio::test]
async fn model_update_ack_does_not_complete_link_recording() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/a/b/pull/5").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    connector.sent();

    reply(&mut manager, id, json!({"Threshold": 0.1})).await;
    reply(&mut manager, id, json!({"Suggestions": [suggestion("9", 0.5)]})).await;

    manager.request_model_update().unwrap();
    assert!(manager.toggle("9").await.unwrap());
    manager.record_selections().unwrap();
    assert_eq!(connector.sent().len(), 2);

    // Answers the Update, not the LinkUpdate behind it.
    reply(&mut manager, id, json!({})).await;
    assert!(manager.session().selection.is_selected("9"));
    assert!(manager.session().last_result.is_some());
    assert_eq!(manager.state(), PanelState::RecordingSelections);
    assert!(!manager.view().notices.iter().any(|n| n.starts_with("Recorded")));

    reply(&mut manager, id, json!({"Error": "could not store links"})).await;
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);
    assert!(manager.session().selection.is_selected("9"));
    assert!(manager.view().errors.last().unwrap().contains("could not store links"));
    assert!(connector.sent().is_empty(), "a rejected recording is not followed by a new prediction");
}

#[tokio::test]
async fn failed_model_update_is_reported() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/a/b/pull/5").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    reply(&mut manager, id, json!({"Threshold": 0.1})).await;
    reply(&mut manager, id, json!({"Suggestions": [suggestion("9", 0.5)]})).await;

    manager.request_model_update().unwrap();
    reply(&mut manager, id, json!({"Error": "training data unavailable"})).await;
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);
    assert_eq!(
        manager.view().errors.last().map(String::as_str),
        Some("Model update failed: training data unavailable")
    );
}

#[tokio::test]
async fn undecodable_prediction_settles_the_request() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    connector.sent();
    reply(&mut manager, id, json!({"Threshold": 0.1})).await;

    reply(&mut manager, id, json!({"Suggestions": [{"Repo": "x/y", "Id": "1", "Title": "t"}]})).await;
    assert_eq!(manager.state(), PanelState::ShowingError);
    assert!(manager.view().errors.last().unwrap().contains("malformed prediction response"));
    assert!(manager.view().errors.last().unwrap().contains("Probability"));

    manager.request_prediction().unwrap();
    assert_eq!(connector.sent(), vec![prediction_for("x/y", ContextKind::Issue, "42")]);
    reply(&mut manager, id, json!({"Suggestions": [suggestion("1", 0.5)]})).await;
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);
    assert_eq!(manager.view().last_render(), Some(&vec!["1".to_owned()]));

    // Nothing is waiting for a prediction any more.
    reply(&mut manager, id, json!({"Suggestions": [suggestion("2", 0.5)]})).await;
    assert_eq!(manager.view().last_render(), Some(&vec!["1".to_owned()]));
}

#[tokio::test]
async fn late_reply_after_reconnect_is_ignored() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;
    let mut connector = TestConnector::default();
    let first = open(&mut manager, &mut connector).await;

    manager
        .handle_channel_event(first, ChannelEvent::Closed("host exited".into()))
        .await
        .unwrap();
    assert_eq!(manager.state(), PanelState::Disconnected);
    assert_eq!(manager.view().errors.last().unwrap(), "Failed to connect: host exited");

    let second = open(&mut manager, &mut connector).await;
    assert_ne!(first, second);
    assert_eq!(manager.state(), PanelState::AwaitingPrediction);

    reply(&mut manager, first, json!({"Suggestions": [suggestion("7", 0.9)]})).await;
    assert_eq!(manager.session().last_result, None);
    assert_eq!(manager.state(), PanelState::AwaitingPrediction);

    reply(&mut manager, second, json!({"Suggestions": [suggestion("8", 0.9)]})).await;
    assert_eq!(manager.visible_suggestions().len(), 1);
    assert_eq!(manager.visible_suggestions()[0].id, "8");
}

#[tokio::test]
async fn requests_queue_while_connecting_and_fail_while_disconnected() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;

    let err = manager.request_prediction().unwrap_err();
    assert!(matches!(err, LinkerError::ChannelUnavailable(_)));
    assert!(manager.view().errors.last().unwrap().starts_with("Failed to connect"));

    let mut connector = TestConnector::default();
    manager.connect(&mut connector).unwrap();
    manager.request_model_update().unwrap();
    assert!(connector.sent().is_empty(), "nothing leaves before the channel is open");

    let id = manager.channel_id().unwrap();
    manager.handle_channel_event(id, ChannelEvent::Opened).await.unwrap();
    assert_eq!(
        connector.sent(),
        vec![
            Request::Update,
            Request::Threshold { repository: "x/y".into() },
            prediction_for("x/y", ContextKind::Issue, "42"),
        ]
    );
}

#[tokio::test]
async fn transient_empty_result_is_retried_once() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    connector.sent();

    reply(&mut manager, id, json!({"Suggestions": [], "Error": "model not ready"})).await;
    assert_eq!(connector.sent(), vec![prediction_for("x/y", ContextKind::Issue, "42")]);
    assert_eq!(manager.state(), PanelState::AwaitingPrediction);

    reply(&mut manager, id, json!({"Suggestions": [], "Error": "model not ready"})).await;
    assert!(connector.sent().is_empty(), "only one automatic retry");
    assert_eq!(manager.state(), PanelState::ShowingError);
    assert!(manager.view().errors.last().unwrap().contains("model not ready"));
}

#[tokio::test]
async fn benign_empty_result_is_informational() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    connector.sent();

    reply(
        &mut manager,
        id,
        json!({"Suggestions": [], "Error": "No suggestions above any threshold for this issue."}),
    )
    .await;
    assert!(connector.sent().is_empty());
    assert_eq!(manager.state(), PanelState::ShowingSuggestions);
    assert!(manager.view().errors.is_empty());
    assert_eq!(
        manager.view().notices.last().unwrap(),
        "No suggestions above any threshold for this issue."
    );
}

#[tokio::test]
async fn persisted_transient_result_is_requested_again() {
    let store = fresh_store().await;
    let page = Context { repository: "a/b".into(), kind: ContextKind::Issue, local_id: "3".into() };
    store.replace_context(&page, false).await.unwrap();
    store
        .save_result(&PredictionResult { suggestions: Vec::new(), error: Some("timeout".into()) })
        .await
        .unwrap();

    let mut manager = activate(&store, "https://github.com/a/b/issues/3").await;
    assert!(manager.view().rendered.is_empty());

    let mut connector = TestConnector::default();
    open(&mut manager, &mut connector).await;
    assert!(connector.sent().contains(&prediction_for("a/b", ContextKind::Issue, "3")));
}

#[tokio::test]
async fn connect_failure_is_reported_and_retryable() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;
    let mut broken = TestConnector {
        fail_with: Some("Specified native messaging host not found.".into()),
        ..TestConnector::default()
    };

    assert!(manager.connect(&mut broken).is_err());
    assert_eq!(manager.state(), PanelState::Disconnected);
    assert_eq!(
        manager.view().errors.last().unwrap(),
        "Failed to connect: Specified native messaging host not found."
    );

    let mut connector = TestConnector::default();
    open(&mut manager, &mut connector).await;
    assert_eq!(manager.state(), PanelState::AwaitingPrediction);
}

#[tokio::test]
async fn ineligible_page_shows_guidance_only() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y").await;
    assert!(manager.page().is_none());
    assert!(manager.view().notices[0].contains("only works on GitHub PR and Issue pages"));

    let mut connector = TestConnector::default();
    open(&mut manager, &mut connector).await;
    assert!(connector.sent().is_empty());
    assert_eq!(manager.state(), PanelState::Connected);
    assert!(matches!(manager.request_prediction(), Err(LinkerError::IneligiblePage(_))));
}

#[tokio::test]
async fn transitions_follow_the_panel_state_machine() {
    let store = fresh_store().await;
    let mut manager = activate(&store, "https://github.com/x/y/issues/42").await;
    let mut connector = TestConnector::default();
    let id = open(&mut manager, &mut connector).await;
    reply(&mut manager, id, json!({"Suggestions": [suggestion("7", 0.9)]})).await;

    assert_eq!(
        manager.view().states,
        vec![
            PanelState::Disconnected,
            PanelState::Connecting,
            PanelState::Connected,
            PanelState::AwaitingPrediction,
            PanelState::ShowingSuggestions,
        ]
    );
}
