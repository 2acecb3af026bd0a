//! The panel session: one native channel, one durable session, one view.
//!
//! `NativeSessionManager` is driven entirely by discrete events (activation,
//! channel events, user input). No handler waits for a reply: each request
//! returns immediately and its response arrives later as a separate
//! `ChannelEvent::Message`.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> AwaitingPrediction <-> ShowingSuggestions
//!                                                 |                   ^      |
//!                                                 v                   |      v
//!                                            ShowingError       RecordingSelections
//! any state --channel lost--> Disconnected
//! ```
//!
//! Responses are matched to requests by shape (see `protocol`), relying on the
//! host answering one-for-one in submission order. Every channel event carries
//! the `ChannelId` of the connection that produced it; events from any other
//! connection are dropped, so a late reply never leaks across a reconnect.

use std::collections::VecDeque;
use std::fmt;

use crossbeam_channel::Sender;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context;
use crate::db::StateStore;
use crate::error::{LinkerError, LinkerResult};
use crate::filter::{self, ThresholdBounds};
use crate::protocol::{Request, Response, Shape};
use crate::types::{Context, PredictionResult, SessionState, Suggestion, ThresholdHint};

/// Substring (case-insensitive) of `Error` that marks an empty result as final.
pub const DEFAULT_BENIGN_MARKER: &str = "no suggestions";

/// Panel states. The panel starts in `Disconnected` on every activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    AwaitingPrediction,
    ShowingSuggestions,
    RecordingSelections,
    ShowingError,
}

impl PanelState {
    pub fn label(self) -> &'static str {
        match self {
            PanelState::Disconnected => "disconnected",
            PanelState::Connecting => "connecting",
            PanelState::Connected => "connected",
            PanelState::AwaitingPrediction => "awaiting prediction",
            PanelState::ShowingSuggestions => "suggestions",
            PanelState::RecordingSelections => "recording links",
            PanelState::ShowingError => "error",
        }
    }
}

/// Identity of one connection to the native host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the transport reports about a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The host is running and accepting frames.
    Opened,
    /// One decoded inbound frame.
    Message(Value),
    /// The host could not be started, exited, or the stream broke.
    Closed(String),
}

/// Opens the duplex channel to the prediction host.
///
/// Implementations start the transport for `channel` and return the sender for
/// outbound requests. Everything the transport observes afterwards must be fed
/// back through [`NativeSessionManager::handle_channel_event`] tagged with the
/// same `channel`.
pub trait Connector {
    fn open(&mut self, channel: ChannelId) -> LinkerResult<Sender<Request>>;
}

/// Presentation callbacks exposed upward to the panel.
pub trait PanelView {
    /// Shows the filtered suggestion list (possibly empty).
    fn render(&mut self, suggestions: &[Suggestion]);
    /// Shows a human-readable failure.
    fn show_error(&mut self, message: &str);
    /// Shows informational text (guidance, benign empty results, confirmations).
    fn show_notice(&mut self, message: &str);
    fn state_changed(&mut self, _state: PanelState) {}
}

/// Reply the manager is waiting for, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Prediction,
    Threshold,
    Update,
    LinkUpdate { links: usize },
}

struct Channel {
    id: ChannelId,
    outbound: Sender<Request>,
    open: bool,
    queued: VecDeque<Request>,
    outstanding: VecDeque<Expect>,
}

impl Channel {
    fn new(id: ChannelId, outbound: Sender<Request>) -> Self {
        Self {
            id,
            outbound,
            open: false,
            queued: VecDeque::new(),
            outstanding: VecDeque::new(),
        }
    }

    /// Removes the oldest expectation satisfied by `matches`.
    fn take(&mut self, matches: impl Fn(&Expect) -> bool) -> Option<Expect> {
        let index = self.outstanding.iter().position(matches)?;
        self.outstanding.remove(index)
    }
}

pub struct NativeSessionManager<V: PanelView> {
    store: StateStore,
    view: V,
    state: PanelState,
    session: SessionState,
    /// The page this activation is for; `None` when it is not eligible.
    page: Option<Context>,
    channel: Option<Channel>,
    benign_marker: String,
    /// A threshold was persisted or chosen by the user for this repository.
    threshold_user_set: bool,
    /// A durable hint exists for this repository; no hint request is needed.
    hint_known: bool,
    /// The persisted result was still valid on activation; skip the first request.
    reuse_result: bool,
    transient_retry_used: bool,
}

impl<V: PanelView> NativeSessionManager<V> {
    /// Starts a panel activation for `page_url`.
    ///
    /// Loads the durable session, reconciles it with the resolved page and, when
    /// the persisted result still belongs to this page, renders it right away.
    /// The channel is not opened here; call [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns `LinkerError::Store` if the durable store cannot be read or written.
    pub async fn activate(
        store: StateStore,
        view: V,
        page_url: &str,
        benign_marker: &str,
    ) -> LinkerResult<Self> {
        let restored = store.load_session().await?;
        let mut manager = Self {
            store,
            view,
            state: PanelState::Disconnected,
            session: restored.state,
            page: None,
            channel: None,
            benign_marker: benign_marker.to_lowercase(),
            threshold_user_set: false,
            hint_known: false,
            reuse_result: false,
            transient_retry_used: false,
        };
        manager.view.state_changed(PanelState::Disconnected);

        match context::resolve(page_url) {
            Ok(page) => manager.reconcile(page, restored.threshold_persisted).await?,
            Err(err) => {
                info!(url = page_url, "page is not a GitHub issue or pull request");
                manager.view.show_notice(&err.to_string());
            }
        }
        Ok(manager)
    }

    async fn reconcile(&mut self, page: Context, threshold_persisted: bool) -> LinkerResult<()> {
        let previous = self.session.context.as_ref();
        let same_page = previous == Some(&page);
        let same_repository = previous.is_some_and(|c| c.repository == page.repository);

        if same_page {
            self.threshold_user_set = threshold_persisted;
            self.reuse_result = self
                .session
                .last_result
                .as_ref()
                .is_some_and(|result| !self.is_transient(result));
            debug!(
                context = %page,
                reuse = self.reuse_result,
                "persisted session matches the active page"
            );
        } else {
            info!(context = %page, same_repository, "active page changed; discarding persisted result");
            self.store.replace_context(&page, same_repository).await?;
            self.session.last_result = None;
            self.session.selection.clear();
            if same_repository {
                self.threshold_user_set = threshold_persisted;
            } else {
                self.session.thresholds = ThresholdBounds::default();
                self.threshold_user_set = false;
            }
        }

        if let Some(hint) = self.store.threshold_hint(&page.repository).await? {
            self.hint_known = true;
            self.apply_threshold_bounds(hint).await?;
        }

        self.session.context = Some(page.clone());
        self.page = Some(page);

        if self.reuse_result {
            self.refresh_view();
        }
        Ok(())
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// The context of the active page, if it is eligible.
    pub fn page(&self) -> Option<&Context> {
        self.page.as_ref()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(|c| c.id)
    }

    pub fn is_connected(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.open)
    }

    /// Suggestions at or above the current threshold, in service order.
    pub fn visible_suggestions(&self) -> Vec<Suggestion> {
        self.session
            .last_result
            .as_ref()
            .map(|result| filter::filter(result, self.session.thresholds.value))
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Channel lifecycle
    // ---------------------------------------------------------------------

    /// Opens a fresh channel. A no-op while one is already open or opening.
    ///
    /// # Errors
    ///
    /// Returns the connector's error after moving back to `Disconnected` and
    /// showing it. The user may retry.
    pub fn connect<C: Connector>(&mut self, connector: &mut C) -> LinkerResult<()> {
        if let Some(channel) = &self.channel {
            debug!(channel = %channel.id, "connect ignored; channel already present");
            return Ok(());
        }

        let id = ChannelId::new();
        self.transition(PanelState::Connecting);
        match connector.open(id) {
            Ok(outbound) => {
                info!(channel = %id, "native channel opening");
                self.channel = Some(Channel::new(id, outbound));
                Ok(())
            }
            Err(err) => {
                let err = match err {
                    LinkerError::ChannelUnavailable(_) => err,
                    other => LinkerError::ChannelUnavailable(other.to_string()),
                };
                self.transition(PanelState::Disconnected);
                warn!(error = %err, "could not open native channel");
                self.view.show_error(&err.to_string());
                Err(err)
            }
        }
    }

    /// Closes the channel on request. Outstanding replies are abandoned.
    pub fn close(&mut self) {
        if self.channel.is_some() {
            self.lose_channel("connection closed".to_owned());
        }
    }

    /// Feeds one transport event into the state machine.
    ///
    /// Events from any channel other than the current one are ignored.
    ///
    /// # Errors
    ///
    /// Returns `LinkerError::Store` if persisting the outcome fails. Protocol and
    /// channel problems are shown to the user, not returned.
    pub async fn handle_channel_event(&mut self, id: ChannelId, event: ChannelEvent) -> LinkerResult<()> {
        let Some(channel) = self.channel.as_mut().filter(|c| c.id == id) else {
            debug!(channel = %id, "dropping event from a stale channel");
            return Ok(());
        };

        match event {
            ChannelEvent::Opened => {
                if channel.open {
                    return Ok(());
                }
                channel.open = true;
                info!(channel = %id, "native channel connected");
                self.transition(PanelState::Connected);
                self.flush_queue();
                self.resume().await
            }
            ChannelEvent::Message(value) => {
                if !channel.open {
                    warn!(channel = %id, "message before the channel reported open; ignoring");
                    return Ok(());
                }
                self.on_message(value).await
            }
            ChannelEvent::Closed(reason) => {
                self.lose_channel(reason);
                Ok(())
            }
        }
    }

    /// Continues the activation once the channel is up.
    async fn resume(&mut self) -> LinkerResult<()> {
        let Some(page) = self.page.clone() else {
            self.view.show_notice(&LinkerError::IneligiblePage(String::new()).to_string());
            return Ok(());
        };

        if !self.hint_known && !self.is_outstanding(|e| *e == Expect::Threshold) {
            self.send(Request::Threshold { repository: page.repository.clone() }, Some(Expect::Threshold))?;
        }

        if self.is_outstanding(|e| *e == Expect::Prediction) {
            self.transition(PanelState::AwaitingPrediction);
        } else if self.reuse_result {
            self.reuse_result = false;
            self.transition(PanelState::ShowingSuggestions);
            self.refresh_view();
        } else {
            self.issue_prediction(&page)?;
        }
        Ok(())
    }

    fn lose_channel(&mut self, reason: String) {
        let Some(channel) = self.channel.take() else {
            return;
        };
        let abandoned = channel.outstanding.len() + channel.queued.len();
        let err = LinkerError::ChannelUnavailable(reason);
        warn!(channel = %channel.id, abandoned, error = %err, "native channel lost");
        self.transient_retry_used = false;
        self.transition(PanelState::Disconnected);
        self.view.show_error(&err.to_string());
    }

    // ---------------------------------------------------------------------
    // Outbound requests
    // ---------------------------------------------------------------------

    /// Asks for suggestions for the active page.
    ///
    /// # Errors
    ///
    /// Returns `IneligiblePage` when the page has no context and
    /// `ChannelUnavailable` when no channel exists. Both are also shown.
    pub fn request_prediction(&mut self) -> LinkerResult<()> {
        let page = self.require_page()?;
        self.transient_retry_used = false;
        self.issue_prediction(&page)
    }

    fn issue_prediction(&mut self, page: &Context) -> LinkerResult<()> {
        self.send(Request::prediction(page), Some(Expect::Prediction))?;
        self.transition(PanelState::AwaitingPrediction);
        Ok(())
    }

    /// Asks for the repository's confidence hint, used to size the threshold control.
    pub fn request_threshold_hint(&mut self) -> LinkerResult<()> {
        let page = self.require_page()?;
        self.send(Request::Threshold { repository: page.repository }, Some(Expect::Threshold))
    }

    /// Asks the host to retrain. Nothing waits on it, but its acknowledgement
    /// is tracked so it is not mistaken for the reply to a later `LinkUpdate`.
    pub fn request_model_update(&mut self) -> LinkerResult<()> {
        self.send(Request::Update, Some(Expect::Update))?;
        self.view.show_notice("Model update requested.");
        Ok(())
    }

    /// Sends the selected, currently visible suggestions as confirmed links.
    ///
    /// Moves to `RecordingSelections`; the selection is cleared only once the
    /// host acknowledges.
    pub fn record_selections(&mut self) -> LinkerResult<()> {
        let page = self.require_page()?;
        if self.state != PanelState::ShowingSuggestions {
            self.view.show_notice("Nothing to record yet.");
            return Ok(());
        }

        let visible = self.visible_suggestions();
        let links = self
            .session
            .selection
            .build_visible_edges(&page, visible.iter().map(|s| s.id.as_str()));
        if links.is_empty() {
            self.view.show_notice("Select at least one suggestion to record.");
            return Ok(());
        }

        let count = links.len();
        info!(context = %page, links = count, "recording confirmed links");
        self.send(
            Request::LinkUpdate { repository: page.repository.clone(), links },
            Some(Expect::LinkUpdate { links: count }),
        )?;
        self.transition(PanelState::RecordingSelections);
        Ok(())
    }

    fn require_page(&mut self) -> LinkerResult<Context> {
        match &self.page {
            Some(page) => Ok(page.clone()),
            None => {
                let err = LinkerError::IneligiblePage(String::new());
                self.view.show_notice(&err.to_string());
                Err(err)
            }
        }
    }

    fn send(&mut self, request: Request, expect: Option<Expect>) -> LinkerResult<()> {
        let Some(channel) = self.channel.as_mut() else {
            let err = LinkerError::ChannelUnavailable(format!(
                "not connected; {} request was not sent",
                request.type_name()
            ));
            warn!(error = %err, "request rejected");
            self.view.show_error(&err.to_string());
            return Err(err);
        };

        if let Some(expect) = expect {
            channel.outstanding.push_back(expect);
        }
        if !channel.open {
            debug!(channel = %channel.id, request = request.type_name(), "queued until connected");
            channel.queued.push_back(request);
            return Ok(());
        }

        debug!(channel = %channel.id, request = request.type_name(), "sending");
        if channel.outbound.send(request).is_err() {
            self.lose_channel("native host worker stopped".to_owned());
            return Err(LinkerError::ChannelUnavailable("native host worker stopped".to_owned()));
        }
        Ok(())
    }

    fn flush_queue(&mut self) {
        let Some(channel) = self.channel.as_mut() else {
            return;
        };
        let mut broken = false;
        while let Some(request) = channel.queued.pop_front() {
            debug!(channel = %channel.id, request = request.type_name(), "sending queued");
            if channel.outbound.send(request).is_err() {
                broken = true;
                break;
            }
        }
        if broken {
            self.lose_channel("native host worker stopped".to_owned());
        }
    }

    fn is_outstanding(&self, matches: impl Fn(&Expect) -> bool) -> bool {
        self.channel.as_ref().is_some_and(|c| c.outstanding.iter().any(matches))
    }

    // ---------------------------------------------------------------------
    // Inbound responses
    // ---------------------------------------------------------------------

    async fn on_message(&mut self, value: Value) -> LinkerResult<()> {
        let response = match Response::classify(value) {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "undecodable message from native host");
                self.view.show_error(&err.to_string());
                return Ok(());
            }
        };

        let Some(channel) = self.channel.as_mut() else {
            return Ok(());
        };
        match response {
            Response::Threshold(hint) => {
                if channel.take(|e| *e == Expect::Threshold).is_none() {
                    debug!("unsolicited threshold hint; applying anyway");
                }
                self.on_threshold_hint(hint).await
            }
            Response::Prediction(result) => {
                if channel.take(|e| *e == Expect::Prediction).is_none() {
                    warn!("prediction response without a pending request; ignoring");
                    return Ok(());
                }
                self.on_prediction(result).await
            }
            Response::Acknowledged { error } => {
                // Acks are shapeless, so they settle Update and LinkUpdate in submission order.
                match channel.take(|e| matches!(e, Expect::Update | Expect::LinkUpdate { .. })) {
                    Some(Expect::LinkUpdate { links }) => self.on_links_recorded(links, error).await,
                    Some(_) => {
                        match error {
                            Some(error) => {
                                warn!(error = %error, "native host rejected the model update");
                                self.view.show_error(&format!("Model update failed: {error}"));
                            }
                            None => info!("model update acknowledged"),
                        }
                        Ok(())
                    }
                    None => {
                        match error {
                            Some(error) => {
                                warn!(error = %error, "native host reported an error");
                                self.view.show_error(&error);
                            }
                            None => debug!("unsolicited acknowledgement"),
                        }
                        Ok(())
                    }
                }
            }
            Response::Malformed { shape, reason } => {
                let err = LinkerError::Protocol(format!("malformed {} response: {reason}", shape.label()));
                warn!(error = %err, "undecodable reply from native host");
                match shape {
                    Shape::Threshold => {
                        channel.take(|e| *e == Expect::Threshold);
                        self.view.show_error(&err.to_string());
                    }
                    Shape::Prediction => {
                        if channel.take(|e| *e == Expect::Prediction).is_none() {
                            return Ok(());
                        }
                        self.transient_retry_used = false;
                        self.transition(PanelState::ShowingError);
                        self.view.render(&[]);
                        self.view.show_error(&err.to_string());
                    }
                }
                Ok(())
            }
        }
    }

    async fn on_threshold_hint(&mut self, hint: ThresholdHint) -> LinkerResult<()> {
        let Some(page) = self.page.clone() else {
            return Ok(());
        };
        self.store.save_threshold_hint(&page.repository, hint).await?;
        self.hint_known = true;
        self.apply_threshold_bounds(hint).await?;
        info!(
            repository = %page.repository,
            hint = hint.value,
            threshold = self.session.thresholds.value,
            max = self.session.thresholds.max,
            "applied threshold hint"
        );
        if self.state == PanelState::ShowingSuggestions {
            self.refresh_view();
        }
        Ok(())
    }

    async fn apply_threshold_bounds(&mut self, hint: ThresholdHint) -> LinkerResult<()> {
        self.session.thresholds.apply_hint(hint, self.threshold_user_set);
        self.store.save_thresholds(&self.session.thresholds).await
    }

    async fn on_prediction(&mut self, result: PredictionResult) -> LinkerResult<()> {
        let transient = self.is_transient(&result);
        if transient && !self.transient_retry_used {
            if let Some(page) = self.page.clone() {
                self.transient_retry_used = true;
                let err = LinkerError::EmptyResultTransient(describe_empty(&result));
                warn!(error = %err, "retrying prediction once");
                return self.issue_prediction(&page);
            }
        }

        self.store.save_result(&result).await?;
        if self.session.selection.retain_in(&result) > 0 {
            self.store.save_selection(&self.session.selection).await?;
        }
        self.session.last_result = Some(result);

        if transient {
            self.transient_retry_used = false;
            let err = LinkerError::EmptyResultTransient(
                self.session.last_result.as_ref().map(describe_empty).unwrap_or_default(),
            );
            warn!(error = %err, "prediction still empty after retry");
            self.transition(PanelState::ShowingError);
            self.view.render(&[]);
            self.view.show_error(&err.to_string());
            return Ok(());
        }

        self.transient_retry_used = false;
        self.transition(PanelState::ShowingSuggestions);
        self.refresh_view();
        Ok(())
    }

    async fn on_links_recorded(&mut self, links: usize, error: Option<String>) -> LinkerResult<()> {
        if let Some(error) = error {
            warn!(error = %error, "native host rejected recorded links");
            self.transition(PanelState::ShowingSuggestions);
            self.refresh_view();
            self.view.show_error(&format!("Failed to record links: {error}"));
            return Ok(());
        }

        info!(links, "links recorded");
        self.session.selection.clear();
        self.session.last_result = None;
        self.store.clear_result().await?;
        self.view.show_notice(&format!("Recorded {links} link(s)."));

        match self.page.clone() {
            Some(page) => {
                self.transient_retry_used = false;
                self.issue_prediction(&page)
            }
            None => {
                self.transition(PanelState::Connected);
                Ok(())
            }
        }
    }

    /// Empty and not carrying the benign marker.
    fn is_transient(&self, result: &PredictionResult) -> bool {
        result.suggestions.is_empty() && !self.is_benign(result)
    }

    fn is_benign(&self, result: &PredictionResult) -> bool {
        !self.benign_marker.is_empty()
            && result
                .error
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&self.benign_marker))
    }

    // ---------------------------------------------------------------------
    // User input
    // ---------------------------------------------------------------------

    /// Toggles selection of a visible suggestion. Returns whether it is now selected.
    ///
    /// Ids that are not currently visible, and toggles while a request is in
    /// flight, are ignored.
    pub async fn toggle(&mut self, id: &str) -> LinkerResult<bool> {
        if matches!(self.state, PanelState::AwaitingPrediction | PanelState::RecordingSelections) {
            debug!(id, state = self.state.label(), "toggle ignored while busy");
            return Ok(self.session.selection.is_selected(id));
        }
        if !self.visible_suggestions().iter().any(|s| s.id == id) {
            debug!(id, "toggle ignored; suggestion not visible");
            return Ok(false);
        }

        let selected = self.session.selection.toggle(id);
        self.store.save_selection(&self.session.selection).await?;
        self.refresh_view();
        Ok(selected)
    }

    /// Sets the threshold (clamped to `[0, maxThreshold]`) and re-filters locally.
    pub async fn set_threshold(&mut self, value: f64) -> LinkerResult<f64> {
        let value = self.session.thresholds.set(value);
        self.after_threshold_change().await?;
        Ok(value)
    }

    /// Moves the threshold by whole percentage points.
    pub async fn step_threshold(&mut self, percent_delta: i32) -> LinkerResult<f64> {
        let value = self.session.thresholds.step(percent_delta);
        self.after_threshold_change().await?;
        Ok(value)
    }

    async fn after_threshold_change(&mut self) -> LinkerResult<()> {
        self.threshold_user_set = true;
        self.store.save_thresholds(&self.session.thresholds).await?;
        if self.state == PanelState::ShowingSuggestions {
            // Pure re-filter: ShowingSuggestions re-enters itself.
            self.transition(PanelState::ShowingSuggestions);
        }
        if self.session.last_result.is_some()
            && !matches!(self.state, PanelState::AwaitingPrediction | PanelState::ShowingError)
        {
            self.refresh_view();
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Presentation
    // ---------------------------------------------------------------------

    fn refresh_view(&mut self) {
        let visible = self.visible_suggestions();
        self.view.render(&visible);
        if visible.is_empty() {
            let message = match self.session.last_result.as_ref().and_then(|r| r.error.clone()) {
                Some(error) if !error.trim().is_empty() => error,
                _ => format!(
                    "No suggestions at or above {}% confidence.",
                    self.session.thresholds.value_percent()
                ),
            };
            self.view.show_notice(&LinkerError::EmptyResultBenign(message).to_string());
        }
    }

    fn transition(&mut self, next: PanelState) {
        debug!(from = self.state.label(), to = next.label(), "panel state");
        self.state = next;
        self.view.state_changed(next);
    }
}

fn describe_empty(result: &PredictionResult) -> String {
    result
        .error
        .clone()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "the prediction service returned no suggestions".to_owned())
}
