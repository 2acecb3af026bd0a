//! Session, state and protocol core of the linker action panel.
//!
//! The panel asks a native prediction host for issues/PRs related to the GitHub
//! page being viewed, shows the ones above a confidence threshold, and reports
//! the links the user confirms. Everything here survives the panel being torn
//! down and rebuilt on every open: state lives in the durable store (`db`) and
//! is reconciled against the active page on each activation (`session`).

pub mod context;
pub mod db;
pub mod error;
pub mod filter;
pub mod protocol;
pub mod schema;
pub mod selection;
pub mod session;
pub mod types;

pub use error::{LinkerError, LinkerResult};
pub use session::{ChannelEvent, ChannelId, Connector, NativeSessionManager, PanelState, PanelView};
pub use types::{Context, ContextKind, LinkEdge, PredictionResult, SessionState, Suggestion, ThresholdHint};
