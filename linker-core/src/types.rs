use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::filter::ThresholdBounds;
use crate::selection::SelectionTracker;

/// Which side of a pull-request/issue link the current page sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    PullRequest,
    Issue,
}

impl ContextKind {
    /// Stable text form used in the durable store (`kind` key).
    pub fn as_str(self) -> &'static str {
        match self {
            ContextKind::PullRequest => "PullRequest",
            ContextKind::Issue => "Issue",
        }
    }

    /// Parses the durable-store text form. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PullRequest" => Some(ContextKind::PullRequest),
            "Issue" => Some(ContextKind::Issue),
            _ => None,
        }
    }
}

/// The GitHub page currently being annotated.
///
/// Immutable once resolved. Navigating to a different eligible page produces a
/// new `Context`; it is compared by value against the persisted one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    /// `<owner>/<repo>`.
    pub repository: String,
    pub kind: ContextKind,
    /// Issue or pull request number, as text.
    pub local_id: String,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = match self.kind {
            ContextKind::PullRequest => "pull",
            ContextKind::Issue => "issues",
        };
        write!(f, "{}/{}/{}", self.repository, sep, self.local_id)
    }
}

/// A related issue/PR proposed by the prediction service.
///
/// Wire field names are PascalCase (`Repo`, `Id`, `Title`, `Probability`).
/// `Id` is accepted as either a JSON string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "Repo")]
    pub repository: String,
    #[serde(rename = "Id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Probability")]
    pub probability: f64,
}

impl Suggestion {
    /// Browser URL of the suggested issue/PR.
    pub fn url(&self) -> String {
        format!("https://www.github.com/{}/issues/{}", self.repository, self.id)
    }
}

/// One prediction response.
///
/// Either `suggestions` is non-empty or `error` carries the reason it is not;
/// both fields may be present structurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "Suggestions", default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

impl PredictionResult {
    /// Returns `true` when `id` is one of the suggestions in this result.
    pub fn contains(&self, id: &str) -> bool {
        self.suggestions.iter().any(|s| s.id == id)
    }
}

/// Service-supplied minimum useful confidence for a repository, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdHint {
    pub value: f64,
}

/// A confirmed pull-request ↔ issue association.
///
/// Serialises as a two-element JSON array `[pr, issue]`. The pull-request id is
/// always the first element regardless of which page the user confirmed it from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge(pub String, pub String);

impl LinkEdge {
    pub fn pull_request(&self) -> &str {
        &self.0
    }

    pub fn issue(&self) -> &str {
        &self.1
    }
}

/// The durable snapshot restored across panel re-openings.
///
/// Owned by `NativeSessionManager`; every field is mirrored to its own key in the
/// durable store so partial updates (threshold drag, one toggle) stay cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub context: Option<Context>,
    pub last_result: Option<PredictionResult>,
    pub selection: SelectionTracker,
    pub thresholds: ThresholdBounds,
}

/// Accepts `"7"` or `7` for identifiers the service may emit either way.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
