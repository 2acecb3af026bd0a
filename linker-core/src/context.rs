//! Resolves the active page address to the `Context` it annotates.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::LinkerError;
use crate::types::{Context, ContextKind};

static GITHUB_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github\.com/([^/]+/[^/]+)/(pulls?|issues?)/([0-9]+)(?:[/?#].*)?$")
        .expect("static GitHub page pattern is valid")
});

/// Maps `https?://github.com/<owner>/<repo>/(pull|pulls|issue|issues)/<number>`
/// to a `Context`.
///
/// Literal path segments are matched case-sensitively. Trailing sub-paths,
/// queries and fragments (`/files`, `?diff=split`, `#issuecomment-1`) are
/// tolerated because the browser reports them for the same page.
///
/// # Errors
///
/// Returns `LinkerError::IneligiblePage` carrying the address when it does not
/// match.
pub fn resolve(url: &str) -> Result<Context, LinkerError> {
    let caps = GITHUB_PAGE
        .captures(url.trim())
        .ok_or_else(|| LinkerError::IneligiblePage(url.to_owned()))?;

    let kind = if caps[2].starts_with("pull") {
        ContextKind::PullRequest
    } else {
        ContextKind::Issue
    };

    Ok(Context {
        repository: caps[1].to_owned(),
        kind,
        local_id: caps[3].to_owned(),
    })
}
