//! Tracks which suggestions the user has confirmed as real links.
//!
//! Selection is keyed by `Suggestion::id`, never by anything the panel renders,
//! so it survives re-rendering and panel teardown (via the durable store).

use std::collections::BTreeSet;

use crate::types::{Context, ContextKind, LinkEdge, PredictionResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<String>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted selection.
    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self { selected: ids.into_iter().collect() }
    }

    /// Adds `id` if absent, removes it if present. Returns `true` when `id` is
    /// selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_owned());
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drops ids that are not part of `result`. Returns how many were dropped.
    pub fn retain_in(&mut self, result: &PredictionResult) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| result.contains(id));
        before - self.selected.len()
    }

    /// Builds one `LinkEdge` per selected id, pull-request id first.
    ///
    /// On a PR page the selected ids are issues, so each edge is
    /// `(selected, local_id)`; on an issue page it is `(local_id, selected)`.
    /// Blank ids on either side are dropped rather than emitted.
    pub fn build_edges(&self, context: &Context) -> Vec<LinkEdge> {
        self.build_edges_for(context, self.selected.iter().map(String::as_str))
    }

    /// Like [`build_edges`](Self::build_edges) but limited to the selected ids
    /// that also appear in `visible`, in `visible` order.
    pub fn build_visible_edges<'a, I>(&self, context: &Context, visible: I) -> Vec<LinkEdge>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids = visible.into_iter().filter(|id| self.selected.contains(*id));
        self.build_edges_for(context, ids)
    }

    fn build_edges_for<'a, I>(&self, context: &Context, ids: I) -> Vec<LinkEdge>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let local = context.local_id.trim();
        if local.is_empty() {
            return Vec::new();
        }
        ids.into_iter()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| match context.kind {
                ContextKind::PullRequest => LinkEdge(id.to_owned(), local.to_owned()),
                ContextKind::Issue => LinkEdge(local.to_owned(), id.to_owned()),
            })
            .collect()
    }
}
