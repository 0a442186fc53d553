//! Exploration state
//!
//! One value per session holding selection, expansion, the highlighted
//! path and the insight filters. Every change goes through a named
//! operation; nothing else writes these fields.

use crate::error::ExplorerError;
use indexmap::IndexSet;
use kgx_graph::{NodeId, Path};
use serde::{Deserialize, Serialize};

/// How clicks combine into a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// At most one node selected
    #[default]
    Single,
    /// Any number of nodes selected
    Multi,
}

/// Result of a toggle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Member was absent and is now present
    Added,
    /// Member was present and is now absent
    Removed,
    /// Unknown node; nothing changed
    Ignored,
}

/// Oracle commentary attached to a ranked highlighted path
///
/// Auxiliary only: the path itself is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathAnnotation {
    /// Oracle score
    pub score: f64,
    /// Oracle explanation
    pub rationale: String,
    /// Follow-ups suggested by the oracle
    pub opportunities: Vec<String>,
}

/// Outstanding ranking request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RankingTicket {
    pub(crate) generation: u64,
    pub(crate) pair: (NodeId, NodeId),
}

/// Per-session exploration state
#[derive(Debug, Clone, Default)]
pub struct ExplorationState {
    mode: SelectionMode,
    selected: IndexSet<NodeId>,
    expanded: IndexSet<NodeId>,
    highlighted_path: Path,
    annotation: Option<PathAnnotation>,
    insight_filters: Vec<String>,
    ranking: Option<RankingTicket>,
    next_generation: u64,
}

impl ExplorationState {
    /// Fresh state: nothing selected, expanded or filtered
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current selection mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Selected nodes in selection order
    #[inline]
    #[must_use]
    pub fn selected(&self) -> &IndexSet<NodeId> {
        &self.selected
    }

    /// Expanded nodes in expansion order
    #[inline]
    #[must_use]
    pub fn expanded(&self) -> &IndexSet<NodeId> {
        &self.expanded
    }

    /// Path currently emphasized (possibly empty)
    #[inline]
    #[must_use]
    pub fn highlighted_path(&self) -> &Path {
        &self.highlighted_path
    }

    /// Oracle commentary on the highlighted path, if it came from ranking
    #[inline]
    #[must_use]
    pub fn annotation(&self) -> Option<&PathAnnotation> {
        self.annotation.as_ref()
    }

    /// Insight filters in display order
    #[inline]
    #[must_use]
    pub fn insight_filters(&self) -> &[String] {
        &self.insight_filters
    }

    /// True while a ranking request awaits the oracle
    #[inline]
    #[must_use]
    pub fn ranking_in_progress(&self) -> bool {
        self.ranking.is_some()
    }

    /// Switch selection mode
    ///
    /// Leaving multi-select keeps only the most recently selected node.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if mode == SelectionMode::Single && self.selected.len() > 1 {
            let last = self.selected.pop();
            self.selected.clear();
            self.selected.extend(last);
            self.invalidate_ranking();
        }
        self.mode = mode;
    }

    /// Replace the selection with a single node
    ///
    /// The highlighted path is cleared unless the node was already the
    /// sole selection.
    pub fn select_single(&mut self, id: NodeId) {
        if self.selected.len() == 1 && self.selected.contains(&id) {
            return;
        }
        self.selected.clear();
        self.selected.insert(id);
        self.clear_highlight();
        self.invalidate_ranking();
    }

    /// Add or remove a node from a multi-selection
    ///
    /// # Errors
    /// `PreconditionNotMet` in single-select mode
    pub fn toggle_multi_select(&mut self, id: NodeId) -> Result<Toggle, ExplorerError> {
        if self.mode != SelectionMode::Multi {
            return Err(ExplorerError::precondition(
                "toggle_multi_select",
                "multi-select mode",
                "single-select mode",
            ));
        }
        self.invalidate_ranking();
        if self.selected.shift_remove(&id) {
            Ok(Toggle::Removed)
        } else {
            self.selected.insert(id);
            Ok(Toggle::Added)
        }
    }

    /// Add or remove a node from the expansion frontier
    pub fn toggle_expansion(&mut self, id: NodeId) -> Toggle {
        if self.expanded.shift_remove(&id) {
            Toggle::Removed
        } else {
            self.expanded.insert(id);
            Toggle::Added
        }
    }

    /// Drop the selection and highlighted path
    ///
    /// Expansion and insight filters are left alone.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.clear_highlight();
        self.invalidate_ranking();
    }

    /// Append an insight filter
    ///
    /// Returns `false` for blank text or a filter already present.
    pub fn add_insight_filter(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.insight_filters.iter().any(|f| f == text) {
            return false;
        }
        self.insight_filters.push(text.to_string());
        true
    }

    /// Remove an insight filter
    ///
    /// Returns `false` if it was not present.
    pub fn remove_insight_filter(&mut self, text: &str) -> bool {
        let text = text.trim();
        let before = self.insight_filters.len();
        self.insight_filters.retain(|f| f != text);
        self.insight_filters.len() != before
    }

    /// The two selected nodes in selection order
    ///
    /// # Errors
    /// `PreconditionNotMet` unless exactly two nodes are selected
    pub fn selected_pair(
        &self,
        operation: &'static str,
    ) -> Result<(NodeId, NodeId), ExplorerError> {
        match (self.selected.len(), self.selected.first(), self.selected.get_index(1)) {
            (2, Some(a), Some(b)) => Ok((a.clone(), b.clone())),
            (n, _, _) => Err(ExplorerError::precondition(
                operation,
                "exactly 2 selected nodes",
                format!("{n} selected"),
            )),
        }
    }

    pub(crate) fn set_highlight(&mut self, path: Path, annotation: Option<PathAnnotation>) {
        self.highlighted_path = path;
        self.annotation = annotation;
    }

    fn clear_highlight(&mut self) {
        self.highlighted_path = Path::empty();
        self.annotation = None;
    }

    pub(crate) fn begin_ranking(&mut self, pair: (NodeId, NodeId)) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.ranking = Some(RankingTicket { generation, pair });
        generation
    }

    /// True if `generation` is still the outstanding request
    pub(crate) fn is_current_ranking(&self, generation: u64) -> bool {
        self.ranking.as_ref().is_some_and(|t| t.generation == generation)
    }

    /// Clear the in-progress marker if it belongs to `generation`
    pub(crate) fn finish_ranking(&mut self, generation: u64) {
        if self.is_current_ranking(generation) {
            self.ranking = None;
        }
    }

    /// Forget any outstanding request; its answer will be discarded
    pub(crate) fn invalidate_ranking(&mut self) {
        if let Some(ticket) = self.ranking.take() {
            tracing::debug!(
                generation = ticket.generation,
                start = %ticket.pair.0,
                end = %ticket.pair.1,
                "outstanding ranking superseded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn select_single_is_exclusive() {
        let mut state = ExplorationState::new();
        state.select_single(id("a"));
        state.set_highlight(Path(vec![id("a"), id("b")]), None);

        // reselecting the same node keeps the highlight
        state.select_single(id("a"));
        assert_eq!(state.highlighted_path().edge_count(), 1);

        state.select_single(id("b"));
        assert_eq!(state.selected().len(), 1);
        assert!(state.selected().contains("b"));
        assert!(state.highlighted_path().is_empty());
    }

    #[test]
    fn multi_select_requires_mode() {
        let mut state = ExplorationState::new();
        let err = state.toggle_multi_select(id("a")).unwrap_err();
        assert!(err.is_precondition());

        state.set_mode(SelectionMode::Multi);
        assert_eq!(state.toggle_multi_select(id("a")).unwrap(), Toggle::Added);
        assert_eq!(state.toggle_multi_select(id("b")).unwrap(), Toggle::Added);
        assert_eq!(state.toggle_multi_select(id("a")).unwrap(), Toggle::Removed);
        assert_eq!(state.selected().len(), 1);
    }

    #[test]
    fn multi_toggle_leaves_highlight() {
        let mut state = ExplorationState::new();
        state.set_mode(SelectionMode::Multi);
        state.set_highlight(Path(vec![id("a"), id("b")]), None);
        state.toggle_multi_select(id("c")).unwrap();
        assert!(!state.highlighted_path().is_empty());
    }

    #[test]
    fn leaving_multi_keeps_latest() {
        let mut state = ExplorationState::new();
        state.set_mode(SelectionMode::Multi);
        state.toggle_multi_select(id("a")).unwrap();
        state.toggle_multi_select(id("b")).unwrap();
        state.set_mode(SelectionMode::Single);
        assert_eq!(state.selected().iter().collect::<Vec<_>>(), vec![&id("b")]);
    }

    #[test]
    fn clear_selection_keeps_expansion_and_filters() {
        let mut state = ExplorationState::new();
        state.select_single(id("a"));
        state.toggle_expansion(id("a"));
        state.add_insight_filter("robotics");
        state.set_highlight(Path(vec![id("a")]), None);

        state.clear_selection();
        assert!(state.selected().is_empty());
        assert!(state.highlighted_path().is_empty());
        assert_eq!(state.expanded().len(), 1);
        assert_eq!(state.insight_filters(), ["robotics"]);
    }

    #[test]
    fn insight_filters_behave_as_ordered_set() {
        let mut state = ExplorationState::new();
        assert!(state.add_insight_filter("ai chips"));
        assert!(state.add_insight_filter("supply chain"));
        assert!(!state.add_insight_filter("ai chips"));
        assert!(!state.add_insight_filter("  "));
        assert_eq!(state.insight_filters(), ["ai chips", "supply chain"]);

        assert!(state.remove_insight_filter("ai chips"));
        assert!(!state.remove_insight_filter("ai chips"));
        assert_eq!(state.insight_filters(), ["supply chain"]);
    }

    #[test]
    fn selected_pair_needs_exactly_two() {
        let mut state = ExplorationState::new();
        state.set_mode(SelectionMode::Multi);
        state.toggle_multi_select(id("a")).unwrap();
        assert!(state.selected_pair("op").unwrap_err().is_precondition());

        state.toggle_multi_select(id("b")).unwrap();
        assert_eq!(state.selected_pair("op").unwrap(), (id("a"), id("b")));

        state.toggle_multi_select(id("c")).unwrap();
        assert!(state.selected_pair("op").is_err());
    }

    #[test]
    fn ranking_generations() {
        let mut state = ExplorationState::new();
        let first = state.begin_ranking((id("a"), id("b")));
        assert!(state.ranking_in_progress());

        state.clear_selection();
        assert!(!state.ranking_in_progress());
        assert!(!state.is_current_ranking(first));

        let second = state.begin_ranking((id("a"), id("b")));
        state.finish_ranking(first);
        assert!(state.is_current_ranking(second));
        state.finish_ranking(second);
        assert!(!state.ranking_in_progress());
    }
}
