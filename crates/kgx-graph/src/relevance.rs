//! Relevance filter
//!
//! Derives the working set of nodes shown to a caller from free-text
//! filters and an expansion frontier. Direct label matches come first,
//! their neighbors and the neighbors of expanded nodes follow.

use crate::index::GraphIndex;
use crate::model::{Node, NodeId};
use std::collections::HashSet;

/// Default number of nodes returned when nothing narrows the view
pub const DEFAULT_VIEW_LIMIT: usize = 50;

/// Inputs to [`relevant_nodes`]
#[derive(Debug, Clone, Copy)]
pub struct RelevanceQuery<'a> {
    /// Free-text filters (context labels and insight filters together)
    pub filters: &'a [String],
    /// Nodes whose neighbors are pulled into the set
    pub expanded: &'a [NodeId],
    /// Size of the unfiltered default view
    pub default_limit: usize,
}

impl<'a> RelevanceQuery<'a> {
    /// Query with the default view limit
    #[must_use]
    pub fn new(filters: &'a [String], expanded: &'a [NodeId]) -> Self {
        Self {
            filters,
            expanded,
            default_limit: DEFAULT_VIEW_LIMIT,
        }
    }

    /// With a custom default view limit
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }
}

/// Case-insensitive substring match in either direction
///
/// `needle` is expected lowercased and trimmed by the caller.
fn label_matches(label: &str, needle: &str) -> bool {
    let label = label.to_lowercase();
    label.contains(needle) || needle.contains(label.as_str())
}

/// Compute the relevant node set
///
/// Blank filters are ignored. With no usable filter and no expansion the
/// first `default_limit` nodes are returned in natural order.
#[must_use]
pub fn relevant_nodes<'g>(index: &'g GraphIndex, query: &RelevanceQuery<'_>) -> Vec<&'g Node> {
    let needles: Vec<String> = query
        .filters
        .iter()
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();

    if needles.is_empty() && query.expanded.is_empty() {
        return index.nodes().take(query.default_limit).collect();
    }

    let direct: Vec<&Node> = index
        .nodes()
        .filter(|node| needles.iter().any(|n| label_matches(&node.label, n)))
        .collect();

    let mut connected: HashSet<&str> = HashSet::new();
    for node in &direct {
        connected.extend(index.neighbor_ids(node.id.as_str()).into_iter().map(NodeId::as_str));
    }
    for id in query.expanded {
        connected.extend(index.neighbor_ids(id.as_str()).into_iter().map(NodeId::as_str));
    }

    let direct_ids: HashSet<&str> = direct.iter().map(|n| n.id.as_str()).collect();
    let connections = index
        .nodes()
        .filter(|n| connected.contains(n.id.as_str()) && !direct_ids.contains(n.id.as_str()));

    tracing::debug!(
        direct = direct.len(),
        connected = connected.len(),
        "relevance filter evaluated"
    );

    let mut result = direct;
    result.extend(connections);
    result
}
