//! Graph index over a snapshot
//!
//! Provides [`GraphIndex`]: node-by-id lookup plus an undirected adjacency
//! view where each relationship is reachable from both of its endpoints.
//!
//! The index is a value. It is built once per snapshot and never mutated;
//! a changed snapshot means building a new index.

use crate::model::{Adjacent, Direction, Node, NodeId, Relationship, RelationshipId, Snapshot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Build an index from nodes and relationships
///
/// Same input always yields the same index.
#[must_use]
pub fn build_index(nodes: Vec<Node>, relationships: Vec<Relationship>) -> GraphIndex {
    GraphIndex::build(Snapshot {
        nodes,
        relationships,
    })
}

/// Counters describing how the snapshot was ingested
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Distinct nodes indexed
    pub node_count: usize,
    /// Relationships that made it into the adjacency view
    pub relationship_count: usize,
    /// Relationships skipped because an endpoint is not in the snapshot
    pub dangling_relationships: usize,
    /// Node records skipped because their ID was already indexed
    pub duplicate_nodes: usize,
}

/// Edge weight stored in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEdge {
    /// Relationship identifier
    pub id: RelationshipId,
    /// Relationship label
    pub relationship_type: String,
}

/// Borrowed adjacency entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop<'g> {
    /// Node on the other end
    pub neighbor: &'g NodeId,
    /// Relationship crossed
    pub relationship: &'g RelationshipEdge,
    /// Direction relative to the queried node
    pub direction: Direction,
}

impl Hop<'_> {
    /// Owned form of this entry
    #[must_use]
    pub fn to_adjacent(&self) -> Adjacent {
        Adjacent {
            neighbor_id: self.neighbor.clone(),
            relationship_type: self.relationship.relationship_type.clone(),
            direction: self.direction,
            relationship_id: self.relationship.id.clone(),
        }
    }
}

/// Immutable graph over one snapshot
///
/// Nodes and relationships live in a petgraph `DiGraph` so direction is
/// kept for display; queries read it as undirected.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    /// Node weights in natural order (duplicates removed)
    graph: DiGraph<Node, RelationshipEdge>,
    /// Node ID -> graph node
    by_id: HashMap<NodeId, NodeIndex>,
    stats: IndexStats,
}

impl GraphIndex {
    /// Build the index from a snapshot
    #[must_use]
    pub fn build(snapshot: Snapshot) -> Self {
        let mut stats = IndexStats::default();
        let mut graph = DiGraph::with_capacity(snapshot.nodes.len(), snapshot.relationships.len());
        let mut by_id = HashMap::with_capacity(snapshot.nodes.len());

        for node in snapshot.nodes {
            if by_id.contains_key(&node.id) {
                stats.duplicate_nodes += 1;
                tracing::warn!(node_id = %node.id, "duplicate node in snapshot, keeping first");
                continue;
            }
            let id = node.id.clone();
            by_id.insert(id, graph.add_node(node));
        }

        for rel in snapshot.relationships {
            let endpoints = (by_id.get(&rel.from_node_id), by_id.get(&rel.to_node_id));
            let (Some(&from), Some(&to)) = endpoints else {
                stats.dangling_relationships += 1;
                tracing::warn!(
                    relationship_id = %rel.id,
                    from = %rel.from_node_id,
                    to = %rel.to_node_id,
                    "skipping relationship with missing endpoint"
                );
                continue;
            };
            graph.add_edge(
                from,
                to,
                RelationshipEdge {
                    id: rel.id,
                    relationship_type: rel.relationship_type,
                },
            );
        }

        stats.node_count = graph.node_count();
        stats.relationship_count = graph.edge_count();
        tracing::debug!(
            nodes = stats.node_count,
            relationships = stats.relationship_count,
            dangling = stats.dangling_relationships,
            "graph index built"
        );

        Self {
            graph,
            by_id,
            stats,
        }
    }

    /// Node by ID
    #[inline]
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&ix| &self.graph[ix])
    }

    /// Check whether a node is indexed
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All nodes in natural order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_indices().map(move |ix| &self.graph[ix])
    }

    /// Ingestion counters
    #[inline]
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Number of indexed nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// True if no nodes are indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Relationships touching a node, both directions, in snapshot order
    ///
    /// Unknown IDs yield nothing. A self-loop is listed once, as outgoing.
    #[must_use]
    pub fn hops(&self, id: &str) -> Vec<Hop<'_>> {
        let Some(&ix) = self.by_id.get(id) else {
            return Vec::new();
        };

        let outgoing = self
            .graph
            .edges_directed(ix, petgraph::Direction::Outgoing)
            .map(|e| (e.id(), e.target(), Direction::Outgoing));
        let incoming = self
            .graph
            .edges_directed(ix, petgraph::Direction::Incoming)
            .filter(|e| e.source() != e.target())
            .map(|e| (e.id(), e.source(), Direction::Incoming));

        let mut edges: Vec<_> = outgoing.chain(incoming).collect();
        // petgraph walks newest edge first; DFS discovery order needs snapshot order
        edges.sort_by_key(|&(edge, _, _)| edge);

        edges
            .into_iter()
            .map(|(edge, other, direction)| Hop {
                neighbor: &self.graph[other].id,
                relationship: &self.graph[edge],
                direction,
            })
            .collect()
    }

    /// Adjacency entries of a node, both directions
    ///
    /// Unknown IDs yield an empty list.
    #[must_use]
    pub fn neighbors(&self, id: &str) -> Vec<Adjacent> {
        self.hops(id).iter().map(Hop::to_adjacent).collect()
    }

    /// Distinct neighbor IDs in first-seen order
    #[must_use]
    pub fn neighbor_ids(&self, id: &str) -> Vec<&NodeId> {
        let mut seen = HashSet::new();
        self.hops(id)
            .into_iter()
            .map(|hop| hop.neighbor)
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Hops from `from` that lead to `to`
    #[must_use]
    pub fn relationships_between(&self, from: &str, to: &str) -> Vec<Hop<'_>> {
        self.hops(from)
            .into_iter()
            .filter(|hop| hop.neighbor.as_str() == to)
            .collect()
    }

    /// Display label of a node, falling back to its ID
    #[must_use]
    pub fn label_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.node(id).map_or(id, |n| n.label.as_str())
    }
}

impl From<Snapshot> for GraphIndex {
    fn from(snapshot: Snapshot) -> Self {
        Self::build(snapshot)
    }
}
