//! Graph data model
//!
//! Defines the values the index is built from and the values it hands back:
//! - Node and relationship records (a read-only snapshot from the store)
//! - Adjacency tuples
//! - Paths

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Opaque attribute mapping carried by nodes and relationships
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Stable node identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create node ID from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable relationship identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub String);

impl RelationshipId {
    /// Create relationship ID from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for RelationshipId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entity kind
///
/// The set is open: anything outside the well-known kinds is kept verbatim
/// in [`NodeType::Other`]. Used for grouping and display only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// Company or organization
    Company,
    /// Individual
    Person,
    /// Technology or product capability
    Technology,
    /// Market or segment
    Market,
    /// Strategic initiative
    Strategy,
    /// Investor or fund
    Investor,
    /// Analytical framework
    Framework,
    /// Tracked metric
    Metric,
    /// Any other kind reported by the store
    Other(String),
}

impl NodeType {
    /// Canonical lowercase name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Company => "company",
            NodeType::Person => "person",
            NodeType::Technology => "technology",
            NodeType::Market => "market",
            NodeType::Strategy => "strategy",
            NodeType::Investor => "investor",
            NodeType::Framework => "framework",
            NodeType::Metric => "metric",
            NodeType::Other(name) => name,
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "company" => NodeType::Company,
            "person" => NodeType::Person,
            "technology" => NodeType::Technology,
            "market" => NodeType::Market,
            "strategy" => NodeType::Strategy,
            "investor" => NodeType::Investor,
            "framework" => NodeType::Framework,
            "metric" => NodeType::Metric,
            _ => NodeType::Other(value),
        }
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        match value {
            NodeType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for NodeType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeType::from(s.to_string()))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed strategic entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Display name
    pub label: String,
    /// Entity kind
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Opaque attributes
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create node without properties
    #[must_use]
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            properties: Properties::new(),
        }
    }

    /// With an extra property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// A directed, typed link between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,
    /// Source node
    pub from_node_id: NodeId,
    /// Target node
    pub to_node_id: NodeId,
    /// Free-text label, e.g. `invests_in`
    pub relationship_type: String,
    /// Opaque attributes (confidence, provenance, ...)
    #[serde(default)]
    pub properties: Properties,
}

impl Relationship {
    /// Create relationship without properties
    #[must_use]
    pub fn new(
        id: impl Into<RelationshipId>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from_node_id: from.into(),
            to_node_id: to.into(),
            relationship_type: relationship_type.into(),
            properties: Properties::new(),
        }
    }
}

/// Read-only snapshot of the store's nodes and relationships
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Nodes in natural (store) order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Relationships in natural (store) order
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Snapshot {
    /// Parse snapshot from JSON text
    ///
    /// # Errors
    /// Returns [`SnapshotError::Json`](crate::SnapshotError::Json) on malformed input
    pub fn from_json(text: &str) -> Result<Self, crate::SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Direction of an adjacency entry relative to the queried node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Queried node is the relationship's `from` end
    Outgoing,
    /// Queried node is the relationship's `to` end
    Incoming,
}

/// One adjacency entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjacent {
    /// Node on the other end
    pub neighbor_id: NodeId,
    /// Relationship label
    pub relationship_type: String,
    /// Direction relative to the queried node
    pub direction: Direction,
    /// Relationship identifier
    pub relationship_id: RelationshipId,
}

/// Ordered, non-repeating sequence of node IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<NodeId>);

impl Path {
    /// Empty path
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Node IDs in order
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }

    /// Number of edges traversed
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// True if the path has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the single-node path (start == end, nothing to traverse)
    #[inline]
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.0.len() == 1
    }

    /// First node
    #[must_use]
    pub fn start(&self) -> Option<&NodeId> {
        self.0.first()
    }

    /// Last node
    #[must_use]
    pub fn end(&self) -> Option<&NodeId> {
        self.0.last()
    }

    /// Check membership
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|n| n.as_str() == id)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.0.iter().map(NodeId::as_str).collect();
        write!(f, "{}", ids.join(" -> "))
    }
}
