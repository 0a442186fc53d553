//! KGX Graph
//!
//! In-memory knowledge graph engine over a snapshot of typed entities and
//! typed relationships.
//!
//! # Overview
//!
//! - **GraphIndex**: petgraph-backed node lookup and undirected adjacency
//! - **relevant_nodes**: filter/expansion driven working set
//! - **PathFinder**: shortest path and bounded simple-path enumeration
//! - **clusters**: type-based grouping of large sets
//!
//! # Example
//!
//! ```rust
//! use kgx_graph::{build_index, find_path, Node, NodeType, Relationship};
//!
//! let index = build_index(
//!     vec![
//!         Node::new("a", "Acme", NodeType::Company),
//!         Node::new("c", "Quantum", NodeType::Technology),
//!     ],
//!     vec![Relationship::new("r1", "a", "c", "develops")],
//! );
//!
//! assert_eq!(index.neighbors("c").len(), 1);
//! assert_eq!(find_path(&index, "c", "a").edge_count(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod cluster;
pub mod error;
pub mod index;
pub mod model;
pub mod paths;
pub mod relevance;

// Re-exports
pub use cluster::{clusters, Cluster, ClusterOptions};
pub use error::SnapshotError;
pub use index::{build_index, GraphIndex, Hop, IndexStats, RelationshipEdge};
pub use model::{
    Adjacent, Direction, Node, NodeId, NodeType, Path, Properties, Relationship, RelationshipId,
    Snapshot,
};
pub use paths::{
    find_candidate_paths, find_path, CandidatePaths, PathCandidate, PathFinder, PathOptions,
};
pub use relevance::{relevant_nodes, RelevanceQuery};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for graph queries
    pub use crate::{
        build_index, clusters, relevant_nodes, GraphIndex, Node, NodeId, NodeType, Path,
        PathFinder, PathOptions, RelevanceQuery, Relationship,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
