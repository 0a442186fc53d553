//! Testing utilities for KGX workspace
//!
//! Shared graph fixtures, proptest strategies and fake ranking oracles.

#![allow(missing_docs)]

use async_trait::async_trait;
use kgx_explorer::{OracleError, RankingOracle, RankingRequest, RankingResponse};
use kgx_graph::{build_index, GraphIndex, Node, NodeType, Relationship, Snapshot};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub fn node(id: &str, label: &str, node_type: NodeType) -> Node {
    Node::new(id, label, node_type)
}

pub fn rel(id: &str, from: &str, to: &str, relationship_type: &str) -> Relationship {
    Relationship::new(id, from, to, relationship_type)
}

/// A:company, B:company, C:technology, D:market with A-C, C-D, D-B
pub fn scenario_index() -> GraphIndex {
    build_index(
        vec![
            node("A", "Acme Corp", NodeType::Company),
            node("B", "Beta Industries", NodeType::Company),
            node("C", "Quantum Sensing", NodeType::Technology),
            node("D", "Defense Market", NodeType::Market),
        ],
        vec![
            rel("r1", "A", "C", "develops"),
            rel("r2", "C", "D", "targets"),
            rel("r3", "D", "B", "served_by"),
        ],
    )
}

/// `start` and `end` joined through `width` two-hop spokes
///
/// Yields exactly `width` simple paths of two edges.
pub fn fan_index(width: usize) -> GraphIndex {
    let mut nodes = vec![
        node("start", "Start Co", NodeType::Company),
        node("end", "End Co", NodeType::Company),
    ];
    let mut rels = Vec::new();
    for i in 0..width {
        let mid = format!("m{i}");
        nodes.push(node(&mid, &format!("Middle {i}"), NodeType::Investor));
        rels.push(rel(&format!("in{i}"), "start", &mid, "raised_from"));
        rels.push(rel(&format!("out{i}"), &mid, "end", "invests_in"));
    }
    build_index(nodes, rels)
}

/// Acme matched by text, Edge only one hop away from Acme
pub fn filter_index() -> GraphIndex {
    build_index(
        vec![
            node("E", "Edge Compute", NodeType::Technology),
            node("A", "Acme Corp", NodeType::Company),
            node("X", "Unrelated Metric", NodeType::Metric),
        ],
        vec![rel("r1", "A", "E", "adopts")],
    )
}

/// Fully connected graph over `n` nodes
pub fn complete_index(n: usize) -> GraphIndex {
    let nodes: Vec<Node> = (0..n)
        .map(|i| node(&format!("n{i}"), &format!("Node {i}"), NodeType::Company))
        .collect();
    let mut rels = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            rels.push(rel(&format!("r{i}_{j}"), &format!("n{i}"), &format!("n{j}"), "links"));
        }
    }
    build_index(nodes, rels)
}

/// Random snapshot with IDs `n0..n{nodes}` and edges between them
pub fn snapshot_strategy(max_nodes: usize, max_edges: usize) -> impl Strategy<Value = Snapshot> {
    (1..=max_nodes).prop_flat_map(move |n| {
        proptest::collection::vec((0..n, 0..n), 0..=max_edges).prop_map(move |pairs| {
            let nodes = (0..n)
                .map(|i| node(&format!("n{i}"), &format!("Node {i}"), NodeType::Company))
                .collect();
            let relationships = pairs
                .into_iter()
                .enumerate()
                .map(|(k, (a, b))| {
                    rel(&format!("r{k}"), &format!("n{a}"), &format!("n{b}"), "links")
                })
                .collect();
            Snapshot {
                nodes,
                relationships,
            }
        })
    })
}

/// Oracle that always picks the same index
#[derive(Debug, Clone)]
pub struct FixedOracle {
    pub index: i64,
    calls: Arc<AtomicUsize>,
}

impl FixedOracle {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankingOracle for FixedOracle {
    async fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RankingResponse {
            chosen_index: self.index,
            score: 0.9,
            rationale: format!("{} links to {}", request.start_label, request.end_label),
            opportunities: vec!["joint venture".to_string()],
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Oracle that always fails with the given error
#[derive(Debug, Clone)]
pub struct FailingOracle(pub OracleError);

#[async_trait]
impl RankingOracle for FailingOracle {
    async fn rank(&self, _request: &RankingRequest) -> Result<RankingResponse, OracleError> {
        Err(self.0.clone())
    }
}

/// Oracle that never answers
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingOracle;

#[async_trait]
impl RankingOracle for PendingOracle {
    async fn rank(&self, _request: &RankingRequest) -> Result<RankingResponse, OracleError> {
        std::future::pending().await
    }
}

/// Oracle that answers after a delay
#[derive(Debug, Clone)]
pub struct SlowOracle {
    pub delay: Duration,
    pub inner: FixedOracle,
}

#[async_trait]
impl RankingOracle for SlowOracle {
    async fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, OracleError> {
        tokio::time::sleep(self.delay).await;
        self.inner.rank(request).await
    }
}

/// Oracle that waits until the test opens the gate
#[derive(Debug, Clone)]
pub struct GatedOracle {
    gate: Arc<Notify>,
    inner: FixedOracle,
}

impl GatedOracle {
    pub fn new(index: i64) -> Self {
        Self {
            gate: Arc::new(Notify::new()),
            inner: FixedOracle::new(index),
        }
    }

    /// Let one waiting (or the next) rank call proceed
    pub fn open(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl RankingOracle for GatedOracle {
    async fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, OracleError> {
        self.gate.notified().await;
        self.inner.rank(request).await
    }
}
