//! Ranking oracle boundary
//!
//! The session never decides which candidate path matters most. It hands
//! the candidates to a [`RankingOracle`] and takes back an index plus an
//! explanation. Implementations may call a hosted model, run a heuristic
//! or ask a human; the session only checks that the index is usable.

use crate::error::OracleError;
use async_trait::async_trait;
use kgx_graph::PathCandidate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ranking input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRequest {
    /// Candidates in discovery order
    pub candidates: Vec<PathCandidate>,
    /// Label of the first selected node
    pub start_label: String,
    /// Label of the second selected node
    pub end_label: String,
}

/// Ranking output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    /// Index into [`RankingRequest::candidates`]
    pub chosen_index: i64,
    /// Oracle's confidence or relevance score
    pub score: f64,
    /// Why the chosen path matters
    pub rationale: String,
    /// Follow-up opportunities the path suggests
    #[serde(default)]
    pub opportunities: Vec<String>,
}

impl RankingResponse {
    /// Parse a JSON answer, e.g. from a model completion
    ///
    /// # Errors
    /// `OracleError::Failed` if the text is not a ranking response
    pub fn from_json(text: &str) -> Result<Self, OracleError> {
        serde_json::from_str(text.trim()).map_err(|e| OracleError::Failed(e.to_string()))
    }

    /// Chosen index if it points into a list of `len` candidates
    #[must_use]
    pub fn valid_index(&self, len: usize) -> Option<usize> {
        usize::try_from(self.chosen_index).ok().filter(|&i| i < len)
    }
}

/// Selects the most meaningful path among candidates
#[async_trait]
pub trait RankingOracle: Send + Sync {
    /// Rank candidates and explain the choice
    async fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, OracleError>;

    /// Oracle name for logs
    fn name(&self) -> &str {
        "oracle"
    }
}

/// Oracle that never answers successfully
///
/// Sessions built without a real oracle use this; every ranked request
/// falls back to the first candidate with an `Unavailable` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

#[async_trait]
impl RankingOracle for NoOracle {
    async fn rank(&self, _request: &RankingRequest) -> Result<RankingResponse, OracleError> {
        Err(OracleError::Unavailable("no ranking oracle configured".to_string()))
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Local, deterministic oracle
///
/// Prefers fewer hops, then more distinct relationship types, then
/// earlier discovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicOracle;

impl HeuristicOracle {
    fn distinct_types(candidate: &PathCandidate) -> usize {
        candidate
            .relationship_types
            .iter()
            .filter(|t| !t.is_empty())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[async_trait]
impl RankingOracle for HeuristicOracle {
    async fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, OracleError> {
        let (index, best) = request
            .candidates
            .iter()
            .enumerate()
            .min_by_key(|(i, c)| {
                (
                    c.relationship_types.len(),
                    std::cmp::Reverse(Self::distinct_types(c)),
                    *i,
                )
            })
            .ok_or_else(|| OracleError::Failed("no candidates to rank".to_string()))?;

        let hops = best.relationship_types.len().max(1);
        #[allow(clippy::cast_precision_loss)]
        let score = 1.0 / hops as f64;
        let rationale = format!(
            "{} reaches {} in {} hop(s): {}",
            request.start_label, request.end_label, best.relationship_types.len(), best
        );
        let opportunities = best
            .node_labels
            .iter()
            .skip(1)
            .take(best.node_labels.len().saturating_sub(2))
            .map(|label| format!("Explore the {label} connection"))
            .collect();

        Ok(RankingResponse {
            chosen_index: i64::try_from(index).unwrap_or(i64::MAX),
            score,
            rationale,
            opportunities,
        })
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
