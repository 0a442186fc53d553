//! Exploration session
//!
//! Binds one [`ExplorationState`] to a graph index, a configuration and a
//! ranking oracle, and exposes the operations a caller drives interactive
//! exploration with.
//!
//! Every operation is synchronous except [`ExplorationSession::request_ranked_path`],
//! whose oracle call is the only suspension point. The state lock is never
//! held across that call.

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, OracleError};
use crate::oracle::{NoOracle, RankingOracle, RankingRequest};
use crate::state::{ExplorationState, PathAnnotation, SelectionMode, Toggle};
use kgx_graph::{
    clusters, relevant_nodes, Adjacent, CandidatePaths, Cluster, GraphIndex, Node, NodeId, Path,
    PathFinder, RelevanceQuery,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// Outcome of a shortest-path request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// Path stored as the highlighted path
    Found(Path),
    /// The selected nodes are not connected; highlight cleared
    NoPath,
}

/// How many candidates were handed to the oracle out of how many exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateCount {
    /// Candidates offered for ranking
    pub considered: usize,
    /// Simple paths found within the depth bound
    pub total_found: usize,
}

impl CandidateCount {
    /// True if the candidate cap dropped some paths
    #[inline]
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.total_found > self.considered
    }
}

impl From<&CandidatePaths> for CandidateCount {
    fn from(found: &CandidatePaths) -> Self {
        Self {
            considered: found.len(),
            total_found: found.total_found,
        }
    }
}

impl fmt::Display for CandidateCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} candidates considered", self.considered, self.total_found)
    }
}

/// Outcome of a ranked-path request
#[derive(Debug, Clone, PartialEq)]
pub enum RankedPathOutcome {
    /// Oracle's choice stored as the highlighted path
    Ranked {
        /// Chosen path
        path: Path,
        /// Oracle commentary
        annotation: PathAnnotation,
        /// Candidate bound disclosure
        candidates: CandidateCount,
    },
    /// Oracle failed; first candidate stored instead
    Fallback {
        /// First enumerated candidate
        path: Path,
        /// Why the oracle's answer was not used
        warning: OracleError,
        /// Candidate bound disclosure
        candidates: CandidateCount,
    },
    /// No candidate within the depth bound; highlight cleared
    NoPath,
    /// A ranking request is already outstanding; nothing done
    AlreadyInProgress,
    /// Oracle exceeded its budget; highlight left as it was
    TimedOut {
        /// Always [`OracleError::Timeout`] carrying the budget
        warning: OracleError,
    },
    /// Selection changed while waiting; answer discarded
    Superseded,
}

impl RankedPathOutcome {
    /// Oracle problem reported by this request, if any
    #[must_use]
    pub fn warning(&self) -> Option<&OracleError> {
        match self {
            Self::Fallback { warning, .. } | Self::TimedOut { warning } => Some(warning),
            _ => None,
        }
    }

    /// Highlighted path written by this request, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Ranked { path, .. } | Self::Fallback { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Clears the in-progress marker when a ranking future ends or is dropped
struct RankingGuard<'a> {
    state: &'a Mutex<ExplorationState>,
    generation: u64,
}

impl Drop for RankingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().finish_ranking(self.generation);
    }
}

/// One interactive exploration session
pub struct ExplorationSession {
    config: ExplorerConfig,
    index: RwLock<Arc<GraphIndex>>,
    oracle: Arc<dyn RankingOracle>,
    state: Mutex<ExplorationState>,
}

impl fmt::Debug for ExplorationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.index.read().len();
        let state = self.state();
        f.debug_struct("ExplorationSession")
            .field("config", &self.config)
            .field("nodes", &nodes)
            .field("oracle", &self.oracle.name())
            .field("state", &state)
            .finish()
    }
}

impl ExplorationSession {
    /// Session without a ranking oracle
    #[must_use]
    pub fn new(index: Arc<GraphIndex>, config: ExplorerConfig) -> Self {
        Self::with_oracle(index, config, Arc::new(NoOracle))
    }

    /// Session with a ranking oracle
    #[must_use]
    pub fn with_oracle(
        index: Arc<GraphIndex>,
        config: ExplorerConfig,
        oracle: Arc<dyn RankingOracle>,
    ) -> Self {
        tracing::debug!(nodes = index.len(), oracle = oracle.name(), "exploration session started");
        Self {
            config,
            index: RwLock::new(index),
            oracle,
            state: Mutex::new(ExplorationState::new()),
        }
    }

    /// Session whose configuration is read from a TOML file
    ///
    /// # Errors
    /// `ExplorerError::Config` if the file is unreadable or invalid
    pub fn from_config_file(
        index: Arc<GraphIndex>,
        config_path: impl AsRef<std::path::Path>,
        oracle: Arc<dyn RankingOracle>,
    ) -> Result<Self, ExplorerError> {
        let config = ExplorerConfig::load(config_path)?;
        Ok(Self::with_oracle(index, config, oracle))
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Current index
    #[must_use]
    pub fn index(&self) -> Arc<GraphIndex> {
        Arc::clone(&self.index.read())
    }

    /// Swap in an index rebuilt from a new snapshot
    ///
    /// State keeps its plain IDs; IDs missing from the new index simply
    /// contribute nothing to queries.
    pub fn replace_index(&self, index: Arc<GraphIndex>) {
        tracing::debug!(nodes = index.len(), "graph index replaced");
        *self.index.write() = index;
    }

    /// Copy of the current state
    #[must_use]
    pub fn state(&self) -> ExplorationState {
        self.state.lock().clone()
    }

    /// True while a ranking request awaits the oracle
    #[must_use]
    pub fn ranking_in_progress(&self) -> bool {
        self.state.lock().ranking_in_progress()
    }

    /// Highlighted path
    #[must_use]
    pub fn highlighted_path(&self) -> Path {
        self.state.lock().highlighted_path().clone()
    }

    fn finder<'g>(&self, index: &'g GraphIndex) -> PathFinder<'g> {
        PathFinder::new(index).with_options(self.config.path_options())
    }

    fn known(&self, id: &str, operation: &'static str) -> bool {
        let known = self.index.read().contains(id);
        if !known {
            tracing::debug!(node_id = id, operation, "ignoring unknown node");
        }
        known
    }

    // ---- queries ----

    /// Adjacency entries of a node
    #[must_use]
    pub fn neighbors(&self, id: &str) -> Vec<Adjacent> {
        self.index().neighbors(id)
    }

    /// Shortest path under the session's traversal options
    #[must_use]
    pub fn find_path(&self, start: &str, end: &str) -> Path {
        let index = self.index();
        self.finder(&index).shortest_path(start, end)
    }

    /// Candidate paths under the session's bounds
    #[must_use]
    pub fn find_candidate_paths(&self, start: &str, end: &str) -> CandidatePaths {
        let index = self.index();
        self.finder(&index).candidate_paths(start, end)
    }

    /// Relevant node set for the given context labels
    ///
    /// Context labels and the session's insight filters are matched
    /// together; the session's expanded nodes contribute their neighbors.
    #[must_use]
    pub fn relevant_nodes(&self, context_labels: &[String]) -> Vec<Node> {
        let (filters, expanded) = {
            let state = self.state.lock();
            let mut filters = context_labels.to_vec();
            filters.extend(state.insight_filters().iter().cloned());
            let expanded: Vec<NodeId> = state.expanded().iter().cloned().collect();
            (filters, expanded)
        };

        let index = self.index();
        let query = RelevanceQuery::new(&filters, &expanded)
            .with_default_limit(self.config.default_view_limit);
        relevant_nodes(&index, &query).into_iter().cloned().collect()
    }

    /// Type clusters of the relevant set
    #[must_use]
    pub fn clusters(&self, context_labels: &[String]) -> Vec<Cluster> {
        let nodes = self.relevant_nodes(context_labels);
        clusters(&nodes, self.config.cluster_options())
    }

    // ---- state transitions ----

    /// Switch selection mode
    pub fn set_selection_mode(&self, mode: SelectionMode) {
        self.state.lock().set_mode(mode);
    }

    /// Replace the selection with one node
    ///
    /// Returns `false` for an unknown node.
    pub fn select_single(&self, id: &str) -> bool {
        if !self.known(id, "select_single") {
            return false;
        }
        self.state.lock().select_single(NodeId::from(id));
        true
    }

    /// Toggle a node in the multi-selection
    ///
    /// A selected node is always removable, even if a replaced index no
    /// longer has it; only unknown nodes are refused on add.
    ///
    /// # Errors
    /// `PreconditionNotMet` in single-select mode
    pub fn toggle_multi_select(&self, id: &str) -> Result<Toggle, ExplorerError> {
        let mut state = self.state.lock();
        let present = state.selected().contains(id);
        if state.mode() == SelectionMode::Multi
            && !present
            && !self.known(id, "toggle_multi_select")
        {
            return Ok(Toggle::Ignored);
        }
        state.toggle_multi_select(NodeId::from(id))
    }

    /// Toggle a node in the expansion frontier
    ///
    /// Same rule as [`Self::toggle_multi_select`]: removal never consults
    /// the index.
    pub fn toggle_expansion(&self, id: &str) -> Toggle {
        let mut state = self.state.lock();
        if !state.expanded().contains(id) && !self.known(id, "toggle_expansion") {
            return Toggle::Ignored;
        }
        state.toggle_expansion(NodeId::from(id))
    }

    /// Drop the selection and highlighted path
    pub fn clear_selection(&self) {
        self.state.lock().clear_selection();
    }

    /// Add an insight filter; `false` if blank or already present
    pub fn add_insight_filter(&self, text: &str) -> bool {
        self.state.lock().add_insight_filter(text)
    }

    /// Remove an insight filter; `false` if absent
    pub fn remove_insight_filter(&self, text: &str) -> bool {
        self.state.lock().remove_insight_filter(text)
    }

    /// Highlight the shortest path between the two selected nodes
    ///
    /// A newer highlight supersedes any outstanding ranking request.
    ///
    /// # Errors
    /// `PreconditionNotMet` unless exactly two nodes are selected
    pub fn request_shortest_path(&self) -> Result<PathOutcome, ExplorerError> {
        let mut state = self.state.lock();
        let (start, end) = state.selected_pair("request_shortest_path")?;

        let index = self.index();
        let path = self.finder(&index).shortest_path(start.as_str(), end.as_str());
        state.invalidate_ranking();

        if path.is_empty() {
            tracing::info!(%start, %end, "no path between selected nodes");
            state.set_highlight(Path::empty(), None);
            return Ok(PathOutcome::NoPath);
        }

        tracing::debug!(%path, "shortest path highlighted");
        state.set_highlight(path.clone(), None);
        Ok(PathOutcome::Found(path))
    }

    /// Highlight the oracle's preferred path between the two selected nodes
    ///
    /// Enumerates bounded candidates, asks the oracle to pick one and
    /// stores the pick with its commentary. Oracle errors and unusable
    /// indexes fall back to the first candidate. A timeout, a dropped
    /// future or a selection change while waiting leaves the highlight
    /// untouched.
    ///
    /// # Errors
    /// `PreconditionNotMet` unless exactly two nodes are selected
    #[tracing::instrument(skip(self))]
    pub async fn request_ranked_path(&self) -> Result<RankedPathOutcome, ExplorerError> {
        let (generation, found, request) = {
            let mut state = self.state.lock();
            let (start, end) = state.selected_pair("request_ranked_path")?;
            if state.ranking_in_progress() {
                tracing::debug!(%start, %end, "ranking already in progress");
                return Ok(RankedPathOutcome::AlreadyInProgress);
            }

            let index = self.index();
            let finder = self.finder(&index);
            let found = finder.candidate_paths(start.as_str(), end.as_str());
            if found.is_empty() {
                tracing::info!(%start, %end, "no candidate paths within depth bound");
                state.set_highlight(Path::empty(), None);
                return Ok(RankedPathOutcome::NoPath);
            }

            let request = RankingRequest {
                candidates: found.paths.iter().map(|p| finder.describe(p)).collect(),
                start_label: index.label_of(start.as_str()).to_string(),
                end_label: index.label_of(end.as_str()).to_string(),
            };
            let generation = state.begin_ranking((start, end));
            (generation, found, request)
        };

        let _guard = RankingGuard {
            state: &self.state,
            generation,
        };
        let count = CandidateCount::from(&found);
        tracing::debug!(%count, oracle = self.oracle.name(), "ranking candidates");

        let answer =
            tokio::time::timeout(self.config.oracle_timeout(), self.oracle.rank(&request)).await;

        let mut state = self.state.lock();
        if !state.is_current_ranking(generation) {
            tracing::info!("ranking answer discarded, selection changed");
            return Ok(RankedPathOutcome::Superseded);
        }
        state.finish_ranking(generation);

        let response = match answer {
            Err(_elapsed) => {
                let warning = OracleError::Timeout {
                    after_ms: self.config.oracle_timeout_ms,
                };
                tracing::warn!(%warning, "highlight unchanged");
                return Ok(RankedPathOutcome::TimedOut { warning });
            }
            Ok(result) => result.and_then(|response| {
                match response.valid_index(found.len()) {
                    Some(i) => Ok((i, response)),
                    None => Err(OracleError::InvalidIndex {
                        index: response.chosen_index,
                        candidates: found.len(),
                    }),
                }
            }),
        };

        match response {
            Ok((chosen, response)) => {
                let path = found.paths[chosen].clone();
                let annotation = PathAnnotation {
                    score: response.score,
                    rationale: response.rationale,
                    opportunities: response.opportunities,
                };
                tracing::info!(%path, score = annotation.score, "ranked path highlighted");
                state.set_highlight(path.clone(), Some(annotation.clone()));
                Ok(RankedPathOutcome::Ranked {
                    path,
                    annotation,
                    candidates: count,
                })
            }
            Err(warning) => {
                let path = found.paths[0].clone();
                tracing::warn!(%warning, %path, "ranking failed, falling back to first candidate");
                state.set_highlight(path.clone(), None);
                Ok(RankedPathOutcome::Fallback {
                    path,
                    warning,
                    candidates: count,
                })
            }
        }
    }
}
