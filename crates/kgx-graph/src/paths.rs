//! Path discovery
//!
//! Two independent searches over the undirected adjacency view:
//! - [`PathFinder::shortest_path`]: breadth-first, fewest edges
//! - [`PathFinder::candidate_paths`]: depth-limited enumeration of simple
//!   paths, capped, for handing to an external ranker
//!
//! Both respect the optional relationship-type allowlist in [`PathOptions`].

use crate::index::{GraphIndex, Hop};
use crate::model::{NodeId, Path};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// Default edge-count bound for candidate enumeration
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Default number of candidates kept
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Search bounds and traversal filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOptions {
    /// Maximum edges in an enumerated candidate
    pub max_depth: usize,
    /// Maximum candidates kept (later discoveries are only counted)
    pub max_candidates: usize,
    /// If set, only these relationship types are traversed
    pub allowed_relationship_types: Option<BTreeSet<String>>,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            allowed_relationship_types: None,
        }
    }
}

impl PathOptions {
    /// With depth bound
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// With candidate cap
    #[inline]
    #[must_use]
    pub fn with_max_candidates(mut self, cap: usize) -> Self {
        self.max_candidates = cap;
        self
    }

    /// Restrict traversal to the given relationship types
    #[must_use]
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_relationship_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    fn allows(&self, hop: &Hop<'_>) -> bool {
        self.allowed_relationship_types
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&hop.relationship.relationship_type))
    }
}

/// Result of candidate enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePaths {
    /// Kept candidates, in discovery order
    pub paths: Vec<Path>,
    /// Every simple path found within the depth bound
    pub total_found: usize,
}

impl CandidatePaths {
    /// True if no path exists within the bound
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of kept candidates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True if the cap dropped some discoveries
    #[inline]
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.total_found > self.paths.len()
    }

    /// First candidate in discovery order
    #[must_use]
    pub fn first(&self) -> Option<&Path> {
        self.paths.first()
    }

    fn record(&mut self, stack: &[&str], cap: usize) {
        self.total_found += 1;
        if self.paths.len() < cap {
            self.paths.push(Path(stack.iter().map(|&id| NodeId::from(id)).collect()));
        }
    }
}

impl fmt::Display for CandidatePaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} candidates considered", self.paths.len(), self.total_found)
    }
}

/// Human-readable form of a path for the ranker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCandidate {
    /// Node labels in path order
    pub node_labels: Vec<String>,
    /// One relationship type per hop
    pub relationship_types: Vec<String>,
}

impl fmt::Display for PathCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.node_labels.iter().enumerate() {
            if i > 0 {
                let rel = self.relationship_types.get(i - 1).map_or("?", String::as_str);
                write!(f, " -[{rel}]-> ")?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

/// Path searches bound to one index
#[derive(Debug, Clone)]
pub struct PathFinder<'g> {
    index: &'g GraphIndex,
    options: PathOptions,
}

impl<'g> PathFinder<'g> {
    /// Finder with default options
    #[must_use]
    pub fn new(index: &'g GraphIndex) -> Self {
        Self {
            index,
            options: PathOptions::default(),
        }
    }

    /// With custom options
    #[must_use]
    pub fn with_options(mut self, options: PathOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &PathOptions {
        &self.options
    }

    /// Distinct traversable neighbors in adjacency order
    fn next_hops(&self, id: &str) -> Vec<&'g str> {
        let mut seen = HashSet::new();
        self.index
            .hops(id)
            .into_iter()
            .filter(|hop| self.options.allows(hop))
            .map(|hop| hop.neighbor.as_str())
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Shortest path by edge count
    ///
    /// Empty if either end is unknown or the ends are disconnected.
    /// `start == end` yields the single-node path.
    #[must_use]
    pub fn shortest_path(&self, start: &str, end: &str) -> Path {
        let (Some(start_node), Some(_)) = (self.index.node(start), self.index.node(end)) else {
            return Path::empty();
        };
        let start: &'g str = start_node.id.as_str();
        if start == end {
            return Path(vec![NodeId::from(start)]);
        }

        let mut visited: HashSet<&'g str> = HashSet::from([start]);
        let mut parent: HashMap<&'g str, &'g str> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.next_hops(current) {
                // marked on enqueue, never revisited
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == end {
                    return Self::reconstruct(&parent, start, next);
                }
                queue.push_back(next);
            }
        }

        tracing::debug!(start, end, "no path between nodes");
        Path::empty()
    }

    fn reconstruct(parent: &HashMap<&str, &str>, start: &str, end: &str) -> Path {
        let mut nodes = vec![NodeId::from(end)];
        let mut cursor = end;
        while cursor != start {
            match parent.get(cursor) {
                Some(&prev) => {
                    nodes.push(NodeId::from(prev));
                    cursor = prev;
                }
                None => break,
            }
        }
        nodes.reverse();
        Path(nodes)
    }

    /// Every simple path of at most `max_depth` edges, capped
    ///
    /// Candidates are kept in depth-first discovery order; the cap is a
    /// resource bound applied before any ranking.
    #[must_use]
    pub fn candidate_paths(&self, start: &str, end: &str) -> CandidatePaths {
        let mut out = CandidatePaths::default();
        let (Some(start_node), Some(_)) = (self.index.node(start), self.index.node(end)) else {
            return out;
        };
        let start: &'g str = start_node.id.as_str();

        let mut stack = vec![start];
        let mut on_path: HashSet<&'g str> = HashSet::from([start]);
        self.walk(start, end, &mut stack, &mut on_path, &mut out);

        tracing::debug!(
            start,
            end,
            kept = out.paths.len(),
            found = out.total_found,
            "candidate paths enumerated"
        );
        out
    }

    fn walk(
        &self,
        current: &'g str,
        end: &str,
        stack: &mut Vec<&'g str>,
        on_path: &mut HashSet<&'g str>,
        out: &mut CandidatePaths,
    ) {
        if current == end {
            out.record(stack, self.options.max_candidates);
            return;
        }
        // stack holds nodes; edges so far = len - 1
        if stack.len() > self.options.max_depth {
            return;
        }

        for next in self.next_hops(current) {
            if on_path.contains(next) {
                continue;
            }
            stack.push(next);
            on_path.insert(next);
            self.walk(next, end, stack, on_path, out);
            // free for sibling branches
            on_path.remove(next);
            stack.pop();
        }
    }

    /// Labels and relationship types along a path
    ///
    /// Each hop uses the first traversable relationship between the two
    /// nodes. Unknown nodes fall back to their ID.
    #[must_use]
    pub fn describe(&self, path: &Path) -> PathCandidate {
        let node_labels = path
            .nodes()
            .iter()
            .map(|id| self.index.label_of(id.as_str()).to_string())
            .collect();

        let relationship_types = path
            .nodes()
            .windows(2)
            .map(|pair| {
                self.index
                    .relationships_between(pair[0].as_str(), pair[1].as_str())
                    .into_iter()
                    .find(|hop| self.options.allows(hop))
                    .map_or_else(String::new, |hop| hop.relationship.relationship_type.clone())
            })
            .collect();

        PathCandidate {
            node_labels,
            relationship_types,
        }
    }
}

/// Shortest path with default options
#[must_use]
pub fn find_path(index: &GraphIndex, start: &str, end: &str) -> Path {
    PathFinder::new(index).shortest_path(start, end)
}

/// Candidate enumeration with a custom depth and the default cap
#[must_use]
pub fn find_candidate_paths(
    index: &GraphIndex,
    start: &str,
    end: &str,
    max_depth: usize,
) -> CandidatePaths {
    PathFinder::new(index)
        .with_options(PathOptions::default().with_max_depth(max_depth))
        .candidate_paths(start, end)
}
