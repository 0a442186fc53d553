//! Type-based clustering for summarizing large node sets

use crate::model::{Node, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default minimum members for a type to be reported
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

/// Default minimum set size before clustering activates
pub const DEFAULT_ACTIVATION_SIZE: usize = 8;

/// Clustering thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Types with fewer members are not reported
    pub min_cluster_size: usize,
    /// Sets smaller than this produce no clusters
    pub activation_size: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            activation_size: DEFAULT_ACTIVATION_SIZE,
        }
    }
}

/// One type-based group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Shared node type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Members of that type in the set
    pub count: usize,
}

/// Group a node set by type
///
/// Ordered by count descending, then type name.
#[must_use]
pub fn clusters<'a, I>(nodes: I, options: ClusterOptions) -> Vec<Cluster>
where
    I: IntoIterator<Item = &'a Node>,
{
    let mut counts: HashMap<&NodeType, usize> = HashMap::new();
    let mut total = 0usize;
    for node in nodes {
        *counts.entry(&node.node_type).or_default() += 1;
        total += 1;
    }

    if total < options.activation_size {
        return Vec::new();
    }

    let mut result: Vec<Cluster> = counts
        .into_iter()
        .filter(|(_, count)| *count >= options.min_cluster_size)
        .map(|(ty, count)| Cluster {
            node_type: ty.clone(),
            count,
        })
        .collect();
    result.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.node_type.as_str().cmp(b.node_type.as_str()))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(counts: &[(NodeType, usize)]) -> Vec<Node> {
        let mut out = Vec::new();
        for (ty, n) in counts {
            for i in 0..*n {
                out.push(Node::new(format!("{ty}-{i}"), format!("{ty} {i}"), ty.clone()));
            }
        }
        out
    }

    #[test]
    fn below_activation_is_noop() {
        let set = nodes(&[(NodeType::Company, 7)]);
        assert!(clusters(&set, ClusterOptions::default()).is_empty());
    }

    #[test]
    fn groups_types_above_threshold() {
        let set = nodes(&[(NodeType::Market, 3), (NodeType::Company, 6)]);
        let result = clusters(&set, ClusterOptions::default());
        assert_eq!(
            result,
            vec![
                Cluster { node_type: NodeType::Company, count: 6 },
                Cluster { node_type: NodeType::Market, count: 3 },
            ]
        );
    }

    #[test]
    fn small_groups_are_dropped() {
        let set = nodes(&[(NodeType::Person, 2), (NodeType::Technology, 8)]);
        let result = clusters(&set, ClusterOptions::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].node_type, NodeType::Technology);
    }
}
