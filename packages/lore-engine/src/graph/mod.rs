use crate::domain::{ClaimId, ClaimSet, DependencyEdge};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, warn};

pub mod orphans;
mod propagation_test;

pub use orphans::{Orphan, OrphanDisagreement, OrphanReport};

/// Dependency graph among the claims of one story.
///
/// An edge `A -> B` means "A depends on B". Nodes are the registered claims;
/// edges naming an unregistered claim are kept aside in `ignored_edges`.
#[derive(Debug, Clone, Default)]
pub struct ClaimGraph {
    pub graph: DiGraph<ClaimId, String>, // Node=Claim, Edge=Reason
    pub id_map: HashMap<ClaimId, NodeIndex>,
    pub ignored_edges: Vec<DependencyEdge>,
}

impl ClaimGraph {
    pub fn build(claims: &ClaimSet, edges: &[DependencyEdge]) -> Self {
        let mut cg = Self::default();

        for claim in claims.iter() {
            cg.get_or_create_node(&claim.id);
        }

        for edge in edges {
            let (Some(&from), Some(&to)) = (
                cg.id_map.get(&edge.claim_id),
                cg.id_map.get(&edge.prerequisite_id),
            ) else {
                warn!(
                    "Ignoring dependency {} -> {}: unknown claim",
                    edge.claim_id, edge.prerequisite_id
                );
                cg.ignored_edges.push(edge.clone());
                continue;
            };
            // Repeated edges keep one arc; the latest reason wins.
            cg.graph.update_edge(from, to, edge.reason.clone());
        }

        if petgraph::algo::is_cyclic_directed(&cg.graph) {
            debug!("Dependency graph contains a cycle; propagation is visited-set bounded");
        }

        cg
    }

    fn get_or_create_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.id_map.get(id) {
            idx
        } else {
            let idx = self.graph.add_node(id.to_string());
            self.id_map.insert(id.to_string(), idx);
            idx
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Claims that `id` depends on.
    pub fn prerequisites(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Claims that depend on `id`.
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.id_map.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<(NodeIndex, &str)> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| (n, self.graph[n].as_str()))
            .collect();
        ids.sort_by_key(|(n, _)| *n);
        ids.dedup_by_key(|(n, _)| *n);
        ids.into_iter().map(|(_, id)| id).collect()
    }
}
