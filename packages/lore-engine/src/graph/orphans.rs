use super::ClaimGraph;
use crate::domain::{ClaimId, OrphanProposal, OrphanStatus};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

/// A claim cut off from a fatally contradicted ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orphan {
    pub claim_id: ClaimId,
    /// The fatal root whose propagation reached this claim first.
    pub root_id: ClaimId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanDisagreement {
    pub claim_id: ClaimId,
    pub proposed: OrphanStatus,
    pub derived: OrphanStatus,
}

/// Engine-derived orphan status for every claim in the graph. Claims not
/// listed in `orphans` are VALID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    pub roots: Vec<ClaimId>,
    pub orphans: Vec<Orphan>,
}

impl OrphanReport {
    pub fn status(&self, id: &str) -> OrphanStatus {
        if self.is_orphaned(id) {
            OrphanStatus::CausallyOrphaned
        } else {
            OrphanStatus::Valid
        }
    }

    pub fn is_orphaned(&self, id: &str) -> bool {
        self.orphans.iter().any(|o| o.claim_id == id)
    }

    pub fn root_of(&self, id: &str) -> Option<&str> {
        self.orphans
            .iter()
            .find(|o| o.claim_id == id)
            .map(|o| o.root_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }

    /// Compares the oracle's orphan proposals against the derived status.
    /// The derived status always stands; each mismatch is logged and returned.
    pub fn disagreements(
        &self,
        graph: &ClaimGraph,
        proposals: &[OrphanProposal],
    ) -> Vec<OrphanDisagreement> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();

        // Last proposal per claim counts.
        for proposal in proposals.iter().rev() {
            if !graph.id_map.contains_key(&proposal.claim_id)
                || !seen.insert(proposal.claim_id.as_str())
            {
                continue;
            }
            let derived = self.status(&proposal.claim_id);
            if proposal.status != derived {
                warn!(
                    "Overriding oracle orphan status for claim {}: proposed {}, derived {}",
                    proposal.claim_id, proposal.status, derived
                );
                out.push(OrphanDisagreement {
                    claim_id: proposal.claim_id.clone(),
                    proposed: proposal.status,
                    derived,
                });
            }
        }

        out.reverse();
        out
    }
}

impl ClaimGraph {
    /// Marks every claim that reaches one of `roots` along one or more
    /// dependency edges as CAUSALLY ORPHANED.
    ///
    /// Breadth-first from all roots at once over reversed edges, so each orphan
    /// is attributed to its nearest root. A root is itself orphaned only when it
    /// depends on a root (including itself). Roots that are not in the graph
    /// are ignored.
    pub fn propagate_orphans(&self, roots: &[ClaimId]) -> OrphanReport {
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();
        let mut known_roots: Vec<ClaimId> = Vec::new();

        for root in roots {
            let Some(&idx) = self.id_map.get(root) else {
                debug!("Fatal root {} is not in the graph", root);
                continue;
            };
            if known_roots.contains(root) {
                continue;
            }
            queue.push_back((idx, known_roots.len()));
            known_roots.push(root.clone());
        }

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut reached: Vec<(NodeIndex, usize)> = Vec::new();

        while let Some((node, root)) = queue.pop_front() {
            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                if visited.insert(dependent) {
                    reached.push((dependent, root));
                    queue.push_back((dependent, root));
                }
            }
        }

        reached.sort_by_key(|(idx, _)| *idx);
        let orphans = reached
            .into_iter()
            .map(|(idx, root)| Orphan {
                claim_id: self.graph[idx].clone(),
                root_id: known_roots[root].clone(),
            })
            .collect::<Vec<_>>();

        if !orphans.is_empty() {
            debug!(
                "{} claims orphaned from {} fatal roots",
                orphans.len(),
                known_roots.len()
            );
        }

        OrphanReport {
            roots: known_roots,
            orphans,
        }
    }
}
