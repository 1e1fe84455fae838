#[cfg(test)]
mod tests {
    use crate::domain::{
        Claim, ClaimSet, DependencyEdge, Importance, OrphanProposal, OrphanStatus,
    };
    use crate::graph::ClaimGraph;

    fn claims(ids: &[&str]) -> ClaimSet {
        ClaimSet::from_claims(
            ids.iter()
                .map(|id| Claim::new(*id, format!("claim {id}"), Importance::Major)),
        )
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<DependencyEdge> {
        pairs
            .iter()
            .map(|(from, to)| DependencyEdge::new(*from, *to))
            .collect()
    }

    fn roots(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_claim_without_edges_is_never_orphaned() {
        let graph = ClaimGraph::build(&claims(&["A", "B"]), &[]);
        let report = graph.propagate_orphans(&roots(&["A"]));
        assert!(report.is_empty());
        assert_eq!(report.status("A"), OrphanStatus::Valid);
        assert_eq!(report.status("B"), OrphanStatus::Valid);
    }

    #[test]
    fn test_transitive_chain_is_orphaned() {
        let graph = ClaimGraph::build(&claims(&["A", "B", "C"]), &edges(&[("A", "B"), ("B", "C")]));
        let report = graph.propagate_orphans(&roots(&["C"]));

        assert_eq!(report.status("A"), OrphanStatus::CausallyOrphaned);
        assert_eq!(report.status("B"), OrphanStatus::CausallyOrphaned);
        assert_eq!(report.status("C"), OrphanStatus::Valid);
        assert_eq!(report.root_of("A"), Some("C"));
    }

    #[test]
    fn test_cycle_without_root_terminates_valid() {
        let graph = ClaimGraph::build(&claims(&["A", "B"]), &edges(&[("A", "B"), ("B", "A")]));
        let report = graph.propagate_orphans(&[]);
        assert!(report.is_empty());
        assert_eq!(report.status("A"), OrphanStatus::Valid);
        assert_eq!(report.status("B"), OrphanStatus::Valid);
    }

    #[test]
    fn test_cycle_through_root_terminates() {
        let graph = ClaimGraph::build(
            &claims(&["A", "B", "C"]),
            &edges(&[("A", "B"), ("B", "A"), ("C", "C")]),
        );
        let report = graph.propagate_orphans(&roots(&["B", "C"]));
        // B depends on A which depends on B; C depends on itself.
        assert_eq!(report.len(), 3);
        assert_eq!(report.root_of("C"), Some("C"));
    }

    #[test]
    fn test_dangling_edges_are_ignored() {
        let graph = ClaimGraph::build(
            &claims(&["A", "B"]),
            &edges(&[("A", "B"), ("A", "Z"), ("Y", "B")]),
        );
        // Unknown ids never become nodes
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.ignored_edges.len(), 2);
        assert_eq!(graph.prerequisites("A"), vec!["B"]);
        assert_eq!(graph.dependents("B"), vec!["A"]);
        assert!(graph.prerequisites("Z").is_empty());
    }

    #[test]
    fn test_unknown_root_is_ignored() {
        let graph = ClaimGraph::build(&claims(&["A", "B"]), &edges(&[("A", "B")]));
        let report = graph.propagate_orphans(&roots(&["Q"]));
        assert!(report.roots.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn test_nearest_root_attribution() {
        let graph = ClaimGraph::build(
            &claims(&["A", "B", "C", "D"]),
            &edges(&[("A", "B"), ("B", "C"), ("A", "D")]),
        );
        let report = graph.propagate_orphans(&roots(&["C", "D"]));
        assert_eq!(report.root_of("B"), Some("C"));
        assert_eq!(report.root_of("A"), Some("D"));
    }

    #[test]
    fn test_oracle_proposals_are_overridden() {
        let graph = ClaimGraph::build(&claims(&["A", "B", "C"]), &edges(&[("A", "B")]));
        let report = graph.propagate_orphans(&roots(&["B"]));

        let proposals = vec![
            OrphanProposal {
                claim_id: "A".to_string(),
                status: OrphanStatus::Valid,
                explanation: None,
            },
            OrphanProposal {
                claim_id: "C".to_string(),
                status: OrphanStatus::CausallyOrphaned,
                explanation: None,
            },
            OrphanProposal {
                claim_id: "B".to_string(),
                status: OrphanStatus::Valid,
                explanation: None,
            },
            OrphanProposal {
                claim_id: "X".to_string(),
                status: OrphanStatus::CausallyOrphaned,
                explanation: None,
            },
        ];

        let disagreements = report.disagreements(&graph, &proposals);
        let ids: Vec<&str> = disagreements.iter().map(|d| d.claim_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(disagreements[0].derived, OrphanStatus::CausallyOrphaned);
    }
}
