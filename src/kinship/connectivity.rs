use crate::error::{KinshipError, Result};
use crate::kinship::graph::FamilyGraph;
use crate::kinship::path::CancellationFlag;
use crate::types::Person;
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// Finds parts of the population that are not linked to the rest of the tree
pub struct ConnectivityAnalyzer<'a> {
    graph: &'a FamilyGraph,
    cancellation: CancellationFlag,
}

impl<'a> ConnectivityAnalyzer<'a> {
    pub fn new(graph: &'a FamilyGraph) -> Self {
        Self {
            graph,
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// People not reachable from the first person in store order
    pub fn find_disconnected_branches(&self) -> Result<Vec<&'a Person>> {
        match self.graph.node_indices().next() {
            Some(root) => self.unreachable_from(root),
            None => Ok(Vec::new()),
        }
    }

    /// People not reachable from `root_handle`
    pub fn find_disconnected_from(&self, root_handle: &str) -> Result<Vec<&'a Person>> {
        let root = self
            .graph
            .node_index(root_handle)
            .ok_or_else(|| KinshipError::PersonNotFound(root_handle.to_string()))?;

        self.unreachable_from(root)
    }

    fn unreachable_from(&self, root: NodeIndex) -> Result<Vec<&'a Person>> {
        let graph = self.graph;
        let reachable = self.bfs_component(root, &HashSet::new())?;

        let disconnected: Vec<&'a Person> = graph
            .node_indices()
            .filter(|node_index| !reachable.contains(node_index))
            .filter_map(|node_index| graph.person_at(node_index))
            .collect();

        info!(
            "Connectivity scan from {}: {} reachable, {} disconnected",
            self.graph.handle_at(root),
            reachable.len(),
            disconnected.len()
        );
        Ok(disconnected)
    }

    /// Every connected group of people, largest first. Groups of equal size keep
    /// the order in which their first member appears in the store.
    pub fn find_clusters(&self) -> Result<Vec<Vec<&'a Person>>> {
        let graph = self.graph;
        let mut assigned: HashSet<NodeIndex> = HashSet::new();
        let mut clusters = Vec::new();

        for node_index in graph.node_indices() {
            if assigned.contains(&node_index) {
                continue;
            }

            let component = self.bfs_component(node_index, &assigned)?;
            assigned.extend(component.iter().copied());

            // Keep store order inside each cluster
            let mut members: Vec<NodeIndex> = component.into_iter().collect();
            members.sort();
            clusters.push(
                members
                    .into_iter()
                    .filter_map(|member| graph.person_at(member))
                    .collect::<Vec<_>>(),
            );
        }

        clusters.sort_by(|a, b| b.len().cmp(&a.len()));
        debug!("Found {} clusters", clusters.len());
        Ok(clusters)
    }

    /// Breadth-first walk over parent, spouse and child edges
    fn bfs_component(&self, root: NodeIndex, skip: &HashSet<NodeIndex>) -> Result<HashSet<NodeIndex>> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        queue.push_back(root);
        visited.insert(root);

        while let Some(current_index) = queue.pop_front() {
            self.cancellation.check()?;

            for (neighbor_index, _) in self.graph.neighbor_indices(current_index) {
                if !skip.contains(&neighbor_index) && visited.insert(neighbor_index) {
                    queue.push_back(neighbor_index);
                }
            }
        }

        Ok(visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Snapshot;
    use crate::types::{Family, Gender};

    fn create_test_graph() -> FamilyGraph {
        // Main tree: A + M -> B ; second tree: P -> Q, R ; loner: X
        let people = ["A", "M", "B", "P", "Q", "X", "R"]
            .iter()
            .map(|h| Person::new(*h, Gender::Unknown))
            .collect();
        let families = vec![
            Family::new("F1", Some("A"), Some("M"), &["B"]),
            Family::new("F2", Some("P"), None, &["Q", "R"]),
        ];

        FamilyGraph::from_snapshot(Snapshot::new(people, families))
    }

    fn handles(people: &[&Person]) -> Vec<String> {
        people.iter().map(|p| p.handle.clone()).collect()
    }

    #[test]
    fn test_disconnected_from_first_person() {
        let graph = create_test_graph();
        let disconnected = ConnectivityAnalyzer::new(&graph).find_disconnected_branches().unwrap();

        assert_eq!(handles(&disconnected), vec!["P", "Q", "X", "R"]);
    }

    #[test]
    fn test_person_without_families_is_disconnected() {
        let graph = create_test_graph();
        let disconnected = ConnectivityAnalyzer::new(&graph).find_disconnected_from("Q").unwrap();

        assert!(handles(&disconnected).contains(&"X".to_string()));
        assert!(!handles(&disconnected).contains(&"R".to_string()));
    }

    #[test]
    fn test_spouse_edges_connect() {
        let graph = create_test_graph();
        let disconnected = ConnectivityAnalyzer::new(&graph).find_disconnected_from("M").unwrap();

        assert!(!handles(&disconnected).contains(&"A".to_string()));
    }

    #[test]
    fn test_clusters_largest_first() {
        let graph = create_test_graph();
        let clusters = ConnectivityAnalyzer::new(&graph).find_clusters().unwrap();

        assert_eq!(clusters.len(), 3);
        assert_eq!(handles(&clusters[0]), vec!["A", "M", "B"]);
        assert_eq!(handles(&clusters[1]), vec!["P", "Q", "R"]);
        assert_eq!(handles(&clusters[2]), vec!["X"]);
    }

    #[test]
    fn test_empty_population() {
        let graph = FamilyGraph::from_snapshot(Snapshot::default());
        let analyzer = ConnectivityAnalyzer::new(&graph);

        assert!(analyzer.find_disconnected_branches().unwrap().is_empty());
        assert!(analyzer.find_clusters().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_root() {
        let graph = create_test_graph();
        let result = ConnectivityAnalyzer::new(&graph).find_disconnected_from("nobody");

        assert!(matches!(result, Err(KinshipError::PersonNotFound(_))));
    }

    #[test]
    fn test_cancelled_scan() {
        let graph = create_test_graph();
        let cancellation = CancellationFlag::new();
        cancellation.cancel();

        let analyzer = ConnectivityAnalyzer::new(&graph).with_cancellation(cancellation);

        assert!(matches!(analyzer.find_disconnected_branches(), Err(KinshipError::Cancelled)));
        assert!(matches!(analyzer.find_clusters(), Err(KinshipError::Cancelled)));
    }
}
