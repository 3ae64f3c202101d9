use crate::error::{KinshipError, Result};
use crate::kinship::graph::FamilyGraph;
use crate::types::{PathNode, Relation};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Cooperative cancellation shared between a request and its traversal
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(KinshipError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Upper bounds applied to a single traversal
#[derive(Debug, Clone)]
pub struct TraversalBudget {
    pub max_visited: usize,
    pub cancellation: CancellationFlag,
}

impl Default for TraversalBudget {
    fn default() -> Self {
        Self {
            max_visited: 250_000,
            cancellation: CancellationFlag::new(),
        }
    }
}

/// One step of a path: the person reached and the relation that led there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub handle: String,
    pub relation: Option<Relation>,
}

/// Ordered chain of people from a start person to an end person. The relation on
/// each step says what that person is to the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipPath {
    steps: Vec<PathStep>,
}

impl RelationshipPath {
    pub fn single(handle: impl Into<String>) -> Self {
        Self {
            steps: vec![PathStep {
                handle: handle.into(),
                relation: None,
            }],
        }
    }

    /// Build a path from a start handle and the `(handle, relation)` hops after it
    pub fn from_hops(start: impl Into<String>, hops: &[(&str, Relation)]) -> Self {
        let mut path = Self::single(start);
        path.steps.extend(hops.iter().map(|(handle, relation)| PathStep {
            handle: handle.to_string(),
            relation: Some(*relation),
        }));
        path
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of people on the path
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of edges walked
    pub fn distance(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn start(&self) -> &str {
        &self.steps[0].handle
    }

    pub fn end(&self) -> &str {
        &self.steps[self.steps.len() - 1].handle
    }

    pub fn handle_at(&self, position: usize) -> Option<&str> {
        self.steps.get(position).map(|step| step.handle.as_str())
    }

    /// Relations after the start node, in walking order
    pub fn relations(&self) -> Vec<Relation> {
        self.steps.iter().filter_map(|step| step.relation).collect()
    }

    /// The same path walked from the other end, with every relation inverted
    pub fn reversed(&self) -> Self {
        let count = self.steps.len();
        let steps = (0..count)
            .rev()
            .map(|i| PathStep {
                handle: self.steps[i].handle.clone(),
                relation: if i + 1 < count {
                    self.steps[i + 1].relation.map(|r| r.inverse())
                } else {
                    None
                },
            })
            .collect();

        Self { steps }
    }

    /// Render the path as wire nodes. Paths come from the graph, so every step
    /// resolves; a handle the graph does not know is left out.
    pub fn to_nodes(&self, graph: &FamilyGraph) -> Vec<PathNode> {
        self.steps
            .iter()
            .filter_map(|step| {
                let label = step.relation.map(|r| r.as_str()).unwrap_or("self");
                graph
                    .person(&step.handle)
                    .map(|person| PathNode::from_person(person, label))
            })
            .collect()
    }
}

/// Outcome of a path search, with the number of people visited on the way
#[derive(Debug, Clone)]
pub struct PathSearch {
    pub path: Option<RelationshipPath>,
    pub visited: usize,
}

/// Shortest relationship path between two people.
///
/// This is a single-source breadth-first search expanding from the start person
/// only. Every relation costs one step, so the first time the end person is
/// dequeued the path to it is a shortest one. Determinism comes from the fixed
/// neighbor order of [`FamilyGraph`].
pub struct PathFinder<'a> {
    graph: &'a FamilyGraph,
    budget: TraversalBudget,
}

impl<'a> PathFinder<'a> {
    pub fn new(graph: &'a FamilyGraph) -> Self {
        Self {
            graph,
            budget: TraversalBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: TraversalBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Get the shortest path, or `None` when the two people are not connected
    pub fn shortest_path(&self, start: &str, end: &str) -> Result<Option<RelationshipPath>> {
        Ok(self.search(start, end)?.path)
    }

    pub fn search(&self, start: &str, end: &str) -> Result<PathSearch> {
        let start_index = self
            .graph
            .node_index(start)
            .ok_or_else(|| KinshipError::PersonNotFound(start.to_string()))?;
        let end_index = self
            .graph
            .node_index(end)
            .ok_or_else(|| KinshipError::PersonNotFound(end.to_string()))?;

        if start_index == end_index {
            return Ok(PathSearch {
                path: Some(RelationshipPath::single(start)),
                visited: 1,
            });
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut discovered_by: HashMap<NodeIndex, (NodeIndex, Relation)> = HashMap::new();

        queue.push_back(start_index);
        visited.insert(start_index);

        while let Some(current_index) = queue.pop_front() {
            self.budget.cancellation.check()?;

            if current_index == end_index {
                let path = self.reconstruct(start_index, end_index, &discovered_by);
                debug!(
                    "Found path {} -> {} of distance {} after visiting {} people",
                    start,
                    end,
                    path.distance(),
                    visited.len()
                );
                return Ok(PathSearch {
                    path: Some(path),
                    visited: visited.len(),
                });
            }

            for (neighbor_index, relation) in self.graph.neighbor_indices(current_index) {
                if visited.insert(neighbor_index) {
                    discovered_by.insert(neighbor_index, (current_index, relation));
                    queue.push_back(neighbor_index);

                    if visited.len() > self.budget.max_visited {
                        return Err(KinshipError::TraversalLimitExceeded {
                            limit: self.budget.max_visited,
                        });
                    }
                }
            }
        }

        debug!("No path between {} and {} ({} people visited)", start, end, visited.len());
        Ok(PathSearch {
            path: None,
            visited: visited.len(),
        })
    }

    fn reconstruct(
        &self,
        start_index: NodeIndex,
        end_index: NodeIndex,
        discovered_by: &HashMap<NodeIndex, (NodeIndex, Relation)>,
    ) -> RelationshipPath {
        let mut steps = Vec::new();
        let mut current = end_index;

        // Build path in reverse
        while let Some(&(previous, relation)) = discovered_by.get(&current) {
            steps.push(PathStep {
                handle: self.graph.handle_at(current).to_string(),
                relation: Some(relation),
            });
            current = previous;
        }

        steps.push(PathStep {
            handle: self.graph.handle_at(start_index).to_string(),
            relation: None,
        });

        steps.reverse();
        RelationshipPath { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Snapshot;
    use crate::types::{Family, Gender, Person};

    fn create_test_graph() -> FamilyGraph {
        // G -> P1, P2 ; P1 -> C1 ; P2 -> C2 ; S married to C1 ; L alone
        let people = ["G", "P1", "P2", "C1", "C2", "S", "L"]
            .iter()
            .map(|h| Person::new(*h, Gender::Unknown))
            .collect();
        let families = vec![
            Family::new("F1", Some("G"), None, &["P1", "P2"]),
            Family::new("F2", Some("P1"), None, &["C1"]),
            Family::new("F3", Some("P2"), None, &["C2"]),
            Family::new("F4", Some("C1"), Some("S"), &[]),
        ];

        FamilyGraph::from_snapshot(Snapshot::new(people, families))
    }

    #[test]
    fn test_self_path() {
        let graph = create_test_graph();
        let path = PathFinder::new(&graph).shortest_path("C1", "C1").unwrap().unwrap();

        assert_eq!(path.len(), 1);
        assert_eq!(path.distance(), 0);
        assert!(path.relations().is_empty());
    }

    #[test]
    fn test_cousin_path_goes_up_then_down() {
        let graph = create_test_graph();
        let path = PathFinder::new(&graph).shortest_path("C1", "C2").unwrap().unwrap();

        assert_eq!(path.distance(), 4);
        assert_eq!(
            path.relations(),
            vec![Relation::Parent, Relation::Parent, Relation::Child, Relation::Child]
        );
        assert_eq!(path.handle_at(2), Some("G"));
    }

    #[test]
    fn test_path_lengths_are_symmetric() {
        let graph = create_test_graph();
        let finder = PathFinder::new(&graph);

        for (a, b) in [("C1", "C2"), ("S", "P2"), ("G", "C2"), ("P1", "P2")] {
            let forward = finder.shortest_path(a, b).unwrap().unwrap();
            let backward = finder.shortest_path(b, a).unwrap().unwrap();
            assert_eq!(forward.len(), backward.len(), "{} <-> {}", a, b);
        }
    }

    #[test]
    fn test_unconnected_people_have_no_path() {
        let graph = create_test_graph();
        assert!(PathFinder::new(&graph).shortest_path("C1", "L").unwrap().is_none());
    }

    #[test]
    fn test_unknown_person_is_an_error() {
        let graph = create_test_graph();
        let result = PathFinder::new(&graph).shortest_path("C1", "nobody");

        assert!(matches!(result, Err(KinshipError::PersonNotFound(h)) if h == "nobody"));
    }

    #[test]
    fn test_cycles_terminate() {
        // A is listed as both parent and child of B across two families
        let people = vec![Person::new("A", Gender::Male), Person::new("B", Gender::Male), Person::new("Z", Gender::Male)];
        let families = vec![
            Family::new("F1", Some("A"), None, &["B"]),
            Family::new("F2", Some("B"), None, &["A"]),
        ];
        let graph = FamilyGraph::from_snapshot(Snapshot::new(people, families));

        assert!(PathFinder::new(&graph).shortest_path("A", "Z").unwrap().is_none());
    }

    #[test]
    fn test_budget_limits_visited_people() {
        let graph = create_test_graph();
        let budget = TraversalBudget {
            max_visited: 2,
            ..TraversalBudget::default()
        };

        let result = PathFinder::new(&graph).with_budget(budget).shortest_path("C1", "C2");
        assert!(matches!(result, Err(KinshipError::TraversalLimitExceeded { limit: 2 })));
    }

    #[test]
    fn test_cancelled_search_stops() {
        let graph = create_test_graph();
        let budget = TraversalBudget::default();
        budget.cancellation.cancel();

        let result = PathFinder::new(&graph).with_budget(budget).shortest_path("C1", "C2");
        assert!(matches!(result, Err(KinshipError::Cancelled)));
    }

    #[test]
    fn test_reversed_path_inverts_relations() {
        let path = RelationshipPath::from_hops("C1", &[("P1", Relation::Parent), ("G", Relation::Parent)]);
        let reversed = path.reversed();

        assert_eq!(reversed.start(), "G");
        assert_eq!(reversed.end(), "C1");
        assert_eq!(reversed.relations(), vec![Relation::Child, Relation::Child]);
        assert_eq!(reversed.reversed(), path);
    }
}
