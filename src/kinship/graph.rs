use crate::error::Result;
use crate::kinship::connectivity::ConnectivityAnalyzer;
use crate::kinship::path::CancellationFlag;
use crate::store::Snapshot;
use crate::types::{Family, Person, Relation};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Adjacency index over one snapshot of the population.
///
/// Every derived relationship is stored as a pair of directed edges so that the
/// outgoing edges of a node are exactly its neighbors: a child gets a `Parent`
/// edge to each parent, each parent a `Child` edge back, and the two parents of a
/// family get `Spouse` edges to each other. The index is built once per request;
/// neighbor lookups never rescan the family list.
#[derive(Debug)]
pub struct FamilyGraph {
    graph: DiGraph<String, Relation>,
    node_map: HashMap<String, NodeIndex>,
    people: HashMap<String, Person>,
    families: Vec<Family>,
    child_in: HashMap<String, Vec<usize>>,
    parent_in: HashMap<String, Vec<usize>>,
}

/// A person adjacent to another, with the relation seen from the first person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub handle: String,
    pub relation: Relation,
}

impl FamilyGraph {
    /// Build the index from a snapshot. References to people missing from the
    /// snapshot are dropped here, so traversals never see dangling handles.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut people = HashMap::new();

        for person in snapshot.people {
            if !node_map.contains_key(&person.handle) {
                let node_index = graph.add_node(person.handle.clone());
                node_map.insert(person.handle.clone(), node_index);
            }
            people.insert(person.handle.clone(), person);
        }

        let mut index = Self {
            graph,
            node_map,
            people,
            families: Vec::new(),
            child_in: HashMap::new(),
            parent_in: HashMap::new(),
        };

        let mut seen_edges = HashSet::new();
        let mut dangling = 0;

        for family in snapshot.families {
            let family_index = index.families.len();

            let parents: Vec<NodeIndex> = family
                .parents()
                .filter_map(|parent| index.node_map.get(parent).copied())
                .collect();

            for parent in family.parents() {
                index
                    .parent_in
                    .entry(parent.to_string())
                    .or_insert_with(Vec::new)
                    .push(family_index);
            }

            for child in &family.child_handles {
                index
                    .child_in
                    .entry(child.clone())
                    .or_insert_with(Vec::new)
                    .push(family_index);

                let Some(&child_index) = index.node_map.get(child) else {
                    dangling += 1;
                    continue;
                };

                for &parent_index in &parents {
                    index.add_edge_pair(&mut seen_edges, child_index, parent_index, Relation::Parent);
                }
            }

            if let [father, mother] = parents.as_slice() {
                index.add_edge_pair(&mut seen_edges, *father, *mother, Relation::Spouse);
            }

            dangling += family.parents().count() - parents.len();
            index.families.push(family);
        }

        debug!(
            "Built family graph with {} people, {} edges ({} dangling references skipped)",
            index.graph.node_count(),
            index.graph.edge_count(),
            dangling
        );

        index
    }

    /// Add `from -relation-> to` and its inverse, once
    fn add_edge_pair(
        &mut self,
        seen_edges: &mut HashSet<(NodeIndex, NodeIndex, Relation)>,
        from: NodeIndex,
        to: NodeIndex,
        relation: Relation,
    ) {
        if from == to {
            debug!("Ignoring self-referencing {} edge on {}", relation.as_str(), self.graph[from]);
            return;
        }

        if seen_edges.insert((from, to, relation)) {
            self.graph.add_edge(from, to, relation);
        }
        if seen_edges.insert((to, from, relation.inverse())) {
            self.graph.add_edge(to, from, relation.inverse());
        }
    }

    /// Get the number of people in the graph
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of directed edges (two per derived relationship)
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.node_map.contains_key(handle)
    }

    pub fn person(&self, handle: &str) -> Option<&Person> {
        self.people.get(handle)
    }

    pub(crate) fn node_index(&self, handle: &str) -> Option<NodeIndex> {
        self.node_map.get(handle).copied()
    }

    pub(crate) fn handle_at(&self, node_index: NodeIndex) -> &str {
        &self.graph[node_index]
    }

    pub(crate) fn person_at(&self, node_index: NodeIndex) -> Option<&Person> {
        self.people.get(&self.graph[node_index])
    }

    /// People in the order the store returned them
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.graph
            .node_indices()
            .filter_map(move |node_index| self.person_at(node_index))
    }

    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Neighbors of a node: parents first, then spouses, then children,
    /// each group in family order
    pub(crate) fn neighbor_indices(&self, node_index: NodeIndex) -> Vec<(NodeIndex, Relation)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node_index, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.id(), edge.target()))
            .collect();

        edges.sort_by_key(|&(relation, edge_id, _)| (relation, edge_id));
        edges
            .into_iter()
            .map(|(relation, _, target)| (target, relation))
            .collect()
    }

    /// Parents, spouses and children of `handle`. An unknown or isolated
    /// person has no neighbors.
    pub fn neighbors(&self, handle: &str) -> Vec<Neighbor> {
        let Some(node_index) = self.node_index(handle) else {
            return Vec::new();
        };

        self.neighbor_indices(node_index)
            .into_iter()
            .map(|(target, relation)| Neighbor {
                handle: self.graph[target].clone(),
                relation,
            })
            .collect()
    }

    /// Families listing `handle` as a child, in store order
    pub fn families_as_child(&self, handle: &str) -> impl Iterator<Item = &Family> {
        self.family_refs(self.child_in.get(handle))
    }

    /// Families listing `handle` as father or mother, in store order
    pub fn families_as_parent(&self, handle: &str) -> impl Iterator<Item = &Family> {
        self.family_refs(self.parent_in.get(handle))
    }

    fn family_refs<'a>(&'a self, indices: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a Family> {
        indices
            .into_iter()
            .flatten()
            .map(move |&index| &self.families[index])
    }

    /// Get population statistics. The cluster count walks the whole population
    /// and stops when `cancellation` is set.
    pub fn statistics(&self, cancellation: &CancellationFlag) -> Result<GraphStatistics> {
        let people = self.node_count();

        let isolated_people = self
            .graph
            .node_indices()
            .filter(|&node_index| {
                self.graph
                    .neighbors_directed(node_index, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .count();

        let average_degree = if people > 0 {
            self.edge_count() as f64 / people as f64
        } else {
            0.0
        };

        let clusters = ConnectivityAnalyzer::new(self)
            .with_cancellation(cancellation.clone())
            .find_clusters()?
            .len();

        Ok(GraphStatistics {
            people,
            families: self.family_count(),
            relationships: self.edge_count() / 2,
            isolated_people,
            average_degree,
            clusters,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub people: usize,
    pub families: usize,
    pub relationships: usize,
    pub isolated_people: usize,
    pub average_degree: f64,
    pub clusters: usize,
}
