use crate::error::{KinshipError, Result};
use crate::kinship::graph::FamilyGraph;
use crate::kinship::path::CancellationFlag;
use crate::types::{Person, PersonSummary, TreeChart, TreeNode};
use std::collections::HashSet;
use tracing::debug;

/// Builds generation-bounded ancestor and descendant trees for charts.
///
/// The generation bound is checked before every recursive step and is what
/// guarantees termination. A per-branch lineage set additionally cuts a branch
/// when a person would become their own ancestor (bad data), while still
/// letting the same ancestor appear on several branches (pedigree collapse).
pub struct TreeBuilder<'a> {
    graph: &'a FamilyGraph,
    cancellation: CancellationFlag,
}

impl<'a> TreeBuilder<'a> {
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

    /// Ancestors of `handle` up to `max_generations` above it. Each node's
    /// `children` are its father's and mother's subtrees.
    pub fn build_ancestor_tree(&self, handle: &str, max_generations: u32) -> Result<TreeNode> {
        let person = self.require(handle)?;
        let mut lineage = HashSet::new();

        let tree = self.ancestors_recursive(person, 0, max_generations, &mut lineage)?;
        debug!(
            "Built ancestor tree for {} with {} nodes over {} generations",
            handle,
            tree.node_count(),
            tree.depth()
        );
        Ok(tree)
    }

    /// Descendants of `handle` down to `max_generations` below it, across all of
    /// the person's families
    pub fn build_descendant_tree(&self, handle: &str, max_generations: u32) -> Result<TreeNode> {
        let person = self.require(handle)?;
        let mut lineage = HashSet::new();

        let tree = self.descendants_recursive(person, 0, max_generations, &mut lineage)?;
        debug!(
            "Built descendant tree for {} with {} nodes over {} generations",
            handle,
            tree.node_count(),
            tree.depth()
        );
        Ok(tree)
    }

    /// Pedigree chart: both directions around one person
    pub fn build_tree_chart(&self, handle: &str, generations: u32) -> Result<TreeChart> {
        let person = self.require(handle)?;

        Ok(TreeChart {
            person: PersonSummary::from(person),
            ancestors: self.build_ancestor_tree(handle, generations)?,
            descendants: self.build_descendant_tree(handle, generations)?,
        })
    }

    fn require(&self, handle: &str) -> Result<&'a Person> {
        self.graph
            .person(handle)
            .ok_or_else(|| KinshipError::PersonNotFound(handle.to_string()))
    }

    fn ancestors_recursive(
        &self,
        person: &Person,
        generation: u32,
        max_generations: u32,
        lineage: &mut HashSet<String>,
    ) -> Result<TreeNode> {
        self.cancellation.check()?;

        let mut node = TreeNode {
            person: PersonSummary::from(person),
            generation,
            children: Vec::new(),
        };

        if generation >= max_generations {
            return Ok(node);
        }

        // Only the first family with a known parent is charted
        let Some(family) = self
            .graph
            .families_as_child(&person.handle)
            .find(|family| family.parents().any(|parent| self.graph.contains(parent)))
        else {
            return Ok(node);
        };

        lineage.insert(person.handle.clone());

        for parent_handle in family.parents() {
            if lineage.contains(parent_handle) {
                debug!("Cycle at {} while charting ancestors, cutting branch", parent_handle);
                continue;
            }
            let Some(parent) = self.graph.person(parent_handle) else {
                continue;
            };
            node.children
                .push(self.ancestors_recursive(parent, generation + 1, max_generations, lineage)?);
        }

        lineage.remove(&person.handle);
        Ok(node)
    }

    fn descendants_recursive(
        &self,
        person: &Person,
        generation: u32,
        max_generations: u32,
        lineage: &mut HashSet<String>,
    ) -> Result<TreeNode> {
        self.cancellation.check()?;

        let mut node = TreeNode {
            person: PersonSummary::from(person),
            generation,
            children: Vec::new(),
        };

        if generation >= max_generations {
            return Ok(node);
        }

        lineage.insert(person.handle.clone());
        let mut charted = HashSet::new();

        for family in self.graph.families_as_parent(&person.handle) {
            for child_handle in &family.child_handles {
                if lineage.contains(child_handle) || !charted.insert(child_handle.as_str()) {
                    continue;
                }
                let Some(child) = self.graph.person(child_handle) else {
                    continue;
                };
                node.children
                    .push(self.descendants_recursive(child, generation + 1, max_generations, lineage)?);
            }
        }

        lineage.remove(&person.handle);
        Ok(node)
    }
}
