use crate::error::{KinshipError, Result};
use crate::kinship::{
    Classification, FamilyGraph, PathFinder, RelationshipClassifier, RelationshipPath, TreeBuilder,
};
use crate::service::KinshipContext;
use crate::types::{PathNode, RelationshipResult, RelationshipType, TreeChart, TreeNode};
use tracing::{info, instrument};
use uuid::Uuid;

/// Relationship calculator and chart builders behind the visualization endpoints
#[derive(Clone)]
pub struct VisualizationService {
    context: KinshipContext,
}

impl VisualizationService {
    pub fn new(context: KinshipContext) -> Self {
        Self { context }
    }

    /// Shortest relationship between two people, classified from person1's side
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn calculate_relationship(&self, person1: &str, person2: &str) -> Result<RelationshipResult> {
        tokio::try_join!(
            self.context.require_person(person1),
            self.context.require_person(person2)
        )?;

        let (from, to) = (person1.to_string(), person2.to_string());
        let result = self
            .context
            .run_bounded("calculate_relationship", move |graph, budget| {
                let search = PathFinder::new(graph).with_budget(budget).search(&from, &to)?;
                metrics::histogram!("kinship_traversal_visited_nodes", search.visited as f64);
                build_relationship_result(graph, &from, &to, search.path.as_ref())
            })
            .await?;

        info!(
            "Relationship {} -> {}: {} ({}, distance {})",
            person1,
            person2,
            result.relationship,
            result.relationship_type.as_str(),
            result.distance
        );
        Ok(result)
    }

    /// Ancestor tree for the circular fan chart
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn fan_chart(&self, handle: &str, generations: Option<u32>) -> Result<TreeNode> {
        self.context.require_person(handle).await?;

        let config = self.context.config();
        let generations = config.clamp_generations(generations, config.charts.fan_chart_generations);
        let handle = handle.to_string();

        self.context
            .run_bounded("fan_chart", move |graph, budget| {
                TreeBuilder::new(graph)
                    .with_cancellation(budget.cancellation)
                    .build_ancestor_tree(&handle, generations)
            })
            .await
    }

    /// Ancestors and descendants around one person
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn tree_chart(&self, handle: &str, generations: Option<u32>) -> Result<TreeChart> {
        self.context.require_person(handle).await?;

        let config = self.context.config();
        let generations = config.clamp_generations(generations, config.charts.tree_chart_generations);
        let handle = handle.to_string();

        self.context
            .run_bounded("tree_chart", move |graph, budget| {
                TreeBuilder::new(graph)
                    .with_cancellation(budget.cancellation)
                    .build_tree_chart(&handle, generations)
            })
            .await
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn descendant_tree(&self, handle: &str, generations: Option<u32>) -> Result<TreeNode> {
        self.context.require_person(handle).await?;

        let config = self.context.config();
        let generations = config.clamp_generations(generations, config.charts.descendant_generations);
        let handle = handle.to_string();

        self.context
            .run_bounded("descendant_tree", move |graph, budget| {
                TreeBuilder::new(graph)
                    .with_cancellation(budget.cancellation)
                    .build_descendant_tree(&handle, generations)
            })
            .await
    }
}

/// Shape a found (or missing) path into the wire result. `person2.relationship`
/// names person2 relative to person1 and `person1.relationship` the reverse.
pub fn build_relationship_result(
    graph: &FamilyGraph,
    person1: &str,
    person2: &str,
    path: Option<&RelationshipPath>,
) -> Result<RelationshipResult> {
    let Some(path) = path else {
        let unrelated = Classification::unrelated();
        return Ok(RelationshipResult {
            person1: summary_node(graph, person1, &unrelated.description)?,
            person2: summary_node(graph, person2, &unrelated.description)?,
            relationship: unrelated.description,
            common_ancestor: None,
            path: Vec::new(),
            distance: -1,
            relationship_type: RelationshipType::Distant,
        });
    };

    let classifier = RelationshipClassifier::new(graph);
    let forward = classifier.classify(path);
    let backward = classifier.classify(&path.reversed());

    let nodes = path.to_nodes(graph);
    let common_ancestor = forward
        .common_ancestor
        .as_deref()
        .and_then(|handle| nodes.iter().find(|node| node.handle == handle))
        .cloned();

    Ok(RelationshipResult {
        person1: summary_node(graph, person1, &backward.description)?,
        person2: summary_node(graph, person2, &forward.description)?,
        relationship: forward.description,
        common_ancestor,
        distance: path.distance() as i64,
        path: nodes,
        relationship_type: forward.relationship_type,
    })
}

fn summary_node(graph: &FamilyGraph, handle: &str, relationship: &str) -> Result<PathNode> {
    graph
        .person(handle)
        .map(|person| PathNode::from_person(person, relationship))
        .ok_or_else(|| KinshipError::PersonNotFound(handle.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{MemoryStore, Snapshot};
    use crate::types::{Family, Gender, Person};
    use std::sync::Arc;

    fn create_test_service() -> VisualizationService {
        // F1: A -> B, C ; F2: B + W -> D ; L is unrelated
        let mut a = Person::new("A", Gender::Male);
        a.given_name = Some("Albert".to_string());
        a.surname = Some("Hale".to_string());

        let store = MemoryStore::new(
            vec![
                a,
                Person::new("B", Gender::Male),
                Person::new("C", Gender::Female),
                Person::new("W", Gender::Female),
                Person::new("D", Gender::Unknown),
                Person::new("L", Gender::Unknown),
            ],
            vec![
                Family::new("F1", Some("A"), None, &["B", "C"]),
                Family::new("F2", Some("B"), Some("W"), &["D"]),
            ],
        );

        VisualizationService::new(KinshipContext::new(Arc::new(store), Arc::new(Config::default())))
    }

    #[tokio::test]
    async fn test_siblings() {
        let service = create_test_service();
        let result = service.calculate_relationship("B", "C").await.unwrap();

        assert_eq!(result.relationship_type, RelationshipType::Sibling);
        assert_eq!(result.distance, 2);
        assert_eq!(result.relationship, "Sister");
        assert_eq!(result.person1.relationship, "Brother");
        assert_eq!(result.common_ancestor.unwrap().name, "Albert Hale");
        assert_eq!(result.path.len(), 3);
    }

    #[tokio::test]
    async fn test_parent_and_child_perspectives() {
        let service = create_test_service();

        let from_parent = service.calculate_relationship("A", "B").await.unwrap();
        assert_eq!(from_parent.relationship_type, RelationshipType::Child);
        assert_eq!(from_parent.distance, 1);

        let from_child = service.calculate_relationship("B", "A").await.unwrap();
        assert_eq!(from_child.relationship_type, RelationshipType::Parent);
        assert_eq!(from_child.relationship, "Father");
        assert_eq!(from_child.person1.relationship, "Son");
    }

    #[tokio::test]
    async fn test_self_relationship() {
        let service = create_test_service();
        let result = service.calculate_relationship("D", "D").await.unwrap();

        assert_eq!(result.relationship_type, RelationshipType::SelfRelation);
        assert_eq!(result.distance, 0);
        assert_eq!(result.path.len(), 1);
        assert_eq!(result.path[0].relationship, "self");
    }

    #[tokio::test]
    async fn test_no_relationship_is_a_result() {
        let service = create_test_service();
        let result = service.calculate_relationship("A", "L").await.unwrap();

        assert_eq!(result.distance, -1);
        assert_eq!(result.relationship_type, RelationshipType::Distant);
        assert!(result.path.is_empty());
        assert!(result.common_ancestor.is_none());
        assert!(!result.is_related());
    }

    #[tokio::test]
    async fn test_missing_person() {
        let service = create_test_service();
        let result = service.calculate_relationship("A", "nobody").await;

        assert!(matches!(result, Err(KinshipError::PersonNotFound(h)) if h == "nobody"));
    }

    #[test]
    fn test_result_for_unknown_handle_is_not_found() {
        let graph = FamilyGraph::from_snapshot(Snapshot::new(vec![Person::new("A", Gender::Male)], vec![]));

        let result = build_relationship_result(&graph, "A", "nobody", None);
        assert!(matches!(result, Err(KinshipError::PersonNotFound(h)) if h == "nobody"));

        let path = RelationshipPath::single("A");
        let result = build_relationship_result(&graph, "A", "A", Some(&path)).unwrap();
        assert_eq!(result.person1.handle, "A");
        assert_eq!(result.path.len(), 1);
    }

    #[tokio::test]
    async fn test_charts() {
        let service = create_test_service();

        let fan = service.fan_chart("D", None).await.unwrap();
        assert_eq!(fan.children.len(), 2);
        assert_eq!(fan.depth(), 2);

        let limited = service.fan_chart("D", Some(1)).await.unwrap();
        assert_eq!(limited.depth(), 1);

        let descendants = service.descendant_tree("A", None).await.unwrap();
        assert_eq!(descendants.node_count(), 4);

        let chart = service.tree_chart("B", None).await.unwrap();
        assert_eq!(chart.person.handle, "B");
        assert_eq!(chart.ancestors.children[0].person.handle, "A");
        assert_eq!(chart.descendants.children[0].person.handle, "D");
    }

    #[tokio::test]
    async fn test_requested_generations_are_clamped() {
        let service = create_test_service();
        let fan = service.fan_chart("D", Some(10_000)).await.unwrap();

        assert!(fan.depth() <= Config::default().traversal.max_generations);
    }
}
