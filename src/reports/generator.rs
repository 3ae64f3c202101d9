use crate::kinship::GraphStatistics;
use crate::reports::formatters::{JsonFormatter, MarkdownFormatter, ReportFormatter, TextFormatter};
use crate::types::{DisconnectedReport, RelationshipResult, TreeNode};
use anyhow::Result;

/// Report generator for creating various output formats
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    fn formatter(&self, format: &str) -> Result<Box<dyn ReportFormatter>> {
        match format.to_lowercase().as_str() {
            "json" => Ok(Box::new(JsonFormatter)),
            "markdown" | "md" => Ok(Box::new(MarkdownFormatter)),
            "text" => Ok(Box::new(TextFormatter)),
            _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
        }
    }

    pub fn relationship(&self, result: &RelationshipResult, format: &str) -> Result<String> {
        self.formatter(format)?.format_relationship(result)
    }

    pub fn tree(&self, title: &str, tree: &TreeNode, format: &str) -> Result<String> {
        self.formatter(format)?.format_tree(title, tree)
    }

    pub fn disconnected(&self, report: &DisconnectedReport, format: &str) -> Result<String> {
        self.formatter(format)?.format_disconnected(report)
    }

    pub fn statistics(&self, stats: &GraphStatistics, format: &str) -> Result<String> {
        self.formatter(format)?.format_statistics(stats)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gender, PathNode, Person, RelationshipType};

    fn create_test_result() -> RelationshipResult {
        let mut b = Person::new("B", Gender::Male);
        b.given_name = Some("Ben".to_string());
        let mut a = Person::new("A", Gender::Male);
        a.given_name = Some("Abe".to_string());

        RelationshipResult {
            person1: PathNode::from_person(&b, "Son"),
            person2: PathNode::from_person(&a, "Father"),
            relationship: "Father".to_string(),
            common_ancestor: Some(PathNode::from_person(&a, "parent")),
            path: vec![PathNode::from_person(&b, "self"), PathNode::from_person(&a, "parent")],
            distance: 1,
            relationship_type: RelationshipType::Parent,
        }
    }

    #[test]
    fn test_relationship_formats() {
        let generator = ReportGenerator::new();
        let result = create_test_result();

        let text = generator.relationship(&result, "text").unwrap();
        assert!(text.starts_with("Ben -> Abe: Father"));
        assert!(text.contains("Path: Ben -> Abe"));

        let markdown = generator.relationship(&result, "Markdown").unwrap();
        assert!(markdown.contains("**Abe** is the **Father** of Ben"));
        assert!(markdown.contains("2. Abe (parent)"));

        let json = generator.relationship(&result, "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["relationshipType"], "parent");
    }

    #[test]
    fn test_unsupported_format() {
        let generator = ReportGenerator::new();
        assert!(generator.relationship(&create_test_result(), "pdf").is_err());
    }

    #[test]
    fn test_statistics_text() {
        let stats = GraphStatistics {
            people: 3,
            families: 1,
            relationships: 3,
            isolated_people: 0,
            average_degree: 2.0,
            clusters: 1,
        };

        let text = ReportGenerator::new().statistics(&stats, "text").unwrap();
        assert!(text.contains("Average degree: 2.00"));
    }
}
