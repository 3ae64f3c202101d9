use crate::kinship::GraphStatistics;
use crate::types::{parse_year, DisconnectedReport, PersonSummary, RelationshipResult, TreeNode};
use anyhow::Result;

/// Trait for report formatters
pub trait ReportFormatter {
    fn format_relationship(&self, result: &RelationshipResult) -> Result<String>;
    fn format_tree(&self, title: &str, tree: &TreeNode) -> Result<String>;
    fn format_disconnected(&self, report: &DisconnectedReport) -> Result<String>;
    fn format_statistics(&self, stats: &GraphStatistics) -> Result<String>;
}

/// "1820-1890", "b. 1820", "d. 1890" or empty
pub fn lifespan(person: &PersonSummary) -> String {
    let birth = person.birth_date.as_deref().and_then(parse_year);
    let death = person.death_date.as_deref().and_then(parse_year);

    match (birth, death) {
        (Some(birth), Some(death)) => format!("{}-{}", birth, death),
        (Some(birth), None) => format!("b. {}", birth),
        (None, Some(death)) => format!("d. {}", death),
        (None, None) => String::new(),
    }
}

fn label(person: &PersonSummary) -> String {
    let span = lifespan(person);
    if span.is_empty() {
        person.name.clone()
    } else {
        format!("{} ({})", person.name, span)
    }
}

fn render_tree_lines(node: &TreeNode, indent: &str, bullet: &str, lines: &mut Vec<String>) {
    let depth = node.generation as usize;
    lines.push(format!("{}{}{}", indent.repeat(depth), bullet, label(&node.person)));
    for child in &node.children {
        render_tree_lines(child, indent, bullet, lines);
    }
}

/// Markdown formatter
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format_relationship(&self, result: &RelationshipResult) -> Result<String> {
        let mut out = format!(
            "# Relationship: {} and {}\n\n**{}** is the **{}** of {}\n\n- **Type**: {}\n- **Distance**: {}\n",
            result.person1.name,
            result.person2.name,
            result.person2.name,
            result.relationship,
            result.person1.name,
            result.relationship_type.as_str(),
            result.distance,
        );

        if let Some(ancestor) = &result.common_ancestor {
            out.push_str(&format!("- **Common ancestor**: {}\n", ancestor.name));
        }

        if !result.path.is_empty() {
            out.push_str("\n## Path\n");
            for (position, node) in result.path.iter().enumerate() {
                out.push_str(&format!("{}. {} ({})\n", position + 1, node.name, node.relationship));
            }
        }

        Ok(out)
    }

    fn format_tree(&self, title: &str, tree: &TreeNode) -> Result<String> {
        let mut lines = vec![format!("# {}", title), String::new()];
        render_tree_lines(tree, "  ", "- ", &mut lines);
        Ok(lines.join("\n") + "\n")
    }

    fn format_disconnected(&self, report: &DisconnectedReport) -> Result<String> {
        let mut out = format!("# Disconnected people\n\n**Count**: {}\n", report.count);
        if !report.branches.is_empty() {
            out.push('\n');
        }
        for person in &report.branches {
            out.push_str(&format!("- {} `{}`\n", label(person), person.handle));
        }
        Ok(out)
    }

    fn format_statistics(&self, stats: &GraphStatistics) -> Result<String> {
        Ok(format!(
            r#"# Population statistics

- **People**: {}
- **Families**: {}
- **Relationships**: {}
- **Isolated people**: {}
- **Average degree**: {:.2}
- **Clusters**: {}
"#,
            stats.people,
            stats.families,
            stats.relationships,
            stats.isolated_people,
            stats.average_degree,
            stats.clusters
        ))
    }
}

/// JSON formatter
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format_relationship(&self, result: &RelationshipResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(result)?)
    }

    fn format_tree(&self, _title: &str, tree: &TreeNode) -> Result<String> {
        Ok(serde_json::to_string_pretty(tree)?)
    }

    fn format_disconnected(&self, report: &DisconnectedReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    fn format_statistics(&self, stats: &GraphStatistics) -> Result<String> {
        Ok(serde_json::to_string_pretty(stats)?)
    }
}

/// Plain text formatter
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format_relationship(&self, result: &RelationshipResult) -> Result<String> {
        let mut out = format!(
            "{} -> {}: {}\nType: {}\nDistance: {}\n",
            result.person1.name,
            result.person2.name,
            result.relationship,
            result.relationship_type.as_str(),
            result.distance,
        );

        if let Some(ancestor) = &result.common_ancestor {
            out.push_str(&format!("Common ancestor: {}\n", ancestor.name));
        }

        if !result.path.is_empty() {
            let names: Vec<&str> = result.path.iter().map(|node| node.name.as_str()).collect();
            out.push_str(&format!("Path: {}\n", names.join(" -> ")));
        }

        Ok(out)
    }

    fn format_tree(&self, title: &str, tree: &TreeNode) -> Result<String> {
        let mut lines = vec![title.to_string(), "=".repeat(title.len())];
        render_tree_lines(tree, "    ", "", &mut lines);
        Ok(lines.join("\n") + "\n")
    }

    fn format_disconnected(&self, report: &DisconnectedReport) -> Result<String> {
        let mut out = format!("Disconnected people: {}\n", report.count);
        for person in &report.branches {
            out.push_str(&format!("  {} [{}]\n", label(person), person.handle));
        }
        Ok(out)
    }

    fn format_statistics(&self, stats: &GraphStatistics) -> Result<String> {
        Ok(format!(
            "People: {}\nFamilies: {}\nRelationships: {}\nIsolated people: {}\nAverage degree: {:.2}\nClusters: {}\n",
            stats.people,
            stats.families,
            stats.relationships,
            stats.isolated_people,
            stats.average_degree,
            stats.clusters
        ))
    }
}
