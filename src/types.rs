use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Core value types for the kinship engine

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Unknown => "unknown",
        }
    }
}

/// Point-in-time snapshot of a person record as handed over by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub handle: String,
    pub gramps_id: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
}

impl Person {
    pub fn new(handle: impl Into<String>, gender: Gender) -> Self {
        Self {
            handle: handle.into(),
            gramps_id: None,
            given_name: None,
            surname: None,
            gender,
            birth_date: None,
            death_date: None,
        }
    }

    /// "Given Surname", falling back to "Unknown" when both are empty
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.given_name.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            "Unknown".to_string()
        } else {
            parts.join(" ")
        }
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth_date.as_deref().and_then(parse_year)
    }

    pub fn death_year(&self) -> Option<i32> {
        self.death_date.as_deref().and_then(parse_year)
    }
}

/// Extract the year from a date of variable precision ("1850", "1850-03", "1850-03-14")
pub fn parse_year(date: &str) -> Option<i32> {
    let date = date.trim();
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(parsed.year());
    }

    let year: String = date.chars().take_while(|c| c.is_ascii_digit()).collect();
    if year.len() == 4 {
        year.parse().ok()
    } else {
        None
    }
}

/// A family record: up to two parents and an ordered list of children.
/// This is the only relation primitive; spouse and parent/child edges are derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub handle: String,
    pub father_handle: Option<String>,
    pub mother_handle: Option<String>,
    #[serde(default)]
    pub child_handles: Vec<String>,
}

impl Family {
    pub fn new(
        handle: impl Into<String>,
        father_handle: Option<&str>,
        mother_handle: Option<&str>,
        child_handles: &[&str],
    ) -> Self {
        Self {
            handle: handle.into(),
            father_handle: father_handle.map(str::to_string),
            mother_handle: mother_handle.map(str::to_string),
            child_handles: child_handles.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.father_handle
            .as_deref()
            .into_iter()
            .chain(self.mother_handle.as_deref())
    }

    pub fn has_parent(&self, handle: &str) -> bool {
        self.parents().any(|parent| parent == handle)
    }

    pub fn has_child(&self, handle: &str) -> bool {
        self.child_handles.iter().any(|child| child == handle)
    }
}

/// How a neighbor relates to the person it was reached from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Parent,
    Spouse,
    Child,
}

impl Relation {
    pub fn inverse(&self) -> Relation {
        match self {
            Relation::Parent => Relation::Child,
            Relation::Child => Relation::Parent,
            Relation::Spouse => Relation::Spouse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Parent => "parent",
            Relation::Spouse => "spouse",
            Relation::Child => "child",
        }
    }
}

/// Person summary as rendered in paths, results and chart nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub handle: String,
    pub gramps_id: Option<String>,
    pub name: String,
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
}

impl From<&Person> for PersonSummary {
    fn from(person: &Person) -> Self {
        Self {
            handle: person.handle.clone(),
            gramps_id: person.gramps_id.clone(),
            name: person.display_name(),
            gender: person.gender,
            birth_date: person.birth_date.clone(),
            death_date: person.death_date.clone(),
        }
    }
}

/// One step of a relationship path. `relationship` is the label that connected this
/// node to the previous one ("self" for the first node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub handle: String,
    pub gramps_id: Option<String>,
    pub name: String,
    pub gender: Gender,
    pub relationship: String,
}

impl PathNode {
    pub fn from_person(person: &Person, relationship: impl Into<String>) -> Self {
        Self {
            handle: person.handle.clone(),
            gramps_id: person.gramps_id.clone(),
            name: person.display_name(),
            gender: person.gender,
            relationship: relationship.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    #[serde(rename = "self")]
    SelfRelation,
    Parent,
    Child,
    Sibling,
    Spouse,
    Cousin,
    Ancestor,
    Descendant,
    InLaw,
    Distant,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::SelfRelation => "self",
            RelationshipType::Parent => "parent",
            RelationshipType::Child => "child",
            RelationshipType::Sibling => "sibling",
            RelationshipType::Spouse => "spouse",
            RelationshipType::Cousin => "cousin",
            RelationshipType::Ancestor => "ancestor",
            RelationshipType::Descendant => "descendant",
            RelationshipType::InLaw => "in-law",
            RelationshipType::Distant => "distant",
        }
    }
}

/// Response of the relationship calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResult {
    pub person1: PathNode,
    pub person2: PathNode,
    pub relationship: String,
    pub common_ancestor: Option<PathNode>,
    pub path: Vec<PathNode>,
    pub distance: i64,
    pub relationship_type: RelationshipType,
}

impl RelationshipResult {
    pub fn is_related(&self) -> bool {
        self.distance >= 0
    }
}

/// Recursive chart node used by the fan, pedigree and descendant charts.
/// For ancestor trees `children` holds the parents' subtrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub person: PersonSummary,
    pub generation: u32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of generations below this node (0 for a leaf)
    pub fn depth(&self) -> u32 {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeChart {
    pub person: PersonSummary,
    pub ancestors: TreeNode,
    pub descendants: TreeNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisconnectedReport {
    pub count: usize,
    pub branches: Vec<PersonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub size: usize,
    pub people: Vec<PersonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub count: usize,
    pub clusters: Vec<Cluster>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut person = Person::new("I1", Gender::Male);
        assert_eq!(person.display_name(), "Unknown");

        person.surname = Some("Garner".to_string());
        assert_eq!(person.display_name(), "Garner");

        person.given_name = Some(" Lewis ".to_string());
        assert_eq!(person.display_name(), "Lewis Garner");
    }

    #[test]
    fn test_parse_year_variable_precision() {
        assert_eq!(parse_year("1850-03-14"), Some(1850));
        assert_eq!(parse_year("1850"), Some(1850));
        assert_eq!(parse_year("1850-03"), Some(1850));
        assert_eq!(parse_year("abt"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_relation_inverse() {
        assert_eq!(Relation::Parent.inverse(), Relation::Child);
        assert_eq!(Relation::Child.inverse(), Relation::Parent);
        assert_eq!(Relation::Spouse.inverse(), Relation::Spouse);
    }

    #[test]
    fn test_relationship_type_wire_names() {
        assert_eq!(serde_json::to_string(&RelationshipType::SelfRelation).unwrap(), "\"self\"");
        assert_eq!(serde_json::to_string(&RelationshipType::InLaw).unwrap(), "\"in-law\"");
        assert_eq!(serde_json::to_string(&RelationshipType::Cousin).unwrap(), "\"cousin\"");
    }

    #[test]
    fn test_relationship_result_field_names() {
        let node = PathNode::from_person(&Person::new("I1", Gender::Female), "self");
        let result = RelationshipResult {
            person1: node.clone(),
            person2: node.clone(),
            relationship: "Self".to_string(),
            common_ancestor: None,
            path: vec![node],
            distance: 0,
            relationship_type: RelationshipType::SelfRelation,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("commonAncestor").is_some());
        assert_eq!(json["relationshipType"], "self");
        assert_eq!(json["person1"]["gramps_id"], serde_json::Value::Null);
    }
}
