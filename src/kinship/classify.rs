use crate::kinship::graph::FamilyGraph;
use crate::kinship::path::RelationshipPath;
use crate::types::{Gender, Relation, RelationshipType};

/// Kinship term and geometry of a relationship path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub description: String,
    pub relationship_type: RelationshipType,
    /// Handle of the person through whom the two are related, when there is one
    pub common_ancestor: Option<String>,
    pub degree: Option<u32>,
    pub removal: Option<u32>,
}

impl Classification {
    fn new(description: impl Into<String>, relationship_type: RelationshipType) -> Self {
        Self {
            description: description.into(),
            relationship_type,
            common_ancestor: None,
            degree: None,
            removal: None,
        }
    }

    fn through(mut self, common_ancestor: Option<&str>) -> Self {
        self.common_ancestor = common_ancestor.map(str::to_string);
        self
    }

    /// Result for two people with no connecting path
    pub fn unrelated() -> Self {
        Self::new("No known relationship", RelationshipType::Distant)
    }

    fn distant() -> Self {
        Self::new("Distant relative", RelationshipType::Distant)
    }
}

/// Turns a path into a kinship term, always naming the end person relative to the
/// start person.
///
/// Paths longer than one hop are read as a run of `parent` steps followed by a run
/// of `child` steps. Anything else (in-law chains, step-relations, a spouse inside
/// a longer path) is reported as a distant relative rather than guessed at.
pub struct RelationshipClassifier<'a> {
    graph: &'a FamilyGraph,
}

impl<'a> RelationshipClassifier<'a> {
    pub fn new(graph: &'a FamilyGraph) -> Self {
        Self { graph }
    }

    pub fn classify(&self, path: &RelationshipPath) -> Classification {
        if path.is_empty() {
            return Classification::unrelated();
        }

        let gender = self.gender_of(path.end());

        if path.len() == 1 {
            return Classification::new("Self", RelationshipType::SelfRelation);
        }

        let relations = path.relations();

        if path.len() == 2 {
            return match relations[0] {
                Relation::Parent => Classification::new(ancestor_term(gender, 1), RelationshipType::Parent)
                    .through(Some(path.end())),
                Relation::Child => Classification::new(descendant_term(gender, 1), RelationshipType::Child)
                    .through(Some(path.start())),
                Relation::Spouse => Classification::new(spouse_term(gender), RelationshipType::Spouse),
            };
        }

        let Some((steps_up, steps_down)) = split_up_down(&relations) else {
            return Classification::distant();
        };

        let turning_point = path.handle_at(steps_up as usize);

        match (steps_up, steps_down) {
            (1, 1) => {
                let mut classification =
                    Classification::new(sibling_term(gender), RelationshipType::Sibling).through(turning_point);
                classification.degree = Some(0);
                classification.removal = Some(0);
                classification
            }
            (up, 0) if up > 0 => Classification::new(ancestor_term(gender, up), RelationshipType::Ancestor)
                .through(Some(path.end())),
            (0, down) if down > 0 => {
                Classification::new(descendant_term(gender, down), RelationshipType::Descendant)
                    .through(Some(path.start()))
            }
            (up, down) if up > 0 && down > 0 => {
                let degree = up.min(down) - 1;
                let removal = up.abs_diff(down);

                let description = if degree == 0 {
                    if up > down {
                        aunt_uncle_term(gender, removal)
                    } else {
                        niece_nephew_term(gender, removal)
                    }
                } else {
                    cousin_term(degree, removal)
                };

                let mut classification =
                    Classification::new(description, RelationshipType::Cousin).through(turning_point);
                classification.degree = Some(degree);
                classification.removal = Some(removal);
                classification
            }
            _ => Classification::distant(),
        }
    }

    fn gender_of(&self, handle: &str) -> Gender {
        self.graph
            .person(handle)
            .map(|person| person.gender)
            .unwrap_or_default()
    }
}

/// Split relations into a leading run of `parent` followed by a run of `child`.
/// Returns `None` for any other shape.
fn split_up_down(relations: &[Relation]) -> Option<(u32, u32)> {
    let steps_up = relations
        .iter()
        .take_while(|relation| **relation == Relation::Parent)
        .count();
    let steps_down = relations[steps_up..]
        .iter()
        .take_while(|relation| **relation == Relation::Child)
        .count();

    if steps_up + steps_down == relations.len() {
        Some((steps_up as u32, steps_down as u32))
    } else {
        None
    }
}

fn gendered(gender: Gender, male: &str, female: &str, neutral: &str) -> String {
    match gender {
        Gender::Male => male,
        Gender::Female => female,
        Gender::Unknown => neutral,
    }
    .to_string()
}

fn greats(count: u32) -> String {
    "Great-".repeat(count as usize)
}

fn ancestor_term(gender: Gender, generations: u32) -> String {
    match generations {
        0 | 1 => gendered(gender, "Father", "Mother", "Parent"),
        n => format!(
            "{}{}",
            greats(n - 2),
            gendered(gender, "Grandfather", "Grandmother", "Grandparent")
        ),
    }
}

fn descendant_term(gender: Gender, generations: u32) -> String {
    match generations {
        0 | 1 => gendered(gender, "Son", "Daughter", "Child"),
        n => format!(
            "{}{}",
            greats(n - 2),
            gendered(gender, "Grandson", "Granddaughter", "Grandchild")
        ),
    }
}

fn spouse_term(gender: Gender) -> String {
    gendered(gender, "Husband", "Wife", "Spouse")
}

fn sibling_term(gender: Gender) -> String {
    gendered(gender, "Brother", "Sister", "Sibling")
}

fn aunt_uncle_term(gender: Gender, removal: u32) -> String {
    format!(
        "{}{}",
        greats(removal.saturating_sub(1)),
        gendered(gender, "Uncle", "Aunt", "Aunt/Uncle")
    )
}

fn niece_nephew_term(gender: Gender, removal: u32) -> String {
    format!(
        "{}{}",
        greats(removal.saturating_sub(1)),
        gendered(gender, "Nephew", "Niece", "Niece/Nephew")
    )
}

fn cousin_term(degree: u32, removal: u32) -> String {
    match removal {
        0 => format!("{} cousin", ordinal(degree)),
        1 => format!("{} cousin, 1 time removed", ordinal(degree)),
        n => format!("{} cousin, {} times removed", ordinal(degree), n),
    }
}

/// 1st, 2nd, 3rd, 4th ... 11th, 12th, 13th ... 21st
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
