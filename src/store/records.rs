use crate::types::{Family, Gender, Person};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Loosely-typed records as exported by the record store.
/// Everything is normalized into [`Person`] / [`Family`] here so that the graph
/// engine never sees an untyped record.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub people: Vec<RawPerson>,
    #[serde(default)]
    pub families: Vec<RawFamily>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPerson {
    pub handle: Option<String>,
    pub gramps_id: Option<String>,
    #[serde(alias = "first_name")]
    pub given_name: Option<String>,
    pub surname: Option<String>,
    #[serde(default)]
    pub gender: Value,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFamily {
    pub handle: Option<String>,
    pub father_handle: Option<String>,
    pub mother_handle: Option<String>,
    #[serde(default, alias = "child_handles", alias = "children")]
    pub child_ref_list: Value,
}

impl RawSnapshot {
    /// Normalize every record, dropping the ones that cannot be identified
    pub fn into_records(self) -> (Vec<Person>, Vec<Family>) {
        let people: Vec<Person> = self
            .people
            .into_iter()
            .filter_map(RawPerson::into_person)
            .collect();

        let families: Vec<Family> = self
            .families
            .into_iter()
            .filter_map(RawFamily::into_family)
            .collect();

        debug!("Normalized {} people and {} families", people.len(), families.len());
        (people, families)
    }
}

impl RawPerson {
    pub fn into_person(self) -> Option<Person> {
        let Some(handle) = non_empty(self.handle) else {
            warn!("Dropping person record without a handle (gramps_id: {:?})", self.gramps_id);
            return None;
        };

        Some(Person {
            gender: normalize_gender(&self.gender),
            handle,
            gramps_id: non_empty(self.gramps_id),
            given_name: non_empty(self.given_name),
            surname: non_empty(self.surname),
            birth_date: non_empty(self.birth_date),
            death_date: non_empty(self.death_date),
        })
    }
}

impl RawFamily {
    pub fn into_family(self) -> Option<Family> {
        let Some(handle) = non_empty(self.handle) else {
            warn!("Dropping family record without a handle");
            return None;
        };

        let child_handles = normalize_child_list(&handle, &self.child_ref_list);

        Some(Family {
            father_handle: non_empty(self.father_handle),
            mother_handle: non_empty(self.mother_handle),
            handle,
            child_handles,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts "female"/"male"/"unknown", "F"/"M"/"U" and the integer codes 0/1/2
pub fn normalize_gender(value: &Value) -> Gender {
    match value {
        Value::Number(code) => match code.as_i64() {
            Some(0) => Gender::Female,
            Some(1) => Gender::Male,
            _ => Gender::Unknown,
        },
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "female" | "f" | "0" => Gender::Female,
            "male" | "m" | "1" => Gender::Male,
            _ => Gender::Unknown,
        },
        _ => Gender::Unknown,
    }
}

/// Child lists appear as plain handles, `{"ref": handle}` objects, or a JSON-encoded
/// string of either. An unreadable list becomes empty for this family only.
pub fn normalize_child_list(family_handle: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| {
                let child = match entry {
                    Value::String(handle) => Some(handle.trim().to_string()),
                    Value::Object(object) => object
                        .get("ref")
                        .and_then(|r| r.as_str())
                        .map(|r| r.trim().to_string()),
                    _ => None,
                };

                match child {
                    Some(handle) if !handle.is_empty() => Some(handle),
                    _ => {
                        warn!("Skipping unreadable child reference in family {}: {}", family_handle, entry);
                        None
                    }
                }
            })
            .collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(decoded @ Value::Array(_)) => normalize_child_list(family_handle, &decoded),
            _ => {
                warn!("Family {} has an unparsable child list, treating it as empty", family_handle);
                Vec::new()
            }
        },
        other => {
            warn!("Family {} has a child list of unexpected shape ({}), treating it as empty", family_handle, other);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_child_list_encodings() {
        assert_eq!(normalize_child_list("F1", &json!(["I1", "I2"])), vec!["I1", "I2"]);
        assert_eq!(
            normalize_child_list("F1", &json!([{"ref": "I1"}, {"ref": "I2", "frel": "Birth"}])),
            vec!["I1", "I2"]
        );
        assert_eq!(normalize_child_list("F1", &json!("[\"I3\",{\"ref\":\"I4\"}]")), vec!["I3", "I4"]);
        assert_eq!(normalize_child_list("F1", &Value::Null), Vec::<String>::new());
    }

    #[test]
    fn test_malformed_child_list_is_empty() {
        assert!(normalize_child_list("F1", &json!("not json")).is_empty());
        assert!(normalize_child_list("F1", &json!({"ref": "I1"})).is_empty());
        assert!(normalize_child_list("F1", &json!(42)).is_empty());

        // Bad entries are skipped, good ones kept
        assert_eq!(normalize_child_list("F1", &json!(["I1", 7, {"nope": 1}, ""])), vec!["I1"]);
    }

    #[test]
    fn test_gender_normalization() {
        assert_eq!(normalize_gender(&json!("female")), Gender::Female);
        assert_eq!(normalize_gender(&json!("M")), Gender::Male);
        assert_eq!(normalize_gender(&json!(0)), Gender::Female);
        assert_eq!(normalize_gender(&json!(1)), Gender::Male);
        assert_eq!(normalize_gender(&json!(2)), Gender::Unknown);
        assert_eq!(normalize_gender(&Value::Null), Gender::Unknown);
    }

    #[test]
    fn test_records_without_handles_are_dropped() {
        let raw: RawSnapshot = serde_json::from_value(json!({
            "people": [
                {"handle": "I1", "first_name": "Ada", "surname": "Lowe", "gender": "F"},
                {"handle": "  ", "gramps_id": "I0099"},
                {"gramps_id": "I0100"}
            ],
            "families": [
                {"handle": "F1", "father_handle": "", "mother_handle": "I1", "child_ref_list": [{"ref": "I2"}]},
                {"father_handle": "I1"}
            ]
        }))
        .unwrap();

        let (people, families) = raw.into_records();

        assert_eq!(people.len(), 1);
        assert_eq!(people[0].given_name.as_deref(), Some("Ada"));
        assert_eq!(people[0].gender, Gender::Female);

        assert_eq!(families.len(), 1);
        assert_eq!(families[0].father_handle, None);
        assert_eq!(families[0].mother_handle.as_deref(), Some("I1"));
        assert_eq!(families[0].child_handles, vec!["I2"]);
    }
}
