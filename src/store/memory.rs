use crate::error::StoreError;
use crate::store::records::RawSnapshot;
use crate::store::{EntityStore, FamilyFilter};
use crate::types::{Family, Person};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// In-memory entity store with handle-indexed family lookups.
/// Used by the binary to serve an exported JSON snapshot and by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    people: Vec<Person>,
    person_index: HashMap<String, usize>,
    families: Vec<Family>,
    families_by_child: HashMap<String, Vec<usize>>,
    families_by_parent: HashMap<String, Vec<usize>>,
}

impl MemoryStore {
    pub fn new(people: Vec<Person>, families: Vec<Family>) -> Self {
        let mut store = Self::default();

        for person in people {
            if let Some(&existing) = store.person_index.get(&person.handle) {
                warn!("Duplicate person handle {}, keeping the later record", person.handle);
                store.people[existing] = person;
            } else {
                store.person_index.insert(person.handle.clone(), store.people.len());
                store.people.push(person);
            }
        }

        for family in families {
            let index = store.families.len();
            for child in &family.child_handles {
                store
                    .families_by_child
                    .entry(child.clone())
                    .or_insert_with(Vec::new)
                    .push(index);
            }
            for parent in family.parents() {
                store
                    .families_by_parent
                    .entry(parent.to_string())
                    .or_insert_with(Vec::new)
                    .push(index);
            }
            store.families.push(family);
        }

        debug!(
            "Indexed {} people and {} families",
            store.people.len(),
            store.families.len()
        );
        store
    }

    /// Parse a JSON snapshot (`{"people": [...], "families": [...]}`)
    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let raw: RawSnapshot = serde_json::from_str(content)?;
        let (people, families) = raw.into_records();
        Ok(Self::new(people, families))
    }

    /// Load a JSON snapshot from disk
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!("Loading snapshot from: {:?}", path);

        let content = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json_str(&content)?;

        info!(
            "Loaded snapshot from {:?} with {} people and {} families",
            path,
            store.people.len(),
            store.families.len()
        );
        Ok(store)
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    fn collect_families(&self, indices: Option<&Vec<usize>>) -> Vec<Family> {
        indices
            .map(|indices| indices.iter().map(|&i| self.families[i].clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_person(&self, handle: &str) -> Result<Option<Person>, StoreError> {
        Ok(self
            .person_index
            .get(handle)
            .map(|&index| self.people[index].clone()))
    }

    async fn list_people(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self.people.clone())
    }

    async fn list_families(&self, filter: FamilyFilter) -> Result<Vec<Family>, StoreError> {
        Ok(match &filter {
            FamilyFilter::All => self.families.clone(),
            FamilyFilter::ByChild(handle) => self.collect_families(self.families_by_child.get(handle)),
            FamilyFilter::ByParent(handle) => self.collect_families(self.families_by_parent.get(handle)),
        })
    }

    async fn families_by_child(&self, handle: &str) -> Result<Vec<Family>, StoreError> {
        Ok(self.collect_families(self.families_by_child.get(handle)))
    }

    async fn families_by_parent(&self, handle: &str) -> Result<Vec<Family>, StoreError> {
        Ok(self.collect_families(self.families_by_parent.get(handle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_store() -> MemoryStore {
        MemoryStore::new(
            vec![
                Person::new("A", Gender::Male),
                Person::new("M", Gender::Female),
                Person::new("B", Gender::Female),
                Person::new("C", Gender::Male),
            ],
            vec![
                Family::new("F1", Some("A"), Some("M"), &["B", "C"]),
                Family::new("F2", Some("C"), None, &[]),
            ],
        )
    }

    #[tokio::test]
    async fn test_indexed_lookups() {
        let store = create_test_store();

        let by_child = store.families_by_child("B").await.unwrap();
        assert_eq!(by_child.len(), 1);
        assert_eq!(by_child[0].handle, "F1");

        let by_parent = store.families_by_parent("C").await.unwrap();
        assert_eq!(by_parent.len(), 1);
        assert_eq!(by_parent[0].handle, "F2");

        assert!(store.families_by_parent("B").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filtered_listing_matches_indexes() {
        let store = create_test_store();

        let filtered = store
            .list_families(FamilyFilter::ByParent("A".to_string()))
            .await
            .unwrap();
        let expected: Vec<Family> = store
            .list_families(FamilyFilter::All)
            .await
            .unwrap()
            .into_iter()
            .filter(|family| FamilyFilter::ByParent("A".to_string()).matches(family))
            .collect();

        assert_eq!(filtered, expected);
    }

    #[tokio::test]
    async fn test_get_person() {
        let store = create_test_store();

        assert_eq!(store.get_person("M").await.unwrap().unwrap().gender, Gender::Female);
        assert!(store.get_person("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_duplicate_handles_keep_latest() {
        let mut later = Person::new("A", Gender::Male);
        later.given_name = Some("Later".to_string());

        let store = MemoryStore::new(vec![Person::new("A", Gender::Unknown), later], vec![]);

        assert_eq!(store.person_count(), 1);
        assert_eq!(store.people[0].given_name.as_deref(), Some("Later"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{"people": [{{"handle": "I1", "gender": 1}}, {{"handle": "I2", "gender": 0}}],
                "families": [{{"handle": "F1", "father_handle": "I1", "child_ref_list": "garbage"}}]}}"#
        )
        .unwrap();

        let store = MemoryStore::load_from_file(temp_file.path()).await.unwrap();

        assert_eq!(store.person_count(), 2);
        assert_eq!(store.family_count(), 1);
        assert!(store.families[0].child_handles.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = MemoryStore::load_from_file("/nonexistent/snapshot.json").await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
