use crate::error::StoreError;
use crate::store::{EntityStore, FamilyFilter};
use crate::types::{Family, Person};
use tracing::debug;

/// One consistent read of the population, taken per request.
/// Nothing derived from it outlives the request that fetched it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub people: Vec<Person>,
    pub families: Vec<Family>,
}

impl Snapshot {
    pub fn new(people: Vec<Person>, families: Vec<Family>) -> Self {
        Self { people, families }
    }

    /// Read people and families from the store concurrently
    pub async fn fetch(store: &dyn EntityStore) -> Result<Self, StoreError> {
        let (people, families) = tokio::try_join!(
            store.list_people(),
            store.list_families(FamilyFilter::All)
        )?;

        debug!(
            "Fetched snapshot with {} people and {} families",
            people.len(),
            families.len()
        );
        Ok(Self { people, families })
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}
