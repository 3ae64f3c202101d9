pub mod memory;
pub mod records;
pub mod snapshot;

pub use memory::MemoryStore;
pub use records::{RawFamily, RawPerson, RawSnapshot};
pub use snapshot::Snapshot;

use crate::error::StoreError;
use crate::types::{Family, Person};
use async_trait::async_trait;

/// Selects which family records a listing should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyFilter {
    All,
    ByChild(String),
    ByParent(String),
}

impl FamilyFilter {
    pub fn matches(&self, family: &Family) -> bool {
        match self {
            FamilyFilter::All => true,
            FamilyFilter::ByChild(handle) => family.has_child(handle),
            FamilyFilter::ByParent(handle) => family.has_parent(handle),
        }
    }
}

/// Read-only contract the engine consumes from the entity store.
/// Records are created, edited and deleted elsewhere; the engine only reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_person(&self, handle: &str) -> Result<Option<Person>, StoreError>;

    async fn list_people(&self) -> Result<Vec<Person>, StoreError>;

    async fn list_families(&self, filter: FamilyFilter) -> Result<Vec<Family>, StoreError>;

    /// Families in which `handle` is listed as a child
    async fn families_by_child(&self, handle: &str) -> Result<Vec<Family>, StoreError> {
        self.list_families(FamilyFilter::ByChild(handle.to_string())).await
    }

    /// Families in which `handle` is the father or the mother
    async fn families_by_parent(&self, handle: &str) -> Result<Vec<Family>, StoreError> {
        self.list_families(FamilyFilter::ByParent(handle.to_string())).await
    }
}
