use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::library::{Category, LibraryItem};

/// Port trait for the persisted snapshot of items both sides agreed on at the
/// end of the last sync.
///
/// `(id, category)` is the unique key. Inserting an item that is already
/// stored is an error, not an upsert.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn read_all(&self, category: Category) -> Result<Vec<LibraryItem>>;

    /// Returns the number of inserted rows.
    async fn insert_many(&self, items: &[LibraryItem]) -> Result<u64>;

    async fn delete_many(&self, items: &[LibraryItem]) -> Result<()>;

    /// Inserts `inserts` and deletes `removals` as one change. Implementations
    /// backed by a transactional store should commit both or neither.
    async fn commit_changes(
        &self,
        inserts: &[LibraryItem],
        removals: &[LibraryItem],
    ) -> Result<u64> {
        let inserted = self.insert_many(inserts).await?;
        self.delete_many(removals).await?;
        Ok(inserted)
    }
}

#[async_trait::async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    async fn read_all(&self, category: Category) -> Result<Vec<LibraryItem>> {
        (**self).read_all(category).await
    }

    async fn insert_many(&self, items: &[LibraryItem]) -> Result<u64> {
        (**self).insert_many(items).await
    }

    async fn delete_many(&self, items: &[LibraryItem]) -> Result<()> {
        (**self).delete_many(items).await
    }

    async fn commit_changes(
        &self,
        inserts: &[LibraryItem],
        removals: &[LibraryItem],
    ) -> Result<u64> {
        (**self).commit_changes(inserts, removals).await
    }
}
