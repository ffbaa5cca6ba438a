use color_eyre::eyre::{Result, WrapErr};

use crate::library::{Category, ItemSet, Side};
use crate::ports::snapshot::SnapshotStore;
use crate::ports::spotify::{BATCH_SIZE, LibraryReader, LibraryWriter};
use crate::reconcile::{FollowPlan, Reconciliation, artists_from_albums};
use crate::sync_result::SyncResult;

/// Keeps the libraries of two accounts in step, one category at a time.
pub struct LibrarySyncService<L, S>
where
    L: LibraryReader + LibraryWriter,
    S: SnapshotStore,
{
    library: L,
    store: S,
}

impl<L, S> LibrarySyncService<L, S>
where
    L: LibraryReader + LibraryWriter,
    S: SnapshotStore,
{
    pub fn new(library: L, store: S) -> Self {
        Self { library, store }
    }

    /// Propagates what changed on either side since the last sync to the
    /// other side, then records the agreed state as the new snapshot.
    pub async fn sync_category(&self, category: Category) -> Result<SyncResult> {
        let snapshot: ItemSet = self
            .store
            .read_all(category)
            .await
            .wrap_err_with(|| format!("Failed to read {} snapshot", category))?
            .into_iter()
            .collect();
        let left = self.read_side(Side::Left, category).await?;
        let right = self.read_side(Side::Right, category).await?;

        log::info!(
            "Syncing {}: {} in snapshot, {} on the left, {} on the right",
            category.label().to_lowercase(),
            snapshot.len(),
            left.len(),
            right.len()
        );

        let plan = Reconciliation::compute(&snapshot, &left, &right);
        if plan.is_empty() {
            log::info!("{} already in sync", category.label());
            return Ok(SyncResult::new());
        }

        self.apply(Side::Right, category, &plan.left_to_add, &plan.left_to_delete)
            .await?;
        self.apply(Side::Left, category, &plan.right_to_add, &plan.right_to_delete)
            .await?;

        let inserts = plan.snapshot_inserts().to_vec();
        let removals = plan.snapshot_removals().to_vec();
        let inserted = self
            .store
            .commit_changes(&inserts, &removals)
            .await
            .wrap_err_with(|| format!("Failed to update {} snapshot", category))?;
        log::debug!(
            "{} snapshot: {} inserted, {} removed, {} stored",
            category.label(),
            inserted,
            removals.len(),
            plan.next_snapshot(&snapshot).len()
        );

        Ok(plan.into_sync_result())
    }

    /// Follows the primary artist of every album saved on `side` and
    /// unfollows artists that no saved album credits first anymore.
    pub async fn sync_artists_from_albums(&self, side: Side) -> Result<SyncResult> {
        let albums = self.library.saved_albums(side).await?;
        for album in albums.iter().filter(|album| album.primary_artist().is_none()) {
            log::debug!("Skipping album {} without credited artists", album.album);
        }
        let wanted = artists_from_albums(&albums);
        let followed = self.read_side(side, Category::Artist).await?;

        log::info!(
            "{} saved album(s) on the {} side credit {} artist(s), {} followed",
            albums.len(),
            side,
            wanted.len(),
            followed.len()
        );

        let plan = FollowPlan::compute(&wanted, &followed);
        if plan.is_empty() {
            log::info!("Followed artists of the {} side already match its albums", side);
            return Ok(SyncResult::new());
        }

        self.apply(side, Category::Artist, &plan.to_follow, &plan.to_unfollow)
            .await?;

        Ok(plan.into_sync_result())
    }

    async fn read_side(&self, side: Side, category: Category) -> Result<ItemSet> {
        let items = self.library.saved_items(side, category).await?;
        Ok(items.into_iter().collect())
    }

    /// Adds then removes items on one side in batches of [`BATCH_SIZE`]. A
    /// failing batch stops the remaining ones.
    async fn apply(
        &self,
        side: Side,
        category: Category,
        to_add: &ItemSet,
        to_remove: &ItemSet,
    ) -> Result<()> {
        let to_add = to_add.to_vec();
        for (index, batch) in to_add.chunks(BATCH_SIZE).enumerate() {
            log::info!("Adding {} {} item(s) to the {} side", batch.len(), category, side);
            self.library
                .add_items(side, category, batch)
                .await
                .wrap_err_with(|| {
                    format!("Failed to add batch {} of {} to the {} side", index + 1, category, side)
                })?;
        }

        let to_remove = to_remove.to_vec();
        for (index, batch) in to_remove.chunks(BATCH_SIZE).enumerate() {
            log::info!(
                "Removing {} {} item(s) from the {} side",
                batch.len(),
                category,
                side
            );
            self.library
                .remove_items(side, category, batch)
                .await
                .wrap_err_with(|| {
                    format!(
                        "Failed to remove batch {} of {} from the {} side",
                        index + 1,
                        category,
                        side
                    )
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use color_eyre::eyre::eyre;
    use mockall::predicate::eq;

    use super::*;
    use crate::library::{LibraryItem, SavedAlbum};
    use crate::ports::snapshot::MockSnapshotStore;
    use crate::reconcile::diff;
    use crate::test_utils::test_db;

    mockall::mock! {
        Library {}

        #[async_trait::async_trait]
        impl LibraryReader for Library {
            async fn saved_items(&self, side: Side, category: Category) -> Result<Vec<LibraryItem>>;
            async fn saved_albums(&self, side: Side) -> Result<Vec<SavedAlbum>>;
        }

        #[async_trait::async_trait]
        impl LibraryWriter for Library {
            async fn add_items(
                &self,
                side: Side,
                category: Category,
                items: &[LibraryItem],
            ) -> Result<()>;
            async fn remove_items(
                &self,
                side: Side,
                category: Category,
                items: &[LibraryItem],
            ) -> Result<()>;
        }
    }

    /// Two in-memory accounts that apply writes like Spotify would.
    #[derive(Default)]
    struct FakeLibrary {
        left: Mutex<ItemSet>,
        right: Mutex<ItemSet>,
        albums: Vec<SavedAlbum>,
        writes: Mutex<usize>,
    }

    impl FakeLibrary {
        fn new(left: &[LibraryItem], right: &[LibraryItem]) -> Self {
            Self {
                left: Mutex::new(left.iter().cloned().collect()),
                right: Mutex::new(right.iter().cloned().collect()),
                ..Default::default()
            }
        }

        fn set(&self, side: Side) -> &Mutex<ItemSet> {
            match side {
                Side::Left => &self.left,
                Side::Right => &self.right,
            }
        }

        fn items(&self, side: Side) -> ItemSet {
            self.set(side).lock().unwrap().clone()
        }

        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl LibraryReader for FakeLibrary {
        async fn saved_items(&self, side: Side, category: Category) -> Result<Vec<LibraryItem>> {
            Ok(self
                .items(side)
                .into_iter()
                .filter(|item| item.category() == category)
                .collect())
        }

        async fn saved_albums(&self, _side: Side) -> Result<Vec<SavedAlbum>> {
            Ok(self.albums.clone())
        }
    }

    #[async_trait::async_trait]
    impl LibraryWriter for FakeLibrary {
        async fn add_items(
            &self,
            side: Side,
            _category: Category,
            items: &[LibraryItem],
        ) -> Result<()> {
            assert!(items.len() <= BATCH_SIZE);
            *self.writes.lock().unwrap() += 1;
            self.set(side).lock().unwrap().extend(items.iter().cloned());
            Ok(())
        }

        async fn remove_items(
            &self,
            side: Side,
            _category: Category,
            items: &[LibraryItem],
        ) -> Result<()> {
            assert!(items.len() <= BATCH_SIZE);
            *self.writes.lock().unwrap() += 1;
            let removed: ItemSet = items.iter().cloned().collect();
            let mut set = self.set(side).lock().unwrap();
            *set = diff(&set, &removed);
            Ok(())
        }
    }

    fn album(id: &str) -> LibraryItem {
        LibraryItem::album(id, format!("Album {}", id))
    }

    fn albums(count: usize) -> Vec<LibraryItem> {
        (0..count).map(|i| album(&format!("A{}", i))).collect()
    }

    async fn snapshot(store: &impl SnapshotStore, category: Category) -> ItemSet {
        store.read_all(category).await.unwrap().into_iter().collect()
    }

    #[tokio::test]
    async fn test_new_item_on_left_is_added_to_right() {
        let db = test_db().await;
        let service = LibrarySyncService::new(FakeLibrary::new(&[album("A1")], &[]), db.clone());

        let result = service.sync_category(Category::Album).await.unwrap();

        assert_eq!(result.items_added_to_right(), &[album("A1")]);
        assert!(result.items_added_to_left().is_empty());
        assert!(result.items_deleted_from_left().is_empty());
        assert!(result.items_deleted_from_right().is_empty());
        assert_eq!(service.library.items(Side::Right), ItemSet::from_iter([album("A1")]));
        assert_eq!(
            snapshot(&db, Category::Album).await,
            ItemSet::from_iter([album("A1")])
        );
    }

    #[tokio::test]
    async fn test_new_item_on_right_is_added_to_left() {
        let db = test_db().await;
        db.insert_many(&[album("A1")]).await.unwrap();
        let service = LibrarySyncService::new(
            FakeLibrary::new(&[album("A1")], &[album("A1"), album("A2")]),
            db.clone(),
        );

        let result = service.sync_category(Category::Album).await.unwrap();

        assert_eq!(result.items_added_to_left(), &[album("A2")]);
        assert!(result.items_added_to_right().is_empty());
        assert_eq!(
            service.library.items(Side::Left),
            ItemSet::from_iter([album("A1"), album("A2")])
        );
        assert_eq!(
            snapshot(&db, Category::Album).await,
            ItemSet::from_iter([album("A1"), album("A2")])
        );
    }

    #[tokio::test]
    async fn test_deletion_on_left_is_removed_from_right() {
        let db = test_db().await;
        db.insert_many(&[album("A1")]).await.unwrap();
        let service = LibrarySyncService::new(FakeLibrary::new(&[], &[album("A1")]), db.clone());

        let result = service.sync_category(Category::Album).await.unwrap();

        assert_eq!(result.items_deleted_from_right(), &[album("A1")]);
        assert!(result.items_deleted_from_left().is_empty());
        assert!(service.library.items(Side::Right).is_empty());
        assert!(snapshot(&db, Category::Album).await.is_empty());
    }

    #[tokio::test]
    async fn test_item_added_on_both_sides_is_stored_once() {
        let db = test_db().await;
        let service = LibrarySyncService::new(
            FakeLibrary::new(&[album("A1")], &[album("A1")]),
            db.clone(),
        );

        let result = service.sync_category(Category::Album).await.unwrap();

        assert_eq!(result.items_added_to_left(), &[album("A1")]);
        assert_eq!(result.items_added_to_right(), &[album("A1")]);
        assert_eq!(db.read_all(Category::Album).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_converges_to_union_and_is_idempotent() {
        let db = test_db().await;
        let left = [album("A1"), album("A2")];
        let right = [album("A2"), album("A3")];
        let service = LibrarySyncService::new(FakeLibrary::new(&left, &right), db.clone());

        service.sync_category(Category::Album).await.unwrap();

        let expected = ItemSet::from_iter([album("A1"), album("A2"), album("A3")]);
        assert_eq!(service.library.items(Side::Left), expected);
        assert_eq!(service.library.items(Side::Right), expected);
        assert_eq!(snapshot(&db, Category::Album).await, expected);

        let writes = service.library.writes();
        let second = service.sync_category(Category::Album).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(service.library.writes(), writes);
    }

    #[tokio::test]
    async fn test_categories_are_synced_independently() {
        let db = test_db().await;
        let show = LibraryItem::show("S1", "Podcast");
        let service = LibrarySyncService::new(
            FakeLibrary::new(&[album("A1"), show.clone()], &[]),
            db.clone(),
        );

        let result = service.sync_category(Category::Show).await.unwrap();

        assert_eq!(result.items_added_to_right(), &[show.clone()]);
        assert_eq!(service.library.items(Side::Right), ItemSet::from_iter([show]));
        assert!(snapshot(&db, Category::Album).await.is_empty());
    }

    #[tokio::test]
    async fn test_writes_are_batched() {
        let items = albums(120);
        let left = items.clone();

        let mut library = MockLibrary::new();
        library
            .expect_saved_items()
            .with(eq(Side::Left), eq(Category::Album))
            .returning(move |_, _| Ok(left.clone()));
        library
            .expect_saved_items()
            .with(eq(Side::Right), eq(Category::Album))
            .returning(|_, _| Ok(vec![]));

        let sizes = std::sync::Arc::new(Mutex::new(Vec::new()));
        let recorded = sizes.clone();
        library
            .expect_add_items()
            .withf(|side, category, _| *side == Side::Right && *category == Category::Album)
            .times(3)
            .returning(move |_, _, items| {
                recorded.lock().unwrap().push(items.len());
                Ok(())
            });
        library.expect_remove_items().never();

        let mut store = MockSnapshotStore::new();
        store.expect_read_all().returning(|_| Ok(vec![]));
        store
            .expect_commit_changes()
            .withf(|inserts, removals| inserts.len() == 120 && removals.is_empty())
            .times(1)
            .returning(|inserts, _| Ok(inserts.len() as u64));

        let service = LibrarySyncService::new(library, store);
        let result = service.sync_category(Category::Album).await.unwrap();

        assert_eq!(*sizes.lock().unwrap(), vec![50, 50, 20]);
        assert_eq!(result.items_added_to_right(), items.as_slice());
    }

    #[tokio::test]
    async fn test_failed_batch_stops_sync_before_persisting() {
        let left = albums(60);

        let mut library = MockLibrary::new();
        library
            .expect_saved_items()
            .with(eq(Side::Left), eq(Category::Album))
            .returning(move |_, _| Ok(left.clone()));
        library
            .expect_saved_items()
            .with(eq(Side::Right), eq(Category::Album))
            .returning(|_, _| Ok(vec![]));
        library
            .expect_add_items()
            .times(1)
            .returning(|_, _, _| Err(eyre!("503 Service Unavailable")));

        let mut store = MockSnapshotStore::new();
        store.expect_read_all().returning(|_| Ok(vec![]));
        store.expect_commit_changes().never();

        let service = LibrarySyncService::new(library, store);
        let error = service.sync_category(Category::Album).await.unwrap_err();

        assert!(error.to_string().contains("batch 1"));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_propagated() {
        let mut store = MockSnapshotStore::new();
        store.expect_read_all().returning(|_| Ok(vec![]));
        store
            .expect_commit_changes()
            .times(1)
            .returning(|_, _| Err(eyre!("database is locked")));

        let service = LibrarySyncService::new(FakeLibrary::new(&[album("A1")], &[]), store);
        let result = service.sync_category(Category::Album).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_in_sync_category_writes_nothing() {
        let mut library = MockLibrary::new();
        library
            .expect_saved_items()
            .returning(|_, _| Ok(vec![LibraryItem::playlist("P1", "Mix")]));
        library.expect_add_items().never();
        library.expect_remove_items().never();

        let mut store = MockSnapshotStore::new();
        store
            .expect_read_all()
            .with(eq(Category::Playlist))
            .returning(|_| Ok(vec![LibraryItem::playlist("P1", "Mix")]));
        store.expect_commit_changes().never();

        let service = LibrarySyncService::new(library, store);
        let result = service.sync_category(Category::Playlist).await.unwrap();

        assert!(result.is_empty());
    }

    fn saved_album(id: &str, artists: &[(&str, &str)]) -> SavedAlbum {
        SavedAlbum {
            album: album(id),
            artists: artists
                .iter()
                .map(|(id, name)| LibraryItem::artist(*id, *name))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_artists_follow_saved_albums() {
        let mut library = FakeLibrary::new(
            &[
                LibraryItem::artist("AR1", "Kept"),
                LibraryItem::artist("AR9", "Stale"),
            ],
            &[],
        );
        library.albums = vec![
            saved_album("AL1", &[("AR1", "Kept")]),
            saved_album("AL2", &[("AR2", "Lead"), ("AR3", "Guest")]),
            saved_album("AL3", &[("AR2", "Lead")]),
            saved_album("AL4", &[]),
        ];
        let service = LibrarySyncService::new(library, MockSnapshotStore::new());

        let result = service.sync_artists_from_albums(Side::Left).await.unwrap();

        assert_eq!(
            result.items_added_to_right(),
            &[LibraryItem::artist("AR2", "Lead")]
        );
        assert_eq!(
            result.items_deleted_from_right(),
            &[LibraryItem::artist("AR9", "Stale")]
        );
        assert_eq!(
            service.library.items(Side::Left),
            ItemSet::from_iter([
                LibraryItem::artist("AR1", "Kept"),
                LibraryItem::artist("AR2", "Lead"),
            ])
        );
        assert!(service.library.items(Side::Right).is_empty());
    }

    #[tokio::test]
    async fn test_artists_already_matching_albums() {
        let mut library = MockLibrary::new();
        library
            .expect_saved_albums()
            .with(eq(Side::Right))
            .returning(|_| Ok(vec![saved_album("AL1", &[("AR1", "Artist")])]));
        library
            .expect_saved_items()
            .with(eq(Side::Right), eq(Category::Artist))
            .returning(|_, _| Ok(vec![LibraryItem::artist("AR1", "Artist")]));
        library.expect_add_items().never();
        library.expect_remove_items().never();

        let service = LibrarySyncService::new(library, MockSnapshotStore::new());
        let result = service.sync_artists_from_albums(Side::Right).await.unwrap();

        assert!(result.is_empty());
    }
}
