//! Three-way reconciliation of two library sides against the last synced
//! snapshot.
//!
//! Everything here is pure and infallible. Every decision is built from
//! [`diff`], which compares items by their `(id, category)` key.

use crate::library::{Category, ItemSet, LibraryItem, SavedAlbum};
use crate::sync_result::SyncResult;

/// Items of `a` that are absent from `b`, in the order they appear in `a`.
pub fn diff(a: &ItemSet, b: &ItemSet) -> ItemSet {
    a.iter().filter(|item| !b.contains(item)).cloned().collect()
}

/// Deduplicated union: the items of `a` followed by the items of `b` not in `a`.
pub fn union(a: &ItemSet, b: &ItemSet) -> ItemSet {
    a.iter().chain(b.iter()).cloned().collect()
}

/// The actions needed to bring both sides (and the snapshot) to the same set.
///
/// `left_to_add` holds what appeared on the left since the snapshot and must
/// be added to the right; `left_to_delete` holds what disappeared from the
/// left and must be removed from the right. The `right_*` sets mirror this
/// towards the left side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub left_to_add: ItemSet,
    pub left_to_delete: ItemSet,
    pub right_to_add: ItemSet,
    pub right_to_delete: ItemSet,
}

impl Reconciliation {
    pub fn compute(snapshot: &ItemSet, left: &ItemSet, right: &ItemSet) -> Self {
        Self {
            left_to_delete: diff(snapshot, left),
            left_to_add: diff(left, snapshot),
            right_to_delete: diff(snapshot, right),
            right_to_add: diff(right, snapshot),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left_to_add.is_empty()
            && self.left_to_delete.is_empty()
            && self.right_to_add.is_empty()
            && self.right_to_delete.is_empty()
    }

    /// Items to insert into the snapshot. An item added on both sides shows
    /// up once.
    pub fn snapshot_inserts(&self) -> ItemSet {
        union(&self.left_to_add, &self.right_to_add)
    }

    /// Items to remove from the snapshot.
    pub fn snapshot_removals(&self) -> ItemSet {
        union(&self.left_to_delete, &self.right_to_delete)
    }

    /// The snapshot as it should look once this plan has been applied.
    pub fn next_snapshot(&self, snapshot: &ItemSet) -> ItemSet {
        let kept = diff(snapshot, &self.snapshot_removals());
        union(&kept, &self.snapshot_inserts())
    }

    /// Maps the plan onto what changed on each side: the right side received
    /// what was new on the left, and so on.
    pub fn into_sync_result(self) -> SyncResult {
        let mut result = SyncResult::new();
        result.add_items_added_to_left(self.right_to_add);
        result.add_items_added_to_right(self.left_to_add);
        result.add_items_deleted_from_left(self.right_to_delete);
        result.add_items_deleted_from_right(self.left_to_delete);
        result
    }
}

/// Follow/unfollow actions that make one side's followed artists match the
/// artists of its saved albums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowPlan {
    pub to_follow: ItemSet,
    pub to_unfollow: ItemSet,
}

impl FollowPlan {
    pub fn compute(wanted: &ItemSet, followed: &ItemSet) -> Self {
        Self {
            to_follow: diff(wanted, followed),
            to_unfollow: diff(followed, wanted),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_follow.is_empty() && self.to_unfollow.is_empty()
    }

    /// The album-derived artists play the left role, the followed artists
    /// the right one, so changes are reported on the right.
    pub fn into_sync_result(self) -> SyncResult {
        let mut result = SyncResult::new();
        result.add_items_added_to_right(self.to_follow);
        result.add_items_deleted_from_right(self.to_unfollow);
        result
    }
}

/// One artist per distinct primary (first credited) artist of the albums.
pub fn artists_from_albums<'a, I>(albums: I) -> ItemSet
where
    I: IntoIterator<Item = &'a SavedAlbum>,
{
    albums
        .into_iter()
        .filter_map(SavedAlbum::primary_artist)
        .map(|artist| {
            LibraryItem::new(Category::Artist, artist.id(), artist.display_name())
        })
        .collect()
}
