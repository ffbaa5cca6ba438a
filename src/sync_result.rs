use crate::library::LibraryItem;

/// What one sync run changed on each side.
///
/// Built up with the `add_*` methods while the run is in progress; callers
/// only get read access once it is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    items_added_to_left: Vec<LibraryItem>,
    items_deleted_from_left: Vec<LibraryItem>,
    items_added_to_right: Vec<LibraryItem>,
    items_deleted_from_right: Vec<LibraryItem>,
}

impl SyncResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items_added_to_left(&self) -> &[LibraryItem] {
        &self.items_added_to_left
    }

    pub fn items_deleted_from_left(&self) -> &[LibraryItem] {
        &self.items_deleted_from_left
    }

    pub fn items_added_to_right(&self) -> &[LibraryItem] {
        &self.items_added_to_right
    }

    pub fn items_deleted_from_right(&self) -> &[LibraryItem] {
        &self.items_deleted_from_right
    }

    pub fn add_items_added_to_left(&mut self, items: impl IntoIterator<Item = LibraryItem>) {
        self.items_added_to_left.extend(items);
    }

    pub fn add_items_deleted_from_left(&mut self, items: impl IntoIterator<Item = LibraryItem>) {
        self.items_deleted_from_left.extend(items);
    }

    pub fn add_items_added_to_right(&mut self, items: impl IntoIterator<Item = LibraryItem>) {
        self.items_added_to_right.extend(items);
    }

    pub fn add_items_deleted_from_right(&mut self, items: impl IntoIterator<Item = LibraryItem>) {
        self.items_deleted_from_right.extend(items);
    }

    /// Total number of changes across both sides
    pub fn change_count(&self) -> usize {
        self.items_added_to_left.len()
            + self.items_deleted_from_left.len()
            + self.items_added_to_right.len()
            + self.items_deleted_from_right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }
}
