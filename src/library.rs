use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use indexmap::map::{Entry, IntoValues, Values};
use sea_orm::entity::prelude::*;

/// The kind of a library entry. Each category is reconciled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Category {
    #[sea_orm(string_value = "album")]
    Album,
    #[sea_orm(string_value = "artist")]
    Artist,
    #[sea_orm(string_value = "playlist")]
    Playlist,
    #[sea_orm(string_value = "show")]
    Show,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Album => "album",
            Category::Artist => "artist",
            Category::Playlist => "playlist",
            Category::Show => "show",
        }
    }

    /// Plural, capitalized label used in reports ("Albums", "Shows", ...)
    pub fn label(&self) -> &'static str {
        match self {
            Category::Album => "Albums",
            Category::Artist => "Artists",
            Category::Playlist => "Playlists",
            Category::Show => "Shows",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown category `{0}`, expected one of: album, artist, playlist, show")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "album" => Ok(Category::Album),
            "artist" => Ok(Category::Artist),
            "playlist" => Ok(Category::Playlist),
            "show" => Ok(Category::Show),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// One of the two accounts taking part in a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid side `{0}`, expected `left` or `right`")]
pub struct ParseSideError(String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

/// Identity of a library item. Display names never take part in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub id: String,
    pub category: Category,
}

/// A single entry of a library (album, artist, playlist or show).
///
/// Two items are equal when their `(id, category)` match, regardless of the
/// display name.
#[derive(Debug, Clone)]
pub struct LibraryItem {
    id: String,
    category: Category,
    display_name: String,
}

impl LibraryItem {
    pub fn new(category: Category, id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            display_name: display_name.into(),
        }
    }

    pub fn album(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(Category::Album, id, display_name)
    }

    pub fn artist(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(Category::Artist, id, display_name)
    }

    pub fn playlist(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(Category::Playlist, id, display_name)
    }

    pub fn show(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(Category::Show, id, display_name)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            id: self.id.clone(),
            category: self.category,
        }
    }
}

impl PartialEq for LibraryItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.category == other.category
    }
}

impl Eq for LibraryItem {}

impl std::hash::Hash for LibraryItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.category.hash(state);
    }
}

impl fmt::Display for LibraryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.display_name, self.category, self.id)
    }
}

/// An insertion-ordered set of library items, deduplicated by [`ItemKey`].
/// The first item seen for a key wins; equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet(IndexMap<ItemKey, LibraryItem>);

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the item unless an item with the same key is already present.
    /// Returns whether the item was inserted.
    pub fn insert(&mut self, item: LibraryItem) -> bool {
        match self.0.entry(item.key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(item);
                true
            }
        }
    }

    pub fn contains(&self, item: &LibraryItem) -> bool {
        self.0.contains_key(&item.key())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Values<'_, ItemKey, LibraryItem> {
        self.0.values()
    }

    /// The items in set order, for APIs that take slices.
    pub fn to_vec(&self) -> Vec<LibraryItem> {
        self.iter().cloned().collect()
    }
}

impl FromIterator<LibraryItem> for ItemSet {
    fn from_iter<I: IntoIterator<Item = LibraryItem>>(iter: I) -> Self {
        let mut set = ItemSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<LibraryItem> for ItemSet {
    fn extend<I: IntoIterator<Item = LibraryItem>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl IntoIterator for ItemSet {
    type Item = LibraryItem;
    type IntoIter = IntoValues<ItemKey, LibraryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

impl<'a> IntoIterator for &'a ItemSet {
    type Item = &'a LibraryItem;
    type IntoIter = Values<'a, ItemKey, LibraryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}

/// A saved album together with its credited artists, in credit order.
#[derive(Debug, Clone)]
pub struct SavedAlbum {
    pub album: LibraryItem,
    pub artists: Vec<LibraryItem>,
}

impl SavedAlbum {
    pub fn primary_artist(&self) -> Option<&LibraryItem> {
        self.artists.first()
    }
}
