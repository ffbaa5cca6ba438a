use color_eyre::eyre::Result;

use crate::library::{Category, LibraryItem, SavedAlbum, Side};

/// Maximum number of items a single library write may carry.
pub const BATCH_SIZE: usize = 50;

/// Port trait wrapping the Spotify library reads used by the sync logic.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[async_trait::async_trait]
pub trait LibraryReader: Send + Sync {
    /// Every item of `category` currently in the library of `side`, fully
    /// paginated. Each call starts over from the first page.
    async fn saved_items(&self, side: Side, category: Category) -> Result<Vec<LibraryItem>>;

    /// The saved albums of `side` with their credited artists.
    async fn saved_albums(&self, side: Side) -> Result<Vec<SavedAlbum>>;
}

/// Port trait wrapping the Spotify library writes used by the sync logic.
///
/// Callers must keep every call within [`BATCH_SIZE`] items.
#[async_trait::async_trait]
pub trait LibraryWriter: Send + Sync {
    async fn add_items(&self, side: Side, category: Category, items: &[LibraryItem])
    -> Result<()>;

    async fn remove_items(
        &self,
        side: Side,
        category: Category,
        items: &[LibraryItem],
    ) -> Result<()>;
}
