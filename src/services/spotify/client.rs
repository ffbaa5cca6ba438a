use color_eyre::eyre::{Result, WrapErr};
use futures::TryStreamExt;

use crate::config::Config;
use crate::library::{Category, LibraryItem, SavedAlbum, Side};
use crate::ports::spotify::{LibraryReader, LibraryWriter};
use crate::spotify_rs::auth::refresh_access_token;
use crate::spotify_rs::client::{SpotifyApiError, SpotifyClient};
use crate::spotify_rs::types::SpotifyAlbum;

/// The two authenticated accounts taking part in a sync.
pub struct SpotifyAccountPair {
    left: SpotifyClient,
    right: SpotifyClient,
}

impl SpotifyAccountPair {
    pub fn new(left: SpotifyClient, right: SpotifyClient) -> Self {
        Self { left, right }
    }

    /// Trades the configured refresh token of each side for an access token.
    pub async fn connect(config: &Config) -> Result<Self> {
        let left = connect_side(config, Side::Left).await?;
        let right = connect_side(config, Side::Right).await?;
        Ok(Self::new(left, right))
    }

    fn side(&self, side: Side) -> &SpotifyClient {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

async fn connect_side(config: &Config, side: Side) -> Result<SpotifyClient> {
    let api = config.api();
    let account = config.account(side);

    let token = refresh_access_token(&api.client_id, &api.client_secret, &account.refresh_token)
        .await
        .wrap_err_with(|| format!("Failed to refresh access token of the {} account", side))?;
    let client = SpotifyClient::new(token.access_token)?;

    let user = client
        .get_current_user()
        .await
        .wrap_err_with(|| format!("Failed to get user of the {} account", side))?;
    log::info!(
        "Connected {} account: {}",
        side,
        user.display_name.as_deref().unwrap_or(&user.id)
    );

    Ok(client)
}

fn saved_album(album: SpotifyAlbum) -> SavedAlbum {
    SavedAlbum {
        artists: album
            .artists
            .into_iter()
            .map(|artist| LibraryItem::artist(artist.id, artist.name))
            .collect(),
        album: LibraryItem::album(album.id, album.name),
    }
}

fn ids(items: &[LibraryItem]) -> Vec<&str> {
    items.iter().map(LibraryItem::id).collect()
}

async fn add_to_library(
    client: &SpotifyClient,
    category: Category,
    ids: &[&str],
) -> Result<(), SpotifyApiError> {
    match category {
        Category::Album => client.save_albums(ids).await,
        Category::Artist => client.follow_artists(ids).await,
        Category::Show => client.save_shows(ids).await,
        // Playlists can only be followed one at a time
        Category::Playlist => {
            for id in ids {
                client.follow_playlist(id).await?;
            }
            Ok(())
        }
    }
}

async fn remove_from_library(
    client: &SpotifyClient,
    category: Category,
    ids: &[&str],
) -> Result<(), SpotifyApiError> {
    match category {
        Category::Album => client.remove_saved_albums(ids).await,
        Category::Artist => client.unfollow_artists(ids).await,
        Category::Show => client.remove_saved_shows(ids).await,
        Category::Playlist => {
            for id in ids {
                client.unfollow_playlist(id).await?;
            }
            Ok(())
        }
    }
}

async fn read_library(
    client: &SpotifyClient,
    category: Category,
) -> Result<Vec<LibraryItem>, SpotifyApiError> {
    match category {
        Category::Album => {
            client
                .saved_albums()
                .map_ok(|album| LibraryItem::album(album.id, album.name))
                .try_collect()
                .await
        }
        Category::Artist => {
            client
                .followed_artists()
                .map_ok(|artist| LibraryItem::artist(artist.id, artist.name))
                .try_collect()
                .await
        }
        Category::Playlist => {
            client
                .playlists()
                .map_ok(|playlist| LibraryItem::playlist(playlist.id, playlist.name))
                .try_collect()
                .await
        }
        Category::Show => {
            client
                .saved_shows()
                .map_ok(|show| LibraryItem::show(show.id, show.name))
                .try_collect()
                .await
        }
    }
}

#[async_trait::async_trait]
impl LibraryReader for SpotifyAccountPair {
    async fn saved_items(&self, side: Side, category: Category) -> Result<Vec<LibraryItem>> {
        let items = read_library(self.side(side), category)
            .await
            .wrap_err_with(|| {
                format!("Failed to read {} library of the {} account", category, side)
            })?;

        log::debug!("Read {} {} item(s) from {} account", items.len(), category, side);
        Ok(items)
    }

    async fn saved_albums(&self, side: Side) -> Result<Vec<SavedAlbum>> {
        self.side(side)
            .saved_albums()
            .map_ok(saved_album)
            .try_collect::<Vec<_>>()
            .await
            .wrap_err_with(|| format!("Failed to read saved albums of the {} account", side))
    }
}

#[async_trait::async_trait]
impl LibraryWriter for SpotifyAccountPair {
    async fn add_items(
        &self,
        side: Side,
        category: Category,
        items: &[LibraryItem],
    ) -> Result<()> {
        add_to_library(self.side(side), category, &ids(items))
            .await
            .wrap_err_with(|| format!("Failed to add {} item(s) to the {} account", category, side))
    }

    async fn remove_items(
        &self,
        side: Side,
        category: Category,
        items: &[LibraryItem],
    ) -> Result<()> {
        remove_from_library(self.side(side), category, &ids(items))
            .await
            .wrap_err_with(|| {
                format!("Failed to remove {} item(s) from the {} account", category, side)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify_rs::types::SpotifyArtist;

    #[test]
    fn test_saved_album_keeps_credit_order() {
        let album = SpotifyAlbum {
            id: "AL1".into(),
            name: "Collab".into(),
            artists: vec![
                SpotifyArtist {
                    id: "AR1".into(),
                    name: "Lead".into(),
                },
                SpotifyArtist {
                    id: "AR2".into(),
                    name: "Guest".into(),
                },
            ],
        };

        let saved = saved_album(album);
        assert_eq!(saved.album, LibraryItem::album("AL1", "Collab"));
        assert_eq!(saved.primary_artist().map(LibraryItem::id), Some("AR1"));
        assert_eq!(saved.artists.len(), 2);
        assert!(
            saved
                .artists
                .iter()
                .all(|artist| artist.category() == Category::Artist)
        );
    }
}
