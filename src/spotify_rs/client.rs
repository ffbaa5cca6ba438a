use std::time::Duration;

use async_stream::try_stream;
use backon::{ExponentialBuilder, Retryable};
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::spotify_rs::types::{
    FollowedArtistsResponse, Page, SavedAlbumObject, SavedShowObject, SpotifyAlbum,
    SpotifyArtist, SpotifyPlaylist, SpotifyShow, SpotifyUser,
};

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PAGE_LIMIT: &str = "50";
const MAX_RETRIES: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Spotify responded with {status}: {body}")]
    UnexpectedStatus {
        status: StatusCode,
        body: String,
        /// Delay requested by a `Retry-After` header
        retry_after: Option<Duration>,
    },
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
    #[error("Invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SpotifyApiError {
    /// Rate limiting, server errors and network failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            SpotifyApiError::FailedToSendRequest(error) => {
                error.is_timeout() || error.is_connect() || error.is_request()
            }
            SpotifyApiError::UnexpectedStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            SpotifyApiError::FailedToParseResponse(_) | SpotifyApiError::InvalidUrl(_) => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SpotifyApiError::UnexpectedStatus { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Spotify sends `Retry-After` in whole seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Delay before the next attempt. A server-requested delay replaces the
/// backoff step, but never revives an exhausted schedule.
fn next_delay(error: &SpotifyApiError, backoff: Option<Duration>) -> Option<Duration> {
    backoff.map(|delay| error.retry_after().unwrap_or(delay))
}

fn retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(30))
        .with_max_times(MAX_RETRIES)
        .with_jitter()
}

/// Spotify Web API client for one account
pub struct SpotifyClient {
    access_token: String,
    client: reqwest::Client,
    base_url: Url,
}

impl SpotifyClient {
    pub fn new(access_token: String) -> Result<Self, SpotifyApiError> {
        Ok(Self::with_base_url(access_token, Url::parse(SPOTIFY_API_URL)?))
    }

    pub fn with_base_url(access_token: String, base_url: Url) -> Self {
        Self {
            access_token,
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, SpotifyApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Endpoint carrying a comma separated `ids` query, plus any extra pairs
    fn ids_endpoint(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        ids: &[&str],
    ) -> Result<Url, SpotifyApiError> {
        let mut url = self.endpoint(path)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in extra {
                query.append_pair(key, value);
            }
            query.append_pair("ids", &ids.join(","));
        }
        Ok(url)
    }

    /// Sends a request, retrying transient failures with exponential backoff
    async fn execute(&self, method: Method, url: Url) -> Result<reqwest::Response, SpotifyApiError> {
        let attempt = || async {
            let response = self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(&self.access_token)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .map_err(SpotifyApiError::FailedToSendRequest)?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let retry_after = parse_retry_after(response.headers());
            let body = response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string());
            Err(SpotifyApiError::UnexpectedStatus {
                status,
                body,
                retry_after,
            })
        };

        attempt
            .retry(retry_policy())
            .when(SpotifyApiError::is_transient)
            .adjust(next_delay)
            .notify(|error, delay| {
                log::warn!(
                    "Spotify request {} {} failed ({}), retrying in {:?}",
                    method,
                    url.path(),
                    error,
                    delay
                )
            })
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SpotifyApiError> {
        self.execute(Method::GET, url)
            .await?
            .json()
            .await
            .map_err(SpotifyApiError::FailedToParseResponse)
    }

    /// Lazily walks an offset-paginated collection by following `next` links.
    /// The stream cannot be resumed; a new call starts at the first page.
    fn paginate<'a, T>(
        &'a self,
        path: &'static str,
    ) -> impl Stream<Item = Result<T, SpotifyApiError>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        try_stream! {
            let mut first = self.endpoint(path)?;
            first.query_pairs_mut().append_pair("limit", PAGE_LIMIT);

            let mut next_url = Some(first);
            while let Some(url) = next_url.take() {
                let page: Page<T> = self.get_json(url).await?;
                log::debug!(
                    "Fetched {} item(s) from {} (total: {:?})",
                    page.items.len(),
                    path,
                    page.total
                );
                for item in page.items {
                    yield item;
                }
                next_url = match page.next {
                    Some(next) => Some(Url::parse(&next).map_err(SpotifyApiError::InvalidUrl)?),
                    None => None,
                };
            }
        }
    }

    /// Get the current user's profile
    pub async fn get_current_user(&self) -> Result<SpotifyUser, SpotifyApiError> {
        self.get_json(self.endpoint("me")?).await
    }

    pub fn saved_albums(&self) -> impl Stream<Item = Result<SpotifyAlbum, SpotifyApiError>> + '_ {
        self.paginate::<SavedAlbumObject>("me/albums")
            .map_ok(|saved| saved.album)
    }

    pub fn saved_shows(&self) -> impl Stream<Item = Result<SpotifyShow, SpotifyApiError>> + '_ {
        self.paginate::<SavedShowObject>("me/shows")
            .map_ok(|saved| saved.show)
    }

    /// Playlists owned or followed by the current user
    pub fn playlists(&self) -> impl Stream<Item = Result<SpotifyPlaylist, SpotifyApiError>> + '_ {
        self.paginate::<Option<SpotifyPlaylist>>("me/playlists")
            .try_filter_map(|playlist| async move { Ok(playlist) })
    }

    /// Followed artists, walked with the `after` cursor
    pub fn followed_artists(
        &self,
    ) -> impl Stream<Item = Result<SpotifyArtist, SpotifyApiError>> + '_ {
        try_stream! {
            let mut after: Option<String> = None;
            loop {
                let mut url = self.endpoint("me/following")?;
                {
                    let mut query = url.query_pairs_mut();
                    query.append_pair("type", "artist").append_pair("limit", PAGE_LIMIT);
                    if let Some(cursor) = &after {
                        query.append_pair("after", cursor);
                    }
                }

                let response: FollowedArtistsResponse = self.get_json(url).await?;
                let page = response.artists;
                log::debug!("Fetched {} followed artist(s)", page.items.len());
                for artist in page.items {
                    yield artist;
                }

                after = page.cursors.and_then(|cursors| cursors.after);
                if after.is_none() {
                    break;
                }
            }
        }
    }

    pub async fn save_albums(&self, ids: &[&str]) -> Result<(), SpotifyApiError> {
        self.execute(Method::PUT, self.ids_endpoint("me/albums", &[], ids)?)
            .await?;
        Ok(())
    }

    pub async fn remove_saved_albums(&self, ids: &[&str]) -> Result<(), SpotifyApiError> {
        self.execute(Method::DELETE, self.ids_endpoint("me/albums", &[], ids)?)
            .await?;
        Ok(())
    }

    pub async fn save_shows(&self, ids: &[&str]) -> Result<(), SpotifyApiError> {
        self.execute(Method::PUT, self.ids_endpoint("me/shows", &[], ids)?)
            .await?;
        Ok(())
    }

    pub async fn remove_saved_shows(&self, ids: &[&str]) -> Result<(), SpotifyApiError> {
        self.execute(Method::DELETE, self.ids_endpoint("me/shows", &[], ids)?)
            .await?;
        Ok(())
    }

    pub async fn follow_artists(&self, ids: &[&str]) -> Result<(), SpotifyApiError> {
        let url = self.ids_endpoint("me/following", &[("type", "artist")], ids)?;
        self.execute(Method::PUT, url).await?;
        Ok(())
    }

    pub async fn unfollow_artists(&self, ids: &[&str]) -> Result<(), SpotifyApiError> {
        let url = self.ids_endpoint("me/following", &[("type", "artist")], ids)?;
        self.execute(Method::DELETE, url).await?;
        Ok(())
    }

    pub async fn follow_playlist(&self, playlist_id: &str) -> Result<(), SpotifyApiError> {
        let url = self.playlist_followers_endpoint(playlist_id)?;
        self.execute(Method::PUT, url).await?;
        Ok(())
    }

    pub async fn unfollow_playlist(&self, playlist_id: &str) -> Result<(), SpotifyApiError> {
        let url = self.playlist_followers_endpoint(playlist_id)?;
        self.execute(Method::DELETE, url).await?;
        Ok(())
    }

    fn playlist_followers_endpoint(&self, playlist_id: &str) -> Result<Url, SpotifyApiError> {
        self.endpoint(&format!(
            "playlists/{}/followers",
            urlencoding::encode(playlist_id)
        ))
    }
}
