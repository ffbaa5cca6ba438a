use std::collections::HashMap;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::spotify_rs::types::SpotifyTokenResponse;

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Everything the sync reads and writes on both accounts
pub const SPOTIFY_SCOPES: [&str; 8] = [
    "user-follow-modify",
    "user-follow-read",
    "playlist-modify-public",
    "playlist-modify-private",
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-library-modify",
    "user-library-read",
];

fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

/// URL the account owner opens to grant access. Spotify redirects to
/// `redirect_uri` with the authorization code in the `code` query parameter.
pub fn authorize_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&scope={}&redirect_uri={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(&SPOTIFY_SCOPES.join(" ")),
        urlencoding::encode(redirect_uri)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeCodeForTokenError {
    #[error("Invalid code: {reason}")]
    InvalidCode { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response")]
    FailedToParseResponse(reqwest::Error),
    #[error("Token response did not contain a refresh token")]
    MissingRefreshToken,
}

/// Exchange authorization code for access token
/// https://developer.spotify.com/documentation/web-api/tutorials/code-flow
pub async fn exchange_code_for_token(
    client_id: &str,
    client_secret: &str,
    code: &str,
    // Must match the redirect URI used to obtain the code
    redirect_uri: &str,
) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError> {
    let client = reqwest::Client::new();

    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        // Serializes to x-www-form-urlencoded, as required by spotify
        .form(&params)
        .header("Authorization", basic_auth_header(client_id, client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ExchangeCodeForTokenError::InvalidCode {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToParseResponse)?;

    Ok(token_response)
}

/// Exchange an authorization code for the long-lived refresh token stored in
/// the account configuration
pub async fn request_refresh_token(
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<String, ExchangeCodeForTokenError> {
    let token = exchange_code_for_token(client_id, client_secret, code, redirect_uri).await?;
    token
        .refresh_token
        .ok_or(ExchangeCodeForTokenError::MissingRefreshToken)
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token: {reason}")]
    InvalidRefreshToken { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, RefreshTokenError> {
    let client = reqwest::Client::new();

    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        .form(&params)
        .header("Authorization", basic_auth_header(client_id, client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(RefreshTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(RefreshTokenError::InvalidRefreshToken {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(RefreshTokenError::FailedToParseResponse)?;

    Ok(token_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url() {
        let url = authorize_url("test_client_id", "http://localhost/callback");

        assert!(url.starts_with(SPOTIFY_AUTH_URL));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%2Fcallback"));
        for scope in SPOTIFY_SCOPES {
            assert!(url.contains(scope), "missing scope {}", scope);
        }
    }

    #[test]
    fn test_basic_auth_header() {
        // base64 of "id:secret"
        assert_eq!(basic_auth_header("id", "secret"), "Basic aWQ6c2VjcmV0");
    }
}
