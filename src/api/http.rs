//! REST implementation of the game API.

use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use super::credentials::Credentials;
use super::{ApiError, FightApi, RosterApi, TravelApi};
use crate::combat::FightPayload;
use crate::config::ApiConfig;
use crate::logutil::escape_log;
use crate::prefetch::ImagePrefetchCache;
use crate::roster::OnlinePlayer;
use crate::travel::{Cell, MoveResponse, UserLocation};

/// Request body for a combat round.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttackRequest<'a> {
    attack_point: &'a str,
    defense_point: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CellsResponse {
    cells: Option<Vec<Cell>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Game API over HTTP with a bearer credential.
#[derive(Debug, Clone)]
pub struct HttpGameApi {
    client: reqwest::Client,
    base_url: String,
    asset_base_url: String,
    credentials: Credentials,
    request_timeout: Option<Duration>,
}

impl HttpGameApi {
    pub fn new(config: &ApiConfig, credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            asset_base_url: config.asset_base_url.trim_end_matches('/').to_string(),
            credentials,
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Build an API URL from an already-encoded path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Absolute URL for an asset path; absolute inputs are returned unchanged.
    pub fn asset_url(&self, source: &str) -> String {
        if source.starts_with("http://") || source.starts_with("https://") {
            source.to_string()
        } else {
            format!("{}/{}", self.asset_base_url, source.trim_start_matches('/'))
        }
    }

    /// Warm the HTTP cache for background art. Each source is requested at most once per
    /// process; the requests are detached and their results only logged. Must be called
    /// from within a Tokio runtime. Returns the number of newly requested URLs.
    pub fn prefetch_images<I, S>(&self, sources: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls: Vec<String> = sources
            .into_iter()
            .filter(|s| !s.as_ref().trim().is_empty())
            .map(|s| self.asset_url(s.as_ref()))
            .collect();
        let admitted = ImagePrefetchCache::global().admit(urls);
        for url in &admitted {
            let client = self.client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                match client.get(&url).send().await {
                    Ok(resp) => debug!("prefetched {} ({})", url, resp.status()),
                    Err(e) => debug!("prefetch of {} failed: {}", url, e),
                }
            });
        }
        admitted.len()
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let token = self.credentials.bearer()?;
        let request = request.bearer_auth(token);

        let response = match self.request_timeout {
            Some(limit) => timeout(limit, request.send())
                .await
                .map_err(|_| ApiError::Timeout(limit.as_secs()))??,
            None => request.send().await?,
        };

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = rejection_message(&body, status.canonical_reason());
            warn!(
                "API returned {}: {}",
                status.as_u16(),
                escape_log(&message)
            );
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body.to_vec())
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.endpoint(path);
        debug!("GET {}", url);
        let body = self.send(self.client.get(&url)).await?;
        decode_or_default(&body)
    }
}

/// Decode a success body. Empty and `null` bodies decode to `T::default()`.
fn decode_or_default<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let value: Option<T> = serde_json::from_slice(body)?;
    Ok(value.unwrap_or_default())
}

/// Extract the server's error text from a failed response body.
fn rejection_message(body: &[u8], reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(text) = parsed.error.or(parsed.message) {
            if !text.is_empty() {
                return text;
            }
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }
    reason.unwrap_or("request failed").to_string()
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

impl FightApi for HttpGameApi {
    async fn fetch_fight(&self) -> Result<FightPayload, ApiError> {
        self.get_json("fight").await
    }

    async fn submit_attack(
        &self,
        attack_point: &str,
        defense_point: &str,
    ) -> Result<FightPayload, ApiError> {
        let url = self.endpoint("fight");
        debug!(
            "PATCH {} attack={} defense={}",
            url,
            escape_log(attack_point),
            escape_log(defense_point)
        );
        let request = self.client.patch(&url).json(&AttackRequest {
            attack_point,
            defense_point,
        });
        let body = self.send(request).await?;
        decode_or_default(&body)
    }

    async fn engage_bot(&self, bot_slug: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("bots/{}/attack", segment(bot_slug)));
        debug!("POST {}", url);
        self.send(self.client.post(&url)).await?;
        Ok(())
    }
}

impl TravelApi for HttpGameApi {
    async fn fetch_cells(&self, location_slug: &str) -> Result<Vec<Cell>, ApiError> {
        let response: CellsResponse = self
            .get_json(&format!("locations/{}/cells", segment(location_slug)))
            .await?;
        Ok(response.cells.unwrap_or_default())
    }

    async fn move_to_cell(
        &self,
        location_slug: &str,
        cell_slug: &str,
    ) -> Result<MoveResponse, ApiError> {
        let url = self.endpoint(&format!(
            "locations/{}/cells/{}/move",
            segment(location_slug),
            segment(cell_slug)
        ));
        debug!("POST {}", url);
        let body = self.send(self.client.post(&url)).await?;
        decode_or_default(&body)
    }

    async fn fetch_user(&self) -> Result<UserLocation, ApiError> {
        self.get_json("user/me").await
    }
}

impl RosterApi for HttpGameApi {
    async fn fetch_online_players(&self) -> Result<Vec<OnlinePlayer>, ApiError> {
        self.get_json("players/online").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpGameApi {
        let config = ApiConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            asset_base_url: "http://localhost:8080/assets".to_string(),
            ..ApiConfig::default()
        };
        HttpGameApi::new(&config, Credentials::from_token("t"))
    }

    #[test]
    fn endpoints_join_without_double_slashes() {
        assert_eq!(
            api().endpoint("/players/online"),
            "http://localhost:8080/api/players/online"
        );
    }

    #[test]
    fn asset_urls_resolve_relative_paths() {
        let api = api();
        assert_eq!(
            api.asset_url("images/locations/forest.png"),
            "http://localhost:8080/assets/images/locations/forest.png"
        );
        assert_eq!(
            api.asset_url("https://cdn.example.org/a.png"),
            "https://cdn.example.org/a.png"
        );
    }

    #[test]
    fn slugs_are_encoded_as_path_segments() {
        assert_eq!(segment("29cell"), "29cell");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn rejection_prefers_error_field() {
        let msg = rejection_message(br#"{"error":"locations not connected"}"#, Some("Bad Request"));
        assert_eq!(msg, "locations not connected");
    }

    #[test]
    fn rejection_falls_back_to_body_then_reason() {
        assert_eq!(rejection_message(b"boom", None), "boom");
        assert_eq!(rejection_message(b"", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(rejection_message(b"", None), "request failed");
    }

    #[test]
    fn null_and_empty_bodies_decode_to_default() {
        let from_null: MoveResponse = decode_or_default(b"null").unwrap();
        assert_eq!(from_null.path_length, 0);
        let from_empty: MoveResponse = decode_or_default(b"  ").unwrap();
        assert_eq!(from_empty, MoveResponse::default());
    }

    #[test]
    fn move_response_decodes_server_shape() {
        let resp: MoveResponse = decode_or_default(
            br#"{"message":"movement started","path_length":3,"target_cell":"Old Mill","time_per_cell":5}"#,
        )
        .unwrap();
        assert_eq!(resp.path_length, 3);
        assert_eq!(resp.time_per_cell, Some(5));
        assert_eq!(resp.target_cell.as_deref(), Some("Old Mill"));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let result: Result<MoveResponse, ApiError> = decode_or_default(b"{not json");
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn attack_request_uses_camel_case() {
        let body = serde_json::to_string(&AttackRequest {
            attack_point: "head",
            defense_point: "legs",
        })
        .unwrap();
        assert_eq!(body, r#"{"attackPoint":"head","defensePoint":"legs"}"#);
    }
}
