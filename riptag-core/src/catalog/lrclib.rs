use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{LyricsQuery, parse_url, transport_error};
use crate::error::ProviderError;

const LRCLIB_GET_URL: &str = "https://lrclib.net/api/get";
const PROVIDER: &str = "LRCLIB";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrclibResponse {
    plain_lyrics: Option<String>,
    synced_lyrics: Option<String>,
}

impl LrclibResponse {
    /// Plain text wins; synced (LRC) text is the fallback.
    fn into_text(self) -> Option<String> {
        [self.plain_lyrics, self.synced_lyrics]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    }
}

/// LRCLIB `get` endpoint.
#[derive(Debug, Clone)]
pub struct LrclibClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl LrclibClient {
    /// Client sharing `http`.
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Exact-match lookup. Any status other than 200 means "no lyrics".
    pub async fn lyrics(
        &self,
        query: &LyricsQuery,
    ) -> Result<Option<String>, ProviderError> {
        let duration = query.duration_secs.to_string();
        let url = parse_url(
            PROVIDER,
            LRCLIB_GET_URL,
            &[
                ("track_name", query.title.as_str()),
                ("artist_name", query.artist.as_str()),
                ("album_name", query.album.as_str()),
                ("duration", duration.as_str()),
            ],
        )?;
        debug!(url = %url, "querying LRCLIB");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(transport_error(PROVIDER, self.timeout))?;

        if response.status() != reqwest::StatusCode::OK {
            debug!(status = %response.status(), "no lyrics available");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(transport_error(PROVIDER, self.timeout))?;
        parse_lyrics(&body)
    }
}

fn parse_lyrics(body: &str) -> Result<Option<String>, ProviderError> {
    let response: LrclibResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::Parse {
            provider: PROVIDER,
            message: err.to_string(),
        })?;
    Ok(response.into_text())
}
