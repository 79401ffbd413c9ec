use std::time::Duration;
use tracing::debug;

use super::{CoverTarget, transport_error};
use crate::error::ProviderError;

const COVER_ART_BASE_URL: &str = "https://coverartarchive.org";
const PROVIDER: &str = "Cover Art Archive";

/// Front cover lookups.
#[derive(Debug, Clone)]
pub struct CoverArtArchiveClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl CoverArtArchiveClient {
    /// Client sharing `http`.
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Front image at 500px. `Ok(None)` when the archive has none.
    pub async fn front(
        &self,
        target: &CoverTarget,
    ) -> Result<Option<Vec<u8>>, ProviderError> {
        let url = format!("{COVER_ART_BASE_URL}/{target}/front-500");
        debug!(url = %url, "requesting cover art");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(transport_error(PROVIDER, self.timeout))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(transport_error(PROVIDER, self.timeout))?;
        Ok((!bytes.is_empty()).then(|| bytes.to_vec()))
    }
}
