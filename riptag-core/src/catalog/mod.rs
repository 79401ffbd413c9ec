//! HTTP metadata services behind one trait: release search and detail from
//! MusicBrainz, lyrics from LRCLIB and artwork from the Cover Art Archive.

mod coverart;
mod lrclib;
mod musicbrainz;

pub use coverart::CoverArtArchiveClient;
pub use lrclib::LrclibClient;
pub use musicbrainz::MusicBrainzClient;

use async_trait::async_trait;
use std::{fmt, time::Duration};

use crate::{error::ProviderError, model::Candidate};

/// Exact-match key for an LRCLIB lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Confirmed artist tag.
    pub artist: String,
    /// Confirmed title tag.
    pub title: String,
    /// Confirmed album tag.
    pub album: String,
    /// Track length in whole seconds.
    pub duration_secs: u64,
}

/// Cover Art Archive entity to ask for artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverTarget {
    /// Release MBID.
    Release(String),
    /// Release group MBID, the fallback when the release has no art.
    ReleaseGroup(String),
}

impl fmt::Display for CoverTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverTarget::Release(id) => write!(f, "release/{id}"),
            CoverTarget::ReleaseGroup(id) => write!(f, "release-group/{id}"),
        }
    }
}

/// Remote lookups used by the workflow. Absence is `Ok(None)` or an empty
/// list, never an error.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Release candidates for free text, in relevance order.
    async fn search_releases(
        &self,
        query: &str,
    ) -> Result<Vec<Candidate>, ProviderError>;

    /// Track candidates of a release, in media then track order.
    async fn release_tracks(
        &self,
        release_id: &str,
    ) -> Result<Vec<Candidate>, ProviderError>;

    /// Plain lyrics for an exact match, or synced lyrics when only those
    /// exist.
    async fn lyrics(
        &self,
        query: &LyricsQuery,
    ) -> Result<Option<String>, ProviderError>;

    async fn cover_art(
        &self,
        target: &CoverTarget,
    ) -> Result<Option<Vec<u8>>, ProviderError>;
}

/// Settings for [`HttpCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Identifies the client to every service.
    pub user_agent: String,
    /// Per request.
    pub timeout: Duration,
    /// Releases per search.
    pub release_results: u32,
}

/// [`CatalogApi`] over the public web services, sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    musicbrainz: MusicBrainzClient,
    lrclib: LrclibClient,
    cover_art: CoverArtArchiveClient,
}

impl HttpCatalog {
    /// Fails only if the HTTP client cannot be built.
    pub fn new(settings: &CatalogSettings) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            musicbrainz: MusicBrainzClient::new(
                http.clone(),
                settings.timeout,
                settings.release_results,
            ),
            lrclib: LrclibClient::new(http.clone(), settings.timeout),
            cover_art: CoverArtArchiveClient::new(http, settings.timeout),
        })
    }
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn search_releases(
        &self,
        query: &str,
    ) -> Result<Vec<Candidate>, ProviderError> {
        self.musicbrainz.search_releases(query).await
    }

    async fn release_tracks(
        &self,
        release_id: &str,
    ) -> Result<Vec<Candidate>, ProviderError> {
        self.musicbrainz.release_tracks(release_id).await
    }

    async fn lyrics(
        &self,
        query: &LyricsQuery,
    ) -> Result<Option<String>, ProviderError> {
        self.lrclib.lyrics(query).await
    }

    async fn cover_art(
        &self,
        target: &CoverTarget,
    ) -> Result<Option<Vec<u8>>, ProviderError> {
        self.cover_art.front(target).await
    }
}

/// Map transport failures, keeping timeouts distinguishable.
fn transport_error(
    provider: &'static str,
    after: Duration,
) -> impl Fn(reqwest::Error) -> ProviderError {
    move |err| {
        if err.is_timeout() {
            ProviderError::Timeout { provider, after }
        } else {
            ProviderError::Network(err)
        }
    }
}

fn parse_url(
    provider: &'static str,
    base: &str,
    params: &[(&str, &str)],
) -> Result<url::Url, ProviderError> {
    url::Url::parse_with_params(base, params).map_err(|err| {
        ProviderError::Parse {
            provider,
            message: format!("invalid request URL: {err}"),
        }
    })
}
