use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{parse_url, transport_error};
use crate::{
    error::ProviderError,
    model::{
        ArtistCredit, Candidate, ReleaseInfo, TrackInfo, join_artist_credits,
    },
};

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const PROVIDER: &str = "MusicBrainz";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    releases: Vec<MbRelease>,
}

#[derive(Debug, Deserialize)]
struct MbRelease {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MbArtistCredit>,
    date: Option<String>,
    #[serde(rename = "release-group")]
    release_group: Option<MbReleaseGroup>,
    #[serde(default)]
    media: Vec<MbMedium>,
}

#[derive(Debug, Deserialize)]
struct MbArtistCredit {
    name: String,
    #[serde(default)]
    joinphrase: String,
}

#[derive(Debug, Deserialize)]
struct MbReleaseGroup {
    id: String,
    #[serde(rename = "primary-type")]
    primary_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbMedium {
    format: Option<String>,
    #[serde(default)]
    tracks: Vec<MbTrack>,
}

#[derive(Debug, Deserialize)]
struct MbTrack {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    number: String,
    length: Option<u64>,
    recording: Option<MbRecording>,
}

#[derive(Debug, Deserialize)]
struct MbRecording {
    length: Option<u64>,
    #[serde(default)]
    genres: Vec<MbGenre>,
}

#[derive(Debug, Deserialize)]
struct MbGenre {
    name: String,
}

impl MbRelease {
    fn credits(&self) -> Vec<ArtistCredit> {
        self.artist_credit
            .iter()
            .map(|credit| ArtistCredit {
                name: credit.name.clone(),
                join_phrase: credit.joinphrase.clone(),
            })
            .collect()
    }

    fn into_info(self) -> ReleaseInfo {
        let artist_credits = self.credits();
        let (release_group_id, primary_type) = match self.release_group {
            Some(group) => (Some(group.id), group.primary_type),
            None => (None, None),
        };
        ReleaseInfo {
            id: self.id,
            title: self.title,
            artist_credits,
            date: self.date.unwrap_or_default(),
            primary_type: primary_type.unwrap_or_default(),
            release_group_id,
        }
    }

    fn into_tracks(self) -> Vec<Candidate> {
        let artist = join_artist_credits(&self.credits());
        self.media
            .into_iter()
            .flat_map(|medium| {
                let format = medium.format.unwrap_or_default();
                let artist = artist.clone();
                medium.tracks.into_iter().map(move |track| {
                    let (recording_length, genres) = match track.recording {
                        Some(recording) => (
                            recording.length,
                            recording
                                .genres
                                .into_iter()
                                .map(|genre| genre.name)
                                .collect(),
                        ),
                        None => (None, Vec::new()),
                    };
                    Candidate::track(TrackInfo {
                        id: track.id,
                        title: track.title,
                        number: track.number,
                        length_ms: track.length.or(recording_length),
                        genres,
                        artist: artist.clone(),
                        format: format.clone(),
                    })
                })
            })
            .collect()
    }
}

fn parse_search(body: &str) -> Result<Vec<Candidate>, ProviderError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::Parse {
            provider: PROVIDER,
            message: err.to_string(),
        })?;
    Ok(response
        .releases
        .into_iter()
        .map(|release| Candidate::release(release.into_info()))
        .collect())
}

fn parse_release_detail(body: &str) -> Result<Vec<Candidate>, ProviderError> {
    let release: MbRelease =
        serde_json::from_str(body).map_err(|err| ProviderError::Parse {
            provider: PROVIDER,
            message: err.to_string(),
        })?;
    Ok(release.into_tracks())
}

/// MusicBrainz web service, JSON flavour.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    release_limit: u32,
}

impl MusicBrainzClient {
    /// `release_limit` caps every search.
    pub fn new(
        http: reqwest::Client,
        timeout: Duration,
        release_limit: u32,
    ) -> Self {
        Self {
            http,
            base_url: MUSICBRAINZ_BASE_URL.to_string(),
            timeout,
            release_limit,
        }
    }

    /// Release candidates with artist credits and release groups.
    pub async fn search_releases(
        &self,
        query: &str,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let limit = self.release_limit.to_string();
        let url = parse_url(
            PROVIDER,
            &format!("{}/release/", self.base_url),
            &[
                ("query", query),
                ("fmt", "json"),
                ("inc", "artist-credits+release-groups"),
                ("limit", limit.as_str()),
            ],
        )?;

        let body = self.get(url).await?;
        let releases = parse_search(&body)?;
        info!(query, results = releases.len(), "release search finished");
        Ok(releases)
    }

    /// Every track on every medium of the release.
    pub async fn release_tracks(
        &self,
        release_id: &str,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let url = parse_url(
            PROVIDER,
            &format!("{}/release/{}", self.base_url, release_id),
            &[
                ("inc", "artist-credits+media+recordings+genres"),
                ("fmt", "json"),
            ],
        )?;

        let body = self.get(url).await?;
        let tracks = parse_release_detail(&body)?;
        info!(release_id, tracks = tracks.len(), "release detail fetched");
        Ok(tracks)
    }

    async fn get(&self, url: url::Url) -> Result<String, ProviderError> {
        debug!(url = %url, "querying MusicBrainz");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(transport_error(PROVIDER, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(transport_error(PROVIDER, self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CandidateKind;

    #[test]
    fn search_results_become_release_candidates() {
        let body = r#"{
            "releases": [{
                "id": "r1",
                "title": "Mezzanine",
                "date": "1998-04-20",
                "artist-credit": [{"name": "Massive Attack", "joinphrase": ""}],
                "release-group": {"id": "g1", "primary-type": "Album"}
            }, {
                "id": "r2",
                "title": "Unknown"
            }]
        }"#;

        let releases = parse_search(body).unwrap();

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].kind(), CandidateKind::Release);
        assert_eq!(
            releases[0].descriptor,
            "Massive Attack (1998-04-20) [Album]"
        );
        let info = releases[0].release_info().unwrap();
        assert_eq!(info.release_group_id.as_deref(), Some("g1"));
        assert_eq!(releases[1].descriptor, " () []");
    }

    #[test]
    fn release_detail_flattens_media_in_order() {
        let body = r#"{
            "id": "r1",
            "title": "Split",
            "artist-credit": [
                {"name": "A", "joinphrase": " & "},
                {"name": "B"}
            ],
            "media": [
                {"format": "CD", "tracks": [
                    {"id": "t1", "title": "One", "number": "1", "length": 215500,
                     "recording": {"genres": [{"name": "trip hop"}]}},
                    {"id": "t2", "title": "Two", "number": "2",
                     "recording": {"length": 1000}}
                ]},
                {"tracks": [
                    {"id": "t3", "title": "Three", "number": "1"}
                ]}
            ]
        }"#;

        let tracks = parse_release_detail(body).unwrap();

        let titles: Vec<_> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["One", "Two", "Three"]);
        assert_eq!(tracks[0].descriptor, "Track 1 (CD)");
        assert_eq!(tracks[2].descriptor, "Track 1");

        let first = tracks[0].track_info().unwrap();
        assert_eq!(first.artist, "A & B");
        assert_eq!(first.length_ms, Some(215_500));
        assert_eq!(first.genres, ["trip hop"]);
        assert_eq!(tracks[1].track_info().unwrap().length_ms, Some(1000));
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert!(matches!(
            parse_search("<html>"),
            Err(ProviderError::Parse { .. })
        ));
    }
}
