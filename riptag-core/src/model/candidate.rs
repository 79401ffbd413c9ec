use serde::{Deserialize, Serialize};

use crate::error::PayloadMismatch;

/// Which list a candidate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Video,
    Release,
    Track,
}

/// One entry of an artist credit as returned by MusicBrainz.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub name: String,
    #[serde(default)]
    pub join_phrase: String,
}

/// Concatenate credits the way they are printed on a sleeve:
/// `name + joinphrase` for every entry.
pub fn join_artist_credits(credits: &[ArtistCredit]) -> String {
    credits.iter().fold(String::new(), |mut acc, credit| {
        acc.push_str(&credit.name);
        acc.push_str(&credit.join_phrase);
        acc
    })
}

/// A MusicBrainz release as shown in the release picker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub id: String,
    pub title: String,
    pub artist_credits: Vec<ArtistCredit>,
    pub date: String,
    pub primary_type: String,
    /// Used as the cover art fallback.
    pub release_group_id: Option<String>,
}

impl ReleaseInfo {
    pub fn artist(&self) -> String {
        join_artist_credits(&self.artist_credits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub title: String,
    /// Printed track number; not always numeric (`A1`, `B2` on vinyl).
    pub number: String,
    pub length_ms: Option<u64>,
    pub genres: Vec<String>,
    /// Joined artist credit of the release the track was listed on.
    pub artist: String,
    /// Medium format label, e.g. `CD` or `Digital Media`.
    pub format: String,
}

/// Provider-specific data attached to a candidate, keyed by its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidatePayload {
    Video,
    Release(ReleaseInfo),
    Track(TrackInfo),
}

impl CandidatePayload {
    pub fn kind(&self) -> CandidateKind {
        match self {
            CandidatePayload::Video => CandidateKind::Video,
            CandidatePayload::Release(_) => CandidateKind::Release,
            CandidatePayload::Track(_) => CandidateKind::Track,
        }
    }
}

/// An unconfirmed search result.
///
/// The kind is derived from the payload so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    /// Secondary line shown under the title (uploader, artist/date/type or
    /// track position).
    pub descriptor: String,
    pub source_url: String,
    pub payload: CandidatePayload,
}

impl Candidate {
    pub fn video(
        id: impl Into<String>,
        title: impl Into<String>,
        uploader: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            descriptor: uploader.into(),
            source_url: source_url.into(),
            payload: CandidatePayload::Video,
        }
    }

    pub fn release(info: ReleaseInfo) -> Self {
        let descriptor = format!(
            "{} ({}) [{}]",
            info.artist(),
            info.date,
            info.primary_type
        );
        Self {
            id: info.id.clone(),
            title: info.title.clone(),
            descriptor,
            source_url: format!("https://musicbrainz.org/release/{}", info.id),
            payload: CandidatePayload::Release(info),
        }
    }

    pub fn track(info: TrackInfo) -> Self {
        let descriptor = if info.format.is_empty() {
            format!("Track {}", info.number)
        } else {
            format!("Track {} ({})", info.number, info.format)
        };
        Self {
            id: info.id.clone(),
            title: info.title.clone(),
            descriptor,
            source_url: format!("https://musicbrainz.org/track/{}", info.id),
            payload: CandidatePayload::Track(info),
        }
    }

    pub fn kind(&self) -> CandidateKind {
        self.payload.kind()
    }

    pub fn release_info(&self) -> Result<&ReleaseInfo, PayloadMismatch> {
        match &self.payload {
            CandidatePayload::Release(info) => Ok(info),
            other => Err(PayloadMismatch {
                expected: CandidateKind::Release,
                found: other.kind(),
            }),
        }
    }

    pub fn track_info(&self) -> Result<&TrackInfo, PayloadMismatch> {
        match &self.payload {
            CandidatePayload::Track(info) => Ok(info),
            other => Err(PayloadMismatch {
                expected: CandidateKind::Track,
                found: other.kind(),
            }),
        }
    }

    /// Text used to look up releases for a chosen video.
    pub fn metadata_query(&self) -> String {
        format!("{} {}", self.title, self.descriptor)
    }
}
