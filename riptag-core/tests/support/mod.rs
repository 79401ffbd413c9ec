#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use riptag_core::{
    ProviderError, ToolError,
    catalog::{CatalogApi, CoverTarget, LyricsQuery},
    fetch::{AssetFetcher, FetchSettings},
    model::{
        ArtistCredit, Candidate, MergeRequest, ReleaseInfo, TagSet, TrackInfo,
        ToolPaths,
    },
    tools::ToolAdapter,
    workflow::Services,
};

pub fn tool_paths() -> ToolPaths {
    ToolPaths {
        extractor: "/opt/bin/yt-dlp".into(),
        transcoder: "/opt/bin/ffmpeg".into(),
    }
}

pub fn video(id: &str, title: &str, uploader: &str) -> Candidate {
    Candidate::video(
        id,
        title,
        uploader,
        format!("https://www.youtube.com/watch?v={id}"),
    )
}

pub fn release(id: &str, title: &str, group: Option<&str>) -> Candidate {
    Candidate::release(ReleaseInfo {
        id: id.into(),
        title: title.into(),
        artist_credits: vec![ArtistCredit {
            name: "Artist B".into(),
            join_phrase: String::new(),
        }],
        date: "2020-01-01".into(),
        primary_type: "Album".into(),
        release_group_id: group.map(str::to_string),
    })
}

pub fn track(id: &str, title: &str, number: &str, length_ms: u64) -> Candidate {
    Candidate::track(TrackInfo {
        id: id.into(),
        title: title.into(),
        number: number.into(),
        length_ms: Some(length_ms),
        genres: vec![],
        artist: "Artist B".into(),
        format: "CD".into(),
    })
}

pub fn tags() -> TagSet {
    TagSet {
        title: "Song B".into(),
        artist: "Artist B".into(),
        album: "Album B".into(),
        date: "2020".into(),
        track_number: "2".into(),
        album_artist: "Artist B".into(),
        lyrics: None,
        duration_secs: 215,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBehaviour {
    Succeed,
    Fail,
    TimeOut,
}

/// Scripted stand-in for yt-dlp and ffmpeg.
#[derive(Debug)]
pub struct FakeTools {
    pub missing: Option<&'static str>,
    pub videos: Vec<Candidate>,
    pub resolved: Option<Candidate>,
    pub audio: AudioBehaviour,
    pub audio_delay: Duration,
    pub transcode_fails: bool,
    pub panic_on_search: bool,
    pub extracted_urls: Mutex<Vec<String>>,
    pub merges: Mutex<Vec<MergeRequest>>,
    /// Whether the scratch directory still existed when the merge ran.
    pub scratch_seen_at_merge: Mutex<Vec<bool>>,
}

impl Default for FakeTools {
    fn default() -> Self {
        Self {
            missing: None,
            videos: Vec::new(),
            resolved: None,
            audio: AudioBehaviour::Succeed,
            audio_delay: Duration::ZERO,
            transcode_fails: false,
            panic_on_search: false,
            extracted_urls: Mutex::new(Vec::new()),
            merges: Mutex::new(Vec::new()),
            scratch_seen_at_merge: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTools {
    pub fn merges(&self) -> Vec<MergeRequest> {
        self.merges.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolAdapter for FakeTools {
    async fn locate(&self) -> Result<ToolPaths, ToolError> {
        match self.missing {
            Some(tool) => Err(ToolError::NotFound {
                tool,
                hint: "install it",
            }),
            None => Ok(tool_paths()),
        }
    }

    async fn search_videos(
        &self,
        _tools: &ToolPaths,
        _query: &str,
    ) -> Result<Vec<Candidate>, ToolError> {
        if self.panic_on_search {
            panic!("search blew up");
        }
        Ok(self.videos.clone())
    }

    async fn resolve_url(
        &self,
        _tools: &ToolPaths,
        url: &str,
    ) -> Result<Candidate, ToolError> {
        self.resolved.clone().ok_or_else(|| ToolError::Failed {
            tool: "yt-dlp",
            status: "exit status: 1".into(),
            output: format!("ERROR: Unsupported URL: {url}"),
        })
    }

    async fn extract_audio(
        &self,
        _tools: &ToolPaths,
        url: &str,
        output: &Path,
    ) -> Result<PathBuf, ToolError> {
        self.extracted_urls.lock().unwrap().push(url.to_string());
        tokio::time::sleep(self.audio_delay).await;
        match self.audio {
            AudioBehaviour::Succeed => {
                tokio::fs::write(output, b"audio").await.unwrap();
                Ok(output.to_path_buf())
            }
            AudioBehaviour::Fail => Err(ToolError::Failed {
                tool: "yt-dlp",
                status: "exit status: 1".into(),
                output: "ERROR: Video unavailable".into(),
            }),
            AudioBehaviour::TimeOut => Err(ToolError::Timeout {
                tool: "yt-dlp",
                after: Duration::from_secs(60),
            }),
        }
    }

    async fn transcode(
        &self,
        _tools: &ToolPaths,
        request: &MergeRequest,
    ) -> Result<(), ToolError> {
        self.merges.lock().unwrap().push(request.clone());
        let scratch_alive = request
            .audio
            .parent()
            .is_some_and(|dir| dir.exists());
        self.scratch_seen_at_merge.lock().unwrap().push(scratch_alive);
        if self.transcode_fails {
            return Err(ToolError::Failed {
                tool: "ffmpeg",
                status: "exit status: 1".into(),
                output: "Invalid data found when processing input".into(),
            });
        }
        tokio::fs::write(&request.output, b"flac").await.unwrap();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum LyricsBehaviour {
    Text(String),
    Absent,
    Fail,
}

/// Scripted stand-in for the HTTP catalog.
#[derive(Debug)]
pub struct FakeCatalog {
    /// Keyed by exact query; anything else yields `default_releases`.
    pub releases: HashMap<String, Vec<Candidate>>,
    pub default_releases: Vec<Candidate>,
    pub tracks: Vec<Candidate>,
    pub lyrics: LyricsBehaviour,
    /// Keyed by `CoverTarget` display form; missing keys are absent.
    pub covers: HashMap<String, Vec<u8>>,
    pub cover_fails: bool,
    /// Applied to every lyrics and cover lookup before it answers.
    pub lookup_delay: Duration,
    pub release_queries: Mutex<Vec<String>>,
    pub cover_requests: Mutex<Vec<CoverTarget>>,
    pub lyrics_requests: Mutex<Vec<LyricsQuery>>,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self {
            releases: HashMap::new(),
            default_releases: Vec::new(),
            tracks: Vec::new(),
            lyrics: LyricsBehaviour::Absent,
            covers: HashMap::new(),
            cover_fails: false,
            lookup_delay: Duration::ZERO,
            release_queries: Mutex::new(Vec::new()),
            cover_requests: Mutex::new(Vec::new()),
            lyrics_requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCatalog {
    pub fn cover_requests(&self) -> Vec<CoverTarget> {
        self.cover_requests.lock().unwrap().clone()
    }

    pub fn lyrics_requests(&self) -> Vec<LyricsQuery> {
        self.lyrics_requests.lock().unwrap().clone()
    }

    pub fn release_queries(&self) -> Vec<String> {
        self.release_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search_releases(
        &self,
        query: &str,
    ) -> Result<Vec<Candidate>, ProviderError> {
        self.release_queries.lock().unwrap().push(query.to_string());
        Ok(self
            .releases
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.default_releases.clone()))
    }

    async fn release_tracks(
        &self,
        _release_id: &str,
    ) -> Result<Vec<Candidate>, ProviderError> {
        Ok(self.tracks.clone())
    }

    async fn lyrics(
        &self,
        query: &LyricsQuery,
    ) -> Result<Option<String>, ProviderError> {
        self.lyrics_requests.lock().unwrap().push(query.clone());
        tokio::time::sleep(self.lookup_delay).await;
        match &self.lyrics {
            LyricsBehaviour::Text(text) => Ok(Some(text.clone())),
            LyricsBehaviour::Absent => Ok(None),
            LyricsBehaviour::Fail => Err(ProviderError::Status {
                provider: "LRCLIB",
                status: 500,
            }),
        }
    }

    async fn cover_art(
        &self,
        target: &CoverTarget,
    ) -> Result<Option<Vec<u8>>, ProviderError> {
        self.cover_requests.lock().unwrap().push(target.clone());
        tokio::time::sleep(self.lookup_delay).await;
        if self.cover_fails {
            return Err(ProviderError::Status {
                provider: "Cover Art Archive",
                status: 502,
            });
        }
        Ok(self.covers.get(&target.to_string()).cloned())
    }
}

/// Output and scratch directories for one test.
#[derive(Debug)]
pub struct Workspace {
    pub root: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("downloads")).unwrap();
        std::fs::create_dir_all(root.path().join("temp")).unwrap();
        Self { root }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("downloads")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.path().join("temp")
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch_dir()).unwrap().count()
    }

    pub fn fetcher(
        &self,
        tools: Arc<FakeTools>,
        catalog: Arc<FakeCatalog>,
    ) -> AssetFetcher {
        self.fetcher_with_asset_timeout(tools, catalog, Duration::from_secs(5))
    }

    pub fn fetcher_with_asset_timeout(
        &self,
        tools: Arc<FakeTools>,
        catalog: Arc<FakeCatalog>,
        asset_timeout: Duration,
    ) -> AssetFetcher {
        AssetFetcher::new(
            tools,
            catalog,
            FetchSettings {
                output_dir: self.output_dir(),
                scratch_dir: self.scratch_dir(),
                asset_timeout,
            },
        )
    }

    pub fn services(
        &self,
        tools: Arc<FakeTools>,
        catalog: Arc<FakeCatalog>,
    ) -> Services {
        Services {
            tools: tools.clone(),
            catalog: catalog.clone(),
            fetcher: self.fetcher(tools, catalog),
        }
    }
}
