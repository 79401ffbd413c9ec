//! The download stage: audio, cover art and lyrics fetched side by side,
//! joined, reconciled and merged into one tagged file.

mod sanitize;
mod scratch;

pub use sanitize::sanitize_filename;
pub use scratch::ScratchArea;

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::{task::JoinSet, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    catalog::{CatalogApi, CoverTarget, LyricsQuery},
    error::{ProviderError, WorkflowError},
    model::{
        AssetError, AssetKind, DownloadMode, DownloadPlan, DownloadReport,
        FetchOutcome, MergeRequest,
    },
    tools::ToolAdapter,
};

const AUDIO_FILE: &str = "audio.tmp";
const COVER_FILE: &str = "cover.jpg";

/// Where attempts write and how long best-effort lookups may take.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Persistent directory receiving finished files.
    pub output_dir: PathBuf,
    /// Parent of the per-attempt scratch areas.
    pub scratch_dir: PathBuf,
    /// Upper bound for each best-effort lookup (cover art, lyrics).
    pub asset_timeout: Duration,
}

/// Value produced by one fetch sub-operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// The extracted stream in the scratch area.
    Audio(PathBuf),
    /// Stored artwork, if the archive had any.
    Cover(Option<PathBuf>),
    /// Lyrics text, if LRCLIB had any.
    Lyrics(Option<String>),
}

/// One joined sub-operation, tagged with what it was fetching.
pub type AssetResult = (AssetKind, Result<Fetched, WorkflowError>);

/// Runs download attempts against the tool and catalog adapters.
#[derive(Clone)]
pub struct AssetFetcher {
    tools: Arc<dyn ToolAdapter>,
    catalog: Arc<dyn CatalogApi>,
    settings: FetchSettings,
}

impl fmt::Debug for AssetFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetFetcher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AssetFetcher {
    /// Fetcher over the given adapters.
    pub fn new(
        tools: Arc<dyn ToolAdapter>,
        catalog: Arc<dyn CatalogApi>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            tools,
            catalog,
            settings,
        }
    }

    /// One complete attempt: fetch, merge, clean up.
    pub async fn run(
        &self,
        plan: DownloadPlan,
    ) -> Result<DownloadReport, WorkflowError> {
        let scratch = ScratchArea::create(&self.settings.scratch_dir)?;
        info!(
            source = %plan.source.source_url,
            tagless = plan.is_tagless(),
            scratch = %scratch.path().display(),
            "download attempt started"
        );

        let outcome = self.fetch(&plan, scratch.path()).await?;
        let request = self.merge_request(&plan, &outcome);
        self.tools.transcode(&plan.tools, &request).await?;

        let report = DownloadReport {
            output_path: request.output.clone(),
            cover_embedded: request.cover.is_some(),
            lyrics_embedded: request
                .metadata
                .iter()
                .any(|(key, _)| key == "LYRICS"),
            skipped_assets: outcome.errors.iter().map(|e| e.kind).collect(),
        };
        info!(
            output = %report.output_path.display(),
            cover = report.cover_embedded,
            lyrics = report.lyrics_embedded,
            skipped = ?report.skipped_assets,
            "download attempt finished"
        );
        scratch.close();
        Ok(report)
    }

    /// Fan out the sub-operations and wait for every one of them.
    pub async fn fetch(
        &self,
        plan: &DownloadPlan,
        scratch: &Path,
    ) -> Result<FetchOutcome, WorkflowError> {
        // Checked before anything is spawned so a bad payload cannot leave
        // an extraction running.
        let tagged = match &plan.mode {
            DownloadMode::Tagged { release, tags } => {
                let info = release.release_info()?;
                Some((
                    info.id.clone(),
                    info.release_group_id
                        .clone()
                        .filter(|id| !id.is_empty()),
                    LyricsQuery {
                        artist: tags.artist.clone(),
                        title: tags.title.clone(),
                        album: tags.album.clone(),
                        duration_secs: tags.duration_secs,
                    },
                ))
            }
            DownloadMode::Tagless => None,
        };

        let mut tasks = JoinSet::new();
        let mut kinds = HashMap::new();

        let tools = Arc::clone(&self.tools);
        let paths = plan.tools.clone();
        let url = plan.source.source_url.clone();
        let audio_path = scratch.join(AUDIO_FILE);
        let handle = tasks.spawn(async move {
            tools
                .extract_audio(&paths, &url, &audio_path)
                .await
                .map(Fetched::Audio)
                .map_err(WorkflowError::from)
        });
        kinds.insert(handle.id(), AssetKind::Audio);

        if let Some((release_id, group_id, lyrics_query)) = tagged {
            let catalog = Arc::clone(&self.catalog);
            let destination = scratch.join(COVER_FILE);
            let limit = self.settings.asset_timeout;
            let handle = tasks.spawn(async move {
                bounded(
                    "cover art lookup",
                    limit,
                    fetch_cover(catalog, release_id, group_id, destination),
                )
                .await
                .map(Fetched::Cover)
            });
            kinds.insert(handle.id(), AssetKind::Cover);

            let catalog = Arc::clone(&self.catalog);
            let handle = tasks.spawn(async move {
                bounded("lyrics lookup", limit, async move {
                    catalog
                        .lyrics(&lyrics_query)
                        .await
                        .map_err(WorkflowError::from)
                })
                .await
                .map(Fetched::Lyrics)
            });
            kinds.insert(handle.id(), AssetKind::Lyrics);
        }

        let mut results = Vec::with_capacity(kinds.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    if let Some(kind) = kinds.get(&id) {
                        results.push((*kind, result));
                    }
                }
                Err(err) => {
                    if let Some(kind) = kinds.get(&err.id()) {
                        results.push((
                            *kind,
                            Err(WorkflowError::ExternalTool {
                                tool: format!("{kind} task"),
                                output: err.to_string(),
                            }),
                        ));
                    }
                }
            }
        }

        reconcile(results)
    }

    fn merge_request(
        &self,
        plan: &DownloadPlan,
        outcome: &FetchOutcome,
    ) -> MergeRequest {
        match &plan.mode {
            DownloadMode::Tagged { tags, .. } => {
                let tags = tags.with_lyrics(outcome.lyrics.as_deref());
                MergeRequest {
                    audio: outcome.audio_path.clone(),
                    cover: outcome.cover_path.clone(),
                    metadata: tags.metadata(),
                    output: self
                        .settings
                        .output_dir
                        .join(sanitize_filename(&tags.file_name())),
                }
            }
            DownloadMode::Tagless => MergeRequest {
                audio: outcome.audio_path.clone(),
                cover: None,
                metadata: Vec::new(),
                output: self.settings.output_dir.join(sanitize_filename(
                    &format!("{}.flac", plan.source.title),
                )),
            },
        }
    }
}

/// Apply the partial-failure policy to the joined results.
///
/// Audio failure dominates and discards everything else. Cover and lyrics
/// failures are recorded and logged, never returned.
pub fn reconcile(
    results: Vec<AssetResult>,
) -> Result<FetchOutcome, WorkflowError> {
    let mut audio = None;
    let mut cover_path = None;
    let mut lyrics = None;
    let mut errors = Vec::new();

    for (kind, result) in results {
        match (kind, result) {
            (AssetKind::Audio, Err(err)) => {
                warn!(error = %err, "audio extraction failed; attempt aborted");
                return Err(err);
            }
            (_, Err(cause)) => {
                warn!(asset = %kind, error = %cause, "optional asset skipped");
                errors.push(AssetError { kind, cause });
            }
            (_, Ok(Fetched::Audio(path))) => audio = Some(path),
            (_, Ok(Fetched::Cover(path))) => {
                if path.is_none() {
                    debug!("no cover art available");
                }
                cover_path = path;
            }
            (_, Ok(Fetched::Lyrics(text))) => {
                let text = text.filter(|text| !text.trim().is_empty());
                if text.is_none() {
                    debug!("no lyrics available");
                }
                lyrics = text;
            }
        }
    }

    match audio {
        Some(audio_path) if !audio_path.as_os_str().is_empty() => {
            Ok(FetchOutcome {
                audio_path,
                cover_path,
                lyrics,
                errors,
            })
        }
        _ => Err(WorkflowError::ExternalTool {
            tool: "audio extraction".to_string(),
            output: "no audio file was produced".to_string(),
        }),
    }
}

async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    work: impl Future<Output = Result<T, WorkflowError>>,
) -> Result<T, WorkflowError> {
    timeout(limit, work)
        .await
        .unwrap_or_else(|_| {
            Err(WorkflowError::Timeout {
                operation: operation.to_string(),
                after: limit,
            })
        })
}

/// Release-level art first; the release group is asked only when the
/// release has none.
async fn fetch_cover(
    catalog: Arc<dyn CatalogApi>,
    release_id: String,
    group_id: Option<String>,
    destination: PathBuf,
) -> Result<Option<PathBuf>, WorkflowError> {
    let mut image = catalog
        .cover_art(&CoverTarget::Release(release_id))
        .await?;
    if image.is_none()
        && let Some(group_id) = group_id
    {
        debug!(group_id, "falling back to release group artwork");
        image = catalog
            .cover_art(&CoverTarget::ReleaseGroup(group_id))
            .await?;
    }

    let Some(bytes) = image else {
        return Ok(None);
    };
    tokio::fs::write(&destination, bytes).await.map_err(|source| {
        ProviderError::Io {
            path: destination.clone(),
            source,
        }
    })?;
    Ok(Some(destination))
}
