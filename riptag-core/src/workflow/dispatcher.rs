use std::{fmt, sync::Arc};

use tokio::{runtime::Handle, sync::mpsc::UnboundedSender};
use tracing::{debug, error};

use super::{
    command::{Command, Completion, SearchResults},
    event::Event,
};
use crate::{
    catalog::CatalogApi,
    error::WorkflowError,
    fetch::AssetFetcher,
    model::Candidate,
    tools::ToolAdapter,
};

/// Collaborators shared by every background command.
#[derive(Clone)]
pub struct Services {
    /// yt-dlp and ffmpeg.
    pub tools: Arc<dyn ToolAdapter>,
    /// MusicBrainz, LRCLIB and the Cover Art Archive.
    pub catalog: Arc<dyn CatalogApi>,
    /// Runs download attempts.
    pub fetcher: AssetFetcher,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

/// Runs commands on the runtime and posts exactly one completion per
/// command back into the event channel.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    runtime: Handle,
    services: Arc<Services>,
    events: UnboundedSender<Event>,
}

impl Dispatcher {
    /// Completions are sent to `events`.
    pub fn new(
        runtime: Handle,
        services: Services,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            runtime,
            services: Arc::new(services),
            events,
        }
    }

    /// Never blocks. Failures, including a panicking task, arrive as the
    /// error half of the completion.
    pub fn dispatch(&self, command: Command) {
        let kind = command.kind();
        let services = Arc::clone(&self.services);
        let events = self.events.clone();
        let runtime = self.runtime.clone();

        debug!(?kind, "spawning command");
        self.runtime.spawn(async move {
            let work = runtime.spawn(execute(services, command));
            let completion = match work.await {
                Ok(completion) => completion,
                Err(join_error) => {
                    error!(?kind, error = %join_error, "command task failed");
                    Completion::failed(
                        kind,
                        WorkflowError::ExternalTool {
                            tool: format!("{kind:?} task"),
                            output: join_error.to_string(),
                        },
                    )
                }
            };
            if events.send(Event::Completed(completion)).is_err() {
                debug!(?kind, "event loop gone; dropping completion");
            }
        });
    }
}

/// Run one command to completion. Exposed so the commands can be driven
/// without a channel.
pub async fn execute(services: Arc<Services>, command: Command) -> Completion {
    match command {
        Command::CheckDependencies => Completion::Dependencies(
            services.tools.locate().await.map_err(WorkflowError::from),
        ),
        Command::ResolveUrl { tools, url } => Completion::UrlResolved(
            services
                .tools
                .resolve_url(&tools, &url)
                .await
                .map(Arc::new)
                .map_err(WorkflowError::from),
        ),
        Command::Search { tools, query } => {
            let (videos, releases) = tokio::join!(
                services.tools.search_videos(&tools, &query),
                services.catalog.search_releases(&query),
            );
            let result: Result<SearchResults, WorkflowError> =
                match (videos, releases) {
                    (Err(err), _) => Err(err.into()),
                    (_, Err(err)) => Err(err.into()),
                    (Ok(videos), Ok(releases)) => Ok(SearchResults {
                        videos: shared(videos),
                        releases: shared(releases),
                    }),
                };
            Completion::SearchFinished(result)
        }
        Command::SearchReleases { query } => Completion::ReleasesFound(
            services
                .catalog
                .search_releases(&query)
                .await
                .map(shared)
                .map_err(WorkflowError::from),
        ),
        Command::FetchTracks { release_id } => Completion::TracksFetched(
            services
                .catalog
                .release_tracks(&release_id)
                .await
                .map(shared)
                .map_err(WorkflowError::from),
        ),
        Command::Download(plan) => {
            Completion::DownloadFinished(services.fetcher.run(plan).await)
        }
    }
}

fn shared(candidates: Vec<Candidate>) -> Vec<Arc<Candidate>> {
    candidates.into_iter().map(Arc::new).collect()
}
