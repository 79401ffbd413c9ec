use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    command::{Command, CommandKind, Completion, SearchResults},
    editor::{EditorStep, TagEditor},
    event::{Event, Key},
};
use crate::{
    error::WorkflowError,
    model::{Candidate, DownloadMode, DownloadPlan, DownloadReport, ToolPaths},
};

const NO_SOURCES_MESSAGE: &str =
    "No playable sources matched the query. Try different search terms.";
const NO_TRACKS_MESSAGE: &str = "The selected release has no usable track \
                                 information. Choose a different release.";

/// Where the wizard is. Exactly one stage is current at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Startup only; never re-entered after a reset.
    CheckingDependencies,
    /// Typing a URL or search text.
    #[default]
    AwaitingQuery,
    FetchingUrlInfo,
    /// Video and release search in parallel.
    SearchingCandidates,
    /// Picking a video.
    SelectingSource,
    SearchingReleases,
    SelectingRelease,
    FetchingTracks,
    SelectingTrack,
    /// The five-field tag form.
    EditingTags,
    /// Asking whether to download without metadata.
    ConfirmingSkipMetadata,
    Downloading,
    /// Any key starts over.
    ShowingSuccess,
    /// Any key starts over, or quits when a dependency is missing.
    ShowingError,
}

impl Stage {
    /// Stages that only wait for a completion.
    pub fn is_waiting(self) -> bool {
        self.status().is_some()
    }

    /// Spinner text for waiting stages.
    pub fn status(self) -> Option<&'static str> {
        let text = match self {
            Stage::CheckingDependencies => "Checking for yt-dlp and ffmpeg...",
            Stage::FetchingUrlInfo => "Reading video information...",
            Stage::SearchingCandidates => "Searching videos and releases...",
            Stage::SearchingReleases => "Searching MusicBrainz...",
            Stage::FetchingTracks => "Fetching the track list...",
            Stage::Downloading => "Fetching audio, cover art and lyrics...",
            _ => return None,
        };
        Some(text)
    }
}

/// Terminal size in cells, as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
}

/// A candidate list with a wrapping cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Picker {
    items: Vec<Arc<Candidate>>,
    cursor: usize,
}

impl Picker {
    /// Cursor starts on the first item.
    pub fn new(items: Vec<Arc<Candidate>>) -> Self {
        Self { items, cursor: 0 }
    }

    /// Items in display order.
    pub fn items(&self) -> &[Arc<Candidate>] {
        &self.items
    }

    /// Index of the highlighted item.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// No items to pick from.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The highlighted item.
    pub fn selected(&self) -> Option<&Arc<Candidate>> {
        self.items.get(self.cursor)
    }

    /// Move down, wrapping to the top.
    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.cursor = (self.cursor + 1) % self.items.len();
        }
    }

    /// Move up, wrapping to the bottom.
    pub fn previous(&mut self) {
        if !self.items.is_empty() {
            self.cursor =
                (self.cursor + self.items.len() - 1) % self.items.len();
        }
    }
}

/// Workflow-scoped state. Replaced wholesale when a run ends.
#[derive(Debug, Clone, Default)]
pub struct Session {
    stage: Stage,
    query: String,
    videos: Picker,
    releases: Picker,
    tracks: Picker,
    /// Releases matched by the initial free-text search.
    suggested_releases: Vec<Arc<Candidate>>,
    selected_video: Option<Arc<Candidate>>,
    selected_release: Option<Arc<Candidate>>,
    selected_track: Option<Arc<Candidate>>,
    editor: Option<TagEditor>,
    in_flight: Option<CommandKind>,
    report: Option<DownloadReport>,
    error: Option<WorkflowError>,
}

impl Session {
    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Text typed so far.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Video candidates.
    pub fn videos(&self) -> &Picker {
        &self.videos
    }

    /// Releases matching the chosen video.
    pub fn releases(&self) -> &Picker {
        &self.releases
    }

    /// Tracks of the chosen release.
    pub fn tracks(&self) -> &Picker {
        &self.tracks
    }

    /// Releases matched by the initial search, shown beside the videos.
    pub fn suggested_releases(&self) -> &[Arc<Candidate>] {
        &self.suggested_releases
    }

    /// The confirmed source.
    pub fn selected_video(&self) -> Option<&Arc<Candidate>> {
        self.selected_video.as_ref()
    }

    /// The confirmed release.
    pub fn selected_release(&self) -> Option<&Arc<Candidate>> {
        self.selected_release.as_ref()
    }

    /// The confirmed track.
    pub fn selected_track(&self) -> Option<&Arc<Candidate>> {
        self.selected_track.as_ref()
    }

    /// The tag form, once a track is chosen.
    pub fn editor(&self) -> Option<&TagEditor> {
        self.editor.as_ref()
    }

    /// The command whose completion is awaited. Any other completion is
    /// ignored.
    pub fn in_flight(&self) -> Option<CommandKind> {
        self.in_flight
    }

    /// Result of the last successful download.
    pub fn report(&self) -> Option<&DownloadReport> {
        self.report.as_ref()
    }

    /// The failure being shown.
    pub fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }
}

/// What the event loop should do after an update.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Redraw and wait for the next event.
    None,
    /// Run this in the background.
    Dispatch(Command),
    /// Leave the program.
    Quit,
}

/// The pipeline state machine.
///
/// Processes one event at a time and returns at most one command to run in
/// the background. It never awaits anything itself; results come back as
/// [`Event::Completed`].
#[derive(Debug, Default)]
pub struct Controller {
    tools: Option<ToolPaths>,
    viewport: Viewport,
    session: Session,
}

impl Controller {
    /// A controller waiting for [`Controller::start`].
    pub fn new() -> Self {
        Self {
            session: Session {
                stage: Stage::CheckingDependencies,
                ..Session::default()
            },
            ..Self::default()
        }
    }

    /// Kick off the dependency check.
    pub fn start(&mut self) -> Effect {
        if self.session.stage != Stage::CheckingDependencies
            || self.session.in_flight.is_some()
        {
            return Effect::None;
        }
        self.dispatch(Command::CheckDependencies)
    }

    /// Shorthand for `session().stage()`.
    pub fn stage(&self) -> Stage {
        self.session.stage
    }

    /// State of the current run.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Located executables; kept across resets.
    pub fn tools(&self) -> Option<&ToolPaths> {
        self.tools.as_ref()
    }

    /// Last reported terminal size; kept across resets.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Apply one event. Never blocks.
    pub fn update(&mut self, event: Event) -> Effect {
        match event {
            Event::Cancel => {
                info!(stage = ?self.session.stage, "cancelled by user");
                Effect::Quit
            }
            Event::Resize { width, height } => {
                self.viewport = Viewport { width, height };
                Effect::None
            }
            Event::Key(key) => self.handle_key(key),
            Event::Completed(completion) => self.handle_completion(completion),
        }
    }

    fn handle_key(&mut self, key: Key) -> Effect {
        match self.session.stage {
            Stage::AwaitingQuery => self.on_query_key(key),
            Stage::SelectingSource => self.on_source_key(key),
            Stage::SelectingRelease => self.on_release_key(key),
            Stage::SelectingTrack => self.on_track_key(key),
            Stage::EditingTags => self.on_editor_key(key),
            Stage::ConfirmingSkipMetadata => self.on_skip_key(key),
            Stage::ShowingSuccess | Stage::ShowingError => {
                if self
                    .session
                    .error
                    .as_ref()
                    .is_some_and(WorkflowError::is_dependency_missing)
                {
                    return Effect::Quit;
                }
                self.reset();
                Effect::None
            }
            Stage::CheckingDependencies
            | Stage::FetchingUrlInfo
            | Stage::SearchingCandidates
            | Stage::SearchingReleases
            | Stage::FetchingTracks
            | Stage::Downloading => Effect::None,
        }
    }

    fn on_query_key(&mut self, key: Key) -> Effect {
        match key {
            Key::Char(ch) => self.session.query.push(ch),
            Key::Backspace => {
                self.session.query.pop();
            }
            Key::Enter => {
                let query = self.session.query.trim().to_string();
                let Some(tools) = self.tools.clone() else {
                    return Effect::None;
                };
                if query.is_empty() {
                    return Effect::None;
                }
                return if query.starts_with("http") {
                    self.enter(Stage::FetchingUrlInfo);
                    self.dispatch(Command::ResolveUrl { tools, url: query })
                } else {
                    self.enter(Stage::SearchingCandidates);
                    self.dispatch(Command::Search { tools, query })
                };
            }
            _ => {}
        }
        Effect::None
    }

    fn on_source_key(&mut self, key: Key) -> Effect {
        match key {
            Key::Up => self.session.videos.previous(),
            Key::Down => self.session.videos.next(),
            Key::Esc => self.enter(Stage::AwaitingQuery),
            Key::Enter => {
                let Some(video) = self.session.videos.selected().cloned()
                else {
                    return Effect::None;
                };
                let query = video.metadata_query();
                self.session.selected_video = Some(video);
                self.enter(Stage::SearchingReleases);
                return self.dispatch(Command::SearchReleases { query });
            }
            Key::Char('s') => {
                if let Some(video) = self.session.videos.selected().cloned() {
                    self.session.selected_video = Some(video);
                    self.enter(Stage::ConfirmingSkipMetadata);
                }
            }
            _ => {}
        }
        Effect::None
    }

    fn on_release_key(&mut self, key: Key) -> Effect {
        match key {
            Key::Up => self.session.releases.previous(),
            Key::Down => self.session.releases.next(),
            Key::Esc => self.enter(Stage::SelectingSource),
            Key::Char('s') => self.enter(Stage::ConfirmingSkipMetadata),
            Key::Enter => {
                let Some(release) = self.session.releases.selected().cloned()
                else {
                    return Effect::None;
                };
                let release_id = match release.release_info() {
                    Ok(info) => info.id.clone(),
                    Err(err) => return self.fail(err.into()),
                };
                self.session.selected_release = Some(release);
                self.enter(Stage::FetchingTracks);
                return self.dispatch(Command::FetchTracks { release_id });
            }
            _ => {}
        }
        Effect::None
    }

    fn on_track_key(&mut self, key: Key) -> Effect {
        match key {
            Key::Up => self.session.tracks.previous(),
            Key::Down => self.session.tracks.next(),
            Key::Esc => self.enter(Stage::SelectingRelease),
            Key::Enter => {
                let (Some(release), Some(track)) = (
                    self.session.selected_release.clone(),
                    self.session.tracks.selected().cloned(),
                ) else {
                    return Effect::None;
                };
                match TagEditor::prefill(&release, &track) {
                    Ok(editor) => {
                        self.session.selected_track = Some(track);
                        self.session.editor = Some(editor);
                        self.enter(Stage::EditingTags);
                    }
                    Err(err) => return self.fail(err.into()),
                }
            }
            _ => {}
        }
        Effect::None
    }

    fn on_editor_key(&mut self, key: Key) -> Effect {
        if key == Key::Esc {
            self.enter(Stage::SelectingTrack);
            return Effect::None;
        }
        let Some(editor) = self.session.editor.as_mut() else {
            return Effect::None;
        };
        match key {
            Key::Up => editor.focus_previous(),
            Key::Down => editor.focus_next(),
            Key::Char(ch) => editor.insert(ch),
            Key::Backspace => editor.backspace(),
            Key::Enter => {
                if let EditorStep::Finalized(tags) = editor.submit() {
                    let Some(release) = self.session.selected_release.clone()
                    else {
                        return Effect::None;
                    };
                    return self.start_download(DownloadMode::Tagged {
                        release,
                        tags,
                    });
                }
            }
            Key::Esc => {}
        }
        Effect::None
    }

    fn on_skip_key(&mut self, key: Key) -> Effect {
        match key {
            Key::Enter | Key::Char('y') | Key::Char('Y') => {
                self.start_download(DownloadMode::Tagless)
            }
            Key::Esc | Key::Char('n') | Key::Char('N') => {
                self.enter(Stage::SelectingSource);
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn start_download(&mut self, mode: DownloadMode) -> Effect {
        let (Some(tools), Some(source)) =
            (self.tools.clone(), self.session.selected_video.clone())
        else {
            return Effect::None;
        };
        self.enter(Stage::Downloading);
        self.dispatch(Command::Download(DownloadPlan {
            tools,
            source,
            mode,
        }))
    }

    fn handle_completion(&mut self, completion: Completion) -> Effect {
        if self.session.in_flight != Some(completion.kind()) {
            debug!(
                kind = ?completion.kind(),
                stage = ?self.session.stage,
                "ignoring completion nobody is waiting for"
            );
            return Effect::None;
        }
        self.session.in_flight = None;

        match completion {
            Completion::Dependencies(result) => match result {
                Ok(tools) => {
                    self.tools = Some(tools);
                    self.enter(Stage::AwaitingQuery);
                    Effect::None
                }
                Err(err) => self.fail(err),
            },
            Completion::UrlResolved(result) => match result {
                Ok(video) => {
                    let query = video.metadata_query();
                    self.session.videos =
                        Picker::new(vec![Arc::clone(&video)]);
                    self.session.selected_video = Some(video);
                    self.enter(Stage::SearchingReleases);
                    self.dispatch(Command::SearchReleases { query })
                }
                Err(err) => self.fail(err),
            },
            Completion::SearchFinished(result) => match result {
                Ok(SearchResults { videos, releases }) => {
                    if videos.is_empty() {
                        return self.fail(WorkflowError::EmptyResult(
                            NO_SOURCES_MESSAGE.to_string(),
                        ));
                    }
                    self.session.videos = Picker::new(videos);
                    self.session.suggested_releases = releases;
                    self.enter(Stage::SelectingSource);
                    Effect::None
                }
                Err(err) => self.fail(err),
            },
            Completion::ReleasesFound(result) => match result {
                Ok(releases) if releases.is_empty() => {
                    self.enter(Stage::ConfirmingSkipMetadata);
                    Effect::None
                }
                Ok(releases) => {
                    self.session.releases = Picker::new(releases);
                    self.enter(Stage::SelectingRelease);
                    Effect::None
                }
                Err(err) => self.fail(err),
            },
            Completion::TracksFetched(result) => match result {
                Ok(tracks) if tracks.is_empty() => self.fail(
                    WorkflowError::EmptyResult(NO_TRACKS_MESSAGE.to_string()),
                ),
                Ok(tracks) => {
                    self.session.tracks = Picker::new(tracks);
                    self.enter(Stage::SelectingTrack);
                    Effect::None
                }
                Err(err) => self.fail(err),
            },
            Completion::DownloadFinished(result) => match result {
                Ok(report) => {
                    self.session.report = Some(report);
                    self.enter(Stage::ShowingSuccess);
                    Effect::None
                }
                Err(err) => self.fail(err),
            },
        }
    }

    fn dispatch(&mut self, command: Command) -> Effect {
        debug!(kind = ?command.kind(), "dispatching command");
        self.session.in_flight = Some(command.kind());
        Effect::Dispatch(command)
    }

    fn enter(&mut self, stage: Stage) {
        debug!(from = ?self.session.stage, to = ?stage, "stage transition");
        self.session.stage = stage;
    }

    fn fail(&mut self, error: WorkflowError) -> Effect {
        warn!(
            stage = ?self.session.stage,
            error = %error,
            "workflow attempt failed"
        );
        self.session.error = Some(error);
        self.session.in_flight = None;
        self.enter(Stage::ShowingError);
        Effect::None
    }

    /// Start over with a fresh session, keeping only the tool locations
    /// and the terminal size.
    fn reset(&mut self) {
        debug!("resetting workflow session");
        self.session = Session::default();
    }
}
