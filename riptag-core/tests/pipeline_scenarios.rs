mod support;

use std::{sync::Arc, time::Duration};

use riptag_core::{
    WorkflowError,
    workflow::{
        Command, Completion, Controller, Dispatcher, Effect, Event, Key, Stage,
    },
};
use support::{
    AudioBehaviour, FakeCatalog, FakeTools, Workspace, release, tool_paths,
    track, video,
};
use tokio::{
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
    time::timeout,
};

/// Controller plus a live dispatcher, stepped the way the UI loop steps it.
struct Harness {
    controller: Controller,
    dispatcher: Dispatcher,
    events: UnboundedReceiver<Event>,
    _workspace: Workspace,
}

impl Harness {
    async fn start(tools: FakeTools, catalog: FakeCatalog) -> Self {
        let workspace = Workspace::new();
        let services =
            workspace.services(Arc::new(tools), Arc::new(catalog));
        let (tx, rx) = unbounded_channel();
        let dispatcher =
            Dispatcher::new(tokio::runtime::Handle::current(), services, tx);
        let mut harness = Self {
            controller: Controller::new(),
            dispatcher,
            events: rx,
            _workspace: workspace,
        };
        let effect = harness.controller.start();
        harness.apply(effect).await;
        harness
    }

    /// Run dispatched commands until the controller stops asking for more.
    async fn apply(&mut self, mut effect: Effect) {
        while let Effect::Dispatch(command) = effect {
            self.dispatcher.dispatch(command);
            let event = timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("completion arrives")
                .expect("channel open");
            effect = self.controller.update(event);
        }
    }

    async fn key(&mut self, key: Key) -> Effect {
        let effect = self.controller.update(Event::Key(key));
        if let Effect::Dispatch(Command::Download(_)) = &effect {
            return effect;
        }
        self.apply(effect.clone()).await;
        effect
    }

    async fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.key(Key::Char(ch)).await;
        }
    }

    fn stage(&self) -> Stage {
        self.controller.stage()
    }
}

#[tokio::test]
async fn url_with_no_releases_downloads_without_tags() {
    let url = "https://www.youtube.com/watch?v=xyz";
    let tools = FakeTools {
        resolved: Some(video("xyz", "Rare Live Set", "Some Channel")),
        ..Default::default()
    };
    let mut harness = Harness::start(tools, FakeCatalog::default()).await;
    assert_eq!(harness.stage(), Stage::AwaitingQuery);

    harness.type_text(url).await;
    harness.key(Key::Enter).await;

    assert_eq!(harness.stage(), Stage::ConfirmingSkipMetadata);
    let session = harness.controller.session();
    assert_eq!(session.selected_video().unwrap().id, "xyz");

    let effect = harness.key(Key::Char('y')).await;
    let Effect::Dispatch(Command::Download(plan)) = effect else {
        panic!("expected a download, got {effect:?}");
    };
    assert!(plan.is_tagless());
    assert_eq!(plan.source.id, "xyz");
    assert_eq!(harness.stage(), Stage::Downloading);

    harness.apply(Effect::Dispatch(Command::Download(plan))).await;
    assert_eq!(harness.stage(), Stage::ShowingSuccess);
    let report = harness.controller.session().report().unwrap();
    assert!(report.output_path.ends_with("Rare Live Set.flac"));
    assert!(!report.cover_embedded);
}

#[tokio::test]
async fn free_text_search_through_to_a_tagged_download() {
    let tools = FakeTools {
        videos: vec![
            video("v1", "Song B", "Artist B"),
            video("v2", "Song B (Live)", "Fan Uploads"),
        ],
        ..Default::default()
    };
    let catalog = FakeCatalog {
        default_releases: vec![release("rel-1", "Album B", None)],
        tracks: vec![
            track("t1", "Song A", "1", 180_000),
            track("t2", "Song B", "2", 215_500),
            track("t3", "Song C", "3", 240_000),
        ],
        ..Default::default()
    };
    let mut harness = Harness::start(tools, catalog).await;

    harness.type_text("Song B").await;
    harness.key(Key::Enter).await;
    assert_eq!(harness.stage(), Stage::SelectingSource);
    assert_eq!(harness.controller.session().videos().items().len(), 2);
    assert_eq!(harness.controller.session().suggested_releases().len(), 1);

    harness.key(Key::Enter).await;
    assert_eq!(harness.stage(), Stage::SelectingRelease);
    assert_eq!(harness.controller.session().selected_video().unwrap().id, "v1");
    assert_eq!(harness.controller.session().releases().items().len(), 1);

    harness.key(Key::Enter).await;
    assert_eq!(harness.stage(), Stage::SelectingTrack);
    assert_eq!(harness.controller.session().tracks().items().len(), 3);

    harness.key(Key::Down).await;
    harness.key(Key::Enter).await;
    assert_eq!(harness.stage(), Stage::EditingTags);
    let chosen = harness.controller.session().selected_track().unwrap();
    assert_eq!(chosen.id, "t2");

    for _ in 0..4 {
        harness.key(Key::Enter).await;
        assert_eq!(harness.stage(), Stage::EditingTags);
    }
    let effect = harness.key(Key::Enter).await;
    let Effect::Dispatch(Command::Download(plan)) = effect else {
        panic!("expected a download, got {effect:?}");
    };
    assert!(!plan.is_tagless());
    assert_eq!(plan.source.id, "v1");
    match &plan.mode {
        riptag_core::model::DownloadMode::Tagged { release, tags } => {
            assert_eq!(release.id, "rel-1");
            assert_eq!(tags.title, "Song B");
            assert_eq!(tags.artist, "Artist B");
            assert_eq!(tags.album, "Album B");
            assert_eq!(tags.date, "2020-01-01");
            assert_eq!(tags.track_number, "2");
            assert_eq!(tags.duration_secs, 215);
        }
        riptag_core::model::DownloadMode::Tagless => unreachable!(),
    }

    harness.apply(Effect::Dispatch(Command::Download(plan))).await;
    assert_eq!(harness.stage(), Stage::ShowingSuccess);
    let report = harness.controller.session().report().unwrap();
    assert!(report.output_path.ends_with("Artist B - Song B.flac"));
}

#[tokio::test]
async fn audio_timeout_shows_an_error_then_starts_over() {
    let tools = FakeTools {
        videos: vec![video("v1", "Song B", "Artist B")],
        audio: AudioBehaviour::TimeOut,
        ..Default::default()
    };
    let mut harness = Harness::start(tools, FakeCatalog::default()).await;

    harness.type_text("Song B").await;
    harness.key(Key::Enter).await;
    harness.key(Key::Char('s')).await;
    assert_eq!(harness.stage(), Stage::ConfirmingSkipMetadata);

    let effect = harness.key(Key::Enter).await;
    harness.apply(effect).await;

    assert_eq!(harness.stage(), Stage::ShowingError);
    let error = harness.controller.session().error().unwrap();
    assert!(error.is_timeout(), "{error:?}");

    harness.key(Key::Char('x')).await;
    assert_eq!(harness.stage(), Stage::AwaitingQuery);
    let session = harness.controller.session();
    assert!(session.query().is_empty());
    assert!(session.videos().is_empty());
    assert!(session.selected_video().is_none());
    assert!(session.error().is_none());
    assert!(harness.controller.tools().is_some());
}

#[tokio::test]
async fn missing_dependency_is_shown_then_quits() {
    let tools = FakeTools {
        missing: Some("ffmpeg"),
        ..Default::default()
    };
    let mut harness = Harness::start(tools, FakeCatalog::default()).await;

    assert_eq!(harness.stage(), Stage::ShowingError);
    assert!(matches!(
        harness.controller.session().error(),
        Some(WorkflowError::DependencyMissing { tool, .. }) if tool == "ffmpeg"
    ));
    assert!(matches!(harness.key(Key::Enter).await, Effect::Quit));
}

#[tokio::test]
async fn unresolvable_url_is_an_error() {
    let mut harness =
        Harness::start(FakeTools::default(), FakeCatalog::default()).await;

    harness.type_text("https://example.com/nope").await;
    harness.key(Key::Enter).await;

    assert_eq!(harness.stage(), Stage::ShowingError);
    assert!(matches!(
        harness.controller.session().error(),
        Some(WorkflowError::ExternalTool { .. })
    ));
}

#[tokio::test]
async fn a_panicking_command_still_completes_exactly_once() {
    let workspace = Workspace::new();
    let tools = FakeTools {
        panic_on_search: true,
        ..Default::default()
    };
    let services = workspace
        .services(Arc::new(tools), Arc::new(FakeCatalog::default()));
    let (tx, mut rx) = unbounded_channel();
    let dispatcher =
        Dispatcher::new(tokio::runtime::Handle::current(), services, tx);

    dispatcher.dispatch(Command::Search {
        tools: tool_paths(),
        query: "anything".into(),
    });

    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        Event::Completed(Completion::SearchFinished(Err(err))) => {
            assert!(matches!(err, WorkflowError::ExternalTool { .. }))
        }
        other => panic!("unexpected event {other:?}"),
    }

    drop(dispatcher);
    assert!(
        timeout(Duration::from_millis(200), rx.recv())
            .await
            .unwrap()
            .is_none()
    );
}
