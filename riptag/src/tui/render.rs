use std::time::Duration;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use riptag_core::{
    model::Candidate,
    workflow::{Controller, Picker, Session, Stage, TagEditor},
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAME: Duration = Duration::from_millis(100);
/// Below this width the release suggestions panel is dropped.
const SIDE_PANEL_MIN_WIDTH: u16 = 90;

pub(super) fn render(f: &mut Frame, controller: &Controller, elapsed: Duration) {
    let stage = controller.stage();
    let session = controller.session();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    render_header(f, rows[0], stage);

    let body = rows[1];
    match stage {
        Stage::CheckingDependencies
        | Stage::FetchingUrlInfo
        | Stage::SearchingCandidates
        | Stage::SearchingReleases
        | Stage::FetchingTracks
        | Stage::Downloading => render_waiting(f, body, stage, elapsed),
        Stage::AwaitingQuery => render_query(f, body, session.query()),
        Stage::SelectingSource => {
            let wide = controller.viewport().width >= SIDE_PANEL_MIN_WIDTH;
            render_sources(f, body, session, wide)
        }
        Stage::SelectingRelease => {
            render_picker(f, body, "MusicBrainz releases", session.releases())
        }
        Stage::SelectingTrack => {
            render_picker(f, body, "Tracks", session.tracks())
        }
        Stage::EditingTags => {
            if let Some(editor) = session.editor() {
                render_editor(f, body, editor);
            }
        }
        Stage::ConfirmingSkipMetadata => render_skip(f, body, session),
        Stage::ShowingSuccess => render_success(f, body, session),
        Stage::ShowingError => render_error(f, body, session),
    }

    let help = Paragraph::new(Line::from(Span::styled(
        help_text(stage, session),
        Style::default().fg(Color::Gray),
    )))
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(help, rows[2]);
}

fn render_header(f: &mut Frame, area: Rect, stage: Stage) {
    let line = Line::from(vec![
        Span::styled(
            "riptag",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(stage_title(stage), Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_waiting(f: &mut Frame, area: Rect, stage: Stage, elapsed: Duration) {
    let frame = (elapsed.as_millis() / SPINNER_FRAME.as_millis()) as usize
        % SPINNER.len();
    let status = stage.status().unwrap_or("Working...");
    let line = Line::from(vec![
        Span::styled(SPINNER[frame], Style::default().fg(Color::Cyan)),
        Span::raw(" "),
        Span::raw(status),
    ]);
    f.render_widget(
        Paragraph::new(vec![Line::default(), line])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_query(f: &mut Frame, area: Rect, query: &str) {
    let lines = vec![
        Line::from("Search for a song, or paste a video URL:"),
        Line::default(),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::styled(query.to_string(), Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
        ]),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Query")),
        area,
    );
}

fn render_sources(f: &mut Frame, area: Rect, session: &Session, wide: bool) {
    let suggestions = session.suggested_releases();
    if !wide || suggestions.is_empty() {
        render_picker(f, area, "Sources", session.videos());
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [Constraint::Percentage(60), Constraint::Percentage(40)].as_ref(),
        )
        .split(area);
    render_picker(f, columns[0], "Sources", session.videos());

    let items: Vec<ListItem> = suggestions
        .iter()
        .map(|release| candidate_item(release))
        .collect();
    f.render_widget(
        List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("MusicBrainz matches"),
        ),
        columns[1],
    );
}

fn render_picker(f: &mut Frame, area: Rect, title: &str, picker: &Picker) {
    let items: Vec<ListItem> =
        picker.items().iter().map(|c| candidate_item(c)).collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{title} ({})", picker.items().len())),
        )
        .highlight_style(
            Style::new()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !picker.is_empty() {
        state.select(Some(picker.cursor()));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn candidate_item(candidate: &Candidate) -> ListItem<'static> {
    ListItem::new(vec![
        Line::from(Span::styled(
            candidate.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("  {}", candidate.descriptor),
            Style::default().fg(Color::DarkGray),
        )),
    ])
}

fn render_editor(f: &mut Frame, area: Rect, editor: &TagEditor) {
    let mut lines = vec![Line::default()];
    for (field, value) in editor.fields() {
        let focused = editor.is_focused(field);
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut spans = vec![
            Span::styled(format!("{:>13}: ", field.label()), label_style),
            Span::raw(value.to_string()),
        ];
        if focused {
            spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
        }
        lines.push(Line::from(spans));
    }
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Tags")),
        area,
    );
}

fn render_skip(f: &mut Frame, area: Rect, session: &Session) {
    let title = session
        .selected_video()
        .map(|video| video.title.as_str())
        .unwrap_or_default();
    let lines = vec![
        Line::from(Span::styled(
            "No metadata will be written.",
            Style::default().fg(Color::Yellow),
        )),
        Line::default(),
        Line::from(format!("Download \"{title}\" without tags?")),
    ];
    render_dialog(f, area, "Skip metadata", Color::Yellow, lines);
}

fn render_success(f: &mut Frame, area: Rect, session: &Session) {
    let Some(report) = session.report() else {
        return;
    };
    let yes_no = |embedded: bool| if embedded { "embedded" } else { "not found" };
    let lines = vec![
        Line::from(Span::styled(
            "Saved",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(report.output_path.display().to_string()),
        Line::default(),
        Line::from(format!("Cover art: {}", yes_no(report.cover_embedded))),
        Line::from(format!("Lyrics:    {}", yes_no(report.lyrics_embedded))),
    ];
    render_dialog(f, area, "Done", Color::Green, lines);
}

fn render_error(f: &mut Frame, area: Rect, session: &Session) {
    let message = session
        .error()
        .map(ToString::to_string)
        .unwrap_or_else(|| "Unknown error".to_string());
    let lines: Vec<Line> = message.lines().map(|l| Line::from(l.to_string())).collect();
    render_dialog(f, area, "Error", Color::Red, lines);
}

fn render_dialog(
    f: &mut Frame,
    area: Rect,
    title: &str,
    color: Color,
    lines: Vec<Line<'static>>,
) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(title.to_string()),
            ),
        popup,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::CheckingDependencies => "Starting up",
        Stage::AwaitingQuery => "Search",
        Stage::FetchingUrlInfo | Stage::SearchingCandidates => "Searching",
        Stage::SelectingSource => "Choose a source",
        Stage::SearchingReleases => "Matching",
        Stage::SelectingRelease => "Choose a release",
        Stage::FetchingTracks => "Loading tracks",
        Stage::SelectingTrack => "Choose a track",
        Stage::EditingTags => "Edit tags",
        Stage::ConfirmingSkipMetadata => "Skip metadata?",
        Stage::Downloading => "Downloading",
        Stage::ShowingSuccess => "Done",
        Stage::ShowingError => "Error",
    }
}

fn help_text(stage: Stage, session: &Session) -> &'static str {
    match stage {
        Stage::AwaitingQuery => "type query • Enter search • Ctrl+C quit",
        Stage::SelectingSource => {
            "↑/↓ move • Enter match metadata • s skip metadata • Esc new search • Ctrl+C quit"
        }
        Stage::SelectingRelease => {
            "↑/↓ move • Enter choose release • s skip metadata • Esc back • Ctrl+C quit"
        }
        Stage::SelectingTrack => {
            "↑/↓ move • Enter choose track • Esc back • Ctrl+C quit"
        }
        Stage::EditingTags => {
            "type to edit • ↑/↓ change field • Enter next field / download • Esc back"
        }
        Stage::ConfirmingSkipMetadata => {
            "y / Enter download without tags • n / Esc go back"
        }
        Stage::ShowingSuccess => "any key: start over • Ctrl+C quit",
        Stage::ShowingError => {
            if session
                .error()
                .is_some_and(|err| err.is_dependency_missing())
            {
                "any key: exit"
            } else {
                "any key: start over • Ctrl+C quit"
            }
        }
        _ => "please wait • Ctrl+C quit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use riptag_core::{
        WorkflowError,
        model::{AssetKind, DownloadReport, ReleaseInfo, ToolPaths},
        workflow::{Completion, Event, Key, SearchResults},
    };
    use std::sync::Arc;

    fn screen(controller: &Controller) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal
            .draw(|f| render(f, controller, Duration::ZERO))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn ready() -> Controller {
        let mut controller = Controller::new();
        controller.update(Event::Resize {
            width: 100,
            height: 24,
        });
        controller.start();
        controller.update(Event::Completed(Completion::Dependencies(Ok(
            ToolPaths {
                extractor: "/usr/bin/yt-dlp".into(),
                transcoder: "/usr/bin/ffmpeg".into(),
            },
        ))));
        controller
    }

    fn type_text(controller: &mut Controller, text: &str) {
        for ch in text.chars() {
            controller.update(Event::Key(Key::Char(ch)));
        }
    }

    #[test]
    fn dependency_check_shows_a_spinner() {
        let mut controller = Controller::new();
        controller.start();

        let text = screen(&controller);

        assert!(text.contains(SPINNER[0]));
        assert!(text.contains("Checking for yt-dlp and ffmpeg"));
    }

    #[test]
    fn query_screen_echoes_typed_text() {
        let mut controller = ready();
        type_text(&mut controller, "teardrop");

        let text = screen(&controller);

        assert!(text.contains("> teardrop"));
        assert!(text.contains("Enter search"));
    }

    #[test]
    fn source_list_shows_suggested_releases_when_wide() {
        let mut controller = ready();
        type_text(&mut controller, "teardrop");
        controller.update(Event::Key(Key::Enter));
        controller.update(Event::Completed(Completion::SearchFinished(Ok(
            SearchResults {
                videos: vec![Arc::new(Candidate::video(
                    "u7K72X4eo_s",
                    "Teardrop",
                    "Massive Attack",
                    "https://www.youtube.com/watch?v=u7K72X4eo_s",
                ))],
                releases: vec![Arc::new(Candidate::release(ReleaseInfo {
                    id: "r1".into(),
                    title: "Mezzanine".into(),
                    date: "1998".into(),
                    primary_type: "Album".into(),
                    ..Default::default()
                }))],
            },
        ))));

        let text = screen(&controller);

        assert!(text.contains("> Teardrop"));
        assert!(text.contains("Massive Attack"));
        assert!(text.contains("MusicBrainz matches"));
        assert!(text.contains("Mezzanine"));
    }

    #[test]
    fn missing_dependency_explains_and_offers_exit() {
        let mut controller = Controller::new();
        controller.start();
        controller.update(Event::Completed(Completion::Dependencies(Err(
            WorkflowError::DependencyMissing {
                tool: "ffmpeg".into(),
                hint: "install ffmpeg".into(),
            },
        ))));

        let text = screen(&controller);

        assert!(text.contains("ffmpeg"));
        assert!(text.contains("any key: exit"));
    }

    #[test]
    fn success_screen_keeps_asset_failures_out_of_sight() {
        let mut controller = ready();
        type_text(&mut controller, "teardrop");
        controller.update(Event::Key(Key::Enter));
        controller.update(Event::Completed(Completion::SearchFinished(Ok(
            SearchResults {
                videos: vec![Arc::new(Candidate::video(
                    "u7K72X4eo_s",
                    "Teardrop",
                    "Massive Attack",
                    "https://www.youtube.com/watch?v=u7K72X4eo_s",
                ))],
                releases: vec![],
            },
        ))));
        controller.update(Event::Key(Key::Char('s')));
        controller.update(Event::Key(Key::Char('y')));
        assert_eq!(controller.stage(), Stage::Downloading);
        controller.update(Event::Completed(Completion::DownloadFinished(Ok(
            DownloadReport {
                output_path: "/music/downloads/Teardrop.flac".into(),
                cover_embedded: false,
                lyrics_embedded: false,
                skipped_assets: vec![AssetKind::Cover, AssetKind::Lyrics],
            },
        ))));
        assert_eq!(controller.stage(), Stage::ShowingSuccess);

        let text = screen(&controller);

        assert!(text.contains("Saved"));
        assert!(text.contains("Teardrop.flac"));
        assert!(!text.contains("Skipped"));
        assert!(!text.contains("error"));
    }
}
