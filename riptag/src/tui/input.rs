use std::{
    collections::VecDeque,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result, anyhow};
use crossterm::event::{
    self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use riptag_core::workflow::{Event, Key};

const SCRIPT_ENV: &str = "RIPTAG_TUI_SCRIPT";
const TRACE_ENV: &str = "RIPTAG_TUI_TRACE";
const SCRIPT_GRACE: Duration = Duration::from_secs(1);

/// Source of terminal events so tests and automation can drive the UI
/// without a real tty.
pub(super) trait EventSource {
    fn next(&mut self, timeout: Duration) -> Result<Option<TermEvent>>;
    fn is_scripted(&self) -> bool {
        false
    }
}

pub(super) struct CrosstermEventSource;

impl EventSource for CrosstermEventSource {
    fn next(&mut self, timeout: Duration) -> Result<Option<TermEvent>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

/// Scripted input, one token per line:
///   enter|esc|up|down|backspace|ctrl-c|type:<text>
/// Lines beginning with # and blank lines are skipped. Once the queue is
/// empty the source waits at most `SCRIPT_GRACE` for the wizard to exit,
/// then fails so an unfinished script cannot hang.
pub(super) struct ScriptEventSource {
    pending: VecDeque<TermEvent>,
    /// Set on the first poll that finds the queue empty.
    give_up_at: Option<Instant>,
    trace: Option<File>,
}

impl ScriptEventSource {
    pub(super) fn from_path(path: &Path, trace: Option<PathBuf>) -> Result<Self> {
        let contents = std::fs::read_to_string(path).with_context(|| {
            format!("read scripted input {}", path.display())
        })?;
        let mut source = Self::parse(&contents)?;
        source.trace = trace
            .map(|p| File::create(p).context("create input trace file"))
            .transpose()?;
        Ok(source)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut pending = VecDeque::new();
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let keys = script_token(raw).ok_or_else(|| {
                anyhow!("unrecognized script token at line {}: {line}", idx + 1)
            })?;
            pending.extend(keys.into_iter().map(TermEvent::Key));
        }

        Ok(Self {
            pending,
            give_up_at: None,
            trace: None,
        })
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Wait out one poll on an empty queue, or fail once the grace period
    /// is over.
    fn idle(&mut self, timeout: Duration) -> Result<Option<TermEvent>> {
        let now = Instant::now();
        let deadline = *self.give_up_at.get_or_insert(now + SCRIPT_GRACE);
        let Some(left) = deadline.checked_duration_since(now) else {
            return Err(anyhow!(
                "scripted input exhausted before the wizard exited"
            ));
        };
        std::thread::sleep(timeout.min(left));
        Ok(None)
    }
}

/// Keys produced by one script line, or `None` for an unknown token.
fn script_token(raw: &str) -> Option<Vec<KeyEvent>> {
    let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
    let keys = match raw.trim() {
        "enter" => vec![press(KeyCode::Enter)],
        "esc" => vec![press(KeyCode::Esc)],
        "up" => vec![press(KeyCode::Up)],
        "down" => vec![press(KeyCode::Down)],
        "backspace" => vec![press(KeyCode::Backspace)],
        "ctrl-c" => {
            vec![KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)]
        }
        // Untrimmed end: typed text may finish with spaces.
        _ => raw
            .trim_start()
            .strip_prefix("type:")?
            .chars()
            .map(|ch| press(KeyCode::Char(ch)))
            .collect(),
    };
    Some(keys)
}

impl EventSource for ScriptEventSource {
    fn next(&mut self, timeout: Duration) -> Result<Option<TermEvent>> {
        let Some(ev) = self.pending.pop_front() else {
            return self.idle(timeout);
        };
        if let Some(trace) = self.trace.as_mut() {
            writeln!(trace, "{ev:?}").context("write input trace")?;
        }
        Ok(Some(ev))
    }

    fn is_scripted(&self) -> bool {
        true
    }
}

pub(super) fn event_source_from_env() -> Result<Box<dyn EventSource>> {
    match std::env::var_os(SCRIPT_ENV) {
        Some(path) => {
            let trace = std::env::var_os(TRACE_ENV).map(PathBuf::from);
            Ok(Box::new(ScriptEventSource::from_path(
                Path::new(&path),
                trace,
            )?))
        }
        None => Ok(Box::new(CrosstermEventSource)),
    }
}

/// Translate a terminal event into a workflow event. Returns `None` for
/// input the wizard has no use for.
pub(super) fn translate(event: TermEvent) -> Option<Event> {
    match event {
        TermEvent::Key(key) => translate_key(key),
        TermEvent::Resize(width, height) => Some(Event::Resize { width, height }),
        _ => None,
    }
}

fn translate_key(key: KeyEvent) -> Option<Event> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
            .then_some(Event::Cancel);
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        return None;
    }
    let key = match key.code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(ch) => Key::Char(ch),
        _ => return None,
    };
    Some(Event::Key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut ScriptEventSource) -> Vec<Event> {
        let mut out = Vec::new();
        while source.remaining() > 0 {
            let ev = source.next(Duration::ZERO).unwrap().unwrap();
            out.extend(translate(ev));
        }
        out
    }

    #[test]
    fn script_tokens_become_workflow_events() {
        let mut source = ScriptEventSource::parse(
            "# pick the second hit\ntype:Song B\nenter\n\ndown\nesc\nbackspace\nup\nctrl-c\n",
        )
        .unwrap();

        let events = drain(&mut source);

        let mut expected: Vec<Event> =
            "Song B".chars().map(|ch| Event::Key(Key::Char(ch))).collect();
        expected.extend([
            Event::Key(Key::Enter),
            Event::Key(Key::Down),
            Event::Key(Key::Esc),
            Event::Key(Key::Backspace),
            Event::Key(Key::Up),
            Event::Cancel,
        ]);
        assert_eq!(events, expected);
    }

    #[test]
    fn typed_text_keeps_trailing_spaces() {
        let mut source = ScriptEventSource::parse("type:a \n").unwrap();
        assert_eq!(
            drain(&mut source),
            vec![Event::Key(Key::Char('a')), Event::Key(Key::Char(' '))]
        );
    }

    #[test]
    fn unknown_tokens_are_rejected_with_their_line() {
        let err = ScriptEventSource::parse("enter\nwiggle\n")
            .err()
            .unwrap()
            .to_string();
        assert!(err.contains("line 2"), "{err}");
        assert!(err.contains("wiggle"), "{err}");
    }

    #[test]
    fn exhausted_script_fails_instead_of_hanging() {
        let mut source = ScriptEventSource::parse("enter\n").unwrap();
        assert!(source.next(Duration::ZERO).unwrap().is_some());

        let started = Instant::now();
        let mut idle_polls = 0;
        let err = loop {
            match source.next(Duration::from_millis(50)) {
                Ok(None) => {
                    idle_polls += 1;
                    assert!(started.elapsed() < Duration::from_secs(5));
                }
                Ok(Some(ev)) => panic!("unexpected event {ev:?}"),
                Err(err) => break err,
            }
        };
        assert!(err.to_string().contains("exhausted"));
        assert!(started.elapsed() >= SCRIPT_GRACE);
        // Each idle poll sleeps for the caller's timeout, not the whole grace.
        assert!(idle_polls > 1, "{idle_polls}");
    }

    #[test]
    fn empty_polls_honour_the_timeout() {
        let mut source = ScriptEventSource::parse("# nothing\n").unwrap();

        let started = Instant::now();
        assert!(source.next(Duration::from_millis(10)).unwrap().is_none());
        assert!(started.elapsed() < SCRIPT_GRACE);
        assert!(source.give_up_at.is_some());
    }

    #[test]
    fn key_tokens_are_plain_presses() {
        let keys = script_token("  enter ").unwrap();
        assert_eq!(keys, vec![KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)]);
        assert_eq!(keys[0].kind, KeyEventKind::Press);
        assert_eq!(script_token("type:").unwrap(), Vec::new());
        assert_eq!(script_token("typo:x"), None);
    }

    #[test]
    fn control_keys_other_than_c_are_ignored() {
        let ctrl = |ch| {
            TermEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
        };
        assert_eq!(translate(ctrl('c')), Some(Event::Cancel));
        assert_eq!(translate(ctrl('s')), None);
        assert_eq!(
            translate(TermEvent::Key(KeyEvent::new(
                KeyCode::Char('S'),
                KeyModifiers::SHIFT
            ))),
            Some(Event::Key(Key::Char('S')))
        );
        assert_eq!(
            translate(TermEvent::Resize(100, 30)),
            Some(Event::Resize {
                width: 100,
                height: 30
            })
        );
        assert_eq!(translate(TermEvent::FocusGained), None);
    }
}
