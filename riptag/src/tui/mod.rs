//! Terminal front end: lifecycle, the event loop and rendering.

mod input;
mod render;

use std::{
    io::{self, Stdout},
    sync::Once,
    time::{Duration, Instant},
};

use anyhow::Result;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{Terminal, backend::CrosstermBackend};
use riptag_core::workflow::{Controller, Dispatcher, Effect, Event};
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};
use tracing::{debug, info};

use input::{EventSource, event_source_from_env, translate};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Take over the terminal and run the wizard until the user quits.
///
/// The terminal is restored on every exit path: normal return, an error
/// from the loop, or a panic anywhere on the UI thread.
pub fn run(
    dispatcher: Dispatcher,
    completions: UnboundedReceiver<Event>,
) -> Result<()> {
    let mut source = event_source_from_env()?;
    let _guard = TerminalGuard::acquire(source.is_scripted())?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, dispatcher, completions, &mut *source)
}

/// Raw mode plus the alternate screen, undone on drop. Scripted runs never
/// touch the terminal, so their guard does nothing.
struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    fn acquire(scripted: bool) -> Result<Self> {
        if scripted {
            return Ok(Self { active: false });
        }
        install_panic_hook();
        enable_raw_mode()?;
        // Built before the screen switch so a failure there still leaves
        // raw mode.
        let guard = Self { active: true };
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            restore_terminal();
        }
    }
}

/// Best effort; safe to call more than once.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Restore before the default hook prints, or the panic message is lost on
/// the alternate screen.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
    });
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    dispatcher: Dispatcher,
    mut completions: UnboundedReceiver<Event>,
    source: &mut dyn EventSource,
) -> Result<()> {
    let started = Instant::now();
    let mut controller = Controller::new();

    let area = terminal.size()?;
    controller.update(Event::Resize {
        width: area.width,
        height: area.height,
    });
    let effect = controller.start();
    if apply(effect, &dispatcher) {
        return Ok(());
    }

    loop {
        terminal.draw(|f| render::render(f, &controller, started.elapsed()))?;

        // Completions first, one at a time, so a key pressed while a result
        // is pending lands on the state that result produced.
        loop {
            match completions.try_recv() {
                Ok(event) => {
                    let effect = controller.update(event);
                    if apply(effect, &dispatcher) {
                        return Ok(());
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(anyhow::anyhow!(
                        "background dispatcher stopped unexpectedly"
                    ));
                }
            }
        }

        // A script would otherwise spend its keys on a spinner.
        if source.is_scripted() && controller.stage().is_waiting() {
            std::thread::sleep(POLL_INTERVAL / 4);
            continue;
        }

        let Some(raw) = source.next(POLL_INTERVAL)? else {
            continue;
        };
        let Some(event) = translate(raw) else {
            continue;
        };
        let effect = controller.update(event);
        if apply(effect, &dispatcher) {
            return Ok(());
        }
    }
}

/// Returns true when the wizard should exit.
fn apply(effect: Effect, dispatcher: &Dispatcher) -> bool {
    match effect {
        Effect::None => false,
        Effect::Dispatch(command) => {
            debug!(kind = ?command.kind(), "handing command to dispatcher");
            dispatcher.dispatch(command);
            false
        }
        Effect::Quit => {
            info!("quit requested");
            true
        }
    }
}
