//! The interactive pipeline: controller, tag editor and the dispatcher that
//! turns controller commands into background work.

mod command;
mod controller;
mod dispatcher;
mod editor;
mod event;

pub use command::{Command, CommandKind, Completion, SearchResults};
pub use controller::{Controller, Effect, Picker, Session, Stage, Viewport};
pub use dispatcher::{Dispatcher, Services, execute};
pub use editor::{EditorStep, TagEditor, TagField};
pub use event::{Event, Key};
