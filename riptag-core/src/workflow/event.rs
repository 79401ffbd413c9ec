use super::command::Completion;

/// Keys the controller understands. The front end maps terminal input to
/// these; everything else is dropped before it reaches the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Key {
    Enter,
    Esc,
    Up,
    Down,
    Backspace,
    Char(char),
}

/// Input to [`Controller::update`](super::Controller::update).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(Key),
    /// New terminal size in cells.
    Resize {
        /// Columns.
        width: u16,
        /// Rows.
        height: u16,
    },
    /// A dispatched command finished.
    Completed(Completion),
    /// Ctrl+C: accepted in every stage.
    Cancel,
}
