use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Which screen input is being read for.  The same key can mean different
/// things on each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Start,
    Play,
}

/// All commands a player can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Leave the start screen and deal a board.
    Start,
    /// Flip the tile at a board index (mouse click).
    Flip(usize),
    /// Flip the tile under the cursor.
    FlipAtCursor,
    MoveCursor(Direction),
    ToggleDarkMode,
    /// Give up on the current board and return to the start screen.
    Abandon,
    /// Show or hide the help overlay.
    Help,
    Quit,
}

/// Map a key press to a command.
///
/// Key reference (case-insensitive):
/// ```text
/// start:  enter | space | p   play
///         d                   dark mode
///         ? | h               help
///         q | esc             quit
/// play:   arrows | h j k l    move cursor
///         enter | space       flip tile under cursor
///         d                   dark mode
///         ?                   help
///         b | esc             back to start
///         q                   quit
/// ```
pub fn parse_key(key: KeyEvent, screen: ScreenKind) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    let code = match key.code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    };

    match screen {
        ScreenKind::Start => match code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('p') => Some(Command::Start),
            KeyCode::Char('d') => Some(Command::ToggleDarkMode),
            KeyCode::Char('?') | KeyCode::Char('h') => Some(Command::Help),
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        },
        ScreenKind::Play => match code {
            KeyCode::Up | KeyCode::Char('k') => Some(Command::MoveCursor(Direction::Up)),
            KeyCode::Down | KeyCode::Char('j') => Some(Command::MoveCursor(Direction::Down)),
            KeyCode::Left | KeyCode::Char('h') => Some(Command::MoveCursor(Direction::Left)),
            KeyCode::Right | KeyCode::Char('l') => Some(Command::MoveCursor(Direction::Right)),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::FlipAtCursor),
            KeyCode::Char('d') => Some(Command::ToggleDarkMode),
            KeyCode::Char('?') => Some(Command::Help),
            KeyCode::Char('b') | KeyCode::Esc => Some(Command::Abandon),
            KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        },
    }
}

/// Terminal cell of a left click, if the event is one.
pub fn left_click(event: MouseEvent) -> Option<(u16, u16)> {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some((event.column, event.row)),
        _ => None,
    }
}
