use std::io;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};

use crate::confetti::Confetti;
use crate::game::Screen;
use crate::play::PlayScreen;
use crate::tile::{Symbol, Tile, Visibility};

/// What the controller hands the renderer each frame.  Borrowed, never
/// stored: the controller stays the only owner of screen state.
pub struct View<'a> {
    pub screen: &'a Screen,
    pub dark_mode: bool,
    pub show_help: bool,
}

/// Trait that abstracts the rendering layer.
///
/// `TuiRenderer` draws to a real terminal; tests use a recorder.
pub trait Renderer {
    /// Draw one frame.
    fn render(&mut self, view: &View<'_>) -> io::Result<()>;
    /// Kick off the match celebration.  Purely cosmetic.
    fn celebrate(&mut self);
    /// Advance running animations by one frame.
    fn animate(&mut self);
    /// Board index of the tile drawn at a terminal cell, if any.
    fn tile_at(&self, column: u16, row: u16) -> Option<usize>;
}

// ---------------------------------------------------------------------------
// Tile view
// ---------------------------------------------------------------------------

/// The face a tile shows, derived from its visibility alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFace {
    /// Face down.  The only face that answers a click.
    Back,
    Front(Symbol),
    Solved(Symbol),
}

impl TileFace {
    pub fn accepts_flip(self) -> bool {
        matches!(self, TileFace::Back)
    }
}

pub fn tile_face(tile: &Tile) -> TileFace {
    match tile.visibility {
        Visibility::Hidden => TileFace::Back,
        Visibility::Revealed => TileFace::Front(tile.symbol),
        Visibility::Matched => TileFace::Solved(tile.symbol),
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Theme {
    background: Color,
    panel: Color,
    text: Color,
    accent: Color,
    button: Color,
    tile_back: Color,
    tile_front: Color,
    matched: Color,
    cursor: Color,
}

impl Theme {
    fn new(dark_mode: bool) -> Self {
        if dark_mode {
            Theme {
                background: Color::Rgb(17, 24, 39),
                panel: Color::Rgb(31, 41, 55),
                text: Color::White,
                accent: Color::White,
                button: Color::Rgb(55, 65, 81),
                tile_back: Color::Rgb(192, 132, 252),
                tile_front: Color::Rgb(168, 85, 247),
                matched: Color::Rgb(147, 197, 253),
                cursor: Color::Yellow,
            }
        } else {
            Theme {
                background: Color::Rgb(243, 244, 246),
                panel: Color::Rgb(252, 231, 243),
                text: Color::Rgb(31, 41, 55),
                accent: Color::Rgb(236, 72, 153),
                button: Color::Rgb(236, 72, 153),
                tile_back: Color::Rgb(192, 132, 252),
                tile_front: Color::Rgb(168, 85, 247),
                matched: Color::Rgb(59, 130, 246),
                cursor: Color::Rgb(124, 58, 237),
            }
        }
    }

    /// The play screen uses a lilac board instead of the pink card.
    fn board_panel(self, dark_mode: bool) -> Color {
        if dark_mode {
            self.panel
        } else {
            Color::Rgb(233, 213, 255)
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

const TILE_WIDTH: u16 = 10;
const TILE_HEIGHT: u16 = 5;
const MIN_TILE_WIDTH: u16 = 5;
const MIN_TILE_HEIGHT: u16 = 3;

/// Draw a whole frame.  Returns the screen area of each tile, indexed like
/// the board, so clicks can be mapped back to tiles.
pub fn draw(frame: &mut Frame, view: &View<'_>, confetti: &Confetti) -> Vec<Rect> {
    let theme = Theme::new(view.dark_mode);
    let area = frame.area();
    frame.render_widget(
        Block::new().style(Style::new().bg(theme.background).fg(theme.text)),
        area,
    );

    let [body, footer] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let tile_rects = match view.screen {
        Screen::Start => {
            draw_start(frame, body, theme);
            Vec::new()
        }
        Screen::Play(play) => draw_play(frame, body, play, theme, view.dark_mode, confetti),
    };

    draw_footer(frame, footer, view, theme);

    if view.show_help {
        draw_help(frame, area, theme);
    }

    tile_rects
}

fn draw_start(frame: &mut Frame, area: Rect, theme: Theme) {
    let card = centered(area, 40, 14);
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .style(Style::new().bg(theme.panel).fg(theme.accent));

    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "Memory",
            Style::new().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::default(),
        Line::from(Span::styled(
            "Flip over tiles looking for pairs",
            Style::new().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::default(),
        Line::default(),
        Line::from(Span::styled(
            "      Play      ",
            Style::new()
                .bg(theme.button)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("press enter", Style::new().add_modifier(Modifier::DIM))),
    ];

    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        card,
    );
}

fn draw_play(
    frame: &mut Frame,
    area: Rect,
    play: &PlayScreen,
    theme: Theme,
    dark_mode: bool,
    confetti: &Confetti,
) -> Vec<Rect> {
    let Some(board) = play.board() else {
        return Vec::new();
    };

    let [_, tries_area, _, board_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let tries = Line::from(vec![
        Span::styled("Tries ", Style::new().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" {} ", play.tries()),
            Style::new()
                .bg(theme.board_panel(dark_mode))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("   {}/{} pairs", board.matched_count() / 2, board.len() / 2)),
    ]);
    frame.render_widget(
        Paragraph::new(tries)
            .alignment(Alignment::Center)
            .style(Style::new().fg(theme.accent)),
        tries_area,
    );

    let cols = play.columns().max(1) as u16;
    let rows = (board.len() as u16).div_ceil(cols).max(1);
    let tile_w = ((board_area.width.saturating_sub(4)) / cols).clamp(MIN_TILE_WIDTH, TILE_WIDTH);
    let tile_h = ((board_area.height.saturating_sub(2)) / rows).clamp(MIN_TILE_HEIGHT, TILE_HEIGHT);

    let panel = centered(board_area, cols * tile_w + 4, rows * tile_h + 2);
    frame.render_widget(
        Block::bordered()
            .border_type(BorderType::Rounded)
            .style(Style::new().bg(theme.board_panel(dark_mode))),
        panel,
    );

    let mut rects = Vec::with_capacity(board.len());
    for (i, tile) in board.tiles().iter().enumerate() {
        let (row, col) = (i as u16 / cols, i as u16 % cols);
        let rect = Rect::new(
            panel.x + 2 + col * tile_w,
            panel.y + 1 + row * tile_h,
            tile_w,
            tile_h,
        )
        .intersection(frame.area());
        draw_tile(frame, rect, tile, i == play.cursor(), theme);
        rects.push(rect);
    }

    if confetti.is_active() {
        draw_confetti(frame, panel, confetti);
    }

    rects
}

fn draw_tile(frame: &mut Frame, rect: Rect, tile: &Tile, has_cursor: bool, theme: Theme) {
    let border = if has_cursor {
        Style::new().fg(theme.cursor).add_modifier(Modifier::BOLD)
    } else {
        Style::new().fg(theme.text)
    };
    let border_type = if has_cursor {
        BorderType::Thick
    } else {
        BorderType::Rounded
    };
    let block = Block::bordered().border_type(border_type).border_style(border);

    let (style, lines) = match tile_face(tile) {
        TileFace::Back => (Style::new().bg(theme.tile_back), Vec::new()),
        TileFace::Front(symbol) => (
            Style::new().bg(theme.tile_front).fg(Color::White),
            symbol_lines(symbol, Style::new().fg(symbol.color()).add_modifier(Modifier::BOLD)),
        ),
        TileFace::Solved(symbol) => (
            Style::new().fg(theme.matched),
            symbol_lines(symbol, Style::new().fg(theme.matched)),
        ),
    };

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(style)
            .block(block),
        rect,
    );
}

fn symbol_lines(symbol: Symbol, style: Style) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(symbol.glyph(), style)),
        Line::from(Span::styled(symbol.name(), Style::new().add_modifier(Modifier::DIM))),
    ]
}

fn draw_confetti(frame: &mut Frame, area: Rect, confetti: &Confetti) {
    let buf = frame.buffer_mut();
    for p in confetti.particles() {
        let x = area.x + (p.x * f32::from(area.width)) as u16;
        let y = area.y + (p.y * f32::from(area.height)) as u16;
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_char(p.glyph).set_fg(p.color);
        }
    }
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &View<'_>, theme: Theme) {
    let mode = if view.dark_mode { "LightMode" } else { "DarkMode" };
    let hints = match view.screen {
        Screen::Start => "enter play · ? help · q quit",
        Screen::Play(_) => "arrows move · enter flip · b back · ? help · q quit",
    };
    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(14)]).areas(area);

    frame.render_widget(
        Paragraph::new(hints).style(Style::new().fg(theme.text).add_modifier(Modifier::DIM)),
        left,
    );
    frame.render_widget(
        Paragraph::new(format!("d {mode}"))
            .alignment(Alignment::Right)
            .style(Style::new().fg(theme.text)),
        right,
    );
}

fn draw_help(frame: &mut Frame, area: Rect, theme: Theme) {
    let popup = centered(area, 52, 15);
    let text = vec![
        Line::from(Span::styled("How to play", Style::new().add_modifier(Modifier::BOLD))),
        Line::default(),
        Line::from("Tiles hide pairs of symbols. Flip two at a time:"),
        Line::from("a pair that matches stays face up, anything else"),
        Line::from("turns back over after a moment. Clear the board"),
        Line::from("in as few tries as you can."),
        Line::default(),
        Line::from("arrows / h j k l   move"),
        Line::from("enter / space      flip (or click a tile)"),
        Line::from("d                  dark mode"),
        Line::from("b / esc            back to the start screen"),
        Line::from("q                  quit"),
    ];
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .border_type(BorderType::Double)
                    .title(" help "),
            )
            .style(Style::new().bg(theme.panel).fg(theme.text)),
        popup,
    );
}

/// A `width`×`height` rect centred in `area`, shrunk to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

// ---------------------------------------------------------------------------
// Terminal renderer
// ---------------------------------------------------------------------------

/// Full-screen ratatui renderer on the crossterm backend.
pub struct TuiRenderer {
    terminal: DefaultTerminal,
    confetti: Confetti,
    tile_rects: Vec<Rect>,
    rng: SmallRng,
}

impl TuiRenderer {
    /// Switch the terminal to raw mode on the alternate screen with mouse
    /// reporting on.  [`TuiRenderer::restore`] undoes it.
    pub fn init() -> io::Result<Self> {
        let terminal = ratatui::try_init()?;
        execute!(io::stdout(), EnableMouseCapture)?;
        Ok(TuiRenderer {
            terminal,
            confetti: Confetti::new(),
            tile_rects: Vec::new(),
            rng: SmallRng::from_os_rng(),
        })
    }

    pub fn restore(self) -> io::Result<()> {
        execute!(io::stdout(), DisableMouseCapture)?;
        ratatui::restore();
        Ok(())
    }
}

impl Renderer for TuiRenderer {
    fn render(&mut self, view: &View<'_>) -> io::Result<()> {
        let confetti = &self.confetti;
        let mut rects = Vec::new();
        self.terminal.draw(|frame| {
            rects = draw(frame, view, confetti);
        })?;
        self.tile_rects = rects;
        Ok(())
    }

    fn celebrate(&mut self) {
        self.confetti.burst(&mut self.rng);
    }

    fn animate(&mut self) {
        self.confetti.step();
    }

    fn tile_at(&self, column: u16, row: u16) -> Option<usize> {
        self.tile_rects
            .iter()
            .position(|r| r.contains(ratatui::layout::Position::new(column, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::tile::Symbol::{Die, Heart};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Duration;

    fn render_to_text(view: &View<'_>) -> (String, Vec<Rect>) {
        let mut terminal = Terminal::new(TestBackend::new(70, 32)).unwrap();
        let confetti = Confetti::new();
        let mut rects = Vec::new();
        terminal
            .draw(|frame| {
                rects = draw(frame, view, &confetti);
            })
            .unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        (text, rects)
    }

    #[test]
    fn tile_face_follows_visibility() {
        let mut tile = Tile::hidden(Heart);
        assert_eq!(tile_face(&tile), TileFace::Back);
        assert!(tile_face(&tile).accepts_flip());

        tile.visibility = Visibility::Revealed;
        assert_eq!(tile_face(&tile), TileFace::Front(Heart));
        assert!(!tile_face(&tile).accepts_flip());

        tile.visibility = Visibility::Matched;
        assert_eq!(tile_face(&tile), TileFace::Solved(Heart));
        assert!(!tile_face(&tile).accepts_flip());
    }

    #[test]
    fn start_screen_shows_title_and_mode_toggle() {
        let screen = Screen::Start;
        let view = View {
            screen: &screen,
            dark_mode: false,
            show_help: false,
        };
        let (text, rects) = render_to_text(&view);
        assert!(text.contains("Memory"));
        assert!(text.contains("Flip over tiles looking for pairs"));
        assert!(text.contains("DarkMode"));
        assert!(rects.is_empty());

        let view = View {
            dark_mode: true,
            ..view
        };
        assert!(render_to_text(&view).0.contains("LightMode"));
    }

    #[test]
    fn play_screen_lays_out_every_tile_and_the_try_count() {
        let board = Board::from_symbols(vec![Heart, Die, Die, Heart]).unwrap();
        let screen = Screen::Play(PlayScreen::with_board(1, board, 2, Duration::ZERO));
        let view = View {
            screen: &screen,
            dark_mode: false,
            show_help: false,
        };
        let (text, rects) = render_to_text(&view);

        assert!(text.contains("Tries"));
        assert_eq!(rects.len(), 4);
        // Face-down tiles never show their symbol.
        assert!(!text.contains(Heart.glyph()));
        // Tiles in the same row sit side by side without overlapping.
        assert_eq!(rects[0].y, rects[1].y);
        assert!(rects[0].right() <= rects[1].x);
        assert!(rects[0].bottom() <= rects[2].y);
    }

    #[test]
    fn help_overlay_draws_on_top() {
        let screen = Screen::Start;
        let view = View {
            screen: &screen,
            dark_mode: false,
            show_help: true,
        };
        assert!(render_to_text(&view).0.contains("How to play"));
    }
}
