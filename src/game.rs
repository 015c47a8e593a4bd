use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info};

use crate::board::BoardError;
use crate::command::{left_click, parse_key, Command, ScreenKind};
use crate::config::Settings;
use crate::play::{FlipReport, PlayScreen, PlayTask, ScreenAction};
use crate::renderer::{tile_face, Renderer, View};
use crate::timer::Scheduler;

/// Upper bound on how long the loop sleeps waiting for input, so
/// animations keep moving.
const FRAME: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum GameError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot deal a board: {0}")]
    Board(#[from] BoardError),
}

/// The screen currently on display.
#[derive(Debug)]
pub enum Screen {
    Start,
    Play(PlayScreen),
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Start => ScreenKind::Start,
            Screen::Play(_) => ScreenKind::Play,
        }
    }
}

/// The top-level controller.  Owns the active screen, the dark-mode flag
/// and the timer queue; `renderer` is injected so the engine stays
/// renderer-agnostic.
pub struct Game<R: Renderer> {
    screen: Screen,
    dark_mode: bool,
    show_help: bool,
    settings: Settings,
    renderer: R,
    timers: Scheduler<PlayTask>,
    rng: SmallRng,
    generation: u64,
    quit: bool,
}

impl<R: Renderer> Game<R> {
    pub fn new(settings: Settings, renderer: R) -> Self {
        Game {
            screen: Screen::Start,
            dark_mode: settings.dark_mode,
            show_help: false,
            settings,
            renderer,
            timers: Scheduler::new(),
            rng: SmallRng::from_os_rng(),
            generation: 0,
            quit: false,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[cfg(test)]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[cfg(test)]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    #[allow(dead_code)]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    #[allow(dead_code)]
    pub fn pending_tasks(&self) -> usize {
        self.timers.len()
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    // -------------------------------------------------------------------------
    // Event loop
    // -------------------------------------------------------------------------

    /// Run the interactive loop until the player quits.
    pub fn run(&mut self) -> Result<(), GameError> {
        info!(
            tiles = self.settings.tile_count,
            delay_ms = self.settings.reveal_delay.as_millis() as u64,
            "game loop started"
        );

        while !self.quit {
            self.tick(Instant::now());
            self.renderer.animate();
            self.render()?;

            if event::poll(self.poll_timeout(Instant::now()))? {
                let ev = event::read()?;
                self.handle_event(ev, Instant::now());
            }
        }

        info!("game loop finished");
        Ok(())
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        match self.timers.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).min(FRAME),
            None => FRAME,
        }
    }

    /// Deal the play screen's board if this is its first frame, then draw.
    pub fn render(&mut self) -> Result<(), GameError> {
        if let Screen::Play(play) = &mut self.screen {
            play.ensure_board(&mut self.rng)?;
        }

        let view = View {
            screen: &self.screen,
            dark_mode: self.dark_mode,
            show_help: self.show_help,
        };
        self.renderer.render(&view)?;
        Ok(())
    }

    pub fn handle_event(&mut self, ev: Event, now: Instant) {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(cmd) = parse_key(key, self.screen.kind()) {
                    self.handle(cmd, now);
                }
            }
            Event::Mouse(mouse) => {
                let Some((column, row)) = left_click(mouse) else {
                    return;
                };
                let Screen::Play(play) = &self.screen else {
                    return;
                };
                let Some(index) = self.renderer.tile_at(column, row) else {
                    return;
                };
                // Only a face-down tile reports a flip.
                let flippable = play
                    .board()
                    .and_then(|b| b.tile(index))
                    .is_some_and(|t| tile_face(t).accepts_flip());
                if flippable {
                    self.handle(Command::Flip(index), now);
                }
            }
            _ => {}
        }
    }

    /// Dispatch a command.
    pub fn handle(&mut self, cmd: Command, now: Instant) {
        if self.show_help && !matches!(cmd, Command::Quit) {
            self.show_help = false;
            return;
        }

        match cmd {
            Command::Quit => {
                info!("quit requested");
                self.quit = true;
            }
            Command::Help => self.show_help = true,
            Command::ToggleDarkMode => self.toggle_dark_mode(),
            Command::Start => {
                if matches!(self.screen, Screen::Start) {
                    self.start_game();
                }
            }
            Command::Abandon => {
                if matches!(self.screen, Screen::Play(_)) {
                    info!("board abandoned");
                    self.end_game();
                }
            }
            Command::Flip(index) => {
                if let Screen::Play(play) = &mut self.screen {
                    play.set_cursor(index);
                }
                self.flip(now, |play, now, timers| play.flip(index, now, timers));
            }
            Command::FlipAtCursor => {
                self.flip(now, |play, now, timers| play.flip_at_cursor(now, timers));
            }
            Command::MoveCursor(dir) => {
                if let Screen::Play(play) = &mut self.screen {
                    play.move_cursor(dir);
                }
            }
        }
    }

    fn flip<F>(&mut self, now: Instant, f: F)
    where
        F: FnOnce(&mut PlayScreen, Instant, &mut Scheduler<PlayTask>) -> FlipReport,
    {
        let Screen::Play(play) = &mut self.screen else {
            return;
        };
        let report = f(play, now, &mut self.timers);
        if report.celebrate {
            self.renderer.celebrate();
        }
    }

    /// Fire every timer that is due and act on what the screen asks for.
    pub fn tick(&mut self, now: Instant) {
        let mut end = false;

        for task in self.timers.drain_due(now) {
            match &mut self.screen {
                Screen::Play(play) => {
                    if play.on_task(task, now, &mut self.timers) == Some(ScreenAction::EndGame) {
                        end = true;
                    }
                }
                Screen::Start => debug!(?task, "timer fired with no board on screen"),
            }
        }

        if end {
            self.end_game();
        }
    }

    // -------------------------------------------------------------------------
    // Screen transitions
    // -------------------------------------------------------------------------

    /// Start screen → play screen.  The board is dealt on the first render.
    /// With `--seed` the first game deals from the seed itself and each
    /// later game from the next seed up.
    pub fn start_game(&mut self) {
        self.generation += 1;
        let seed = self
            .settings
            .seed
            .map(|seed| seed.wrapping_add(self.generation - 1));
        self.screen = Screen::Play(
            PlayScreen::new(
                self.generation,
                self.settings.tile_count,
                self.settings.columns,
                self.settings.reveal_delay,
            )
            .with_seed(seed),
        );
        info!(generation = self.generation, "game started");
    }

    /// Play screen → start screen.  The board goes with the play screen and
    /// any pending timers are cancelled.
    pub fn end_game(&mut self) {
        if let Screen::Play(play) = &self.screen {
            info!(
                generation = play.generation(),
                tries = play.tries(),
                "game ended"
            );
        }
        self.timers.cancel_all();
        self.screen = Screen::Start;
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
        debug!(dark_mode = self.dark_mode, "dark mode toggled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::tile::Symbol;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

    const DELAY: Duration = Duration::from_millis(1000);

    /// Counts calls instead of drawing.  `tile_at` maps column `n` to tile `n`.
    #[derive(Default)]
    struct Recorder {
        frames: usize,
        celebrations: usize,
    }

    impl Renderer for Recorder {
        fn render(&mut self, _view: &View<'_>) -> io::Result<()> {
            self.frames += 1;
            Ok(())
        }

        fn celebrate(&mut self) {
            self.celebrations += 1;
        }

        fn animate(&mut self) {}

        fn tile_at(&self, column: u16, _row: u16) -> Option<usize> {
            Some(column as usize)
        }
    }

    fn game(tiles: usize) -> Game<Recorder> {
        let settings = Settings {
            tile_count: tiles,
            columns: 2,
            reveal_delay: DELAY,
            dark_mode: false,
            seed: Some(11),
        };
        Game::new(settings, Recorder::default())
    }

    fn play(game: &Game<Recorder>) -> &PlayScreen {
        match game.screen() {
            Screen::Play(play) => play,
            Screen::Start => panic!("expected the play screen"),
        }
    }

    /// Board indices grouped into pairs of equal symbols.
    fn pairs(game: &Game<Recorder>) -> Vec<(usize, usize)> {
        let tiles = play(game).board().unwrap().tiles();
        let mut out = Vec::new();
        for symbol in Symbol::PALETTE {
            let idx: Vec<usize> = tiles
                .iter()
                .enumerate()
                .filter(|(_, t)| t.symbol == symbol)
                .map(|(i, _)| i)
                .collect();
            if let [a, b] = idx.as_slice() {
                out.push((*a, *b));
            }
        }
        out
    }

    #[test]
    fn board_is_dealt_on_first_render() {
        let mut game = game(4);
        game.handle(Command::Start, Instant::now());
        assert!(play(&game).board().is_none());

        game.render().unwrap();
        let dealt = play(&game).board().unwrap().clone();
        game.render().unwrap();
        assert_eq!(play(&game).board().unwrap(), &dealt);
        assert_eq!(game.renderer.frames, 2);
    }

    #[test]
    fn solving_the_board_returns_to_start() {
        let mut now = Instant::now();
        let mut game = game(4);
        game.start_game();
        game.render().unwrap();

        for (a, b) in pairs(&game) {
            game.handle(Command::Flip(a), now);
            game.handle(Command::Flip(b), now);
            now += DELAY;
            game.tick(now);
        }
        assert_eq!(game.renderer.celebrations, 2);
        assert_eq!(play(&game).tries(), 2);
        assert!(play(&game).board().unwrap().is_complete());

        // The end notice fires on the following tick.
        game.tick(now);
        assert!(matches!(game.screen(), Screen::Start));
        assert_eq!(game.pending_tasks(), 0);
    }

    #[test]
    fn a_new_game_gets_a_fresh_board() {
        let mut game = game(8);
        game.start_game();
        game.render().unwrap();
        let first_generation = play(&game).generation();

        game.handle(Command::Abandon, Instant::now());
        assert!(matches!(game.screen(), Screen::Start));

        game.handle(Command::Start, Instant::now());
        assert!(play(&game).board().is_none());
        assert!(play(&game).generation() > first_generation);
    }

    #[test]
    fn seed_makes_deals_reproducible() {
        let mut first = game(8);
        let mut second = game(8);
        for g in [&mut first, &mut second] {
            g.start_game();
            g.render().unwrap();
        }
        let dealt = play(&first).board().unwrap().clone();
        assert_eq!(play(&second).board().unwrap(), &dealt);
        assert_eq!(dealt, Board::deal_seeded(8, 11).unwrap());

        first.end_game();
        first.start_game();
        first.render().unwrap();
        assert_eq!(
            play(&first).board().unwrap(),
            &Board::deal_seeded(8, 12).unwrap()
        );
    }

    #[test]
    fn abandoning_cancels_pending_resolution() {
        let t0 = Instant::now();
        let mut game = game(4);
        game.start_game();
        game.render().unwrap();

        let (a, b) = pairs(&game)[0];
        game.handle(Command::Flip(a), t0);
        game.handle(Command::Flip(b), t0);
        assert_eq!(game.pending_tasks(), 1);

        game.handle(Command::Abandon, t0);
        assert_eq!(game.pending_tasks(), 0);

        game.start_game();
        game.render().unwrap();
        game.tick(t0 + DELAY);
        assert_eq!(play(&game).board().unwrap().matched_count(), 0);
    }

    #[test]
    fn dark_mode_survives_screen_changes() {
        let mut game = game(4);
        assert!(!game.dark_mode());
        game.handle(Command::ToggleDarkMode, Instant::now());
        game.start_game();
        assert!(game.dark_mode());
        game.end_game();
        assert!(game.dark_mode());
    }

    #[test]
    fn keys_route_by_screen() {
        let now = Instant::now();
        let mut game = game(4);
        let enter = Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        game.handle_event(enter.clone(), now);
        assert!(matches!(game.screen(), Screen::Play(_)));
        game.render().unwrap();

        // On the play screen enter flips the tile under the cursor.
        game.handle_event(enter, now);
        assert_eq!(play(&game).board().unwrap().revealed(), vec![0]);

        game.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)), now);
        assert!(game.should_quit());
    }

    #[test]
    fn clicking_a_face_down_tile_flips_it() {
        let now = Instant::now();
        let mut game = game(4);
        game.start_game();
        game.render().unwrap();

        let click = |column| {
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row: 0,
                modifiers: KeyModifiers::NONE,
            })
        };
        game.handle_event(click(3), now);
        assert_eq!(play(&game).board().unwrap().revealed(), vec![3]);
        assert_eq!(play(&game).cursor(), 3);

        // Clicking it again is inert.
        game.handle_event(click(3), now);
        assert_eq!(play(&game).tries(), 0);
    }

    #[test]
    fn help_swallows_the_next_key() {
        let mut game = game(4);
        game.handle(Command::Help, Instant::now());
        game.handle(Command::Start, Instant::now());
        assert!(matches!(game.screen(), Screen::Start));
        game.handle(Command::Start, Instant::now());
        assert!(matches!(game.screen(), Screen::Play(_)));
    }

    #[test]
    fn odd_tile_count_fails_the_render() {
        let mut game = game(3);
        game.start_game();
        assert!(matches!(
            game.render(),
            Err(GameError::Board(BoardError::OddTileCount(3)))
        ));
    }
}
