mod board;
mod command;
mod confetti;
mod config;
mod game;
mod play;
mod renderer;
mod tile;
mod timer;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use config::{Cli, Settings};
use game::{Game, GameError};
use renderer::TuiRenderer;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to a file: the terminal belongs to the game.
    let _log_guard = cli
        .log_dir
        .clone()
        .or_else(config::default_log_dir)
        .and_then(|dir| init_logging(&dir));

    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            eprintln!("memory-rs: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(?settings, "settings loaded");

    match run(settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("memory-rs: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: Settings) -> Result<(), GameError> {
    let renderer = TuiRenderer::init()?;
    let mut game = Game::new(settings, renderer);
    let result = game.run();
    // Give the terminal back even if the loop failed.
    if let Err(restore_err) = game.into_renderer().restore() {
        if let Err(loop_err) = &result {
            error!("{loop_err}");
            eprintln!("memory-rs: {loop_err}");
        }
        return Err(restore_err.into());
    }
    result
}

fn init_logging(dir: &Path) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!(
            "memory-rs: file logging disabled ({}): {}",
            dir.display(),
            err
        );
        return None;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(dir, "memory-rs.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .with_ansi(false)
                .compact()
                .with_writer(file_writer),
        )
        .try_init()
        .ok();

    Some(guard)
}
