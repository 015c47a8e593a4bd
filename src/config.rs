use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::board::{pair_count, BoardError, DEFAULT_TILE_COUNT};

pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_COLUMNS: usize = 4;
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("settings file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid tile count: {0}")]
    Tiles(#[from] BoardError),
    #[error("a board needs at least one pair of tiles")]
    NoTiles,
    #[error("column count must be between 1 and {max}, got {got}")]
    Columns { got: usize, max: usize },
}

/// Memory – flip tiles two at a time and find every pair.
#[derive(Debug, Default, Parser)]
#[command(name = "memory-rs", version, about)]
pub struct Cli {
    /// Number of tiles on the board (even, at most 20)
    #[arg(long, value_name = "N")]
    pub tiles: Option<usize>,

    /// How long a flipped pair stays visible before it is resolved
    #[arg(long = "delay-ms", value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Seed for reproducible deals
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start in dark mode
    #[arg(long)]
    pub dark: bool,

    /// Start in light mode, even if the settings file asks for dark
    #[arg(long, conflicts_with = "dark")]
    pub light: bool,

    /// Tiles per grid row
    #[arg(long, value_name = "N")]
    pub columns: Option<usize>,

    /// Read settings from this JSON file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for log files
    #[arg(long = "log-dir", value_name = "PATH")]
    pub log_dir: Option<PathBuf>,
}

/// Optional on-disk settings.  Every field may be left out.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub tiles: Option<usize>,
    pub delay_ms: Option<u64>,
    pub columns: Option<usize>,
    pub dark_mode: Option<bool>,
    pub seed: Option<u64>,
}

impl SettingsFile {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Like [`SettingsFile::read`], but a missing file is simply no settings.
    pub fn read_if_exists(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::read(path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything the game needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tile_count: usize,
    pub columns: usize,
    pub reveal_delay: Duration,
    pub dark_mode: bool,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tile_count: DEFAULT_TILE_COUNT,
            columns: DEFAULT_COLUMNS,
            reveal_delay: Duration::from_millis(DEFAULT_DELAY_MS),
            dark_mode: false,
            seed: None,
        }
    }
}

impl Settings {
    /// Read the settings file named on the command line (or the default
    /// one, if it exists) and apply the flags on top.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => SettingsFile::read(path)?,
            None => match default_settings_path() {
                Some(path) => {
                    debug!(path = %path.display(), "looking for settings file");
                    SettingsFile::read_if_exists(&path)?
                }
                None => SettingsFile::default(),
            },
        };
        Self::resolve(&file, cli)
    }

    /// Defaults, then the file, then the flags.
    pub fn resolve(file: &SettingsFile, cli: &Cli) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let tile_count = cli.tiles.or(file.tiles).unwrap_or(defaults.tile_count);
        let columns = cli.columns.or(file.columns).unwrap_or(defaults.columns);
        let delay_ms = cli.delay_ms.or(file.delay_ms).unwrap_or(DEFAULT_DELAY_MS);
        let dark_mode = if cli.dark {
            true
        } else if cli.light {
            false
        } else {
            file.dark_mode.unwrap_or(defaults.dark_mode)
        };
        let seed = cli.seed.or(file.seed);

        if tile_count == 0 {
            return Err(ConfigError::NoTiles);
        }
        pair_count(tile_count)?;
        if columns == 0 || columns > tile_count {
            return Err(ConfigError::Columns {
                got: columns,
                max: tile_count,
            });
        }

        Ok(Settings {
            tile_count,
            columns,
            reveal_delay: Duration::from_millis(delay_ms),
            dark_mode,
            seed,
        })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "memory-rs", "memory-rs")
}

/// `<config dir>/memory-rs/settings.json` on this platform.
pub fn default_settings_path() -> Option<PathBuf> {
    Some(project_dirs()?.config_dir().join(SETTINGS_FILE))
}

/// Where log files go unless `--log-dir` says otherwise.
pub fn default_log_dir() -> Option<PathBuf> {
    Some(project_dirs()?.data_local_dir().join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["memory-rs"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_when_nothing_is_given() {
        let settings = Settings::resolve(&SettingsFile::default(), &cli(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.tile_count, 16);
        assert_eq!(settings.reveal_delay, Duration::from_millis(1000));
    }

    #[test]
    fn flags_override_file_which_overrides_defaults() {
        let file = SettingsFile::parse(
            r#"{ "tiles": 12, "delay_ms": 400, "dark_mode": true, "seed": 5 }"#,
            Path::new("settings.json"),
        )
        .unwrap();

        let settings = Settings::resolve(&file, &cli(&["--tiles", "8", "--columns", "2"])).unwrap();
        assert_eq!(settings.tile_count, 8);
        assert_eq!(settings.columns, 2);
        assert_eq!(settings.reveal_delay, Duration::from_millis(400));
        assert!(settings.dark_mode);
        assert_eq!(settings.seed, Some(5));
    }

    #[test]
    fn light_flag_overrides_dark_file() {
        let file = SettingsFile::parse(r#"{ "dark_mode": true }"#, Path::new("s.json")).unwrap();
        assert!(Settings::resolve(&file, &cli(&[])).unwrap().dark_mode);
        assert!(!Settings::resolve(&file, &cli(&["--light"])).unwrap().dark_mode);

        let file = SettingsFile::parse(r#"{ "dark_mode": false }"#, Path::new("s.json")).unwrap();
        assert!(Settings::resolve(&file, &cli(&["--dark"])).unwrap().dark_mode);

        assert!(Cli::try_parse_from(["memory-rs", "--dark", "--light"]).is_err());
    }

    #[test]
    fn odd_and_oversized_boards_are_rejected() {
        let file = SettingsFile::default();
        assert!(matches!(
            Settings::resolve(&file, &cli(&["--tiles", "7"])),
            Err(ConfigError::Tiles(BoardError::OddTileCount(7)))
        ));
        assert!(matches!(
            Settings::resolve(&file, &cli(&["--tiles", "24"])),
            Err(ConfigError::Tiles(BoardError::PaletteExhausted { .. }))
        ));
        assert!(matches!(
            Settings::resolve(&file, &cli(&["--tiles", "0"])),
            Err(ConfigError::NoTiles)
        ));
    }

    #[test]
    fn column_count_must_fit_the_board() {
        let file = SettingsFile::default();
        assert!(matches!(
            Settings::resolve(&file, &cli(&["--tiles", "4", "--columns", "6"])),
            Err(ConfigError::Columns { got: 6, max: 4 })
        ));
        assert!(matches!(
            Settings::resolve(&file, &cli(&["--columns", "0"])),
            Err(ConfigError::Columns { got: 0, .. })
        ));
    }

    #[test]
    fn unknown_settings_keys_are_an_error() {
        let err = SettingsFile::parse(r#"{ "tile": 12 }"#, Path::new("s.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_settings_file_is_not_an_error() {
        let path = std::env::temp_dir().join("memory-rs-no-such-settings.json");
        assert_eq!(SettingsFile::read_if_exists(&path).unwrap(), SettingsFile::default());
        assert!(matches!(SettingsFile::read(&path), Err(ConfigError::Read { .. })));
    }
}
