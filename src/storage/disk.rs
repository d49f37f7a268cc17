use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{LanesError, Result};
use crate::model::{Board, Config};

const BOARD_FILE: &str = "board.json";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "lanes.log";

/// All file I/O goes through here. One directory holds the board, the
/// config and the TUI log.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$LANES_HOME`, then the platform data directory, then `./.lanes`.
    pub fn default_root() -> PathBuf {
        if let Some(home) = std::env::var_os("LANES_HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(home);
        }
        dirs::data_dir()
            .map(|d| d.join("lanes"))
            .unwrap_or_else(|| PathBuf::from(".lanes"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn board_path(&self) -> PathBuf {
        self.root.join(BOARD_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Read the saved board, if any. Errors on unreadable or malformed
    /// content.
    pub fn read_board(&self) -> Result<Option<Board>> {
        let path = self.board_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let mut board: Board = serde_json::from_str(&data)?;
        board.normalize();
        Ok(Some(board))
    }

    /// The saved board, or the seed board when nothing usable is on disk.
    pub fn load_board(&self) -> Board {
        match self.read_board() {
            Ok(Some(board)) => {
                debug!(path = %self.board_path().display(), cards = board.cards.len(), "board loaded");
                board
            }
            Ok(None) => {
                info!("no saved board, starting from seed");
                Board::seed()
            }
            Err(e) => {
                warn!(error = %e, path = %self.board_path().display(), "saved board unreadable, starting from seed");
                Board::seed()
            }
        }
    }

    pub fn save_board(&self, board: &Board) -> Result<()> {
        self.write_json(&self.board_path(), board)?;
        debug!(cards = board.cards.len(), "board saved");
        Ok(())
    }

    /// The saved config, or defaults when missing or malformed.
    pub fn load_config(&self) -> Config {
        let path = self.config_path();
        let Ok(data) = fs::read_to_string(&path) else {
            return Config::default();
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!(error = %e, "config unreadable, using defaults");
            Config::default()
        })
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        self.write_json(&self.config_path(), config)
    }

    /// Write the board to `lanes-YYYY-MM-DD.json` inside `dir`.
    pub fn export_board(board: &Board, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        let path = dir.join(export_file_name(date));
        write_json(&path, board)?;
        info!(path = %path.display(), "board exported");
        Ok(path)
    }

    /// Read and validate an exported board.
    pub fn import_board(path: &Path) -> Result<Board> {
        let data = fs::read_to_string(path)
            .map_err(|e| LanesError::InvalidImport(format!("{}: {e}", path.display())))?;
        let board = parse_import(&data)?;
        info!(path = %path.display(), cards = board.cards.len(), "board imported");
        Ok(board)
    }

    fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        write_json(path, value)
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("lanes-{}.json", date.format("%Y-%m-%d"))
}

/// Parse an imported document. It must be an object carrying `columns`,
/// `lists` and `cards`; anything else is rejected before touching state.
pub fn parse_import(data: &str) -> Result<Board> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| LanesError::InvalidImport(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| LanesError::InvalidImport("expected a JSON object".into()))?;
    for key in ["columns", "lists", "cards"] {
        if obj.get(key).is_none_or(Value::is_null) {
            return Err(LanesError::InvalidImport(format!("missing \"{key}\"")));
        }
    }
    let mut board: Board =
        serde_json::from_value(value).map_err(|e| LanesError::InvalidImport(e.to_string()))?;
    board.normalize();
    Ok(board)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
