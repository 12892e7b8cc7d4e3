//! Configuration for the board and the ambient stack.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/notalist/config.toml`)
//! 4. Compiled defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::fields::{Status, TaskField};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Parsed but unusable values.
    #[error("invalid board configuration: {0}")]
    Board(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    board: BoardFileConfig,
    log: LogFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    columns: Option<Vec<Status>>,
    required_fields: Option<Vec<TaskField>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogFileConfig {
    level: Option<String>,
    file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Which statuses appear as columns, and which fields a dossier must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    /// Board columns, left to right. The first one receives new dossiers.
    pub columns: Vec<Status>,
    pub required_fields: Vec<TaskField>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            columns: vec![Status::InProgress, Status::Done],
            required_fields: Vec::new(),
        }
    }
}

impl BoardConfig {
    /// Column a dossier lands in when created without an explicit status.
    pub fn initial_status(&self) -> Status {
        self.columns.first().copied().unwrap_or(Status::InProgress)
    }

    pub fn has_column(&self, status: Status) -> bool {
        self.columns.contains(&status)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::Board("at least one column is required".into()));
        }
        for (i, status) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(status) {
                return Err(ConfigError::Board(format!("column '{status}' listed twice")));
            }
        }
        Ok(())
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `tasks.json` and `session.json`.
    pub data_dir: PathBuf,
    /// Explicit database file; defaults to `<data_dir>/tasks.json`.
    pub db_path: PathBuf,
    pub board: BoardConfig,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notalist");
        AppConfig {
            db_path: data_dir.join("tasks.json"),
            data_dir,
            board: BoardConfig::default(),
            log_level: "info".to_string(),
            log_file: std::env::temp_dir().join("notalist.log"),
        }
    }
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// Without it the default path is tried and a missing file is treated as
    /// empty config.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, file);
        config.board.validate()?;
        Ok(config)
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &Cli, file: ConfigFile) -> Self {
        let defaults = Self::default();
        let data_dir = cli
            .data_dir
            .clone()
            .or(file.data_dir)
            .unwrap_or(defaults.data_dir);
        let db_path = cli.db.clone().unwrap_or_else(|| data_dir.join("tasks.json"));

        AppConfig {
            db_path,
            data_dir,
            board: BoardConfig {
                columns: cli
                    .columns
                    .clone()
                    .or(file.board.columns)
                    .unwrap_or(defaults.board.columns),
                required_fields: file.board.required_fields.unwrap_or_default(),
            },
            log_level: cli
                .log_level
                .clone()
                .or(file.log.level)
                .unwrap_or(defaults.log_level),
            log_file: cli.log_file.clone().or(file.log.file).unwrap_or(defaults.log_file),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

/// Load and parse the TOML config file.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("notalist").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    /// Parse `args` without reading `NOTALIST_*` from the environment.
    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["notalist"];
        argv.extend_from_slice(args);
        argv.push("whoami");
        let matches = Cli::command()
            .mut_args(|arg| arg.env(None::<&str>))
            .get_matches_from(argv);
        Cli::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn test_cli_ignores_notalist_variables() {
        std::env::set_var("NOTALIST_LOG", "trace");
        let parsed = cli(&[]);
        std::env::remove_var("NOTALIST_LOG");
        assert_eq!(parsed.log_level, None);
        assert_eq!(parsed.db, None);
    }

    #[test]
    fn defaults_are_the_two_column_board() {
        let config = AppConfig::default();
        assert_eq!(config.board.columns, vec![Status::InProgress, Status::Done]);
        assert_eq!(config.board.initial_status(), Status::InProgress);
        assert!(config.board.required_fields.is_empty());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn toml_parsing_full() {
        let toml_str = r#"
data_dir = "/srv/notalist"

[board]
columns = ["todo", "in_progress", "done"]
required_fields = ["title", "client_name"]

[log]
level = "debug"
file = "/var/log/notalist.log"
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        let config = AppConfig::resolve(&cli(&[]), file);

        assert_eq!(config.data_dir, PathBuf::from("/srv/notalist"));
        assert_eq!(config.db_path, PathBuf::from("/srv/notalist/tasks.json"));
        assert_eq!(config.board, BoardConfig {
            columns: Status::ALL.to_vec(),
            required_fields: vec![TaskField::Title, TaskField::ClientName],
        });
        assert_eq!(config.board.initial_status(), Status::Todo);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, PathBuf::from("/var/log/notalist.log"));
    }

    #[test]
    fn cli_overrides_file() {
        let file: ConfigFile = toml::from_str("[board]\ncolumns = [\"todo\", \"done\"]\n[log]\nlevel = \"warn\"").unwrap();
        let config = AppConfig::resolve(
            &cli(&["--db", "/tmp/board.json", "--columns", "in-progress,done", "--log-level", "trace"]),
            file,
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/board.json"));
        assert_eq!(config.board.columns, vec![Status::InProgress, Status::Done]);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn board_validation_rejects_empty_and_duplicate_columns() {
        let empty = BoardConfig { columns: vec![], ..Default::default() };
        assert!(matches!(empty.validate(), Err(ConfigError::Board(_))));
        let dup = BoardConfig { columns: vec![Status::Done, Status::Done], ..Default::default() };
        assert!(matches!(dup.validate(), Err(ConfigError::Board(_))));
        assert!(BoardConfig { columns: Status::ALL.to_vec(), ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(load_config_file(Some(&missing)), Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[board]\nrequired_fields = [\"notaire\"]\n").unwrap();
        let file = load_config_file(Some(&path)).unwrap();
        assert_eq!(file.board.required_fields, Some(vec![TaskField::Notaire]));
    }
}
