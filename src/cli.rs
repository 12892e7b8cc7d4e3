use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::fields::Status;

/// Kanban board for notarial dossiers.
/// Storage defaults to <data dir>/notalist/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "notalist", version, about = "Notarial dossier board")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true, env = "NOTALIST_DB")]
    pub db: Option<PathBuf>,

    /// Directory holding the database and the session file.
    #[arg(long, global = true, env = "NOTALIST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to config file (default: `~/.config/notalist/config.toml`).
    #[arg(long, global = true, env = "NOTALIST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Board columns, comma-separated (overrides the config file).
    #[arg(long, global = true, value_enum, value_delimiter = ',')]
    pub columns: Option<Vec<Status>>,

    /// Act as this user instead of the signed-in session.
    #[arg(long, global = true, env = "NOTALIST_USER")]
    pub user: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "NOTALIST_LOG")]
    pub log_level: Option<String>,

    /// Log file (default: notalist.log in the temp directory).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
