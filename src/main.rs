//! # notalist - dossier board for notarial offices
//!
//! A kanban board for client case files ("dossiers"), usable from the command
//! line or through an interactive terminal user interface (TUI).
//!
//! ## Key Features
//!
//! - **Board columns by status**: configurable two-column (en cours / formalités
//!   postérieures) or three-column layout
//! - **Dossier metadata**: client, notaire, case type, priority, file number, due date and notes
//! - **Team sharing**: dossiers are visible to the owner's team, editable by the owner only
//! - **Filtering**: by priority, client, notaire, case type and free-text search
//! - **Drag and drop**: move cards between columns with the mouse in the TUI
//! - **Local File Storage**: a JSON file with atomic saves
//!
//! ## Quick Start
//!
//! ```bash
//! notalist login alice
//! notalist team join etude-dupont
//! notalist add --client "Martin" --notaire "Me Durand" --type vente --priority high
//! notalist list --notaire "Me Durand"
//! notalist board
//! ```
//!
//! ## Key Commands
//!
//! - `notalist board` - open the interactive board
//! - `notalist add` - create a dossier at the end of the board
//! - `notalist list` - show dossiers per column, with the board's filters
//! - `notalist move <id> <status>` - move a dossier to another column
//! - `notalist reorder <ids>...` - rewrite the board order
//!
//! Data lives in `<data dir>/notalist/` (`tasks.json` and `session.json`).
//! Settings are read from `~/.config/notalist/config.toml`; command line flags
//! and `NOTALIST_*` environment variables take precedence.

use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

pub mod auth;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod dnd;
pub mod error;
pub mod fields;
pub mod repo;
pub mod store;
pub mod task;
pub mod view;
pub mod tui {
    pub mod board;
    pub mod board_run;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod task_form;
}

use auth::{AuthProvider, FixedUser, SessionFile};
use cli::Cli;
use cmd::*;
use config::AppConfig;
use error::Result;
use repo::Repository;
use store::FileStore;

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Held until exit so buffered log lines are flushed.
    let _log_guard = init_logging(&config.log_level, &config.log_file);
    info!(db = %config.db_path.display(), columns = ?config.board.columns, "notalist starting");

    if let Err(e) = run(cli, config) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let session = SessionFile::new(config.session_path());

    // Commands that only touch the session
    match &cli.command {
        Commands::Login { user_id } => return cmd_login(&session, user_id),
        Commands::Logout => return cmd_logout(&session),
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return Ok(());
        }
        _ => {}
    }

    let auth: Box<dyn AuthProvider> = match cli.user {
        Some(user) => Box::new(FixedUser(Some(user))),
        None => Box::new(session),
    };
    let store = FileStore::new(&config.db_path);
    let mut repo = Repository::new(store, auth, config.board);

    match cli.command {
        Commands::Login { .. } | Commands::Logout | Commands::Completions { .. } => {
            unreachable!("session commands handled above")
        }

        Commands::Board => tui::board_run::run_board(repo),

        Commands::Whoami => cmd_whoami(&repo),

        Commands::Team { action } => cmd_team(&mut repo, action),

        Commands::Add { fields, status } => cmd_add(&mut repo, fields, status),

        Commands::List { filters, json } => cmd_list(&repo, filters, json),

        Commands::View { id } => cmd_view(&repo, id),

        Commands::Update {
            id, fields, status, clear_title, clear_file_number, clear_client,
            clear_notaire, clear_type, clear_notes, clear_due,
        } => {
            let clear = ClearFlags {
                title: clear_title,
                file_number: clear_file_number,
                client: clear_client,
                notaire: clear_notaire,
                case_type: clear_type,
                notes: clear_notes,
                due: clear_due,
            };
            cmd_update(&mut repo, id, fields, status, clear)
        }

        Commands::Move { id, status } => cmd_move(&mut repo, id, status),

        Commands::Delete { id, yes } => cmd_delete(&mut repo, id, yes),

        Commands::Reorder { ids } => cmd_reorder(&mut repo, &ids),

        Commands::Facets => cmd_facets(&repo),
    }
}

/// Initialise file-based logging.
///
/// Logs go to a file, never stdout, since the board owns the terminal.
/// `RUST_LOG` overrides `level`. Returns `None` if the path has no file name.
fn init_logging(level: &str, log_path: &Path) -> Option<WorkerGuard> {
    let log_dir = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = log_path.file_name()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
