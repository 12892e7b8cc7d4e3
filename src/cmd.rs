//! Command implementations for the CLI interface.
//!
//! Each subcommand maps onto one repository operation. Handlers print their
//! result and return errors to `main`, which reports them and exits non-zero.

use std::io::{self, BufRead, Write};

use chrono::Local;
use clap::{Args, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::auth::{AuthProvider, SessionFile};
use crate::cli::Cli;
use crate::db::{format_due_relative, parse_due_input, print_table};
use crate::error::{Error, Result};
use crate::fields::*;
use crate::repo::Repository;
use crate::store::TaskStore;
use crate::task::{NewTask, Task, TaskId, TaskPatch};
use crate::view::{group_by_status, FilterAction, Facets, Filters};

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive kanban board.
    Board,

    /// Sign in as a user.
    Login {
        /// User identifier.
        #[arg(value_name = "USER")]
        user_id: String,
    },

    /// Sign out of the current session.
    Logout,

    /// Show the signed-in user and their team.
    Whoami,

    /// Manage team membership.
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },

    /// Create a new dossier at the end of the board.
    Add {
        #[command(flatten)]
        fields: DossierFields,
        /// Column to file the dossier in (default: first board column).
        #[arg(long, value_enum)]
        status: Option<Status>,
    },

    /// List dossiers, grouped by column, with optional filters.
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print a flat JSON array instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// View a single dossier.
    View {
        /// Dossier ID.
        id: TaskId,
    },

    /// Update fields on a dossier you own.
    Update {
        /// Dossier ID.
        id: TaskId,
        #[command(flatten)]
        fields: DossierFields,
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Clear the title.
        #[arg(long)]
        clear_title: bool,
        /// Clear the file number.
        #[arg(long)]
        clear_file_number: bool,
        /// Clear the client name.
        #[arg(long)]
        clear_client: bool,
        /// Clear the notaire.
        #[arg(long)]
        clear_notaire: bool,
        /// Clear the case type.
        #[arg(long)]
        clear_type: bool,
        /// Clear the notes.
        #[arg(long)]
        clear_notes: bool,
        /// Clear the due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Move a dossier to another column.
    Move {
        /// Dossier ID.
        id: TaskId,
        /// Target column.
        #[arg(value_enum)]
        status: Status,
    },

    /// Delete a dossier you own.
    Delete {
        /// Dossier ID.
        id: TaskId,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Rewrite the board order: dossiers get the position they are listed in.
    Reorder {
        /// Dossier IDs in the desired order.
        #[arg(required = true, num_args = 1..)]
        ids: Vec<TaskId>,
    },

    /// List the values available for each filter.
    Facets,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TeamAction {
    /// Join (or switch to) a team. Dossiers you create are shared with it.
    Join {
        /// Team identifier.
        team: String,
    },
    /// Show your current team.
    Show,
}

/// Descriptive fields shared by `add` and `update`.
#[derive(Args, Debug, Default)]
pub struct DossierFields {
    /// Priority: low | medium | high | urgent.
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub file_number: Option<String>,
    /// Client name.
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub notaire: Option<String>,
    /// Case type.
    #[arg(long = "type", value_enum)]
    pub case_type: Option<CaseType>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd" or "in Nw".
    #[arg(long)]
    pub due: Option<String>,
}

/// Filter dimensions accepted by `list`.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    /// Exact client name.
    #[arg(long)]
    pub client: Option<String>,
    /// Exact notaire.
    #[arg(long)]
    pub notaire: Option<String>,
    #[arg(long = "type", value_enum)]
    pub case_type: Option<CaseType>,
    /// Case-insensitive search in type, client, title and file number.
    #[arg(long, short)]
    pub search: Option<String>,
    /// Only show this column.
    #[arg(long, value_enum)]
    pub status: Option<Status>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> Filters {
        Filters::default()
            .apply(FilterAction::SetPriority(self.priority))
            .apply(FilterAction::SetClient(self.client.clone()))
            .apply(FilterAction::SetNotaire(self.notaire.clone()))
            .apply(FilterAction::SetCaseType(self.case_type))
            .apply(FilterAction::SetSearch(self.search.clone().unwrap_or_default()))
    }
}

fn parse_due(input: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    let Some(raw) = input else {
        return Ok(None);
    };
    parse_due_input(raw, Local::now().date_naive())
        .map(Some)
        .ok_or_else(|| Error::Invalid(format!("unrecognised due date '{raw}'")))
}

/// Build a create request from CLI arguments.
pub fn new_task_from_args(fields: DossierFields, status: Option<Status>) -> Result<NewTask> {
    Ok(NewTask {
        priority: fields.priority.unwrap_or_default(),
        status,
        due_date: parse_due(fields.due.as_deref())?,
        title: fields.title,
        file_number: fields.file_number,
        client_name: fields.client,
        notaire: fields.notaire,
        case_type: fields.case_type,
        notes: fields.notes,
    })
}

/// Which optional fields `update` should clear.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClearFlags {
    pub title: bool,
    pub file_number: bool,
    pub client: bool,
    pub notaire: bool,
    pub case_type: bool,
    pub notes: bool,
    pub due: bool,
}

/// Build a partial update from CLI arguments. Clear flags win over values.
pub fn patch_from_args(fields: DossierFields, status: Option<Status>, clear: ClearFlags) -> Result<TaskPatch> {
    let set_or_clear = |value: Option<String>, clear: bool| if clear { Some(None) } else { value.map(Some) };
    Ok(TaskPatch {
        priority: fields.priority,
        status,
        due_date: if clear.due { Some(None) } else { parse_due(fields.due.as_deref())?.map(Some) },
        title: set_or_clear(fields.title, clear.title),
        file_number: set_or_clear(fields.file_number, clear.file_number),
        client_name: set_or_clear(fields.client, clear.client),
        notaire: set_or_clear(fields.notaire, clear.notaire),
        case_type: if clear.case_type { Some(None) } else { fields.case_type.map(Some) },
        notes: set_or_clear(fields.notes, clear.notes),
        order_index: None,
    })
}

/// Sign in by writing the session file.
pub fn cmd_login(session: &SessionFile, user: &str) -> Result<()> {
    let user = user.trim();
    if user.is_empty() {
        return Err(Error::Invalid("user cannot be empty".into()));
    }
    session.sign_in(user)?;
    println!("Signed in as {user}");
    Ok(())
}

/// Sign out; the board then refuses every operation until the next login.
pub fn cmd_logout(session: &SessionFile) -> Result<()> {
    session.sign_out()?;
    println!("Signed out");
    Ok(())
}

pub fn cmd_whoami<S: TaskStore, A: AuthProvider>(repo: &Repository<S, A>) -> Result<()> {
    let user = repo.caller()?;
    let team = repo.team()?;
    println!("{user} (team: {})", team.as_deref().unwrap_or("-"));
    Ok(())
}

pub fn cmd_team<S: TaskStore, A: AuthProvider>(repo: &mut Repository<S, A>, action: TeamAction) -> Result<()> {
    match action {
        TeamAction::Join { team } => {
            repo.join_team(&team)?;
            println!("Joined team {}", team.trim());
        }
        TeamAction::Show => match repo.team()? {
            Some(team) => println!("{team}"),
            None => println!("No team"),
        },
    }
    Ok(())
}

pub fn cmd_add<S: TaskStore, A: AuthProvider>(
    repo: &mut Repository<S, A>,
    fields: DossierFields,
    status: Option<Status>,
) -> Result<()> {
    let task = repo.create(new_task_from_args(fields, status)?)?;
    println!("Added dossier {} in {}", task.id, task.status.label());
    Ok(())
}

/// List dossiers per column after applying the filters.
pub fn cmd_list<S: TaskStore, A: AuthProvider>(repo: &Repository<S, A>, args: FilterArgs, json: bool) -> Result<()> {
    let tasks = repo.list()?;
    let filters = args.to_filters();
    let columns: Vec<Status> = match args.status {
        Some(status) => vec![status],
        None => repo.board().columns.clone(),
    };
    let board = group_by_status(&tasks, &filters, &columns);

    if json {
        let flat: Vec<&Task> = board.iter().flat_map(|c| c.tasks.iter().copied()).collect();
        println!("{}", serde_json::to_string_pretty(&flat).map_err(crate::error::StoreError::from)?);
        return Ok(());
    }

    for column in &board {
        println!("== {} ({})", column.status.label(), column.tasks.len());
        if column.tasks.is_empty() {
            println!("   No dossiers");
        } else {
            print_table(&column.tasks);
        }
        println!();
    }
    if filters.is_active() {
        println!("Filters active; {} of {} dossiers shown.", board.iter().map(|c| c.tasks.len()).sum::<usize>(), tasks.len());
    }
    Ok(())
}

pub fn cmd_view<S: TaskStore, A: AuthProvider>(repo: &Repository<S, A>, id: TaskId) -> Result<()> {
    let tasks = repo.list()?;
    let task = tasks.iter().find(|t| t.id == id).ok_or(Error::NotFound(id))?;
    let today = Local::now().date_naive();
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());

    println!("Dossier #{}: {}", task.id, task.display_title());
    println!("Status:       {}", task.status.label());
    println!("Priority:     {}", task.priority.label());
    println!("Type:         {}", task.case_type.map_or("-", CaseType::label));
    println!("Client:       {}", or_dash(&task.client_name));
    println!("Notaire:      {}", or_dash(&task.notaire));
    println!("File number:  {}", or_dash(&task.file_number));
    println!("Due:          {}", format_due_relative(task.due_date, today));
    println!("Owner:        {} (team {})", task.owner, task.team.as_deref().unwrap_or("-"));
    println!("Order:        {}", task.order_index);
    println!("Created:      {}", task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("Updated:      {}", task.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!();
    println!("Notes:");
    println!("{}", or_dash(&task.notes));
    Ok(())
}

pub fn cmd_update<S: TaskStore, A: AuthProvider>(
    repo: &mut Repository<S, A>,
    id: TaskId,
    fields: DossierFields,
    status: Option<Status>,
    clear: ClearFlags,
) -> Result<()> {
    let patch = patch_from_args(fields, status, clear)?;
    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }
    let task = repo.update(id, patch)?;
    println!("Updated dossier {}", task.id);
    Ok(())
}

pub fn cmd_move<S: TaskStore, A: AuthProvider>(repo: &mut Repository<S, A>, id: TaskId, status: Status) -> Result<()> {
    let task = repo.move_to(id, status)?;
    println!("Moved dossier {} to {}", task.id, task.status.label());
    Ok(())
}

pub fn cmd_delete<S: TaskStore, A: AuthProvider>(repo: &mut Repository<S, A>, id: TaskId, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Delete dossier {id}? [y/N] "))? {
        println!("Cancelled");
        return Ok(());
    }
    repo.delete(id)?;
    println!("Deleted dossier {id}");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes" | "o" | "oui"))
}

pub fn cmd_reorder<S: TaskStore, A: AuthProvider>(repo: &mut Repository<S, A>, ids: &[TaskId]) -> Result<()> {
    let report = repo.reorder(ids)?;
    println!("Reordered {} dossier(s)", report.applied.len());
    for (id, err) in &report.skipped {
        eprintln!("  skipped {id}: {err}");
    }
    if !report.is_complete() {
        eprintln!("Some positions were not written; run `notalist list` and retry.");
    }
    Ok(())
}

pub fn cmd_facets<S: TaskStore, A: AuthProvider>(repo: &Repository<S, A>) -> Result<()> {
    let facets = Facets::extract(&repo.list()?);
    let join = |values: Vec<&str>| if values.is_empty() { "-".to_string() } else { values.join(", ") };
    println!("Priorities: {}", join(facets.priorities.iter().map(|p| p.label()).collect()));
    println!("Clients:    {}", join(facets.clients.iter().map(String::as_str).collect()));
    println!("Notaires:   {}", join(facets.notaires.iter().map(String::as_str).collect()));
    println!("Types:      {}", join(facets.case_types.iter().map(|t| t.label()).collect()));
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "notalist", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_args_default_to_medium_priority() {
        let task = new_task_from_args(
            DossierFields { client: Some("Martin".into()), due: Some("2025-06-30".into()), ..Default::default() },
            None,
        )
        .unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, None);
        assert_eq!(task.client_name.as_deref(), Some("Martin"));
        assert_eq!(task.due_date, chrono::NaiveDate::from_ymd_opt(2025, 6, 30));
    }

    #[test]
    fn bad_due_date_is_invalid_input() {
        let fields = DossierFields { due: Some("soon".into()), ..Default::default() };
        assert!(matches!(new_task_from_args(fields, None), Err(Error::Invalid(_))));
    }

    #[test]
    fn clear_flags_override_values() {
        let fields = DossierFields {
            notes: Some("ignored".into()),
            notaire: Some("Me Leroy".into()),
            ..Default::default()
        };
        let clear = ClearFlags { notes: true, case_type: true, due: true, ..Default::default() };
        let patch = patch_from_args(fields, Some(Status::Done), clear).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.case_type, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.notaire, Some(Some("Me Leroy".into())));
        assert_eq!(patch.client_name, None);
        assert_eq!(patch.status, Some(Status::Done));
    }

    #[test]
    fn no_flags_make_an_empty_patch() {
        let patch = patch_from_args(DossierFields::default(), None, ClearFlags::default()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn filter_args_map_onto_filter_state() {
        let args = FilterArgs {
            priority: Some(Priority::High),
            client: Some("Martin".into()),
            search: Some("vente".into()),
            ..Default::default()
        };
        let filters = args.to_filters();
        assert_eq!(filters.priority, Some(Priority::High));
        assert_eq!(filters.client.as_deref(), Some("Martin"));
        assert_eq!(filters.notaire, None);
        assert_eq!(filters.search, "vente");
        assert!(FilterArgs::default().to_filters() == Filters::default());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
