//! In-memory tables and JSON persistence, plus display helpers for the CLI.
//!
//! `Database` holds the dossier table and the team membership table. It is
//! the in-memory store used directly by tests and wrapped by
//! [`FileStore`](crate::store::FileStore) for on-disk persistence.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{TaskDraft, TaskStore};
use crate::task::{Task, TaskId, TaskPatch};

/// Membership row linking a user to the team that shares their dossiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub team_id: String,
}

/// In-memory database for dossiers and team membership.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    /// Next id to hand out. Ids are never reused after a delete.
    #[serde(default)]
    pub next_id: TaskId,
}

impl Database {
    /// Load database from JSON file, starting empty if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let buf = match fs::read_to_string(path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Database::default()),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_str(&buf).map_err(|source| StoreError::Decode { path: path.to_path_buf(), source })
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        f.write_all(data.as_bytes()).map_err(|e| StoreError::io(&tmp, e))?;
        f.flush().map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    /// Allocate the next dossier id.
    fn allocate_id(&mut self) -> TaskId {
        let floor = self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let id = self.next_id.max(floor);
        self.next_id = id + 1;
        id
    }

    /// Get a task by ID.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

impl TaskStore for Database {
    fn tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.clone())
    }

    fn find(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.get(id).cloned())
    }

    fn max_order_index(&self) -> Result<Option<i64>, StoreError> {
        Ok(self.tasks.iter().map(|t| t.order_index).max())
    }

    fn insert(&mut self, draft: TaskDraft) -> Result<Task, StoreError> {
        let now = Utc::now();
        let fields = draft.fields;
        let task = Task {
            id: self.allocate_id(),
            owner: draft.owner,
            team: draft.team,
            priority: fields.priority,
            status: draft.status,
            title: fields.title,
            file_number: fields.file_number,
            client_name: fields.client_name,
            notaire: fields.notaire,
            case_type: fields.case_type,
            notes: fields.notes,
            due_date: fields.due_date,
            order_index: draft.order_index,
            created_at: now,
            updated_at: now,
        };
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        let Some(task) = self.get_mut(id) else {
            return Ok(None);
        };
        patch.apply_to(task);
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        Ok(self.tasks.len() != before)
    }

    fn team_of(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .team_members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.team_id.clone()))
    }

    fn join_team(&mut self, user_id: &str, team_id: &str) -> Result<(), StoreError> {
        match self.team_members.iter_mut().find(|m| m.user_id == user_id) {
            Some(member) => member.team_id = team_id.to_string(),
            None => self.team_members.push(TeamMember {
                user_id: user_id.to_string(),
                team_id: team_id.to_string(),
            }),
        }
        Ok(())
    }
}

/// Parse a due date: "today", "tomorrow", "in 3d", "in 2w" or YYYY-MM-DD.
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            return nd.trim().parse::<i64>().ok().map(|days| today + Duration::days(days));
        }
        if let Some(nw) = rest.strip_suffix('w') {
            return nw.trim().parse::<i64>().ok().map(|weeks| today + Duration::weeks(weeks));
        }
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {delta}d")
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Print dossiers in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<5} {:<6} {:<12} {:<8} {:<10} {:<16} {:<14} {}",
        "ID", "Order", "Status", "Pri", "Due", "Client", "Notaire", "Dossier"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        println!(
            "{:<5} {:<6} {:<12} {:<8} {:<10} {:<16} {:<14} {}",
            t.id,
            t.order_index,
            t.status.as_str(),
            t.priority.label(),
            format_due_relative(t.due_date, today),
            truncate(t.client_name.as_deref().unwrap_or("-"), 16),
            truncate(t.notaire.as_deref().unwrap_or("-"), 14),
            t.display_title(),
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
