//! Dossier data structures.
//!
//! `Task` is the stored row. `NewTask` carries the caller-supplied fields of a
//! create request and `TaskPatch` the partial field merge of an update.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Identifier of a dossier row.
pub type TaskId = u64;

/// A client case file tracked on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file_number: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub notaire: Option<String>,
    #[serde(default, rename = "type")]
    pub case_type: Option<CaseType>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Title shown on cards: the explicit title, else `[type] - client`.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        match (self.case_type, self.client_name.as_deref()) {
            (Some(kind), Some(client)) if !client.is_empty() => format!("[{}] - {}", kind.label(), client),
            (_, Some(client)) if !client.is_empty() => client.to_string(),
            _ => format!("Dossier #{}", self.id),
        }
    }

    /// Whether `field` holds a non-blank value.
    pub fn has_field(&self, field: TaskField) -> bool {
        let text = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        match field {
            TaskField::Title => text(&self.title),
            TaskField::FileNumber => text(&self.file_number),
            TaskField::ClientName => text(&self.client_name),
            TaskField::Notaire => text(&self.notaire),
            TaskField::CaseType => self.case_type.is_some(),
            TaskField::Notes => text(&self.notes),
        }
    }
}

/// Fields a caller supplies when creating a dossier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub priority: Priority,
    /// Falls back to the board's initial column when unset.
    pub status: Option<Status>,
    pub title: Option<String>,
    pub file_number: Option<String>,
    pub client_name: Option<String>,
    pub notaire: Option<String>,
    pub case_type: Option<CaseType>,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    /// Copy with free text trimmed and blank values dropped.
    pub fn normalised(self) -> Self {
        NewTask {
            title: normalise_text(self.title),
            file_number: normalise_text(self.file_number),
            client_name: normalise_text(self.client_name),
            notaire: normalise_text(self.notaire),
            notes: normalise_text(self.notes),
            ..self
        }
    }

    pub fn has_field(&self, field: TaskField) -> bool {
        match field {
            TaskField::Title => self.title.is_some(),
            TaskField::FileNumber => self.file_number.is_some(),
            TaskField::ClientName => self.client_name.is_some(),
            TaskField::Notaire => self.notaire.is_some(),
            TaskField::CaseType => self.case_type.is_some(),
            TaskField::Notes => self.notes.is_some(),
        }
    }
}

/// Partial update. `None` leaves a field untouched; for the optional text
/// fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub title: Option<Option<String>>,
    pub file_number: Option<Option<String>>,
    pub client_name: Option<Option<String>>,
    pub notaire: Option<Option<String>>,
    pub case_type: Option<Option<CaseType>>,
    pub notes: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub order_index: Option<i64>,
}

impl TaskPatch {
    /// Patch that only moves the dossier to another column.
    pub fn status(status: Status) -> Self {
        TaskPatch { status: Some(status), ..Default::default() }
    }

    /// Patch that only rewrites the ordering position.
    pub fn order_index(order_index: i64) -> Self {
        TaskPatch { order_index: Some(order_index), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Whether the patch writes `field`.
    pub fn touches(&self, field: TaskField) -> bool {
        match field {
            TaskField::Title => self.title.is_some(),
            TaskField::FileNumber => self.file_number.is_some(),
            TaskField::ClientName => self.client_name.is_some(),
            TaskField::Notaire => self.notaire.is_some(),
            TaskField::CaseType => self.case_type.is_some(),
            TaskField::Notes => self.notes.is_some(),
        }
    }

    /// Merge the present fields into `task`. Identity, ownership and
    /// timestamps are left to the caller.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(p) = self.priority {
            task.priority = p;
        }
        if let Some(s) = self.status {
            task.status = s;
        }
        if let Some(v) = &self.title {
            task.title = normalise_text(v.clone());
        }
        if let Some(v) = &self.file_number {
            task.file_number = normalise_text(v.clone());
        }
        if let Some(v) = &self.client_name {
            task.client_name = normalise_text(v.clone());
        }
        if let Some(v) = &self.notaire {
            task.notaire = normalise_text(v.clone());
        }
        if let Some(v) = self.case_type {
            task.case_type = v;
        }
        if let Some(v) = &self.notes {
            task.notes = normalise_text(v.clone());
        }
        if let Some(v) = self.due_date {
            task.due_date = v;
        }
        if let Some(i) = self.order_index {
            task.order_index = i;
        }
    }
}

/// Trim free text and treat blank input as absent.
pub fn normalise_text(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A stored row with every optional field empty.
    pub fn task(id: TaskId, owner: &str, status: Status) -> Task {
        let now = Utc::now();
        Task {
            id,
            owner: owner.to_string(),
            team: Some("etude".to_string()),
            priority: Priority::Medium,
            status,
            title: None,
            file_number: None,
            client_name: None,
            notaire: None,
            case_type: None,
            notes: None,
            due_date: None,
            order_index: id as i64,
            created_at: now,
            updated_at: now,
        }
    }
}
