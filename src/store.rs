//! Persistent store collaborator.
//!
//! The repository talks to storage only through [`TaskStore`]: a table keyed
//! by id with team lookups. Authorization is not the store's concern; it
//! executes whatever single-row operation it is asked to.

use std::path::PathBuf;

use crate::db::Database;
use crate::error::StoreError;
use crate::fields::Status;
use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// A row ready for insertion; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub owner: String,
    pub team: Option<String>,
    pub status: Status,
    pub order_index: i64,
    pub fields: NewTask,
}

/// Single-row operations over the dossier and team membership tables.
pub trait TaskStore {
    /// Every row, in storage order.
    fn tasks(&self) -> Result<Vec<Task>, StoreError>;

    fn find(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Largest `order_index` in the table, `None` when empty.
    fn max_order_index(&self) -> Result<Option<i64>, StoreError>;

    fn insert(&mut self, draft: TaskDraft) -> Result<Task, StoreError>;

    /// Merge `patch` into the row and bump `updated_at`. `None` if absent.
    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, StoreError>;

    /// Remove the row. `false` if it was not there.
    fn delete(&mut self, id: TaskId) -> Result<bool, StoreError>;

    fn team_of(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    fn join_team(&mut self, user_id: &str, team_id: &str) -> Result<(), StoreError>;
}

/// JSON file backed store. Every call re-reads the file so separate
/// processes working on the same board observe each other's writes.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    fn read<T>(&self, f: impl FnOnce(&Database) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let db = Database::load(&self.path)?;
        f(&db)
    }

    /// Load, mutate, and write back. The file is left untouched when `f` fails.
    fn write<T>(&mut self, f: impl FnOnce(&mut Database) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut db = Database::load(&self.path)?;
        let out = f(&mut db)?;
        db.save(&self.path)?;
        Ok(out)
    }
}

impl TaskStore for FileStore {
    fn tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.read(|db| db.tasks())
    }

    fn find(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.read(|db| db.find(id))
    }

    fn max_order_index(&self) -> Result<Option<i64>, StoreError> {
        self.read(|db| db.max_order_index())
    }

    fn insert(&mut self, draft: TaskDraft) -> Result<Task, StoreError> {
        self.write(|db| db.insert(draft))
    }

    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        self.write(|db| db.update(id, patch))
    }

    fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        self.write(|db| db.delete(id))
    }

    fn team_of(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        self.read(|db| db.team_of(user_id))
    }

    fn join_team(&mut self, user_id: &str, team_id: &str) -> Result<(), StoreError> {
        self.write(|db| db.join_team(user_id, team_id))
    }
}
