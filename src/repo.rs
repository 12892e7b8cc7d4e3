//! Authenticated dossier operations.
//!
//! Every operation resolves the caller first and fails with
//! [`Error::Unauthenticated`] when nobody is signed in. Mutations go through
//! a single ownership guard, [`Repository::authorize_owned`]. Consumers are
//! expected to call [`Repository::list`] again after any mutation instead of
//! patching their copy of the list.

use tracing::{debug, info, warn};

use crate::auth::AuthProvider;
use crate::config::BoardConfig;
use crate::error::{Error, Result};
use crate::fields::Status;
use crate::store::{TaskDraft, TaskStore};
use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Outcome of a reorder batch. Ids in `skipped` kept their old position;
/// re-fetch and retry to converge.
#[derive(Debug, Default)]
pub struct ReorderReport {
    pub applied: Vec<TaskId>,
    pub skipped: Vec<(TaskId, Error)>,
}

impl ReorderReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Dossier operations bound to a store, an identity source and a board layout.
pub struct Repository<S, A> {
    store: S,
    auth: A,
    board: BoardConfig,
}

impl<S: TaskStore, A: AuthProvider> Repository<S, A> {
    pub fn new(store: S, auth: A, board: BoardConfig) -> Self {
        Repository { store, auth, board }
    }

    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The signed-in user, or `Unauthenticated`.
    pub fn caller(&self) -> Result<String> {
        self.auth.current_user()?.ok_or(Error::Unauthenticated)
    }

    /// Team of the signed-in user.
    pub fn team(&self) -> Result<Option<String>> {
        let caller = self.caller()?;
        Ok(self.store.team_of(&caller)?)
    }

    /// Attach the signed-in user to `team_id`, replacing any previous team.
    pub fn join_team(&mut self, team_id: &str) -> Result<()> {
        let team_id = team_id.trim();
        if team_id.is_empty() {
            return Err(Error::Invalid("team name cannot be empty".into()));
        }
        let caller = self.caller()?;
        self.store.join_team(&caller, team_id)?;
        info!(caller = %caller, team = %team_id, "joined team");
        Ok(())
    }

    /// All dossiers visible to the caller, ascending by `order_index`.
    pub fn list(&self) -> Result<Vec<Task>> {
        let caller = self.caller()?;
        let team = self.store.team_of(&caller)?;
        let mut tasks: Vec<Task> = self
            .store
            .tasks()?
            .into_iter()
            .filter(|t| is_visible(t, &caller, team.as_deref()))
            .collect();
        tasks.sort_by_key(|t| (t.order_index, t.id));
        debug!(caller = %caller, count = tasks.len(), "listed dossiers");
        Ok(tasks)
    }

    /// Create a dossier at the end of the global order.
    pub fn create(&mut self, fields: NewTask) -> Result<Task> {
        let caller = self.caller()?;
        let team = self.store.team_of(&caller)?.ok_or(Error::NoTeam)?;
        let fields = fields.normalised();

        let status = fields.status.unwrap_or_else(|| self.board.initial_status());
        self.check_column(status)?;
        if let Some(missing) = self.board.required_fields.iter().find(|f| !fields.has_field(**f)) {
            return Err(Error::Invalid(format!("{} is required", missing.as_str())));
        }

        let order_index = self.store.max_order_index()?.unwrap_or(-1) + 1;
        let task = self.store.insert(TaskDraft {
            owner: caller.clone(),
            team: Some(team),
            status,
            order_index,
            fields,
        })?;
        info!(caller = %caller, task_id = task.id, order_index, "created dossier");
        Ok(task)
    }

    /// Merge `patch` into a dossier the caller owns.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        let caller = self.caller()?;
        let current = self.authorize_owned(&caller, id)?;
        if let Some(status) = patch.status {
            self.check_column(status)?;
        }
        let mut merged = current.clone();
        patch.apply_to(&mut merged);
        if let Some(missing) = self
            .board
            .required_fields
            .iter()
            .find(|f| patch.touches(**f) && !merged.has_field(**f))
        {
            return Err(Error::Invalid(format!("{} is required", missing.as_str())));
        }
        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self.store.update(id, &patch)?.ok_or(Error::NotFound(id))?;
        info!(caller = %caller, task_id = id, status = %updated.status, "updated dossier");
        Ok(updated)
    }

    /// Move a dossier to another column.
    pub fn move_to(&mut self, id: TaskId, status: Status) -> Result<Task> {
        self.update(id, TaskPatch::status(status))
    }

    /// Remove a dossier the caller owns.
    pub fn delete(&mut self, id: TaskId) -> Result<()> {
        let caller = self.caller()?;
        self.authorize_owned(&caller, id)?;
        if !self.store.delete(id)? {
            return Err(Error::NotFound(id));
        }
        info!(caller = %caller, task_id = id, "deleted dossier");
        Ok(())
    }

    /// Give each id its position in `ordered_ids` as `order_index`.
    ///
    /// Updates are independent: an id that is missing, not owned, or whose
    /// write fails is reported and the rest of the batch still runs. When an
    /// id repeats, its last position wins.
    pub fn reorder(&mut self, ordered_ids: &[TaskId]) -> Result<ReorderReport> {
        let caller = self.caller()?;
        let mut report = ReorderReport::default();
        for (position, &id) in ordered_ids.iter().enumerate() {
            let outcome = self.authorize_owned(&caller, id).and_then(|_| {
                self.store
                    .update(id, &TaskPatch::order_index(position as i64))?
                    .ok_or(Error::NotFound(id))
            });
            match outcome {
                Ok(_) => report.applied.push(id),
                Err(e) => {
                    warn!(caller = %caller, task_id = id, error = %e, "reorder skipped dossier");
                    report.skipped.push((id, e));
                }
            }
        }
        info!(
            caller = %caller,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "reordered dossiers"
        );
        Ok(report)
    }

    /// Exchange the `order_index` of two dossiers the caller owns.
    ///
    /// Both rows are checked before either is written, so a refused swap
    /// leaves the board as it was. Other dossiers keep their slots.
    pub fn swap_order(&mut self, a: TaskId, b: TaskId) -> Result<()> {
        let caller = self.caller()?;
        let first = self.authorize_owned(&caller, a)?;
        let second = self.authorize_owned(&caller, b)?;
        self.store
            .update(a, &TaskPatch::order_index(second.order_index))?
            .ok_or(Error::NotFound(a))?;
        self.store
            .update(b, &TaskPatch::order_index(first.order_index))?
            .ok_or(Error::NotFound(b))?;
        info!(
            caller = %caller,
            task_id = a,
            other_id = b,
            order_index = second.order_index,
            "swapped dossier positions"
        );
        Ok(())
    }

    /// Fetch `id` and check that `caller` owns it.
    ///
    /// Rows the caller cannot see are reported as missing; rows shared
    /// through the team but owned by someone else are `Forbidden`.
    fn authorize_owned(&self, caller: &str, id: TaskId) -> Result<Task> {
        let task = self.store.find(id)?.ok_or(Error::NotFound(id))?;
        if task.owner == caller {
            return Ok(task);
        }
        let team = self.store.team_of(caller)?;
        if is_visible(&task, caller, team.as_deref()) {
            Err(Error::Forbidden(id))
        } else {
            Err(Error::NotFound(id))
        }
    }

    fn check_column(&self, status: Status) -> Result<()> {
        if self.board.has_column(status) {
            Ok(())
        } else {
            Err(Error::Invalid(format!("status '{status}' is not a column on this board")))
        }
    }
}

/// Owner always sees a dossier; team members see dossiers filed under their team.
fn is_visible(task: &Task, caller: &str, team: Option<&str>) -> bool {
    task.owner == caller || (team.is_some() && task.team.as_deref() == team)
}
