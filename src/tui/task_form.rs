//! Create/edit form for dossiers in the terminal user interface.
//!
//! A handful of text inputs
//! plus selectors for type, priority and column. It produces either a
//! [`NewTask`] or a full [`TaskPatch`] for the repository.

use chrono::{Local, NaiveDate};

use crate::db::parse_due_input;
use crate::error::{Error, Result};
use crate::fields::{CaseType, Priority, Status};
use crate::task::{NewTask, Task, TaskId, TaskPatch};
use crate::tui::enums::cycle_option;
use crate::tui::input::InputField;

/// Field order, top to bottom.
pub const TYPE_FIELD: usize = 0;
pub const CLIENT_FIELD: usize = 1;
pub const NOTAIRE_FIELD: usize = 2;
pub const TITLE_FIELD: usize = 3;
pub const FILE_NUMBER_FIELD: usize = 4;
pub const PRIORITY_FIELD: usize = 5;
pub const STATUS_FIELD: usize = 6;
pub const DUE_FIELD: usize = 7;
pub const NOTES_FIELD: usize = 8;
const FIELD_COUNT: usize = 9;

pub struct DossierForm {
    /// Dossier being edited; `None` for a new one.
    pub editing: Option<TaskId>,
    pub case_type: Option<usize>,
    pub client: InputField,
    pub notaire: InputField,
    pub title: InputField,
    pub file_number: InputField,
    pub priority: usize,
    pub status: usize,
    pub due: InputField,
    pub notes: InputField,
    pub current_field: usize,
    pub statuses: Vec<Status>,
}

impl DossierForm {
    /// Empty form; status defaults to the first board column.
    pub fn new(columns: &[Status]) -> Self {
        Self {
            editing: None,
            case_type: None,
            client: InputField::new(),
            notaire: InputField::new(),
            title: InputField::new(),
            file_number: InputField::new(),
            priority: Priority::ALL.iter().position(|p| *p == Priority::default()).unwrap_or(0),
            status: 0,
            due: InputField::new(),
            notes: InputField::new(),
            current_field: 0,
            statuses: columns.to_vec(),
        }
    }

    /// Form populated from an existing dossier.
    pub fn from_task(task: &Task, columns: &[Status]) -> Self {
        let mut form = Self::new(columns);
        let text = |v: &Option<String>| InputField::with_value(v.as_deref().unwrap_or_default());
        form.editing = Some(task.id);
        form.case_type = task.case_type.and_then(|k| CaseType::ALL.iter().position(|c| *c == k));
        form.client = text(&task.client_name);
        form.notaire = text(&task.notaire);
        form.title = text(&task.title);
        form.file_number = text(&task.file_number);
        form.priority = Priority::ALL.iter().position(|p| *p == task.priority).unwrap_or(0);
        form.status = form.statuses.iter().position(|s| *s == task.status).unwrap_or(0);
        form.due = InputField::with_value(&task.due_date.map(|d| d.to_string()).unwrap_or_default());
        form.notes = text(&task.notes);
        form
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            CLIENT_FIELD => Some(&mut self.client),
            NOTAIRE_FIELD => Some(&mut self.notaire),
            TITLE_FIELD => Some(&mut self.title),
            FILE_NUMBER_FIELD => Some(&mut self.file_number),
            DUE_FIELD => Some(&mut self.due),
            NOTES_FIELD => Some(&mut self.notes),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_backspace();
        }
    }

    /// Move the cursor in text inputs, or cycle the value of selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            TYPE_FIELD => self.case_type = cycle_option(self.case_type, CaseType::ALL.len(), right),
            PRIORITY_FIELD => self.priority = cycle(self.priority, Priority::ALL.len(), right),
            STATUS_FIELD => self.status = cycle(self.status, self.statuses.len(), right),
            _ => {
                if let Some(field) = self.active_input() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }

    pub fn selected_case_type(&self) -> Option<CaseType> {
        self.case_type.and_then(|i| CaseType::ALL.get(i).copied())
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL.get(self.priority).copied().unwrap_or_default()
    }

    pub fn selected_status(&self) -> Option<Status> {
        self.statuses.get(self.status).copied()
    }

    fn parsed_due(&self) -> Result<Option<NaiveDate>> {
        match self.due.text() {
            None => Ok(None),
            Some(raw) => parse_due_input(&raw, Local::now().date_naive())
                .map(Some)
                .ok_or_else(|| Error::Invalid(format!("unrecognised due date '{raw}'"))),
        }
    }

    /// Create request for a new dossier.
    pub fn to_new_task(&self) -> Result<NewTask> {
        Ok(NewTask {
            priority: self.selected_priority(),
            status: self.selected_status(),
            title: self.title.text(),
            file_number: self.file_number.text(),
            client_name: self.client.text(),
            notaire: self.notaire.text(),
            case_type: self.selected_case_type(),
            notes: self.notes.text(),
            due_date: self.parsed_due()?,
        })
    }

    /// Full patch for an edit: every field is written, blanks clear.
    pub fn to_patch(&self) -> Result<TaskPatch> {
        Ok(TaskPatch {
            priority: Some(self.selected_priority()),
            status: self.selected_status(),
            title: Some(self.title.text()),
            file_number: Some(self.file_number.text()),
            client_name: Some(self.client.text()),
            notaire: Some(self.notaire.text()),
            case_type: Some(self.selected_case_type()),
            notes: Some(self.notes.text()),
            due_date: Some(self.parsed_due()?),
            order_index: None,
        })
    }

    /// (label, value, is selector) for each row, in field order.
    pub fn rows(&self) -> Vec<(&'static str, String, bool)> {
        vec![
            ("Type", self.selected_case_type().map_or("Select a type", CaseType::label).to_string(), true),
            ("Client", self.client.value.clone(), false),
            ("Notaire", self.notaire.value.clone(), false),
            ("Title", self.title.value.clone(), false),
            ("File number", self.file_number.value.clone(), false),
            ("Priority", self.selected_priority().label().to_string(), true),
            ("Column", self.selected_status().map_or("-", Status::label).to_string(), true),
            ("Due", self.due.value.clone(), false),
            ("Notes", self.notes.value.clone(), false),
        ]
    }

    /// Cursor position in the active text input, if any.
    pub fn cursor(&self) -> Option<usize> {
        match self.current_field {
            CLIENT_FIELD => Some(self.client.cursor),
            NOTAIRE_FIELD => Some(self.notaire.cursor),
            TITLE_FIELD => Some(self.title.cursor),
            FILE_NUMBER_FIELD => Some(self.file_number.cursor),
            DUE_FIELD => Some(self.due.cursor),
            NOTES_FIELD => Some(self.notes.cursor),
            _ => None,
        }
    }
}

fn cycle(current: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        (current + 1) % len
    } else {
        (current + len - 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::fixtures::task;

    const COLUMNS: [Status; 2] = [Status::InProgress, Status::Done];

    fn type_text(form: &mut DossierForm, text: &str) {
        for c in text.chars() {
            form.handle_char(c);
        }
    }

    #[test]
    fn new_form_builds_a_create_request() {
        let mut form = DossierForm::new(&COLUMNS);
        form.handle_left_right(true); // Vente
        form.next_field();
        type_text(&mut form, "Martin");
        form.current_field = PRIORITY_FIELD;
        form.handle_left_right(true);

        let new = form.to_new_task().unwrap();
        assert_eq!(new.case_type, Some(CaseType::Vente));
        assert_eq!(new.client_name.as_deref(), Some("Martin"));
        assert_eq!(new.priority, Priority::High);
        assert_eq!(new.status, Some(Status::InProgress));
        assert_eq!(new.notaire, None);
    }

    #[test]
    fn edit_form_round_trips_and_blanks_clear() {
        let mut t = task(4, "alice", Status::Done);
        t.client_name = Some("Dupont".into());
        t.notes = Some("à relancer".into());
        t.priority = Priority::Urgent;

        let mut form = DossierForm::from_task(&t, &COLUMNS);
        assert_eq!(form.editing, Some(4));
        assert_eq!(form.selected_status(), Some(Status::Done));
        form.current_field = NOTES_FIELD;
        for _ in 0..form.notes.value.chars().count() {
            form.handle_backspace();
        }

        let patch = form.to_patch().unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.client_name, Some(Some("Dupont".into())));
        assert_eq!(patch.priority, Some(Priority::Urgent));
    }

    #[test]
    fn bad_due_date_is_reported() {
        let mut form = DossierForm::new(&COLUMNS);
        form.current_field = DUE_FIELD;
        type_text(&mut form, "bientôt");
        assert!(form.to_new_task().is_err());
    }

    #[test]
    fn selectors_ignore_typing() {
        let mut form = DossierForm::new(&COLUMNS);
        form.current_field = STATUS_FIELD;
        form.handle_char('x');
        form.handle_left_right(false);
        assert_eq!(form.selected_status(), Some(Status::Done));
        assert_eq!(form.cursor(), None);
        assert_eq!(form.rows().len(), FIELD_COUNT);
    }
}
