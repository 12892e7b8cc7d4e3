//! Kanban board interface.
//!
//! One column per configured status, a filter bar above and a status bar
//! below. Cards move between columns with Ctrl+arrows, the move menu or a
//! mouse drag. Every mutation goes through the [`Repository`] and is
//! followed by a full reload of the list; nothing is patched locally.

use std::io;

use chrono::Local;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{debug, warn};

use crate::auth::AuthProvider;
use crate::db::{format_due_relative, truncate};
use crate::dnd::{contains, DragEvent, DragState, MoveIntent};
use crate::error::Error;
use crate::fields::{CaseType, Priority, Status};
use crate::repo::Repository;
use crate::store::TaskStore;
use crate::task::{Task, TaskId};
use crate::tui::colors::{priority_color, status_color, INDIGO};
use crate::tui::enums::{cycle_option, FilterFocus, Mode};
use crate::tui::input::InputField;
use crate::tui::task_form::DossierForm;
use crate::view::{group_by_status, Column, Facets, FilterAction, Filters};

/// Rows per card, borders included.
const CARD_HEIGHT: usize = 4;
/// Width of the label column in the form popup.
const FORM_LABEL_WIDTH: u16 = 14;

/// Board state: the fetched list plus transient UI state.
pub struct BoardApp<S, A> {
    repo: Repository<S, A>,
    tasks: Vec<Task>,
    facets: Facets,
    filters: Filters,
    user: Option<String>,
    team: Option<String>,
    drag: DragState,
    /// Column under the pointer during a drag.
    hover: Option<Status>,
    // Areas from the last frame, for mouse hit testing.
    column_areas: Vec<(Status, Rect)>,
    card_areas: Vec<(TaskId, Status, Rect)>,
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: Vec<usize>,
    mode: Mode,
    form: Option<DossierForm>,
    filter_focus: FilterFocus,
    search: InputField,
    move_menu_index: usize,
    status_message: String,
    should_quit: bool,
}

impl<S: TaskStore, A: AuthProvider> BoardApp<S, A> {
    pub fn new(repo: Repository<S, A>) -> Self {
        let mut app = BoardApp {
            repo,
            tasks: Vec::new(),
            facets: Facets::default(),
            filters: Filters::default(),
            user: None,
            team: None,
            drag: DragState::default(),
            hover: None,
            column_areas: Vec::new(),
            card_areas: Vec::new(),
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: Vec::new(),
            mode: Mode::Board,
            form: None,
            filter_focus: FilterFocus::Search,
            search: InputField::new(),
            move_menu_index: 0,
            status_message: String::new(),
            should_quit: false,
        };
        app.reload();
        app
    }

    fn columns(&self) -> Vec<Column<'_>> {
        group_by_status(&self.tasks, &self.filters, &self.repo.board().columns)
    }

    fn selected_task(&self) -> Option<&Task> {
        self.columns()
            .into_iter()
            .nth(self.selected_column)?
            .tasks
            .get(self.selected_card)
            .copied()
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.selected_task().map(|t| t.id)
    }

    /// Fetch the list again and re-derive everything from it.
    fn reload(&mut self) {
        match self.repo.list() {
            Ok(tasks) => {
                self.facets = Facets::extract(&tasks);
                self.tasks = tasks;
            }
            Err(e) => self.report("Reload", e),
        }
        self.user = self.repo.caller().ok();
        self.team = self.repo.team().ok().flatten();
        self.column_scroll_offsets.resize(self.repo.board().columns.len(), 0);
        self.clamp_selection();
    }

    /// Keep the selected column and card within bounds.
    fn clamp_selection(&mut self) {
        let lens: Vec<usize> = self.columns().iter().map(|c| c.tasks.len()).collect();
        if self.selected_column >= lens.len() {
            self.selected_column = 0;
        }
        let len = lens.get(self.selected_column).copied().unwrap_or(0);
        if len == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= len {
            self.selected_card = len - 1;
        }
    }

    fn select_task(&mut self, id: TaskId) {
        let found = self.columns().iter().enumerate().find_map(|(c, column)| {
            column.tasks.iter().position(|t| t.id == id).map(|i| (c, i))
        });
        if let Some((column, card)) = found {
            self.selected_column = column;
            self.selected_card = card;
        }
        self.clamp_selection();
    }

    /// Log a failed action and show it in the status bar. Local state is left as is.
    fn report(&mut self, action: &str, err: Error) {
        warn!(action, error = %err, "board action failed");
        self.status_message = format!("{action} failed: {err}");
    }

    fn set_filters(&mut self, action: FilterAction) {
        self.filters = std::mem::take(&mut self.filters).apply(action);
        self.clamp_selection();
    }

    // -- mutations ---------------------------------------------------------

    fn move_task(&mut self, task_id: TaskId, to: Status) {
        match self.repo.move_to(task_id, to) {
            Ok(task) => {
                self.status_message = format!("Moved dossier #{} to {}", task.id, to.label());
                self.reload();
                self.select_task(task_id);
            }
            Err(e) => self.report("Move", e),
        }
    }

    /// Move the selected card one column left (`-1`) or right (`1`).
    fn move_selected(&mut self, step: isize) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let target = self
            .selected_column
            .checked_add_signed(step)
            .and_then(|i| self.repo.board().columns.get(i).copied());
        if let Some(to) = target {
            self.move_task(id, to);
        }
    }

    /// Swap the selected card with its neighbour in the column. Only the two
    /// cards change slots; the rest of the board keeps its order.
    fn reorder_selected(&mut self, up: bool) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let neighbour = {
            let columns = self.columns();
            let Some(column) = columns.get(self.selected_column) else {
                return;
            };
            let other = if up { self.selected_card.checked_sub(1) } else { Some(self.selected_card + 1) };
            match other.and_then(|i| column.tasks.get(i)) {
                Some(t) => t.id,
                None => return,
            }
        };

        match self.repo.swap_order(id, neighbour) {
            Ok(()) => {
                self.status_message = format!("Swapped dossiers #{id} and #{neighbour}");
                self.reload();
                self.select_task(id);
            }
            Err(e) => self.report("Reorder", e),
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.repo.delete(id) {
            Ok(()) => {
                self.status_message = format!("Deleted dossier #{id}");
                self.reload();
            }
            Err(e) => self.report("Delete", e),
        }
    }

    /// Save the form. On failure the form stays open with its input.
    fn submit_form(&mut self) {
        let Some(form) = self.form.take() else {
            return;
        };
        let outcome = match form.editing {
            Some(id) => form.to_patch().and_then(|patch| self.repo.update(id, patch)),
            None => form.to_new_task().and_then(|fields| self.repo.create(fields)),
        };
        match outcome {
            Ok(task) => {
                self.status_message = format!("Saved dossier #{}", task.id);
                self.mode = Mode::Board;
                self.reload();
                self.select_task(task.id);
            }
            Err(e) => {
                self.report("Save", e);
                self.form = Some(form);
            }
        }
    }

    fn open_edit_form(&mut self) {
        let form = self
            .selected_task()
            .map(|task| DossierForm::from_task(task, &self.repo.board().columns));
        if let Some(form) = form {
            self.form = Some(form);
            self.mode = Mode::Form;
        }
    }

    // -- drag and drop -----------------------------------------------------

    fn drive_drag(&mut self, event: DragEvent) {
        let (next, intent) = std::mem::take(&mut self.drag).handle(event);
        self.drag = next;
        if let Some(MoveIntent { task_id, to }) = intent {
            debug!(task_id, to = %to, "drop requested move");
            self.move_task(task_id, to);
        }
    }

    fn column_at(&self, pointer: (u16, u16)) -> Option<Status> {
        self.column_areas
            .iter()
            .find(|(_, area)| contains(*area, pointer))
            .map(|(status, _)| *status)
    }

    fn column_area(&self, status: Status) -> Option<Rect> {
        self.column_areas.iter().find(|(s, _)| *s == status).map(|(_, area)| *area)
    }

    /// Translate mouse events into drag events. Hit testing uses the areas
    /// recorded by the last render.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pointer = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if self.mode == Mode::Board => {
                let hit = self
                    .card_areas
                    .iter()
                    .find(|(_, _, area)| contains(*area, pointer))
                    .map(|(id, status, _)| (*id, *status));
                if let Some((task_id, status)) = hit {
                    self.select_task(task_id);
                    self.drive_drag(DragEvent::Start { task_id, status });
                    self.drive_drag(DragEvent::Enter { column: status });
                    self.hover = Some(status);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.drag.is_dragging() => {
                let over = self.column_at(pointer);
                if over == self.hover {
                    return;
                }
                if let Some(column) = self.hover {
                    if let Some(bounds) = self.column_area(column) {
                        self.drive_drag(DragEvent::Leave { column, pointer, bounds });
                    }
                }
                if let Some(column) = over {
                    self.drive_drag(DragEvent::Enter { column });
                }
                self.hover = over;
            }
            MouseEventKind::Up(MouseButton::Left) if self.drag.is_dragging() => {
                let event = match self.column_at(pointer) {
                    Some(column) => DragEvent::Drop { column },
                    None => DragEvent::End,
                };
                self.hover = None;
                self.drive_drag(event);
            }
            _ => {}
        }
    }

    // -- keyboard ----------------------------------------------------------

    /// Dispatch a key press according to the current mode.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match self.mode {
            Mode::Board => self.handle_board_key(key),
            Mode::Detail => match key.code {
                KeyCode::Char('e') => self.open_edit_form(),
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.mode = Mode::Board,
                _ => {}
            },
            Mode::Form => self.handle_form_key(key),
            Mode::Filters => self.handle_filter_key(key),
            Mode::MoveMenu => self.handle_move_menu_key(key),
            Mode::ConfirmDelete => {
                self.mode = Mode::Board;
                if matches!(key.code, KeyCode::Char('y' | 'Y' | 'o' | 'O')) {
                    self.delete_selected();
                } else {
                    self.status_message = "Deletion cancelled".to_string();
                }
            }
            Mode::Help => self.mode = Mode::Board,
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        self.status_message.clear();

        match key.code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Esc if self.drag.is_dragging() => {
                self.hover = None;
                self.drive_drag(DragEvent::End);
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,

            // Card movement, checked before plain navigation
            KeyCode::Left if ctrl => self.move_selected(-1),
            KeyCode::Right if ctrl => self.move_selected(1),
            KeyCode::Up if shift => self.reorder_selected(true),
            KeyCode::Down if shift => self.reorder_selected(false),

            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column + 1 < self.repo.board().columns.len() {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => self.selected_card = self.selected_card.saturating_sub(1),
            KeyCode::Down => {
                self.selected_card += 1;
                self.clamp_selection();
            }

            KeyCode::Enter => {
                if self.selected_task().is_some() {
                    self.mode = Mode::Detail;
                }
            }
            KeyCode::Char('n') => {
                self.form = Some(DossierForm::new(&self.repo.board().columns));
                self.mode = Mode::Form;
            }
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char('m') => {
                if let Some(status) = self.selected_task().map(|t| t.status) {
                    self.move_menu_index = self
                        .repo
                        .board()
                        .columns
                        .iter()
                        .position(|s| *s == status)
                        .unwrap_or(0);
                    self.mode = Mode::MoveMenu;
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if self.selected_task().is_some() {
                    self.mode = Mode::ConfirmDelete;
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => self.mode = Mode::Filters,
            KeyCode::Char('r') => {
                self.search.clear();
                self.set_filters(FilterAction::Reset);
                self.status_message = "Filters reset".to_string();
            }
            KeyCode::F(5) => {
                self.reload();
                self.status_message = format!("{} dossier(s) loaded", self.tasks.len());
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            self.mode = Mode::Board;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.mode = Mode::Board;
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.handle_left_right(false),
            KeyCode::Right => form.handle_left_right(true),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Char(c) => form.handle_char(c),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        let on_search = self.filter_focus == FilterFocus::Search;
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.mode = Mode::Board,
            KeyCode::Tab => self.filter_focus = self.filter_focus.next(),
            KeyCode::BackTab => self.filter_focus = self.filter_focus.prev(),
            KeyCode::Left if on_search => self.search.move_cursor_left(),
            KeyCode::Right if on_search => self.search.move_cursor_right(),
            KeyCode::Left => self.cycle_filter(false),
            KeyCode::Right => self.cycle_filter(true),
            KeyCode::Backspace if on_search => {
                self.search.handle_backspace();
                self.set_filters(FilterAction::SetSearch(self.search.value.clone()));
            }
            KeyCode::Char(c) if on_search => {
                self.search.handle_char(c);
                self.set_filters(FilterAction::SetSearch(self.search.value.clone()));
            }
            _ => {}
        }
    }

    /// Step the focused selector through "all" and its facet values.
    fn cycle_filter(&mut self, forward: bool) {
        let action = match self.filter_focus {
            FilterFocus::Search => return,
            FilterFocus::CaseType => {
                let current = self.filters.case_type.and_then(|k| CaseType::ALL.iter().position(|c| *c == k));
                FilterAction::SetCaseType(
                    cycle_option(current, CaseType::ALL.len(), forward).and_then(|i| CaseType::ALL.get(i).copied()),
                )
            }
            FilterFocus::Priority => {
                let current = self.filters.priority.and_then(|p| Priority::ALL.iter().position(|q| *q == p));
                FilterAction::SetPriority(
                    cycle_option(current, Priority::ALL.len(), forward).and_then(|i| Priority::ALL.get(i).copied()),
                )
            }
            FilterFocus::Client => {
                FilterAction::SetClient(cycle_value(&self.facets.clients, self.filters.client.as_ref(), forward))
            }
            FilterFocus::Notaire => {
                FilterAction::SetNotaire(cycle_value(&self.facets.notaires, self.filters.notaire.as_ref(), forward))
            }
        };
        self.set_filters(action);
    }

    fn handle_move_menu_key(&mut self, key: KeyEvent) {
        let count = self.repo.board().columns.len();
        if count == 0 {
            self.mode = Mode::Board;
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = Mode::Board,
            KeyCode::Up => self.move_menu_index = (self.move_menu_index + count - 1) % count,
            KeyCode::Down => self.move_menu_index = (self.move_menu_index + 1) % count,
            KeyCode::Enter => {
                self.mode = Mode::Board;
                let target = self.repo.board().columns.get(self.move_menu_index).copied();
                let current = self.selected_task().map(|t| (t.id, t.status));
                if let (Some(to), Some((id, from))) = (target, current) {
                    if to != from {
                        self.move_task(id, to);
                    }
                }
            }
            _ => {}
        }
    }

    // -- rendering ---------------------------------------------------------

    /// Render the whole screen and record hit-test areas.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Filter bar
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_filter_bar(f, chunks[1]);
        self.render_board(f, chunks[2]);
        self.render_status_bar(f, chunks[3]);

        match self.mode {
            Mode::Detail => self.render_detail_popup(f),
            Mode::Form => self.render_form_popup(f),
            Mode::MoveMenu => self.render_move_menu(f),
            Mode::ConfirmDelete => self.render_confirm_delete(f),
            Mode::Help => render_help(f),
            Mode::Board | Mode::Filters => {}
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let shown: usize = self.columns().iter().map(|c| c.tasks.len()).sum();
        let who = format!(
            "{} (team {})",
            self.user.as_deref().unwrap_or("signed out"),
            self.team.as_deref().unwrap_or("-")
        );
        let header = Line::from(vec![
            Span::styled("DOSSIERS", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(who, Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
            Span::raw(format!("  {shown}/{} shown", self.tasks.len())),
        ]);
        let block = Paragraph::new(header)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(block, area);
    }

    fn render_filter_bar(&self, f: &mut Frame, area: Rect) {
        let editing = self.mode == Mode::Filters;
        let all = "All";
        let mut spans = Vec::new();
        for focus in FilterFocus::ORDER {
            let value = match focus {
                FilterFocus::Search if editing => format!("{}_", self.search.value),
                FilterFocus::Search => self.search.value.clone(),
                FilterFocus::CaseType => self.filters.case_type.map_or(all, CaseType::label).to_string(),
                FilterFocus::Client => self.filters.client.as_deref().unwrap_or(all).to_string(),
                FilterFocus::Priority => self.filters.priority.map_or(all, Priority::label).to_string(),
                FilterFocus::Notaire => self.filters.notaire.as_deref().unwrap_or(all).to_string(),
            };
            let style = if editing && focus == self.filter_focus {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {}: {} ", focus.label(), value), style));
            spans.push(Span::raw(" "));
        }
        let title = if self.filters.is_active() { "Filters (active)" } else { "Filters" };
        let border = if editing { Style::default().fg(Color::Cyan) } else { Style::default() };
        let bar = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title(title).border_style(border));
        f.render_widget(bar, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let columns = group_by_status(&self.tasks, &self.filters, &self.repo.board().columns);
        self.column_areas.clear();
        self.card_areas.clear();
        if columns.is_empty() {
            return;
        }

        let constraints = vec![Constraint::Ratio(1, columns.len() as u32); columns.len()];
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        let dragged = self.drag.dragged_task();
        for (index, (column, &column_area)) in columns.iter().zip(layout.iter()).enumerate() {
            self.column_areas.push((column.status, column_area));

            let is_selected = index == self.selected_column && !self.drag.is_dragging();
            let is_target = self.drag.is_target(column.status);
            let accent = status_color(column.status);
            let (border_style, border_type) = if is_target {
                (Style::default().fg(accent).add_modifier(Modifier::BOLD), BorderType::Double)
            } else if is_selected {
                (Style::default().fg(accent).add_modifier(Modifier::BOLD), BorderType::Plain)
            } else {
                (Style::default(), BorderType::Plain)
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(border_type)
                .border_style(border_style)
                .title(format!(" {} ({}) ", column.status.label(), column.tasks.len()));
            let inner = block.inner(column_area);
            f.render_widget(block, column_area);

            if column.tasks.is_empty() {
                let empty = Paragraph::new("No dossiers")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center);
                f.render_widget(empty, inner);
                continue;
            }

            let available_height = inner.height as usize;
            let visible_cards = available_height / CARD_HEIGHT;
            let stored = self.column_scroll_offsets.get(index).copied().unwrap_or(0);
            let stored = stored.min(column.tasks.len().saturating_sub(1));
            let scroll_offset = if index == self.selected_column {
                if self.selected_card < stored {
                    self.selected_card
                } else if visible_cards > 0 && self.selected_card >= stored + visible_cards {
                    self.selected_card + 1 - visible_cards
                } else {
                    stored
                }
            } else {
                stored
            };
            if let Some(offset) = self.column_scroll_offsets.get_mut(index) {
                *offset = scroll_offset;
            }

            let mut rendered = 0;
            for (card_index, task) in column.tasks.iter().enumerate().skip(scroll_offset) {
                let top = rendered * CARD_HEIGHT;
                if top + CARD_HEIGHT > available_height {
                    break;
                }
                let card_area = Rect {
                    x: inner.x,
                    y: inner.y + top as u16,
                    width: inner.width,
                    height: CARD_HEIGHT as u16,
                };
                self.card_areas.push((task.id, column.status, card_area));
                let selected = is_selected && card_index == self.selected_card;
                render_card(f, card_area, task, selected, dragged == Some(task.id));
                rendered += 1;
            }

            if scroll_offset > 0 {
                let indicator = Paragraph::new(format!("▲ +{scroll_offset} above")).style(Style::default().fg(Color::Cyan));
                f.render_widget(indicator, Rect { height: 1, ..inner });
            }
            let remaining = column.tasks.len().saturating_sub(scroll_offset + rendered);
            if remaining > 0 && inner.height > 0 {
                let indicator = Paragraph::new(format!("▼ +{remaining} below")).style(Style::default().fg(Color::Cyan));
                f.render_widget(indicator, Rect { y: inner.bottom() - 1, height: 1, ..inner });
            }
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.mode {
                Mode::Filters => "Tab: next filter | ←/→: change | type to search | Enter/Esc: back".to_string(),
                Mode::Form => "Tab: next field | ←/→: change | Enter: save | Esc: cancel".to_string(),
                _ => "n: New | e: Edit | m: Move | Ctrl+←/→: Move | Shift+↑/↓: Reorder | f: Filter | r: Reset | x: Delete | h: Help | q: Quit"
                    .to_string(),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(INDIGO).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_detail_popup(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let area = centered_rect(70, 70, f.area());
        f.render_widget(Clear, area);

        let today = Local::now().date_naive();
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        let lines = vec![
            Line::from(Span::styled(
                format!("Dossier #{}: {}", task.id, task.display_title()),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Status:       {}", task.status.label())),
            Line::from(format!("Priority:     {}", task.priority.label())),
            Line::from(format!("Type:         {}", task.case_type.map_or("-", CaseType::label))),
            Line::from(format!("Client:       {}", or_dash(&task.client_name))),
            Line::from(format!("Notaire:      {}", or_dash(&task.notaire))),
            Line::from(format!("File number:  {}", or_dash(&task.file_number))),
            Line::from(format!("Due:          {}", format_due_relative(task.due_date, today))),
            Line::from(format!("Owner:        {} (team {})", task.owner, task.team.as_deref().unwrap_or("-"))),
            Line::from(format!("Updated:      {}", task.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"))),
            Line::from(""),
            Line::from("Notes:"),
            Line::from(or_dash(&task.notes)),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Dossier (Enter to close, e to edit)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(priority_color(task.priority)).add_modifier(Modifier::BOLD));
        let popup = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    fn render_form_popup(&self, f: &mut Frame) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let area = centered_rect(60, 60, f.area());
        f.render_widget(Clear, area);

        let title = match form.editing {
            Some(id) => format!("Edit dossier #{id}"),
            None => "New dossier".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(INDIGO).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);

        let lines: Vec<Line> = form
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, (label, value, selector))| {
                let active = i == form.current_field;
                let value = if selector { format!("◀ {value} ▶") } else { value };
                let style = if active {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:<width$}", label, width = FORM_LABEL_WIDTH as usize), style),
                    Span::raw(value),
                ])
            })
            .collect();

        let popup = Paragraph::new(lines).block(block).style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);

        if let Some(cursor) = form.cursor() {
            let x = inner.x + FORM_LABEL_WIDTH + cursor as u16;
            let y = inner.y + form.current_field as u16;
            if x < inner.right() && y < inner.bottom() {
                f.set_cursor_position((x, y));
            }
        }
    }

    fn render_move_menu(&self, f: &mut Frame) {
        let current = self.selected_task().map(|t| t.status);
        let columns = &self.repo.board().columns;
        let area = centered_rect(30, 30, f.area());
        f.render_widget(Clear, area);

        let lines: Vec<Line> = columns
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let marker = if Some(*status) == current { " (current)" } else { "" };
                let style = if i == self.move_menu_index {
                    Style::default().fg(Color::Black).bg(status_color(*status)).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(status_color(*status))
                };
                Line::from(Span::styled(format!(" {}{marker} ", status.label()), style))
            })
            .collect();
        let menu = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Move to"))
            .style(Style::default().bg(Color::Black));
        f.render_widget(menu, area);
    }

    fn render_confirm_delete(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let area = centered_rect(50, 20, f.area());
        f.render_widget(Clear, area);
        let text = vec![
            Line::from(format!("Delete dossier #{}?", task.id)),
            Line::from(Span::styled(task.display_title(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("y: delete | any other key: cancel"),
        ];
        let popup = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    /// Main event loop. Blocks on input; there is nothing to refresh between events.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;
            match event::read()? {
                Event::Key(key) => self.handle_key(key),
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Next value of a string selector, passing through "all" (`None`).
fn cycle_value(values: &[String], current: Option<&String>, forward: bool) -> Option<String> {
    let position = current.and_then(|c| values.iter().position(|v| v == c));
    cycle_option(position, values.len(), forward).and_then(|i| values.get(i).cloned())
}

fn render_card(f: &mut Frame, area: Rect, task: &Task, selected: bool, dragged: bool) {
    let accent = priority_color(task.priority);
    let mut style = if selected {
        Style::default().bg(accent).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    if dragged {
        style = style.add_modifier(Modifier::ITALIC | Modifier::DIM);
    }

    let width = area.width.saturating_sub(2) as usize;
    let today = Local::now().date_naive();
    let id = format!("#{} ", task.id);
    let lines = vec![
        Line::from(vec![
            Span::styled(id.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(truncate(&task.display_title(), width.saturating_sub(id.chars().count()))),
        ]),
        Line::from(truncate(
            &format!(
                "{} | {} | {}",
                task.priority.label(),
                task.notaire.as_deref().unwrap_or("-"),
                format_due_relative(task.due_date, today)
            ),
            width,
        )),
    ];

    let card = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(accent)))
        .style(style);
    f.render_widget(card, area);
}

fn render_help(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);
    let keys = [
        ("←/→ ↑/↓", "select column / card"),
        ("Ctrl+←/→", "move card to the previous / next column"),
        ("Shift+↑/↓", "move card up / down in the order"),
        ("mouse drag", "drop a card on another column"),
        ("Enter", "dossier details"),
        ("n / e", "new / edit dossier"),
        ("m", "move menu"),
        ("x", "delete dossier"),
        ("f or /", "edit filters"),
        ("r", "reset filters"),
        ("F5", "reload"),
        ("q / Esc", "quit"),
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:<14}"), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(*what),
            ])
        })
        .collect();
    let help = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Help (any key to close)"))
        .style(Style::default().bg(Color::Black));
    f.render_widget(help, area);
}

/// Rectangle of the given percentage size centred in `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(percent_y) / 100) as u16;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FixedUser;
    use crate::config::BoardConfig;
    use crate::db::Database;
    use crate::error::StoreError;
    use crate::store::TaskDraft;
    use crate::task::{NewTask, TaskPatch};
    use ratatui::backend::TestBackend;

    /// In-memory store that counts row updates.
    #[derive(Default)]
    struct CountingStore {
        db: Database,
        updates: usize,
    }

    impl TaskStore for CountingStore {
        fn tasks(&self) -> Result<Vec<Task>, StoreError> {
            self.db.tasks()
        }
        fn find(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
            self.db.find(id)
        }
        fn max_order_index(&self) -> Result<Option<i64>, StoreError> {
            self.db.max_order_index()
        }
        fn insert(&mut self, draft: TaskDraft) -> Result<Task, StoreError> {
            self.db.insert(draft)
        }
        fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
            self.updates += 1;
            self.db.update(id, patch)
        }
        fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
            self.db.delete(id)
        }
        fn team_of(&self, user_id: &str) -> Result<Option<String>, StoreError> {
            self.db.team_of(user_id)
        }
        fn join_team(&mut self, user_id: &str, team_id: &str) -> Result<(), StoreError> {
            self.db.join_team(user_id, team_id)
        }
    }

    fn app_with(clients: &[&str]) -> BoardApp<CountingStore, FixedUser> {
        let mut store = CountingStore::default();
        store.db.join_team("alice", "etude").unwrap();
        let mut repo = Repository::new(store, FixedUser(Some("alice".into())), BoardConfig::default());
        for client in clients {
            repo.create(NewTask { client_name: Some((*client).into()), ..Default::default() })
                .unwrap();
        }
        BoardApp::new(repo)
    }

    fn draw(app: &mut BoardApp<CountingStore, FixedUser>) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
    }

    fn mouse(kind: MouseEventKind, (column, row): (u16, u16)) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    fn press(app: &mut BoardApp<CountingStore, FixedUser>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn inside(area: Rect) -> (u16, u16) {
        (area.x + 1, area.y + 1)
    }

    #[test]
    fn renders_one_column_per_status() {
        let mut app = app_with(&["Martin", "Durand"]);
        draw(&mut app);
        let statuses: Vec<Status> = app.column_areas.iter().map(|(s, _)| *s).collect();
        assert_eq!(statuses, vec![Status::InProgress, Status::Done]);
        assert_eq!(app.card_areas.len(), 2);
        assert!(app.card_areas.iter().all(|(_, s, _)| *s == Status::InProgress));
    }

    #[test]
    fn drop_on_another_column_updates_once() {
        let mut app = app_with(&["Martin"]);
        draw(&mut app);
        let (task_id, _, card) = app.card_areas[0];
        let done = app.column_area(Status::Done).unwrap();

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), inside(card)));
        assert!(app.drag.is_dragging());
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), inside(done)));
        assert!(app.drag.is_target(Status::Done));
        assert!(!app.drag.is_target(Status::InProgress));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), inside(done)));

        assert_eq!(app.repo.store().updates, 1);
        assert_eq!(app.drag, DragState::Idle);
        let moved = app.tasks.iter().find(|t| t.id == task_id).unwrap();
        assert_eq!(moved.status, Status::Done);
    }

    #[test]
    fn drop_on_own_column_does_not_update() {
        let mut app = app_with(&["Martin"]);
        draw(&mut app);
        let (_, _, card) = app.card_areas[0];

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), inside(card)));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), (card.x + 2, card.y + 2)));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), (card.x + 2, card.y + 2)));

        assert_eq!(app.repo.store().updates, 0);
        assert_eq!(app.drag, DragState::Idle);
        assert_eq!(app.tasks[0].status, Status::InProgress);
    }

    #[test]
    fn release_outside_the_board_cancels() {
        let mut app = app_with(&["Martin"]);
        draw(&mut app);
        let (_, _, card) = app.card_areas[0];

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), inside(card)));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), (1, 0)));
        assert_eq!(app.repo.store().updates, 0);
        assert!(!app.drag.is_dragging());
    }

    #[test]
    fn ctrl_right_moves_the_selected_card() {
        let mut app = app_with(&["Martin"]);
        app.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::CONTROL));
        assert_eq!(app.tasks[0].status, Status::Done);
        assert_eq!(app.selected_column, 1);

        // Already in the last column
        app.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::CONTROL));
        assert_eq!(app.repo.store().updates, 1);
    }

    #[test]
    fn shift_down_swaps_with_the_next_card() {
        let mut app = app_with(&["Martin", "Durand"]);
        let first = app.tasks[0].id;
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));

        let order: Vec<TaskId> = app.tasks.iter().map(|t| t.id).collect();
        assert_eq!(order[1], first);
        assert_eq!(app.selected_card, 1);
    }

    /// Board for alice with rows inserted as given, all filed under one team.
    fn shared_board(rows: &[(&str, &str, Status, i64)]) -> (BoardApp<CountingStore, FixedUser>, Vec<TaskId>) {
        let mut store = CountingStore::default();
        store.db.join_team("alice", "etude").unwrap();
        store.db.join_team("bob", "etude").unwrap();
        let ids = rows
            .iter()
            .map(|&(owner, client, status, order_index)| {
                store
                    .db
                    .insert(TaskDraft {
                        owner: owner.into(),
                        team: Some("etude".into()),
                        status,
                        order_index,
                        fields: NewTask { client_name: Some(client.into()), ..Default::default() },
                    })
                    .unwrap()
                    .id
            })
            .collect();
        let repo = Repository::new(store, FixedUser(Some("alice".into())), BoardConfig::default());
        (BoardApp::new(repo), ids)
    }

    #[test]
    fn shift_down_leaves_teammate_cards_and_gaps_alone() {
        let (mut app, ids) = shared_board(&[
            ("alice", "A", Status::InProgress, 0),
            ("bob", "B", Status::Done, 3),
            ("alice", "C", Status::InProgress, 4),
            ("alice", "D", Status::InProgress, 5),
        ]);
        let [a, b, c, d] = ids[..] else { panic!("four rows") };
        app.select_task(c);
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));

        let order: Vec<TaskId> = app.tasks.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![a, b, d, c]);
        let indexes: Vec<i64> = app.tasks.iter().map(|t| t.order_index).collect();
        assert_eq!(indexes, vec![0, 3, 4, 5]);
        assert_eq!(app.repo.store().updates, 2);
        assert_eq!(app.selected_id(), Some(c));
    }

    #[test]
    fn swapping_with_a_teammate_card_is_refused() {
        let (mut app, ids) = shared_board(&[
            ("alice", "A", Status::InProgress, 0),
            ("bob", "B", Status::InProgress, 1),
        ]);
        app.select_task(ids[0]);
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));

        assert_eq!(app.repo.store().updates, 0);
        assert_eq!(app.tasks.iter().map(|t| t.id).collect::<Vec<_>>(), ids);
        assert!(app.status_message.starts_with("Reorder failed"));
    }

    #[test]
    fn move_menu_moves_to_chosen_column() {
        let mut app = app_with(&["Martin"]);
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.mode, Mode::MoveMenu);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Board);
        assert_eq!(app.tasks[0].status, Status::Done);
    }

    #[test]
    fn search_filter_narrows_the_columns() {
        let mut app = app_with(&["Martin", "Durand"]);
        press(&mut app, KeyCode::Char('f'));
        for c in "dur".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        let shown: Vec<_> = app.columns()[0].tasks.iter().map(|t| t.client_name.clone()).collect();
        assert_eq!(shown, vec![Some("Durand".to_string())]);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('r'));
        assert!(!app.filters.is_active());
        assert_eq!(app.columns()[0].tasks.len(), 2);
    }

    #[test]
    fn client_selector_cycles_through_facets() {
        let mut app = app_with(&["Martin", "Durand"]);
        press(&mut app, KeyCode::Char('f'));
        app.filter_focus = FilterFocus::Client;
        press(&mut app, KeyCode::Right);
        assert_eq!(app.filters.client.as_deref(), Some("Durand"));
        press(&mut app, KeyCode::Left);
        assert_eq!(app.filters.client, None);
    }

    #[test]
    fn form_creates_a_dossier() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Tab);
        for c in "Lefèvre".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Board);
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].client_name.as_deref(), Some("Lefèvre"));
        assert_eq!(app.tasks[0].status, Status::InProgress);
    }

    #[test]
    fn failed_save_keeps_the_form_and_reports() {
        let repo = Repository::new(
            CountingStore::default(),
            FixedUser(Some("bob".into())),
            BoardConfig::default(),
        );
        let mut app = BoardApp::new(repo);
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Form);
        assert!(app.form.is_some());
        assert!(app.status_message.contains("no team"));
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut app = app_with(&["Martin"]);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.tasks.len(), 1);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Char('y'));
        assert!(app.tasks.is_empty());
    }

    #[test]
    fn signed_out_board_shows_the_error() {
        let repo = Repository::new(CountingStore::default(), FixedUser(None), BoardConfig::default());
        let app = BoardApp::new(repo);
        assert!(app.tasks.is_empty());
        assert!(app.status_message.contains("not authenticated"));
    }
}
