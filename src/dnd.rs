//! Drag-and-drop of cards between board columns.
//!
//! A small state machine fed with pointer events. It never touches the store:
//! a drop that changes column yields a [`MoveIntent`] which the caller turns
//! into a status update followed by a list reload.

use std::collections::BTreeSet;

use ratatui::layout::Rect;

use crate::fields::Status;
use crate::task::TaskId;

/// Pointer events relevant to dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    /// Drag started on a card.
    Start { task_id: TaskId, status: Status },
    /// Pointer entered a column.
    Enter { column: Status },
    /// Pointer reported leaving a column. `pointer` is (column, row) and
    /// `bounds` the column's area.
    Leave { column: Status, pointer: (u16, u16), bounds: Rect },
    /// Released over a column.
    Drop { column: Status },
    /// Released outside any column, or cancelled.
    End,
}

/// Status change requested by a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub task_id: TaskId,
    pub to: Status,
}

/// Drag state. While dragging, `over` holds the columns marked as drop targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        task_id: TaskId,
        source: Status,
        over: BTreeSet<Status>,
    },
}

impl DragState {
    /// Advance the machine. Returns the new state and, for a drop onto a
    /// different column, the move to perform.
    #[must_use]
    pub fn handle(self, event: DragEvent) -> (DragState, Option<MoveIntent>) {
        match (self, event) {
            (_, DragEvent::Start { task_id, status }) => (
                DragState::Dragging { task_id, source: status, over: BTreeSet::new() },
                None,
            ),
            (DragState::Dragging { task_id, source, mut over }, DragEvent::Enter { column }) => {
                over.insert(column);
                (DragState::Dragging { task_id, source, over }, None)
            }
            (DragState::Dragging { task_id, source, mut over }, DragEvent::Leave { column, pointer, bounds }) => {
                if !contains(bounds, pointer) {
                    over.remove(&column);
                }
                (DragState::Dragging { task_id, source, over }, None)
            }
            (DragState::Dragging { task_id, source, .. }, DragEvent::Drop { column }) => {
                let intent = (column != source).then_some(MoveIntent { task_id, to: column });
                (DragState::Idle, intent)
            }
            (_, DragEvent::End) | (DragState::Idle, _) => (DragState::Idle, None),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    /// Whether `column` is currently highlighted as a drop target.
    pub fn is_target(&self, column: Status) -> bool {
        match self {
            DragState::Dragging { over, .. } => over.contains(&column),
            DragState::Idle => false,
        }
    }

    pub fn dragged_task(&self) -> Option<TaskId> {
        match self {
            DragState::Dragging { task_id, .. } => Some(*task_id),
            DragState::Idle => None,
        }
    }
}

/// Bounding-box containment of a terminal cell.
pub fn contains(area: Rect, (column, row): (u16, u16)) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DONE_AREA: Rect = Rect { x: 40, y: 3, width: 40, height: 20 };

    fn drag(task_id: TaskId, status: Status) -> DragState {
        DragState::Idle.handle(DragEvent::Start { task_id, status }).0
    }

    #[test]
    fn drop_on_another_column_emits_one_move() {
        let (state, intent) = drag(7, Status::InProgress).handle(DragEvent::Enter { column: Status::Done });
        assert!(intent.is_none());
        assert!(state.is_target(Status::Done));

        let (state, intent) = state.handle(DragEvent::Drop { column: Status::Done });
        assert_eq!(intent, Some(MoveIntent { task_id: 7, to: Status::Done }));
        assert_eq!(state, DragState::Idle);
    }

    #[test]
    fn drop_on_own_column_is_a_no_op() {
        let (state, intent) = drag(7, Status::InProgress).handle(DragEvent::Drop { column: Status::InProgress });
        assert_eq!(intent, None);
        assert_eq!(state, DragState::Idle);
    }

    #[test]
    fn leave_inside_bounds_keeps_the_mark() {
        let state = drag(1, Status::InProgress)
            .handle(DragEvent::Enter { column: Status::Done })
            .0;
        let (state, _) = state.handle(DragEvent::Leave {
            column: Status::Done,
            pointer: (50, 10),
            bounds: DONE_AREA,
        });
        assert!(state.is_target(Status::Done));

        let (state, _) = state.handle(DragEvent::Leave {
            column: Status::Done,
            pointer: (39, 10),
            bounds: DONE_AREA,
        });
        assert!(!state.is_target(Status::Done));
        assert!(state.is_dragging());
    }

    #[test]
    fn drop_clears_every_mark() {
        let state = drag(1, Status::InProgress)
            .handle(DragEvent::Enter { column: Status::Done })
            .0
            .handle(DragEvent::Enter { column: Status::Todo })
            .0;
        let (state, intent) = state.handle(DragEvent::Drop { column: Status::Todo });
        assert_eq!(intent.map(|i| i.to), Some(Status::Todo));
        assert!(!state.is_target(Status::Done));
        assert!(!state.is_target(Status::Todo));
    }

    #[test]
    fn end_and_stray_events_return_to_idle() {
        let (state, intent) = drag(3, Status::Done).handle(DragEvent::End);
        assert_eq!((state, intent), (DragState::Idle, None));

        let (state, intent) = DragState::Idle.handle(DragEvent::Drop { column: Status::Done });
        assert_eq!((state, intent), (DragState::Idle, None));
        assert_eq!(DragState::Idle.handle(DragEvent::Enter { column: Status::Done }).0, DragState::Idle);
    }

    #[test]
    fn containment_uses_half_open_edges() {
        assert!(contains(DONE_AREA, (40, 3)));
        assert!(contains(DONE_AREA, (79, 22)));
        assert!(!contains(DONE_AREA, (80, 10)));
        assert!(!contains(DONE_AREA, (50, 23)));
    }
}
