//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, Status};

/// Card accent for urgent dossiers.
pub const URGENT_RED: Color = Color::Rgb(220, 38, 38);
/// Card accent for high priority.
pub const HIGH_ORANGE: Color = Color::Rgb(234, 88, 12);
/// Card accent for medium priority.
pub const MEDIUM_BLUE: Color = Color::Rgb(37, 99, 235);
/// Card accent for low priority.
pub const LOW_GRAY: Color = Color::Rgb(156, 163, 175);

pub const INDIGO: Color = Color::Rgb(79, 70, 229);
pub const GREEN: Color = Color::Rgb(22, 163, 74);

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Urgent => URGENT_RED,
        Priority::High => HIGH_ORANGE,
        Priority::Medium => MEDIUM_BLUE,
        Priority::Low => LOW_GRAY,
    }
}

/// Column accent, also used to highlight a drop target.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::Todo => Color::Gray,
        Status::InProgress => INDIGO,
        Status::Done => GREEN,
    }
}
