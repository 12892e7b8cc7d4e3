//! Enumerations for TUI state management.

/// What the board is currently showing on top of the columns.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Board,
    Detail,
    /// Create or edit form.
    Form,
    /// Focus in the filter bar.
    Filters,
    /// Status menu for the selected card.
    MoveMenu,
    ConfirmDelete,
    Help,
}

/// Dimensions of the filter bar, in display order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterFocus {
    Search,
    CaseType,
    Client,
    Priority,
    Notaire,
}

impl FilterFocus {
    pub const ORDER: [FilterFocus; 5] = [
        FilterFocus::Search,
        FilterFocus::CaseType,
        FilterFocus::Client,
        FilterFocus::Priority,
        FilterFocus::Notaire,
    ];

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterFocus::Search => "Search",
            FilterFocus::CaseType => "Type",
            FilterFocus::Client => "Client",
            FilterFocus::Priority => "Priority",
            FilterFocus::Notaire => "Notaire",
        }
    }
}

/// Step `current` (an index into `None` + `len` values) left or right, wrapping.
pub fn cycle_option(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    let slots = len + 1;
    let pos = current.map_or(0, |i| i + 1);
    let next = if forward { (pos + 1) % slots } else { (pos + slots - 1) % slots };
    next.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_wraps_both_ways() {
        assert_eq!(FilterFocus::Notaire.next(), FilterFocus::Search);
        assert_eq!(FilterFocus::Search.prev(), FilterFocus::Notaire);
    }

    #[test]
    fn cycle_passes_through_all() {
        assert_eq!(cycle_option(None, 2, true), Some(0));
        assert_eq!(cycle_option(Some(1), 2, true), None);
        assert_eq!(cycle_option(None, 2, false), Some(1));
        assert_eq!(cycle_option(None, 0, true), None);
    }
}
