//! Board view-model: filter state, derived columns and facets.
//!
//! Everything here is a pure function of the fetched dossier list and the
//! current [`Filters`]. Nothing is cached; callers recompute after every
//! change to either input.

use std::collections::BTreeSet;

use crate::fields::{CaseType, Priority, Status};
use crate::task::Task;

/// Active filter dimensions. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub priority: Option<Priority>,
    pub client: Option<String>,
    pub notaire: Option<String>,
    pub case_type: Option<CaseType>,
    pub search: String,
}

/// Transitions of the filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    SetPriority(Option<Priority>),
    SetClient(Option<String>),
    SetNotaire(Option<String>),
    SetCaseType(Option<CaseType>),
    SetSearch(String),
    Reset,
}

impl Filters {
    /// Next filter state after `action`.
    #[must_use]
    pub fn apply(self, action: FilterAction) -> Filters {
        match action {
            FilterAction::SetPriority(priority) => Filters { priority, ..self },
            FilterAction::SetClient(client) => Filters { client: non_blank(client), ..self },
            FilterAction::SetNotaire(notaire) => Filters { notaire: non_blank(notaire), ..self },
            FilterAction::SetCaseType(case_type) => Filters { case_type, ..self },
            FilterAction::SetSearch(search) => Filters { search, ..self },
            FilterAction::Reset => Filters::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.priority.is_some()
            || self.client.is_some()
            || self.notaire.is_some()
            || self.case_type.is_some()
            || !self.search.trim().is_empty()
    }

    /// Whether `task` passes every set dimension.
    pub fn matches(&self, task: &Task) -> bool {
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.client.as_ref().is_some_and(|c| task.client_name.as_ref() != Some(c)) {
            return false;
        }
        if self.notaire.as_ref().is_some_and(|n| task.notaire.as_ref() != Some(n)) {
            return false;
        }
        if self.case_type.is_some_and(|k| task.case_type != Some(k)) {
            return false;
        }
        self.matches_search(task)
    }

    /// Case-insensitive substring match on case type, client, title and file number.
    fn matches_search(&self, task: &Task) -> bool {
        let query = self.search.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let contains = |field: Option<&str>| field.is_some_and(|v| v.to_lowercase().contains(&query));
        contains(task.case_type.map(CaseType::label))
            || contains(task.client_name.as_deref())
            || contains(task.title.as_deref())
            || contains(task.file_number.as_deref())
    }

    /// Dossiers passing the filters, in their incoming order.
    pub fn filter<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One board column and the dossiers currently shown in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub status: Status,
    pub tasks: Vec<&'a Task>,
}

/// Partition the filtered dossiers into one bucket per column.
///
/// Buckets keep the incoming (order index) order. Dossiers whose status is
/// not among `columns` are left out.
pub fn group_by_status<'a>(tasks: &'a [Task], filters: &Filters, columns: &[Status]) -> Vec<Column<'a>> {
    let visible = filters.filter(tasks);
    columns
        .iter()
        .map(|&status| Column {
            status,
            tasks: visible.iter().copied().filter(|t| t.status == status).collect(),
        })
        .collect()
}

/// Selectable filter values, taken from the unfiltered list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub priorities: Vec<Priority>,
    pub clients: Vec<String>,
    pub notaires: Vec<String>,
    pub case_types: Vec<CaseType>,
}

impl Facets {
    pub fn extract(tasks: &[Task]) -> Facets {
        let priorities: BTreeSet<Priority> = tasks.iter().map(|t| t.priority).collect();
        Facets {
            priorities: priorities.into_iter().collect(),
            clients: distinct(tasks.iter().map(|t| t.client_name.as_deref())),
            notaires: distinct(tasks.iter().map(|t| t.notaire.as_deref())),
            case_types: CaseType::ALL.to_vec(),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::fixtures::task;
    use proptest::prelude::*;

    fn dossier(id: u64, status: Status, priority: Priority, client: &str) -> Task {
        Task {
            priority,
            client_name: Some(client.to_string()).filter(|c| !c.is_empty()),
            ..task(id, "alice", status)
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            dossier(1, Status::InProgress, Priority::Low, "Martin"),
            dossier(2, Status::InProgress, Priority::High, "Dupont"),
            dossier(3, Status::Done, Priority::High, "Martin"),
            dossier(4, Status::InProgress, Priority::High, "Leroy"),
            dossier(5, Status::Todo, Priority::High, ""),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn priority_filter_limits_each_bucket() {
        let tasks = sample();
        let filters = Filters::default().apply(FilterAction::SetPriority(Some(Priority::High)));
        let board = group_by_status(&tasks, &filters, &[Status::InProgress, Status::Done]);

        assert_eq!(board[0].status, Status::InProgress);
        assert_eq!(ids(&board[0].tasks), vec![2, 4]);
        assert!(board[0].tasks.iter().all(|t| t.priority == Priority::High && t.status == Status::InProgress));
        assert_eq!(ids(&board[1].tasks), vec![3]);
    }

    #[test]
    fn columns_outside_the_board_are_dropped() {
        let tasks = sample();
        let board = group_by_status(&tasks, &Filters::default(), &[Status::InProgress, Status::Done]);
        let shown: usize = board.iter().map(|c| c.tasks.len()).sum();
        assert_eq!(shown, 4);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut tasks = sample();
        tasks[1].case_type = Some(CaseType::Succession);
        tasks[3].file_number = Some("2025-MART-07".into());
        tasks[4].title = Some("Donation Petit".into());

        let by = |q: &str| ids(&Filters::default().apply(FilterAction::SetSearch(q.into())).filter(&tasks));
        assert_eq!(by("mart"), vec![1, 3, 4]);
        assert_eq!(by("SUCC"), vec![2]);
        assert_eq!(by("petit"), vec![5]);
        assert_eq!(by("   "), vec![1, 2, 3, 4, 5]);
        assert!(by("zzz").is_empty());
    }

    #[test]
    fn dimensions_combine() {
        let mut tasks = sample();
        tasks[2].notaire = Some("Me Leroy".into());
        tasks[2].case_type = Some(CaseType::Vente);
        let filters = Filters::default()
            .apply(FilterAction::SetClient(Some("Martin".into())))
            .apply(FilterAction::SetNotaire(Some("Me Leroy".into())))
            .apply(FilterAction::SetCaseType(Some(CaseType::Vente)));
        assert_eq!(ids(&filters.filter(&tasks)), vec![3]);

        let other = filters.apply(FilterAction::SetCaseType(Some(CaseType::Divorce)));
        assert!(other.filter(&tasks).is_empty());
    }

    #[test]
    fn blank_selection_means_all() {
        let filters = Filters::default().apply(FilterAction::SetClient(Some("  ".into())));
        assert_eq!(filters.client, None);
        assert!(!filters.is_active());

        let spaces = Filters::default().apply(FilterAction::SetSearch("   ".into()));
        assert!(!spaces.is_active());
        assert_eq!(spaces.filter(&sample()).len(), sample().len());
    }

    #[test]
    fn facets_come_from_the_unfiltered_list() {
        let mut tasks = sample();
        tasks[0].notaire = Some("Me Leroy".into());
        tasks[3].notaire = Some("Me Blanc".into());
        let facets = Facets::extract(&tasks);
        assert_eq!(facets.clients, vec!["Dupont", "Leroy", "Martin"]);
        assert_eq!(facets.notaires, vec!["Me Blanc", "Me Leroy"]);
        assert_eq!(facets.priorities, vec![Priority::Low, Priority::High]);
        assert_eq!(facets.case_types.len(), 8);
    }

    #[test]
    fn reset_clears_every_dimension() {
        let filters = Filters::default()
            .apply(FilterAction::SetPriority(Some(Priority::Urgent)))
            .apply(FilterAction::SetClient(Some("Martin".into())))
            .apply(FilterAction::SetNotaire(Some("Me Leroy".into())))
            .apply(FilterAction::SetCaseType(Some(CaseType::Pret)))
            .apply(FilterAction::SetSearch("x".into()));
        assert!(filters.is_active());
        let reset = filters.apply(FilterAction::Reset);
        assert_eq!(reset, Filters::default());
        let tasks = sample();
        assert_eq!(reset.filter(&tasks).len(), tasks.len());
    }

    fn arb_filters() -> impl Strategy<Value = Filters> {
        (
            proptest::option::of(proptest::sample::select(Priority::ALL.to_vec())),
            proptest::option::of(proptest::sample::select(vec!["Martin", "Dupont", "Inconnu"])),
            "[a-zA-Z]{0,3}",
        )
            .prop_map(|(priority, client, search)| Filters {
                priority,
                client: client.map(str::to_string),
                search,
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn reset_always_restores_the_full_list(filters in arb_filters()) {
            let tasks = sample();
            let reset = filters.apply(FilterAction::Reset);
            prop_assert_eq!(reset.filter(&tasks).len(), tasks.len());
        }

        #[test]
        fn buckets_are_a_subset_in_list_order(filters in arb_filters()) {
            let tasks = sample();
            let board = group_by_status(&tasks, &filters, &Status::ALL);
            let mut seen = Vec::new();
            for column in &board {
                let column_ids = ids(&column.tasks);
                let mut sorted = column_ids.clone();
                sorted.sort_unstable();
                prop_assert_eq!(&column_ids, &sorted);
                seen.extend(column_ids);
            }
            seen.sort_unstable();
            prop_assert_eq!(seen, ids(&filters.filter(&tasks)));
        }
    }
}
