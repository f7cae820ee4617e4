//! The filter pipeline that produces the presented task list.
//!
//! `compute_view` is a pure function of the collection, the search index and
//! the filter state. It is evaluated on every read and never cached. Stages
//! run in a fixed order, each narrowing the previous stage's output:
//!
//! 1. Search (only for a non-blank query): replaces the working set with the
//!    index results, which also reorders by relevance
//! 2. Status: `all`, `completed` or `inProgress`
//! 3. Priority (only for a non-empty filter): exact string comparison

use crate::collection::TaskCollection;
use crate::index::SearchIndex;
use crate::types::{FilterState, StatusFilter, Task};

/// A single narrowing stage of the pipeline.
#[derive(Debug, Clone)]
pub enum TaskFilter {
    /// Keep tasks matching the completion status
    Status(StatusFilter),

    /// Keep tasks whose priority renders exactly as this string
    Priority(String),
}

impl TaskFilter {
    /// Check if a task passes this filter.
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::Status(status) => status.matches(task),
            TaskFilter::Priority(wanted) => task
                .priority_label()
                .map_or(false, |label| label == *wanted),
        }
    }
}

/// Predicate stages implied by the filter state, in application order.
pub fn predicates(state: &FilterState) -> Vec<TaskFilter> {
    let mut filters = Vec::with_capacity(2);
    if state.status_filter != StatusFilter::All {
        filters.push(TaskFilter::Status(state.status_filter));
    }
    if !state.priority_filter.is_empty() {
        filters.push(TaskFilter::Priority(state.priority_filter.clone()));
    }
    filters
}

/// Compute the filtered view of the collection.
///
/// The search stage is skipped for a blank query. The index is only read.
pub fn compute_view(
    collection: &TaskCollection,
    index: &SearchIndex,
    state: &FilterState,
) -> Vec<Task> {
    let working: Vec<Task> = if state.search_query.trim().is_empty() {
        collection.snapshot()
    } else {
        index
            .search(&state.search_query)
            .into_iter()
            .map(|result| result.task)
            .collect()
    };

    let filters = predicates(state);
    working
        .into_iter()
        .filter(|task| filters.iter().all(|f| f.matches(task)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_collection() -> TaskCollection {
        TaskCollection::from_tasks(vec![
            Task::new("1", "Write report").with_priority(1),
            Task::new("2", "Write email").with_priority(2).with_completed(true),
            Task::new("3", "Buy milk").with_priority(1),
            Task::new("4", "Report expenses"),
        ])
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_default_state_passes_everything() {
        let collection = make_collection();
        let index = SearchIndex::build(&collection);

        let view = compute_view(&collection, &index, &FilterState::default());
        assert_eq!(ids(&view), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_status_filter() {
        let collection = make_collection();
        let index = SearchIndex::build(&collection);

        let state = FilterState {
            status_filter: StatusFilter::Completed,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&collection, &index, &state)), vec!["2"]);

        let state = FilterState {
            status_filter: StatusFilter::InProgress,
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&collection, &index, &state)), vec!["1", "3", "4"]);
    }

    #[test]
    fn test_priority_filter_is_exact_string() {
        let collection = make_collection();
        let index = SearchIndex::build(&collection);

        let state = FilterState {
            priority_filter: "1".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&compute_view(&collection, &index, &state)), vec!["1", "3"]);

        let state = FilterState {
            priority_filter: "01".to_string(),
            ..Default::default()
        };
        assert!(compute_view(&collection, &index, &state).is_empty());
    }

    #[test]
    fn test_search_then_predicates() {
        let collection = make_collection();
        let index = SearchIndex::build(&collection);

        let state = FilterState {
            search_query: "report".to_string(),
            ..Default::default()
        };
        let view = compute_view(&collection, &index, &state);
        assert_eq!(ids(&view), vec!["1", "4"]);

        let state = FilterState {
            search_query: "report".to_string(),
            priority_filter: "1".to_string(),
            status_filter: StatusFilter::InProgress,
        };
        assert_eq!(ids(&compute_view(&collection, &index, &state)), vec!["1"]);
    }

    #[test]
    fn test_blank_query_skips_search() {
        let collection = make_collection();
        let index = SearchIndex::build(&collection);

        for query in [" ", "\t", "   "] {
            let state = FilterState {
                search_query: query.to_string(),
                ..Default::default()
            };
            assert_eq!(
                ids(&compute_view(&collection, &index, &state)),
                vec!["1", "2", "3", "4"]
            );
        }
    }

    #[test]
    fn test_compute_view_is_idempotent() {
        let collection = make_collection();
        let index = SearchIndex::build(&collection);
        let state = FilterState {
            search_query: "write".to_string(),
            status_filter: StatusFilter::All,
            priority_filter: String::new(),
        };

        let first = compute_view(&collection, &index, &state);
        let second = compute_view(&collection, &index, &state);
        assert_eq!(first, second);
        assert_eq!(index.rebuilds(), 1);
    }

    #[test]
    fn test_predicates_order() {
        let state = FilterState {
            search_query: String::new(),
            status_filter: StatusFilter::Completed,
            priority_filter: "3".to_string(),
        };
        let filters = predicates(&state);
        assert!(matches!(filters[0], TaskFilter::Status(StatusFilter::Completed)));
        assert!(matches!(filters[1], TaskFilter::Priority(ref p) if p == "3"));
        assert!(predicates(&FilterState::default()).is_empty());
    }
}
