//! Fuzzy search index over task titles.
//!
//! The `SearchIndex` is a derived, disposable structure: it is rebuilt from
//! the task collection after every mutation and holds nothing that survives a
//! rebuild. It supports:
//!
//! - Case-insensitive approximate substring matching over `title`
//! - Relevance ranking (closest match first, collection order on ties)
//! - Parallel scoring via Rayon for large collections
//!
//! ## Scoring
//!
//! A title is scored by the smallest edit distance between the query and any
//! window of the title, divided by the query length. Where the window sits in
//! the title does not matter. `0.0` is an exact substring hit; a title
//! matches when its score is at or below the configured threshold.

use crate::collection::TaskCollection;
use crate::types::Task;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Default match threshold: tolerates about two typos in a six letter word.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Entry count above which scoring switches to parallel iteration.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// Tuning knobs for the search index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum normalized edit distance that still counts as a match
    pub threshold: f64,

    /// Switch to parallel scoring above this many entries
    pub parallel_threshold: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            threshold: DEFAULT_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// A search hit with relevance scoring.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matching task
    pub task: Task,

    /// Normalized edit distance (lower is more relevant)
    pub score: f64,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(task: Task, score: f64) -> Self {
        SearchResult { task, score }
    }
}

struct IndexEntry {
    task: Task,
    title: Vec<char>,
}

/// Searchable snapshot of the task collection.
///
/// ## Example
///
/// ```rust
/// use taskdeck_core::{SearchIndex, Task, TaskCollection};
///
/// let collection = TaskCollection::from_tasks(vec![
///     Task::new("1", "Write report"),
///     Task::new("2", "Buy milk"),
/// ]);
/// let index = SearchIndex::build(&collection);
///
/// let results = index.search("reprot");
/// assert_eq!(results[0].task.title, "Write report");
/// ```
pub struct SearchIndex {
    /// Indexed titles with their tasks, in collection order
    entries: Vec<IndexEntry>,

    options: SearchOptions,

    /// Collection generation this index was built from
    source_generation: u64,

    /// Number of rebuilds performed
    rebuilds: u64,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

impl SearchIndex {
    /// Create a new empty index.
    pub fn new(options: SearchOptions) -> Self {
        SearchIndex {
            entries: Vec::new(),
            options,
            source_generation: 0,
            rebuilds: 0,
        }
    }

    /// Build an index from a collection with default options.
    pub fn build(collection: &TaskCollection) -> Self {
        let mut index = Self::default();
        index.rebuild(collection);
        index
    }

    /// Get the number of indexed tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search options in effect.
    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Number of rebuilds performed since creation.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Returns true if the index was built from this exact collection state.
    pub fn is_current(&self, collection: &TaskCollection) -> bool {
        self.source_generation == collection.generation()
    }

    /// Discard all entries and re-index the collection.
    pub fn rebuild(&mut self, collection: &TaskCollection) {
        self.entries = collection
            .as_slice()
            .iter()
            .map(|task| IndexEntry {
                title: task.title.to_lowercase().chars().collect(),
                task: task.clone(),
            })
            .collect();
        self.source_generation = collection.generation();
        self.rebuilds += 1;

        debug!(
            entries = self.entries.len(),
            generation = self.source_generation,
            "Search index rebuilt"
        );
    }

    /// Search titles for the query, best match first.
    ///
    /// An empty (or whitespace-only) query returns no results.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let pattern: Vec<char> = query.trim().to_lowercase().chars().collect();
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut results = if self.entries.len() > self.options.parallel_threshold {
            self.search_parallel(&pattern)
        } else {
            self.search_sequential(&pattern)
        };

        // Stable sort keeps collection order among equal scores
        results.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
        results
    }

    fn search_sequential(&self, pattern: &[char]) -> Vec<SearchResult> {
        self.entries
            .iter()
            .filter_map(|entry| self.score_entry(entry, pattern))
            .collect()
    }

    fn search_parallel(&self, pattern: &[char]) -> Vec<SearchResult> {
        self.entries
            .par_iter()
            .filter_map(|entry| self.score_entry(entry, pattern))
            .collect()
    }

    fn score_entry(&self, entry: &IndexEntry, pattern: &[char]) -> Option<SearchResult> {
        let score = fuzzy_score(pattern, &entry.title, self.options.threshold)?;
        Some(SearchResult::new(entry.task.clone(), score))
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("entries", &self.entries.len())
            .field("options", &self.options)
            .field("source_generation", &self.source_generation)
            .finish()
    }
}

/// Score `text` against `pattern`, or `None` if it is outside the threshold.
///
/// Only windows whose length is within the error budget of the pattern length
/// can beat the budget, so those are the only ones compared.
fn fuzzy_score(pattern: &[char], text: &[char], threshold: f64) -> Option<f64> {
    let m = pattern.len();
    if m == 0 {
        return None;
    }

    if text.windows(m).any(|w| w == pattern) {
        return Some(0.0);
    }

    let budget = (threshold * m as f64).floor() as usize;
    if budget == 0 {
        return None;
    }

    let needle: String = pattern.iter().collect();
    let n = text.len();
    let shortest = m.saturating_sub(budget).max(1);
    let longest = (m + budget).min(n);

    let mut best = usize::MAX;
    if n < shortest {
        best = strsim::levenshtein(&needle, &text.iter().collect::<String>());
    } else {
        'outer: for len in shortest..=longest {
            for window in text.windows(len) {
                let window: String = window.iter().collect();
                best = best.min(strsim::levenshtein(&needle, &window));
                if best == 1 {
                    break 'outer;
                }
            }
        }
    }

    if best > budget {
        return None;
    }
    Some(best as f64 / m as f64)
}
