use super::Debouncer;

use std::collections::BTreeMap;
use std::time::Duration;

use log::debug;
use tokio::sync::watch;

/// Filter state of one list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub fields: BTreeMap<String, String>,
}

impl FilterState {
    /// Search text plus non-empty field filters, ready for `RequestOptions::query`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let search = self.search.trim();
        let mut pairs = Vec::with_capacity(self.fields.len() + 1);
        if !search.is_empty() {
            pairs.push((String::from("search"), search.to_string()));
        }
        pairs.extend(
            self.fields
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(field, value)| (field.clone(), value.trim().to_string())),
        );
        pairs
    }

    fn apply(&mut self, change: FilterChange) {
        match change {
            FilterChange::Search(text) => self.search = text,
            FilterChange::Field { name, value } if value.is_empty() => {
                self.fields.remove(&name);
            }
            FilterChange::Field { name, value } => {
                self.fields.insert(name, value);
            }
        }
    }
}

/// One raw input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Search(String),
    /// An empty value clears the field.
    Field { name: String, value: String },
}

/// Debounced input feeding a watchable [`FilterState`].
///
/// Each input (the search box, each field) has its own quiet window, so typing in one
/// does not swallow a pending change in another.
pub struct DebouncedFilter {
    delay: Duration,
    state: watch::Sender<FilterState>,
    inputs: BTreeMap<String, Debouncer<FilterChange>>,
}

impl DebouncedFilter {
    pub fn new(delay: Duration) -> Self {
        let (state, _) = watch::channel(FilterState::default());
        Self {
            delay,
            state,
            inputs: BTreeMap::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> FilterState {
        self.state.borrow().clone()
    }

    pub fn change(&mut self, change: FilterChange) {
        let input = match &change {
            FilterChange::Search(_) => String::from("search"),
            FilterChange::Field { name, .. } => format!("field:{name}"),
        };

        let delay = self.delay;
        let state = self.state.clone();
        let debouncer = self.inputs.entry(input).or_insert_with(|| {
            Debouncer::new(delay, move |change: FilterChange| {
                debug!("Applying filter change {change:?}");
                state.send_modify(|current| current.apply(change));
            })
        });
        debouncer.push(change);
    }
}
