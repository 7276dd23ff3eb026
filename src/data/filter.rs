use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::domain::DomainIndex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("domain index was built from dataset #{index_generation}, not #{dataset_generation}")]
    StaleIndex {
        index_generation: u64,
        dataset_generation: u64,
    },
}

// ---------------------------------------------------------------------------
// Filter state: which values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: column_name → set of allowed values.
///
/// A column that is absent means "no filter" on that column. Empty sets are
/// never stored, so every entry is an active constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    selections: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this state with the selection of `column` replaced
    /// by `values`. An empty `values` removes the constraint.
    ///
    /// The column is not validated; see [`set_selection`].
    #[must_use]
    pub fn with_selection<I, S>(&self, column: &str, values: I) -> FilterState
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        let mut selections = self.selections.clone();
        if values.is_empty() {
            selections.remove(column);
        } else {
            selections.insert(column.to_string(), values);
        }
        FilterState { selections }
    }

    /// Selected values for `column`, if it is constrained.
    pub fn selection(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(column)
    }

    pub fn is_selected(&self, column: &str, value: &str) -> bool {
        self.selections
            .get(column)
            .is_some_and(|sel| sel.contains(value))
    }

    /// Active constraints in column-name order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.selections.iter().map(|(c, s)| (c.as_str(), s))
    }

    /// Number of constrained columns.
    pub fn active_count(&self) -> usize {
        self.selections.len()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.selections.is_empty()
    }
}

/// Replace the selection for `column`, validated against the loaded domains.
///
/// Selecting values that never occur is allowed; they simply match nothing.
/// An unknown column is a caller error and leaves `state` as it was.
pub fn set_selection<I, S>(
    state: &FilterState,
    index: &DomainIndex,
    column: &str,
    values: I,
) -> Result<FilterState, FilterError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if !index.contains_column(column) {
        return Err(FilterError::UnknownColumn(column.to_string()));
    }
    Ok(state.with_selection(column, values))
}
