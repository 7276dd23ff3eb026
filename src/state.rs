use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::color::ColorMap;
use crate::config::ViewerConfig;
use crate::data::domain::DomainIndex;
use crate::data::evaluate::compute_visible_indexed;
use crate::data::filter::{set_selection, FilterError, FilterState};
use crate::data::loader::{load_file, LoadOptions};
use crate::data::model::{Dataset, Row};

/// Direction of the table sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full viewing session, independent of rendering.
///
/// `filters` and `visible` only ever change together: a selection update
/// computes the next pair first and commits it in one step.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    dataset: Option<Dataset>,

    /// Distinct values per column of `dataset`.
    domains: DomainIndex,

    /// Per-column filter selections.
    filters: FilterState,

    /// Positions of rows passing the current filters (cached).
    visible: Vec<usize>,

    /// Column and direction the table is sorted by, if any.
    sort: Option<(String, SortOrder)>,

    /// `visible` in table order; equal to it while unsorted.
    display: Vec<usize>,

    /// Zero-based page of `visible` shown in the table.
    page: usize,

    pub page_size: usize,
    pub page_size_options: Vec<usize>,

    /// Per-column search text narrowing the listed filter options.
    pub option_search: BTreeMap<String, String>,

    /// Which column is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Preferred colour column from the config, applied on each load.
    preferred_color_column: Option<String>,

    /// How delimited files are parsed.
    pub load_options: LoadOptions,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            dataset: None,
            domains: DomainIndex::default(),
            filters: FilterState::default(),
            visible: Vec::new(),
            sort: None,
            display: Vec::new(),
            page: 0,
            page_size: config.page_size,
            page_size_options: config.page_size_options.clone(),
            option_search: BTreeMap::new(),
            color_column: None,
            color_map: None,
            preferred_color_column: config.color_column.clone(),
            load_options: config.load_options(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset: rebuild domains, reset filters, show all rows.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.domains = DomainIndex::build(&dataset);
        self.filters = FilterState::default();
        self.visible = (0..dataset.len()).collect();
        self.display = self.visible.clone();
        self.sort = None;
        self.page = 0;
        self.option_search.clear();

        // Default colour column: configured one if present, else none.
        self.color_column = self
            .preferred_color_column
            .clone()
            .filter(|c| self.domains.contains_column(c));
        self.rebuild_color_map();

        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Load `path` and make it the current dataset. A failed load keeps the
    /// previous dataset and reports the error in `status_message`.
    pub fn open_path(&mut self, path: &Path) {
        match load_file(path, &self.load_options) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                    }
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn domains(&self) -> &DomainIndex {
        &self.domains
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Positions of the visible rows, in dataset order.
    pub fn visible_indices(&self) -> &[usize] {
        &self.visible
    }

    /// Visible rows, in dataset order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        let rows = self.dataset.as_ref().map(Dataset::rows).unwrap_or(&[]);
        self.visible.iter().filter_map(move |&i| rows.get(i))
    }

    /// Replace the selection of `column` and recompute the visible rows.
    ///
    /// On error nothing changes: the previous filters and visible rows stay.
    pub fn set_selection<I, S>(&mut self, column: &str, values: I) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next = set_selection(&self.filters, &self.domains, column, values)?;
        self.commit(next)
    }

    /// Add or remove one value from a column's selection.
    pub fn toggle_value(&mut self, column: &str, value: &str) -> Result<(), FilterError> {
        let mut selected: BTreeSet<String> =
            self.filters.selection(column).cloned().unwrap_or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.set_selection(column, selected)
    }

    /// Select every domain value of `column`.
    pub fn select_all(&mut self, column: &str) -> Result<(), FilterError> {
        let values = self
            .domains
            .values(column)
            .ok_or_else(|| FilterError::UnknownColumn(column.to_string()))?
            .to_vec();
        self.set_selection(column, values)
    }

    /// Drop the constraint on `column`.
    pub fn clear_selection(&mut self, column: &str) -> Result<(), FilterError> {
        self.set_selection(column, Vec::<String>::new())
    }

    /// Drop every constraint.
    pub fn clear_all(&mut self) -> Result<(), FilterError> {
        self.commit(FilterState::default())
    }

    fn commit(&mut self, next: FilterState) -> Result<(), FilterError> {
        let visible = match &self.dataset {
            Some(ds) => compute_visible_indexed(ds, &self.domains, &next)?,
            None => Vec::new(),
        };
        log::debug!(
            "{} active filters, {} of {} rows visible",
            next.active_count(),
            visible.len(),
            self.dataset.as_ref().map_or(0, Dataset::len)
        );
        self.filters = next;
        self.visible = visible;
        self.rebuild_display();
        self.page = 0;
        Ok(())
    }

    // -- Sorting --

    pub fn sort(&self) -> Option<(&str, SortOrder)> {
        self.sort.as_ref().map(|(col, order)| (col.as_str(), *order))
    }

    /// Cycle `column` through ascending, descending and unsorted. Sorting a
    /// different column starts it ascending.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort = match self.sort.take() {
            Some((col, SortOrder::Ascending)) if col == column => {
                Some((col, SortOrder::Descending))
            }
            Some((col, SortOrder::Descending)) if col == column => None,
            _ => Some((column.to_string(), SortOrder::Ascending)),
        };
        self.rebuild_display();
        self.page = 0;
    }

    /// Positions of the visible rows in table order.
    pub fn display_indices(&self) -> &[usize] {
        &self.display
    }

    /// Reorder `visible` by the sort column. Cells compare as plain strings,
    /// rows lacking the column come first, ties keep dataset order.
    fn rebuild_display(&mut self) {
        let mut display = self.visible.clone();
        if let (Some((col, order)), Some(ds)) = (&self.sort, &self.dataset) {
            let cell = |pos: usize| ds.row(pos).and_then(|row| row.get(col));
            display.sort_by(|&a, &b| {
                let ord = cell(a).cmp(&cell(b));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        self.display = display;
    }

    // -- Pagination --

    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages; at least one so an empty table still has a page.
    pub fn page_count(&self) -> usize {
        self.visible.len().div_ceil(self.page_size.max(1)).max(1)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count() - 1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 0;
    }

    /// Row positions shown on the current page, in table order.
    pub fn page_indices(&self) -> &[usize] {
        let size = self.page_size.max(1);
        let start = (self.page * size).min(self.display.len());
        let end = (start + size).min(self.display.len());
        &self.display[start..end]
    }

    // -- Colouring --

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: Option<String>) {
        self.color_column = col;
        self.rebuild_color_map();
    }

    fn rebuild_color_map(&mut self) {
        self.color_map = self.color_column.as_ref().and_then(|col| {
            self.domains
                .values(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(Dataset::with_columns(
            vec!["country".into(), "year".into()],
            vec![
                Row::from_iter([("country", "FR"), ("year", "2022")]),
                Row::from_iter([("country", "DE"), ("year", "2022")]),
                Row::from_iter([("country", "FR"), ("year", "2023")]),
            ],
        ));
        state
    }

    #[test]
    fn nothing_loaded() {
        let state = AppState::default();
        assert!(state.dataset().is_none());
        assert!(state.domains().is_empty());
        assert!(state.visible_indices().is_empty());
        assert_eq!(state.page_count(), 1);
    }

    #[test]
    fn new_dataset_shows_everything_unfiltered() {
        let state = loaded();
        assert_eq!(state.visible_indices(), [0, 1, 2]);
        assert!(state.filters().is_unrestricted());
        assert_eq!(state.domains().values("country").unwrap(), ["FR", "DE"]);
    }

    #[test]
    fn selection_updates_visible_rows() {
        let mut state = loaded();
        state.set_selection("country", ["FR"]).unwrap();
        assert_eq!(state.visible_indices(), [0, 2]);
        state.set_selection("year", ["2023"]).unwrap();
        assert_eq!(state.visible_indices(), [2]);
        let years: Vec<_> = state.visible_rows().filter_map(|r| r.get("year")).collect();
        assert_eq!(years, ["2023"]);
    }

    #[test]
    fn unknown_column_keeps_previous_view() {
        let mut state = loaded();
        state.set_selection("country", ["DE"]).unwrap();
        let err = state.set_selection("colour", ["red"]).unwrap_err();
        assert_eq!(err, FilterError::UnknownColumn("colour".into()));
        assert_eq!(state.visible_indices(), [1]);
        assert!(state.filters().is_selected("country", "DE"));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut state = loaded();
        state.toggle_value("country", "DE").unwrap();
        assert_eq!(state.visible_indices(), [1]);
        state.toggle_value("country", "FR").unwrap();
        assert_eq!(state.visible_indices(), [0, 1, 2]);
        state.toggle_value("country", "DE").unwrap();
        state.toggle_value("country", "FR").unwrap();
        assert!(state.filters().selection("country").is_none());
        assert_eq!(state.visible_indices(), [0, 1, 2]);
    }

    #[test]
    fn select_all_and_clear() {
        let mut state = loaded();
        state.set_selection("year", ["2022"]).unwrap();
        state.select_all("country").unwrap();
        assert_eq!(state.filters().selection("country").unwrap().len(), 2);
        assert_eq!(state.visible_indices(), [0, 1]);
        state.clear_all().unwrap();
        assert_eq!(state.visible_indices(), [0, 1, 2]);
        assert!(state.select_all("colour").is_err());
    }

    #[test]
    fn reload_resets_filters() {
        let mut state = loaded();
        state.set_selection("country", ["DE"]).unwrap();
        state.set_dataset(Dataset::from_rows(vec![Row::from_iter([("city", "Lyon")])]));
        assert!(state.filters().is_unrestricted());
        assert_eq!(state.visible_indices(), [0]);
        assert!(state.set_selection("country", ["DE"]).is_err());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = loaded();
        state.set_selection("country", ["FR"]).unwrap();
        state.open_path(Path::new("/nonexistent/data.csv"));
        assert!(state.status_message.is_some());
        assert_eq!(state.visible_indices(), [0, 2]);
    }

    #[test]
    fn open_path_loads_delimited_file() {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "country;year\nFR;2022\nDE;2023\n").unwrap();

        let mut state = loaded();
        state.set_selection("country", ["FR"]).unwrap();
        state.status_message = Some("stale".into());
        state.open_path(file.path());
        assert!(state.status_message.is_none());
        assert!(state.filters().is_unrestricted());
        assert_eq!(state.domains().values("year").unwrap(), ["2022", "2023"]);
        assert_eq!(state.visible_indices(), [0, 1]);
    }

    #[test]
    fn pagination() {
        let mut state = AppState::new(&ViewerConfig {
            page_size: 2,
            ..ViewerConfig::default()
        });
        state.set_dataset(Dataset::from_rows(
            (0..5)
                .map(|i| Row::from_iter([("n", i.to_string())]))
                .collect(),
        ));
        assert_eq!(state.page_count(), 3);
        state.set_page(2);
        assert_eq!(state.page_indices(), [4]);
        state.set_page(10);
        assert_eq!(state.page(), 2);

        state.set_selection("n", ["1", "3"]).unwrap();
        assert_eq!(state.page(), 0);
        assert_eq!(state.page_indices(), [1, 3]);
        assert_eq!(state.page_count(), 1);
    }

    fn sales() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(Dataset::with_columns(
            vec!["country".into(), "units".into()],
            vec![
                Row::from_iter([("country", "FR"), ("units", "30")]),
                Row::from_iter([("country", "DE"), ("units", "10")]),
                Row::from_iter([("country", "IT")]),
                Row::from_iter([("country", "FR"), ("units", "20")]),
            ],
        ));
        state
    }

    #[test]
    fn sort_orders_the_table_not_the_visible_rows() {
        let mut state = sales();
        state.toggle_sort("country");
        assert_eq!(state.sort(), Some(("country", SortOrder::Ascending)));
        assert_eq!(state.display_indices(), [1, 0, 3, 2]);
        assert_eq!(state.page_indices(), [1, 0, 3, 2]);
        assert_eq!(state.visible_indices(), [0, 1, 2, 3]);
    }

    #[test]
    fn sort_cycles_through_descending_and_off() {
        let mut state = sales();
        state.toggle_sort("units");
        // Row 2 has no units and sorts first.
        assert_eq!(state.display_indices(), [2, 1, 3, 0]);
        state.toggle_sort("units");
        assert_eq!(state.sort(), Some(("units", SortOrder::Descending)));
        assert_eq!(state.display_indices(), [0, 3, 1, 2]);
        state.toggle_sort("units");
        assert_eq!(state.sort(), None);
        assert_eq!(state.display_indices(), [0, 1, 2, 3]);

        state.toggle_sort("units");
        state.toggle_sort("country");
        assert_eq!(state.sort(), Some(("country", SortOrder::Ascending)));
    }

    #[test]
    fn sort_ties_keep_dataset_order() {
        let mut state = sales();
        state.toggle_sort("country");
        state.toggle_sort("country");
        // FR rows 0 and 3 tie in both directions.
        assert_eq!(state.display_indices(), [2, 0, 3, 1]);
    }

    #[test]
    fn sort_survives_filter_changes() {
        let mut state = sales();
        state.toggle_sort("units");
        state.set_selection("country", ["FR", "DE"]).unwrap();
        assert_eq!(state.visible_indices(), [0, 1, 3]);
        assert_eq!(state.display_indices(), [1, 3, 0]);

        state.set_dataset(loaded().dataset().unwrap().clone());
        assert_eq!(state.sort(), None);
        assert_eq!(state.display_indices(), [0, 1, 2]);
    }

    #[test]
    fn sorting_returns_to_first_page() {
        let mut state = AppState::new(&ViewerConfig {
            page_size: 2,
            ..ViewerConfig::default()
        });
        state.set_dataset(sales().dataset().unwrap().clone());
        state.set_page(1);
        state.toggle_sort("country");
        assert_eq!(state.page(), 0);
        assert_eq!(state.page_indices(), [1, 0]);
    }

    #[test]
    fn colour_column_from_config() {
        let mut state = AppState::new(&ViewerConfig {
            color_column: Some("country".into()),
            ..ViewerConfig::default()
        });
        state.set_dataset(loaded().dataset().unwrap().clone());
        assert_eq!(state.color_column.as_deref(), Some("country"));
        assert!(state.color_map.is_some());

        state.set_dataset(Dataset::from_rows(vec![Row::from_iter([("city", "Lyon")])]));
        assert!(state.color_column.is_none());
        assert!(state.color_map.is_none());
    }
}
