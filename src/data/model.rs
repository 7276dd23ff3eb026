use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of [`Dataset::generation`] values.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// Row – one record of the source table
// ---------------------------------------------------------------------------

/// A single row: column name → cell value, in source column order.
///
/// Every value is an opaque string; the empty string is a regular value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: BTreeMap<String, String>,
    /// Column names in the order they were first inserted.
    order: Vec<String>,
}

impl Row {
    /// Value of `column`, or `None` when the row lacks that column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Column names in source order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    /// A repeated column keeps its first position and its last value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::default();
        for (k, v) in iter {
            let k = k.into();
            if !row.cells.contains_key(&k) {
                row.order.push(k.clone());
            }
            row.cells.insert(k, v.into());
        }
        row
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table. Rows are never mutated after construction; a new
/// load replaces the whole dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Row>,
    /// Display / domain order of the columns.
    column_names: Vec<String>,
    /// Unique per constructed dataset; clones share it.
    generation: u64,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::with_columns(Vec::new(), Vec::new())
    }
}

impl Dataset {
    /// Build a dataset whose column order is taken from the first row.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let header: Vec<String> = rows
            .first()
            .map(|r| r.columns().map(str::to_string).collect())
            .unwrap_or_default();
        Self::with_columns(header, rows)
    }

    /// Build a dataset with an explicit column order (usually the source
    /// header). Columns that only appear in later rows are appended in
    /// first-seen order so that every column of the data is known.
    pub fn with_columns(header: Vec<String>, rows: Vec<Row>) -> Self {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut column_names = Vec::with_capacity(header.len());
        for col in header {
            if seen.insert(col.clone()) {
                column_names.push(col);
            }
        }
        for row in &rows {
            for col in row.columns() {
                if !seen.contains(col) {
                    seen.insert(col.to_string());
                    column_names.push(col.to_string());
                }
            }
        }
        Dataset {
            rows,
            column_names,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, position: usize) -> Option<&Row> {
        self.rows.get(position)
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Identity of this dataset, recorded by indexes built from it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_order_follows_header() {
        let rows = vec![Row::from_iter([("b", "1"), ("a", "2")])];
        let ds = Dataset::with_columns(vec!["b".into(), "a".into()], rows);
        assert_eq!(ds.column_names(), ["b", "a"]);
    }

    #[test]
    fn first_row_order_is_source_order() {
        let rows = vec![Row::from_iter([("year", "2022"), ("country", "FR")])];
        let ds = Dataset::from_rows(rows);
        assert_eq!(ds.column_names(), ["year", "country"]);
    }

    #[test]
    fn repeated_column_keeps_first_position() {
        let row = Row::from_iter([("a", "1"), ("b", "2"), ("a", "3")]);
        assert_eq!(row.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(row.get("a"), Some("3"));
    }

    #[test]
    fn late_columns_are_appended() {
        let rows = vec![
            Row::from_iter([("a", "1")]),
            Row::from_iter([("a", "2"), ("z", "x")]),
        ];
        let ds = Dataset::from_rows(rows);
        assert_eq!(ds.column_names(), ["a", "z"]);
        assert_eq!(ds.row(0).and_then(|r| r.get("z")), None);
        assert_eq!(ds.row(1).and_then(|r| r.get("z")), Some("x"));
    }

    #[test]
    fn empty_dataset_has_no_columns() {
        let ds = Dataset::from_rows(Vec::new());
        assert!(ds.is_empty());
        assert!(ds.column_names().is_empty());
    }

    #[test]
    fn each_dataset_gets_its_own_generation() {
        let a = Dataset::from_rows(vec![Row::from_iter([("a", "1")])]);
        let b = Dataset::from_rows(vec![Row::from_iter([("a", "1")])]);
        assert_ne!(a.generation(), b.generation());
        assert_eq!(a.clone().generation(), a.generation());
    }
}
