use std::collections::HashMap;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Column domain: distinct values of one column
// ---------------------------------------------------------------------------

/// Distinct values of a single column in first-seen order, plus the row
/// positions holding each value.
#[derive(Debug, Clone, Default)]
pub struct ColumnDomain {
    values: Vec<String>,
    /// value → ascending row positions
    positions: HashMap<String, Vec<usize>>,
    /// Rows that lack this column entirely.
    missing: usize,
}

impl ColumnDomain {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn positions(&self, value: &str) -> &[usize] {
        self.positions.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn missing(&self) -> usize {
        self.missing
    }
}

// ---------------------------------------------------------------------------
// DomainIndex: every column of a dataset
// ---------------------------------------------------------------------------

/// Per-column value domains of a [`Dataset`], in the dataset's column order.
///
/// Built once per load and never updated incrementally.
#[derive(Debug, Clone, Default)]
pub struct DomainIndex {
    columns: Vec<String>,
    domains: HashMap<String, ColumnDomain>,
    /// [`Dataset::generation`] of the source dataset.
    generation: u64,
}

impl DomainIndex {
    /// Scan `dataset` and collect every column's distinct values.
    ///
    /// An empty dataset yields an empty index (no columns known).
    pub fn build(dataset: &Dataset) -> Self {
        if dataset.is_empty() {
            return DomainIndex {
                generation: dataset.generation(),
                ..DomainIndex::default()
            };
        }

        let columns = dataset.column_names().to_vec();
        let mut domains: HashMap<String, ColumnDomain> = columns
            .iter()
            .map(|c| (c.clone(), ColumnDomain::default()))
            .collect();

        for (pos, row) in dataset.rows().iter().enumerate() {
            for col in &columns {
                let Some(domain) = domains.get_mut(col) else {
                    continue;
                };
                match row.get(col) {
                    Some(value) => match domain.positions.get_mut(value) {
                        Some(rows) => rows.push(pos),
                        None => {
                            domain.values.push(value.to_string());
                            domain.positions.insert(value.to_string(), vec![pos]);
                        }
                    },
                    None => domain.missing += 1,
                }
            }
        }

        for col in &columns {
            if let Some(domain) = domains.get(col) {
                if domain.missing > 0 {
                    log::warn!(
                        "column {col:?} is missing from {} of {} rows",
                        domain.missing,
                        dataset.len()
                    );
                }
            }
        }

        DomainIndex {
            columns,
            domains,
            generation: dataset.generation(),
        }
    }

    /// Column names in display order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.domains.contains_key(column)
    }

    pub fn domain(&self, column: &str) -> Option<&ColumnDomain> {
        self.domains.get(column)
    }

    /// Distinct values of `column` in first-seen order.
    pub fn values(&self, column: &str) -> Option<&[String]> {
        self.domain(column).map(ColumnDomain::values)
    }

    /// Iterate `(column, values)` in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.columns.iter().filter_map(|c| {
            self.domains
                .get(c)
                .map(|d| (c.as_str(), d.values.as_slice()))
        })
    }

    /// Generation of the dataset this index was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
