use super::domain::DomainIndex;
use super::filter::{FilterError, FilterState};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Filter evaluation: rows passing every active column constraint
// ---------------------------------------------------------------------------

/// Return positions of rows that pass all active filters, in dataset order.
///
/// A row passes a column filter when:
/// * The column has no selection → passes (no constraint)
/// * The row's value for that column is in the selected set → passes
/// * The row lacks the column → fails
pub fn compute_visible(dataset: &Dataset, state: &FilterState) -> Vec<usize> {
    dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            state.active().all(|(col, selected)| {
                row.get(col).is_some_and(|value| selected.contains(value))
            })
        })
        .map(|(i, _)| i)
        .collect()
}

/// Same result as [`compute_visible`], driven by the value → positions
/// lookup of a [`DomainIndex`] built from `dataset`.
///
/// Only rows holding a selected value are touched, so narrow selections on
/// large tables avoid a full scan per column.
pub fn compute_visible_indexed(
    dataset: &Dataset,
    index: &DomainIndex,
    state: &FilterState,
) -> Result<Vec<usize>, FilterError> {
    if index.generation() != dataset.generation() {
        return Err(FilterError::StaleIndex {
            index_generation: index.generation(),
            dataset_generation: dataset.generation(),
        });
    }

    let wanted = state.active_count();
    if wanted == 0 {
        return Ok((0..dataset.len()).collect());
    }

    // Each row holds at most one value per column, so a row matches every
    // constraint exactly when its hit count reaches `wanted`.
    let mut hits = vec![0usize; dataset.len()];
    for (col, selected) in state.active() {
        let Some(domain) = index.domain(col) else {
            return Ok(Vec::new());
        };
        for value in selected {
            for &pos in domain.positions(value) {
                hits[pos] += 1;
            }
        }
    }

    Ok(hits
        .iter()
        .enumerate()
        .filter(|&(_, &n)| n == wanted)
        .map(|(i, _)| i)
        .collect())
}
