/// Data layer: core types, loading, domains and filtering.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Row>, column order
///   └──────────┘
///        │                  │
///        ▼                  ▼
///   ┌──────────┐      ┌──────────┐
///   │  domain   │      │ evaluate  │  FilterState → visible row positions
///   └──────────┘      └──────────┘
///   distinct values        ▲
///   per column             │
///                     ┌──────────┐
///                     │  filter   │  per-column selections
///                     └──────────┘
/// ```

pub mod domain;
pub mod evaluate;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
mod proptests;
