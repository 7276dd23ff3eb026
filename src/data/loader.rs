use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Row};

/// Delimiters tried when none is configured, in order of preference.
const SNIFF_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Options for delimited-text sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter. `None` picks one from the extension or the first line.
    pub delimiter: Option<u8>,
    /// Whether the first record holds the column names.
    pub has_headers: bool,
    /// Trim surrounding whitespace from every field.
    pub trim: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_headers: true,
            trim: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` / `.tab` / `.psv` / `.txt` – delimited text
/// * `.json`    – `[{ "column": "value", ... }, ...]`
/// * `.parquet` – any flat Parquet file, cells rendered as text
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "tsv" | "tab" | "psv" | "txt" => load_delimited(path, &ext, options),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.column_names(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, ext: &str, options: &LoadOptions) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let delimiter = options
        .delimiter
        .or(match ext {
            "tsv" | "tab" => Some(b'\t'),
            "psv" => Some(b'|'),
            _ => None,
        })
        .unwrap_or_else(|| sniff_delimiter(&text));

    parse_delimited(&text, delimiter, options)
}

/// Parse delimited text into a [`Dataset`].
///
/// Records may be ragged: short records produce rows that lack the trailing
/// columns, surplus cells are dropped.
pub fn parse_delimited(text: &str, delimiter: u8, options: &LoadOptions) -> Result<Dataset> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(if options.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(text.as_bytes());

    // Empty lines never reach here; a lone `""` is a record with one empty cell.
    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        records.push(result.with_context(|| format!("CSV row {row_no}"))?);
    }

    let mut records = records.into_iter();
    let headers: Vec<String> = if options.has_headers {
        match records.next() {
            Some(header) => unique_headers(header.iter()),
            None => return Ok(Dataset::default()),
        }
    } else {
        let width = records.as_slice().iter().map(|r| r.len()).max().unwrap_or(0);
        (1..=width).map(|i| format!("column_{i}")).collect()
    };

    let mut rows = Vec::with_capacity(records.len());
    let mut surplus_rows = 0usize;
    let mut short_rows = 0usize;

    for record in records {
        if record.len() > headers.len() {
            surplus_rows += 1;
        } else if record.len() < headers.len() {
            short_rows += 1;
        }
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.as_str(), v))
                .collect::<Row>(),
        );
    }

    if surplus_rows > 0 {
        log::warn!("{surplus_rows} rows have more cells than the header; extra cells dropped");
    }
    if short_rows > 0 {
        log::warn!("{short_rows} rows have fewer cells than the header");
    }

    Ok(Dataset::with_columns(headers, rows))
}

/// Guess the delimiter from the first non-blank line: the candidate that
/// occurs most often outside quotes wins, `,` when none occurs.
pub fn sniff_delimiter(text: &str) -> u8 {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };

    let mut counts = [0usize; SNIFF_CANDIDATES.len()];
    let mut in_quotes = false;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = SNIFF_CANDIDATES.iter().position(|&c| c == b) {
                counts[i] += 1;
            }
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    SNIFF_CANDIDATES[best]
}

/// Give every header a distinct, non-empty name.
///
/// The first occurrence keeps its name; later duplicates get the smallest
/// `_N` suffix (from 2) that collides neither with a real header nor with an
/// earlier rename.
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<String> = raw
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.to_string()
            }
        })
        .collect();
    let reserved: BTreeSet<&str> = names.iter().map(String::as_str).collect();

    let mut taken: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::with_capacity(names.len());
    for base in &names {
        if taken.insert(base.clone()) {
            out.push(base.clone());
            continue;
        }
        let mut n = 2usize;
        let renamed = loop {
            let candidate = format!("{base}_{n}");
            if !reserved.contains(candidate.as_str()) && !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        log::warn!("duplicate column {base:?} renamed to {renamed:?}");
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    out
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, e.g. `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "country": "FR", "year": "2022" },
///   ...
/// ]
/// ```
///
/// Strings are kept as-is, `null` becomes the empty string, anything else is
/// rendered as JSON text.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut header: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        if i == 0 {
            header = obj.keys().cloned().collect();
        }

        rows.push(
            obj.iter()
                .map(|(key, val)| (key.clone(), json_to_cell(val)))
                .collect::<Row>(),
        );
    }

    Ok(Dataset::with_columns(header, rows))
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file. Every column becomes a text column; nulls are
/// the empty string.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let header: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(schema.fields().len());
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let col = batch.column(col_idx);
                let value = if col.is_null(row) {
                    String::new()
                } else {
                    array_value_to_string(col, row).with_context(|| {
                        format!("Row {row}: failed to read {:?}", field.name())
                    })?
                };
                cells.push((field.name().clone(), value));
            }
            rows.push(cells.into_iter().collect::<Row>());
        }
    }

    Ok(Dataset::with_columns(header, rows))
}
