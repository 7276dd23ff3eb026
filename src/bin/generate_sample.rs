use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::StringArray;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const COLUMNS: [&str; 5] = ["country", "year", "product", "channel", "units"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[(self.next_u64() % choices.len() as u64) as usize]
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let countries = ["FR", "DE", "IT", "ES", "NL"];
    let years = ["2021", "2022", "2023"];
    let products = ["Widget", "Gadget", "Gizmo", "Doohickey"];
    // The empty channel models a missing entry in the export.
    let channels = ["web", "store", "partner", ""];

    let mut rows: Vec<[String; 5]> = Vec::new();
    for _ in 0..500 {
        rows.push([
            rng.pick(&countries).to_string(),
            rng.pick(&years).to_string(),
            rng.pick(&products).to_string(),
            rng.pick(&channels).to_string(),
            (1 + rng.next_u64() % 250).to_string(),
        ]);
    }

    // Write CSV
    let csv_path = "sample_data.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV output")?;
    writer.write_record(COLUMNS)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    // Write Parquet with the same content
    let schema = Arc::new(Schema::new(
        COLUMNS
            .iter()
            .map(|c| Field::new(*c, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    ));
    let arrays = (0..COLUMNS.len())
        .map(|i| {
            Arc::new(StringArray::from(
                rows.iter().map(|r| r[i].as_str()).collect::<Vec<_>>(),
            )) as arrow::array::ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let parquet_path = "sample_data.parquet";
    let file = std::fs::File::create(parquet_path).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;

    println!("Wrote {} rows to {csv_path} and {parquet_path}", rows.len());
    Ok(())
}
