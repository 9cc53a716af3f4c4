//! Writes a simulated NDVI dataset over the Indian subcontinent.
//!
//! Usage: `generate_sample [OUTPUT] [STEPS]` (defaults: `ndvi_data.json`, 8).
//! An OUTPUT ending in `.parquet` is written as Parquet, anything else as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

#[derive(Serialize)]
struct Location {
    lat: f64,
    lon: f64,
    ndvi_series: Vec<f64>,
}

#[derive(Serialize)]
struct Dataset {
    locations: Vec<Location>,
}

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

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Logistic green-up from `base` towards `peak`, centred on step `onset`.
fn green_up(steps: usize, base: f64, peak: f64, onset: f64, rng: &mut SimpleRng) -> Vec<f64> {
    (0..steps)
        .map(|t| {
            let s = 1.0 / (1.0 + (-(t as f64 - onset) * 1.4).exp());
            let noise = rng.uniform(-0.03, 0.03);
            ((base + (peak - base) * s + noise).clamp(0.0, 1.0) * 1000.0).round() / 1000.0
        })
        .collect()
}

fn generate(steps: usize, rng: &mut SimpleRng) -> Vec<Location> {
    let mut locations = Vec::new();
    for lat_idx in 0..14 {
        for lon_idx in 0..15 {
            let lat = 8.0 + lat_idx as f64 * 2.0 + rng.uniform(-0.6, 0.6);
            let lon = 68.0 + lon_idx as f64 * 2.0 + rng.uniform(-0.6, 0.6);

            // Drier north-west, greener east and south.
            let wetness = ((lon - 68.0) / 28.0 * 0.6 + (34.0 - lat) / 26.0 * 0.4).clamp(0.0, 1.0);
            let base = 0.12 + 0.2 * wetness + rng.uniform(0.0, 0.05);
            let peak = 0.35 + 0.5 * wetness + rng.uniform(-0.05, 0.08);
            let onset = rng.uniform(1.0, steps as f64);

            locations.push(Location {
                lat: (lat * 10_000.0).round() / 10_000.0,
                lon: (lon * 10_000.0).round() / 10_000.0,
                ndvi_series: green_up(steps, base, peak, onset, rng),
            });
        }
    }
    locations
}

fn write_json(path: &str, dataset: &Dataset) -> Result<()> {
    let text = serde_json::to_string_pretty(dataset).context("serialising dataset")?;
    std::fs::write(path, text).with_context(|| format!("writing {path}"))
}

fn write_parquet(path: &str, dataset: &Dataset) -> Result<()> {
    let lat = Float64Array::from_iter_values(dataset.locations.iter().map(|l| l.lat));
    let lon = Float64Array::from_iter_values(dataset.locations.iter().map(|l| l.lon));

    let mut series = ListBuilder::new(Float64Builder::new());
    for loc in &dataset.locations {
        let values = series.values();
        for &v in &loc.ndvi_series {
            values.append_value(v);
        }
        series.append(true);
    }
    let series = series.finish();

    let schema = Arc::new(Schema::new(vec![
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new(
            "ndvi_series",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(lat), Arc::new(lon), Arc::new(series)],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "ndvi_data.json".to_string());
    let steps: usize = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid step count '{s}'"))?,
        None => 8,
    };

    let mut rng = SimpleRng::new(42);
    let dataset = Dataset {
        locations: generate(steps, &mut rng),
    };

    if output.to_ascii_lowercase().ends_with(".parquet") {
        write_parquet(&output, &dataset)?;
    } else {
        write_json(&output, &dataset)?;
    }

    println!(
        "Wrote {} locations ({steps} NDVI steps each) to {output}",
        dataset.locations.len()
    );
    Ok(())
}
