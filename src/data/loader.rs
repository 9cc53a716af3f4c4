use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use reqwest::blocking::Client;

use super::model::{Dataset, LocationRecord};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Payload formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
    Parquet,
}

impl Format {
    /// Pick a format from a path or URL. Query strings and fragments are ignored.
    pub fn detect(source: &str) -> Result<Self> {
        let path_part = source
            .split(['?', '#'])
            .next()
            .unwrap_or(source);
        let ext = Path::new(path_part)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => bail!("Unsupported dataset extension: .{other}"),
        }
    }
}

/// Load an NDVI dataset from a local path or an `http(s)://` URL.
///
/// Blocks the calling thread; the UI goes through [`super::store::DatasetStore`].
pub fn load_source(source: &str) -> Result<Dataset, LoadError> {
    load_inner(source).map_err(|cause| LoadError::new(source, cause))
}

fn load_inner(source: &str) -> Result<Dataset> {
    let format = Format::detect(source)?;
    let bytes = if is_remote(source) {
        fetch_remote(source)?
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))?
    };
    let dataset = parse_bytes(&bytes, format)?;
    validate(&dataset)?;
    Ok(dataset)
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let response = Client::new()
        .get(url)
        .send()
        .with_context(|| format!("requesting {url}"))?;
    if !response.status().is_success() {
        bail!("server responded with {}", response.status());
    }
    let bytes = response.bytes().context("reading response body")?;
    Ok(bytes.to_vec())
}

/// Parse an in-memory payload.
pub fn parse_bytes(bytes: &[u8], format: Format) -> Result<Dataset> {
    match format {
        Format::Json => parse_json(bytes),
        Format::Csv => parse_csv(bytes),
        Format::Parquet => parse_parquet(bytes),
    }
}

/// Reject values that would poison distance or threshold comparisons.
fn validate(dataset: &Dataset) -> Result<()> {
    for (i, loc) in dataset.locations.iter().enumerate() {
        if !loc.lat.is_finite() || !loc.lon.is_finite() {
            bail!("Location {i}: coordinates ({}, {}) are not finite", loc.lat, loc.lon);
        }
        if let Some(j) = loc.ndvi_series.iter().position(|v| !v.is_finite()) {
            bail!("Location {i}, ndvi_series[{j}]: not a finite number");
        }
        if loc.ndvi_series.iter().any(|v| !(0.0..=1.0).contains(v)) {
            log::warn!("Location {i}: NDVI values outside [0, 1]");
        }
    }
    if dataset.is_empty() {
        log::warn!("Dataset contains no locations");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// { "locations": [ { "lat": 20.6, "lon": 78.9, "ndvi_series": [0.31, 0.42, ...] }, ... ] }
/// ```
fn parse_json(bytes: &[u8]) -> Result<Dataset> {
    serde_json::from_slice(bytes).context("parsing NDVI JSON")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with `lat`, `lon` and `ndvi_series` columns.
/// `ndvi_series` holds semicolon-separated floats: `"0.31;0.42;0.66"`.
/// Other columns are ignored.
fn parse_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let lat_idx = column("lat")?;
    let lon_idx = column("lon")?;
    let series_idx = column("ndvi_series")?;

    let mut locations = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let lat = parse_float(record.get(lat_idx).unwrap_or(""), row_no, "lat")?;
        let lon = parse_float(record.get(lon_idx).unwrap_or(""), row_no, "lon")?;
        let ndvi_series = parse_semicolon_floats(record.get(series_idx).unwrap_or(""), row_no)?;

        locations.push(LocationRecord {
            lat,
            lon,
            ndvi_series,
        });
    }

    Ok(Dataset::new(locations))
}

fn parse_float(s: &str, row: usize, col: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{s}' is not a number"))
}

fn parse_semicolon_floats(s: &str, row: usize) -> Result<Vec<f64>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, ndvi_series[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Expected schema:
/// - `lat`, `lon`: Float64 (Float32 accepted)
/// - `ndvi_series`: List<Float64> or LargeList<Float64> (Float32 items accepted)
fn parse_parquet(bytes: &[u8]) -> Result<Dataset> {
    let data = bytes::Bytes::copy_from_slice(bytes);
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut locations = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let index_of = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let lat_col = batch.column(index_of("lat")?);
        let lon_col = batch.column(index_of("lon")?);
        let series_col = batch.column(index_of("ndvi_series")?);

        for row in 0..batch.num_rows() {
            let lat = extract_f64(lat_col, row)
                .with_context(|| format!("Row {row}: failed to read 'lat'"))?;
            let lon = extract_f64(lon_col, row)
                .with_context(|| format!("Row {row}: failed to read 'lon'"))?;
            let ndvi_series = extract_f64_list(series_col, row)
                .with_context(|| format!("Row {row}: failed to read 'ndvi_series'"))?;

            locations.push(LocationRecord {
                lat,
                lon,
                ndvi_series,
            });
        }
    }

    Ok(Dataset::new(locations))
}

// -- Parquet / Arrow helpers --

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        bail!("Expected Float64 or Float32 column, got {:?}", col.data_type())
    }
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // Null items become NaN and are rejected by `validate`.
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Float64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::data::model::GeoPoint;

    fn expected() -> Dataset {
        Dataset::new(vec![
            LocationRecord {
                lat: 20.5,
                lon: 78.9,
                ndvi_series: vec![0.1, 0.7],
            },
            LocationRecord {
                lat: 28.6,
                lon: 77.2,
                ndvi_series: vec![0.3, 0.4, 0.5],
            },
        ])
    }

    #[test]
    fn detects_format_from_extension_and_url() {
        assert_eq!(Format::detect("ndvi_data.json").unwrap(), Format::Json);
        assert_eq!(Format::detect("DATA.CSV").unwrap(), Format::Csv);
        assert_eq!(
            Format::detect("https://example.org/ndvi.parquet?v=2").unwrap(),
            Format::Parquet
        );
        assert!(Format::detect("ndvi.txt").is_err());
    }

    #[test]
    fn parses_json_payload() {
        let json = br#"{ "locations": [
            { "lat": 20.5, "lon": 78.9, "ndvi_series": [0.1, 0.7] },
            { "lat": 28.6, "lon": 77.2, "ndvi_series": [0.3, 0.4, 0.5] }
        ] }"#;
        assert_eq!(parse_bytes(json, Format::Json).unwrap(), expected());
    }

    #[test]
    fn parses_csv_payload() {
        let csv = b"lat,lon,ndvi_series,region\n20.5,78.9,0.1;0.7,central\n28.6,77.2,0.3;0.4;0.5,north\n";
        assert_eq!(parse_bytes(csv, Format::Csv).unwrap(), expected());
    }

    #[test]
    fn csv_without_series_column_is_rejected() {
        let csv = b"lat,lon\n1,2\n";
        let err = parse_bytes(csv, Format::Csv).unwrap_err();
        assert!(format!("{err:#}").contains("ndvi_series"));
    }

    #[test]
    fn parses_parquet_payload() {
        let lat = Float64Array::from(vec![20.5, 28.6]);
        let lon = Float64Array::from(vec![78.9, 77.2]);
        let mut series = ListBuilder::new(Float64Builder::new());
        for row in [vec![0.1, 0.7], vec![0.3, 0.4, 0.5]] {
            for v in row {
                series.values().append_value(v);
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
        .unwrap();

        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        assert_eq!(parse_bytes(&buf, Format::Parquet).unwrap(), expected());
    }

    #[test]
    fn load_source_reads_a_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{ "locations": [ { "lat": 1.0, "lon": 2.0, "ndvi_series": [] } ] }"#)
            .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let ds = load_source(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert!(ds.locations[0].ndvi_series.is_empty());
    }

    #[test]
    fn malformed_payload_is_a_load_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ \"locations\": [ { \"lat\": \"north\" } ] }").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let err = load_source(&path).unwrap_err();
        assert_eq!(err.source_name, path);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let file = NamedTempFile::new().unwrap();
        let path = format!("{}.json", file.path().display());
        assert!(load_source(&path).is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let ds = Dataset::new(vec![LocationRecord {
            lat: 1.0,
            lon: 2.0,
            ndvi_series: vec![0.2, f64::NAN],
        }]);
        assert!(validate(&ds).is_err());
    }

    #[test]
    fn bundled_dataset_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/ndvi_data.json");
        let ds = load_source(path).unwrap();
        assert_eq!(ds.len(), 210);
        assert_eq!(ds.max_series_len(), 8);
        assert_eq!(ds.locations[0].point(), GeoPoint::new(7.505, 67.5494));
    }
}
