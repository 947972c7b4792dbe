use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Cell, Manifest, ManifestRow, MetadataValue};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a manifest from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by one row per audio file (the usual case)
/// * `.json`    – `[{ "Name": "...", "Set": "...", ... }, ...]`
/// * `.parquet` – flat table of scalar columns
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let manifest = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported manifest extension: .{other}"),
    }?;

    log::debug!(
        "Loaded manifest {} ({} rows, columns {:?})",
        path.display(),
        manifest.len(),
        manifest.columns
    );
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one record per file.
/// Every cell keeps its text; types are guessed only for sorting.
fn load_csv(path: &Path) -> Result<Manifest> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.is_empty() {
        bail!("CSV has no header row");
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells = record.iter().map(Cell::from_text).collect();
        rows.push(ManifestRow { cells });
    }

    Ok(Manifest { columns, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Name": "sample01", "Set": "progress" },
///   { "Name": "sample02", "Set": "train" }
/// ]
/// ```
///
/// Columns are the union of keys in first-seen order; a key missing from
/// a record becomes a null cell.
fn load_json(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| ManifestRow {
            cells: columns
                .iter()
                .map(|col| {
                    Cell::from_value(obj.get(col).map_or(MetadataValue::Null, json_to_metadata))
                })
                .collect(),
        })
        .collect();

    Ok(Manifest { columns, rows })
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet manifest.
///
/// Every column must be a scalar (strings, ints, floats, bools, dates).
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Manifest> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let n_rows = batch.num_rows();

        for row in 0..n_rows {
            let cells = (0..batch.num_columns())
                .map(|col_idx| {
                    extract_cell(batch.column(col_idx), row).with_context(|| {
                        format!("Row {row}: failed to read '{}'", columns[col_idx])
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(ManifestRow { cells });
        }
    }

    Ok(Manifest { columns, rows })
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::from_value(MetadataValue::Null));
    }
    let value = match col.data_type() {
        DataType::Utf8 => Some(MetadataValue::String(
            col.as_string::<i32>().value(row).to_string(),
        )),
        DataType::LargeUtf8 => Some(MetadataValue::String(
            col.as_string::<i64>().value(row).to_string(),
        )),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|arr| MetadataValue::Integer(arr.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|arr| MetadataValue::Integer(arr.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|arr| MetadataValue::Float(arr.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|arr| MetadataValue::Float(arr.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map(|arr| MetadataValue::Bool(arr.value(row))),
        DataType::Date32 | DataType::Date64 => {
            Some(MetadataValue::Date(array_value_to_string(col.as_ref(), row)?))
        }
        DataType::List(_) | DataType::LargeList(_) | DataType::Struct(_) | DataType::Map(_, _) => {
            bail!("nested column type {:?} is not supported", col.data_type())
        }
        _ => Some(MetadataValue::String(array_value_to_string(col.as_ref(), row)?)),
    };

    value
        .map(Cell::from_value)
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}
