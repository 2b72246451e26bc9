use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Float64Builder, LargeListArray, ListArray, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::model::{DataCollection, Specifications, StationSeries};
use crate::error::Error;

/// Arrow schema metadata key holding the JSON specifications block.
pub const SPECIFICATIONS_KEY: &str = "barolink.specifications";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a station collection from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per station with `station`, `times` and
///   `pressures` columns; specifications in the schema metadata
/// * `.json`    – `{ "specifications": {...}, "data": { "<station>": {...} } }`
pub fn load_file(path: &Path) -> Result<DataCollection> {
    let collection = match extension(path).as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_collection_json(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    collection
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    log::info!(
        "Loaded {} stations ({} samples each) from {}",
        collection.stations().len(),
        collection.sample_count(),
        path.display()
    );
    Ok(collection)
}

/// Store a station collection.  Dispatch by extension, same formats as
/// [`load_file`].
pub fn save_file(collection: &DataCollection, path: &Path) -> Result<()> {
    match extension(path).as_str() {
        "parquet" | "pq" => save_parquet(collection, path),
        "json" => save_json(collection, path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Read any serde value (collections or derived results) from JSON.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    serde_json::from_str(&text).context("parsing JSON")
}

/// Specifications fields without a serde default.
const REQUIRED_SPECIFICATIONS: [&str; 3] = ["stations", "sampling_frequency", "filter_number"];

/// Parse a stored specifications block, reporting absent required fields as
/// [`Error::MissingSpecification`].
fn parse_specifications(block: serde_json::Value) -> Result<Specifications> {
    if let Some(field) = REQUIRED_SPECIFICATIONS.iter().find(|f| block.get(**f).is_none()) {
        return Err(Error::missing(*field).into());
    }
    serde_json::from_value(block).context("parsing specifications")
}

fn load_collection_json(path: &Path) -> Result<DataCollection> {
    let mut value: serde_json::Value = load_json(path)?;
    let Some(block) = value.get_mut("specifications") else {
        return Err(Error::missing("specifications").into());
    };
    let specifications = parse_specifications(block.take())?;
    let data = value
        .get_mut("data")
        .map(serde_json::Value::take)
        .context("JSON collection has no 'data' block")?;
    let data = serde_json::from_value(data).context("parsing station data")?;
    Ok(DataCollection {
        specifications,
        data,
    })
}

/// Write any serde value as pretty-printed JSON.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing JSON")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn list_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
        false,
    )
}

fn f64_list<'a>(rows: impl Iterator<Item = &'a [f64]>) -> ListArray {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().append_slice(row);
        builder.append(true);
    }
    builder.finish()
}

/// Write one row per station, in canonical station order.
fn save_parquet(collection: &DataCollection, path: &Path) -> Result<()> {
    let specs_json = serde_json::to_string(&collection.specifications).context("serializing specifications")?;
    let schema = Arc::new(
        Schema::new(vec![
            Field::new("station", DataType::Utf8, false),
            list_field("times"),
            list_field("pressures"),
        ])
        .with_metadata(HashMap::from([(SPECIFICATIONS_KEY.to_string(), specs_json)])),
    );

    let series = collection
        .stations()
        .iter()
        .map(|s| Ok(collection.series(s)?))
        .collect::<Result<Vec<_>>>()?;

    let stations = StringArray::from(collection.stations().to_vec());
    let times = f64_list(series.iter().map(|s| s.times.as_slice()));
    let pressures = f64_list(series.iter().map(|s| s.pressures.as_slice()));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(stations), Arc::new(times), Arc::new(pressures)],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    log::info!("Saved {} stations to {}", series.len(), path.display());
    Ok(())
}

/// Load a Parquet collection written by [`save_file`].
///
/// Expected schema:
/// - `station`: Utf8
/// - `times`, `pressures`: List<Float64> or LargeList<Float64>
/// - schema metadata `barolink.specifications`: JSON [`Specifications`]
fn load_parquet(path: &Path) -> Result<DataCollection> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let specs_json = builder
        .schema()
        .metadata()
        .get(SPECIFICATIONS_KEY)
        .with_context(|| format!("Parquet file missing '{SPECIFICATIONS_KEY}' metadata"))?;
    let specifications = parse_specifications(serde_json::from_str(specs_json).context("parsing specifications")?)?;

    let reader = builder.build().context("building parquet reader")?;
    let mut data = BTreeMap::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str| {
            schema
                .index_of(name)
                .map(|idx| batch.column(idx).clone())
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let station_col = column("station")?;
        let times_col = column("times")?;
        let pressures_col = column("pressures")?;

        let stations = station_col
            .as_any()
            .downcast_ref::<StringArray>()
            .context("'station' column is not Utf8")?;

        for row in 0..batch.num_rows() {
            let station = stations.value(row).to_string();
            let times = extract_f64_list(&times_col, row)
                .with_context(|| format!("Row {row}: failed to read 'times'"))?;
            let pressures = extract_f64_list(&pressures_col, row)
                .with_context(|| format!("Row {row}: failed to read 'pressures'"))?;
            data.insert(station, StationSeries { pressures, times });
        }
    }

    Ok(DataCollection {
        specifications,
        data,
    })
}

// -- Parquet / Arrow helpers --

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

    // The inner array can be Float64 or Float32
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
    use super::*;
    use crate::analysis::{excess_path_length, ExcessPathLengthResult};
    use crate::config::AnalysisConfig;
    use crate::data::model::tests::collection;

    fn sample() -> DataCollection {
        collection(
            &["dol", "ott", "sea"],
            vec![vec![1.0, 2.5, 3.0, 4.0], vec![0.1, 0.2, 0.3, 0.4], vec![-1.0, 0.0, 1.0, 2.0]],
            625.0,
        )
    }

    #[test]
    fn test_parquet_preserves_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.parquet");
        let original = sample();
        save_file(&original, &path).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_json_preserves_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.json");
        let original = sample();
        save_file(&original, &path).unwrap();
        assert_eq!(load_file(&path).unwrap(), original);
    }

    #[test]
    fn test_derived_result_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("excess.json");
        let excess = excess_path_length(&sample(), &AnalysisConfig::default()).unwrap();
        save_json(&excess, &path).unwrap();
        let loaded: ExcessPathLengthResult = load_json(&path).unwrap();
        assert_eq!(loaded, excess);

        let raw: serde_json::Value = load_json(&path).unwrap();
        let first = &raw["excess_path_length"][0];
        assert_eq!(first["first"], "dol");
        assert_eq!(first["second"], "ott");
        assert!(first["values"].is_array());
    }

    #[test]
    fn test_missing_specification_fields_reported() {
        let dir = tempfile::tempdir().unwrap();
        let original = sample();
        for field in REQUIRED_SPECIFICATIONS {
            let mut value = serde_json::to_value(&original).unwrap();
            value["specifications"].as_object_mut().unwrap().remove(field);
            let path = dir.path().join(format!("no_{field}.json"));
            std::fs::write(&path, value.to_string()).unwrap();

            let err = load_file(&path).unwrap_err();
            assert_eq!(
                err.downcast_ref::<Error>(),
                Some(&Error::MissingSpecification {
                    field: field.to_string()
                })
            );
        }

        let path = dir.path().join("no_block.json");
        std::fs::write(&path, r#"{"data": {}}"#).unwrap();
        assert_eq!(
            load_file(&path).unwrap_err().downcast_ref::<Error>(),
            Some(&Error::missing("specifications"))
        );
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.pkl");
        assert!(save_file(&sample(), &path).is_err());
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_rejects_invalid_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        let mut broken = sample();
        broken.data.get_mut("ott").unwrap().pressures.pop();
        save_json(&broken, &path).unwrap();
        assert!(load_file(&path).is_err());
    }
}
