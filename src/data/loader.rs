use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Table};
use crate::error::{PipelineError, Result};

/// Tokens read as a missing value, following the Pandas `read_csv` defaults.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / no extension – comma separated, header row required
/// * `.tsv`     – tab separated, header row required
/// * `.json`    – `[{ "Continent": "Asia", "Suitability": 0.8, ... }, ...]`
/// * `.parquet` – flat scalar columns
///
/// `delimiter` overrides the separator for the delimited formats.
pub fn load_file(path: &Path, delimiter: Option<u8>) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" | "" => load_delimited(path, delimiter.unwrap_or(b','))?,
        "tsv" | "tab" => load_delimited(path, delimiter.unwrap_or(b'\t'))?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => {
            return Err(PipelineError::parse(
                path,
                format!("unsupported file extension: .{other}"),
            ))
        }
    };

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| PipelineError::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

fn check_headers(path: &Path, headers: &[String]) -> Result<()> {
    if headers.is_empty() {
        return Err(PipelineError::parse(path, "missing header row"));
    }
    let mut seen = BTreeSet::new();
    for h in headers {
        if !seen.insert(h.as_str()) {
            return Err(PipelineError::parse(path, format!("duplicate column '{h}'")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names, one record per line. Short records are
/// padded with missing values; records longer than the header are an error.
fn load_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let file = open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    check_headers(path, &headers)?;

    let width = headers.len();
    let mut table = Table::new(headers);
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(PipelineError::parse(
                path,
                format!("line {line}: expected {width} fields, found {}", record.len()),
            ));
        }
        let mut row: Vec<CellValue> = record.iter().map(parse_cell).collect();
        row.resize(width, CellValue::Null);
        table.rows.push(row);
    }

    Ok(table)
}

fn csv_error(path: &Path, err: csv::Error) -> PipelineError {
    let line = err.position().map(|p| p.line());
    match err.into_kind() {
        csv::ErrorKind::Io(source) => PipelineError::FileAccess {
            path: path.to_path_buf(),
            source,
        },
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => PipelineError::parse(
            path,
            format!(
                "line {}: expected {expected_len} fields, found {len}",
                line.unwrap_or_default()
            ),
        ),
        csv::ErrorKind::Utf8 { err, .. } => PipelineError::parse(
            path,
            format!("line {}: {err}", line.unwrap_or_default()),
        ),
        other => PipelineError::parse(path, format!("{other:?}")),
    }
}

/// Type a single text cell by content.
pub fn parse_cell(raw: &str) -> CellValue {
    let s = raw.trim();
    if MISSING_TOKENS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        // `f64::from_str` also accepts spellings like `NAN` or `+nan`.
        return if f.is_nan() {
            CellValue::Null
        } else {
            CellValue::Float(f)
        };
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "Continent": "Asia", "Species": "A. alba", "Suitability": 0.8 },
///   ...
/// ]
/// ```
///
/// Keys missing from a record read as null.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| PipelineError::parse(path, e.to_string()))?;

    let records = root
        .as_array()
        .ok_or_else(|| PipelineError::parse(path, "expected a top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| PipelineError::parse(path, format!("record {i} is not an object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    check_headers(path, &headers)?;

    let mut table = Table::new(headers);
    for rec in records {
        // Every record was checked to be an object above.
        let Some(obj) = rec.as_object() else { continue };
        let row = table
            .column_names
            .iter()
            .map(|col| obj.get(col).map_or(CellValue::Null, json_to_cell))
            .collect();
        table.rows.push(row);
    }

    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, integers, floats,
/// booleans). Nested columns are rejected.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| PipelineError::parse(path, format!("reading parquet metadata: {e}")))?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    check_headers(path, &headers)?;

    let reader = builder
        .build()
        .map_err(|e| PipelineError::parse(path, format!("building parquet reader: {e}")))?;

    let mut table = Table::new(headers);
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| PipelineError::parse(path, format!("reading record batch: {e}")))?;

        let columns = batch.columns();
        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .zip(&table.column_names)
                .map(|(col, name)| {
                    arrow_cell(col, row).ok_or_else(|| {
                        PipelineError::parse(
                            path,
                            format!("column '{name}' has unsupported type {:?}", col.data_type()),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            table.rows.push(cells);
        }
    }

    Ok(table)
}

/// Extract a single cell from an Arrow column. `None` for unsupported types.
fn arrow_cell(col: &ArrayRef, row: usize) -> Option<CellValue> {
    if col.is_null(row) {
        return Some(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }
        DataType::Float32 => float_cell(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => float_cell(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => return None,
    };
    Some(cell)
}

/// Pandas writes missing floats as NaN.
fn float_cell(v: f64) -> CellValue {
    if v.is_nan() {
        CellValue::Null
    } else {
        CellValue::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float32Array, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(tmp, "{contents}").unwrap();
        tmp
    }

    #[test]
    fn parse_cell_infers_types() {
        assert_eq!(parse_cell("42"), CellValue::Integer(42));
        assert_eq!(parse_cell(" 0.75 "), CellValue::Float(0.75));
        assert_eq!(parse_cell("1e-3"), CellValue::Float(0.001));
        assert_eq!(parse_cell("True"), CellValue::Bool(true));
        assert_eq!(parse_cell("Asia"), CellValue::Text("Asia".into()));
        for token in ["", "NA", "NaN", "nan", "null", "N/A", "NAN", "+nan", "Nan"] {
            assert_eq!(parse_cell(token), CellValue::Null, "token {token:?}");
        }
    }

    #[test]
    fn csv_keeps_header_order() {
        let tmp = write_temp(
            ".csv",
            "Continent,Species,Suitability\nAsia,A. alba,0.8\nEurope,B. nigra,\n",
        );
        let table = load_file(tmp.path(), None).unwrap();
        assert_eq!(table.column_names, ["Continent", "Species", "Suitability"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2], CellValue::Float(0.8));
        assert_eq!(table.rows[1][2], CellValue::Null);
    }

    #[test]
    fn custom_delimiter() {
        let tmp = write_temp(".csv", "Continent;Suitability\nAsia;0,5\nAfrica;1\n");
        let table = load_file(tmp.path(), Some(b';')).unwrap();
        assert_eq!(table.column_names, ["Continent", "Suitability"]);
        // A decimal comma is not a number.
        assert_eq!(table.rows[0][1], CellValue::Text("0,5".into()));
        assert_eq!(table.rows[1][1], CellValue::Integer(1));
    }

    #[test]
    fn tsv_defaults_to_tab() {
        let tmp = write_temp(".tsv", "Continent\tSuitability\nAsia\t0.5\n");
        let table = load_file(tmp.path(), None).unwrap();
        assert_eq!(table.rows[0][1], CellValue::Float(0.5));
    }

    #[test]
    fn missing_file_is_file_access_error() {
        let err = load_file(Path::new("/definitely/not/here.csv"), None).unwrap_err();
        assert!(matches!(err, PipelineError::FileAccess { .. }), "{err:?}");
    }

    #[test]
    fn ragged_row_is_parse_error() {
        let tmp = write_temp(".csv", "Continent,Suitability\nAsia,0.5,extra\n");
        let err = load_file(tmp.path(), None).unwrap_err();
        match err {
            PipelineError::Parse { message, .. } => {
                assert!(message.contains("expected 2 fields, found 3"), "{message}")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn short_row_is_padded_with_nulls() {
        let tmp = write_temp(".csv", "Continent,a,b\nAsia,0.5\nEurope\n");
        let table = load_file(tmp.path(), None).unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec![CellValue::Text("Asia".into()), CellValue::Float(0.5), CellValue::Null],
                vec![CellValue::Text("Europe".into()), CellValue::Null, CellValue::Null],
            ]
        );
    }

    #[test]
    fn empty_file_is_parse_error() {
        let tmp = write_temp(".csv", "");
        let err = load_file(tmp.path(), None).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn duplicate_header_is_parse_error() {
        let tmp = write_temp(".csv", "Continent,x,x\nAsia,1,2\n");
        let err = load_file(tmp.path(), None).unwrap_err();
        assert!(err.to_string().contains("duplicate column 'x'"), "{err}");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let tmp = write_temp(".xlsx", "whatever");
        let err = load_file(tmp.path(), None).unwrap_err();
        assert!(err.to_string().contains("unsupported file extension"), "{err}");
    }

    #[test]
    fn json_records_fill_missing_keys_with_null() {
        let tmp = write_temp(
            ".json",
            r#"[{"Continent": "Asia", "Suitability": 0.8},
                {"Continent": "Europe", "Extra": 3}]"#,
        );
        let table = load_file(tmp.path(), None).unwrap();
        let suit = table.column_index("Suitability").unwrap();
        let extra = table.column_index("Extra").unwrap();
        assert_eq!(table.rows[0][suit], CellValue::Float(0.8));
        assert_eq!(table.rows[1][suit], CellValue::Null);
        assert_eq!(table.rows[0][extra], CellValue::Null);
        assert_eq!(table.rows[1][extra], CellValue::Integer(3));
    }

    #[test]
    fn json_must_be_an_array() {
        let tmp = write_temp(".json", r#"{"Continent": "Asia"}"#);
        let err = load_file(tmp.path(), None).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn parquet_flat_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Continent", DataType::Utf8, true),
            Field::new("Suitability", DataType::Float64, true),
            Field::new("Count", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Asia"), None])),
                Arc::new(Float64Array::from(vec![Some(0.25), None])),
                Arc::new(Int32Array::from(vec![3, 4])),
            ],
        )
        .unwrap();

        let tmp = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(tmp.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(tmp.path(), None).unwrap();
        assert_eq!(table.column_names, ["Continent", "Suitability", "Count"]);
        assert_eq!(
            table.rows,
            vec![
                vec![
                    CellValue::Text("Asia".into()),
                    CellValue::Float(0.25),
                    CellValue::Integer(3)
                ],
                vec![CellValue::Null, CellValue::Null, CellValue::Integer(4)],
            ]
        );
    }

    #[test]
    fn parquet_float32_nan_is_missing() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Continent", DataType::Utf8, false),
            Field::new("Suitability", DataType::Float32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Asia", "Asia", "Asia"])),
                Arc::new(Float32Array::from(vec![0.5, f32::NAN, 0.25])),
            ],
        )
        .unwrap();

        let tmp = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(tmp.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(tmp.path(), None).unwrap();
        let suit: Vec<&CellValue> = table.column(1).collect();
        assert_eq!(
            suit,
            [&CellValue::Float(0.5), &CellValue::Null, &CellValue::Float(0.25)]
        );
    }
}
