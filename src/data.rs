//! CSV import and export of customer records using Polars

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context};
use polars::df;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::record::{ensure_unique_ids, Feature, Record};

/// Contents of the sample file offered to new users
pub const SAMPLE_CSV: &str = "id,name,age,income,spendingScore
1,John Doe,25,50000,80
2,Jane Smith,35,80000,60
3,Bob Johnson,45,120000,40
4,Alice Williams,28,45000,85
5,Charlie Brown,52,150000,30
";

/// Load customer records from a CSV file with a header row
///
/// # Arguments
/// * `file_path` - Path to the CSV file
///
/// Recognized columns are `id`, `name`, `age`, `income` and the spending
/// score under any of its synonyms. Header matching ignores case. Missing
/// ids and names are generated from the row number.
///
/// # Returns
/// * Validated records in file order
pub fn load_records(file_path: impl AsRef<Path>) -> crate::Result<Vec<Record>> {
    let path = file_path.as_ref();

    // Read every cell as text so numeric errors can name the offending value
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("failed to parse CSV file {}", path.display()))?;

    debug!(rows = df.height(), columns = df.width(), "read CSV");

    let records = records_from_frame(&df)?;
    ensure_unique_ids(&records)?;

    info!(count = records.len(), path = %path.display(), "loaded customer records");
    Ok(records)
}

/// Convert a text-typed DataFrame into records
fn records_from_frame(df: &DataFrame) -> crate::Result<Vec<Record>> {
    let ids = text_cells(df, &["id"])?;
    let names = text_cells(df, &["name"])?;

    let mut features = Vec::with_capacity(Feature::ALL.len());
    for feature in Feature::ALL {
        match text_cells(df, feature.synonyms())? {
            Some(cells) => features.push(cells),
            None => bail!(
                "missing {} column: expected one of {}",
                feature.column_name(),
                feature.synonyms().join(", ")
            ),
        }
    }

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let blank = features.iter().all(|cells| cell(cells, row).is_none())
            && cell_opt(&ids, row).is_none()
            && cell_opt(&names, row).is_none();
        if blank {
            continue;
        }

        let number = row + 1;
        let id = cell_opt(&ids, row)
            .map(str::to_string)
            .unwrap_or_else(|| format!("customer-{number}"));
        let name = cell_opt(&names, row)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Customer {number}"));

        let mut values = [0.0; 3];
        for (feature, cells) in Feature::ALL.into_iter().zip(&features) {
            values[feature.index()] = parse_number(cell(cells, row), number, feature)?;
        }

        let record = Record::new(id, name, values[0], values[1], values[2]);
        validate_record(&record).with_context(|| format!("row {number} is invalid"))?;
        records.push(record);
    }

    Ok(records)
}

/// Text of the first column matching one of `names`, or `None` when absent
fn text_cells(df: &DataFrame, names: &[&str]) -> crate::Result<Option<Vec<Option<String>>>> {
    let column = names.iter().find_map(|wanted| {
        df.get_columns()
            .iter()
            .find(|column| column.name().eq_ignore_ascii_case(wanted))
    });

    let Some(column) = column else {
        return Ok(None);
    };

    let series = column
        .as_materialized_series()
        .cast(&DataType::String)
        .with_context(|| format!("column {} is not readable as text", column.name()))?;
    let cells = series
        .str()?
        .into_iter()
        .map(|value| value.map(|s| s.trim().to_string()))
        .collect();
    Ok(Some(cells))
}

fn cell(cells: &[Option<String>], row: usize) -> Option<&str> {
    cells
        .get(row)
        .and_then(|value| value.as_deref())
        .filter(|value| !value.is_empty())
}

fn cell_opt(cells: &Option<Vec<Option<String>>>, row: usize) -> Option<&str> {
    cells.as_deref().and_then(|cells| cell(cells, row))
}

fn parse_number(raw: Option<&str>, row: usize, feature: Feature) -> crate::Result<f64> {
    let Some(raw) = raw else {
        bail!("row {row}: {} is empty", feature.column_name());
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => bail!(
            "row {row}: {} value {raw:?} is not a number",
            feature.column_name()
        ),
    }
}

/// Check a record against the accepted input ranges
pub fn validate_record(record: &Record) -> std::result::Result<(), ValidationError> {
    if record.name.trim().is_empty() {
        return Err(ValidationError::MissingField {
            id: record.id.clone(),
            field: "name",
        });
    }
    if record.id.trim().is_empty() {
        return Err(ValidationError::MissingField {
            id: record.id.clone(),
            field: "id",
        });
    }
    record.check_finite()?;

    for feature in Feature::ALL {
        let range = feature.valid_range();
        let value = feature.value(record);
        if !range.contains(&value) {
            return Err(ValidationError::OutOfRange {
                id: record.id.clone(),
                field: feature.column_name(),
                value,
                min: *range.start(),
                max: *range.end(),
            });
        }
    }
    Ok(())
}

/// Export records as CSV with columns `id,name,age,income,spendingScore[,cluster]`
///
/// The `cluster` column is written when any record carries a segment.
pub fn write_records(file_path: impl AsRef<Path>, records: &[Record]) -> crate::Result<()> {
    let path = file_path.as_ref();

    let mut df = df!(
        "id" => records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        "name" => records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "age" => records.iter().map(|r| r.age).collect::<Vec<_>>(),
        "income" => records.iter().map(|r| r.income).collect::<Vec<_>>(),
        "spendingScore" => records.iter().map(|r| r.spending_score).collect::<Vec<_>>()
    )?;

    if records.iter().any(|r| r.segment.is_some()) {
        let segments: Vec<String> = records
            .iter()
            .map(|r| r.segment.map(|s| s.to_string()).unwrap_or_default())
            .collect();
        df.with_column(Series::new("cluster".into(), segments))?;
    }

    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(count = records.len(), path = %path.display(), "exported customer records");
    Ok(())
}

/// Write the sample CSV file
pub fn write_sample(file_path: impl AsRef<Path>) -> crate::Result<()> {
    let path = file_path.as_ref();
    std::fs::write(path, SAMPLE_CSV)
        .with_context(|| format!("failed to write sample to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Segment;
    use crate::rules::ValueTier;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_load_sample() {
        let test_file = create_test_csv(SAMPLE_CSV);
        let records = load_records(test_file.path()).unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].name, "John Doe");
        assert_eq!(records[4].income, 150_000.0);
        assert_eq!(records[3].spending_score, 85.0);
    }

    #[test]
    fn test_header_synonyms_and_defaults() {
        let test_file = create_test_csv("Age,Income,spending_score\n30,40000,55\n41,62000,20\n");
        let records = load_records(test_file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "customer-1");
        assert_eq!(records[1].name, "Customer 2");
        assert_eq!(records[1].spending_score, 20.0);

        let test_file = create_test_csv("name,age,income,score\nZoe,22,31000,99\n");
        let records = load_records(test_file.path()).unwrap();
        assert_eq!(records[0].spending_score, 99.0);
        assert_eq!(records[0].name, "Zoe");
    }

    #[test]
    fn test_missing_feature_column() {
        let test_file = create_test_csv("id,name,age,income\n1,A,30,1000\n");
        let err = load_records(test_file.path()).unwrap_err();
        assert!(err.to_string().contains("spendingScore"));
    }

    #[test]
    fn test_non_numeric_value_names_row_and_field() {
        let test_file = create_test_csv("id,name,age,income,spendingScore\n1,A,30,lots,50\n");
        let err = load_records(test_file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("row 1"), "{message}");
        assert!(message.contains("income"), "{message}");
    }

    #[test]
    fn test_out_of_range_rejected() {
        let test_file = create_test_csv("id,name,age,income,spendingScore\n1,A,130,1000,50\n");
        let err = load_records(test_file.path()).unwrap_err();
        let cause = err.downcast_ref::<ValidationError>().unwrap();
        assert!(matches!(cause, ValidationError::OutOfRange { field: "age", .. }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let test_file =
            create_test_csv("id,name,age,income,spendingScore\n7,A,30,1000,50\n7,B,31,1000,50\n");
        let err = load_records(test_file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate customer id: 7"));
    }

    #[test]
    fn test_validate_record() {
        assert!(validate_record(&Record::new("1", "A", 0.0, 0.0, 1.0)).is_ok());
        assert!(validate_record(&Record::new("1", "A", 120.0, 500_000.0, 100.0)).is_ok());

        let err = validate_record(&Record::new("1", "A", 30.0, 1000.0, 0.0)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                id: "1".to_string(),
                field: "spendingScore",
                value: 0.0,
                min: 1.0,
                max: 100.0
            }
        );

        let err = validate_record(&Record::new("1", "  ", 30.0, 1000.0, 5.0)).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { field: "name", .. }));
    }

    #[test]
    fn test_write_and_reload() {
        let records = vec![
            Record::new("a", "Smith, Jane", 35.0, 80_000.0, 60.0).with_segment(Segment::Cluster(1)),
            Record::new("b", "Bob", 45.0, 120_000.0, 40.0)
                .with_segment(Segment::Tier(ValueTier::MediumValue)),
        ];
        let out = NamedTempFile::new().unwrap();
        write_records(out.path(), &records).unwrap();

        let text = std::fs::read_to_string(out.path()).unwrap();
        assert!(text.starts_with("id,name,age,income,spendingScore,cluster"));
        assert!(text.contains("Medium Value"));

        let reloaded = load_records(out.path()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0].name, "Smith, Jane");
        assert_eq!(reloaded[1].income, 120_000.0);
    }

    #[test]
    fn test_write_without_segments_omits_cluster_column() {
        let records = vec![Record::new("a", "Ann", 35.0, 80_000.0, 60.0)];
        let out = NamedTempFile::new().unwrap();
        write_records(out.path(), &records).unwrap();

        let text = std::fs::read_to_string(out.path()).unwrap();
        assert_eq!(text.lines().next(), Some("id,name,age,income,spendingScore"));
    }

    #[test]
    fn test_write_sample() {
        let out = NamedTempFile::new().unwrap();
        write_sample(out.path()).unwrap();
        assert_eq!(load_records(out.path()).unwrap().len(), 5);
    }
}
