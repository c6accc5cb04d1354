use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::{AnalyzerError, Result};
use crate::models::VisitRecord;

pub const SITE_COLUMN: &str = "Site";
pub const DATE_COLUMN: &str = "Date";
pub const SOURCE_KEY_COLUMN: &str = "source_key";

/// A visit row plus the optional key that makes re-imports idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedVisit {
    pub record: VisitRecord,
    pub source_key: Option<String>,
}

struct Columns {
    site: usize,
    date: usize,
    source_key: Option<usize>,
}

fn position(headers: &csv::StringRecord, column: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == column)
}

fn check_headers(headers: &csv::StringRecord) -> Result<Columns> {
    match (position(headers, SITE_COLUMN), position(headers, DATE_COLUMN)) {
        (Some(site), Some(date)) => Ok(Columns {
            site,
            date,
            source_key: position(headers, SOURCE_KEY_COLUMN),
        }),
        (site, date) => {
            let mut missing = Vec::new();
            if site.is_none() {
                missing.push(SITE_COLUMN.to_string());
            }
            if date.is_none() {
                missing.push(DATE_COLUMN.to_string());
            }
            Err(AnalyzerError::Schema { missing })
        }
    }
}

/// Reads `Site`/`Date` rows plus an optional `source_key` column. Other columns are
/// ignored, and cells missing from short rows read as blank.
pub fn read_keyed_csv<R: Read>(input: R) -> Result<Vec<KeyedVisit>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(input);
    let columns = check_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").to_string();
        let source_key = columns
            .source_key
            .map(cell)
            .filter(|key| !key.trim().is_empty());

        rows.push(KeyedVisit {
            record: VisitRecord::new(cell(columns.site), cell(columns.date)),
            source_key,
        });
    }

    Ok(rows)
}

pub fn read_csv<R: Read>(input: R) -> Result<Vec<VisitRecord>> {
    let rows = read_keyed_csv(input)?;
    Ok(rows.into_iter().map(|row| row.record).collect())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| AnalyzerError::SourceUnavailable {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn read_keyed_csv_path(path: &Path) -> Result<Vec<KeyedVisit>> {
    read_keyed_csv(open(path)?)
}

pub fn read_csv_path(path: &Path) -> Result<Vec<VisitRecord>> {
    let records = read_csv(open(path)?)?;
    info!(rows = records.len(), path = %path.display(), "loaded visit records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_site_and_date_in_any_column_order() {
        let data = "Date,Notes,Site\n06/01/24,quarterly,NANT\n,,AMAG\n";
        let records = read_csv(data.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                VisitRecord::new("NANT", "06/01/24"),
                VisitRecord::new("AMAG", ""),
            ]
        );
    }

    #[test]
    fn missing_date_column_is_a_schema_error() {
        let data = "Site,Visited\nNANT,06/01/24\n";
        match read_csv(data.as_bytes()).unwrap_err() {
            AnalyzerError::Schema { missing } => assert_eq!(missing, vec!["Date".to_string()]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn header_only_file_yields_no_records() {
        let records = read_csv("Site,Date\n".as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn short_rows_read_as_blank_dates() {
        let data = "Site,Date\nNANT\nAMAG,07/04/24\n";
        let records = read_csv(data.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                VisitRecord::new("NANT", ""),
                VisitRecord::new("AMAG", "07/04/24"),
            ]
        );
    }

    #[test]
    fn missing_both_columns_lists_both() {
        match read_csv("Name,When\nNANT,06/01/24\n".as_bytes()).unwrap_err() {
            AnalyzerError::Schema { missing } => {
                assert_eq!(missing, vec!["Site".to_string(), "Date".to_string()])
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn keyed_rows_carry_source_keys() {
        let data = "Site,Date,source_key\nNANT,06/01/24,visit-1\nHOOK,06/02/24,\n";
        let rows = read_keyed_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].source_key.as_deref(), Some("visit-1"));
        assert_eq!(rows[0].record, VisitRecord::new("NANT", "06/01/24"));
        assert_eq!(rows[1].source_key, None);
    }

    #[test]
    fn keyed_import_rejects_file_without_date_column() {
        let data = "Site,source_key\nNANT,visit-1\n";
        match read_keyed_csv(data.as_bytes()).unwrap_err() {
            AnalyzerError::Schema { missing } => assert_eq!(missing, vec!["Date".to_string()]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = read_csv_path(Path::new("/nonexistent/visits.csv")).unwrap_err();
        assert!(matches!(err, AnalyzerError::SourceUnavailable { .. }));
    }
}
