//! Reading uploads (CSV or spreadsheet) into a string-typed DataFrame.

use std::collections::BTreeSet;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::debug;

use bls_model::canonical_column;

use crate::error::{IngestError, Result};

/// File kinds accepted by the upload control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Raw cells before typing.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub(crate) fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    match canonical_column(&collapsed) {
        Some(known) => known.to_string(),
        None => collapsed,
    }
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Reads an upload from disk, dispatching on the file extension.
pub fn read_upload(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = match FileKind::from_path(path)? {
        FileKind::Csv => read_csv_rows(path)?,
        FileKind::Spreadsheet => read_spreadsheet_rows(path)?,
    };
    debug!(
        path = %path.display(),
        columns = raw.headers.len(),
        rows = raw.rows.len(),
        "read upload"
    );
    raw_to_dataframe(raw)
}

pub fn read_csv_rows(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        rows.push(record.iter().map(normalize_cell).collect());
    }
    split_header(path, rows)
}

fn csv_error(path: &Path, err: csv::Error) -> IngestError {
    if !err.is_io_error() {
        return IngestError::CsvParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        };
    }
    match err.into_kind() {
        csv::ErrorKind::Io(source) if source.kind() == std::io::ErrorKind::NotFound => {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        }
        csv::ErrorKind::Io(source) => IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        },
        other => IngestError::CsvParse {
            path: path.to_path_buf(),
            message: format!("{other:?}"),
        },
    }
}

/// Reads the first worksheet of a workbook.
pub fn read_spreadsheet_rows(path: &Path) -> Result<RawTable> {
    let spreadsheet_error = |message: String| IngestError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(spreadsheet_error("workbook has no sheets".to_string()));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| spreadsheet_error(e.to_string()))?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    split_header(path, rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => normalize_cell(text),
        Data::Float(value) => format_number(*value),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) if value.is_datetime() => match value.as_datetime() {
            Some(datetime) => datetime.format("%b %Y").to_string(),
            None => format_number(value.as_f64()),
        },
        Data::DateTime(value) => format_number(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        _ => String::new(),
    }
}

/// Formats a float without a trailing `.0` so integral samples stay integral.
fn format_number(value: f64) -> String {
    let text = format!("{value}");
    match text.strip_suffix(".0") {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn split_header(path: &Path, rows: Vec<Vec<String>>) -> Result<RawTable> {
    let mut rows = rows
        .into_iter()
        .filter(|row| row.iter().any(|value| !value.trim().is_empty()));
    let Some(header_row) = rows.next() else {
        return Err(IngestError::NoHeader {
            path: path.to_path_buf(),
        });
    };
    let mut headers: Vec<String> = header_row.iter().map(|h| normalize_header(h)).collect();
    // Trailing blank header cells come from ragged spreadsheets.
    while headers.last().is_some_and(String::is_empty) {
        headers.pop();
    }
    let width = headers.len();
    let data = rows
        .enumerate()
        .map(|(idx, record)| {
            let cells = record.len();
            if record.iter().skip(width).any(|value| !value.trim().is_empty()) {
                return Err(IngestError::RaggedRow {
                    row: idx + 1,
                    cells,
                    width,
                });
            }
            Ok((0..width)
                .map(|col| record.get(col).cloned().unwrap_or_default())
                .collect())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawTable {
        headers,
        rows: data,
    })
}

/// Builds a DataFrame with one string column per header. Blank cells become nulls.
pub fn raw_to_dataframe(raw: RawTable) -> Result<DataFrame> {
    let mut seen = BTreeSet::new();
    for (index, header) in raw.headers.iter().enumerate() {
        if header.is_empty() {
            return Err(IngestError::EmptyColumnName { index: index + 1 });
        }
        if !seen.insert(header.to_ascii_lowercase()) {
            return Err(IngestError::DuplicateColumn {
                column: header.clone(),
            });
        }
    }
    let columns: Vec<Column> = raw
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<Option<String>> = raw
                .rows
                .iter()
                .map(|row| {
                    row.get(idx)
                        .filter(|value| !value.is_empty())
                        .cloned()
                })
                .collect();
            Series::new(name.as_str().into(), values).into_column()
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use tempfile::Builder;

    use super::*;

    fn temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn headers_are_canonicalized() {
        assert_eq!(normalize_header("  control   SAMPLE "), "Control Sample");
        assert_eq!(normalize_header("\u{feff}Brand"), "Brand");
        assert_eq!(normalize_header("Lift_Pct"), "Lift_Pct");
    }

    #[test]
    fn csv_rows_skip_blank_lines_and_pad_short_rows() {
        let file = temp_csv("Brand,Group,Metric\n\nAcme,exposed\n,,\nZeta,control,1\n");
        let raw = read_csv_rows(file.path()).unwrap();
        assert_eq!(raw.headers, vec!["Brand", "Group", "Metric"]);
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[0], vec!["Acme", "exposed", ""]);
    }

    #[test]
    fn empty_file_has_no_header() {
        let file = temp_csv("");
        let err = read_csv_rows(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::NoHeader { .. }));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let raw = RawTable {
            headers: vec!["Brand".to_string(), "brand".to_string()],
            rows: vec![],
        };
        let err = raw_to_dataframe(raw).unwrap_err();
        assert!(matches!(err, IngestError::DuplicateColumn { .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = FileKind::from_path(Path::new("study.json")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
        assert_eq!(
            FileKind::from_path(Path::new("Study.XLSX")).unwrap(),
            FileKind::Spreadsheet
        );
    }

    #[test]
    fn dataframe_keeps_blank_cells_as_nulls() {
        let raw = RawTable {
            headers: vec!["Brand".to_string(), "Metric".to_string()],
            rows: vec![
                vec!["Acme".to_string(), String::new()],
                vec!["Zeta".to_string(), "3".to_string()],
            ],
        };
        let df = raw_to_dataframe(raw).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Metric").unwrap().null_count(), 1);
    }

    #[test]
    fn integral_floats_drop_the_fraction() {
        assert_eq!(format_number(1200.0), "1200");
        assert_eq!(format_number(0.471), "0.471");
    }

    #[test]
    fn excel_dates_read_as_month_year() {
        let date = |is_1904| {
            let serial = if is_1904 { 43830.0 } else { 45292.0 };
            Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, is_1904))
        };
        assert_eq!(cell_to_string(&date(false)), "Jan 2024");
        assert_eq!(cell_to_string(&date(true)), "Jan 2024");
        let duration = Data::DateTime(ExcelDateTime::new(
            1.5,
            ExcelDateTimeType::TimeDelta,
            false,
        ));
        assert_eq!(cell_to_string(&duration), "1.5");
    }

    #[test]
    fn cells_beyond_the_header_are_rejected() {
        let file = temp_csv("Brand,Group,Metric\nAcme,exposed,1,\nZeta,control,0,7\n");
        let err = read_csv_rows(file.path()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::RaggedRow {
                row: 2,
                cells: 4,
                width: 3
            }
        ));
    }

    #[test]
    fn unreadable_csv_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::create_dir(&path).unwrap();
        let err = read_csv_rows(&path).unwrap_err();
        assert!(matches!(err, IngestError::FileRead { .. }), "{err}");
    }
}
