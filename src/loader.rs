use calamine::{Data, DataType, Reader};
use csv::ReaderBuilder;
use log::{debug, info};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::table::{Cell, RecordTable};

/// Declared format of an uploaded file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Excel,
}

impl SourceFormat {
    /// Detect the format from a file name's extension
    ///
    /// # Examples
    /// ```
    /// use situation_report::loader::SourceFormat;
    ///
    /// assert_eq!(SourceFormat::from_file_name("dados.CSV").unwrap(), SourceFormat::Csv);
    /// assert_eq!(SourceFormat::from_file_name("dados.xlsx").unwrap(), SourceFormat::Excel);
    /// assert!(SourceFormat::from_file_name("dados.txt").is_err());
    /// ```
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("xlsx") | Some("xls") | Some("xlsm") | Some("ods") => Ok(SourceFormat::Excel),
            Some(ext) => Err(ReportError::Parse(format!(
                "Unsupported file extension: {}",
                ext
            ))),
            None => Err(ReportError::Parse("File has no extension".into())),
        }
    }
}

/// Load a table from a CSV file held in memory
///
/// The first `config.header_rows` raw lines are a banner and are skipped;
/// the next record is the header. Input that is not valid UTF-8 is decoded
/// as Windows-1252, which is what spreadsheet tools usually write.
///
/// # Arguments
/// * `bytes` - Raw file contents
/// * `config` - Supplies the banner height and the missing-value markers
///
/// # Returns
/// * `Result<RecordTable>` - The loaded table or a `ReportError::Parse`
pub fn from_csv(bytes: &[u8], config: &ReportConfig) -> Result<RecordTable> {
    let text = decode_text(bytes);
    let body = skip_lines(&text, config.header_rows);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => {
            return Err(ReportError::Parse(format!(
                "No header row found after skipping {} rows",
                config.header_rows
            )));
        }
    };
    let columns = header_names(header.iter().map(str::to_string));

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record.map_err(|e| {
            ReportError::Parse(format!("Failed to parse CSV row {}: {}", index + 1, e))
        })?;
        // csv skips empty lines; a line of bare delimiters is still a row
        rows.push(record.iter().map(|v| to_cell(v, config)).collect());
    }

    debug!("CSV parsed: {} columns, {} rows", columns.len(), rows.len());
    Ok(RecordTable::new(columns, rows))
}

/// Load a table from a workbook held in memory
///
/// The first worksheet is read. Banner rows are counted from the top of the
/// sheet, not from the first used cell.
pub fn from_excel(bytes: &[u8], config: &ReportConfig) -> Result<RecordTable> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::Parse("No sheets found in Excel file".into()))??;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let skip = config.header_rows.saturating_sub(first_row);
    let mut sheet_rows = range.rows().skip(skip);

    let header = sheet_rows.next().ok_or_else(|| {
        ReportError::Parse(format!(
            "No header row found after skipping {} rows",
            config.header_rows
        ))
    })?;
    let columns = header_names(header.iter().map(excel_text));

    let rows: Vec<Vec<Cell>> = sheet_rows
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => None,
                    other => to_cell(&excel_text(other), config),
                })
                .collect()
        })
        .filter(|row: &Vec<Cell>| row.iter().any(Option::is_some))
        .collect();

    debug!("Workbook parsed: {} columns, {} rows", columns.len(), rows.len());
    Ok(RecordTable::new(columns, rows))
}

/// Load bytes whose format is already known
pub fn load_bytes(bytes: &[u8], format: SourceFormat, config: &ReportConfig) -> Result<RecordTable> {
    match format {
        SourceFormat::Csv => from_csv(bytes, config),
        SourceFormat::Excel => from_excel(bytes, config),
    }
}

/// Load an upload, picking the format from its file name
pub fn load_upload(name: &str, bytes: &[u8], config: &ReportConfig) -> Result<RecordTable> {
    let format = SourceFormat::from_file_name(name)?;
    info!("Loading {} ({:?}, {} bytes)", name, format, bytes.len());
    load_bytes(bytes, format, config)
}

/// Detect file type and load appropriate format
///
/// # Examples
/// ```no_run
/// use situation_report::config::ReportConfig;
/// use situation_report::loader::load_table;
///
/// match load_table("situacoes.xlsx", &ReportConfig::default()) {
///     Ok(table) => println!("Loaded {} rows", table.row_count()),
///     Err(e) => eprintln!("Error loading file: {}", e),
/// }
/// ```
pub fn load_table(filepath: impl AsRef<Path>, config: &ReportConfig) -> Result<RecordTable> {
    let path = filepath.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path.to_string_lossy();
    load_upload(&name, &bytes, config)
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Input is not UTF-8, decoding as Windows-1252");
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

fn skip_lines(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

fn to_cell(raw: &str, config: &ReportConfig) -> Cell {
    if config.is_missing_marker(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

// Cell text as a string-typed read would give it
fn excel_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

// Blank names become "Unnamed: <i>", repeats get ".1", ".2", ...
fn header_names(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.enumerate()
        .map(|(i, name)| {
            let name = if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}
