use rust_xlsxwriter::Workbook;
use serde::Serialize;

use crate::category::Filter;
use crate::error::{ReportError, Result};
use crate::table::DisplayTable;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DATA_SHEET: &str = "Dados Filtrados";
pub const METRICS_SHEET: &str = "Métricas";

/// Summary written to the metrics sheet of an export
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportMetrics {
    pub total_rows: usize,
    pub filter: Filter,
    pub filtered_rows: usize,
}

impl ExportMetrics {
    pub fn new(total_rows: usize, filter: Filter, view: &DisplayTable) -> Self {
        Self {
            total_rows,
            filter,
            filtered_rows: view.row_count(),
        }
    }
}

/// A finished export, ready to be offered for download
#[derive(Clone, Debug)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// File name offered for the export of a filter
///
/// # Examples
/// ```
/// use situation_report::category::{Category, Filter};
/// use situation_report::downloader::export_filename;
///
/// assert_eq!(export_filename(Filter::All), "dados_processados_todos.xlsx");
/// assert_eq!(
///     export_filename(Filter::Category(Category::Revoked)),
///     "dados_processados_revogadas.xlsx"
/// );
/// ```
pub fn export_filename(filter: Filter) -> String {
    format!("dados_processados_{}.xlsx", filter.slug())
}

/// Convert a filtered view to XLSX format
///
/// Writes two sheets: the filtered rows under a header row, and a metrics
/// sheet listing the total row count, the filter name and the filtered row
/// count.
///
/// # Arguments
/// * `view` - The rows and columns currently displayed
/// * `metrics` - Values for the metrics sheet
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
pub fn to_xlsx(view: &DisplayTable, metrics: &ExportMetrics) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let data = workbook.add_worksheet();
    data.set_name(DATA_SHEET)?;
    for (c, name) in view.columns.iter().enumerate() {
        data.write_string(0, c as u16, name)?;
    }
    for (r, row) in view.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            // Blank cells stay empty so the sheet mirrors the displayed table
            if !value.is_empty() {
                data.write_string((r + 1) as u32, c as u16, value)?;
            }
        }
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(METRICS_SHEET)?;
    sheet.write_string(0, 0, "Métrica")?;
    sheet.write_string(0, 1, "Valor")?;
    sheet.write_string(1, 0, "Total de Registros")?;
    sheet.write_number(1, 1, metrics.total_rows as f64)?;
    sheet.write_string(2, 0, "Categoria Filtrada")?;
    sheet.write_string(2, 1, metrics.filter.name())?;
    sheet.write_string(3, 0, "Registros no Filtro")?;
    sheet.write_number(3, 1, metrics.filtered_rows as f64)?;

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

/// Build the downloadable XLSX for a filter
pub fn export(view: &DisplayTable, total_rows: usize, filter: Filter) -> Result<ExportFile> {
    let metrics = ExportMetrics::new(total_rows, filter, view);
    let bytes = to_xlsx(view, &metrics)?;
    log::info!(
        "Export ready: filter {}, {} of {} rows, {} bytes",
        filter,
        metrics.filtered_rows,
        total_rows,
        bytes.len()
    );
    Ok(ExportFile {
        filename: export_filename(filter),
        mime: XLSX_MIME,
        bytes,
    })
}

/// Convert a filtered view to CSV format
pub fn to_csv(view: &DisplayTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&view.columns)
        .map_err(|e| ReportError::Export(e.to_string()))?;
    for row in &view.rows {
        writer
            .write_record(row)
            .map_err(|e| ReportError::Export(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Export(e.to_string()))
}
