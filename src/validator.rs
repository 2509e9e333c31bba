use crate::category::required_columns;
use crate::error::{ReportError, Result};
use crate::table::{CategoryColumns, RecordTable, ValidatedTable};

/// Required columns absent from the table, in required order
pub fn missing_columns(table: &RecordTable) -> Vec<String> {
    required_columns()
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect()
}

/// Check the header row and bind every category to its column.
///
/// Names must match exactly: case and accents are significant. On failure
/// the error lists the missing columns and every column actually present.
pub fn validate(table: RecordTable) -> Result<ValidatedTable> {
    let missing = missing_columns(&table);
    if !missing.is_empty() {
        log::warn!("Missing required columns: {}", missing.join(", "));
        return Err(ReportError::MissingColumns {
            missing,
            available: table.columns.clone(),
        });
    }

    let columns = CategoryColumns::resolve(&table).ok_or_else(|| ReportError::MissingColumns {
        missing: Vec::new(),
        available: table.columns.clone(),
    })?;
    Ok(ValidatedTable::new(table, columns))
}
