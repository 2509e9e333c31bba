use serde::Serialize;

use crate::category::Category;

/// A single cell; `None` marks missing data
pub type Cell = Option<String>;

/// Loaded table: ordered column names plus rows aligned to them.
///
/// Every row has exactly `columns.len()` cells. The loader pads short rows
/// with missing cells and drops extra trailing cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RecordTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Iterates one column top to bottom
    pub fn column_cells(&self, col: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(col).and_then(|c| c.as_deref()))
    }

    /// Display copy of the table: missing cells and literal `nan` become `""`.
    pub fn normalized(&self) -> DisplayTable {
        DisplayTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(|c| normalize_cell(c.as_deref())).collect())
                .collect(),
        }
    }
}

pub fn normalize_cell(cell: Option<&str>) -> String {
    match cell {
        None | Some("nan") => String::new(),
        Some(value) => value.to_string(),
    }
}

/// Table of display strings, ready for rendering or export
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolved column positions of the category and reason columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryColumns {
    found: usize,
    not_found: usize,
    revoked: usize,
    reason: usize,
    updated: usize,
    other: usize,
}

impl CategoryColumns {
    pub(crate) fn resolve(table: &RecordTable) -> Option<Self> {
        Some(Self {
            found: table.column_index(Category::Found.column())?,
            not_found: table.column_index(Category::NotFound.column())?,
            revoked: table.column_index(Category::Revoked.column())?,
            reason: table.column_index(crate::category::REASON_COLUMN)?,
            updated: table.column_index(Category::Updated.column())?,
            other: table.column_index(Category::Other.column())?,
        })
    }

    pub fn index(&self, category: Category) -> usize {
        match category {
            Category::Found => self.found,
            Category::NotFound => self.not_found,
            Category::Revoked => self.revoked,
            Category::Updated => self.updated,
            Category::Other => self.other,
        }
    }

    pub fn reason(&self) -> usize {
        self.reason
    }
}

/// A table whose required columns have been checked.
///
/// Only the validator builds one, so category access never fails.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedTable {
    table: RecordTable,
    columns: CategoryColumns,
}

impl ValidatedTable {
    pub(crate) fn new(table: RecordTable, columns: CategoryColumns) -> Self {
        Self { table, columns }
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn columns(&self) -> &CategoryColumns {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn category_cell(&self, row: usize, category: Category) -> Option<&str> {
        self.table.cell(row, self.columns.index(category))
    }

    pub fn reason_cell(&self, row: usize) -> Option<&str> {
        self.table.cell(row, self.columns.reason())
    }

    pub fn category_cells(&self, category: Category) -> impl Iterator<Item = Option<&str>> + '_ {
        self.table.column_cells(self.columns.index(category))
    }
}
