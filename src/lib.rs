/*!
# Situation Report

A report viewer for spreadsheets of records classified into fixed status
categories, built in Rust.

## Overview

An uploaded CSV or Excel file carries a four-row banner, a header on row 5
and one column per status category. The application validates the header,
counts the filled cells of each category, and renders a filtered view with
a donut chart, per-category detail listings and an XLSX export.

## Architecture

The pipeline is a chain of pure transforms over an in-memory table:

### Input Layer
- **Loader** - Reads CSV (UTF-8 or Windows-1252) and workbooks (xlsx, xls, ods),
  skips the banner and keeps every cell as a string
- **Validator** - Checks the six required columns and binds each category to
  its column once

### Core Layer
- **Aggregator** - Counts filled cells per category
- **Filter Engine** - Selects rows and columns for the current filter, builds
  detail listings and the revocation breakdown
- **Chart Builder** - Turns counts into a donut chart specification
- **Report** - Combines the above into a serializable view-model

### Output Layer
- **Exporter** - Two-sheet XLSX (filtered rows + metrics) and CSV
- **Session** - Memoizes the last validated table by content hash
- **Web front end** (feature `web`) - Upload form, JSON views, chart PNG and
  XLSX download over axum

## Categories

| Category | Column |
|----------|--------|
| Found | `ENCONTRADAS` |
| Not found | `NÃO ENCONTRADAS` |
| Revoked | `REVOGADAS` (paired with `MOTIVO DA REVOGAÇÃO`) |
| Updated | `ATUALIZADAS` |
| Other | `OUTRAS SITUAÇÕES` |

## REST API Endpoints

- `/api/upload` - Accepts a multipart upload and returns the unfiltered view
- `/api/report?filtro=` - Renders the current upload under a filter
- `/api/chart?filtro=` - Donut chart as PNG
- `/api/export?filtro=` - Filtered rows and metrics as XLSX
*/

pub mod aggregate;
#[cfg(feature = "web")]
pub mod app;
pub mod category;
pub mod config;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod graph;
pub mod loader;
pub mod report;
pub mod session;
pub mod table;
pub mod validator;

/// Re-export the types most callers need
pub use category::{Category, Filter};
pub use config::{BlankPredicate, ReportConfig};
pub use error::{ReportError, Result};
pub use report::{ReportView, render, run};
pub use session::ReportSession;
pub use table::{DisplayTable, RecordTable, ValidatedTable};
