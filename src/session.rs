use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::category::Filter;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::loader::load_upload;
use crate::report::{ReportView, render};
use crate::table::ValidatedTable;
use crate::validator::validate;

/// The most recent successful upload
#[derive(Clone, Debug)]
pub struct LoadedUpload {
    pub name: String,
    /// Hex SHA-256 of the uploaded bytes
    pub digest: String,
    pub table: Arc<ValidatedTable>,
}

/// Single-user report session.
///
/// Keeps the last validated table, keyed by the hash of the uploaded bytes,
/// so re-rendering with another filter never re-parses the file. A new
/// upload replaces it; a failed upload discards it.
#[derive(Debug, Default)]
pub struct ReportSession {
    config: ReportConfig,
    current: Option<LoadedUpload>,
}

pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

impl ReportSession {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn current(&self) -> Option<&LoadedUpload> {
        self.current.as_ref()
    }

    /// Load and validate an upload, reusing the cached table for identical bytes.
    pub fn ingest(&mut self, name: &str, bytes: &[u8]) -> Result<Arc<ValidatedTable>> {
        let digest = content_digest(bytes);

        if let Some(current) = &mut self.current {
            if current.digest == digest {
                debug!("Upload {} unchanged ({}), reusing table", name, &digest[..12]);
                current.name = name.to_string();
                return Ok(Arc::clone(&current.table));
            }
        }

        // Whatever was loaded before no longer applies
        self.current = None;

        let table = match load_upload(name, bytes, &self.config).and_then(validate) {
            Ok(table) => Arc::new(table),
            Err(e) => {
                warn!("Rejected upload {}: {}", name, e);
                return Err(e);
            }
        };
        info!("Loaded {} with {} rows", name, table.row_count());

        self.current = Some(LoadedUpload {
            name: name.to_string(),
            digest,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Render the current table under `filter`
    pub fn render(&self, filter: Filter) -> Result<ReportView> {
        let current = self.current.as_ref().ok_or(ReportError::NotLoaded)?;
        Ok(render(&current.table, filter, &self.config))
    }

    /// One interaction: ingest (cached) then render
    pub fn run(&mut self, name: &str, bytes: &[u8], filter: Filter) -> Result<ReportView> {
        let table = self.ingest(name, bytes)?;
        Ok(render(&table, filter, &self.config))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    const VALID: &[u8] = "banner\n\n\n\nENCONTRADAS,NÃO ENCONTRADAS,REVOGADAS,MOTIVO DA REVOGAÇÃO,ATUALIZADAS,OUTRAS SITUAÇÕES\nx,,,,,\n,,r,,,\n".as_bytes();

    #[test]
    fn identical_bytes_reuse_the_table() {
        let mut session = ReportSession::default();
        let first = session.ingest("a.csv", VALID).unwrap();
        let second = session.ingest("b.csv", VALID).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(session.current().unwrap().name, "b.csv");
    }

    #[test]
    fn new_upload_replaces_the_table() {
        let mut session = ReportSession::default();
        let first = session.ingest("a.csv", VALID).unwrap();

        let mut changed = VALID.to_vec();
        changed.extend(b",,,,,y\n");
        let second = session.ingest("a.csv", &changed).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.row_count(), 3);
    }

    #[test]
    fn failed_upload_discards_previous_state() {
        let mut session = ReportSession::default();
        session.ingest("a.csv", VALID).unwrap();

        let err = session.ingest("b.csv", b"1\n2\n3\n4\nX\n").unwrap_err();
        assert!(matches!(err, ReportError::MissingColumns { .. }));
        assert!(session.current().is_none());
        assert_eq!(session.render(Filter::All).unwrap_err(), ReportError::NotLoaded);
    }

    #[test]
    fn render_uses_the_cached_table() {
        let mut session = ReportSession::default();
        let view = session
            .run("a.csv", VALID, Filter::Category(Category::Revoked))
            .unwrap();
        assert_eq!(view.metrics.total_filtrado, 1);

        let all = session.render(Filter::All).unwrap();
        assert_eq!(all.metrics.registros_no_arquivo, 2);
    }

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            content_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
