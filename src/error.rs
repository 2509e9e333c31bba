use serde::Serialize;
use std::fmt;

/// Errors surfaced by the report pipeline.
///
/// `Parse` and `MissingColumns` end the current pass; the caller is expected
/// to ask for a fresh upload. Empty categories or empty filtered sets are not
/// errors and never show up here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReportError {
    /// The uploaded file could not be read as CSV or as a workbook
    Parse(String),

    /// One or more required columns are absent from the header row
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// A filter name that is not one of the fixed options
    UnknownFilter(String),

    /// A render was requested before any table was loaded
    NotLoaded,

    /// Writing the XLSX or CSV export failed
    Export(String),

    /// Drawing the chart image failed
    Chart(String),

    /// The configuration file is not valid JSON for `ReportConfig`
    Config(String),

    Io(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Parse(msg) => write!(f, "Erro ao ler o arquivo: {}", msg),
            ReportError::MissingColumns { missing, .. } => {
                write!(f, "Colunas faltantes no arquivo: {}", missing.join(", "))
            }
            ReportError::UnknownFilter(name) => write!(f, "Filtro desconhecido: {}", name),
            ReportError::NotLoaded => write!(f, "Nenhuma planilha carregada"),
            ReportError::Export(msg) => write!(f, "Erro ao exportar: {}", msg),
            ReportError::Chart(msg) => write!(f, "Erro ao gerar gráfico: {}", msg),
            ReportError::Config(msg) => write!(f, "Configuração inválida: {}", msg),
            ReportError::Io(msg) => write!(f, "Erro de E/S: {}", msg),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Parse(err.to_string())
    }
}

impl From<calamine::Error> for ReportError {
    fn from(err: calamine::Error) -> Self {
        ReportError::Parse(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ReportError::Export(err.to_string())
    }
}

impl ReportError {
    /// Columns present in the file, when the error carries them
    pub fn available_columns(&self) -> Option<&[String]> {
        match self {
            ReportError::MissingColumns { available, .. } => Some(available),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_in_portuguese() {
        let io = ReportError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "x.csv"));
        assert_eq!(io.to_string(), "Erro de E/S: x.csv");
        assert_eq!(
            ReportError::Config("campo".into()).to_string(),
            "Configuração inválida: campo"
        );
        assert_eq!(ReportError::NotLoaded.to_string(), "Nenhuma planilha carregada");
    }
}
