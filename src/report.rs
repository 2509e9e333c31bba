//! The render pipeline: `(table, filter) -> ReportView`.
//!
//! Nothing here holds state between calls. Every interaction re-runs
//! `render` against an already validated table, or `run` against raw bytes.

use chrono::Local;
use serde::Serialize;

use crate::aggregate::{AggregateCounts, aggregate, columns_with_data};
use crate::category::{Category, Filter};
use crate::config::ReportConfig;
use crate::downloader::{self, ExportFile};
use crate::error::Result;
use crate::filter::{DetailSection, RevocationSummary, detail_sections, filtered_view};
use crate::graph::{ChartSpec, build_chart};
use crate::loader::load_upload;
use crate::table::{DisplayTable, ValidatedTable};
use crate::validator::validate;

/// Headline numbers shown above the chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metrics {
    /// Sum of every category count under `Todos`, else the selected count
    pub total_filtrado: usize,
    /// Number of charted categories, only under `Todos`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorias: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria_selecionada: Option<Category>,
    pub registros_no_arquivo: usize,
    pub colunas_com_dados: usize,
}

/// One line of the per-category summary
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryRow {
    pub categoria: Category,
    pub quantidade: usize,
    /// Share of all rows in the file, e.g. `"30.0%"`
    pub percentual: String,
}

/// Everything a front end needs to draw one interaction
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportView {
    pub filter: Filter,
    pub counts: AggregateCounts,
    pub metrics: Metrics,
    pub chart: Option<ChartSpec>,
    pub table: DisplayTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_caption: Option<String>,
    pub details: Vec<DetailSection>,
    pub summary: Vec<SummaryRow>,
    /// Informational empty-state messages
    pub notices: Vec<String>,
}

impl ReportView {
    /// Revocation split, when revocations are part of this view
    pub fn revocations(&self) -> Option<RevocationSummary> {
        self.details.iter().find_map(|section| section.revocations)
    }

    pub fn export(&self) -> Result<ExportFile> {
        downloader::export(&self.table, self.metrics.registros_no_arquivo, self.filter)
    }
}

/// Per-category quantity and share of all rows, skipping empty categories
pub fn summary_rows(counts: &AggregateCounts, total_rows: usize) -> Vec<SummaryRow> {
    counts
        .nonzero()
        .map(|(categoria, quantidade)| SummaryRow {
            categoria,
            quantidade,
            percentual: format!("{:.1}%", quantidade as f64 / total_rows.max(1) as f64 * 100.0),
        })
        .collect()
}

/// Render one view of a validated table
///
/// # Examples
/// ```
/// use situation_report::category::Filter;
/// use situation_report::config::ReportConfig;
/// use situation_report::report::render;
/// use situation_report::table::RecordTable;
/// use situation_report::validator::validate;
///
/// let columns = situation_report::category::required_columns()
///     .iter()
///     .map(|c| c.to_string())
///     .collect();
/// let table = validate(RecordTable::new(columns, Vec::new())).unwrap();
/// let view = render(&table, Filter::All, &ReportConfig::default());
/// assert_eq!(view.metrics.total_filtrado, 0);
/// assert!(view.chart.is_none());
/// ```
pub fn render(table: &ValidatedTable, filter: Filter, config: &ReportConfig) -> ReportView {
    let blank = config.blank_predicate();
    let total_rows = table.row_count();
    let counts = aggregate(table, &blank);

    let metrics = Metrics {
        total_filtrado: match filter {
            Filter::All => counts.total(),
            Filter::Category(category) => counts.get(category),
        },
        categorias: matches!(filter, Filter::All).then_some(Category::ALL.len()),
        categoria_selecionada: filter.category(),
        registros_no_arquivo: total_rows,
        colunas_com_dados: columns_with_data(table.table(), &blank),
    };

    let mut notices = Vec::new();

    let chart = build_chart(&counts, filter, total_rows);
    if chart.is_none() {
        notices.push(match filter {
            Filter::Category(category) if metrics.total_filtrado == 0 && counts.total() > 0 => {
                format!("Não há registros na categoria '{}'.", category)
            }
            _ => "Não há dados para exibir com os filtros atuais.".to_string(),
        });
    }

    let view = filtered_view(table, filter, &blank);
    let table_caption = match filter {
        Filter::Category(category) if !view.is_empty() => Some(format!(
            "Mostrando {} registros com dados em '{}'",
            view.row_count(),
            category
        )),
        Filter::Category(category) => {
            notices.push(format!("Nenhum registro encontrado com dados em '{}'", category));
            None
        }
        Filter::All => None,
    };

    let details = detail_sections(table, filter, &blank, &config.reason_missing_label);
    match filter {
        Filter::All => {
            // one notice per detail section that was skipped
            for (category, count) in counts.iter() {
                if count == 0 {
                    notices.push(empty_section_notice(category));
                }
            }
        }
        Filter::Category(Category::Revoked) if counts.get(Category::Revoked) == 0 => {
            notices.push(empty_section_notice(Category::Revoked));
        }
        Filter::Category(_) => {}
    }

    ReportView {
        filter,
        summary: summary_rows(&counts, total_rows),
        counts,
        metrics,
        chart,
        table: view,
        table_caption,
        details,
        notices,
    }
}

fn empty_section_notice(category: Category) -> String {
    match category {
        Category::Revoked => "Não há registros de revogação para exibir.".to_string(),
        other => format!("Não há registros na categoria '{}'.", other),
    }
}

/// Load, validate and render an upload in one pass
pub fn run(name: &str, bytes: &[u8], filter: Filter, config: &ReportConfig) -> Result<ReportView> {
    let table = validate(load_upload(name, bytes, config)?)?;
    Ok(render(&table, filter, config))
}

/// Footer line naming the file and the render time
pub fn caption(file_name: &str) -> String {
    format!(
        "Arquivo carregado: {} | Última atualização: {}",
        file_name,
        Local::now().format("%d/%m/%Y %H:%M")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::required_columns;
    use crate::error::ReportError;
    use crate::table::RecordTable;

    fn table(rows: &[[&str; 6]]) -> ValidatedTable {
        let columns: Vec<String> = required_columns().iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect()
            })
            .collect();
        validate(RecordTable::new(columns, rows)).unwrap()
    }

    fn sample() -> ValidatedTable {
        table(&[
            ["e1", "", "", "", "", ""],
            ["", "n1", "", "", "", ""],
            ["", "", "r1", "vencido", "", ""],
            ["", "", "r2", "", "a1", ""],
        ])
    }

    #[test]
    fn total_filtrado_for_all_is_the_sum_of_counts() {
        let view = render(&sample(), Filter::All, &ReportConfig::default());
        assert_eq!(view.metrics.total_filtrado, view.counts.total());
        assert_eq!(view.metrics.total_filtrado, 5);
        assert_eq!(view.metrics.categorias, Some(5));
        assert_eq!(view.metrics.registros_no_arquivo, 4);
        assert_eq!(view.metrics.colunas_com_dados, 5);
        assert_eq!(view.table.row_count(), 4);
        assert_eq!(view.details.len(), 4);
        assert_eq!(
            view.notices,
            vec!["Não há registros na categoria 'OUTRAS SITUAÇÕES'.".to_string()]
        );
    }

    #[test]
    fn skipped_sections_under_all_get_a_notice_each() {
        let view = render(
            &table(&[["e1", "", "", "", "", ""]]),
            Filter::All,
            &ReportConfig::default(),
        );
        let sections: Vec<Category> = view.details.iter().map(|s| s.category).collect();
        assert_eq!(sections, vec![Category::Found]);
        assert_eq!(
            view.notices,
            vec![
                "Não há registros na categoria 'NÃO ENCONTRADAS'.".to_string(),
                "Não há registros de revogação para exibir.".to_string(),
                "Não há registros na categoria 'ATUALIZADAS'.".to_string(),
                "Não há registros na categoria 'OUTRAS SITUAÇÕES'.".to_string(),
            ]
        );
    }

    #[test]
    fn category_view_reports_selected_count() {
        let view = render(
            &sample(),
            Filter::Category(Category::Revoked),
            &ReportConfig::default(),
        );
        assert_eq!(view.metrics.total_filtrado, 2);
        assert_eq!(view.metrics.categoria_selecionada, Some(Category::Revoked));
        assert_eq!(view.metrics.categorias, None);
        assert_eq!(view.table.row_count(), 2);
        assert_eq!(
            view.table_caption.as_deref(),
            Some("Mostrando 2 registros com dados em 'REVOGADAS'")
        );

        let revocations = view.revocations().unwrap();
        assert_eq!((revocations.com_motivo, revocations.sem_motivo), (1, 1));
    }

    #[test]
    fn empty_category_yields_notices_not_errors() {
        let view = render(
            &sample(),
            Filter::Category(Category::Other),
            &ReportConfig::default(),
        );
        assert!(view.chart.is_none());
        assert!(view.table.is_empty());
        assert!(view.details.is_empty());
        assert_eq!(
            view.notices,
            vec![
                "Não há registros na categoria 'OUTRAS SITUAÇÕES'.".to_string(),
                "Nenhum registro encontrado com dados em 'OUTRAS SITUAÇÕES'".to_string(),
            ]
        );
    }

    #[test]
    fn summary_percentages_use_all_rows() {
        let view = render(&sample(), Filter::All, &ReportConfig::default());
        assert_eq!(view.summary.len(), 4);
        assert_eq!(view.summary[0].categoria, Category::Found);
        assert_eq!(view.summary[0].percentual, "25.0%");
        assert_eq!(view.summary[2].quantidade, 2);
        assert_eq!(view.summary[2].percentual, "50.0%");
    }

    #[test]
    fn empty_table_renders_empty_states() {
        let view = render(&table(&[]), Filter::All, &ReportConfig::default());
        assert!(view.chart.is_none());
        assert!(view.summary.is_empty());
        assert_eq!(
            view.notices,
            vec![
                "Não há dados para exibir com os filtros atuais.".to_string(),
                "Não há registros na categoria 'ENCONTRADAS'.".to_string(),
                "Não há registros na categoria 'NÃO ENCONTRADAS'.".to_string(),
                "Não há registros de revogação para exibir.".to_string(),
                "Não há registros na categoria 'ATUALIZADAS'.".to_string(),
                "Não há registros na categoria 'OUTRAS SITUAÇÕES'.".to_string(),
            ]
        );
    }

    #[test]
    fn configured_blank_markers_change_counts() {
        let config = ReportConfig::from_json_str(r#"{"blank_markers": ["", "-"]}"#).unwrap();
        let view = render(
            &table(&[["-", "", "", "", "", ""], ["nan", "", "", "", "", ""]]),
            Filter::All,
            &config,
        );
        assert_eq!(view.counts.get(Category::Found), 1);
    }

    #[test]
    fn run_reports_missing_columns() {
        let bytes = b"a\nb\nc\nd\nENCONTRADAS,REVOGADAS\nx,y\n";
        match run("situacoes.csv", bytes, Filter::All, &ReportConfig::default()) {
            Err(ReportError::MissingColumns { missing, available }) => {
                assert_eq!(missing.len(), 4);
                assert_eq!(available, vec!["ENCONTRADAS", "REVOGADAS"]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn caption_names_the_file() {
        assert!(caption("situacoes.xlsx").starts_with("Arquivo carregado: situacoes.xlsx | "));
    }
}
