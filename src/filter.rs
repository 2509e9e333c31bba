use serde::Serialize;

use crate::category::{Category, Filter, REASON_COLUMN};
use crate::config::BlankPredicate;
use crate::table::{DisplayTable, ValidatedTable, normalize_cell};

/// One listed record of a detail section
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailEntry {
    /// 1-based position among the data rows
    pub row: usize,
    pub value: String,
    /// Only set for revocations: the reason, or the missing-reason label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reason_missing: bool,
}

/// Split of revoked rows by whether a reason was given
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RevocationSummary {
    pub total: usize,
    pub com_motivo: usize,
    pub sem_motivo: usize,
}

/// Every filled record of one category
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailSection {
    pub category: Category,
    pub entries: Vec<DetailEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocations: Option<RevocationSummary>,
}

/// Row indices (0-based) whose cell in `category` is filled
pub fn filled_rows(table: &ValidatedTable, category: Category, blank: &BlankPredicate) -> Vec<usize> {
    table
        .category_cells(category)
        .enumerate()
        .filter(|(_, cell)| blank.is_filled(*cell))
        .map(|(i, _)| i)
        .collect()
}

/// Columns surfaced in the table for a filter
pub fn table_columns(table: &ValidatedTable, filter: Filter) -> Vec<String> {
    match filter {
        Filter::All => table.table().columns.clone(),
        Filter::Category(Category::Revoked) => vec![
            Category::Revoked.column().to_string(),
            REASON_COLUMN.to_string(),
        ],
        Filter::Category(category) => vec![category.column().to_string()],
    }
}

/// Rows and columns displayed (and exported) under `filter`.
///
/// `All` yields the whole normalized table. A category yields only the rows
/// where its column is filled, restricted to that column, plus the reason
/// column for revocations.
pub fn filtered_view(table: &ValidatedTable, filter: Filter, blank: &BlankPredicate) -> DisplayTable {
    let category = match filter {
        Filter::All => return table.table().normalized(),
        Filter::Category(category) => category,
    };

    let mut source_columns = vec![table.columns().index(category)];
    if category.has_reason() {
        source_columns.push(table.columns().reason());
    }

    let rows = filled_rows(table, category, blank)
        .into_iter()
        .map(|row| {
            source_columns
                .iter()
                .map(|&col| normalize_cell(table.table().cell(row, col)))
                .collect()
        })
        .collect();

    DisplayTable {
        columns: table_columns(table, filter),
        rows,
    }
}

/// Detail listing for one category; `None` when nothing is filled
pub fn detail_section(
    table: &ValidatedTable,
    category: Category,
    blank: &BlankPredicate,
    reason_missing_label: &str,
) -> Option<DetailSection> {
    let rows = filled_rows(table, category, blank);
    if rows.is_empty() {
        return None;
    }

    let entries: Vec<DetailEntry> = rows
        .into_iter()
        .map(|row| {
            let value = normalize_cell(table.category_cell(row, category));
            if !category.has_reason() {
                return DetailEntry {
                    row: row + 1,
                    value,
                    reason: None,
                    reason_missing: false,
                };
            }
            let reason = table.reason_cell(row);
            let reason_missing = blank.is_blank(reason);
            DetailEntry {
                row: row + 1,
                value,
                reason: Some(if reason_missing {
                    reason_missing_label.to_string()
                } else {
                    normalize_cell(reason)
                }),
                reason_missing,
            }
        })
        .collect();

    let revocations = category.has_reason().then(|| summarize_revocations(&entries));

    Some(DetailSection {
        category,
        entries,
        revocations,
    })
}

/// Detail sections shown for a filter, skipping empty categories
pub fn detail_sections(
    table: &ValidatedTable,
    filter: Filter,
    blank: &BlankPredicate,
    reason_missing_label: &str,
) -> Vec<DetailSection> {
    let categories: Vec<Category> = match filter {
        Filter::All => Category::ALL.to_vec(),
        Filter::Category(category) => vec![category],
    };
    categories
        .into_iter()
        .filter_map(|c| detail_section(table, c, blank, reason_missing_label))
        .collect()
}

fn summarize_revocations(entries: &[DetailEntry]) -> RevocationSummary {
    let total = entries.len();
    let sem_motivo = entries.iter().filter(|e| e.reason_missing).count();
    RevocationSummary {
        total,
        com_motivo: total - sem_motivo,
        sem_motivo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::category::required_columns;
    use crate::table::RecordTable;
    use crate::validator::validate;

    const LABEL: &str = "Motivo não informado";

    // ENCONTRADAS, NÃO ENCONTRADAS, REVOGADAS, MOTIVO, ATUALIZADAS, OUTRAS, PROCESSO
    fn sample() -> ValidatedTable {
        let raw = [
            ["e1", "", "", "", "", "", "p1"],
            ["", "n1", "", "", "", "", "p2"],
            ["", "", "r1", "prazo vencido", "", "", "p3"],
            ["e2", "", "r2", "  ", "", "", "p4"],
            ["nan", "", "None", "sem efeito", "a1", "", "p5"],
        ];
        let mut columns: Vec<String> = required_columns().iter().map(|c| c.to_string()).collect();
        columns.push("PROCESSO".into());
        let rows = raw
            .iter()
            .map(|r| {
                r.iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect()
            })
            .collect();
        validate(RecordTable::new(columns, rows)).unwrap()
    }

    #[test]
    fn all_keeps_every_row_and_column() {
        let table = sample();
        let view = filtered_view(&table, Filter::All, &BlankPredicate::default());
        assert_eq!(view.row_count(), 5);
        assert_eq!(view.columns.len(), 7);
        assert_eq!(view.rows[4][0], "");
        assert_eq!(view.rows[4][2], "None");
    }

    #[test]
    fn category_view_matches_its_count() {
        let table = sample();
        let blank = BlankPredicate::default();
        let counts = aggregate(&table, &blank);
        for category in Category::ALL {
            let view = filtered_view(&table, Filter::Category(category), &blank);
            assert_eq!(view.row_count(), counts.get(category), "{}", category);
        }

        let found = filtered_view(&table, Filter::Category(Category::Found), &blank);
        assert_eq!(found.columns, vec!["ENCONTRADAS"]);
        assert_eq!(found.rows, vec![vec!["e1".to_string()], vec!["e2".to_string()]]);
    }

    #[test]
    fn revoked_view_includes_reason_column() {
        let table = sample();
        let view = filtered_view(&table, Filter::Category(Category::Revoked), &BlankPredicate::default());
        assert_eq!(view.columns, vec!["REVOGADAS", "MOTIVO DA REVOGAÇÃO"]);
        assert_eq!(
            view.rows,
            vec![
                vec!["r1".to_string(), "prazo vencido".to_string()],
                vec!["r2".to_string(), "  ".to_string()],
            ]
        );
    }

    #[test]
    fn revocation_details_pair_reasons() {
        let table = sample();
        let section =
            detail_section(&table, Category::Revoked, &BlankPredicate::default(), LABEL).unwrap();

        assert_eq!(section.entries.len(), 2);
        assert_eq!(section.entries[0].row, 3);
        assert_eq!(section.entries[0].reason.as_deref(), Some("prazo vencido"));
        assert!(!section.entries[0].reason_missing);
        assert_eq!(section.entries[1].reason.as_deref(), Some(LABEL));
        assert!(section.entries[1].reason_missing);

        let summary = section.revocations.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.com_motivo, 1);
        assert_eq!(summary.sem_motivo, 1);
        assert_eq!(summary.com_motivo + summary.sem_motivo, summary.total);
    }

    #[test]
    fn empty_categories_have_no_section() {
        let table = sample();
        let blank = BlankPredicate::default();
        assert!(detail_section(&table, Category::Other, &blank, LABEL).is_none());

        let sections = detail_sections(&table, Filter::All, &blank, LABEL);
        let categories: Vec<Category> = sections.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![Category::Found, Category::NotFound, Category::Revoked, Category::Updated]
        );
        assert!(sections[0].revocations.is_none());
        assert!(sections[2].revocations.is_some());
    }
}
