use serde::Serialize;

use crate::category::Category;
use crate::config::BlankPredicate;
use crate::table::{RecordTable, ValidatedTable};

/// Filled-cell count per category, in `Category::ALL` order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AggregateCounts {
    counts: Vec<(Category, usize)>,
}

impl AggregateCounts {
    pub fn get(&self, category: Category) -> usize {
        self.counts
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.counts.iter().copied()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn nonzero(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.iter().filter(|(_, n)| *n > 0)
    }
}

pub fn count_filled<'a>(cells: impl Iterator<Item = Option<&'a str>>, blank: &BlankPredicate) -> usize {
    cells.filter(|cell| blank.is_filled(*cell)).count()
}

/// Count the filled cells of every category column.
///
/// The reason column is never counted.
pub fn aggregate(table: &ValidatedTable, blank: &BlankPredicate) -> AggregateCounts {
    AggregateCounts {
        counts: Category::ALL
            .into_iter()
            .map(|category| (category, count_filled(table.category_cells(category), blank)))
            .collect(),
    }
}

/// Number of columns, required or not, holding at least one filled cell
pub fn columns_with_data(table: &RecordTable, blank: &BlankPredicate) -> usize {
    (0..table.columns.len())
        .filter(|&col| table.column_cells(col).any(|cell| blank.is_filled(cell)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::required_columns;
    use crate::validator::validate;

    fn build(rows: &[[&str; 6]]) -> ValidatedTable {
        let mut columns: Vec<String> = required_columns().iter().map(|c| c.to_string()).collect();
        columns.push("OBS".into());
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .chain(std::iter::once(None))
                    .collect()
            })
            .collect();
        validate(RecordTable::new(columns, rows)).unwrap()
    }

    #[test]
    fn counts_ignore_blank_markers() {
        let table = build(&[
            ["a", "", "r1", "m1", "", ""],
            ["  ", "nan", "r2", "", "None", "x"],
            ["b", "n", "", "orphan reason", " u ", ""],
        ]);
        let counts = aggregate(&table, &BlankPredicate::default());

        assert_eq!(counts.get(Category::Found), 2);
        assert_eq!(counts.get(Category::NotFound), 1);
        assert_eq!(counts.get(Category::Revoked), 2);
        assert_eq!(counts.get(Category::Updated), 1);
        assert_eq!(counts.get(Category::Other), 1);
        assert_eq!(counts.total(), 7);
        assert_eq!(counts.nonzero().count(), 5);
    }

    #[test]
    fn order_follows_categories() {
        let table = build(&[["a", "", "", "", "", ""]]);
        let counts = aggregate(&table, &BlankPredicate::default());
        let order: Vec<Category> = counts.iter().map(|(c, _)| c).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(counts.nonzero().collect::<Vec<_>>(), vec![(Category::Found, 1)]);
    }

    #[test]
    fn columns_with_data_counts_every_column() {
        let table = build(&[["a", "", "", "motivo", "", ""]]);
        assert_eq!(columns_with_data(table.table(), &BlankPredicate::default()), 2);
    }
}
