use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// Column holding the free-text revocation reason
pub const REASON_COLUMN: &str = "MOTIVO DA REVOGAÇÃO";

/// Display name of the "no filter" option
pub const ALL_LABEL: &str = "Todos";

/// Fixed status classification of a record.
///
/// Each category is bound to exactly one column of the input table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Found,
    NotFound,
    Revoked,
    Updated,
    Other,
}

impl Category {
    /// All categories, in the order counts and charts list them
    pub const ALL: [Category; 5] = [
        Category::Found,
        Category::NotFound,
        Category::Revoked,
        Category::Updated,
        Category::Other,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Category::Found => "ENCONTRADAS",
            Category::NotFound => "NÃO ENCONTRADAS",
            Category::Revoked => "REVOGADAS",
            Category::Updated => "ATUALIZADAS",
            Category::Other => "OUTRAS SITUAÇÕES",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.column() == name)
    }

    pub fn has_reason(self) -> bool {
        matches!(self, Category::Revoked)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column())
    }
}

/// Column names every input table must carry, in header order
pub fn required_columns() -> [&'static str; 6] {
    [
        Category::Found.column(),
        Category::NotFound.column(),
        Category::Revoked.column(),
        REASON_COLUMN,
        Category::Updated.column(),
        Category::Other.column(),
    ]
}

/// Current filter selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    Category(Category),
}

impl Filter {
    /// Every selectable option, "Todos" first
    pub fn options() -> Vec<Filter> {
        std::iter::once(Filter::All)
            .chain(Category::ALL.into_iter().map(Filter::Category))
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::All => ALL_LABEL,
            Filter::Category(category) => category.column(),
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Filter::All => None,
            Filter::Category(category) => Some(*category),
        }
    }

    /// Lower-cased name with spaces replaced, used in export file names
    pub fn slug(&self) -> String {
        self.name().to_lowercase().replace(' ', "_")
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() || name == ALL_LABEL || name.eq_ignore_ascii_case("all") {
            return Ok(Filter::All);
        }
        Category::from_column(name)
            .map(Filter::Category)
            .ok_or_else(|| ReportError::UnknownFilter(name.to_string()))
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
