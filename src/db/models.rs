// Data models: rows as they come out of the datastore, and the items the
// scoring pipeline works on.
//
// The row structs are backend-neutral so the pipeline never depends on
// rusqlite or sqlx directly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};

/// Which rows of a table are picked up for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    /// `sentiment_score IS NULL OR sentiment_score = 0` (generic tables).
    UnscoredOrZero,
    /// `sentiment_score IS NULL OR sentiment_score != -1` (title+body table).
    ///
    /// This re-selects rows that already carry a positive score, so they are
    /// rescored on every run. Kept as the datastore's consumers expect it;
    /// see DESIGN.md before changing it.
    NotFinalized,
}

impl Eligibility {
    /// SQL predicate over the `sentiment_score` column.
    pub fn sql_predicate(&self) -> &'static str {
        match self {
            Eligibility::UnscoredOrZero => "sentiment_score IS NULL OR sentiment_score = 0",
            Eligibility::NotFinalized => "sentiment_score IS NULL OR sentiment_score != -1",
        }
    }
}

/// Layout family of a scored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    /// Columns `id, text, keyword, sentiment_score`.
    Text,
    /// Columns `id, title, text, keyword, sentiment_score`.
    TitleBody,
}

impl TableKind {
    pub fn eligibility(&self) -> Eligibility {
        match self {
            TableKind::Text => Eligibility::UnscoredOrZero,
            TableKind::TitleBody => Eligibility::NotFinalized,
        }
    }
}

/// A configured table and the family it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub kind: TableKind,
}

impl TableSpec {
    /// Build a table spec, rejecting names that aren't plain SQL identifiers.
    /// Table names are interpolated into SQL, so this is the only guard.
    pub fn new(name: &str, kind: TableKind) -> Result<Self> {
        validate_table_name(name)?;
        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }
}

/// Accept `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ScoringError::Config(format!(
            "invalid table name {name:?}: expected letters, digits and underscores"
        )))
    }
}

/// A row from a generic text table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub id: String,
    pub text: Option<String>,
    pub keyword: Option<String>,
}

/// A row from the title+body table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBodyRow {
    pub id: String,
    pub title: Option<String>,
    pub text: Option<String>,
    pub keyword: Option<String>,
}

/// Rows fetched for one table, tagged by layout.
#[derive(Debug, Clone)]
pub enum FetchedRows {
    Text(Vec<TextRow>),
    TitleBody(Vec<TitleBodyRow>),
}

/// One unit of scoring work.
///
/// `secondary_text` is only set for title+body rows whose body is non-blank;
/// `text` then holds the title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorableItem {
    pub id: String,
    pub text: String,
    pub keyword: String,
    pub secondary_text: Option<String>,
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl TextRow {
    /// Convert to a scorable item, or `None` if text or keyword is blank.
    pub fn into_item(self) -> Option<ScorableItem> {
        if is_blank(self.text.as_deref()) || is_blank(self.keyword.as_deref()) {
            return None;
        }
        Some(ScorableItem {
            id: self.id,
            text: self.text.unwrap_or_default(),
            keyword: self.keyword.unwrap_or_default(),
            secondary_text: None,
        })
    }
}

impl TitleBodyRow {
    /// Convert to a scorable item.
    ///
    /// Requires a non-blank keyword and at least one of title/body non-blank.
    /// A blank body leaves `secondary_text` unset so only the title is scored.
    pub fn into_item(self) -> Option<ScorableItem> {
        if is_blank(self.keyword.as_deref()) {
            return None;
        }
        let body_blank = is_blank(self.text.as_deref());
        if body_blank && is_blank(self.title.as_deref()) {
            return None;
        }
        Some(ScorableItem {
            id: self.id,
            text: self.title.unwrap_or_default(),
            keyword: self.keyword.unwrap_or_default(),
            secondary_text: if body_blank { None } else { self.text },
        })
    }
}

impl FetchedRows {
    pub fn len(&self) -> usize {
        match self {
            FetchedRows::Text(rows) => rows.len(),
            FetchedRows::TitleBody(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the per-layout eligibility rules, dropping ineligible rows.
    pub fn into_items(self) -> Vec<ScorableItem> {
        match self {
            FetchedRows::Text(rows) => rows.into_iter().filter_map(TextRow::into_item).collect(),
            FetchedRows::TitleBody(rows) => rows
                .into_iter()
                .filter_map(TitleBodyRow::into_item)
                .collect(),
        }
    }
}
