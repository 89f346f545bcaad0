use crate::error::{ReclassificationError, Result};
use crate::schema::ReclassifiedSummary;
use crate::table::Table;
use std::collections::HashSet;

/// Debtor codes that must not appear in the final summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    codes: HashSet<String>,
}

impl ExclusionList {
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads the codes from `column` of the exclusion sheet, keyed the same
    /// way ledger debtor codes are. Blank cells are ignored.
    pub fn from_table(table: &Table, column: &str) -> Result<Self> {
        let cells = table.column_cells(column).ok_or_else(|| {
            ReclassificationError::InvalidTable(format!(
                "sheet '{}' has no column '{}'",
                table.name, column
            ))
        })?;

        Ok(Self {
            codes: cells.filter_map(|cell| cell.as_key()).collect(),
        })
    }

    pub fn contains(&self, debtor_code: &str) -> bool {
        self.codes.contains(debtor_code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Removes excluded debtors in place, keeping the order of the rest.
/// Returns how many rows were removed.
pub fn exclude(summary: &mut ReclassifiedSummary, exclusions: &ExclusionList) -> usize {
    let before = summary.rows.len();
    summary
        .rows
        .retain(|row| !exclusions.contains(&row.debtor_code));
    before - summary.rows.len()
}
