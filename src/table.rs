//! In-memory tabular sheets.
//!
//! A [`Workbook`] is the unit the pipeline consumes: a set of named [`Table`]s,
//! each with an ordered header and rows of [`Cell`]s. Readers in
//! [`crate::ingestion`] build them; the pipeline never touches files.

use crate::error::{ReclassificationError, Result};
use crate::utils::{decimal_key, parse_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(Decimal),
    Text(String),
    Empty,
}

impl Cell {
    /// Cell for a raw text value: blank is empty, anything else stays text.
    /// Numbers are not inferred, so `"0101"` and `"101"` remain distinct
    /// codes; [`Cell::as_amount`] parses text when a number is needed.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Join key representation. Numbers lose trailing zeros so that `4135`
    /// and `4135.0` produce the same key as the text `"4135"`; text is only
    /// trimmed, so codes such as `"007"` keep their leading zeros.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(value) => Some(decimal_key(*value)),
            Cell::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }

    /// Numeric value of the cell. `Ok(None)` for empty cells, `Err` carrying
    /// the offending text for values that are not numbers.
    pub fn as_amount(&self) -> std::result::Result<Option<Decimal>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(value) => Ok(Some(*value)),
            Cell::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                parse_amount(trimmed).map(Some).ok_or_else(|| text.clone())
            }
        }
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(Decimal::from(value))
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(Decimal::from(value))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => write!(f, "{}", text),
            Cell::Empty => Ok(()),
        }
    }
}

/// A named sheet. Every row has exactly one cell per column; [`Table::push_row`]
/// is the only way rows get in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: Vec<S>) -> Self {
        Self {
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|c| c.into().trim().to_string())
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with empty cells; rows wider than
    /// the header are rejected.
    pub fn push_row(&mut self, mut row: Vec<Cell>) -> Result<()> {
        if row.len() > self.columns.len() {
            return Err(ReclassificationError::InvalidTable(format!(
                "sheet '{}' row {} has {} cells but only {} columns",
                self.name,
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            )));
        }
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
        Ok(())
    }

    pub fn with_row(mut self, row: Vec<Cell>) -> Result<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Cells of one column, top to bottom. `None` when the column is absent.
    pub fn column_cells<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Returns a copy without the named columns, plus the names that were
    /// actually present and removed.
    pub fn without_columns(&self, names: &[String]) -> (Table, Vec<String>) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i]))
            .collect();
        let removed: Vec<String> = self
            .columns
            .iter()
            .filter(|c| names.contains(c))
            .cloned()
            .collect();

        let table = Table {
            name: self.name.clone(),
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        };

        (table, removed)
    }

    /// Applies `f` to every cell of `column`. Returns `false` if the column
    /// does not exist.
    pub fn try_map_column<F>(&mut self, column: &str, mut f: F) -> Result<bool>
    where
        F: FnMut(&[Cell], &Cell) -> Result<Cell>,
    {
        let Some(idx) = self.column_index(column) else {
            return Ok(false);
        };
        for row in &mut self.rows {
            let updated = f(row.as_slice(), &row[idx])?;
            row[idx] = updated;
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    sheets: Vec<Table>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet, replacing any previous sheet with the same name.
    pub fn insert(&mut self, table: Table) {
        if let Some(existing) = self.sheets.iter_mut().find(|s| s.name == table.name) {
            *existing = table;
        } else {
            self.sheets.push(table);
        }
    }

    pub fn with_sheet(mut self, table: Table) -> Self {
        self.insert(table);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheets(&self) -> &[Table] {
        &self.sheets
    }
}
