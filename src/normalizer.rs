use crate::config::PipelineConfig;
use crate::error::{ReclassificationError, Result};
use crate::table::{Cell, Table};
use log::debug;

/// Ledger ready for unpivoting. The source table is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLedger {
    pub table: Table,
    /// Drop-list columns that were actually present and removed.
    pub dropped_columns: Vec<String>,
    pub advances_negated: bool,
}

/// Removes descriptive columns and flips the sign of advance payments.
pub fn normalize(ledger: &Table, config: &PipelineConfig) -> Result<NormalizedLedger> {
    let (mut table, dropped_columns) = ledger.without_columns(&config.dropped_columns);
    debug!(
        "Dropped {} descriptive columns from '{}'",
        dropped_columns.len(),
        table.name
    );

    let debtor_idx = table.column_index(&config.debtor_column);
    let advance_column = config.advance_column.clone();
    let advances_negated = table.try_map_column(&config.advance_column, |row, cell| {
        match cell.as_amount() {
            Ok(Some(value)) => Ok(Cell::Number(-value)),
            Ok(None) => Ok(Cell::Empty),
            Err(text) => Err(ReclassificationError::InvalidAmount {
                debtor: debtor_idx
                    .and_then(|idx| row[idx].as_key())
                    .unwrap_or_default(),
                column: advance_column.clone(),
                value: text,
            }),
        }
    })?;

    Ok(NormalizedLedger {
        table,
        dropped_columns,
        advances_negated,
    })
}
