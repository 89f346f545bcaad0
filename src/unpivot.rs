use crate::config::PipelineConfig;
use crate::error::{ReclassificationError, Result};
use crate::schema::LedgerFact;
use crate::table::Table;

/// Long form of the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnpivotedLedger {
    pub facts: Vec<LedgerFact>,
    /// Rows dropped because their debtor code was blank.
    pub skipped_rows: usize,
}

/// Column name → raw account code. Only a leading prefix is removed.
pub fn raw_account_code(column: &str, prefix: &str) -> String {
    column.strip_prefix(prefix).unwrap_or(column).trim().to_string()
}

/// Turns every non-debtor column into one fact per debtor, keeping the raw
/// cell. Values are only read as amounts once the chart says the account is
/// part of the summary, so free-text columns never fail a run.
pub fn unpivot(ledger: &Table, config: &PipelineConfig) -> Result<UnpivotedLedger> {
    let debtor_idx = ledger.column_index(&config.debtor_column).ok_or_else(|| {
        ReclassificationError::InvalidTable(format!(
            "sheet '{}' has no column '{}'",
            ledger.name, config.debtor_column
        ))
    })?;

    let accounts: Vec<(usize, &str, String)> = ledger
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != debtor_idx)
        .map(|(idx, name)| {
            (
                idx,
                name.as_str(),
                raw_account_code(name, &config.account_prefix),
            )
        })
        .collect();

    let mut result = UnpivotedLedger {
        facts: Vec::with_capacity(ledger.row_count() * accounts.len()),
        skipped_rows: 0,
    };

    for row in ledger.rows() {
        let Some(debtor_code) = row[debtor_idx].as_key() else {
            result.skipped_rows += 1;
            continue;
        };

        for (idx, column, code) in &accounts {
            result.facts.push(LedgerFact {
                debtor_code: debtor_code.clone(),
                raw_account_code: code.clone(),
                source_column: column.to_string(),
                value: row[*idx].clone(),
            });
        }
    }

    Ok(result)
}
