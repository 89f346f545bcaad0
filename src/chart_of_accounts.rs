use crate::config::PipelineConfig;
use crate::error::{ReclassificationError, Result};
use crate::schema::{HomologatedFact, LedgerFact};
use crate::table::Table;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One row of the PUC: a raw account code and the category it reports under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub raw_account_code: String,
    pub homologated_category: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    entries: Vec<AccountEntry>,
    index: HashMap<String, usize>,
}

/// Facts that found a category, and what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomologationResult {
    pub facts: Vec<HomologatedFact>,
    pub discarded: usize,
    /// Raw codes seen in the ledger that the chart does not list.
    pub unmapped_codes: BTreeSet<String>,
    /// Raw codes the chart lists with an empty category.
    pub blank_category_codes: BTreeSet<String>,
}

impl ChartOfAccounts {
    pub fn from_entries(entries: Vec<AccountEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if index.insert(entry.raw_account_code.clone(), idx).is_some() {
                return Err(ReclassificationError::DuplicateAccountCode(
                    entry.raw_account_code.clone(),
                ));
            }
        }
        Ok(Self { entries, index })
    }

    /// Builds the chart from the PUC sheet. Codes are normalized to text keys
    /// the same way ledger column names are; rows without a code are skipped
    /// and an empty category cell becomes an empty category.
    pub fn from_table(table: &Table, config: &PipelineConfig) -> Result<Self> {
        let code_idx = table.column_index(&config.account_code_column).ok_or_else(|| {
            ReclassificationError::InvalidTable(format!(
                "sheet '{}' has no column '{}'",
                table.name, config.account_code_column
            ))
        })?;
        let category_idx = table.column_index(&config.category_column).ok_or_else(|| {
            ReclassificationError::InvalidTable(format!(
                "sheet '{}' has no column '{}'",
                table.name, config.category_column
            ))
        })?;

        let mut entries = Vec::with_capacity(table.row_count());
        let mut skipped = 0usize;
        for row in table.rows() {
            let Some(raw_account_code) = row[code_idx].as_key() else {
                skipped += 1;
                continue;
            };
            let homologated_category = row[category_idx].to_string().trim().to_string();
            entries.push(AccountEntry {
                raw_account_code,
                homologated_category,
            });
        }

        if skipped > 0 {
            debug!("Skipped {} chart rows without an account code", skipped);
        }

        Self::from_entries(entries)
    }

    pub fn entries(&self) -> &[AccountEntry] {
        &self.entries
    }

    pub fn total_accounts(&self) -> usize {
        self.entries.len()
    }

    /// Category for a raw code, `None` when the code is not listed.
    pub fn lookup(&self, raw_account_code: &str) -> Option<&str> {
        self.index
            .get(raw_account_code)
            .map(|&idx| self.entries[idx].homologated_category.as_str())
    }

    /// Attaches a category to every fact. Facts whose code is not in the
    /// chart, or whose category is blank, do not take part in the summary and
    /// are dropped silently whatever their content. Mapped facts must hold a
    /// number; an empty cell counts as zero.
    pub fn homologate(&self, facts: Vec<LedgerFact>) -> Result<HomologationResult> {
        let mut result = HomologationResult::default();

        for fact in facts {
            match self.lookup(&fact.raw_account_code) {
                Some(category) if !category.is_empty() => {
                    let amount = fact
                        .value
                        .as_amount()
                        .map_err(|value| ReclassificationError::InvalidAmount {
                            debtor: fact.debtor_code.clone(),
                            column: fact.source_column.clone(),
                            value,
                        })?
                        .unwrap_or(Decimal::ZERO);
                    result.facts.push(HomologatedFact {
                        debtor_code: fact.debtor_code,
                        raw_account_code: fact.raw_account_code,
                        category: category.to_string(),
                        amount,
                    });
                }
                Some(_) => {
                    result.discarded += 1;
                    result.blank_category_codes.insert(fact.raw_account_code);
                }
                None => {
                    result.discarded += 1;
                    result.unmapped_codes.insert(fact.raw_account_code);
                }
            }
        }

        if !result.blank_category_codes.is_empty() {
            warn!(
                "Accounts listed without a category were dropped: {:?}",
                result.blank_category_codes
            );
        }

        Ok(result)
    }

    /// Raw codes grouped under each category, for display.
    pub fn accounts_by_category(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in &self.entries {
            grouped
                .entry(entry.homologated_category.as_str())
                .or_default()
                .push(entry.raw_account_code.as_str());
        }
        grouped
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("# Chart of Accounts\n\n");

        for (category, codes) in self.accounts_by_category() {
            let title = if category.is_empty() {
                "(sin homologar)"
            } else {
                category
            };
            output.push_str(&format!("## {}\n\n", title));
            for code in codes {
                output.push_str(&format!("- {}\n", code));
            }
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use rust_decimal_macros::dec;

    fn entry(code: &str, category: &str) -> AccountEntry {
        AccountEntry {
            raw_account_code: code.to_string(),
            homologated_category: category.to_string(),
        }
    }

    fn fact(debtor: &str, code: &str, value: Cell) -> LedgerFact {
        LedgerFact {
            debtor_code: debtor.to_string(),
            raw_account_code: code.to_string(),
            source_column: format!("c_{}", code),
            value,
        }
    }

    #[test]
    fn test_chart_from_table_normalizes_codes() {
        let table = Table::new("PUC", vec!["codigo_cuenta", "Homologo APP", "descripcion"])
            .with_row(vec![Cell::Number(dec!(4135.0)), "ADMINISTRACION".into(), "Cuota".into()])
            .unwrap()
            .with_row(vec!["1305".into(), " INTERESES ".into()])
            .unwrap()
            .with_row(vec![Cell::Empty, "OTROS".into()])
            .unwrap();

        let chart = ChartOfAccounts::from_table(&table, &PipelineConfig::default()).unwrap();

        assert_eq!(chart.total_accounts(), 2);
        assert_eq!(chart.lookup("4135"), Some("ADMINISTRACION"));
        assert_eq!(chart.lookup("1305"), Some("INTERESES"));
        assert_eq!(chart.lookup("9999"), None);
    }

    #[test]
    fn test_duplicate_codes_are_rejected() {
        let err = ChartOfAccounts::from_entries(vec![
            entry("4135", "ADMINISTRACION"),
            entry("4135", "OTROS"),
        ])
        .unwrap_err();
        assert!(matches!(err, ReclassificationError::DuplicateAccountCode(code) if code == "4135"));
    }

    #[test]
    fn test_homologate_drops_unmapped_and_blank() {
        let chart = ChartOfAccounts::from_entries(vec![
            entry("4135", "ADMINISTRACION"),
            entry("2805", ""),
        ])
        .unwrap();

        let result = chart
            .homologate(vec![
                fact("A1", "4135", Cell::Number(dec!(1000))),
                fact("A1", "2805", Cell::Number(dec!(50))),
                fact("A1", "anticipos", Cell::Number(dec!(-200))),
            ])
            .unwrap();

        assert_eq!(result.facts.len(), 1);
        assert_eq!(result.facts[0].category, "ADMINISTRACION");
        assert_eq!(result.facts[0].amount, dec!(1000));
        assert_eq!(result.discarded, 2);
        assert!(result.unmapped_codes.contains("anticipos"));
        assert!(result.blank_category_codes.contains("2805"));
    }

    #[test]
    fn test_only_mapped_facts_must_be_numeric() {
        let chart = ChartOfAccounts::from_entries(vec![
            entry("4135", "ADMINISTRACION"),
            entry("4140", ""),
        ])
        .unwrap();

        let result = chart
            .homologate(vec![
                fact("A1", "telefono", Cell::from("300-555 1234")),
                fact("A1", "4140", Cell::from("n/a")),
                fact("A1", "4135", Cell::from("1000")),
                fact("A2", "4135", Cell::Empty),
            ])
            .unwrap();

        assert_eq!(result.discarded, 2);
        assert_eq!(result.facts[0].amount, dec!(1000));
        assert_eq!(result.facts[1].amount, Decimal::ZERO);

        let err = chart
            .homologate(vec![fact("A3", "4135", Cell::from("mil"))])
            .unwrap_err();
        assert!(matches!(
            err,
            ReclassificationError::InvalidAmount { ref debtor, ref column, ref value }
                if debtor == "A3" && column == "c_4135" && value == "mil"
        ));
    }

    #[test]
    fn test_chart_to_markdown() {
        let chart = ChartOfAccounts::from_entries(vec![
            entry("4135", "ADMINISTRACION"),
            entry("4136", "ADMINISTRACION"),
            entry("4210", "INTERESES"),
        ])
        .unwrap();

        let markdown = chart.to_markdown();
        assert!(markdown.contains("## ADMINISTRACION"));
        assert!(markdown.contains("- 4136"));
        assert_eq!(chart.accounts_by_category()["ADMINISTRACION"], vec!["4135", "4136"]);
    }
}
