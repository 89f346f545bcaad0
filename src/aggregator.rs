use crate::error::{ReclassificationError, Result};
use crate::schema::{AggregatedRow, Category, CategoryAmounts, HomologatedFact};
use crate::utils::compare_codes;
use log::warn;
use std::collections::{BTreeSet, HashMap};

/// Wide per-debtor totals on the canonical schema, before business rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedLedger {
    /// One row per debtor, ordered by debtor code (see [`compare_codes`]).
    pub rows: Vec<AggregatedRow>,
    /// Categories found in the chart that are not part of the summary.
    pub ignored_categories: BTreeSet<String>,
}

impl AggregatedLedger {
    pub fn row(&self, debtor_code: &str) -> Option<&AggregatedRow> {
        self.rows.iter().find(|r| r.debtor_code == debtor_code)
    }
}

/// Sums facts per debtor and category and repivots onto the fixed category
/// set. A debtor appears as soon as one of its facts was homologated, even if
/// the category is not canonical; every category it lacks stays zero. Rows
/// follow [`compare_codes`], so numeric codes come out in numeric order.
pub fn aggregate(facts: &[HomologatedFact]) -> Result<AggregatedLedger> {
    let mut by_debtor: HashMap<&str, CategoryAmounts> = HashMap::new();
    let mut ignored_categories = BTreeSet::new();

    for fact in facts {
        let amounts = by_debtor.entry(fact.debtor_code.as_str()).or_default();
        match Category::from_label(&fact.category) {
            Some(category) => {
                if amounts.checked_add(category, fact.amount).is_none() {
                    return Err(ReclassificationError::AmountOutOfRange {
                        debtor: fact.debtor_code.clone(),
                        column: category.label().to_string(),
                        value: fact.amount.to_string(),
                    });
                }
            }
            None => {
                ignored_categories.insert(fact.category.clone());
            }
        }
    }

    if !ignored_categories.is_empty() {
        warn!(
            "Categories outside the summary schema were ignored: {:?}",
            ignored_categories
        );
    }

    let mut rows: Vec<AggregatedRow> = by_debtor
        .into_iter()
        .map(|(debtor_code, amounts)| AggregatedRow {
            debtor_code: debtor_code.to_string(),
            amounts,
        })
        .collect();
    rows.sort_by(|a, b| compare_codes(&a.debtor_code, &b.debtor_code));

    Ok(AggregatedLedger {
        rows,
        ignored_categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn fact(debtor: &str, code: &str, category: &str, amount: Decimal) -> HomologatedFact {
        HomologatedFact {
            debtor_code: debtor.to_string(),
            raw_account_code: code.to_string(),
            category: category.to_string(),
            amount,
        }
    }

    #[test]
    fn test_accounts_roll_up_into_one_category() {
        let ledger = aggregate(&[
            fact("A1", "4135", "ADMINISTRACION", dec!(1000)),
            fact("A1", "4136", "ADMINISTRACION", dec!(250)),
            fact("A1", "4210", "INTERESES", Decimal::ZERO),
            fact("A1", "4136", "ADMINISTRACION", dec!(-50)),
        ])
        .unwrap();

        let row = ledger.row("A1").unwrap();
        assert_eq!(row.amounts[Category::Administration], dec!(1200));
        assert_eq!(row.amounts[Category::Interest], Decimal::ZERO);
        assert_eq!(row.amounts[Category::CreditBalance], Decimal::ZERO);
    }

    #[test]
    fn test_rows_sorted_by_debtor_and_zero_filled() {
        let ledger = aggregate(&[
            fact("B2", "4135", "ADMINISTRACION", dec!(10)),
            fact("A1", "2705", "SALDO A FAVOR", dec!(-5)),
        ])
        .unwrap();

        let codes: Vec<&str> = ledger.rows.iter().map(|r| r.debtor_code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "B2"]);
        assert_eq!(ledger.rows[0].amounts[Category::Administration], Decimal::ZERO);
        assert_eq!(ledger.rows[0].amounts[Category::CreditBalance], dec!(-5));
    }

    #[test]
    fn test_numeric_codes_sort_by_value() {
        let ledger = aggregate(&[
            fact("10", "4135", "ADMINISTRACION", dec!(1)),
            fact("9", "4135", "ADMINISTRACION", dec!(2)),
            fact("0101", "4135", "ADMINISTRACION", dec!(10)),
            fact("101", "4135", "ADMINISTRACION", dec!(20)),
        ])
        .unwrap();

        let codes: Vec<&str> = ledger.rows.iter().map(|r| r.debtor_code.as_str()).collect();
        assert_eq!(codes, vec!["9", "10", "0101", "101"]);
        assert_eq!(ledger.row("0101").unwrap().amounts[Category::Administration], dec!(10));
        assert_eq!(ledger.row("101").unwrap().amounts[Category::Administration], dec!(20));
    }

    #[test]
    fn test_overflowing_sum_is_reported() {
        let err = aggregate(&[
            fact("A1", "4135", "ADMINISTRACION", Decimal::MAX),
            fact("A1", "4136", "ADMINISTRACION", Decimal::MAX),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            ReclassificationError::AmountOutOfRange { ref debtor, ref column, .. }
                if debtor == "A1" && column == "ADMINISTRACION"
        ));
    }

    #[test]
    fn test_non_canonical_categories_are_ignored() {
        let ledger = aggregate(&[
            fact("C3", "9999", "CUOTA ESPECIAL", dec!(400)),
            fact("C3", "4135", "ADMINISTRACION", dec!(100)),
        ])
        .unwrap();

        assert_eq!(ledger.rows.len(), 1);
        let total: Decimal = ledger.rows[0].amounts.iter().map(|(_, v)| v).sum();
        assert_eq!(total, dec!(100));
        assert!(ledger.ignored_categories.contains("CUOTA ESPECIAL"));
    }

    #[test]
    fn test_empty_input_yields_empty_ledger() {
        let ledger = aggregate(&[]).unwrap();
        assert!(ledger.rows.is_empty());
        assert!(ledger.ignored_categories.is_empty());
    }
}
