use crate::aggregator::AggregatedLedger;
use crate::error::{ReclassificationError, Result};
use crate::schema::{AggregatedRow, Category, CategoryAmounts, ReclassifiedSummary, SummaryRow};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// The summary after business rules, with counters for the event log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub summary: ReclassifiedSummary,
    /// Debtors whose total due was forced to zero by a negative credit balance.
    pub suppressed_total_due: usize,
    /// Debtors whose nonzero credit balance was turned into its magnitude.
    pub normalized_credit_balances: usize,
}

pub struct RuleEngine;

impl RuleEngine {
    /// Applies the business rules to one debtor, in order:
    ///
    /// 1. a negative `SALDO A FAVOR` forces `TOTAL A PAGAR` to zero, whatever
    ///    its own value;
    /// 2. a nonzero `SALDO A FAVOR` becomes the integer part of its absolute
    ///    value, zero stays zero;
    /// 3. every category is truncated toward zero to an integer.
    ///
    /// Rule 1 reads the sign before rule 2 discards it.
    pub fn apply_row(row: &AggregatedRow) -> Result<(SummaryRow, bool, bool)> {
        let mut amounts: CategoryAmounts = row.amounts;
        let credit = amounts[Category::CreditBalance];

        let suppressed = credit < Decimal::ZERO;
        if suppressed {
            amounts[Category::TotalDue] = Decimal::ZERO;
        }

        let normalized = !credit.is_zero();
        if normalized {
            amounts[Category::CreditBalance] = credit.abs().trunc();
        }

        let mut summary_row = SummaryRow::new(row.debtor_code.clone());
        for (category, value) in amounts.iter() {
            summary_row.set(category, to_integer(&row.debtor_code, category, value)?);
        }

        Ok((summary_row, suppressed, normalized))
    }

    pub fn apply(ledger: &AggregatedLedger) -> Result<RuleOutcome> {
        let mut outcome = RuleOutcome::default();
        outcome.summary.rows.reserve(ledger.rows.len());

        for row in &ledger.rows {
            let (summary_row, suppressed, normalized) = Self::apply_row(row)?;
            if suppressed {
                debug!(
                    "Total due suppressed for debtor {} (negative credit balance)",
                    row.debtor_code
                );
                outcome.suppressed_total_due += 1;
            }
            if normalized {
                outcome.normalized_credit_balances += 1;
            }
            outcome.summary.rows.push(summary_row);
        }

        Ok(outcome)
    }
}

fn to_integer(debtor: &str, category: Category, value: Decimal) -> Result<i64> {
    value
        .trunc()
        .to_i64()
        .ok_or_else(|| ReclassificationError::AmountOutOfRange {
            debtor: debtor.to_string(),
            column: category.label().to_string(),
            value: value.to_string(),
        })
}

pub fn apply_rules(ledger: &AggregatedLedger) -> Result<RuleOutcome> {
    RuleEngine::apply(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(debtor: &str, pairs: &[(Category, Decimal)]) -> AggregatedRow {
        AggregatedRow {
            debtor_code: debtor.to_string(),
            amounts: CategoryAmounts::from_pairs(pairs.iter().copied()).unwrap(),
        }
    }

    // Counter-intuitive on purpose: a negative credit balance zeroes a
    // positive total due. Keep this exact coupling.
    #[test]
    fn test_negative_credit_balance_suppresses_total_due() {
        let (result, suppressed, normalized) = RuleEngine::apply_row(&row(
            "A1",
            &[(Category::CreditBalance, dec!(-5)), (Category::TotalDue, dec!(300))],
        ))
        .unwrap();

        assert!(suppressed);
        assert!(normalized);
        assert_eq!(result.total_due, 0);
        assert_eq!(result.credit_balance, 5);
    }

    #[test]
    fn test_positive_credit_balance_keeps_total_due() {
        let (result, suppressed, _) = RuleEngine::apply_row(&row(
            "A2",
            &[(Category::CreditBalance, dec!(12.9)), (Category::TotalDue, dec!(300.7))],
        ))
        .unwrap();

        assert!(!suppressed);
        assert_eq!(result.total_due, 300);
        assert_eq!(result.credit_balance, 12);
    }

    #[test]
    fn test_zero_credit_balance_stays_zero() {
        let (result, suppressed, normalized) = RuleEngine::apply_row(&row(
            "A3",
            &[(Category::CreditBalance, Decimal::ZERO), (Category::TotalDue, dec!(80))],
        ))
        .unwrap();

        assert!(!suppressed);
        assert!(!normalized);
        assert_eq!(result.credit_balance, 0);
        assert_eq!(result.total_due, 80);
    }

    #[test]
    fn test_fractional_negative_credit_still_suppresses() {
        let (result, suppressed, _) = RuleEngine::apply_row(&row(
            "A4",
            &[(Category::CreditBalance, dec!(-0.4)), (Category::TotalDue, dec!(55))],
        ))
        .unwrap();

        assert!(suppressed);
        assert_eq!(result.total_due, 0);
        assert_eq!(result.credit_balance, 0);
    }

    #[test]
    fn test_truncation_toward_zero() {
        let (result, _, _) = RuleEngine::apply_row(&row(
            "A5",
            &[
                (Category::Administration, dec!(1000.99)),
                (Category::Interest, dec!(-10.7)),
                (Category::Other, dec!(0.3)),
            ],
        ))
        .unwrap();

        assert_eq!(result.administration, 1000);
        assert_eq!(result.interest, -10);
        assert_eq!(result.other, 0);
    }

    #[test]
    fn test_apply_counts_rule_hits() {
        let ledger = AggregatedLedger {
            rows: vec![
                row("A1", &[(Category::CreditBalance, dec!(-5)), (Category::TotalDue, dec!(300))]),
                row("A2", &[(Category::CreditBalance, dec!(7))]),
                row("A3", &[(Category::TotalDue, dec!(10))]),
            ],
            ..Default::default()
        };

        let outcome = apply_rules(&ledger).unwrap();
        assert_eq!(outcome.summary.len(), 3);
        assert_eq!(outcome.suppressed_total_due, 1);
        assert_eq!(outcome.normalized_credit_balances, 2);
    }

    #[test]
    fn test_out_of_range_amount_is_an_error() {
        let huge = Decimal::MAX;
        let err = RuleEngine::apply_row(&row("Z9", &[(Category::Other, huge)])).unwrap_err();
        assert!(matches!(err, ReclassificationError::AmountOutOfRange { .. }));
    }
}
