//! Structured record of what a run did.
//!
//! Every step appends a [`PipelineEvent`]; the sequence is returned with the
//! result so a front end can show it however it likes. Each event is also
//! forwarded to the `log` facade.

use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Validated {
        sheets: Vec<String>,
    },
    Normalized {
        rows: usize,
        dropped_columns: Vec<String>,
        advances_negated: bool,
    },
    Unpivoted {
        facts: usize,
        skipped_rows: usize,
    },
    Homologated {
        matched: usize,
        discarded: usize,
        unmapped_codes: Vec<String>,
    },
    Aggregated {
        debtors: usize,
        ignored_categories: Vec<String>,
    },
    RulesApplied {
        suppressed_total_due: usize,
        normalized_credit_balances: usize,
    },
    Excluded {
        requested: usize,
        removed: usize,
        remaining: usize,
    },
    ArrearsGrouped {
        towers: usize,
        debtors: usize,
    },
    ArrearsEmpty {
        threshold: String,
    },
}

impl PipelineEvent {
    /// One-line human readable description.
    pub fn describe(&self) -> String {
        match self {
            PipelineEvent::Validated { sheets } => {
                format!("Workbook validated: sheets {}", sheets.join(", "))
            }
            PipelineEvent::Normalized {
                rows,
                dropped_columns,
                advances_negated,
            } => format!(
                "Ledger normalized: {} rows, {} descriptive columns dropped, advances {}",
                rows,
                dropped_columns.len(),
                if *advances_negated { "negated" } else { "absent" }
            ),
            PipelineEvent::Unpivoted {
                facts,
                skipped_rows,
            } => format!(
                "Ledger unpivoted into {} facts ({} rows without debtor skipped)",
                facts, skipped_rows
            ),
            PipelineEvent::Homologated {
                matched,
                discarded,
                unmapped_codes,
            } => format!(
                "Homologation: {} facts mapped, {} discarded ({} unmapped accounts)",
                matched,
                discarded,
                unmapped_codes.len()
            ),
            PipelineEvent::Aggregated {
                debtors,
                ignored_categories,
            } => format!(
                "Aggregated {} debtors ({} non-summary categories ignored)",
                debtors,
                ignored_categories.len()
            ),
            PipelineEvent::RulesApplied {
                suppressed_total_due,
                normalized_credit_balances,
            } => format!(
                "Business rules applied: {} totals suppressed, {} credit balances normalized",
                suppressed_total_due, normalized_credit_balances
            ),
            PipelineEvent::Excluded {
                requested,
                removed,
                remaining,
            } => format!(
                "Exclusions: {} codes listed, {} rows removed, {} rows remaining",
                requested, removed, remaining
            ),
            PipelineEvent::ArrearsGrouped { towers, debtors } => format!(
                "Arrears report: {} debtors across {} towers",
                debtors, towers
            ),
            PipelineEvent::ArrearsEmpty { threshold } => {
                format!("Arrears report: no debtor exceeds {}", threshold)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<PipelineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: PipelineEvent) {
        match &event {
            PipelineEvent::ArrearsEmpty { .. } => warn!("{}", event.describe()),
            _ => info!("{}", event.describe()),
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[PipelineEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<PipelineEvent> {
        self.events
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_keep_order_and_serialize_tagged() {
        let mut log = EventLog::new();
        log.record(PipelineEvent::Validated {
            sheets: vec!["PUC".to_string(), "CARTERA".to_string()],
        });
        log.record(PipelineEvent::Excluded {
            requested: 2,
            removed: 1,
            remaining: 4,
        });

        assert_eq!(log.events().len(), 2);
        let json = log.to_json().unwrap();
        assert!(json.contains("\"event\": \"validated\""));
        assert!(json.find("validated").unwrap() < json.find("excluded").unwrap());
    }

    #[test]
    fn test_describe_mentions_counts() {
        let event = PipelineEvent::RulesApplied {
            suppressed_total_due: 3,
            normalized_credit_balances: 7,
        };
        let text = event.describe();
        assert!(text.contains("3 totals suppressed"));
        assert!(text.contains("7 credit balances"));
    }
}
