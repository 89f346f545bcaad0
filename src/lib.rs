//! # Cartera Reclassifier
//!
//! A library for turning a property-management accounts-receivable ledger
//! (one row per debtor, one column per raw general-ledger account) into a
//! standardized per-debtor summary keyed by homologated categories.
//!
//! ## Core Concepts
//!
//! - **PUC**: chart of accounts mapping raw account codes to a homologated category
//! - **Cartera**: the wide receivable ledger, one `c_<account>` column per raw account
//! - **Quitar**: debtor codes removed from the final output
//! - **Summary**: `codigo` plus the nine canonical categories, always in the same order
//! - **Arrears report**: debtors above a threshold grouped by tower, one page per tower
//!
//! The pipeline runs validate → normalize → reclassify (unpivot, homologate,
//! aggregate) → apply_rules → exclude. Every run returns the ordered
//! [`PipelineEvent`]s describing what happened.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cartera_reclassifier::*;
//! use std::path::Path;
//!
//! let workbook = load_workbook_dir(Path::new("export/"))?;
//! let outcome = process_workbook(&workbook)?;
//!
//! for event in &outcome.events {
//!     println!("{}", event.describe());
//! }
//! write_summary_csv(std::io::stdout(), &outcome.summary)?;
//! ```

pub mod aggregator;
pub mod chart_of_accounts;
pub mod config;
pub mod error;
pub mod events;
pub mod exclusion;
pub mod export;
pub mod ingestion;
pub mod normalizer;
pub mod report;
pub mod rules;
pub mod schema;
pub mod table;
pub mod unpivot;
pub mod utils;
pub mod validation;

pub use aggregator::{aggregate, AggregatedLedger};
pub use chart_of_accounts::{AccountEntry, ChartOfAccounts, HomologationResult};
pub use config::{ArrearsConfig, PipelineConfig};
pub use error::{MissingColumn, ReclassificationError, Result, SchemaViolation};
pub use events::{EventLog, PipelineEvent};
pub use exclusion::{exclude, ExclusionList};
pub use export::{summary_to_csv_string, summary_to_json, write_summary_csv};
pub use ingestion::{load_workbook_dir, load_workbook_xlsx, read_table_csv};
pub use normalizer::{normalize, NormalizedLedger};
pub use report::{
    build_arrears_report, ArrearsEntry, ArrearsGroup, ArrearsOutcome, ArrearsReport,
    DocumentBlock, PageDocument, TextDocument,
};
pub use rules::{apply_rules, RuleEngine, RuleOutcome};
pub use schema::*;
pub use table::{Cell, Table, Workbook};
pub use unpivot::{unpivot, UnpivotedLedger};
pub use validation::validate;

use log::{debug, info};
use std::collections::BTreeSet;

/// Aggregated ledger plus what each reclassification step kept and dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reclassification {
    pub ledger: AggregatedLedger,
    pub facts: usize,
    pub skipped_rows: usize,
    pub matched: usize,
    pub discarded: usize,
    pub unmapped_codes: BTreeSet<String>,
}

/// Unpivots a normalized ledger, homologates every fact against the chart
/// and repivots onto the canonical categories.
pub fn reclassify(
    normalized: &Table,
    chart: &ChartOfAccounts,
    config: &PipelineConfig,
) -> Result<Reclassification> {
    let unpivoted = unpivot(normalized, config)?;
    let facts = unpivoted.facts.len();

    let homologated = chart.homologate(unpivoted.facts)?;
    debug!(
        "{} of {} facts homologated, unmapped accounts: {:?}",
        homologated.facts.len(),
        facts,
        homologated.unmapped_codes
    );

    let ledger = aggregate(&homologated.facts)?;

    Ok(Reclassification {
        ledger,
        facts,
        skipped_rows: unpivoted.skipped_rows,
        matched: homologated.facts.len(),
        discarded: homologated.discarded,
        unmapped_codes: homologated.unmapped_codes,
    })
}

/// Final summary together with the events of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub summary: ReclassifiedSummary,
    pub events: Vec<PipelineEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrearsRun {
    pub outcome: ArrearsOutcome,
    pub events: Vec<PipelineEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct ReclassificationPipeline {
    config: PipelineConfig,
}

impl ReclassificationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the whole summary pipeline. Any error aborts the run; no partial
    /// summary is ever returned.
    pub fn run(&self, workbook: &Workbook) -> Result<PipelineOutcome> {
        let config = &self.config;
        let mut events = EventLog::new();

        validate(workbook, config)?;
        let (chart_sheet, ledger_sheet, exclusion_sheet) = self.required_sheets(workbook)?;
        events.record(PipelineEvent::Validated {
            sheets: vec![
                chart_sheet.name.clone(),
                ledger_sheet.name.clone(),
                exclusion_sheet.name.clone(),
            ],
        });

        let chart = ChartOfAccounts::from_table(chart_sheet, config)?;
        let exclusions = ExclusionList::from_table(exclusion_sheet, &config.exclusion_column)?;
        info!(
            "Chart of accounts has {} entries, {} debtor codes to exclude",
            chart.total_accounts(),
            exclusions.len()
        );

        let normalized = normalize(ledger_sheet, config)?;
        events.record(PipelineEvent::Normalized {
            rows: normalized.table.row_count(),
            dropped_columns: normalized.dropped_columns.clone(),
            advances_negated: normalized.advances_negated,
        });

        let reclassification = reclassify(&normalized.table, &chart, config)?;
        events.record(PipelineEvent::Unpivoted {
            facts: reclassification.facts,
            skipped_rows: reclassification.skipped_rows,
        });
        events.record(PipelineEvent::Homologated {
            matched: reclassification.matched,
            discarded: reclassification.discarded,
            unmapped_codes: reclassification.unmapped_codes.iter().cloned().collect(),
        });
        events.record(PipelineEvent::Aggregated {
            debtors: reclassification.ledger.rows.len(),
            ignored_categories: reclassification
                .ledger
                .ignored_categories
                .iter()
                .cloned()
                .collect(),
        });

        let RuleOutcome {
            mut summary,
            suppressed_total_due,
            normalized_credit_balances,
        } = apply_rules(&reclassification.ledger)?;
        events.record(PipelineEvent::RulesApplied {
            suppressed_total_due,
            normalized_credit_balances,
        });

        let removed = exclude(&mut summary, &exclusions);
        events.record(PipelineEvent::Excluded {
            requested: exclusions.len(),
            removed,
            remaining: summary.len(),
        });

        Ok(PipelineOutcome {
            summary,
            events: events.into_events(),
        })
    }

    /// Builds the per-tower arrears report from the raw ledger sheet.
    pub fn arrears_report(&self, workbook: &Workbook, cutoff_date: &str) -> Result<ArrearsRun> {
        let ledger = workbook.sheet(&self.config.ledger_sheet).ok_or_else(|| {
            ReclassificationError::SchemaValidation(SchemaViolation {
                missing_sheets: vec![self.config.ledger_sheet.clone()],
                missing_columns: Vec::new(),
            })
        })?;

        let outcome = build_arrears_report(ledger, cutoff_date, &self.config)?;

        let mut events = EventLog::new();
        match &outcome {
            ArrearsOutcome::Report(report) => events.record(PipelineEvent::ArrearsGrouped {
                towers: report.groups.len(),
                debtors: report.debtor_count(),
            }),
            ArrearsOutcome::Empty { threshold, .. } => events.record(PipelineEvent::ArrearsEmpty {
                threshold: threshold.to_string(),
            }),
        }

        Ok(ArrearsRun {
            outcome,
            events: events.into_events(),
        })
    }

    fn required_sheets<'a>(&self, workbook: &'a Workbook) -> Result<(&'a Table, &'a Table, &'a Table)> {
        let sheet = |name: &str| {
            workbook.sheet(name).ok_or_else(|| {
                ReclassificationError::SchemaValidation(SchemaViolation {
                    missing_sheets: vec![name.to_string()],
                    missing_columns: Vec::new(),
                })
            })
        };
        Ok((
            sheet(&self.config.chart_sheet)?,
            sheet(&self.config.ledger_sheet)?,
            sheet(&self.config.exclusion_sheet)?,
        ))
    }
}

/// Runs the summary pipeline with the default workbook layout.
pub fn process_workbook(workbook: &Workbook) -> Result<PipelineOutcome> {
    ReclassificationPipeline::default().run(workbook)
}
