//! Per-tower arrears report.
//!
//! Works on the raw ledger, never on the reclassified summary. Debtors whose
//! total is strictly above the configured threshold are grouped by tower in
//! the order towers first appear, and each group is written as one section of
//! a page-oriented document.

use crate::config::PipelineConfig;
use crate::error::{ReclassificationError, Result};
use crate::table::Table;
use crate::utils::{format_grouped, parse_cutoff_date};
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrearsEntry {
    pub debtor_code: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrearsGroup {
    pub tower_id: String,
    pub members: Vec<ArrearsEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrearsReport {
    pub document_name: String,
    pub cutoff_date: NaiveDate,
    pub threshold: Decimal,
    pub groups: Vec<ArrearsGroup>,
}

/// Result of building the report. An empty outcome is informational.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ArrearsOutcome {
    Report(ArrearsReport),
    Empty { cutoff_date: NaiveDate, threshold: Decimal },
}

impl ArrearsOutcome {
    pub fn report(&self) -> Option<&ArrearsReport> {
        match self {
            ArrearsOutcome::Report(report) => Some(report),
            ArrearsOutcome::Empty { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ArrearsOutcome::Empty { .. })
    }
}

/// Builds the arrears report from the original ledger sheet.
///
/// The cutoff date is checked first, then the required columns; both fail
/// before any row is looked at. Rows without a debtor code, or whose total is
/// empty or not numeric, never qualify.
pub fn build_arrears_report(
    ledger: &Table,
    cutoff_date: &str,
    config: &PipelineConfig,
) -> Result<ArrearsOutcome> {
    let settings = &config.arrears;
    let cutoff_date = parse_cutoff_date(cutoff_date, &settings.date_format)?;

    let required = [
        config.debtor_column.as_str(),
        settings.total_column.as_str(),
        settings.tower_column.as_str(),
    ];
    let missing_columns: Vec<String> = required
        .iter()
        .filter(|column| !ledger.has_column(column))
        .map(|column| column.to_string())
        .collect();
    if !missing_columns.is_empty() {
        return Err(ReclassificationError::ReportValidation { missing_columns });
    }

    // columns were checked above
    let debtor_idx = ledger.column_index(&config.debtor_column).unwrap_or_default();
    let total_idx = ledger.column_index(&settings.total_column).unwrap_or_default();
    let tower_idx = ledger.column_index(&settings.tower_column).unwrap_or_default();

    let mut groups: Vec<ArrearsGroup> = Vec::new();
    for row in ledger.rows() {
        let Some(debtor_code) = row[debtor_idx].as_key() else {
            continue;
        };
        let Ok(Some(total_amount)) = row[total_idx].as_amount() else {
            continue;
        };
        if total_amount <= settings.threshold {
            continue;
        }

        let tower_id = row[tower_idx].as_key().unwrap_or_default();
        let entry = ArrearsEntry {
            debtor_code,
            total_amount,
        };
        match groups.iter_mut().find(|g| g.tower_id == tower_id) {
            Some(group) => group.members.push(entry),
            None => groups.push(ArrearsGroup {
                tower_id,
                members: vec![entry],
            }),
        }
    }

    if groups.is_empty() {
        debug!("No debtor above {} in '{}'", settings.threshold, ledger.name);
        return Ok(ArrearsOutcome::Empty {
            cutoff_date,
            threshold: settings.threshold,
        });
    }

    Ok(ArrearsOutcome::Report(ArrearsReport {
        document_name: settings.document_name.clone(),
        cutoff_date,
        threshold: settings.threshold,
        groups,
    }))
}

impl ArrearsReport {
    pub fn debtor_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    /// Writes the report: a title and cutoff line, then one section per
    /// tower with a page break between sections.
    pub fn write_to<D: PageDocument>(&self, document: &mut D) {
        document.heading("Cartera en mora por torre", 0);
        document.paragraph(&format!(
            "Fecha de corte: {}",
            self.cutoff_date.format("%d/%m/%Y")
        ));

        for (idx, group) in self.groups.iter().enumerate() {
            if idx > 0 {
                document.page_break();
            }
            document.heading(&format!("Torre {}", group.tower_id), 1);
            let rows: Vec<Vec<String>> = group
                .members
                .iter()
                .map(|m| vec![m.debtor_code.clone(), format_grouped(m.total_amount)])
                .collect();
            document.table(&["Código", "Total"], &rows);
        }
    }

    /// Convenience: renders the report into a [`TextDocument`].
    pub fn to_text_document(&self) -> TextDocument {
        let mut document = TextDocument::new(&self.document_name);
        self.write_to(&mut document);
        document
    }
}

/// Something that can receive a page-oriented document: headings,
/// paragraphs, tables and explicit page breaks. Word or PDF writers live
/// outside this crate and implement it.
pub trait PageDocument {
    fn heading(&mut self, text: &str, level: u8);
    fn paragraph(&mut self, text: &str);
    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]);
    fn page_break(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum DocumentBlock {
    Heading { text: String, level: u8 },
    Paragraph { text: String },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    PageBreak,
}

/// In-memory [`PageDocument`] that keeps the blocks it receives and renders
/// them as plain text, using a form feed for page breaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextDocument {
    pub name: String,
    pub blocks: Vec<DocumentBlock>,
}

impl TextDocument {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        1 + self
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::PageBreak))
            .count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                DocumentBlock::Heading { text, level } => {
                    out.push_str(text);
                    out.push('\n');
                    let underline = if *level == 0 { '=' } else { '-' };
                    out.push_str(&underline.to_string().repeat(text.chars().count()));
                    out.push_str("\n\n");
                }
                DocumentBlock::Paragraph { text } => {
                    out.push_str(text);
                    out.push_str("\n\n");
                }
                DocumentBlock::Table { headers, rows } => {
                    out.push_str(&render_table(headers, rows));
                    out.push('\n');
                }
                DocumentBlock::PageBreak => out.push('\u{000C}'),
            }
        }
        out
    }
}

impl PageDocument for TextDocument {
    fn heading(&mut self, text: &str, level: u8) {
        self.blocks.push(DocumentBlock::Heading {
            text: text.to_string(),
            level,
        });
    }

    fn paragraph(&mut self, text: &str) {
        self.blocks.push(DocumentBlock::Paragraph {
            text: text.to_string(),
        });
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        self.blocks.push(DocumentBlock::Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.to_vec(),
        });
    }

    fn page_break(&mut self) {
        self.blocks.push(DocumentBlock::PageBreak);
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                // first column left aligned, amounts right aligned
                if i == 0 {
                    format!("{:<width$}", cell, width = width)
                } else {
                    format!("{:>width$}", cell, width = width)
                }
            })
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut out = line(headers);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("|-{}-|\n", separator.join("-|-")));
    for row in rows {
        out.push_str(&line(row));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use rust_decimal_macros::dec;

    fn ledger() -> Table {
        Table::new("CARTERA", vec!["codigo", "interior", "total", "anticipos"])
            .with_row(vec!["B2".into(), "T1".into(), 1500.into(), Cell::Empty])
            .unwrap()
            .with_row(vec!["B3".into(), "T1".into(), 500.into(), Cell::Empty])
            .unwrap()
            .with_row(vec!["C1".into(), "T2".into(), Cell::Number(dec!(2500000.5)), Cell::Empty])
            .unwrap()
            .with_row(vec!["B4".into(), "T1".into(), 1000.into(), Cell::Empty])
            .unwrap()
            .with_row(vec!["B5".into(), "T1".into(), 1001.into(), Cell::Empty])
            .unwrap()
    }

    #[test]
    fn test_groups_in_first_seen_order_above_threshold() {
        let outcome =
            build_arrears_report(&ledger(), "30/06/2025", &PipelineConfig::default()).unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.cutoff_date, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
        let towers: Vec<&str> = report.groups.iter().map(|g| g.tower_id.as_str()).collect();
        assert_eq!(towers, vec!["T1", "T2"]);

        let t1: Vec<&str> = report.groups[0]
            .members
            .iter()
            .map(|m| m.debtor_code.as_str())
            .collect();
        // 1000 is not strictly above the threshold
        assert_eq!(t1, vec!["B2", "B5"]);
        assert_eq!(report.debtor_count(), 3);
    }

    #[test]
    fn test_invalid_date_fails_before_columns() {
        let bare = Table::new("CARTERA", vec!["codigo"]);
        let err = build_arrears_report(&bare, "2025-06-30", &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, ReclassificationError::DateFormat { .. }));
    }

    #[test]
    fn test_missing_columns_fail() {
        let bare = Table::new("CARTERA", vec!["codigo", "total"]);
        let err = build_arrears_report(&bare, "30/06/2025", &PipelineConfig::default()).unwrap_err();
        match err {
            ReclassificationError::ReportValidation { missing_columns } => {
                assert_eq!(missing_columns, vec!["interior".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_nothing_above_threshold_is_empty_not_error() {
        let table = Table::new("CARTERA", vec!["codigo", "interior", "total"])
            .with_row(vec!["B3".into(), "T1".into(), 500.into()])
            .unwrap()
            .with_row(vec!["B6".into(), "T1".into(), "sin dato".into()])
            .unwrap();

        let outcome =
            build_arrears_report(&table, "01/01/2025", &PipelineConfig::default()).unwrap();
        assert!(outcome.is_empty());
        assert!(outcome.report().is_none());
    }

    #[test]
    fn test_document_sections_and_page_breaks() {
        let outcome =
            build_arrears_report(&ledger(), "30/06/2025", &PipelineConfig::default()).unwrap();
        let document = outcome.report().unwrap().to_text_document();

        assert_eq!(document.name, "Cartera_por_Torre");
        assert_eq!(document.page_count(), 2);
        assert!(!matches!(document.blocks.last(), Some(DocumentBlock::PageBreak)));

        let breaks: Vec<usize> = document
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b, DocumentBlock::PageBreak))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(breaks.len(), 1);
        assert!(matches!(
            &document.blocks[breaks[0] + 1],
            DocumentBlock::Heading { text, .. } if text == "Torre T2"
        ));

        let text = document.render();
        assert!(text.contains("Torre T1"));
        assert!(text.contains("1,500"));
        assert!(text.contains("2,500,000.50"));
        assert!(text.contains("Fecha de corte: 30/06/2025"));
    }
}
