use crate::error::Result;
use crate::schema::{canonical_columns, Category, ReclassifiedSummary};
use crate::table::{Cell, Table};
use csv::WriterBuilder;
use std::io::Write;

/// Writes the summary as comma-separated text with the canonical header,
/// even when there are no rows.
pub fn write_summary_csv<W: Write>(writer: W, summary: &ReclassifiedSummary) -> Result<()> {
    let mut wrt = WriterBuilder::new().has_headers(false).from_writer(writer);

    wrt.write_record(canonical_columns())?;
    for row in &summary.rows {
        wrt.serialize(row)?;
    }
    wrt.flush()?;
    Ok(())
}

pub fn summary_to_csv_string(summary: &ReclassifiedSummary) -> Result<String> {
    let mut buffer = Vec::new();
    write_summary_csv(&mut buffer, summary)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn summary_to_json(summary: &ReclassifiedSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(&summary.rows)?)
}

impl ReclassifiedSummary {
    /// The summary as a single sheet, ready for a spreadsheet writer.
    pub fn to_table(&self, sheet_name: &str) -> Result<Table> {
        let mut table = Table::new(sheet_name, canonical_columns());
        for row in &self.rows {
            let mut cells = Vec::with_capacity(1 + Category::ALL.len());
            cells.push(Cell::Text(row.debtor_code.clone()));
            cells.extend(Category::ALL.iter().map(|c| Cell::from(row.get(*c))));
            table.push_row(cells)?;
        }
        Ok(table)
    }
}
