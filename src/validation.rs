use crate::config::PipelineConfig;
use crate::error::{MissingColumn, ReclassificationError, Result, SchemaViolation};
use crate::table::Workbook;

/// Sheets the pipeline reads and the columns each must carry.
fn required_layout(config: &PipelineConfig) -> Vec<(&str, Vec<&str>)> {
    vec![
        (
            config.chart_sheet.as_str(),
            vec![
                config.account_code_column.as_str(),
                config.category_column.as_str(),
            ],
        ),
        (
            config.ledger_sheet.as_str(),
            vec![config.debtor_column.as_str(), config.advance_column.as_str()],
        ),
        (
            config.exclusion_sheet.as_str(),
            vec![config.exclusion_column.as_str()],
        ),
    ]
}

/// Checks that every required sheet and column exists before anything is
/// transformed. All problems are collected and reported together.
pub fn validate(workbook: &Workbook, config: &PipelineConfig) -> Result<()> {
    let mut violation = SchemaViolation::default();

    for (sheet_name, columns) in required_layout(config) {
        let Some(sheet) = workbook.sheet(sheet_name) else {
            violation.missing_sheets.push(sheet_name.to_string());
            continue;
        };

        for column in columns {
            if !sheet.has_column(column) {
                violation.missing_columns.push(MissingColumn {
                    sheet: sheet_name.to_string(),
                    column: column.to_string(),
                });
            }
        }
    }

    if violation.is_empty() {
        Ok(())
    } else {
        Err(ReclassificationError::SchemaValidation(violation))
    }
}
