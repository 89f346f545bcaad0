use std::fmt;
use thiserror::Error;

/// A column that a sheet is required to carry but does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumn {
    pub sheet: String,
    pub column: String,
}

/// Everything the schema validator found missing in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaViolation {
    pub missing_sheets: Vec<String>,
    pub missing_columns: Vec<MissingColumn>,
}

impl SchemaViolation {
    pub fn is_empty(&self) -> bool {
        self.missing_sheets.is_empty() && self.missing_columns.is_empty()
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_sheets.is_empty() {
            parts.push(format!("missing sheets [{}]", self.missing_sheets.join(", ")));
        }
        if !self.missing_columns.is_empty() {
            let columns: Vec<String> = self
                .missing_columns
                .iter()
                .map(|m| format!("{}.{}", m.sheet, m.column))
                .collect();
            parts.push(format!("missing columns [{}]", columns.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum ReclassificationError {
    #[error("Schema validation failed: {0}")]
    SchemaValidation(SchemaViolation),

    #[error("Arrears report requires columns [{}] on the ledger", missing_columns.join(", "))]
    ReportValidation { missing_columns: Vec<String> },

    #[error("Invalid cutoff date '{input}': expected format {expected}")]
    DateFormat { input: String, expected: String },

    #[error("Invalid amount '{value}' for debtor '{debtor}' in column '{column}'")]
    InvalidAmount {
        debtor: String,
        column: String,
        value: String,
    },

    #[error("Amount {value} for debtor '{debtor}' in column '{column}' is out of range")]
    AmountOutOfRange {
        debtor: String,
        column: String,
        value: String,
    },

    #[error("Chart of accounts lists account code '{0}' more than once")]
    DuplicateAccountCode(String),

    #[error("Malformed table: {0}")]
    InvalidTable(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReclassificationError>;
