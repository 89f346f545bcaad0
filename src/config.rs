use crate::error::Result;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Column names of the ledger that carry descriptive, non-financial data.
pub const DEFAULT_DROPPED_COLUMNS: [&str; 13] = [
    "agru_bloq",
    "interior",
    "apto",
    "nombre",
    "descuento",
    "promedio",
    "ult_fpago",
    "ult_vpago",
    "ult_rpago",
    "ult_fpag2",
    "ult_vpag2",
    "ult_rpag2",
    "Hoja",
];

/// Names and constants the pipeline reads its input with. `Default` matches
/// the workbook layout exported by the property-management system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    #[schemars(description = "Sheet holding the chart of accounts (PUC)")]
    pub chart_sheet: String,

    #[schemars(description = "Sheet holding the wide receivable ledger")]
    pub ledger_sheet: String,

    #[schemars(description = "Sheet listing debtor codes to remove from the output")]
    pub exclusion_sheet: String,

    #[schemars(description = "Chart column with the raw general-ledger account code")]
    pub account_code_column: String,

    #[schemars(description = "Chart column with the homologated category name")]
    pub category_column: String,

    #[schemars(description = "Ledger column identifying the debtor")]
    pub debtor_column: String,

    #[schemars(description = "Ledger column with advance payments, stored as positive amounts")]
    pub advance_column: String,

    #[schemars(description = "Exclusion sheet column with the debtor codes to remove")]
    pub exclusion_column: String,

    #[schemars(description = "Literal prefix of ledger account columns, stripped to recover the raw account code")]
    pub account_prefix: String,

    #[schemars(description = "Descriptive ledger columns removed before unpivoting; absent names are ignored")]
    pub dropped_columns: Vec<String>,

    #[schemars(description = "Sheet name used when the summary is handed to a spreadsheet writer")]
    pub summary_sheet_name: String,

    #[schemars(description = "File name used for the comma-separated summary export")]
    pub summary_csv_name: String,

    pub arrears: ArrearsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chart_sheet: "PUC".to_string(),
            ledger_sheet: "CARTERA".to_string(),
            exclusion_sheet: "Quitar".to_string(),
            account_code_column: "codigo_cuenta".to_string(),
            category_column: "Homologo APP".to_string(),
            debtor_column: "codigo".to_string(),
            advance_column: "anticipos".to_string(),
            exclusion_column: "codigo_retirar".to_string(),
            account_prefix: "c_".to_string(),
            dropped_columns: DEFAULT_DROPPED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            summary_sheet_name: "Cartera App".to_string(),
            summary_csv_name: "cartera_app.csv".to_string(),
            arrears: ArrearsConfig::default(),
        }
    }
}

/// Settings of the per-tower arrears report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ArrearsConfig {
    #[schemars(description = "Ledger column with the debtor's total balance")]
    pub total_column: String,

    #[schemars(description = "Ledger column with the tower (interior) identifier")]
    pub tower_column: String,

    #[schemars(
        with = "String",
        description = "Only debtors whose total is strictly greater than this amount are reported"
    )]
    pub threshold: Decimal,

    #[schemars(description = "chrono format of the user-supplied cutoff date")]
    pub date_format: String,

    #[schemars(description = "Base name of the generated report document")]
    pub document_name: String,
}

impl Default for ArrearsConfig {
    fn default() -> Self {
        Self {
            total_column: "total".to_string(),
            tower_column: "interior".to_string(),
            threshold: Decimal::ONE_THOUSAND,
            date_format: "%d/%m/%Y".to_string(),
            document_name: "Cartera_por_Torre".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PipelineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_match_workbook_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.chart_sheet, "PUC");
        assert_eq!(config.ledger_sheet, "CARTERA");
        assert_eq!(config.exclusion_sheet, "Quitar");
        assert_eq!(config.dropped_columns.len(), 13);
        assert!(config.dropped_columns.contains(&"interior".to_string()));
        assert_eq!(config.arrears.threshold, dec!(1000));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "ledger_sheet": "LEDGER", "arrears": { "threshold": "2500" } }"#,
        )
        .unwrap();

        assert_eq!(config.ledger_sheet, "LEDGER");
        assert_eq!(config.chart_sheet, "PUC");
        assert_eq!(config.arrears.threshold, dec!(2500));
        assert_eq!(config.arrears.date_format, "%d/%m/%Y");
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = PipelineConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("ledger_sheet"));
        assert!(schema_json.contains("dropped_columns"));
        assert!(schema_json.contains("threshold"));
    }
}
