use crate::table::Cell;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Header of the debtor-code column in every summary export.
pub const DEBTOR_COLUMN: &str = "codigo";

/// The homologated categories of the reclassified summary, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    #[serde(rename = "ADMINISTRACION")]
    #[schemars(description = "Monthly administration fee")]
    Administration,

    #[serde(rename = "INTERESES")]
    #[schemars(description = "Late-payment interest")]
    Interest,

    #[serde(rename = "PARQUEADEROS")]
    Parking,

    #[serde(rename = "SANCIONES")]
    #[schemars(description = "Penalties imposed by the administration")]
    Penalties,

    #[serde(rename = "EXTRAORDINARIA")]
    #[schemars(description = "Extraordinary fee approved by the assembly")]
    Extraordinary,

    #[serde(rename = "ABOGADOS")]
    #[schemars(description = "Legal collection fees")]
    LegalFees,

    #[serde(rename = "OTROS")]
    Other,

    #[serde(rename = "TOTAL A PAGAR")]
    #[schemars(description = "Total amount due")]
    TotalDue,

    #[serde(rename = "SALDO A FAVOR")]
    #[schemars(description = "Credit balance in favour of the debtor")]
    CreditBalance,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Administration,
        Category::Interest,
        Category::Parking,
        Category::Penalties,
        Category::Extraordinary,
        Category::LegalFees,
        Category::Other,
        Category::TotalDue,
        Category::CreditBalance,
    ];

    /// Column header, identical to the label used in the chart of accounts.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Administration => "ADMINISTRACION",
            Category::Interest => "INTERESES",
            Category::Parking => "PARQUEADEROS",
            Category::Penalties => "SANCIONES",
            Category::Extraordinary => "EXTRAORDINARIA",
            Category::LegalFees => "ABOGADOS",
            Category::Other => "OTROS",
            Category::TotalDue => "TOTAL A PAGAR",
            Category::CreditBalance => "SALDO A FAVOR",
        }
    }

    /// Exact, case-sensitive match against the canonical labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    fn position(self) -> usize {
        self as usize
    }
}

/// The full output header: debtor code followed by every category.
pub fn canonical_columns() -> Vec<&'static str> {
    std::iter::once(DEBTOR_COLUMN)
        .chain(Category::ALL.iter().map(|c| c.label()))
        .collect()
}

/// One cell of the long fact table produced by unpivoting the ledger. The
/// value stays a raw cell until homologation decides the account matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerFact {
    pub debtor_code: String,
    pub raw_account_code: String,
    /// Ledger column the value came from.
    pub source_column: String,
    pub value: Cell,
}

/// A fact that found its category in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomologatedFact {
    pub debtor_code: String,
    pub raw_account_code: String,
    pub category: String,
    pub amount: Decimal,
}

/// Per-category amounts for one debtor, indexed by [`Category`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAmounts([Decimal; 9]);

impl CategoryAmounts {
    /// Sums the pairs per category. `None` if a sum overflows.
    pub fn from_pairs<I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (Category, Decimal)>,
    {
        let mut amounts = Self::default();
        for (category, value) in pairs {
            amounts.checked_add(category, value)?;
        }
        Some(amounts)
    }

    /// Adds `value` to a category and returns the new total. On overflow the
    /// amounts are left unchanged and `None` is returned.
    pub fn checked_add(&mut self, category: Category, value: Decimal) -> Option<Decimal> {
        let total = self[category].checked_add(value)?;
        self[category] = total;
        Some(total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Decimal)> + '_ {
        Category::ALL.iter().map(move |c| (*c, self[*c]))
    }
}

impl Index<Category> for CategoryAmounts {
    type Output = Decimal;

    fn index(&self, category: Category) -> &Decimal {
        &self.0[category.position()]
    }
}

impl IndexMut<Category> for CategoryAmounts {
    fn index_mut(&mut self, category: Category) -> &mut Decimal {
        &mut self.0[category.position()]
    }
}

/// Aggregated, not yet rule-adjusted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub debtor_code: String,
    pub amounts: CategoryAmounts,
}

/// Final row of the reclassified summary. Field order is the export order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryRow {
    #[serde(rename = "codigo")]
    pub debtor_code: String,
    #[serde(rename = "ADMINISTRACION")]
    pub administration: i64,
    #[serde(rename = "INTERESES")]
    pub interest: i64,
    #[serde(rename = "PARQUEADEROS")]
    pub parking: i64,
    #[serde(rename = "SANCIONES")]
    pub penalties: i64,
    #[serde(rename = "EXTRAORDINARIA")]
    pub extraordinary: i64,
    #[serde(rename = "ABOGADOS")]
    pub legal_fees: i64,
    #[serde(rename = "OTROS")]
    pub other: i64,
    #[serde(rename = "TOTAL A PAGAR")]
    pub total_due: i64,
    #[serde(rename = "SALDO A FAVOR")]
    pub credit_balance: i64,
}

impl SummaryRow {
    pub fn new(debtor_code: impl Into<String>) -> Self {
        Self {
            debtor_code: debtor_code.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::Administration => self.administration,
            Category::Interest => self.interest,
            Category::Parking => self.parking,
            Category::Penalties => self.penalties,
            Category::Extraordinary => self.extraordinary,
            Category::LegalFees => self.legal_fees,
            Category::Other => self.other,
            Category::TotalDue => self.total_due,
            Category::CreditBalance => self.credit_balance,
        }
    }

    pub fn set(&mut self, category: Category, value: i64) {
        let slot = match category {
            Category::Administration => &mut self.administration,
            Category::Interest => &mut self.interest,
            Category::Parking => &mut self.parking,
            Category::Penalties => &mut self.penalties,
            Category::Extraordinary => &mut self.extraordinary,
            Category::LegalFees => &mut self.legal_fees,
            Category::Other => &mut self.other,
            Category::TotalDue => &mut self.total_due,
            Category::CreditBalance => &mut self.credit_balance,
        };
        *slot = value;
    }
}

/// The terminal artifact of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReclassifiedSummary {
    pub rows: Vec<SummaryRow>,
}

impl ReclassifiedSummary {
    pub fn new(rows: Vec<SummaryRow>) -> Self {
        Self { rows }
    }

    pub fn columns(&self) -> Vec<&'static str> {
        canonical_columns()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, debtor_code: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.debtor_code == debtor_code)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReclassifiedSummary)
    }
}
