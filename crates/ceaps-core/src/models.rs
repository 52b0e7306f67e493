use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format of the `DATA` column in the raw CEAPS files.
pub const RAW_DATE_FORMAT: &str = "%d/%m/%Y";

// ── RawRecord ─────────────────────────────────────────────────────────────────

/// One row of a delimited CEAPS file, untyped.
///
/// `None` means the column was absent from the row or the file; an empty
/// string means the cell was present but blank. Both count as missing for
/// sentinel filling, but the distinction is preserved until normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawRecord {
    pub ano: Option<String>,
    pub mes: Option<String>,
    pub senador: Option<String>,
    pub tipo_despesa: Option<String>,
    pub cnpj_cpf: Option<String>,
    pub fornecedor: Option<String>,
    pub documento: Option<String>,
    pub data: Option<String>,
    pub detalhamento: Option<String>,
    pub valor_reembolsado: Option<String>,
    pub cod_documento: Option<String>,
}

// ── ExpenseRecord ─────────────────────────────────────────────────────────────

/// A normalized CEAPS expense row.
///
/// Numeric and date fields are `None` when the raw value failed coercion;
/// text fields carry the schema sentinel when the raw value was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Reporting year (`ANO`), absent when non-numeric.
    pub year: Option<i32>,
    /// Reporting month (`MES`), absent when non-numeric.
    pub month: Option<u32>,
    /// Senator name (`SENADOR`).
    pub senator: String,
    /// Expense category (`TIPO_DESPESA`).
    pub expense_type: String,
    /// Payee tax id (`CNPJ_CPF`), sentinel-filled.
    pub payee_tax_id: String,
    /// Supplier name (`FORNECEDOR`), sentinel-filled.
    pub supplier: String,
    /// Document identifier (`DOCUMENTO`), sentinel-filled.
    pub document: String,
    /// Expense date (`DATA`), absent unless the raw text matched the strict
    /// `dd/mm/yyyy` pattern and parsed as a real calendar date.
    pub date: Option<NaiveDate>,
    /// Free-text description (`DETALHAMENTO`), sentinel-filled.
    pub details: String,
    /// Reimbursed amount (`VALOR_REEMBOLSADO`) in canonical decimal form.
    pub amount: Option<f64>,
    /// Document code (`COD_DOCUMENTO`).
    pub document_code: String,
}

impl ExpenseRecord {
    /// Render the record back to raw text in canonical form.
    ///
    /// This is the shape the CSV writer emits; feeding it back through the
    /// normalizer reproduces the record unchanged.
    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            ano: Some(self.year.map(|y| y.to_string()).unwrap_or_default()),
            mes: Some(self.month.map(|m| m.to_string()).unwrap_or_default()),
            senador: Some(self.senator.clone()),
            tipo_despesa: Some(self.expense_type.clone()),
            cnpj_cpf: Some(self.payee_tax_id.clone()),
            fornecedor: Some(self.supplier.clone()),
            documento: Some(self.document.clone()),
            data: Some(
                self.date
                    .map(|d| d.format(RAW_DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            detalhamento: Some(self.details.clone()),
            valor_reembolsado: Some(
                self.amount.map(|v| v.to_string()).unwrap_or_default(),
            ),
            cod_documento: Some(self.document_code.clone()),
        }
    }
}

// ── DailyTotal ────────────────────────────────────────────────────────────────

/// Aggregate of all expenses on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    /// The calendar date (group key, unique within a run).
    pub date: NaiveDate,
    /// Sum of the resolved amounts on this date.
    pub total_amount: f64,
    /// Number of records that contributed an amount.
    pub entry_count: u32,
}

// ── Forecasting collaborator boundary ─────────────────────────────────────────

/// One observation handed to the forecasting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Observation date (the collaborator's `ds` column).
    pub ds: NaiveDate,
    /// Observed value (the collaborator's `y` column).
    pub y: f64,
}

/// The two-column date/value series consumed by the forecasting library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    /// Observations ordered ascending by date.
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// The value column as a plain vector, in date order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

impl From<&[DailyTotal]> for ForecastSeries {
    fn from(days: &[DailyTotal]) -> Self {
        ForecastSeries {
            points: days
                .iter()
                .map(|d| ForecastPoint {
                    ds: d.date,
                    y: d.total_amount,
                })
                .collect(),
        }
    }
}

/// A fitted model plus its metrics table, both opaque to the pipeline.
#[derive(Debug, Clone)]
pub struct ForecastFit<M> {
    /// Handle to the fitted model.
    pub model: M,
    /// Training metrics, shape defined by the collaborator.
    pub metrics: serde_json::Value,
}

/// The external forecasting library, seen from the pipeline.
///
/// The pipeline only promises a clean two-column series; everything past
/// this trait (architecture, persistence, plotting) belongs to the
/// implementor.
pub trait Forecaster {
    type Model;

    fn fit(&mut self, series: &ForecastSeries) -> anyhow::Result<ForecastFit<Self::Model>>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
