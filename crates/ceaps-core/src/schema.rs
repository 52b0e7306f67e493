//! Column schema for the CEAPS expense files.
//!
//! Every expected column is declared once, with its semantic type and
//! missing-value policy. The loader uses the table to locate columns in a
//! header, the normalizer to apply fills, and the writer to emit headers in
//! canonical order.

// ── Column names ──────────────────────────────────────────────────────────────

pub const COL_ANO: &str = "ANO";
pub const COL_MES: &str = "MES";
pub const COL_SENADOR: &str = "SENADOR";
pub const COL_TIPO_DESPESA: &str = "TIPO_DESPESA";
pub const COL_CNPJ_CPF: &str = "CNPJ_CPF";
pub const COL_FORNECEDOR: &str = "FORNECEDOR";
pub const COL_DOCUMENTO: &str = "DOCUMENTO";
pub const COL_DATA: &str = "DATA";
pub const COL_DETALHAMENTO: &str = "DETALHAMENTO";
pub const COL_VALOR_REEMBOLSADO: &str = "VALOR_REEMBOLSADO";
pub const COL_COD_DOCUMENTO: &str = "COD_DOCUMENTO";

// ── Sentinels ─────────────────────────────────────────────────────────────────

/// Placeholder for missing payee-identifier fields.
pub const NOT_IDENTIFIED: &str = "Não Identificado";

/// Placeholder for a missing free-text description.
pub const NO_DETAIL: &str = "Sem detalhamento";

// ── Field schema ──────────────────────────────────────────────────────────────

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric year (`ANO`).
    Year,
    /// Numeric month (`MES`).
    Month,
    /// Free text, kept as a string.
    Text,
    /// Expense date, strict `dd/mm/yyyy`.
    Date,
    /// Locale-formatted monetary amount (decimal comma).
    Money,
}

/// Policy applied when a value is missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Leave the value missing / empty.
    Keep,
    /// Substitute [`NOT_IDENTIFIED`].
    NotIdentified,
    /// Substitute [`NO_DETAIL`].
    NoDetail,
}

impl FillPolicy {
    /// The sentinel string for this policy, if any.
    pub fn sentinel(self) -> Option<&'static str> {
        match self {
            FillPolicy::Keep => None,
            FillPolicy::NotIdentified => Some(NOT_IDENTIFIED),
            FillPolicy::NoDetail => Some(NO_DETAIL),
        }
    }
}

/// One column of the CEAPS layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub column: &'static str,
    pub kind: FieldKind,
    pub fill: FillPolicy,
}

/// The full CEAPS column schema, in canonical (source) order.
pub const EXPENSE_SCHEMA: &[FieldSpec] = &[
    FieldSpec { column: COL_ANO, kind: FieldKind::Year, fill: FillPolicy::Keep },
    FieldSpec { column: COL_MES, kind: FieldKind::Month, fill: FillPolicy::Keep },
    FieldSpec { column: COL_SENADOR, kind: FieldKind::Text, fill: FillPolicy::Keep },
    FieldSpec { column: COL_TIPO_DESPESA, kind: FieldKind::Text, fill: FillPolicy::Keep },
    FieldSpec { column: COL_CNPJ_CPF, kind: FieldKind::Text, fill: FillPolicy::NotIdentified },
    FieldSpec { column: COL_FORNECEDOR, kind: FieldKind::Text, fill: FillPolicy::NotIdentified },
    FieldSpec { column: COL_DOCUMENTO, kind: FieldKind::Text, fill: FillPolicy::NotIdentified },
    FieldSpec { column: COL_DATA, kind: FieldKind::Date, fill: FillPolicy::Keep },
    FieldSpec { column: COL_DETALHAMENTO, kind: FieldKind::Text, fill: FillPolicy::NoDetail },
    FieldSpec { column: COL_VALOR_REEMBOLSADO, kind: FieldKind::Money, fill: FillPolicy::Keep },
    FieldSpec { column: COL_COD_DOCUMENTO, kind: FieldKind::Text, fill: FillPolicy::Keep },
];

/// Look up the spec for a column name (exact, case-sensitive match).
pub fn field_spec(column: &str) -> Option<&'static FieldSpec> {
    EXPENSE_SCHEMA.iter().find(|f| f.column == column)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
