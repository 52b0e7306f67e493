//! Record normalization: duplicate removal, typed coercion, sentinel fills,
//! locale-aware monetary cleaning and strict date validation.
//!
//! Per-row problems never abort the batch: a field that fails coercion
//! becomes missing and the row stays. Only the loader fails fast.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::debug;

use ceaps_core::error::{PipelineError, Result};
use ceaps_core::models::{ExpenseRecord, RawRecord, RAW_DATE_FORMAT};
use ceaps_core::schema::{self, FillPolicy};
use ceaps_core::settings::CleaningOptions;

// ── Public API ────────────────────────────────────────────────────────────────

/// Row counts observed while normalizing one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub input_rows: usize,
    pub duplicate_rows: usize,
    pub year_mismatch_rows: usize,
    pub output_rows: usize,
}

/// Normalize a raw record set according to the CEAPS column schema.
pub fn normalize(records: Vec<RawRecord>, options: &CleaningOptions) -> Vec<ExpenseRecord> {
    normalize_with_stats(records, options).0
}

/// [`normalize`], also reporting how many rows each cleaning pass removed.
pub fn normalize_with_stats(
    records: Vec<RawRecord>,
    options: &CleaningOptions,
) -> (Vec<ExpenseRecord>, NormalizeStats) {
    let mut stats = NormalizeStats {
        input_rows: records.len(),
        ..Default::default()
    };

    let records = if options.drop_duplicates {
        let unique = drop_duplicates(records);
        stats.duplicate_rows = stats.input_rows - unique.len();
        unique
    } else {
        records
    };
    debug!("Found {} duplicates", stats.duplicate_rows);

    let mut normalized: Vec<ExpenseRecord> =
        records.iter().map(normalize_record).collect();

    if options.drop_year_mismatch {
        let before = normalized.len();
        normalized.retain(|r| match (r.date, r.year) {
            (Some(date), Some(year)) => date.year() == year,
            _ => true,
        });
        stats.year_mismatch_rows = before - normalized.len();
        debug!(
            "Found {} rows where the date year disagrees with ANO",
            stats.year_mismatch_rows
        );
    }

    stats.output_rows = normalized.len();
    (normalized, stats)
}

/// Remove exact-duplicate rows, keeping the first occurrence of each.
pub fn drop_duplicates(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen: HashSet<RawRecord> = HashSet::with_capacity(records.len());
    let mut unique: Vec<RawRecord> = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.clone()) {
            unique.push(record);
        }
    }
    unique
}

/// Clean a locale-formatted monetary string into a canonical `f64`.
///
/// Currency symbols, spaces and any other non-numeric characters are
/// stripped. When a decimal comma is present, periods are treated as
/// thousands separators; the last comma becomes the decimal point.
/// A value with no digits, or with more than one decimal point left after
/// cleaning, is a [`PipelineError::NumericFormat`].
pub fn clean_monetary(raw: &str) -> Result<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return Err(PipelineError::NumericFormat(raw.to_string()));
    }

    let canonical = if let Some(pos) = kept.rfind(',') {
        // Decimal-comma form: everything before the last comma is the
        // integer part, commas and periods in it are separators.
        let integer: String = kept[..pos].chars().filter(char::is_ascii_digit).collect();
        let fraction = &kept[pos + 1..];
        format!("{integer}.{fraction}")
    } else {
        kept
    };

    canonical
        .parse::<f64>()
        .map_err(|_| PipelineError::NumericFormat(raw.to_string()))
}

/// Parse a date string that must match the strict `dd/mm/yyyy` pattern.
///
/// Values that do not match the pattern, or that match but name an
/// impossible calendar date (`31/02/2021`), yield `None`.
pub fn parse_strict_date(raw: &str) -> Option<NaiveDate> {
    let candidate = raw.trim();
    if !date_pattern().is_match(candidate) {
        return None;
    }
    NaiveDate::parse_from_str(candidate, RAW_DATE_FORMAT).ok()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(0[1-9]|[12][0-9]|3[01])/(0[1-9]|1[0-2])/[0-9]{4}$").expect("regex is valid")
    })
}

/// Coerce one raw row into an [`ExpenseRecord`].
fn normalize_record(raw: &RawRecord) -> ExpenseRecord {
    let amount = match raw.valor_reembolsado.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => match clean_monetary(value) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Dropping unparseable amount: {e}");
                None
            }
        },
    };

    ExpenseRecord {
        year: parse_integer(&raw.ano).and_then(|v| i32::try_from(v).ok()),
        month: parse_integer(&raw.mes).and_then(|v| u32::try_from(v).ok()),
        senator: fill_text(schema::COL_SENADOR, &raw.senador),
        expense_type: fill_text(schema::COL_TIPO_DESPESA, &raw.tipo_despesa),
        payee_tax_id: fill_text(schema::COL_CNPJ_CPF, &raw.cnpj_cpf),
        supplier: fill_text(schema::COL_FORNECEDOR, &raw.fornecedor),
        document: fill_text(schema::COL_DOCUMENTO, &raw.documento),
        date: raw.data.as_deref().and_then(parse_strict_date),
        details: fill_text(schema::COL_DETALHAMENTO, &raw.detalhamento),
        amount,
        document_code: fill_text(schema::COL_COD_DOCUMENTO, &raw.cod_documento),
    }
}

/// Apply the schema fill policy for `column` to a raw text value.
///
/// A present, non-blank value is kept verbatim; anything else becomes the
/// column's sentinel, or the empty string for columns without one.
fn fill_text(column: &str, value: &Option<String>) -> String {
    let policy = schema::field_spec(column)
        .map(|f| f.fill)
        .unwrap_or(FillPolicy::Keep);

    match value {
        Some(s) if !s.trim().is_empty() => s.clone(),
        _ => policy.sentinel().unwrap_or_default().to_string(),
    }
}

/// Lenient integer coercion: plain integers plus float renderings with a
/// zero fraction (`"2021.0"`), anything else is absent.
fn parse_integer(raw: &Option<String>) -> Option<i64> {
    let s = raw.as_deref()?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.is_finite() => Some(f as i64),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
