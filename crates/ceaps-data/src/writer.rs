//! Delimited exports: normalized records, the daily series, and the
//! two-column forecast input.
//!
//! All exports are UTF-8 with a header row. The normalized and daily
//! exports start with a one-line banner so they round-trip through the
//! loader, which always discards the first line of a file. The forecast
//! export is consumed by the external collaborator and is written plain.

use std::io::Write;
use std::path::Path;

use ceaps_core::error::{PipelineError, Result};
use ceaps_core::models::{DailyTotal, ExpenseRecord, ForecastSeries};
use ceaps_core::schema::EXPENSE_SCHEMA;

/// Banner line of a normalized-record export.
pub const NORMALIZED_BANNER: &str = "DADOS NORMALIZADOS CEAPS";
/// Banner line of a daily-series export.
pub const DAILY_BANNER: &str = "SERIE DIARIA CEAPS";

// ── Public API ────────────────────────────────────────────────────────────────

/// Write normalized records as a delimited file the loader can re-ingest.
pub fn write_records(path: &Path, records: &[ExpenseRecord], separator: u8) -> Result<()> {
    let file = create_with_parents(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(separator)
        .from_writer(banner(file, NORMALIZED_BANNER, path)?);

    let header: Vec<&str> = EXPENSE_SCHEMA.iter().map(|f| f.column).collect();
    writer.write_record(&header)?;

    for record in records {
        let raw = record.to_raw();
        writer.write_record([
            raw.ano.unwrap_or_default(),
            raw.mes.unwrap_or_default(),
            raw.senador.unwrap_or_default(),
            raw.tipo_despesa.unwrap_or_default(),
            raw.cnpj_cpf.unwrap_or_default(),
            raw.fornecedor.unwrap_or_default(),
            raw.documento.unwrap_or_default(),
            raw.data.unwrap_or_default(),
            raw.detalhamento.unwrap_or_default(),
            raw.valor_reembolsado.unwrap_or_default(),
            raw.cod_documento.unwrap_or_default(),
        ])?;
    }

    writer.flush().map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Write the daily aggregates, dates in ISO form.
///
/// `stationary` is the transformed value column when a stabilizing
/// transform was applied; differencing shortens it, so leading rows get an
/// empty cell.
pub fn write_daily_series(
    path: &Path,
    days: &[DailyTotal],
    stationary: Option<&[f64]>,
    separator: u8,
) -> Result<()> {
    let file = create_with_parents(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(separator)
        .from_writer(banner(file, DAILY_BANNER, path)?);

    match stationary {
        None => {
            writer.write_record(["DATA", "VALOR_REEMBOLSADO", "COUNT"])?;
            for day in days {
                writer.write_record([
                    day.date.to_string(),
                    day.total_amount.to_string(),
                    day.entry_count.to_string(),
                ])?;
            }
        }
        Some(values) => {
            writer.write_record([
                "DATA",
                "VALOR_REEMBOLSADO",
                "COUNT",
                "VALOR_REEMBOLSADO_ESTACIONARIO",
            ])?;
            let offset = days.len().saturating_sub(values.len());
            for (i, day) in days.iter().enumerate() {
                let transformed = if i >= offset {
                    values[i - offset].to_string()
                } else {
                    String::new()
                };
                writer.write_record([
                    day.date.to_string(),
                    day.total_amount.to_string(),
                    day.entry_count.to_string(),
                    transformed,
                ])?;
            }
        }
    }

    writer.flush().map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Write the collaborator-facing two-column series (`ds,y`, no banner).
pub fn write_forecast_series(path: &Path, series: &ForecastSeries) -> Result<()> {
    let file = create_with_parents(path)?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(["ds", "y"])?;
    for point in &series.points {
        writer.write_record([point.ds.to_string(), point.y.to_string()])?;
    }

    writer.flush().map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Create `path` (and any missing parent directories) for writing.
fn create_with_parents(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| PipelineError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    std::fs::File::create(path).map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Emit the banner line, returning the file for the CSV writer.
fn banner(mut file: std::fs::File, text: &str, path: &Path) -> Result<std::fs::File> {
    writeln!(file, "{text}").map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
