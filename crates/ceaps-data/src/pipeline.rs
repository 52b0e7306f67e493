//! End-to-end pipeline runs: load → normalize → aggregate → stabilize →
//! export, driven by one [`PipelineConfig`] value.

use std::path::Path;

use tracing::info;

use ceaps_core::error::Result;
use ceaps_core::models::{DailyTotal, ExpenseRecord};
use ceaps_core::settings::{PipelineConfig, Stage, DERIVED_SEPARATOR};

use crate::aggregator::{aggregate_daily, to_forecast_series};
use crate::loader::{find_csv_files, load_directory, load_file};
use crate::normalizer::normalize_with_stats;
use crate::stationarity::{stabilize, StabilizeOutcome};
use crate::writer::{write_daily_series, write_records};

// ── Public types ──────────────────────────────────────────────────────────────

/// Row and file counts observed during one pipeline run.
///
/// The structured replacement for progress prints: the caller decides what
/// to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub files_read: usize,
    pub rows_loaded: usize,
    pub duplicate_rows: usize,
    pub year_mismatch_rows: usize,
    pub rows_normalized: usize,
    pub days_aggregated: usize,
    /// Stationarity outcome, `None` when the check was skipped or there was
    /// nothing to test.
    pub stationarity: Option<StabilizeOutcome>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Run the configured stage of the pipeline.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    match config.stage {
        Stage::Wrangle => run_wrangle(config),
        Stage::Prepare => run_prepare(config),
        Stage::Full => run_full(config),
    }
}

// ── Stage drivers ─────────────────────────────────────────────────────────────

/// Raw directory → normalized export.
fn run_wrangle(config: &PipelineConfig) -> Result<PipelineReport> {
    let (records, mut report) = load_and_normalize_directory(config)?;

    info!(
        "Saving {} normalized rows to {}",
        records.len(),
        config.output_path.display()
    );
    write_records(&config.output_path, &records, DERIVED_SEPARATOR as u8)?;
    Ok(report)
}

/// Derived file → daily series export.
fn run_prepare(config: &PipelineConfig) -> Result<PipelineReport> {
    info!("Reading data from file {}", config.input_path.display());
    let raw = load_file(&config.input_path, &config.encoding, config.separator)?;
    let mut report = PipelineReport {
        files_read: 1,
        rows_loaded: raw.len(),
        ..Default::default()
    };

    let (records, stats) = normalize_with_stats(raw, &config.cleaning);
    report.duplicate_rows = stats.duplicate_rows;
    report.year_mismatch_rows = stats.year_mismatch_rows;
    report.rows_normalized = stats.output_rows;

    prepare_series(&records, config, &mut report)?;
    Ok(report)
}

/// Raw directory → interim export → daily series export, in one process.
fn run_full(config: &PipelineConfig) -> Result<PipelineReport> {
    let (records, mut report) = load_and_normalize_directory(config)?;

    info!(
        "Saving {} normalized rows to {}",
        records.len(),
        config.interim_path.display()
    );
    write_records(&config.interim_path, &records, DERIVED_SEPARATOR as u8)?;

    prepare_series(&records, config, &mut report)?;
    Ok(report)
}

// ── Shared steps ──────────────────────────────────────────────────────────────

/// Load every CSV in the input directory and normalize the rows.
fn load_and_normalize_directory(
    config: &PipelineConfig,
) -> Result<(Vec<ExpenseRecord>, PipelineReport)> {
    info!(
        "Reading data from directory {}",
        config.input_path.display()
    );
    let files_read = count_csv_files(&config.input_path);
    let raw = load_directory(&config.input_path, &config.encoding, config.separator)?;

    let mut report = PipelineReport {
        files_read,
        rows_loaded: raw.len(),
        ..Default::default()
    };

    let (records, stats) = normalize_with_stats(raw, &config.cleaning);
    report.duplicate_rows = stats.duplicate_rows;
    report.year_mismatch_rows = stats.year_mismatch_rows;
    report.rows_normalized = stats.output_rows;

    Ok((records, report))
}

/// Aggregate to a daily series, optionally stabilize, and export.
fn prepare_series(
    records: &[ExpenseRecord],
    config: &PipelineConfig,
    report: &mut PipelineReport,
) -> Result<()> {
    let days: Vec<DailyTotal> = aggregate_daily(records);
    report.days_aggregated = days.len();
    info!("Aggregated {} days", days.len());

    let stabilized = if config.check_stationarity && !days.is_empty() {
        let series = to_forecast_series(&days);
        Some(stabilize(&series.values()))
    } else {
        None
    };
    report.stationarity = stabilized.as_ref().map(|s| s.outcome);

    // The transformed column is only worth exporting when a transform was
    // actually applied.
    let transformed = stabilized
        .as_ref()
        .filter(|s| s.outcome != StabilizeOutcome::AlreadyStationary)
        .map(|s| s.values.as_slice());

    info!("Saving daily series to {}", config.output_path.display());
    write_daily_series(
        &config.output_path,
        &days,
        transformed,
        DERIVED_SEPARATOR as u8,
    )?;
    Ok(())
}

fn count_csv_files(path: &Path) -> usize {
    if path.is_dir() {
        find_csv_files(path).len()
    } else {
        1
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ceaps_core::settings::{CleaningOptions, EncodingChoice};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const BANNER: &str = "ULTIMA ATUALIZACAO 01/02/2022";
    const HEADER: &str =
        "ANO;MES;SENADOR;TIPO_DESPESA;CNPJ_CPF;FORNECEDOR;DOCUMENTO;DATA;DETALHAMENTO;VALOR_REEMBOLSADO;COD_DOCUMENTO";

    fn write_raw_csv(dir: &Path, name: &str, rows: &[&str]) {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{BANNER}").unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    fn config(raw_dir: &Path, out_dir: &Path, stage: Stage) -> PipelineConfig {
        PipelineConfig {
            stage,
            input_path: raw_dir.to_path_buf(),
            interim_path: out_dir.join("interim.csv"),
            output_path: out_dir.join("out.csv"),
            encoding: EncodingChoice::Auto,
            separator: b';',
            cleaning: CleaningOptions::default(),
            check_stationarity: false,
        }
    }

    fn row(senator: &str, date: &str, amount: &str) -> String {
        format!("2021;1;{senator};Passagens;;Fornecedor SA;NF-1;{date};Viagem;{amount};1")
    }

    // ── full stage ────────────────────────────────────────────────────────────

    #[test]
    fn test_full_stage_writes_interim_and_daily_output() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_raw_csv(
            raw.path(),
            "2021.csv",
            &[
                &row("AAA", "01/01/2021", "10,00"),
                &row("BBB", "01/01/2021", "20,00"),
                &row("AAA", "02/01/2021", "5,00"),
                &row("AAA", "01/01/2021", "10,00"), // duplicate
            ],
        );

        let cfg = config(raw.path(), out.path(), Stage::Full);
        let report = run(&cfg).unwrap();

        assert_eq!(report.files_read, 1);
        assert_eq!(report.rows_loaded, 4);
        assert_eq!(report.duplicate_rows, 1);
        assert_eq!(report.rows_normalized, 3);
        assert_eq!(report.days_aggregated, 2);
        assert!(report.stationarity.is_none());

        assert!(cfg.interim_path.exists());
        let daily = std::fs::read_to_string(&cfg.output_path).unwrap();
        let lines: Vec<&str> = daily.lines().collect();
        assert_eq!(lines[1], "DATA,VALOR_REEMBOLSADO,COUNT");
        assert_eq!(lines[2], "2021-01-01,30,2");
        assert_eq!(lines[3], "2021-01-02,5,1");
    }

    #[test]
    fn test_full_stage_missing_directory_fails_fast() {
        let out = TempDir::new().unwrap();
        let cfg = config(
            &PathBuf::from("/tmp/ceaps-no-such-dir"),
            out.path(),
            Stage::Full,
        );
        assert!(run(&cfg).is_err());
        assert!(!cfg.output_path.exists());
    }

    // ── wrangle stage ─────────────────────────────────────────────────────────

    #[test]
    fn test_wrangle_stage_writes_reloadable_normalized_export() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_raw_csv(
            raw.path(),
            "2021.csv",
            &[&row("AAA", "01/01/2021", "1.234,56")],
        );

        let cfg = config(raw.path(), out.path(), Stage::Wrangle);
        let report = run(&cfg).unwrap();
        assert_eq!(report.rows_normalized, 1);
        assert_eq!(report.days_aggregated, 0);

        // The export is itself a valid prepare-stage input.
        let reloaded = load_file(&cfg.output_path, &EncodingChoice::Auto, b',').unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].valor_reembolsado.as_deref(), Some("1234.56"));
    }

    // ── prepare stage ─────────────────────────────────────────────────────────

    #[test]
    fn test_wrangle_then_prepare_matches_full() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_raw_csv(
            raw.path(),
            "2021.csv",
            &[
                &row("AAA", "01/01/2021", "10,00"),
                &row("BBB", "02/01/2021", "7,50"),
            ],
        );

        // Stage 1: wrangle to a normalized export.
        let wrangle_cfg = config(raw.path(), out.path(), Stage::Wrangle);
        run(&wrangle_cfg).unwrap();

        // Stage 2: prepare from that export.
        let mut prepare_cfg = config(raw.path(), out.path(), Stage::Prepare);
        prepare_cfg.input_path = wrangle_cfg.output_path.clone();
        prepare_cfg.separator = b',';
        prepare_cfg.output_path = out.path().join("prepared.csv");
        let report = run(&prepare_cfg).unwrap();

        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.days_aggregated, 2);
        let daily = std::fs::read_to_string(&prepare_cfg.output_path).unwrap();
        assert!(daily.lines().any(|l| l == "2021-01-01,10,1"));
        assert!(daily.lines().any(|l| l == "2021-01-02,7.5,1"));
    }

    #[test]
    fn test_prepare_stage_missing_file_fails_fast() {
        let out = TempDir::new().unwrap();
        let mut cfg = config(
            &PathBuf::from("/tmp/ceaps-no-such-file.csv"),
            out.path(),
            Stage::Prepare,
        );
        cfg.separator = b',';
        assert!(run(&cfg).is_err());
    }

    // ── stationarity wiring ───────────────────────────────────────────────────

    #[test]
    fn test_stationarity_outcome_reported_when_enabled() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        // 40 days of slowly varying amounts: far too short and smooth for
        // the test to reject a unit root, so a transform will be attempted.
        let rows: Vec<String> = (0..40)
            .map(|i| {
                let day = i % 28 + 1;
                let month = i / 28 + 1;
                row(
                    "AAA",
                    &format!("{day:02}/{month:02}/2021"),
                    &format!("{},00", 100 + i),
                )
            })
            .collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        write_raw_csv(raw.path(), "2021.csv", &refs);

        let mut cfg = config(raw.path(), out.path(), Stage::Full);
        cfg.check_stationarity = true;
        let report = run(&cfg).unwrap();

        assert_eq!(report.days_aggregated, 40);
        assert!(report.stationarity.is_some());
    }

    #[test]
    fn test_stationarity_skipped_for_empty_series() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        // Only an invalid date: no day survives aggregation.
        write_raw_csv(raw.path(), "2021.csv", &[&row("AAA", "31/02/2021", "10,00")]);

        let mut cfg = config(raw.path(), out.path(), Stage::Full);
        cfg.check_stationarity = true;
        let report = run(&cfg).unwrap();

        assert_eq!(report.days_aggregated, 0);
        assert!(report.stationarity.is_none());
    }
}
