mod bootstrap;

use ceaps_core::settings::{EncodingChoice, PipelineConfig, Settings};
use ceaps_data::pipeline::{self, PipelineReport};

fn main() {
    let (settings, matches) = Settings::parse_with_matches();

    if let Err(e) = bootstrap::setup_logging(&settings.log_level) {
        eprintln!("Failed to initialise logging: {e}");
    }

    tracing::info!("CEAPS pipeline v{} starting", env!("CARGO_PKG_VERSION"));

    let result = settings
        .into_config(&matches)
        .and_then(|config| run(&config));

    // The binary alone decides process exit behaviour; the library crates
    // only return typed errors.
    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}

fn run(config: &PipelineConfig) -> ceaps_core::Result<PipelineReport> {
    tracing::info!(
        "Stage: {:?}, input: {}, output: {}",
        config.stage,
        config.input_path.display(),
        config.output_path.display()
    );
    match &config.encoding {
        EncodingChoice::Auto => tracing::info!("Encoding: auto"),
        EncodingChoice::Label(label) => tracing::info!("Encoding: {label}"),
    }
    tracing::info!("Separator: {:?}", config.separator as char);

    let report = pipeline::run(config)?;

    tracing::info!(
        "Done: {} files, {} rows loaded, {} duplicates removed, {} rows normalized, {} days aggregated",
        report.files_read,
        report.rows_loaded,
        report.duplicate_rows,
        report.rows_normalized,
        report.days_aggregated
    );
    if let Some(outcome) = report.stationarity {
        tracing::info!("Stationarity outcome: {:?}", outcome);
    }

    Ok(report)
}
