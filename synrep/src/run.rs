use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use synrep_core::synrep_metrics::TimeUnit;
use synrep_core::{
    DateRange, Encoding, Pipeline, RowMode, RunOptions, Warning, encode_csv, output_filename,
    write_report,
};

use crate::cli::ExportArgs;
use crate::config_yaml;
use crate::dataset;
use crate::run_error::RunError;

/// What a successful export produced.
#[derive(Debug)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub mode: RowMode,
    pub encoding: Encoding,
    pub time_unit: TimeUnit,
    pub range: DateRange,
    /// Query window in UTC, `%Y-%m-%dT%H:%M:%SZ`.
    pub utc_range: (String, String),
    pub warnings: Vec<Warning>,
}

pub async fn export(args: &ExportArgs) -> Result<ExportSummary, RunError> {
    let range = DateRange::parse(&args.start, &args.end)?;
    let utc_range = range.to_utc_iso()?;
    tracing::info!(start = %utc_range.0, end = %utc_range.1, "report window");

    let (config, config_warning) = config_yaml::load_or_builtin(&args.config).await;
    let mut warnings: Vec<Warning> = config_warning.into_iter().collect();

    let time_unit = args.time_unit.unwrap_or(config.defaults.output.time_unit);
    let encoding = args.encoding.unwrap_or(config.defaults.output.encoding);

    let series = dataset::load_dataset(&args.input)
        .await
        .map_err(RunError::InvalidInput)?;

    let opts = RunOptions {
        time_unit,
        mode: args.output_mode,
        workers: args.workers,
    };
    let pipeline = Pipeline::new(Arc::new(config));
    let report = tokio::task::spawn_blocking(move || pipeline.run(&series, &opts))
        .await
        .context("report worker failed")
        .map_err(RunError::RuntimeError)??;

    warnings.extend(report.warnings);

    let bytes = encode_csv(&report.table, encoding)?;
    let file_name = output_filename(&range, &chrono::Local::now());
    let path = write_report(&args.out_dir, &file_name, &bytes)?;

    Ok(ExportSummary {
        path,
        rows: report.table.len(),
        mode: report.mode,
        encoding,
        time_unit,
        range,
        utc_range,
        warnings,
    })
}
