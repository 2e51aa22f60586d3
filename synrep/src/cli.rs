use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use synrep_core::synrep_metrics::TimeUnit;
use synrep_core::{Encoding, OutputMode};

fn parse_workers(input: &str) -> Result<usize, String> {
    let n: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid worker count '{input}' (expected a positive integer)"))?;
    if n == 0 {
        return Err("worker count must be at least 1".to_string());
    }
    Ok(n)
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit a single JSON summary line to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "synrep",
    author,
    version,
    about = "Synthetic-monitoring metrics report generator",
    long_about = "synrep turns collected synthetic-monitoring samples into CSV reports.\n\nA YAML configuration describes metric metadata, column layouts, sort order and evaluation thresholds. When the configuration cannot be loaded a built-in raw layout is used.",
    after_help = "Examples:\n  synrep export --input samples.json --start 20240101 --end 20240107\n  synrep export --input samples.json --start 20240101 --end 20240101 --output-mode evaluation --time-unit s\n  synrep export --input samples.json --start 20240101 --end 20240131 --encoding sjis --out-dir reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a CSV report from a collected dataset
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Collected dataset (JSON)
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// First day of the report, YYYYMMDD (JST)
    #[arg(long)]
    pub start: String,

    /// Last day of the report, YYYYMMDD (JST)
    #[arg(long)]
    pub end: String,

    /// Report configuration (YAML)
    #[arg(long, default_value = "config/metrics.yaml", env = "SYNREP_CONFIG")]
    pub config: PathBuf,

    /// CSV encoding: utf8-bom or sjis (defaults to the configured encoding)
    #[arg(long)]
    pub encoding: Option<Encoding>,

    /// Unit for time metrics: ms or s (defaults to the configured unit)
    #[arg(long)]
    pub time_unit: Option<TimeUnit>,

    /// raw or evaluation
    #[arg(long, default_value_t = OutputMode::Raw)]
    pub output_mode: OutputMode,

    /// Directory the CSV file is written to (created if missing)
    #[arg(long, default_value = "output")]
    pub out_dir: PathBuf,

    /// Threads used to build rows
    #[arg(long, default_value = "1", value_parser = parse_workers)]
    pub workers: usize,

    /// Summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Log progress at info level (RUST_LOG overrides)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_workers_rejects_zero_and_garbage() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn cli_parses_export_with_overrides() {
        let parsed = Cli::try_parse_from([
            "synrep",
            "export",
            "--input",
            "samples.json",
            "--start",
            "20240101",
            "--end",
            "20240107",
            "--encoding",
            "sjis",
            "--time-unit",
            "s",
            "--output-mode",
            "evaluation",
            "--workers",
            "3",
            "--output",
            "json",
        ]);

        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        let Command::Export(args) = cli.command;
        assert_eq!(args.input, PathBuf::from("samples.json"));
        assert_eq!(args.start, "20240101");
        assert_eq!(args.end, "20240107");
        assert_eq!(args.encoding, Some(Encoding::ShiftJis));
        assert_eq!(args.time_unit, Some(TimeUnit::S));
        assert_eq!(args.output_mode, OutputMode::Evaluation);
        assert_eq!(args.workers, 3);
        assert!(matches!(args.output, OutputFormat::Json));
        assert_eq!(args.out_dir, PathBuf::from("output"));
        assert!(!args.verbose);
    }

    #[test]
    fn cli_rejects_unknown_output_mode() {
        let parsed = Cli::try_parse_from([
            "synrep",
            "export",
            "--input",
            "x.json",
            "--start",
            "20240101",
            "--end",
            "20240101",
            "--output-mode",
            "pivot",
        ]);
        assert!(parsed.is_err());
    }
}
