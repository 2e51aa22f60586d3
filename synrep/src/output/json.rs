use serde::Serialize;
use std::io::Write as _;

use super::OutputFormatter;
use crate::run::ExportSummary;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_summary(&self, summary: &ExportSummary) -> anyhow::Result<()> {
        let line = build_summary_line(summary);
        let mut out = std::io::stdout().lock();
        serde_json::to_writer(&mut out, &line)?;
        writeln!(out)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonWarning {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub path: String,
    pub rows: usize,
    pub mode: String,
    pub encoding: String,
    pub time_unit: String,
    pub range: String,
    pub start_utc: String,
    pub end_utc: String,
    pub warnings: Vec<JsonWarning>,
}

pub(crate) fn build_summary_line(summary: &ExportSummary) -> JsonSummaryLine {
    JsonSummaryLine {
        kind: "summary",
        path: summary.path.display().to_string(),
        rows: summary.rows,
        mode: summary.mode.to_string(),
        encoding: summary.encoding.to_string(),
        time_unit: summary.time_unit.to_string(),
        range: summary.range.file_label(),
        start_utc: summary.utc_range.0.clone(),
        end_utc: summary.utc_range.1.clone(),
        warnings: summary
            .warnings
            .iter()
            .map(|w| JsonWarning {
                kind: w.kind.to_string(),
                message: w.message.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use synrep_core::synrep_metrics::TimeUnit;
    use synrep_core::{DateRange, Encoding, RowMode, Warning, WarningKind};

    #[test]
    fn summary_line_serializes_enums_as_text() {
        let summary = ExportSummary {
            path: PathBuf::from("out.csv"),
            rows: 2,
            mode: RowMode::Raw,
            encoding: Encoding::Utf8Bom,
            time_unit: TimeUnit::Ms,
            range: DateRange::parse("20240105", "20240105").unwrap_or_else(|e| panic!("{e}")),
            utc_range: ("s".to_string(), "e".to_string()),
            warnings: vec![Warning {
                kind: WarningKind::EmptyInput,
                message: "m".to_string(),
            }],
        };

        let line = build_summary_line(&summary);
        let v = serde_json::to_value(line).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(v["kind"], "summary");
        assert_eq!(v["mode"], "raw");
        assert_eq!(v["encoding"], "utf8-bom");
        assert_eq!(v["time_unit"], "ms");
        assert_eq!(v["range"], "20240105");
        assert_eq!(v["warnings"][0]["kind"], "empty_input");
    }
}
