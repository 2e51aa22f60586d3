use std::fmt::Write as _;
use std::io::Write as _;

use super::OutputFormatter;
use crate::run::ExportSummary;

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_summary(&self, summary: &ExportSummary) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(render(summary).as_bytes())?;
        Ok(())
    }
}

pub(crate) fn render(summary: &ExportSummary) -> String {
    let mut out = String::new();

    writeln!(&mut out, "report: {}", summary.path.display()).ok();
    writeln!(
        &mut out,
        "  range: {} ({} .. {})",
        summary.range.file_label(),
        summary.utc_range.0,
        summary.utc_range.1
    )
    .ok();
    writeln!(&mut out, "  mode: {}", summary.mode).ok();
    writeln!(&mut out, "  rows: {}", summary.rows).ok();
    writeln!(
        &mut out,
        "  encoding: {}  time_unit: {}",
        summary.encoding, summary.time_unit
    )
    .ok();

    if summary.warnings.is_empty() {
        return out;
    }

    writeln!(&mut out, "warnings: {}", summary.warnings.len()).ok();
    for w in &summary.warnings {
        writeln!(&mut out, "  {w}").ok();
    }
    out
}
