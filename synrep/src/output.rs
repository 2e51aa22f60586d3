use crate::cli::OutputFormat;
use crate::run::ExportSummary;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_summary(&self, summary: &ExportSummary) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
