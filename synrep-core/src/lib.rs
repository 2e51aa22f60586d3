mod config;
mod date_range;
mod error;
mod format;
mod outputs;
mod pipeline;
mod rows;
mod sort;
mod thresholds;

pub use config::{
    Defaults, ExcelLayout, ExcelOrderRule, ExcelSettings, MonitorDefaults, OutputColumns,
    OutputDefaults, OutputMode, ReportConfig, RowMode, SortSettings, UNRANKED,
    default_evaluation_columns, default_raw_columns,
};
pub use date_range::DateRange;
pub use error::{Error, Result, Warning, WarningKind};
pub use format::{Cell, ColumnSchema, ColumnSpec, RowFields, Table, project};
pub use outputs::{Encoding, encode_csv, output_filename, to_csv_string, write_report};
pub use pipeline::{Pipeline, Report, RunOptions};
pub use rows::{EvaluationRow, MonitorInfo, RawRow, ReportRow, RowBuilder, SampleSeries};
pub use sort::{SortKey, Sorter, renumber};
pub use synrep_metrics;
pub use thresholds::{
    CriterionOutcome, DualCriteria, DualCriterion, EvaluationCriteria, EvaluationOutcome,
    ThresholdEvaluator, ThresholdTable,
};
