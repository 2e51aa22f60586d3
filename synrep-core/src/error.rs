use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] synrep_metrics::CatalogError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid date `{0}` (expected YYYYMMDD)")]
    InvalidDate(String),

    #[error("start date `{start}` is after end date `{end}`")]
    InvalidDateRange { start: String, end: String },

    #[error("no report rows were produced")]
    EmptyResult,

    #[error("cannot encode {ch:?} (row {row}) as {encoding}")]
    Unencodable {
        ch: char,
        row: usize,
        encoding: &'static str,
    },

    #[error("invalid output path: `{0}`")]
    InvalidOutputPath(String),

    #[error("report worker panicked")]
    WorkerPanicked,
}

/// Category of a non-fatal condition collected during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum WarningKind {
    ConfigMissing,
    EmptyInput,
    ThresholdMissing,
    MappingMissing,
    ComputationFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(kind = %kind, "{message}");
        Self { kind, message }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
