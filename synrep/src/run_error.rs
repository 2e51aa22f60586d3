use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    EmptyResult(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::EmptyResult(_) => ExitCode::EmptyResult,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::EmptyResult(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<synrep_core::Error> for RunError {
    fn from(err: synrep_core::Error) -> Self {
        use synrep_core::Error as E;
        match err {
            E::InvalidDate(_)
            | E::InvalidDateRange { .. }
            | E::InvalidConfig(_)
            | E::Catalog(_) => Self::InvalidInput(err.into()),
            E::EmptyResult => Self::EmptyResult(err.into()),
            E::Io(_)
            | E::Unencodable { .. }
            | E::InvalidOutputPath(_)
            | E::WorkerPanicked => Self::RuntimeError(err.into()),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
