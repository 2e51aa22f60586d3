#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// The dataset produced no report rows.
    EmptyResult = 20,

    /// Invalid CLI options or input (bad flags, malformed dates, unreadable dataset).
    InvalidInput = 30,

    /// Internal/runtime error (encoding failures, IO errors while writing the report).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
