use thiserror::Error;

/// Errors that can occur while loading tables or building the graph.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level CSV error (non-UTF8 data, unreadable record).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row does not match the table's fixed column schema.
    #[error("parse error in {table} at line {line}: expected {expected} fields, got {got}")]
    Parse {
        /// Which input table the bad row came from.
        table: &'static str,
        /// 1-based line number including the header line.
        line: u64,
        /// Expected field count.
        expected: usize,
        /// Observed field count.
        got: usize,
    },

    /// Invalid configuration detected before graph assembly.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for polyrel-core.
pub type Result<T> = std::result::Result<T, Error>;
