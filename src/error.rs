use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures around the checker: reading and decoding inputs, configuration,
/// option parsing. The checks themselves never fail; they report diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode module dump ({origin}): {source}")]
    Decode {
        origin: String,
        source: crate::path_de::PathError,
    },

    #[error("invalid configuration ({origin}): {message}")]
    Config { origin: String, message: String },

    #[error("JSON pointer {pointer} selects nothing in {origin}")]
    Pointer { pointer: String, origin: String },

    #[error("failed to apply jq expression to {origin}: {message}")]
    Jq { origin: String, message: String },

    #[error("invalid glob pattern: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("failed to expand glob: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("glob pattern matched no files: {0}")]
    NoMatches(String),

    #[error("invalid class selection pattern: {0}")]
    Select(#[from] regex::Error),
}
