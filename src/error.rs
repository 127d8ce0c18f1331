use thiserror::Error;

/// Errors that abort a relay run.
///
/// Every variant is fatal: the first one raised ends the pipeline and is
/// reported once by the top-level handler.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required setting (credential, path) was empty or absent.
    #[error("required setting {name} is not set or empty")]
    MissingConfig { name: &'static str },

    /// Connection, DNS or TLS failure while talking to an HTTP endpoint.
    #[error("network error during {stage}: {source}")]
    Network {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// An HTTP endpoint answered with a non-success status.
    #[error("{stage} returned HTTP {status}")]
    HttpStatus { stage: &'static str, status: u16 },

    /// The response body did not have the expected shape.
    #[error("unexpected {stage} response: {detail}")]
    UnexpectedResponse {
        stage: &'static str,
        detail: String,
        body: String,
    },

    /// The export download was not a zip archive.
    #[error("downloaded export has content type {found:?}, expected {expected}")]
    UnexpectedContentType {
        expected: &'static str,
        found: Option<String>,
    },

    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A single archive member could not be read.
    #[error("failed to read archive member {name}: {source}")]
    ArchiveMember {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// SSH/SFTP connection or remote write failure.
    #[error("{context}: {source}")]
    Transfer {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid date {value}, expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("date range start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("background task failed: {0}")]
    Task(String),
}

impl RelayError {
    pub(crate) fn network(stage: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| RelayError::Network { stage, source }
    }

    pub(crate) fn transfer(context: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        RelayError::Transfer {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Raw response body, when the error carries one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            RelayError::UnexpectedResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
