use relayr_common::network::RecordError;
use thiserror::Error;

/// The directory could not be obtained for this run.
///
/// Every variant is fatal: no partial directory is ever used. A corrupt cache is
/// not represented here, it only ever results in a refetch.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory unavailable: request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("directory unavailable: {url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("directory unavailable: malformed response")]
    Malformed(#[from] RecordError),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
