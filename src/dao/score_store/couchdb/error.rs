//! Error types shared by the CouchDB storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing or blank.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// `COUCH_BASE_URL` is not an absolute http(s) URL.
    #[error("invalid CouchDB base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// Why it was refused.
        reason: String,
    },
    /// Building the HTTP client failed, usually a TLS backend problem.
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Client builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a database creation request.
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        /// Database name.
        database: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a database operation.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// A request could not be sent.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        /// Request target.
        path: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code.
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    RequestStatus {
        /// Request target.
        path: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        /// Request target.
        path: String,
        /// Body decoding failure.
        #[source]
        source: reqwest::Error,
    },
    /// `_bulk_docs` accepted the request but refused some documents.
    #[error("CouchDB refused {failed} of {total} bulk updates")]
    BulkRejected {
        /// Documents CouchDB refused.
        failed: usize,
        /// Documents sent.
        total: usize,
    },
}

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        let undecodable = match &err {
            CouchDaoError::DecodeResponse { path, .. } => Some(path.clone()),
            _ => None,
        };
        match undecodable {
            Some(path) => StorageError::corrupt(format!("CouchDB payload for `{path}`"), err),
            None => StorageError::unavailable("CouchDB request failed".into(), err),
        }
    }
}
