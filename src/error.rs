//! Defines [`ArcGisError`], representing all errors returned by this crate.

use std::fmt::Debug;
use thiserror::Error;

use crate::LayerId;

/// The distinct ways in which obtaining a token can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The token endpoint did not answer in time.
    Timeout,

    /// No connection could be made to the token endpoint.
    Connection,

    /// The token endpoint URL could not be used to build a request.
    InvalidEndpoint,

    /// The token endpoint answered, but its response carried no token.
    MissingToken,
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            AuthErrorKind::Timeout => "timed out",
            AuthErrorKind::Connection => "connection failed",
            AuthErrorKind::InvalidEndpoint => "invalid endpoint",
            AuthErrorKind::MissingToken => "no token in response",
        };
        f.write_str(text)
    }
}

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ArcGisError {
    /// The service answered with its own error envelope instead of a result.
    #[error("Service error {code}: {message}")]
    Service { code: i64, message: String },

    /// A token could not be obtained.
    #[error("Authentication against {endpoint} failed: {kind}")]
    Auth {
        kind: AuthErrorKind,
        endpoint: String,
        /// The transport failure, for timeouts and refused connections.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A geometry payload was present but its kind is not one of point, multipoint, polyline or
    /// polygon.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// Pagination did not converge, most likely because the object-id field is not unique and
    /// ascending for the filter.
    #[error("Pagination of layer {layer} stopped after {pages} pages: {reason}")]
    PaginationInconsistency {
        layer: LayerId,
        pages: usize,
        reason: String,
    },

    /// A page ended in a record without a usable object id, so no continuation filter exists.
    #[error("Record is missing object id field {field}")]
    MissingObjectId { field: String },

    /// A response lacked a member it must carry, e.g. `count` for a count-only query.
    #[error("Response is missing {0}")]
    MissingField(&'static str),

    /// [reqwest::Error]
    #[error(transparent)]
    Network(#[from] reqwest::Error),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// [url::ParseError]
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// [std::io::Error]
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, ArcGisError>;
