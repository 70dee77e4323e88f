//! Configuration for [`ArcGis`][crate::ArcGis].

use std::time::Duration;

/// The default output spatial reference, WGS84.
pub const DEFAULT_SRID: u32 = 4326;

/// The object-id field assumed when the layer descriptor does not name one.
pub const DEFAULT_OBJECT_ID_FIELD: &str = "OBJECTID";

/// The page size historically used by services, and by the legacy short-page heuristic.
pub const LEGACY_PAGE_SIZE: usize = 1000;

/// How the table path decides that no more pages remain.
///
/// Geometry layers always follow the service's `exceededTransferLimit` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationSignal {
    /// Stop once a page arrives without the `exceededTransferLimit` flag.
    #[default]
    ExceededLimit,

    /// Stop once a page holds fewer records than the given threshold. This is how older releases
    /// paged through tables.
    ShortPage(usize),
}

/// A username and password used to request a token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Options for the client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Spatial reference id the service reprojects output geometries into.
    pub(crate) srid: u32,

    /// Overrides the object-id field otherwise read from each layer's descriptor.
    pub(crate) object_id_field: Option<String>,

    /// Upper bound on the number of pages fetched for a single layer.
    pub(crate) max_pages: usize,

    pub(crate) table_termination: TerminationSignal,

    /// Timeout applied to every HTTP request.
    pub(crate) timeout: Duration,

    pub(crate) credentials: Option<Credentials>,

    pub(crate) token_url: String,

    /// Lifetime requested for a token. Tokens are never refreshed, see [`crate::token`].
    pub(crate) token_expiration_minutes: u32,

    pub(crate) referer: String,
}

impl ClientOptions {
    /// Set the output spatial reference.
    ///
    /// Defaults to 4326.
    pub fn with_srid(self, srid: u32) -> Self {
        Self { srid, ..self }
    }

    /// Page on this field instead of the one the layer descriptor reports.
    pub fn with_object_id_field(self, field: impl Into<String>) -> Self {
        Self {
            object_id_field: Some(field.into()),
            ..self
        }
    }

    /// Fail with [`ArcGisError::PaginationInconsistency`][crate::ArcGisError::PaginationInconsistency]
    /// once a single fetch needs more than this many pages.
    pub fn with_max_pages(self, max_pages: usize) -> Self {
        Self { max_pages, ..self }
    }

    pub fn with_table_termination(self, table_termination: TerminationSignal) -> Self {
        Self {
            table_termination,
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Authenticate with a token generated from these credentials.
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..self
        }
    }

    /// Set the `generateToken` endpoint.
    ///
    /// Defaults to ArcGIS Online's.
    pub fn with_token_url(self, token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            ..self
        }
    }

    pub fn with_token_expiration_minutes(self, token_expiration_minutes: u32) -> Self {
        Self {
            token_expiration_minutes,
            ..self
        }
    }

    pub fn with_referer(self, referer: impl Into<String>) -> Self {
        Self {
            referer: referer.into(),
            ..self
        }
    }

    pub fn srid(&self) -> u32 {
        self.srid
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            srid: DEFAULT_SRID,
            object_id_field: None,
            max_pages: 10_000,
            table_termination: TerminationSignal::default(),
            timeout: Duration::from_secs(60),
            credentials: None,
            token_url: "https://www.arcgis.com/sharing/rest/generateToken".to_string(),
            token_expiration_minutes: 60,
            referer: "arcgis-rest-query".to_string(),
        }
    }
}
