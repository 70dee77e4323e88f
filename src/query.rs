//! Building and issuing a single `query` request.

use log::debug;

use crate::error::Result;
use crate::io::esri::{EsriGeometryType, QueryResponse};
use crate::transport::{check_envelope, Params, Transport};

/// A where clause, or the absence of one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WhereClause {
    /// Match every record of the layer.
    #[default]
    All,

    /// A SQL-like filter evaluated by the service, e.g. `STATE_ABBR = 'IN'`.
    Filter(String),
}

impl WhereClause {
    /// The clause sent when no filter is given.
    pub const MATCH_ALL: &'static str = "1 = 1";

    pub fn new(clause: impl Into<String>) -> Self {
        Self::Filter(clause.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            WhereClause::All => Self::MATCH_ALL,
            WhereClause::Filter(clause) => clause,
        }
    }

    /// Whether this clause matches everything.
    ///
    /// Note: a filter is only recognized as matching everything when its text is exactly
    /// [`Self::MATCH_ALL`]. Equivalent spellings such as `1=1` are treated as real filters.
    pub fn is_match_all(&self) -> bool {
        self.as_str() == Self::MATCH_ALL
    }

    /// Conjoin `clause` with this filter.
    pub fn and(&self, clause: &str) -> String {
        if self.is_match_all() {
            clause.to_string()
        } else {
            format!("{} AND ({})", clause, self.as_str())
        }
    }
}

impl From<&str> for WhereClause {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WhereClause {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Which attribute fields to request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Fields {
    /// Every field listed in the layer descriptor, named explicitly.
    #[default]
    Derive,

    /// The `*` wildcard.
    All,

    Explicit(Vec<String>),
}

impl<S: Into<String>> FromIterator<S> for Fields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::Explicit(iter.into_iter().map(Into::into).collect())
    }
}

/// What to fetch from a layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryFilter {
    pub where_clause: WhereClause,

    pub fields: Fields,

    /// Output spatial reference. Falls back to the client's configured srid.
    pub srid: Option<u32>,

    pub count_only: bool,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(self, where_clause: impl Into<WhereClause>) -> Self {
        Self {
            where_clause: where_clause.into(),
            ..self
        }
    }

    pub fn with_fields(self, fields: Fields) -> Self {
        Self { fields, ..self }
    }

    pub fn with_srid(self, srid: u32) -> Self {
        Self {
            srid: Some(srid),
            ..self
        }
    }

    pub fn with_count_only(self, count_only: bool) -> Self {
        Self { count_only, ..self }
    }
}

/// A fully resolved query against one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub url: String,

    pub where_clause: String,

    /// Empty means every field.
    pub out_fields: Vec<String>,

    pub srid: u32,

    /// Results are ordered ascending on this field.
    pub object_id_field: String,

    pub count_only: bool,

    pub geometry_hint: Option<EsriGeometryType>,

    pub token: Option<String>,
}

impl QueryRequest {
    /// The same request with a different where clause.
    pub fn with_where(&self, where_clause: String) -> Self {
        Self {
            where_clause,
            ..self.clone()
        }
    }

    pub fn params(&self) -> Params {
        let out_fields = if self.out_fields.is_empty() {
            "*".to_string()
        } else {
            self.out_fields.join(",")
        };
        let mut params: Params = vec![
            ("where", self.where_clause.clone()),
            ("outFields", out_fields),
            ("returnGeometry", "true".to_string()),
            ("outSR", self.srid.to_string()),
            ("f", "json".to_string()),
            ("orderByFields", self.object_id_field.clone()),
            ("returnCountOnly", self.count_only.to_string()),
        ];
        if let Some(kind) = self.geometry_hint {
            params.push(("geometryType", kind.as_str().to_string()));
        }
        if let Some(token) = &self.token {
            params.push(("token", token.clone()));
        }
        params
    }
}

/// Issue one query and decode the response. Errors are returned as-is, without retrying.
pub fn execute<T: Transport>(transport: &T, request: &QueryRequest) -> Result<QueryResponse> {
    debug!("Querying {} where {}", request.url, request.where_clause);
    let body = check_envelope(transport.get_json(&request.url, &request.params())?)?;
    Ok(serde_json::from_value(body)?)
}
