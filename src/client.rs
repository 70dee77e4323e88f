use std::sync::Arc;

use crate::descriptor::{DescriptorCache, LayerDescriptor};
use crate::endpoint::ServiceUrl;
use crate::error::{ArcGisError, Result};
use crate::io::esri::QueryResponse;
use crate::options::{ClientOptions, DEFAULT_OBJECT_ID_FIELD};
use crate::paginate::{FetchResult, Paginator};
use crate::query::{execute, Fields, QueryFilter, QueryRequest, WhereClause};
use crate::token::TokenManager;
use crate::transport::{HttpTransport, Transport};
use crate::LayerId;

/// A client for one map or feature service.
///
/// Layer descriptors and the token are cached per client and never invalidated. The caches are not
/// synchronized, so a client must not be shared between threads without external locking.
///
/// ```no_run
/// use arcgis_rest_query::{ArcGis, QueryFilter};
///
/// let states = ArcGis::new(
///     "https://tigerweb.geo.census.gov/arcgis/rest/services/Basemaps/CommunityTIGER/MapServer",
/// )?;
/// let florida = states.count(28, "NAME = 'Florida'")?;
/// let all = states.fetch(28, &QueryFilter::new())?;
/// # Ok::<(), arcgis_rest_query::ArcGisError>(())
/// ```
#[derive(Debug)]
pub struct ArcGis<T = HttpTransport> {
    service: ServiceUrl,
    transport: T,
    options: ClientOptions,
    descriptors: DescriptorCache,
    tokens: TokenManager,
}

impl ArcGis<HttpTransport> {
    /// Connect to the service at `url`, e.g. `https://<host>/arcgis/rest/services/<name>/MapServer`.
    pub fn new(url: &str) -> Result<Self> {
        Self::new_with_options(url, ClientOptions::default())
    }

    pub fn new_with_options(url: &str, options: ClientOptions) -> Result<Self> {
        let transport = HttpTransport::new(options.timeout)?;
        Ok(Self::with_transport(ServiceUrl::new(url)?, transport, options))
    }

    /// Connect to `<base_url>/arcgis/rest/services/<folder>/<map_name>/MapServer`.
    pub fn from_parts(base_url: &str, folder: &str, map_name: &str) -> Result<Self> {
        let options = ClientOptions::default();
        let transport = HttpTransport::new(options.timeout)?;
        Ok(Self::with_transport(
            ServiceUrl::from_parts(base_url, folder, map_name)?,
            transport,
            options,
        ))
    }
}

impl<T: Transport> ArcGis<T> {
    pub fn with_transport(service: ServiceUrl, transport: T, options: ClientOptions) -> Self {
        Self {
            service,
            transport,
            tokens: TokenManager::new(&options),
            options,
            descriptors: DescriptorCache::default(),
        }
    }

    pub fn service_url(&self) -> &ServiceUrl {
        &self.service
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The token sent with every request, if credentials were configured.
    pub fn token(&self) -> Result<Option<String>> {
        self.tokens.token(&self.transport)
    }

    /// The descriptor of `layer`, requested on first use.
    pub fn describe(&self, layer: LayerId) -> Result<Arc<LayerDescriptor>> {
        let token = self.token()?;
        self.descriptors
            .describe(&self.transport, &self.service, layer, token.as_deref())
    }

    /// The names of every field of `layer`.
    pub fn fields(&self, layer: LayerId) -> Result<Vec<String>> {
        Ok(self.describe(layer)?.field_names())
    }

    /// Issue a single query, without following pagination.
    pub fn query(&self, layer: LayerId, filter: &QueryFilter) -> Result<QueryResponse> {
        execute(&self.transport, &self.prepare(layer, filter)?)
    }

    /// Fetch every record of `layer` matching `filter`.
    ///
    /// Layers with geometry produce a [`FetchResult::Features`], tables a
    /// [`FetchResult::Records`], and count-only filters a [`FetchResult::Count`].
    pub fn fetch(&self, layer: LayerId, filter: &QueryFilter) -> Result<FetchResult> {
        let request = self.prepare(layer, filter)?;
        Paginator {
            transport: &self.transport,
            layer,
            max_pages: self.options.max_pages,
            table_termination: self.options.table_termination,
        }
        .fetch(&request, filter.where_clause.clone())
    }

    /// The number of records of `layer` matching `where_clause`.
    pub fn count(&self, layer: LayerId, where_clause: impl Into<WhereClause>) -> Result<u64> {
        let filter = QueryFilter::new()
            .with_where(where_clause)
            .with_count_only(true);
        self.fetch(layer, &filter)?
            .count()
            .ok_or(ArcGisError::MissingField("count"))
    }

    fn prepare(&self, layer: LayerId, filter: &QueryFilter) -> Result<QueryRequest> {
        let descriptor = self.describe(layer)?;
        let out_fields = match &filter.fields {
            Fields::Derive => descriptor.field_names(),
            Fields::All => vec![],
            Fields::Explicit(fields) => fields.clone(),
        };
        let object_id_field = self
            .options
            .object_id_field
            .as_deref()
            .or_else(|| descriptor.object_id_field())
            .unwrap_or(DEFAULT_OBJECT_ID_FIELD)
            .to_string();
        Ok(QueryRequest {
            url: self.service.query(layer),
            where_clause: filter.where_clause.as_str().to_string(),
            out_fields,
            srid: filter.srid.unwrap_or(self.options.srid),
            object_id_field,
            count_only: filter.count_only,
            geometry_hint: descriptor.geometry_kind().ok().flatten(),
            token: self.token()?,
        })
    }
}
