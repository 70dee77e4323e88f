//! Following the object-id cursor across pages.
//!
//! Services cap the number of records in a response and set `exceededTransferLimit` when more
//! remain. Every page after the first is requested with `<object id> > <last object id seen>`,
//! which requires the service to return records ascending on a unique object-id field. That is
//! asked for through `orderByFields` but cannot be verified. When the cursor fails to advance the
//! fetch stops with [`ArcGisError::PaginationInconsistency`], and [`ClientOptions::with_max_pages`]
//! bounds the number of requests regardless.
//!
//! [`ClientOptions::with_max_pages`]: crate::ClientOptions::with_max_pages

use geojson::{Feature, FeatureCollection};
use log::debug;
use serde_json::Value;

use crate::error::{ArcGisError, Result};
use crate::io::esri::{Attributes, GeometryTranslator, QueryResponse, RawFeature};
use crate::options::TerminationSignal;
use crate::query::{execute, QueryRequest, WhereClause};
use crate::transport::Transport;
use crate::LayerId;

/// The outcome of [`ArcGis::fetch`][crate::ArcGis::fetch].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// The number of matching records, for count-only queries.
    Count(u64),

    /// Every matching feature of a layer with geometry, ascending by object id.
    Features(FeatureCollection),

    /// Every matching record of a table, ascending by object id.
    Records(Vec<Attributes>),
}

impl FetchResult {
    pub fn count(&self) -> Option<u64> {
        match self {
            FetchResult::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn into_features(self) -> Option<FeatureCollection> {
        match self {
            FetchResult::Features(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Attributes>> {
        match self {
            FetchResult::Records(records) => Some(records),
            _ => None,
        }
    }
}

/// Position of a paged fetch.
///
/// The caller's filter is kept apart from the continuation clause so it can be re-applied to
/// every page.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationCursor {
    layer: LayerId,
    object_id_field: String,
    last_object_id: Option<Value>,
    base_filter: WhereClause,
    pages: usize,
}

impl PaginationCursor {
    pub fn new(
        layer: LayerId,
        object_id_field: impl Into<String>,
        base_filter: WhereClause,
    ) -> Self {
        Self {
            layer,
            object_id_field: object_id_field.into(),
            last_object_id: None,
            base_filter,
            pages: 0,
        }
    }

    pub fn last_object_id(&self) -> Option<&Value> {
        self.last_object_id.as_ref()
    }

    /// Move past `record`, the last record of the latest page.
    ///
    /// Fails if the record has no object id, or if the object id does not exceed the previous one.
    pub fn advance(&mut self, record: &Attributes) -> Result<()> {
        let object_id = match record.get(&self.object_id_field) {
            Some(value @ (Value::Number(_) | Value::String(_))) => value.clone(),
            _ => {
                return Err(ArcGisError::MissingObjectId {
                    field: self.object_id_field.clone(),
                })
            }
        };
        if let Some(previous) = &self.last_object_id {
            if !ascends(previous, &object_id) {
                return Err(ArcGisError::PaginationInconsistency {
                    layer: self.layer,
                    pages: self.pages + 1,
                    reason: format!(
                        "{} went from {} to {}",
                        self.object_id_field, previous, object_id
                    ),
                });
            }
        }
        self.last_object_id = Some(object_id);
        self.pages += 1;
        Ok(())
    }

    /// The where clause selecting the records after the last one seen.
    pub fn continuation(&self) -> String {
        let clause = match &self.last_object_id {
            Some(Value::String(object_id)) => format!(
                "{} > '{}'",
                self.object_id_field,
                object_id.replace('\'', "''")
            ),
            Some(object_id) => format!("{} > {}", self.object_id_field, object_id),
            None => return self.base_filter.as_str().to_string(),
        };
        self.base_filter.and(&clause)
    }
}

fn ascends(previous: &Value, next: &Value) -> bool {
    match (previous, next) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => b > a,
            _ => b.as_f64() > a.as_f64(),
        },
        (Value::String(a), Value::String(b)) => b > a,
        _ => false,
    }
}

/// Drives repeated queries against one layer.
pub(crate) struct Paginator<'a, T> {
    pub transport: &'a T,
    pub layer: LayerId,
    pub max_pages: usize,
    pub table_termination: TerminationSignal,
}

impl<T: Transport> Paginator<'_, T> {
    /// Fetch every record matching `request`, whose where clause is the caller's filter.
    pub fn fetch(&self, request: &QueryRequest, base_filter: WhereClause) -> Result<FetchResult> {
        let first = execute(self.transport, request)?;

        if request.count_only {
            return first
                .count
                .map(FetchResult::Count)
                .ok_or(ArcGisError::MissingField("count"));
        }

        let Some(geometry_type) = first.geometry_type.clone() else {
            return self.fetch_table(first, request, base_filter);
        };

        let translator = GeometryTranslator::for_kind(&geometry_type);
        let mut features = Vec::new();
        self.walk(
            first,
            request,
            base_filter,
            TerminationSignal::ExceededLimit,
            |page| {
                for raw in page {
                    features.push(to_feature(raw, &translator)?);
                }
                Ok(())
            },
        )?;
        Ok(FetchResult::Features(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }))
    }

    /// The geometry-less path: the same cursor, producing flat records.
    fn fetch_table(
        &self,
        first: QueryResponse,
        request: &QueryRequest,
        base_filter: WhereClause,
    ) -> Result<FetchResult> {
        let mut records = Vec::new();
        self.walk(
            first,
            request,
            base_filter,
            self.table_termination,
            |page| {
                records.extend(page.into_iter().map(|raw| raw.attributes));
                Ok(())
            },
        )?;
        Ok(FetchResult::Records(records))
    }

    fn walk(
        &self,
        first: QueryResponse,
        request: &QueryRequest,
        base_filter: WhereClause,
        signal: TerminationSignal,
        mut sink: impl FnMut(Vec<RawFeature>) -> Result<()>,
    ) -> Result<()> {
        let mut cursor =
            PaginationCursor::new(self.layer, request.object_id_field.clone(), base_filter);
        let mut page = first;
        let mut pages = 1;
        loop {
            let more = has_more(&page, signal);
            debug!(
                "Layer {} page {}: {} records, more pages: {}",
                self.layer,
                pages,
                page.features.len(),
                more
            );
            if more {
                let Some(last) = page.features.last() else {
                    return Err(self.inconsistency(
                        pages,
                        "service reported more records but returned an empty page".to_string(),
                    ));
                };
                cursor.advance(&last.attributes)?;
            }

            sink(page.features)?;

            if !more {
                return Ok(());
            }
            if pages >= self.max_pages {
                return Err(self.inconsistency(
                    pages,
                    format!("more than {} pages", self.max_pages),
                ));
            }

            page = execute(self.transport, &request.with_where(cursor.continuation()))?;
            pages += 1;
        }
    }

    fn inconsistency(&self, pages: usize, reason: String) -> ArcGisError {
        ArcGisError::PaginationInconsistency {
            layer: self.layer,
            pages,
            reason,
        }
    }
}

fn has_more(page: &QueryResponse, signal: TerminationSignal) -> bool {
    match signal {
        TerminationSignal::ExceededLimit => page.exceeded_transfer_limit,
        TerminationSignal::ShortPage(threshold) => page.features.len() >= threshold,
    }
}

fn to_feature(raw: RawFeature, translator: &GeometryTranslator) -> Result<Feature> {
    let geometry = translator.translate(raw.geometry.as_ref())?;
    Ok(Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(raw.attributes),
        foreign_members: None,
    })
}
