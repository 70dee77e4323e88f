//! An in-memory map service.
//!
//! Answers descriptor and query requests for its layers, evaluating the small subset of where
//! clauses the client produces: `1 = 1`, comparisons of a field with a number or quoted string, and
//! conjunctions of those with `AND`.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::endpoint::ServiceUrl;
use crate::error::Result;
use crate::io::esri::Attributes;
use crate::transport::{Params, Transport};
use crate::LayerId;

pub(crate) const BASE_URL: &str = "https://example.com/arcgis/rest/services/Test/MapServer";

#[derive(Debug, Clone)]
pub(crate) struct MockLayer {
    pub id: LayerId,
    pub name: String,
    pub geometry_type: Option<String>,
    /// Field names and ESRI field types.
    pub fields: Vec<(String, String)>,
    pub records: Vec<(Attributes, Option<Value>)>,
}

impl MockLayer {
    pub fn descriptor(&self) -> Value {
        let fields: Vec<Value> = self
            .fields
            .iter()
            .map(|(name, field_type)| json!({"name": name, "type": field_type, "alias": name}))
            .collect();
        let mut descriptor = json!({
            "currentVersion": 10.91,
            "id": self.id,
            "name": self.name,
            "type": if self.geometry_type.is_some() { "Feature Layer" } else { "Table" },
            "objectIdField": "OBJECTID",
            "fields": fields,
        });
        if let Some(geometry_type) = &self.geometry_type {
            descriptor["geometryType"] = json!(geometry_type);
        }
        descriptor
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
pub(crate) struct MockService {
    layers: BTreeMap<LayerId, MockLayer>,
    page_size: usize,
    report_exceeded: bool,
    apply_where: bool,
    required_token: Option<String>,
    token_response: Option<Value>,
    failures: Cell<usize>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            layers: BTreeMap::new(),
            page_size: usize::MAX,
            report_exceeded: true,
            apply_where: true,
            required_token: None,
            token_response: None,
            failures: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_layer(mut self, layer: MockLayer) -> Self {
        self.layers.insert(layer.id, layer);
        self
    }

    /// Cap the number of records per response.
    pub fn with_page_size(self, page_size: usize) -> Self {
        Self { page_size, ..self }
    }

    /// Truncate pages without setting `exceededTransferLimit`.
    pub fn without_exceeded_flag(self) -> Self {
        Self {
            report_exceeded: false,
            ..self
        }
    }

    /// Answer every query as if it had no where clause.
    pub fn ignoring_where(self) -> Self {
        Self {
            apply_where: false,
            ..self
        }
    }

    /// Reject layer requests that do not carry `token`.
    pub fn secured(self, token: &str) -> Self {
        Self {
            required_token: Some(token.to_string()),
            ..self
        }
    }

    pub fn with_token_response(self, response: Value) -> Self {
        Self {
            token_response: Some(response),
            ..self
        }
    }

    /// Answer the next `count` requests with a service error.
    pub fn fail_next(&self, count: usize) {
        self.failures.set(count);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    pub fn url(&self) -> ServiceUrl {
        ServiceUrl::new(BASE_URL).unwrap()
    }

    fn record(&self, url: &str, params: &Params) -> Option<Value> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: url.to_string(),
            params: params
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        });
        let failures = self.failures.get();
        if failures > 0 {
            self.failures.set(failures - 1);
            return Some(error(500, "Internal server error."));
        }
        None
    }

    fn query(&self, layer: &MockLayer, params: &Params) -> Value {
        let where_clause = param(params, "where").unwrap_or("1 = 1");
        let mut matching: Vec<&(Attributes, Option<Value>)> = layer
            .records
            .iter()
            .filter(|(attributes, _)| !self.apply_where || matches(where_clause, attributes))
            .collect();
        if let Some(order) = param(params, "orderByFields") {
            matching.sort_by(|(a, _), (b, _)| match (a.get(order), b.get(order)) {
                (Some(a), Some(b)) => compare(a, b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            });
        }

        if param(params, "returnCountOnly") == Some("true") {
            return json!({"count": matching.len()});
        }

        let out_fields = param(params, "outFields").unwrap_or("*");
        let features: Vec<Value> = matching
            .iter()
            .take(self.page_size)
            .map(|(attributes, geometry)| {
                let mut feature = json!({"attributes": project(attributes, out_fields)});
                if let Some(geometry) = geometry {
                    feature["geometry"] = geometry.clone();
                }
                feature
            })
            .collect();

        let mut body = json!({
            "objectIdFieldName": "OBJECTID",
            "features": features,
        });
        if let Some(geometry_type) = &layer.geometry_type {
            body["geometryType"] = json!(geometry_type);
            body["spatialReference"] = json!({"wkid": 4326});
        }
        if self.report_exceeded && matching.len() > self.page_size {
            body["exceededTransferLimit"] = json!(true);
        }
        body
    }
}

impl Transport for MockService {
    fn get_json(&self, url: &str, params: &Params) -> Result<Value> {
        if let Some(failure) = self.record(url, params) {
            return Ok(failure);
        }
        if let Some(required) = &self.required_token {
            if param(params, "token") != Some(required.as_str()) {
                return Ok(error(499, "Token Required"));
            }
        }

        let Some(path) = url
            .strip_prefix(BASE_URL)
            .and_then(|path| path.strip_prefix('/'))
        else {
            return Ok(error(404, "Not Found"));
        };
        let (layer, is_query) = match path.strip_suffix("/query") {
            Some(layer) => (layer, true),
            None => (path, false),
        };
        let Some(layer) = layer
            .parse::<LayerId>()
            .ok()
            .and_then(|id| self.layers.get(&id))
        else {
            return Ok(error(400, "Invalid or missing input parameters."));
        };

        if is_query {
            Ok(self.query(layer, params))
        } else {
            Ok(layer.descriptor())
        }
    }

    fn post_form(&self, url: &str, params: &Params) -> Result<Value> {
        if let Some(failure) = self.record(url, params) {
            return Ok(failure);
        }
        Ok(self
            .token_response
            .clone()
            .unwrap_or_else(|| error(404, "Not Found")))
    }
}

fn error(code: i64, message: &str) -> Value {
    json!({"error": {"code": code, "message": message, "details": []}})
}

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
}

fn project(attributes: &Attributes, out_fields: &str) -> Attributes {
    if out_fields == "*" {
        return attributes.clone();
    }
    out_fields
        .split(',')
        .map(str::trim)
        .filter_map(|name| {
            attributes
                .get(name)
                .map(|value| (name.to_string(), value.clone()))
        })
        .collect()
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches(clause: &str, attributes: &Attributes) -> bool {
    clause.split(" AND ").all(|term| {
        let term = term
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim();
        if term == "1 = 1" {
            return true;
        }
        let Some((field, op, literal)) = [">=", "<=", ">", "<", "="]
            .into_iter()
            .find_map(|op| {
                term.split_once(&format!(" {} ", op))
                    .map(|(field, literal)| (field.trim(), op, literal.trim()))
            })
        else {
            panic!("unsupported where clause {:?}", term);
        };
        let literal = match literal.strip_prefix('\'').and_then(|l| l.strip_suffix('\'')) {
            Some(text) => Value::String(text.replace("''", "'")),
            None => serde_json::from_str(literal).unwrap_or(Value::Null),
        };
        let Some(ordering) = attributes
            .get(field)
            .and_then(|value| compare(value, &literal))
        else {
            return false;
        };
        match op {
            ">=" => ordering != Ordering::Less,
            "<=" => ordering != Ordering::Greater,
            ">" => ordering == Ordering::Greater,
            "<" => ordering == Ordering::Less,
            _ => ordering == Ordering::Equal,
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn attributes(value: Value) -> Attributes {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn where_subset() {
        let record = attributes(json!({"OBJECTID": 12, "STATE_ABBR": "IN", "STATE": 18}));
        assert!(matches("1 = 1", &record));
        assert!(matches("STATE_ABBR = 'IN'", &record));
        assert!(matches("OBJECTID > 11 AND (STATE_ABBR = 'IN')", &record));
        assert!(!matches("OBJECTID > 12 AND (STATE_ABBR = 'IN')", &record));
        assert!(matches("STATE = 18", &record));
        assert!(!matches("NAME = 'Indiana'", &record));
    }
}
