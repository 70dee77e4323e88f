//! The HTTP boundary of the client.
//!
//! Every request the client makes goes through a [`Transport`]. The default [`HttpTransport`] is a
//! blocking [`reqwest`] client; tests substitute an in-memory service.

use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::error::{ArcGisError, Result};

/// Query parameters or form fields for a single request, in the order they are sent.
pub type Params = Vec<(&'static str, String)>;

/// A synchronous JSON-over-HTTP transport.
pub trait Transport {
    /// Issue a GET request and decode the body as JSON.
    fn get_json(&self, url: &str, params: &Params) -> Result<Value>;

    /// Issue a form-encoded POST request and decode the body as JSON.
    fn post_form(&self, url: &str, params: &Params) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_json(&self, url: &str, params: &Params) -> Result<Value> {
        (**self).get_json(url, params)
    }

    fn post_form(&self, url: &str, params: &Params) -> Result<Value> {
        (**self).post_form(url, params)
    }
}

/// [`Transport`] backed by a blocking [`reqwest`] client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str, params: &Params) -> Result<Value> {
        debug!("GET {}", url);
        let response = self.client.get(url).query(params).send()?;
        Ok(response.error_for_status()?.json()?)
    }

    fn post_form(&self, url: &str, params: &Params) -> Result<Value> {
        debug!("POST {}", url);
        let response = self.client.post(url).form(params).send()?;
        Ok(response.error_for_status()?.json()?)
    }
}

/// Map the service's `{"error": {"code": .., "message": ..}}` envelope to [`ArcGisError::Service`].
///
/// ArcGIS services report most failures this way with an HTTP 200 status, so a successful
/// transport round trip is not enough to know the request succeeded.
pub(crate) fn check_envelope(value: Value) -> Result<Value> {
    let Some(error) = value.get("error") else {
        return Ok(value);
    };
    let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
    let mut message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    if let Some(details) = error.get("details").and_then(Value::as_array) {
        let details: Vec<&str> = details.iter().filter_map(Value::as_str).collect();
        if !details.is_empty() {
            message = format!("{} ({})", message, details.join("; "));
        }
    }
    Err(ArcGisError::Service { code, message })
}
