//! Tokens for secured services.
//!
//! A token is requested the first time one is needed, when credentials are configured, and then
//! reused for every later request. The service is asked for a token valid for
//! `token_expiration_minutes`, but the client never requests a new one, so clients that outlive
//! that window will start seeing "Invalid Token" service errors.

use log::{debug, warn};
use serde_json::Value;
use url::Url;

use crate::cache::Lazy;
use crate::error::{ArcGisError, AuthErrorKind, Result};
use crate::options::{ClientOptions, Credentials};
use crate::transport::{check_envelope, Params, Transport};

#[derive(Debug)]
pub(crate) struct TokenManager {
    credentials: Option<Credentials>,
    token_url: String,
    expiration_minutes: u32,
    referer: String,
    token: Lazy<String>,
}

impl TokenManager {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            credentials: options.credentials.clone(),
            token_url: options.token_url.clone(),
            expiration_minutes: options.token_expiration_minutes,
            referer: options.referer.clone(),
            token: Lazy::new(),
        }
    }

    /// The cached token, requesting it first if credentials are configured.
    pub fn token<T: Transport>(&self, transport: &T) -> Result<Option<String>> {
        let Some(credentials) = &self.credentials else {
            return Ok(None);
        };
        self.token
            .get_or_try_init(|| self.request(transport, credentials))
            .map(Some)
    }

    fn request<T: Transport>(&self, transport: &T, credentials: &Credentials) -> Result<String> {
        if Url::parse(&self.token_url).is_err() {
            return Err(self.fail(AuthErrorKind::InvalidEndpoint, None));
        }

        let params: Params = vec![
            ("f", "json".to_string()),
            ("username", credentials.username.clone()),
            ("password", credentials.password.clone()),
            ("expiration", self.expiration_minutes.to_string()),
            ("client", "referer".to_string()),
            ("referer", self.referer.clone()),
        ];
        debug!(
            "Requesting token for {} from {}",
            credentials.username, self.token_url
        );

        let body = match transport.post_form(&self.token_url, &params) {
            Ok(body) => body,
            Err(ArcGisError::Network(err)) => {
                let kind = if err.is_timeout() {
                    AuthErrorKind::Timeout
                } else if err.is_connect() {
                    AuthErrorKind::Connection
                } else if err.is_builder() {
                    AuthErrorKind::InvalidEndpoint
                } else {
                    return Err(ArcGisError::Network(err));
                };
                return Err(self.fail(kind, Some(err)));
            }
            Err(err) => return Err(err),
        };

        match check_envelope(body) {
            Ok(body) => match body.get("token").and_then(Value::as_str) {
                Some(token) => Ok(token.to_string()),
                None => Err(self.fail(AuthErrorKind::MissingToken, None)),
            },
            Err(ArcGisError::Service { code, message }) => {
                debug!("Token service answered {}: {}", code, message);
                Err(self.fail(AuthErrorKind::MissingToken, None))
            }
            Err(err) => Err(err),
        }
    }

    fn fail(&self, kind: AuthErrorKind, source: Option<reqwest::Error>) -> ArcGisError {
        match &source {
            Some(err) => warn!("Token request to {} {}: {}", self.token_url, kind, err),
            None => warn!("Token request to {} {}", self.token_url, kind),
        }
        ArcGisError::Auth {
            kind,
            endpoint: self.token_url.clone(),
            source,
        }
    }
}
