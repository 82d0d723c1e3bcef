//! HTTP existence checks against the service that owns a resource.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::validation::ExistenceValidator;
use crate::domain::types::ResourceKind;

const METRIC_VALIDATOR_REJECTION: &str = "folio_validator_rejection_total";

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("invalid validator url: {0}")]
    Url(#[from] url::ParseError),
    #[error("validator url `{0}` cannot carry a path")]
    CannotBeABase(String),
    #[error("http client could not be built: {0}")]
    Client(#[from] reqwest::Error),
}

/// Issues `GET {endpoint}/{id}` and treats any 2xx answer as existence.
///
/// Transport errors, timeouts, non-success statuses and kinds without a
/// configured endpoint all answer `false`.
#[derive(Clone)]
pub struct HttpExistenceValidator {
    client: Client,
    endpoints: HashMap<ResourceKind, Url>,
}

impl HttpExistenceValidator {
    pub fn new(timeout: Duration) -> Result<Self, ValidatorError> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoints: HashMap::new(),
        })
    }

    /// Register the collection URL of `kind`, e.g. `http://articles:5001/articles`.
    pub fn with_endpoint(mut self, kind: ResourceKind, base: &str) -> Result<Self, ValidatorError> {
        let url = Url::parse(base)?;
        if url.cannot_be_a_base() {
            return Err(ValidatorError::CannotBeABase(base.to_string()));
        }
        self.endpoints.insert(kind, url);
        Ok(self)
    }

    fn target(&self, kind: ResourceKind, id: i64) -> Option<Url> {
        let mut url = self.endpoints.get(&kind)?.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(&id.to_string());
        Some(url)
    }

    fn reject(kind: ResourceKind, id: i64, reason: &'static str) -> bool {
        counter!(METRIC_VALIDATOR_REJECTION, "kind" => kind.as_str(), "reason" => reason)
            .increment(1);
        debug!(
            target = "folio::validator",
            kind = %kind,
            id,
            reason,
            "Existence check rejected"
        );
        false
    }
}

#[async_trait]
impl ExistenceValidator for HttpExistenceValidator {
    async fn exists(&self, kind: ResourceKind, id: i64) -> bool {
        let Some(url) = self.target(kind, id) else {
            warn!(
                target = "folio::validator",
                kind = %kind,
                "No existence endpoint configured"
            );
            return Self::reject(kind, id, "unconfigured");
        };

        match self.client.get(url.clone()).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let status = response.status();
                if status != reqwest::StatusCode::NOT_FOUND {
                    warn!(
                        target = "folio::validator",
                        kind = %kind,
                        id,
                        url = %url,
                        status = status.as_u16(),
                        "Existence check returned unexpected status"
                    );
                }
                Self::reject(kind, id, "status")
            }
            Err(err) => {
                let reason = if err.is_timeout() { "timeout" } else { "transport" };
                warn!(
                    target = "folio::validator",
                    kind = %kind,
                    id,
                    url = %url,
                    error = %err,
                    "Existence check failed"
                );
                Self::reject(kind, id, reason)
            }
        }
    }
}
