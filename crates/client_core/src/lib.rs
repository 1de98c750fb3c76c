use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    domain::PointRecord,
    error::{LoadError, RecordRejection},
    protocol::MunroPayload,
};
use tracing::{info, warn};
use url::Url;

pub mod projection;
mod scope;
pub mod tiles;
pub mod viewport;

pub use scope::LoadScope;

pub const DEFAULT_MUNRO_API_URL: &str = "https://munroapi.herokuapp.com/munros";
pub const USER_AGENT: &str = concat!("munro_map/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for the provider and tile requests. The tile servers
/// refuse anonymous clients, so a descriptive user agent is always sent.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).build()
}

#[async_trait]
pub trait MunroSource: Send + Sync {
    /// Performs the single provider request and returns the raw body.
    async fn fetch_body(&self) -> Result<String, LoadError>;
}

pub struct HttpMunroSource {
    http: Client,
    url: Url,
}

impl HttpMunroSource {
    pub fn new(http: Client, url: Url) -> Self {
        Self { http, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl MunroSource for HttpMunroSource {
    async fn fetch_body(&self) -> Result<String, LoadError> {
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| LoadError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|err| LoadError::Transport(err.to_string()))
    }
}

/// Outcome of a successful load: the records that passed validation, in
/// provider order, and every element that was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub records: Vec<PointRecord>,
    pub rejected: Vec<RecordRejection>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parses a provider body. A body that is not a JSON array fails the whole
/// load; bad elements inside the array are dropped one by one.
pub fn parse_munro_body(body: &str) -> Result<LoadReport, LoadError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| LoadError::Body(err.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(LoadError::Body(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut report = LoadReport::default();
    for (index, item) in items.into_iter().enumerate() {
        let outcome = serde_json::from_value::<MunroPayload>(item)
            .map_err(|err| RecordRejection::Malformed {
                index,
                reason: err.to_string(),
            })
            .and_then(|payload| payload.into_record(index));
        match outcome {
            Ok(record) => report.records.push(record),
            Err(rejection) => {
                warn!(index = rejection.index(), "dropping munro record: {rejection}");
                report.rejected.push(rejection);
            }
        }
    }
    Ok(report)
}

/// Runs the one-shot load inside `scope`. If the scope is torn down before
/// the provider answers, the response is discarded.
pub async fn load_munros(
    source: &dyn MunroSource,
    scope: &LoadScope,
) -> Result<LoadReport, LoadError> {
    if scope.is_cancelled() {
        return Err(LoadError::Cancelled);
    }

    let body = tokio::select! {
        biased;
        _ = scope.cancelled() => return Err(LoadError::Cancelled),
        body = source.fetch_body() => body?,
    };

    if scope.is_cancelled() {
        return Err(LoadError::Cancelled);
    }

    let report = parse_munro_body(&body)?;
    info!(
        loaded = report.records.len(),
        rejected = report.rejected.len(),
        "munro collection loaded"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
