use crate::config::ElasticsearchConfig;
use crate::engine::{BulkItemResult, RawHit, SearchEngine};
use crate::error::{AppError, Result};
use crate::search::EngineQuery;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Port assumed for endpoints given without a scheme or port
pub const DEFAULT_PORT: u16 = 9200;

const SEARCH_TYPE: &str = "dfs_query_then_fetch";

/// Result of bootstrapping one configured endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointStatus {
    /// Endpoint as configured
    pub endpoint: String,
    pub outcome: EndpointOutcome,
}

impl EndpointStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self.outcome, EndpointOutcome::Connected { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndpointOutcome {
    Connected { cluster_name: Option<String> },
    Invalid { reason: String },
    Unreachable { reason: String },
    ClusterMismatch { expected: String, actual: Option<String> },
}

/// Elasticsearch REST client
///
/// Requests rotate across the endpoints the engine was built with. Nothing is
/// retried; a failed request surfaces as a network or engine error.
pub struct HttpEngine {
    client: Client,
    endpoints: Vec<Url>,
    next: AtomicUsize,
}

impl HttpEngine {
    /// Create an engine over already-resolved endpoints without probing them
    pub fn new(endpoints: Vec<Url>, timeout_secs: u64) -> Result<Self> {
        let client = build_client(timeout_secs)?;
        Self::with_client(client, endpoints)
    }

    fn with_client(client: Client, endpoints: Vec<Url>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(AppError::Configuration(
                "At least one search engine endpoint must be configured".to_string(),
            ));
        }
        Ok(Self {
            client,
            endpoints,
            next: AtomicUsize::new(0),
        })
    }

    /// Probe every configured endpoint and keep the reachable ones.
    ///
    /// Returns one status per configured endpoint so the caller can decide
    /// whether partial connectivity is acceptable. Fails when none is usable.
    pub async fn connect(config: &ElasticsearchConfig) -> Result<(Self, Vec<EndpointStatus>)> {
        if config.endpoints.is_empty() {
            return Err(AppError::Configuration(
                "At least one search engine endpoint must be configured".to_string(),
            ));
        }

        let client = build_client(config.request_timeout_secs)?;
        info!(
            cluster_name = ?config.cluster_name,
            endpoints = config.endpoints.len(),
            "Connecting to search engine"
        );

        let mut live = Vec::new();
        let mut statuses = Vec::with_capacity(config.endpoints.len());

        for raw in &config.endpoints {
            let outcome = match normalize_endpoint(raw) {
                Err(e) => EndpointOutcome::Invalid {
                    reason: e.to_string(),
                },
                Ok(url) => match probe(&client, &url).await {
                    Err(reason) => EndpointOutcome::Unreachable { reason },
                    Ok(actual) => match &config.cluster_name {
                        Some(expected) if actual.as_deref() != Some(expected.as_str()) => {
                            EndpointOutcome::ClusterMismatch {
                                expected: expected.clone(),
                                actual,
                            }
                        }
                        _ => {
                            live.push(url);
                            EndpointOutcome::Connected {
                                cluster_name: actual,
                            }
                        }
                    },
                },
            };

            match &outcome {
                EndpointOutcome::Connected { cluster_name } => {
                    info!(endpoint = %raw, cluster_name = ?cluster_name, "Added search engine endpoint")
                }
                other => warn!(endpoint = %raw, outcome = ?other, "Unable to add search engine endpoint"),
            }

            statuses.push(EndpointStatus {
                endpoint: raw.clone(),
                outcome,
            });
        }

        if live.is_empty() {
            return Err(AppError::Network(format!(
                "No usable search engine endpoint: {:?}",
                statuses
            )));
        }

        Ok((Self::with_client(client, live)?, statuses))
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    fn base(&self) -> &Url {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[i]
    }

    /// Endpoint URL with each segment percent-encoded (document ids are URLs)
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let base = self.base();
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Configuration(format!("Endpoint cannot be used as a base URL: {}", base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl SearchEngine for HttpEngine {
    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<()> {
        let url = self.url(&[index, "_doc", id])?;
        let response = self.client.put(url).json(document).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[(String, Value)],
    ) -> Result<Vec<BulkItemResult>> {
        let mut body = String::new();
        for (id, document) in documents {
            let action = json!({ "index": { "_index": index, "_id": id } });
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(document)?);
            body.push('\n');
        }

        let url = self.url(&["_bulk"])?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let parsed: BulkResponseBody = check(response).await?.json().await?;

        debug!(
            index = %index,
            items = parsed.items.len(),
            errors = parsed.errors,
            "Bulk request completed"
        );

        Ok(parsed
            .items
            .into_iter()
            .zip(documents.iter())
            .map(|(item, (requested_id, _))| {
                let item = item.into_values().next().unwrap_or_default();
                let id = item.id.unwrap_or_else(|| requested_id.clone());
                match item.error {
                    Some(error) => BulkItemResult::failed(id, error_reason_from(&error)),
                    None if item.status >= 300 => {
                        BulkItemResult::failed(id, format!("status {}", item.status))
                    }
                    None => BulkItemResult::written(id),
                }
            })
            .collect())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<()> {
        let url = self.url(&[index, "_doc", id])?;
        let response = self.client.delete(url).send().await?;
        let status = response.status();
        if status != StatusCode::NOT_FOUND {
            check(response).await?;
            return Ok(());
        }

        // A missing document answers 404 with `result: not_found`; any other
        // 404 (e.g. a missing index) is an error
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<Value>(&body).ok();
        if parsed.as_ref().and_then(|v| v.get("result")).and_then(Value::as_str)
            == Some("not_found")
        {
            debug!(index = %index, id = %id, "Document to delete was not found");
            return Ok(());
        }
        Err(AppError::Engine {
            status: status.as_u16(),
            message: parsed
                .as_ref()
                .and_then(|v| v.get("error"))
                .map(error_reason_from)
                .unwrap_or(body),
        })
    }

    async fn search(&self, indices: &[String], request: &EngineQuery) -> Result<Vec<RawHit>> {
        let joined = indices.join(",");
        let mut url = self.url(&[joined.as_str(), "_search"])?;
        url.query_pairs_mut().append_pair("search_type", SEARCH_TYPE);

        let response = self.client.post(url).json(&request.to_body()).send().await?;
        let parsed: SearchResponseBody = check(response).await?.json().await?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| RawHit {
                id: hit.id,
                score: hit.score.unwrap_or(0.0),
                source: hit.source,
            })
            .collect())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = self.url(&[index])?;
        let response = self.client.head(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(AppError::Engine {
                status: status.as_u16(),
                message: format!("Unable to check whether index {} exists", index),
            }),
        }
    }

    async fn create_index(&self, index: &str, definition: &Value) -> Result<()> {
        let url = self.url(&[index])?;
        let response = self.client.put(url).json(definition).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let url = self.url(&[index])?;
        let response = self.client.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Turn a configured endpoint into a base URL.
///
/// `host` and `host:port` get an `http://` scheme, and `host` also gets
/// [`DEFAULT_PORT`]. Endpoints that carry a scheme are used as given.
pub fn normalize_endpoint(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Configuration("Empty endpoint".to_string()));
    }

    let has_scheme = trimmed.contains("://");
    let candidate = if has_scheme {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let mut url = Url::parse(&candidate)
        .map_err(|e| AppError::Configuration(format!("Invalid endpoint {:?}: {}", raw, e)))?;

    if !has_scheme && url.port().is_none() {
        url.set_port(Some(DEFAULT_PORT))
            .map_err(|_| AppError::Configuration(format!("Invalid endpoint {:?}", raw)))?;
    }
    Ok(url)
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Fetch cluster info; `Ok` carries the reported cluster name
async fn probe(client: &Client, endpoint: &Url) -> std::result::Result<Option<String>, String> {
    let response = client
        .get(endpoint.clone())
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("status {}", response.status()));
    }
    let info: Value = response.json().await.map_err(|e| e.to_string())?;
    Ok(info
        .get("cluster_name")
        .and_then(Value::as_str)
        .map(str::to_string))
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").map(error_reason_from))
        .unwrap_or(body);
    Err(AppError::Engine {
        status: status.as_u16(),
        message,
    })
}

fn error_reason_from(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct BulkResponseBody {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemBody>>,
}

#[derive(Debug, Default, Deserialize)]
struct BulkItemBody {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<HitBody>,
}

#[derive(Debug, Deserialize)]
struct HitBody {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: Value,
}
