use crate::{search_query, PostSource};
use async_trait::async_trait;
use postrelay_core::{Candidate, CoreError, QueryDateRange, SourceError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Extraction function executed inside the remote browser. It only reads the
/// rendered `article` elements and hands back raw records.
const EXTRACT_FUNCTION: &str = include_str!("extract.js");

#[derive(Debug, Clone)]
pub struct BrowserlessConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub site_origin: String,
    pub settle_millis: u64,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ExtractMode {
    Session,
    Articles,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FunctionContext {
    pub mode: ExtractMode,
    pub url: String,
    pub limit: Option<usize>,
    pub settle_millis: u64,
}

#[derive(Debug, Serialize)]
struct FunctionRequest<'a> {
    code: &'a str,
    context: &'a FunctionContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FunctionOutput {
    #[serde(default)]
    pub logged_in: Option<bool>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug)]
pub struct BrowserlessSource {
    http_client: Client,
    endpoint: String,
    token: Option<String>,
    site_origin: String,
    settle_millis: u64,
}

impl BrowserlessSource {
    pub fn new(config: BrowserlessConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/function", config.base_url.trim_end_matches('/')),
            token: config.token,
            site_origin: config.site_origin.trim_end_matches('/').to_string(),
            settle_millis: config.settle_millis,
        })
    }

    pub(crate) fn search_url(
        &self,
        handle: &str,
        keyword: Option<&str>,
        range: QueryDateRange,
    ) -> Result<String, CoreError> {
        let mut url = self.page_url("search")?;
        url.query_pairs_mut()
            .append_pair("q", &search_query(handle, keyword, range))
            .append_pair("f", "live");
        Ok(url.to_string())
    }

    pub(crate) fn page_url(&self, path: &str) -> Result<Url, CoreError> {
        Url::parse(&format!("{}/{}", self.site_origin, path)).map_err(|e| {
            CoreError::InvalidInput {
                message: format!("invalid page url for {}: {}", path, e),
            }
        })
    }

    async fn run_function(&self, context: FunctionContext) -> Result<FunctionOutput, CoreError> {
        let start_time = Instant::now();
        let mut request_builder = self.http_client.post(&self.endpoint).json(&FunctionRequest {
            code: EXTRACT_FUNCTION,
            context: &context,
        });
        if let Some(token) = &self.token {
            request_builder = request_builder.query(&[("token", token.as_str())]);
        }

        debug!(mode = ?context.mode, url = %context.url, "Running extraction function");
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(url = %context.url, "Rendering request timed out");
                return Err(SourceError::RequestTimeout.into());
            }
            Err(e) => {
                error!(url = %context.url, "Network error talking to rendering service: {}", e);
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Rendering service request failed");
            return Err(match status {
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                    SourceError::RequestTimeout
                }
                _ => SourceError::Api {
                    status: status.as_u16(),
                    message,
                },
            }
            .into());
        }

        let body = response.text().await?;
        let output = parse_function_output(&body)?;
        info!(
            mode = ?context.mode,
            candidates = output.candidates.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Extraction finished"
        );
        Ok(output)
    }

    fn articles(&self, url: String, limit: Option<usize>) -> FunctionContext {
        FunctionContext {
            mode: ExtractMode::Articles,
            url,
            limit,
            settle_millis: self.settle_millis,
        }
    }
}

pub(crate) fn parse_function_output(body: &str) -> Result<FunctionOutput, CoreError> {
    serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse extraction output: {}", e);
        CoreError::from(SourceError::InvalidResponse {
            details: e.to_string(),
        })
    })
}

#[async_trait]
impl PostSource for BrowserlessSource {
    fn name(&self) -> &'static str {
        "browserless"
    }

    async fn session_ready(&self) -> Result<bool, CoreError> {
        let context = FunctionContext {
            mode: ExtractMode::Session,
            url: self.page_url("home")?.to_string(),
            limit: None,
            settle_millis: self.settle_millis,
        };
        let output = self.run_function(context).await?;
        Ok(output.logged_in.unwrap_or(false))
    }

    async fn fetch_by_query(
        &self,
        handle: &str,
        keyword: Option<&str>,
        range: QueryDateRange,
    ) -> Result<Vec<Candidate>, CoreError> {
        let url = self.search_url(handle, keyword, range)?;
        info!(handle, url = %url, "Searching");
        let output = self.run_function(self.articles(url, None)).await?;
        Ok(output.candidates)
    }

    async fn fetch_recent(
        &self,
        handle: &str,
        max_count: usize,
    ) -> Result<Vec<Candidate>, CoreError> {
        let url = self.page_url(handle)?.to_string();
        info!(handle, max_count, "Scanning profile");
        let mut candidates = self
            .run_function(self.articles(url, Some(max_count)))
            .await?
            .candidates;
        candidates.truncate(max_count);
        Ok(candidates)
    }

    async fn fetch_post(&self, permalink: &str) -> Result<Option<Candidate>, CoreError> {
        let url = Url::parse(permalink).map_err(|e| CoreError::InvalidInput {
            message: format!("invalid permalink {}: {}", permalink, e),
        })?;
        let output = self
            .run_function(self.articles(url.to_string(), Some(1)))
            .await?;
        Ok(output.candidates.into_iter().next())
    }
}
