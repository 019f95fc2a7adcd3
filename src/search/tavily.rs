//! Tavily搜索API客户端

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::{ResearchError, Result};
use crate::search::{SearchHit, SearchProvider, SearchRequest};
use crate::utils::text::truncate_chars;

const PROVIDER: &str = "tavily";

/// 写入prompt的摘要最大字符数
pub const SNIPPET_MAX_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct TavilyPayload<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    topic: &'a str,
    max_results: usize,
    include_answer: bool,
}

/// 单次请求的结果：可重试或不可重试
enum AttemptError {
    Retryable(ResearchError),
    Fatal(ResearchError),
}

#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl TavilyClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ResearchError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.config.api_base_url.trim_end_matches('/'))
    }

    async fn attempt(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, AttemptError> {
        let payload = TavilyPayload {
            api_key: &self.config.api_key,
            query: &request.query,
            search_depth: &request.search_depth,
            topic: &self.config.topic,
            max_results: request.max_results,
            include_answer: self.config.include_answer,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AttemptError::Fatal(ResearchError::request(
                PROVIDER,
                format!("invalid or missing API credentials (HTTP {})", status.as_u16()),
            )));
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AttemptError::Retryable(ResearchError::request(
                PROVIDER,
                format!("HTTP {}", status.as_u16()),
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Fatal(ResearchError::request(
                PROVIDER,
                format!("HTTP {}: {}", status.as_u16(), truncate_chars(&body, 200)),
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(parse_results(&body))
    }

    fn transport_error(&self, e: reqwest::Error) -> AttemptError {
        if e.is_timeout() {
            AttemptError::Retryable(ResearchError::timeout(PROVIDER, self.config.timeout_seconds))
        } else if e.is_decode() {
            AttemptError::Fatal(ResearchError::request(
                PROVIDER,
                format!("malformed response body: {}", e),
            ))
        } else {
            AttemptError::Retryable(ResearchError::request(PROVIDER, e.to_string()))
        }
    }
}

/// 宽松解析结果列表，跳过缺少URL等字段的条目
pub fn parse_results(body: &Value) -> Vec<SearchHit> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|entry| {
            let url = entry.get("url")?.as_str()?.trim();
            if url.is_empty() {
                return None;
            }
            let title = entry
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            let snippet = entry
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim();
            Some(SearchHit {
                title,
                url: url.to_string(),
                snippet: truncate_chars(snippet, SNIPPET_MAX_CHARS),
                score: entry.get("score").and_then(Value::as_f64),
            })
        })
        .collect()
}

#[async_trait]
impl SearchProvider for TavilyClient {
    fn name(&self) -> String {
        "Tavily Search API".to_string()
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let max_attempts = self.config.retry_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.attempt(request).await {
                Ok(hits) => {
                    tracing::debug!("🔎 '{}' 返回 {} 条结果", request.query, hits.len());
                    return Ok(hits);
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Retryable(err)) => {
                    tracing::warn!(
                        "搜索 '{}' 失败 (第 {} / {}次尝试): {}",
                        request.query,
                        attempts,
                        max_attempts,
                        err
                    );
                    if attempts >= max_attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }
}
