//! 网络搜索接入层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod tavily;

pub use tavily::TavilyClient;

/// 一次搜索请求
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    /// basic 或 advanced
    pub search_depth: String,
}

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: Option<f64>,
}

impl SearchHit {
    /// URL中的主机名，解析失败时返回None
    pub fn host(&self) -> Option<String> {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.trim_start_matches("www.").to_string()))
    }
}

/// 搜索服务的抽象
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> String;

    /// 返回按相关度排序的结果，空结果是合法的
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_host() {
        let hit = SearchHit {
            title: "Glean".into(),
            url: "https://www.glean.com/pricing?plan=pro".into(),
            snippet: String::new(),
            score: None,
        };
        assert_eq!(hit.host().as_deref(), Some("glean.com"));

        let hit = SearchHit {
            url: "not a url".into(),
            ..hit
        };
        assert_eq!(hit.host(), None);
    }
}
