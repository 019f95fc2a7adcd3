use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{ResearchError, Result};
use crate::utils::text::dedup_case_insensitive;

/// 未指定关注领域时使用的默认列表
pub const DEFAULT_FOCUS_AREAS: [&str; 7] = [
    "pricing",
    "features",
    "market_position",
    "technology",
    "funding",
    "customer_base",
    "partnerships",
];

/// 调研深度，按 basic < standard < comprehensive 排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchDepth {
    Basic,
    #[default]
    Standard,
    Comprehensive,
}

impl ResearchDepth {
    pub const ALL: [ResearchDepth; 3] = [
        ResearchDepth::Basic,
        ResearchDepth::Standard,
        ResearchDepth::Comprehensive,
    ];

    /// 规划阶段搜索关键词数量的上下界
    pub fn keyword_range(&self) -> RangeInclusive<usize> {
        match self {
            ResearchDepth::Basic => 8..=10,
            ResearchDepth::Standard => 10..=15,
            ResearchDepth::Comprehensive => 15..=25,
        }
    }

    /// 期望识别出的竞争对手数量
    pub fn competitor_target(&self) -> RangeInclusive<usize> {
        match self {
            ResearchDepth::Basic => 3..=5,
            ResearchDepth::Standard => 5..=8,
            ResearchDepth::Comprehensive => 8..=12,
        }
    }

    pub fn focus_area_limit(&self) -> usize {
        match self {
            ResearchDepth::Basic => 4,
            ResearchDepth::Standard => 7,
            ResearchDepth::Comprehensive => 10,
        }
    }

    /// 透传给搜索服务的深度参数
    pub fn search_depth_flag(&self) -> &'static str {
        match self {
            ResearchDepth::Basic => "basic",
            ResearchDepth::Standard | ResearchDepth::Comprehensive => "advanced",
        }
    }

    /// 写入规划prompt的深度说明
    pub fn planning_instruction(&self) -> String {
        let competitors = self.competitor_target();
        let keywords = self.keyword_range();
        let scope = match self {
            ResearchDepth::Basic => "Focus on the main competitors and the most essential information.",
            ResearchDepth::Standard => {
                "Provide a well-rounded analysis including major and emerging competitors."
            }
            ResearchDepth::Comprehensive => {
                "Conduct an exhaustive analysis covering niche players, adjacent markets and detailed positioning."
            }
        };
        format!(
            "{} Aim to identify {}-{} competitors and propose {}-{} distinct search keywords.",
            scope,
            competitors.start(),
            competitors.end(),
            keywords.start(),
            keywords.end()
        )
    }
}

impl std::fmt::Display for ResearchDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchDepth::Basic => write!(f, "basic"),
            ResearchDepth::Standard => write!(f, "standard"),
            ResearchDepth::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

impl std::str::FromStr for ResearchDepth {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ResearchDepth::Basic),
            "standard" => Ok(ResearchDepth::Standard),
            "comprehensive" => Ok(ResearchDepth::Comprehensive),
            other => Err(ResearchError::Validation(format!(
                "unknown research depth '{}', expected basic, standard or comprehensive",
                other
            ))),
        }
    }
}

/// 经过校验的调研请求，创建后不可修改
#[derive(Debug, Clone, Serialize)]
pub struct ResearchQuery {
    topic: String,
    depth: ResearchDepth,
    focus_areas: Vec<String>,
    exclude_competitors: Vec<String>,
    max_results: usize,
}

impl ResearchQuery {
    pub const DEFAULT_MAX_RESULTS: usize = 10;

    pub fn new(topic: &str, depth: ResearchDepth, focus_areas: Vec<String>) -> Result<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ResearchError::Validation(
                "query topic must not be empty".to_string(),
            ));
        }

        let mut focus_areas = dedup_case_insensitive(focus_areas);
        if focus_areas.is_empty() {
            focus_areas = DEFAULT_FOCUS_AREAS.iter().map(|s| s.to_string()).collect();
        }

        Ok(Self {
            topic: topic.to_string(),
            depth,
            focus_areas,
            exclude_competitors: Vec::new(),
            max_results: Self::DEFAULT_MAX_RESULTS,
        })
    }

    /// 从原始字符串解析深度并创建请求
    pub fn parse(topic: &str, depth: &str, focus_areas: Vec<String>) -> Result<Self> {
        Self::new(topic, depth.parse()?, focus_areas)
    }

    pub fn with_exclusions(mut self, exclude_competitors: Vec<String>) -> Self {
        self.exclude_competitors = dedup_case_insensitive(exclude_competitors);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Result<Self> {
        if max_results == 0 {
            return Err(ResearchError::Validation(
                "max results per search must be at least 1".to_string(),
            ));
        }
        self.max_results = max_results;
        Ok(self)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn depth(&self) -> ResearchDepth {
        self.depth
    }

    pub fn focus_areas(&self) -> &[String] {
        &self.focus_areas
    }

    pub fn exclude_competitors(&self) -> &[String] {
        &self.exclude_competitors
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// 名称是否在排除列表中（忽略大小写与首尾空白）
    pub fn is_excluded(&self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        self.exclude_competitors
            .iter()
            .any(|excluded| excluded.to_lowercase() == key)
    }
}
