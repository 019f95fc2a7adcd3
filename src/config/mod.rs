use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{ResearchError, Result};
use crate::types::query::ResearchDepth;

/// 未显式指定时尝试读取的配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "research.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 是否需要API KEY
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// LLM模型配置
    pub llm: LLMConfig,

    /// 网络搜索服务配置
    pub search: SearchConfig,

    /// 调研流程配置
    pub research: ResearchConfig,

    /// 报告输出配置
    pub output: OutputConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，优先用于常规的提取任务
    pub model_efficient: String,

    /// 高质量模型，用于长prompt，以及作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// 网络搜索服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,

    pub api_base_url: String,

    /// 单次搜索返回的最大结果数
    pub max_results: usize,

    /// 搜索主题，general 或 news
    pub topic: String,

    /// 是否让搜索服务附带摘要答案
    pub include_answer: bool,

    pub timeout_seconds: u64,

    pub retry_attempts: u32,

    pub retry_delay_ms: u64,
}

/// 调研流程配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ResearchConfig {
    /// CLI未指定时的调研深度
    pub default_depth: ResearchDepth,

    /// 为true时规划失败直接终止；为false时退回确定性规划
    pub strict_planning: bool,

    /// 搜索阶段的最大并发数
    pub max_concurrent_searches: usize,
}

/// 报告输出配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub reports_dir: PathBuf,

    /// 报告中是否列出数据来源
    pub include_citations: bool,

    /// 是否同时保存JSON数据
    pub save_json: bool,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ResearchError::Configuration(format!("Failed to open config file {:?}: {}", path, e))
        })?;
        let mut content = String::new();
        file.read_to_string(&mut content).map_err(|e| {
            ResearchError::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ResearchError::Configuration(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// 按 显式路径 > 当前目录默认文件 > 默认值 的顺序加载
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_config_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);

        if default_config_path.exists() {
            Self::from_file(&default_config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// 用环境变量覆盖配置。`lookup`通常为`std::env::var(..).ok()`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("RESEARCH_LLM_PROVIDER") {
            self.llm.provider = provider
                .parse()
                .map_err(ResearchError::Configuration)?;
        }
        if let Some(key) = get("RESEARCH_LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(url) = get("RESEARCH_LLM_BASE_URL") {
            self.llm.api_base_url = url;
        }
        if let Some(model) = get("RESEARCH_LLM_MODEL") {
            self.llm.model_efficient = model;
        }
        if let Some(key) = get("TAVILY_API_KEY") {
            self.search.api_key = key;
        }
        if let Some(value) = get("MAX_SEARCH_RESULTS") {
            self.search.max_results = parse_env("MAX_SEARCH_RESULTS", &value)?;
        }
        if let Some(value) = get("REQUEST_TIMEOUT") {
            self.search.timeout_seconds = parse_env("REQUEST_TIMEOUT", &value)?;
        }
        if let Some(value) = get("MAX_CONCURRENT_SEARCHES") {
            self.research.max_concurrent_searches = parse_env("MAX_CONCURRENT_SEARCHES", &value)?;
        }
        if let Some(value) = get("INCLUDE_CITATIONS") {
            self.output.include_citations = parse_env("INCLUDE_CITATIONS", &value.to_lowercase())?;
        }
        if let Some(dir) = get("RESEARCH_REPORTS_DIR") {
            self.output.reports_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// 运行前的配置校验
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider.requires_api_key() && self.llm.api_key.trim().is_empty() {
            return Err(ResearchError::Configuration(format!(
                "missing API key for LLM provider '{}' (set RESEARCH_LLM_API_KEY or OPENAI_API_KEY)",
                self.llm.provider
            )));
        }
        if self.llm.model_efficient.trim().is_empty() {
            return Err(ResearchError::Configuration(
                "llm.model_efficient must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ResearchError::Configuration(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.search.api_key.trim().is_empty() {
            return Err(ResearchError::Configuration(
                "missing search API key (set TAVILY_API_KEY)".to_string(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ResearchError::Configuration(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        if self.research.max_concurrent_searches == 0 {
            return Err(ResearchError::Configuration(
                "research.max_concurrent_searches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 默认日志过滤指令，RUST_LOG未设置时使用
    pub fn log_directive(&self) -> String {
        let level = if self.verbose { "debug" } else { "info" };
        format!("competitive_research={},warn", level)
    }

    /// 用于展示的配置摘要，密钥已脱敏
    pub fn summary(&self) -> ConfigSummary {
        let entries = vec![
            ("LLM Provider", self.llm.provider.to_string()),
            ("LLM API Key", mask_secret(&self.llm.api_key)),
            ("LLM Base URL", self.llm.api_base_url.clone()),
            ("Model (efficient)", self.llm.model_efficient.clone()),
            ("Model (powerful)", self.llm.model_powerful.clone()),
            ("Temperature", self.llm.temperature.to_string()),
            ("Search API Key", mask_secret(&self.search.api_key)),
            ("Search Base URL", self.search.api_base_url.clone()),
            ("Max Search Results", self.search.max_results.to_string()),
            ("Search Topic", self.search.topic.clone()),
            ("Request Timeout", format!("{}s", self.search.timeout_seconds)),
            ("Default Depth", self.research.default_depth.to_string()),
            ("Strict Planning", self.research.strict_planning.to_string()),
            (
                "Max Concurrent Searches",
                self.research.max_concurrent_searches.to_string(),
            ),
            ("Reports Directory", self.output.reports_dir.display().to_string()),
            ("Include Citations", self.output.include_citations.to_string()),
            ("Save JSON", self.output.save_json.to_string()),
        ];

        ConfigSummary {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ResearchError::Configuration(format!("invalid value '{}' for {}", value, key))
    })
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "❌ Missing".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("✅ {}****", prefix)
}

/// 配置摘要
#[derive(Debug, Clone)]
pub struct ConfigSummary {
    pub entries: Vec<(String, String)>,
}

impl std::fmt::Display for ConfigSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &self.entries {
            writeln!(f, "  {:<width$}  {}", key, value, width = width)?;
        }
        Ok(())
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model_efficient: String::from("gpt-4o-mini"),
            model_powerful: String::from("gpt-4o"),
            max_tokens: 8192,
            temperature: 0.2,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: String::from("https://api.tavily.com"),
            max_results: 10,
            topic: String::from("general"),
            include_answer: true,
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            default_depth: ResearchDepth::Standard,
            strict_planning: true,
            max_concurrent_searches: 3,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            include_citations: true,
            save_json: true,
        }
    }
}
