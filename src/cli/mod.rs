use crate::config::{Config, LLMProvider};
use crate::error::{ResearchError, Result};
use crate::types::query::ResearchQuery;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Competitive Research - 基于多Agent与实时网络搜索的竞品调研引擎
#[derive(Parser, Debug)]
#[command(name = "competitive-research")]
#[command(
    about = "AI-driven competitive research engine. It plans the research, searches the web, profiles competitors, analyzes information gaps and writes a strategic report."
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM Provider (openai, deepseek, anthropic, ollama)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long, global = true)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long, global = true)]
    pub llm_api_base_url: Option<String>,

    /// 高能效模型，优先用于常规的提取任务
    #[arg(long, global = true)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长prompt，以及作为efficient失效情况下的兜底
    #[arg(long, global = true)]
    pub model_powerful: Option<String>,

    /// 温度参数
    #[arg(long, global = true)]
    pub temperature: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 对一个产品领域执行竞品调研
    Research(ResearchArgs),
    /// 检查配置、模型连接和搜索服务
    Validate,
    /// 显示生效的配置（密钥已脱敏）
    Config,
}

#[derive(ClapArgs, Debug)]
pub struct ResearchArgs {
    /// 调研主题，例如 "internal knowledge search tools"
    pub topic: String,

    /// 调研深度 (basic, standard, comprehensive)
    #[arg(short, long)]
    pub depth: Option<String>,

    /// 关注领域，可多次指定
    #[arg(short, long = "focus")]
    pub focus: Vec<String>,

    /// 排除的竞争对手，可多次指定
    #[arg(short, long = "exclude")]
    pub exclude: Vec<String>,

    /// 单次搜索的最大结果数
    #[arg(short, long)]
    pub max_results: Option<usize>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 只在终端展示结果，不保存报告
    #[arg(long)]
    pub no_save: bool,
}

impl ResearchArgs {
    /// 构造调研请求，未指定的参数取配置中的默认值
    pub fn to_query(&self, config: &Config) -> Result<ResearchQuery> {
        let query = match &self.depth {
            Some(depth) => ResearchQuery::parse(&self.topic, depth, self.focus.clone())?,
            None => ResearchQuery::new(
                &self.topic,
                config.research.default_depth,
                self.focus.clone(),
            )?,
        };
        query
            .with_exclusions(self.exclude.clone())
            .with_max_results(self.max_results.unwrap_or(config.search.max_results))
    }
}

impl Args {
    /// 将CLI参数转换为配置：默认值 < 配置文件 < 环境变量 < CLI参数
    pub fn into_config(&self) -> Result<Config> {
        self.into_config_with_env(|key| std::env::var(key).ok())
    }

    pub fn into_config_with_env<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_env(lookup)?;

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            config.llm.provider = provider_str
                .parse::<LLMProvider>()
                .map_err(ResearchError::Configuration)?;
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(model_efficient) = &self.model_efficient {
            config.llm.model_efficient = model_efficient.clone();
        }
        if let Some(model_powerful) = &self.model_powerful {
            config.llm.model_powerful = model_powerful.clone();
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        if let Command::Research(research) = &self.command
            && let Some(output_dir) = &research.output_dir
        {
            config.output.reports_dir = output_dir.clone();
        }

        config.verbose = config.verbose || self.verbose;
        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
