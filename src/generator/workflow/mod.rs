use crate::config::Config;
use crate::error::Result;
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{self, SavedReport};
use crate::generator::research::orchestrator::ResearchOrchestrator;
use crate::llm::client::LLMClient;
use crate::search::{SearchProvider, SearchRequest, TavilyClient};
use crate::types::query::ResearchQuery;
use crate::types::report::ResearchReport;

use std::collections::HashMap;
use std::time::Duration;

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Option<std::time::Instant>,
    phase_start_times: HashMap<String, std::time::Instant>,
    phase_durations: HashMap<String, Duration>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Some(std::time::Instant::now()),
            phase_start_times: HashMap::new(),
            phase_durations: HashMap::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), std::time::Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations
            .insert(phase_name.to_string(), duration);
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Option<Duration> {
        self.start_time.map(|start| start.elapsed())
    }

    /// 获取所有阶段的执行时间
    pub fn get_phase_durations(&self) -> &HashMap<String, Duration> {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告，阶段按流水线顺序排列
    pub fn generate_timing_report(&self) -> String {
        let mut report = String::new();

        if let Some(total_duration) = self.get_total_duration() {
            report.push_str(&format!(
                "总执行时间: {:.2}秒\n",
                total_duration.as_secs_f64()
            ));
        }

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for phase in TimingKeys::get_all_phase_keys() {
                if let Some(duration) = self.phase_durations.get(phase) {
                    report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
                }
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const PLAN: &'static str = "plan";
    pub const SEARCH: &'static str = "search";
    pub const ANALYZE_GAPS: &'static str = "analyze_gaps";
    pub const CURATE: &'static str = "curate";
    pub const OUTPUT: &'static str = "output";

    /// 获取所有阶段的键列表
    pub fn get_all_phase_keys() -> Vec<&'static str> {
        vec![
            Self::PLAN,
            Self::SEARCH,
            Self::ANALYZE_GAPS,
            Self::CURATE,
            Self::OUTPUT,
        ]
    }
}

/// 一次调研运行的结果
#[derive(Debug)]
pub struct LaunchOutcome {
    pub report: ResearchReport,
    /// `--no-save` 时为None
    pub saved: Option<SavedReport>,
    pub timing_report: String,
}

/// 启动竞品调研工作流
pub async fn launch(config: &Config, query: &ResearchQuery, save: bool) -> Result<LaunchOutcome> {
    config.validate()?;
    let context = GeneratorContext::new(config.clone())?;
    run(&context, query, save).await
}

/// 在给定的服务上执行调研并按需保存报告
pub async fn run(context: &GeneratorContext, query: &ResearchQuery, save: bool) -> Result<LaunchOutcome> {
    let mut orchestrator = ResearchOrchestrator::new();
    let report = orchestrator.execute_research_pipeline(context, query).await?;

    let mut timing = orchestrator.into_timing();
    let saved = if save {
        timing.start_phase(TimingKeys::OUTPUT);
        let saved = outlet::save(&context.config.output, &report).await?;
        timing.end_phase(TimingKeys::OUTPUT);
        Some(saved)
    } else {
        None
    };

    let timing_report = timing.generate_timing_report();
    tracing::debug!("{}", timing_report);

    Ok(LaunchOutcome {
        report,
        saved,
        timing_report,
    })
}

/// 单项系统检查的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SystemCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl SystemCheck {
    fn from_result(name: &str, result: Result<String>) -> Self {
        match result {
            Ok(detail) => Self {
                name: name.to_string(),
                passed: true,
                detail,
            },
            Err(e) => Self {
                name: name.to_string(),
                passed: false,
                detail: e.to_string(),
            },
        }
    }
}

/// 检查配置、模型连接和搜索服务
pub async fn validate_system(config: &Config) -> Vec<SystemCheck> {
    let mut checks = vec![SystemCheck::from_result(
        "Configuration",
        config.validate().map(|_| "all required settings present".to_string()),
    )];
    if !checks[0].passed {
        return checks;
    }

    let llm_result = match LLMClient::new(config.clone()) {
        Ok(client) => client
            .check_connection()
            .await
            .map(|_| format!("{} responded", config.llm.model_efficient)),
        Err(e) => Err(e),
    };
    checks.push(SystemCheck::from_result("Language Model", llm_result));

    let search_result = match TavilyClient::new(&config.search) {
        Ok(client) => {
            let request = SearchRequest {
                query: "competitive analysis".to_string(),
                max_results: 1,
                search_depth: "basic".to_string(),
            };
            client
                .search(&request)
                .await
                .map(|hits| format!("{} returned {} results", client.name(), hits.len()))
        }
        Err(e) => Err(e),
    };
    checks.push(SystemCheck::from_result("Web Search", search_result));

    checks
}

// Include tests
#[cfg(test)]
mod tests;
