//! 单元测试使用的可编排服务实现

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::Result;
use crate::generator::context::GeneratorContext;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::search::{SearchHit, SearchProvider, SearchRequest};
use crate::types::competitor::CompetitorInfo;
use crate::types::gap::GapAnalysis;
use crate::types::plan::ResearchPlan;
use crate::types::query::{ResearchDepth, ResearchQuery};
use crate::types::report::{ReportStatus, ResearchReport, StrategicAnalysis};
use chrono::TimeZone;
use std::collections::BTreeMap;

/// 由闭包决定回复的语言模型
pub struct FnModel<F> {
    respond: F,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl<F> FnModel<F>
where
    F: Fn(&CompletionRequest) -> Result<String> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls_for(&self, log_tag: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.log_tag == log_tag)
            .count()
    }
}

#[async_trait]
impl<F> LanguageModel for FnModel<F>
where
    F: Fn(&CompletionRequest) -> Result<String> + Send + Sync,
{
    fn name(&self) -> String {
        "scripted-model".to_string()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

/// 由闭包决定结果的搜索服务
pub struct FnSearch<F> {
    respond: F,
    pub queries: Mutex<Vec<String>>,
}

impl<F> FnSearch<F>
where
    F: Fn(&SearchRequest) -> Result<Vec<SearchHit>> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<F> SearchProvider for FnSearch<F>
where
    F: Fn(&SearchRequest) -> Result<Vec<SearchHit>> + Send + Sync,
{
    fn name(&self) -> String {
        "Scripted Search".to_string()
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(request.query.clone());
        (self.respond)(request)
    }
}

pub fn hit(title: &str, url: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: url.to_string(),
        snippet: format!("{} overview", title),
        score: Some(0.8),
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.llm.api_key = "sk-test".to_string();
    config.search.api_key = "tvly-test".to_string();
    config
}

pub fn context_with(
    config: Config,
    llm: Arc<dyn LanguageModel>,
    search: Arc<dyn SearchProvider>,
) -> GeneratorContext {
    GeneratorContext::with_providers(config, llm, search)
}

/// 渲染与存储测试共用的报告
pub fn sample_report() -> ResearchReport {
    ResearchReport {
        run_id: uuid::Uuid::nil(),
        query: ResearchQuery::new("team chat", ResearchDepth::Standard, vec![]).unwrap(),
        plan: ResearchPlan::new(
            "Map the team chat market".into(),
            vec!["Who leads?".into()],
            vec!["pricing".into(), "market_position".into()],
            vec!["team chat apps".into()],
            vec![],
            false,
        ),
        competitors: vec![
            CompetitorInfo {
                name: "Slack".into(),
                website: Some("https://slack.com".into()),
                key_features: vec!["Channels".into(), "Huddles".into()],
                pricing_info: Some(BTreeMap::from([("Pro".into(), "$8.75/user".into())])),
                sources: vec!["https://slack.com/pricing".into()],
                ..Default::default()
            },
            CompetitorInfo {
                name: "Mattermost".into(),
                ..Default::default()
            },
        ],
        gap_analysis: GapAnalysis::new(
            BTreeMap::from([("pricing".into(), 80.0), ("market_position".into(), 60.0)]),
            vec!["Enterprise discounts".into()],
            vec![],
            vec!["slack enterprise pricing".into()],
        )
        .unwrap(),
        executive_summary: "Slack leads the market.\n\n# Not a heading\nSecond line\n===".into(),
        strategic_analysis: StrategicAnalysis {
            market_opportunities: vec!["Self-hosted SMB".into()],
            competitive_advantages: vec!["Ecosystem".into()],
            threats_and_risks: vec!["## Bundling".into()],
            strategic_recommendations: vec!["Focus on compliance".into()],
            feature_gaps: vec!["Offline mode".into()],
            ..Default::default()
        },
        methodology: "Multi-agent pipeline.".into(),
        limitations: vec!["Public sources only".into()],
        next_steps: vec!["Validate findings".into()],
        data_sources: vec!["slack.com".into()],
        stage_issues: vec![],
        status: ReportStatus::Complete,
        generated_at: chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        total_searches_performed: 12,
        search_results_analyzed: 96,
        research_duration_seconds: 42.5,
    }
}
