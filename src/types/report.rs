use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::competitor::CompetitorInfo;
use crate::types::gap::GapAnalysis;
use crate::types::plan::ResearchPlan;
use crate::types::query::ResearchQuery;

/// 编排器状态机的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Plan,
    Search,
    AnalyzeGaps,
    Curate,
    Done,
    Error,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Plan => write!(f, "plan"),
            PipelineStage::Search => write!(f, "search"),
            PipelineStage::AnalyzeGaps => write!(f, "analyze_gaps"),
            PipelineStage::Curate => write!(f, "curate"),
            PipelineStage::Done => write!(f, "done"),
            PipelineStage::Error => write!(f, "error"),
        }
    }
}

/// 某个阶段中未致命的失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageIssue {
    pub stage: PipelineStage,
    /// 出错的工作单元，比如搜索语句
    pub subject: String,
    pub message: String,
}

impl StageIssue {
    pub fn new(stage: PipelineStage, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StageIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.subject, self.message)
    }
}

/// 战略分析，前四项为必填列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrategicAnalysis {
    /// Untapped market opportunities
    pub market_opportunities: Vec<String>,
    /// Advantages the researched market leaders hold
    pub competitive_advantages: Vec<String>,
    /// Threats and risks for a new entrant
    pub threats_and_risks: Vec<String>,
    /// Actionable strategic recommendations
    pub strategic_recommendations: Vec<String>,
    /// Positioning suggestions
    #[serde(default)]
    pub positioning_suggestions: Vec<String>,
    /// Feature gaps observed across competitors
    #[serde(default)]
    pub feature_gaps: Vec<String>,
    /// Observations on pricing strategies
    #[serde(default)]
    pub pricing_insights: Vec<String>,
}

impl StrategicAnalysis {
    pub fn is_empty(&self) -> bool {
        self.market_opportunities.is_empty()
            && self.competitive_advantages.is_empty()
            && self.threats_and_risks.is_empty()
            && self.strategic_recommendations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Complete,
    /// 至少一个阶段降级运行
    Degraded,
}

/// 调研流水线的最终产物
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub run_id: Uuid,
    pub query: ResearchQuery,
    pub plan: ResearchPlan,
    pub competitors: Vec<CompetitorInfo>,
    pub gap_analysis: GapAnalysis,
    pub executive_summary: String,
    pub strategic_analysis: StrategicAnalysis,
    pub methodology: String,
    pub limitations: Vec<String>,
    pub next_steps: Vec<String>,
    pub data_sources: Vec<String>,
    pub stage_issues: Vec<StageIssue>,
    pub status: ReportStatus,
    pub generated_at: DateTime<Utc>,
    pub total_searches_performed: usize,
    pub search_results_analyzed: usize,
    pub research_duration_seconds: f64,
}
