// 竞品调研多Agent流水线
// Planner（规划）：主题 -> 目标、关键问题、关注领域、搜索关键词、已知竞争对手
// WebSearcher（搜索）：关键词 x 关注领域 -> Tavily搜索 -> CompetitorExtractor提取 -> 合并去重
// GapAnalyzer（缺口）：各关注领域置信度 -> 本地计算数据质量评分
// ResponseCurator（整理）：执行摘要 + 战略分析 + 方法、局限、后续步骤

use crate::error::Result;
use crate::generator::context::GeneratorContext;
use crate::generator::research::orchestrator::ResearchOrchestrator;
use crate::types::query::ResearchQuery;
use crate::types::report::ResearchReport;

pub mod agents;
pub mod orchestrator;
pub mod types;

/// 执行调研阶段
pub async fn execute(context: &GeneratorContext, query: &ResearchQuery) -> Result<ResearchReport> {
    let mut orchestrator = ResearchOrchestrator::new();
    orchestrator.execute_research_pipeline(context, query).await
}
