use crate::error::Result;
use crate::generator::context::GeneratorContext;
use crate::generator::research::agents::gap_analyzer::{GapAnalyzer, GapInput};
use crate::generator::research::agents::planner::Planner;
use crate::generator::research::agents::response_curator::{CurationInput, ResponseCurator};
use crate::generator::research::agents::web_searcher::WebSearcher;
use crate::generator::workflow::{TimingKeys, TimingScope};
use crate::types::query::ResearchQuery;
use crate::types::report::{PipelineStage, ResearchReport};

/// 多智能体调研编排器
///
/// 状态机固定为 PLAN -> SEARCH -> ANALYZE_GAPS -> CURATE -> DONE，
/// 任一阶段出现致命错误时进入 ERROR。每个编排器只运行一次。
pub struct ResearchOrchestrator {
    stage: PipelineStage,
    timing: TimingScope,
}

impl Default for ResearchOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResearchOrchestrator {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Plan,
            timing: TimingScope::new(),
        }
    }

    /// 当前所处阶段
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn timing(&self) -> &TimingScope {
        &self.timing
    }

    pub fn into_timing(self) -> TimingScope {
        self.timing
    }

    fn transition(&mut self, next: PipelineStage) {
        tracing::debug!("pipeline stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// 执行所有智能体的分析流程
    pub async fn execute_research_pipeline(
        &mut self,
        context: &GeneratorContext,
        query: &ResearchQuery,
    ) -> Result<ResearchReport> {
        println!("🚀 开始竞品调研: {} ({})", query.topic(), query.depth());

        // 规划
        self.transition(PipelineStage::Plan);
        self.timing.start_phase(TimingKeys::PLAN);
        let plan = match Planner.plan(context, query).await {
            Ok(plan) => plan,
            Err(e) => {
                self.transition(PipelineStage::Error);
                tracing::error!("research planning failed: {}", e);
                return Err(e);
            }
        };
        self.finish_phase(TimingKeys::PLAN);
        println!(
            "✓ 调研计划完成: {} 个关键词，{} 个关注领域",
            plan.search_keywords().len(),
            plan.focus_areas().len()
        );

        // 搜索
        self.transition(PipelineStage::Search);
        self.timing.start_phase(TimingKeys::SEARCH);
        let findings = WebSearcher.execute(context, &plan, query).await;
        self.finish_phase(TimingKeys::SEARCH);
        println!(
            "✓ 网络搜索完成: {} 次搜索，识别 {} 个竞争对手",
            findings.searches_performed,
            findings.competitors.len()
        );

        // 缺口分析
        self.transition(PipelineStage::AnalyzeGaps);
        self.timing.start_phase(TimingKeys::ANALYZE_GAPS);
        let gap_input = GapInput {
            plan: plan.clone(),
            competitors: findings.competitors.clone(),
        };
        let (gap_analysis, gap_issue) = GapAnalyzer.analyze(context, &gap_input).await;
        self.finish_phase(TimingKeys::ANALYZE_GAPS);
        println!("✓ 缺口分析完成，数据质量: {}", gap_analysis.data_quality_score());

        // 整理报告
        self.transition(PipelineStage::Curate);
        self.timing.start_phase(TimingKeys::CURATE);
        let mut issues = findings.issues;
        issues.extend(gap_issue);
        let curation = CurationInput {
            query: query.clone(),
            plan,
            competitors: findings.competitors,
            gap_analysis,
            searches_performed: findings.searches_performed,
            results_analyzed: findings.results_analyzed,
            search_hosts: findings.data_sources,
            issues,
            provider_labels: vec![context.search.name(), context.llm.name()],
        };
        let mut report = ResponseCurator.curate(context, curation).await;
        self.finish_phase(TimingKeys::CURATE);

        report.research_duration_seconds = self
            .timing
            .get_total_duration()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.transition(PipelineStage::Done);

        if report.stage_issues.is_empty() {
            println!("✓ 调研流程执行完毕");
        } else {
            println!(
                "⚠️ 调研流程执行完毕，{} 个环节降级运行",
                report.stage_issues.len()
            );
        }
        Ok(report)
    }

    fn finish_phase(&mut self, phase: &str) {
        if let Some(duration) = self.timing.end_phase(phase) {
            tracing::info!("stage {} finished in {:.2}s", phase, duration.as_secs_f64());
        }
    }
}
