use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::generator::context::GeneratorContext;
use crate::generator::research::types::AgentType;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::types::competitor::CompetitorInfo;
use crate::types::gap::GapAnalysis;
use crate::types::plan::ResearchPlan;
use crate::types::report::{PipelineStage, StageIssue};

#[derive(Debug, Clone)]
pub struct GapInput {
    pub plan: ResearchPlan,
    pub competitors: Vec<CompetitorInfo>,
}

/// 模型需要返回的缺口分析草稿
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GapDraft {
    /// Confidence (0-100) that the collected data covers each focus area
    pub confidence_levels: BTreeMap<String, f64>,
    /// The most important information gaps, highest priority first
    #[serde(default)]
    pub priority_gaps: Vec<String>,
    /// Critical information that could not be found
    #[serde(default)]
    pub missing_information: Vec<String>,
    /// Follow-up search queries that would close the gaps
    #[serde(default)]
    pub suggested_queries: Vec<String>,
}

/// 缺口分析员 - 评估数据完整度并给出后续调研建议
#[derive(Default)]
pub struct GapAnalyzer;

impl StepForwardAgent for GapAnalyzer {
    type Input = GapInput;
    type Draft = GapDraft;
    type Output = GapAnalysis;

    fn agent_type(&self) -> AgentType {
        AgentType::GapAnalyzer
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a research quality reviewer. You assess how completely the
collected competitor data answers the research plan, and you point out what
is missing before the findings are turned into a report."#
                .to_string(),
            opening_instruction: "Assess the completeness of the following research data:"
                .to_string(),
            closing_instruction: r#"Requirements:
- Provide one confidence level between 0 and 100 for every focus area
- Base confidence on the evidence listed, not on general knowledge"#
                .to_string(),
        }
    }

    fn provide_material(&self, input: &GapInput) -> String {
        let plan = &input.plan;
        let mut material = format!("Objective: {}\n", plan.objective());
        material.push_str(&format!("Focus areas: {}\n", plan.focus_areas().join(", ")));
        if !plan.key_questions().is_empty() {
            material.push_str("Key questions:\n");
            for question in plan.key_questions() {
                material.push_str(&format!("- {}\n", question));
            }
        }

        material.push_str(&format!("\nCompetitors found: {}\n", input.competitors.len()));
        for competitor in &input.competitors {
            material.push_str(&format!(
                "- {} (profile completeness {:.0}%): products [{}], features [{}], pricing {}, target market {}, position {}\n",
                competitor.name,
                competitor.completeness(),
                competitor.products.join(", "),
                competitor.key_features.join(", "),
                if competitor.pricing_info.is_some() { "known" } else { "unknown" },
                competitor.target_market.as_deref().unwrap_or("unknown"),
                competitor.market_position.as_deref().unwrap_or("unknown"),
            ));
        }
        material
    }

    fn post_process(&self, draft: GapDraft, _input: &GapInput) -> Result<GapAnalysis> {
        GapAnalysis::new(
            draft.confidence_levels,
            draft.priority_gaps,
            draft.missing_information,
            draft.suggested_queries,
        )
    }
}

impl GapAnalyzer {
    /// 失败不中断流水线，降级为不可用的分析结果
    pub async fn analyze(&self, context: &GeneratorContext, input: &GapInput) -> (GapAnalysis, Option<StageIssue>) {
        match self.execute(context, input).await {
            Ok(analysis) => (analysis, None),
            Err(e) => {
                println!("   ⚠️ 缺口分析失败，继续生成报告: {}", e);
                let issue = StageIssue::new(PipelineStage::AnalyzeGaps, "gap analysis", e.to_string());
                (GapAnalysis::unavailable(&e.to_string()), Some(issue))
            }
        }
    }
}
