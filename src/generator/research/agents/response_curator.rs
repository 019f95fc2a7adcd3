use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ResearchError, Result};
use crate::generator::context::GeneratorContext;
use crate::generator::research::types::AgentType;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::types::competitor::CompetitorInfo;
use crate::types::gap::GapAnalysis;
use crate::types::plan::ResearchPlan;
use crate::types::query::ResearchQuery;
use crate::types::report::{
    PipelineStage, ReportStatus, ResearchReport, StageIssue, StrategicAnalysis,
};

/// 低于该置信度的关注领域写入局限性说明
const LOW_CONFIDENCE_THRESHOLD: f64 = 60.0;
/// 低于该质量分时写入局限性说明
const QUALITY_WARNING_THRESHOLD: f64 = 70.0;
const MAX_NEXT_STEPS: usize = 6;

/// 生成报告所需的全部材料
#[derive(Debug, Clone)]
pub struct CurationInput {
    pub query: ResearchQuery,
    pub plan: ResearchPlan,
    pub competitors: Vec<CompetitorInfo>,
    pub gap_analysis: GapAnalysis,
    pub searches_performed: usize,
    pub results_analyzed: usize,
    /// 搜索结果的主机名
    pub search_hosts: Vec<String>,
    /// 此前各阶段记录的问题
    pub issues: Vec<StageIssue>,
    /// 数据来源中列出的服务名称
    pub provider_labels: Vec<String>,
}

/// 模型需要返回的综合分析
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SynthesisDraft {
    /// Two to three paragraph executive summary for decision makers
    pub executive_summary: String,
    /// Untapped market opportunities
    pub market_opportunities: Vec<String>,
    /// Advantages the market leaders hold
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

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub executive_summary: String,
    pub strategic_analysis: StrategicAnalysis,
}

/// 报告整理员 - 综合各阶段结果生成最终报告
#[derive(Default)]
pub struct ResponseCurator;

impl StepForwardAgent for ResponseCurator {
    type Input = CurationInput;
    type Draft = SynthesisDraft;
    type Output = Synthesis;

    fn agent_type(&self) -> AgentType {
        AgentType::ResponseCurator
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a strategy consultant writing the synthesis of a competitive
research report for executives. Be concise, strategic and actionable, and
ground every statement in the research data you are given."#
                .to_string(),
            opening_instruction: "Synthesize the following competitive research findings:"
                .to_string(),
            closing_instruction: r#"Requirements:
- The executive summary covers what was researched, the landscape and the strategic implications
- Write plain paragraphs and list items without markdown headings
- Every list item is one self-contained sentence"#
                .to_string(),
        }
    }

    fn provide_material(&self, input: &CurationInput) -> String {
        let mut material = format!(
            "Research query: {}\nDepth: {}\nObjective: {}\nFocus areas: {}\n",
            input.query.topic(),
            input.query.depth(),
            input.plan.objective(),
            input.plan.focus_areas().join(", ")
        );
        material.push_str(&format!(
            "Data quality: {}\n",
            input.gap_analysis.data_quality_score()
        ));

        material.push_str(&format!("\nCompetitors ({}):\n", input.competitors.len()));
        for competitor in &input.competitors {
            material.push_str(&format!("- {}", competitor.name));
            if let Some(description) = &competitor.description {
                material.push_str(&format!(": {}", description));
            }
            material.push('\n');
            if !competitor.products.is_empty() {
                material.push_str(&format!("  Products: {}\n", competitor.products.join(", ")));
            }
            if !competitor.key_features.is_empty() {
                material.push_str(&format!("  Features: {}\n", competitor.key_features.join(", ")));
            }
            if let Some(position) = &competitor.market_position {
                material.push_str(&format!("  Position: {}\n", position));
            }
            if let Some(pricing) = &competitor.pricing_info {
                let tiers: Vec<String> = pricing.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                material.push_str(&format!("  Pricing: {}\n", tiers.join("; ")));
            }
        }

        if !input.gap_analysis.priority_gaps().is_empty() {
            material.push_str("\nKnown information gaps:\n");
            for gap in input.gap_analysis.priority_gaps() {
                material.push_str(&format!("- {}\n", gap));
            }
        }
        material
    }

    fn post_process(&self, draft: SynthesisDraft, _input: &CurationInput) -> Result<Synthesis> {
        let executive_summary = draft.executive_summary.trim().to_string();
        if executive_summary.is_empty() {
            return Err(ResearchError::Extraction(
                "synthesis is missing the executive summary".to_string(),
            ));
        }
        let clean = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Ok(Synthesis {
            executive_summary,
            strategic_analysis: StrategicAnalysis {
                market_opportunities: clean(draft.market_opportunities),
                competitive_advantages: clean(draft.competitive_advantages),
                threats_and_risks: clean(draft.threats_and_risks),
                strategic_recommendations: clean(draft.strategic_recommendations),
                positioning_suggestions: clean(draft.positioning_suggestions),
                feature_gaps: clean(draft.feature_gaps),
                pricing_insights: clean(draft.pricing_insights),
            },
        })
    }
}

impl ResponseCurator {
    /// 生成报告；综合分析失败时退化为仅模板内容的报告
    pub async fn curate(&self, context: &GeneratorContext, input: CurationInput) -> ResearchReport {
        let mut issues = input.issues.clone();

        let synthesis = match self.execute(context, &input).await {
            Ok(synthesis) => synthesis,
            Err(e) => {
                println!("   ⚠️ 综合分析失败，生成仅含模板内容的报告: {}", e);
                issues.push(StageIssue::new(
                    PipelineStage::Curate,
                    "report synthesis",
                    e.to_string(),
                ));
                Synthesis {
                    executive_summary: fallback_summary(&input),
                    strategic_analysis: StrategicAnalysis::default(),
                }
            }
        };

        let status = if issues.is_empty() {
            ReportStatus::Complete
        } else {
            ReportStatus::Degraded
        };
        let data_sources = if context.config.output.include_citations {
            build_data_sources(&input.search_hosts, &input.provider_labels)
        } else {
            Vec::new()
        };

        ResearchReport {
            run_id: Uuid::new_v4(),
            methodology: build_methodology(&input),
            limitations: build_limitations(&input.gap_analysis, &issues),
            next_steps: build_next_steps(&input.gap_analysis, &synthesis.strategic_analysis),
            data_sources,
            executive_summary: synthesis.executive_summary,
            strategic_analysis: synthesis.strategic_analysis,
            stage_issues: issues,
            status,
            generated_at: Utc::now(),
            total_searches_performed: input.searches_performed,
            search_results_analyzed: input.results_analyzed,
            research_duration_seconds: 0.0,
            query: input.query,
            plan: input.plan,
            competitors: input.competitors,
            gap_analysis: input.gap_analysis,
        }
    }
}

/// 不依赖模型的执行摘要
pub fn fallback_summary(input: &CurationInput) -> String {
    let names: Vec<&str> = input
        .competitors
        .iter()
        .take(5)
        .map(|c| c.name.as_str())
        .collect();
    let landscape = if names.is_empty() {
        "No competitors could be identified from the collected search results.".to_string()
    } else {
        format!(
            "{} competitors were identified, including {}.",
            input.competitors.len(),
            names.join(", ")
        )
    };
    format!(
        "This report analyzes the competitive landscape for \"{}\" at {} depth. {} Data quality: {}.\n\nAn automated narrative synthesis was not available for this run, so the sections below are compiled directly from the collected research data.",
        input.query.topic(),
        input.query.depth(),
        landscape,
        input.gap_analysis.data_quality_score()
    )
}

pub fn build_methodology(input: &CurationInput) -> String {
    let plan = &input.plan;
    let planning = if plan.is_fallback() {
        "Deterministic research planning derived from the query topic"
    } else {
        "Strategic research planning based on the research query"
    };
    format!(
        "This competitive research employed a multi-agent pipeline combining large language model analysis with live web search.\n\n\
**Research Process:**\n\
1. {}\n\
2. Systematic web search using {} keywords across {} focus areas\n\
3. Automated data extraction and competitor profiling\n\
4. Gap analysis to identify missing information\n\
5. Synthesis of findings into strategic insights\n\n\
**Data Collection:**\n\
- {} searches executed\n\
- {} search results analyzed\n\
- Focus areas: {}\n\
- Search depth: {}",
        planning,
        plan.search_keywords().len(),
        plan.focus_areas().len(),
        input.searches_performed,
        input.results_analyzed,
        plan.focus_areas().join(", "),
        input.query.depth().search_depth_flag()
    )
}

pub fn build_limitations(gap: &GapAnalysis, issues: &[StageIssue]) -> Vec<String> {
    let mut limitations = Vec::new();

    if let Some(score) = gap.data_quality_score().value()
        && score < QUALITY_WARNING_THRESHOLD
    {
        limitations.push(format!(
            "Data quality score of {:.1}/100 indicates some information gaps",
            score
        ));
    }
    if !gap.missing_information().is_empty() {
        limitations.push(format!(
            "Missing critical information in {} areas",
            gap.missing_information().len()
        ));
    }
    let low = gap.low_confidence_areas(LOW_CONFIDENCE_THRESHOLD);
    if !low.is_empty() {
        limitations.push(format!("Lower confidence in data for: {}", low.join(", ")));
    }

    for issue in issues {
        let line = match issue.stage {
            PipelineStage::Search => format!("Search for \"{}\" failed: {}", issue.subject, issue.message),
            _ => format!("Stage {} degraded ({}): {}", issue.stage, issue.subject, issue.message),
        };
        limitations.push(line);
    }

    limitations.extend([
        "Information accuracy depends on publicly available sources".to_string(),
        "Market conditions and competitor data are subject to rapid change".to_string(),
        "Some proprietary information is not accessible through public research".to_string(),
    ]);
    limitations
}

pub fn build_next_steps(gap: &GapAnalysis, analysis: &StrategicAnalysis) -> Vec<String> {
    let mut next_steps = Vec::new();

    if !gap.suggested_queries().is_empty() {
        next_steps.push("Conduct additional research using the suggested follow-up queries".to_string());
    }
    if !gap.priority_gaps().is_empty() {
        next_steps.push("Address priority information gaps for a more complete analysis".to_string());
    }
    if !analysis.strategic_recommendations.is_empty() {
        next_steps.push("Implement the strategic recommendations from this analysis".to_string());
    }
    next_steps.extend([
        "Monitor competitor activities and market developments continuously".to_string(),
        "Validate findings through direct market research or customer interviews".to_string(),
        "Develop detailed competitive response strategies".to_string(),
        "Schedule regular competitive intelligence updates".to_string(),
    ]);
    next_steps.truncate(MAX_NEXT_STEPS);
    next_steps
}

/// 搜索结果主机名加上服务名称，排序去重
pub fn build_data_sources(hosts: &[String], provider_labels: &[String]) -> Vec<String> {
    let mut sources: Vec<String> = hosts.iter().chain(provider_labels).cloned().collect();
    sources.sort();
    sources.dedup();
    sources
}
