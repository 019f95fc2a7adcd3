use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::{ResearchError, Result};
use crate::generator::context::GeneratorContext;
use crate::generator::research::types::AgentType;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::types::plan::ResearchPlan;
use crate::types::query::{ResearchDepth, ResearchQuery};
use crate::utils::text::dedup_case_insensitive;

/// 关键词不足下限时用于补齐的后缀
const PADDING_SUFFIXES: [&str; 16] = [
    "competitors",
    "alternatives",
    "pricing",
    "market leaders",
    "top companies",
    "comparison",
    "reviews",
    "market share",
    "startups",
    "enterprise solutions",
    "features comparison",
    "industry analysis",
    "funding",
    "customer reviews",
    "vs",
    "open source alternatives",
];

/// 模型需要返回的调研计划草稿
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlanDraft {
    /// One sentence describing what the research must find out
    pub objective: String,
    /// Questions the research has to answer
    pub key_questions: Vec<String>,
    /// Aspects of the competitors to investigate
    pub focus_areas: Vec<String>,
    /// Distinct web search keywords
    pub search_keywords: Vec<String>,
    /// Specific companies already known to compete in this space
    #[serde(default)]
    pub competitor_names: Vec<String>,
}

/// 调研规划员 - 将用户问题拆解为关键词、关注领域与关键问题
#[derive(Default)]
pub struct Planner;

impl StepForwardAgent for Planner {
    type Input = ResearchQuery;
    type Draft = PlanDraft;
    type Output = ResearchPlan;

    fn agent_type(&self) -> AgentType {
        AgentType::Planner
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a senior competitive intelligence analyst.
Your job is to turn a research request into an actionable research plan:
a clear objective, the key questions to answer, the focus areas to investigate
and a list of distinct web search keywords that will surface competitors and
their products, pricing and positioning."#
                .to_string(),
            opening_instruction: "Create a competitive research plan for the following request:"
                .to_string(),
            closing_instruction: r#"Requirements:
- Keywords must be distinct, specific and directly usable as web search queries
- Include keywords that reveal competitor names, pricing pages and comparisons
- Never plan research on the excluded competitors"#
                .to_string(),
        }
    }

    fn provide_material(&self, query: &ResearchQuery) -> String {
        let mut material = format!(
            "Topic: {}\nDepth: {}\nDepth guidance: {}\nFocus areas: {}\n",
            query.topic(),
            query.depth(),
            query.depth().planning_instruction(),
            query.focus_areas().join(", ")
        );
        if !query.exclude_competitors().is_empty() {
            material.push_str(&format!(
                "Excluded competitors: {}\n",
                query.exclude_competitors().join(", ")
            ));
        }
        material
    }

    fn post_process(&self, draft: PlanDraft, query: &ResearchQuery) -> Result<ResearchPlan> {
        let objective = draft.objective.trim().to_string();
        if objective.is_empty() {
            return Err(ResearchError::Extraction(
                "research plan is missing an objective".to_string(),
            ));
        }
        if dedup_case_insensitive(&draft.search_keywords).is_empty() {
            return Err(ResearchError::Extraction(
                "research plan contains no search keywords".to_string(),
            ));
        }

        let focus_areas = bound_focus_areas(query, &draft.focus_areas);
        let search_keywords = bound_keywords(
            query.topic(),
            &draft.search_keywords,
            &focus_areas,
            query.depth(),
        );
        let competitor_names = dedup_case_insensitive(draft.competitor_names)
            .into_iter()
            .filter(|name| !query.is_excluded(name))
            .collect();

        Ok(ResearchPlan::new(
            objective,
            dedup_case_insensitive(draft.key_questions),
            focus_areas,
            search_keywords,
            competitor_names,
            false,
        ))
    }
}

impl Planner {
    /// 生成调研计划。严格模式之外，模型输出无法解析时退回确定性计划
    pub async fn plan(&self, context: &GeneratorContext, query: &ResearchQuery) -> Result<ResearchPlan> {
        match self.execute(context, query).await {
            Ok(plan) => Ok(plan),
            Err(ResearchError::Extraction(reason)) if !context.config.research.strict_planning => {
                tracing::warn!("调研计划解析失败，使用确定性计划: {}", reason);
                println!("   ⚠️ 模型输出无法解析，使用确定性调研计划");
                Ok(fallback_plan(query))
            }
            Err(e) => Err(e),
        }
    }
}

/// 查询自带的关注领域优先，其次是模型补充的，按深度截断
pub fn bound_focus_areas(query: &ResearchQuery, model_areas: &[String]) -> Vec<String> {
    let mut areas = dedup_case_insensitive(query.focus_areas().iter().chain(model_areas));
    areas.truncate(query.depth().focus_area_limit());
    areas
}

/// 按深度约束关键词数量：超出上限截断，不足下限确定性补齐
pub fn bound_keywords(
    topic: &str,
    model_keywords: &[String],
    focus_areas: &[String],
    depth: ResearchDepth,
) -> Vec<String> {
    let range = depth.keyword_range();
    let mut keywords = dedup_case_insensitive(model_keywords);
    keywords.truncate(*range.end());
    if keywords.len() >= *range.start() {
        return keywords;
    }

    let seeds: Vec<String> = std::iter::once(topic.trim().to_string())
        .chain(keywords.iter().cloned())
        .collect();
    let candidates = PADDING_SUFFIXES
        .iter()
        .flat_map(|suffix| seeds.iter().map(move |seed| format!("{} {}", seed, suffix)))
        .chain(focus_areas.iter().map(|area| {
            format!("{} {}", topic.trim(), area.replace('_', " "))
        }));

    for candidate in candidates {
        if keywords.len() >= *range.start() {
            break;
        }
        let lowered = candidate.to_lowercase();
        if !keywords.iter().any(|k| k.to_lowercase() == lowered) {
            keywords.push(candidate);
        }
    }
    keywords
}

/// 不依赖模型的确定性调研计划
pub fn fallback_plan(query: &ResearchQuery) -> ResearchPlan {
    let topic = query.topic();
    let key_questions = vec![
        format!("Who are the main competitors in the {} space?", topic),
        "What are their key products and services?".to_string(),
        "How do they price their offerings?".to_string(),
        "What are their main competitive advantages?".to_string(),
        "Who is their target market?".to_string(),
    ];
    let focus_areas = bound_focus_areas(query, &[]);
    let search_keywords = bound_keywords(topic, &topic_ngrams(topic), &focus_areas, query.depth());

    ResearchPlan::new(
        format!("Competitive analysis for: {}", topic),
        key_questions,
        focus_areas,
        search_keywords,
        Vec::new(),
        true,
    )
}

/// 完整主题、三元组、二元组，以及长度大于2的单词
fn topic_ngrams(topic: &str) -> Vec<String> {
    let words: Vec<&str> = topic.split_whitespace().collect();
    let mut grams = vec![words.join(" ")];
    for size in [3, 2] {
        if words.len() > size {
            grams.extend(words.windows(size).map(|w| w.join(" ")));
        }
    }
    grams.extend(
        words
            .iter()
            .filter(|w| w.chars().count() > 2)
            .map(|w| w.to_string()),
    );
    grams
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FnSearch, FnModel, context_with, test_config};
    use std::sync::Arc;

    fn query(depth: ResearchDepth) -> ResearchQuery {
        ResearchQuery::new("internal knowledge search tools", depth, vec![]).unwrap()
    }

    fn keywords(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("keyword {}", i)).collect()
    }

    fn draft(search_keywords: Vec<String>) -> PlanDraft {
        PlanDraft {
            objective: "Map the knowledge search market".to_string(),
            key_questions: vec!["Who leads?".to_string()],
            focus_areas: vec!["integrations".to_string()],
            search_keywords,
            competitor_names: vec!["Glean".to_string(), "Guru".to_string()],
        }
    }

    #[test]
    fn test_keywords_bounded_by_depth() {
        for depth in ResearchDepth::ALL {
            let range = depth.keyword_range();
            for n in [1, 5, 12, 40] {
                let result = bound_keywords("crm software", &keywords(n), &[], depth);
                assert!(range.contains(&result.len()), "{} keywords for {}", result.len(), depth);
            }
        }
    }

    #[test]
    fn test_keywords_padding_is_deterministic() {
        let first = bound_keywords("crm", &keywords(2), &["pricing".to_string()], ResearchDepth::Standard);
        let second = bound_keywords("crm", &keywords(2), &["pricing".to_string()], ResearchDepth::Standard);
        assert_eq!(first, second);
        assert_eq!(first[0], "keyword 0");
        assert_eq!(first[2], "crm competitors");
    }

    #[test]
    fn test_keywords_truncated_in_model_order() {
        let result = bound_keywords("crm", &keywords(30), &[], ResearchDepth::Basic);
        assert_eq!(result, keywords(10));
    }

    #[test]
    fn test_focus_areas_limited_by_depth() {
        let q = query(ResearchDepth::Basic);
        let areas = bound_focus_areas(&q, &["integrations".to_string()]);
        assert_eq!(areas.len(), 4);
        assert_eq!(areas[0], "pricing");

        let q = ResearchQuery::new("crm", ResearchDepth::Comprehensive, vec!["security".into()]).unwrap();
        let areas = bound_focus_areas(&q, &["Security".into(), "integrations".into()]);
        assert_eq!(areas, vec!["security", "integrations"]);
    }

    #[test]
    fn test_post_process_standard_depth() {
        let q = query(ResearchDepth::Standard).with_exclusions(vec!["guru".to_string()]);
        let plan = Planner.post_process(draft(keywords(3)), &q).unwrap();

        assert!((10..=15).contains(&plan.search_keywords().len()));
        assert_eq!(plan.focus_areas().len(), 7);
        assert_eq!(plan.competitor_names(), &["Glean".to_string()]);
        assert!(!plan.is_fallback());
    }

    #[test]
    fn test_post_process_rejects_empty_keywords() {
        let err = Planner
            .post_process(draft(vec!["  ".to_string()]), &query(ResearchDepth::Basic))
            .unwrap_err();
        assert!(matches!(err, ResearchError::Extraction(_)));
    }

    #[test]
    fn test_fallback_plan() {
        let plan = fallback_plan(&query(ResearchDepth::Standard));
        assert!(plan.is_fallback());
        assert_eq!(plan.objective(), "Competitive analysis for: internal knowledge search tools");
        assert_eq!(plan.key_questions().len(), 5);
        assert_eq!(plan.search_keywords()[0], "internal knowledge search tools");
        assert!((10..=15).contains(&plan.search_keywords().len()));
    }

    #[test]
    fn test_topic_ngrams() {
        let grams = topic_ngrams("ai chatbot companies now");
        assert_eq!(grams[0], "ai chatbot companies now");
        assert!(grams.contains(&"ai chatbot companies".to_string()));
        assert!(grams.contains(&"chatbot companies".to_string()));
        assert!(grams.contains(&"chatbot".to_string()));
        assert!(!grams.contains(&"ai".to_string()));
    }

    #[tokio::test]
    async fn test_plan_with_model_output() {
        let llm = Arc::new(FnModel::new(|_| {
            Ok(r#"```json
{"objective": "Find knowledge search vendors", "key_questions": ["Who leads?"],
 "focus_areas": ["pricing"], "search_keywords": ["enterprise search", "knowledge base software"]}
```"#
                .to_string())
        }));
        let search = Arc::new(FnSearch::new(|_| Ok(vec![])));
        let context = context_with(test_config(), llm, search);

        let plan = Planner.plan(&context, &query(ResearchDepth::Basic)).await.unwrap();
        assert_eq!(plan.objective(), "Find knowledge search vendors");
        assert_eq!(plan.search_keywords()[0], "enterprise search");
        assert!((8..=10).contains(&plan.search_keywords().len()));
    }

    #[tokio::test]
    async fn test_strict_planning_fails_on_malformed_output() {
        let llm = Arc::new(FnModel::new(|_| Ok("I cannot help with that".to_string())));
        let search = Arc::new(FnSearch::new(|_| Ok(vec![])));
        let context = context_with(test_config(), llm, search);

        let err = Planner.plan(&context, &query(ResearchDepth::Basic)).await.unwrap_err();
        assert!(matches!(err, ResearchError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_lenient_planning_falls_back() {
        let llm = Arc::new(FnModel::new(|_| Ok("{\"objective\": \"x\"}".to_string())));
        let search = Arc::new(FnSearch::new(|_| Ok(vec![])));
        let mut config = test_config();
        config.research.strict_planning = false;
        let context = context_with(config, llm, search);

        let plan = Planner.plan(&context, &query(ResearchDepth::Basic)).await.unwrap();
        assert!(plan.is_fallback());
    }

    #[tokio::test]
    async fn test_provider_error_is_fatal_even_when_lenient() {
        let llm = Arc::new(FnModel::new(|_| {
            Err(ResearchError::request("openai", "invalid api key"))
        }));
        let search = Arc::new(FnSearch::new(|_| Ok(vec![])));
        let mut config = test_config();
        config.research.strict_planning = false;
        let context = context_with(config, llm, search);

        let err = Planner.plan(&context, &query(ResearchDepth::Basic)).await.unwrap_err();
        assert!(matches!(err, ResearchError::ProviderRequest { .. }));
    }
}
