use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::generator::research::types::AgentType;
use crate::generator::step_forward_agent::{PromptTemplate, StepForwardAgent};
use crate::search::SearchHit;
use crate::types::competitor::CompetitorInfo;
use crate::utils::text::non_blank;

/// 一次提取所需的材料
#[derive(Debug, Clone)]
pub struct ExtractionInput {
    pub search_query: String,
    pub objective: String,
    pub hits: Vec<SearchHit>,
}

/// 模型提取的单个竞争对手
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompetitorDraft {
    /// Company name
    pub name: String,
    /// Official website URL
    #[serde(default)]
    pub website: Option<String>,
    /// Short description of what the company does
    #[serde(default)]
    pub description: Option<String>,
    /// Main products or services
    #[serde(default)]
    pub products: Option<Vec<String>>,
    /// Target customer segment
    #[serde(default)]
    pub target_market: Option<String>,
    /// Market position, e.g. leader, challenger, niche
    #[serde(default)]
    pub market_position: Option<String>,
    /// Distinguishing features
    #[serde(default)]
    pub key_features: Option<Vec<String>>,
    /// Pricing tiers mapped to their price description
    #[serde(default)]
    pub pricing_info: Option<Value>,
}

/// 兼容 {"competitors": [...]} 与裸数组两种返回
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ExtractionDraft {
    Wrapped { competitors: Vec<CompetitorDraft> },
    Bare(Vec<CompetitorDraft>),
}

impl ExtractionDraft {
    fn into_drafts(self) -> Vec<CompetitorDraft> {
        match self {
            ExtractionDraft::Wrapped { competitors } => competitors,
            ExtractionDraft::Bare(competitors) => competitors,
        }
    }
}

/// 竞争对手提取员 - 从搜索结果中提取结构化的竞争对手档案
#[derive(Default)]
pub struct CompetitorExtractor;

impl StepForwardAgent for CompetitorExtractor {
    type Input = ExtractionInput;
    type Draft = ExtractionDraft;
    type Output = Vec<CompetitorInfo>;

    fn agent_type(&self) -> AgentType {
        AgentType::CompetitorExtractor
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a market research analyst who extracts structured competitor
profiles from web search results. Only report companies that are actual
competitors in the researched space and only state facts supported by the
provided results."#
                .to_string(),
            opening_instruction: "Extract every competitor mentioned in these search results:"
                .to_string(),
            closing_instruction: r#"Requirements:
- Return {"competitors": []} when the results mention no competitor
- Leave unknown fields out instead of guessing
- Use the company's own name, not a product name, as "name""#
                .to_string(),
        }
    }

    fn provide_material(&self, input: &ExtractionInput) -> String {
        let mut material = format!(
            "Research objective: {}\nSearch query: {}\n\n",
            input.objective, input.search_query
        );
        for (idx, hit) in input.hits.iter().enumerate() {
            material.push_str(&format!(
                "{}. {}\n   URL: {}\n   {}\n",
                idx + 1,
                hit.title,
                hit.url,
                hit.snippet
            ));
        }
        material
    }

    fn post_process(&self, draft: ExtractionDraft, input: &ExtractionInput) -> Result<Vec<CompetitorInfo>> {
        let sources: Vec<String> = input.hits.iter().map(|hit| hit.url.clone()).collect();
        Ok(draft
            .into_drafts()
            .into_iter()
            .filter(|d| !d.name.trim().is_empty())
            .map(|d| CompetitorInfo {
                name: d.name.trim().to_string(),
                website: non_blank(d.website),
                description: non_blank(d.description),
                products: clean_list(d.products),
                target_market: non_blank(d.target_market),
                market_position: non_blank(d.market_position),
                key_features: clean_list(d.key_features),
                pricing_info: d.pricing_info.and_then(pricing_from_value),
                sources: sources.clone(),
            })
            .collect())
    }
}

fn clean_list(items: Option<Vec<String>>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    crate::utils::text::union_exact(&mut result, &items.unwrap_or_default());
    result
}

/// 价格信息：对象按档位展开，字符串作为概述，其余视为缺失
fn pricing_from_value(value: Value) -> Option<BTreeMap<String, String>> {
    let pricing: BTreeMap<String, String> = match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(tier, v)| {
                let text = match v {
                    Value::String(s) => s,
                    Value::Null => return None,
                    other => other.to_string(),
                };
                let text = text.trim().to_string();
                (!text.is_empty()).then_some((tier, text))
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => {
            BTreeMap::from([("overview".to_string(), s.trim().to_string())])
        }
        _ => return None,
    };
    (!pricing.is_empty()).then_some(pricing)
}
