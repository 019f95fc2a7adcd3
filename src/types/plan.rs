use serde::{Deserialize, Serialize};

/// 规划阶段产出的调研计划，创建后只读
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchPlan {
    objective: String,
    key_questions: Vec<String>,
    focus_areas: Vec<String>,
    search_keywords: Vec<String>,
    competitor_names: Vec<String>,
    /// 是否为模型输出不可用时生成的确定性计划
    fallback: bool,
}

impl ResearchPlan {
    pub fn new(
        objective: String,
        key_questions: Vec<String>,
        focus_areas: Vec<String>,
        search_keywords: Vec<String>,
        competitor_names: Vec<String>,
        fallback: bool,
    ) -> Self {
        Self {
            objective,
            key_questions,
            focus_areas,
            search_keywords,
            competitor_names,
            fallback,
        }
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn key_questions(&self) -> &[String] {
        &self.key_questions
    }

    pub fn focus_areas(&self) -> &[String] {
        &self.focus_areas
    }

    pub fn search_keywords(&self) -> &[String] {
        &self.search_keywords
    }

    pub fn competitor_names(&self) -> &[String] {
        &self.competitor_names
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}
