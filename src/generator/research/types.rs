use std::fmt::Display;

/// 调研流水线中的Agent类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    Planner,
    CompetitorExtractor,
    GapAnalyzer,
    ResponseCurator,
}

impl Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            AgentType::Planner => "Planner",
            AgentType::CompetitorExtractor => "CompetitorExtractor",
            AgentType::GapAnalyzer => "GapAnalyzer",
            AgentType::ResponseCurator => "ResponseCurator",
        };
        write!(f, "{}", str)
    }
}
