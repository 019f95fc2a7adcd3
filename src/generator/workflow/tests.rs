#[cfg(test)]
mod tests {
    use crate::error::ResearchError;
    use crate::generator::workflow::{TimingKeys, TimingScope, run, validate_system};
    use crate::search::SearchRequest;
    use crate::testing::{FnModel, FnSearch, context_with, hit, test_config};
    use crate::types::query::{ResearchDepth, ResearchQuery};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn scripted_reply(req: &crate::llm::CompletionRequest) -> crate::error::Result<String> {
        Ok(match req.log_tag.as_str() {
            "Planner" => r#"{"objective": "Map note taking apps", "key_questions": [],
                "focus_areas": ["features"], "search_keywords": ["note apps"]}"#
                .to_string(),
            "CompetitorExtractor" => r#"[{"name": "Notion"}, {"name": "Obsidian"}]"#.to_string(),
            "GapAnalyzer" => r#"{"confidence_levels": {"features": 75}}"#.to_string(),
            _ => r#"{"executive_summary": "Notion leads.", "market_opportunities": ["Offline-first"],
                "competitive_advantages": [], "threats_and_risks": [], "strategic_recommendations": []}"#
                .to_string(),
        })
    }

    fn query() -> ResearchQuery {
        ResearchQuery::new("note taking apps", ResearchDepth::Basic, vec![]).unwrap()
    }

    #[test]
    fn test_timing_scope_phases() {
        let mut timing = TimingScope::new();
        timing.start_phase(TimingKeys::PLAN);
        assert!(timing.end_phase(TimingKeys::PLAN).is_some());
        assert!(timing.end_phase(TimingKeys::SEARCH).is_none());

        let report = timing.generate_timing_report();
        assert!(report.contains("总执行时间"));
        assert!(report.contains("- plan:"));
        assert!(!report.contains("- search:"));
    }

    #[tokio::test]
    async fn test_run_saves_report() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.output.reports_dir = temp_dir.path().join("reports");

        let llm = Arc::new(FnModel::new(scripted_reply));
        let search = Arc::new(FnSearch::new(|req: &SearchRequest| {
            Ok(vec![hit(&req.query, "https://www.notion.so")])
        }));
        let context = context_with(config, llm, search);

        let outcome = run(&context, &query(), true).await.unwrap();
        let saved = outcome.saved.unwrap();

        assert!(saved.markdown_path.exists());
        assert!(saved.json_path.unwrap().exists());
        assert!(
            saved
                .markdown_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("competitive_research_note_taking_apps_")
        );
        assert_eq!(outcome.report.competitors.len(), 2);
        assert!(outcome.timing_report.contains("- output:"));
    }

    #[tokio::test]
    async fn test_run_without_save() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.output.reports_dir = temp_dir.path().join("reports");

        let llm = Arc::new(FnModel::new(scripted_reply));
        let search = Arc::new(FnSearch::new(|_: &SearchRequest| Ok(vec![])));
        let context = context_with(config, llm, search);

        let outcome = run(&context, &query(), false).await.unwrap();
        assert!(outcome.saved.is_none());
        assert!(!temp_dir.path().join("reports").exists());
    }

    #[tokio::test]
    async fn test_planning_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.output.reports_dir = temp_dir.path().join("reports");

        let llm = Arc::new(FnModel::new(|_| {
            Err(ResearchError::request("openai", "invalid or missing API credentials"))
        }));
        let search = Arc::new(FnSearch::new(|_: &SearchRequest| Ok(vec![])));
        let context = context_with(config, llm, search);

        let result = run(&context, &query(), true).await;
        assert!(matches!(result, Err(ResearchError::ProviderRequest { .. })));
        assert!(!temp_dir.path().join("reports").exists());
    }

    #[tokio::test]
    async fn test_validate_system_stops_on_bad_config() {
        let checks = validate_system(&crate::config::Config::default()).await;
        assert_eq!(checks.len(), 1);
        assert!(!checks[0].passed);
        assert!(checks[0].detail.contains("missing API key"));
    }
}
