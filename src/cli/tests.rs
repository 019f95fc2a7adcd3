#[cfg(test)]
mod tests {
    use crate::cli::{Args, Command};
    use crate::config::LLMProvider;
    use crate::error::ResearchError;
    use crate::types::query::ResearchDepth;
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn research(args: &Args) -> &crate::cli::ResearchArgs {
        match &args.command {
            Command::Research(research) => research,
            other => panic!("expected research command, got {:?}", other),
        }
    }

    #[test]
    fn test_research_default_values() {
        let args = Args::try_parse_from(["competitive-research", "research", "crm software"]).unwrap();
        let research = research(&args);

        assert_eq!(research.topic, "crm software");
        assert_eq!(research.depth, None);
        assert!(research.focus.is_empty());
        assert!(research.exclude.is_empty());
        assert!(!research.no_save);
        assert!(!args.verbose);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_research_options() {
        let args = Args::try_parse_from([
            "competitive-research",
            "research",
            "crm software",
            "--depth", "comprehensive",
            "--focus", "pricing",
            "--focus", "integrations",
            "--exclude", "Salesforce",
            "--max-results", "5",
            "--output-dir", "/tmp/reports",
            "--no-save",
            "-v",
        ])
        .unwrap();
        let research = research(&args);

        assert_eq!(research.depth.as_deref(), Some("comprehensive"));
        assert_eq!(research.focus, vec!["pricing", "integrations"]);
        assert_eq!(research.exclude, vec!["Salesforce"]);
        assert_eq!(research.max_results, Some(5));
        assert_eq!(research.output_dir, Some(PathBuf::from("/tmp/reports")));
        assert!(research.no_save);
        assert!(args.verbose);
    }

    #[test]
    fn test_subcommands_and_global_llm_options() {
        let args = Args::try_parse_from([
            "competitive-research",
            "validate",
            "--llm-provider", "deepseek",
            "--llm-api-key", "sk-test",
            "--llm-api-base-url", "https://api.deepseek.com",
            "--model-efficient", "deepseek-chat",
            "--model-powerful", "deepseek-reasoner",
            "--temperature", "0.5",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Validate));

        let config = args.into_config_with_env(no_env).unwrap();
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.api_base_url, "https://api.deepseek.com");
        assert_eq!(config.llm.model_efficient, "deepseek-chat");
        assert_eq!(config.llm.model_powerful, "deepseek-reasoner");
        assert_eq!(config.llm.temperature, 0.5);

        let args = Args::try_parse_from(["competitive-research", "config"]).unwrap();
        assert!(matches!(args.command, Command::Config));
    }

    #[test]
    fn test_missing_topic_rejected() {
        assert!(Args::try_parse_from(["competitive-research", "research"]).is_err());
        assert!(Args::try_parse_from(["competitive-research"]).is_err());
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[llm]\nmodel_efficient = \"from-file\"\napi_key = \"sk-file\"\n\n[output]\nreports_dir = \"file-reports\""
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::try_parse_from([
            "competitive-research",
            "--config", path.as_str(),
            "research", "crm",
            "--output-dir", "cli-reports",
            "--model-efficient", "from-cli",
        ])
        .unwrap();
        let config = args
            .into_config_with_env(|key| match key {
                "OPENAI_API_KEY" => Some("sk-env".to_string()),
                "RESEARCH_LLM_MODEL" => Some("from-env".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.llm.model_efficient, "from-cli");
        assert_eq!(config.llm.api_key, "sk-env");
        assert_eq!(config.output.reports_dir, PathBuf::from("cli-reports"));
    }

    #[test]
    fn test_invalid_llm_provider() {
        let args = Args::try_parse_from([
            "competitive-research",
            "config",
            "--llm-provider", "invalid",
        ])
        .unwrap();
        let result = args.into_config_with_env(no_env);
        assert!(matches!(result, Err(ResearchError::Configuration(_))));
    }

    #[test]
    fn test_to_query_uses_config_defaults() {
        let args = Args::try_parse_from(["competitive-research", "research", "  crm  "]).unwrap();
        let mut config = args.into_config_with_env(no_env).unwrap();
        config.research.default_depth = ResearchDepth::Basic;
        config.search.max_results = 7;

        let query = research(&args).to_query(&config).unwrap();
        assert_eq!(query.topic(), "crm");
        assert_eq!(query.depth(), ResearchDepth::Basic);
        assert_eq!(query.max_results(), 7);
    }

    #[test]
    fn test_to_query_validation() {
        let args = Args::try_parse_from([
            "competitive-research", "research", "crm", "--depth", "extreme",
        ])
        .unwrap();
        let config = args.into_config_with_env(no_env).unwrap();
        assert!(matches!(
            research(&args).to_query(&config),
            Err(ResearchError::Validation(_))
        ));

        let args = Args::try_parse_from([
            "competitive-research", "research", "crm", "--max-results", "0",
        ])
        .unwrap();
        assert!(research(&args).to_query(&config).is_err());

        let args = Args::try_parse_from([
            "competitive-research", "research", "crm", "--exclude", "Acme", "--exclude", "acme",
        ])
        .unwrap();
        let query = research(&args).to_query(&config).unwrap();
        assert_eq!(query.exclude_competitors(), &["Acme".to_string()]);
    }
}
