use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;

use competitive_research::cli::{Args, Command, ResearchArgs};
use competitive_research::config::Config;
use competitive_research::generator::workflow::{LaunchOutcome, launch, validate_system};
use competitive_research::types::report::ReportStatus;

#[tokio::main]
async fn main() -> ExitCode {
    // .env 中的密钥在读取配置之前加载
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = args.into_config().context("failed to load configuration");

    // 配置文件中的verbose同样生效；配置加载失败时退回到命令行参数
    let log_directive = match &config {
        Ok(config) => config.log_directive(),
        Err(_) => Config {
            verbose: args.verbose,
            ..Config::default()
        }
        .log_directive(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let outcome = match config {
        Ok(config) => dispatch(&args, &config).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: &Args, config: &Config) -> Result<ExitCode> {
    match &args.command {
        Command::Research(research) => run_research(config, research).await,
        Command::Validate => Ok(run_validate(config).await),
        Command::Config => {
            println!("⚙️ 当前配置:");
            print!("{}", config.summary());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_research(config: &Config, research: &ResearchArgs) -> Result<ExitCode> {
    let query = research.to_query(config).context("invalid research request")?;
    let outcome = launch(config, &query, !research.no_save)
        .await
        .context("competitive research failed")?;
    print_outcome(&outcome);
    Ok(ExitCode::SUCCESS)
}

async fn run_validate(config: &Config) -> ExitCode {
    println!("🔎 正在检查系统配置...");
    let checks = validate_system(config).await;
    for check in &checks {
        let mark = if check.passed { "✅" } else { "❌" };
        println!("{} {}: {}", mark, check.name, check.detail);
    }
    if checks.iter().all(|c| c.passed) {
        println!("🎉 所有检查通过");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_outcome(outcome: &LaunchOutcome) {
    let report = &outcome.report;

    println!("\n📋 调研完成: {}", report.query.topic());
    println!("   竞争对手: {}", report.competitors.len());
    println!("   搜索次数: {}", report.total_searches_performed);
    println!("   分析结果: {}", report.search_results_analyzed);
    println!(
        "   数据质量: {}",
        report.gap_analysis.data_quality_score()
    );
    println!("   耗时: {:.1}秒", report.research_duration_seconds);
    if report.status == ReportStatus::Degraded {
        println!("   ⚠️ {} 个环节降级运行:", report.stage_issues.len());
        for issue in &report.stage_issues {
            println!("      - {}", issue);
        }
    }

    println!("\n📝 执行摘要:\n{}", report.executive_summary);

    if !report.competitors.is_empty() {
        println!("\n🏢 主要竞争对手:");
        for (idx, competitor) in report.competitors.iter().take(5).enumerate() {
            match &competitor.description {
                Some(description) => println!("   {}. {} - {}", idx + 1, competitor.name, description),
                None => println!("   {}. {}", idx + 1, competitor.name),
            }
        }
    }

    if let Some(saved) = &outcome.saved {
        println!("\n💾 报告: {}", saved.markdown_path.display());
        if let Some(json_path) = &saved.json_path {
            println!("💾 数据: {}", json_path.display());
        }
    }
    println!("\n⏱️ {}", outcome.timing_report.trim_end());
}
