use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::types::report::ResearchReport;

pub mod markdown;

pub use markdown::render_markdown;

const SLUG_MAX_CHARS: usize = 40;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

/// 保存调研报告
pub async fn save(output: &OutputConfig, report: &ResearchReport) -> Result<SavedReport> {
    let outlet = DiskOutlet::from_config(output);
    outlet.save(report).await
}

pub trait Outlet {
    async fn save(&self, report: &ResearchReport) -> Result<SavedReport>;
}

/// 已写入磁盘的报告文件
#[derive(Debug, Clone, PartialEq)]
pub struct SavedReport {
    pub markdown_path: PathBuf,
    pub json_path: Option<PathBuf>,
}

pub struct DiskOutlet {
    reports_dir: PathBuf,
    save_json: bool,
}

impl DiskOutlet {
    pub fn new(reports_dir: impl Into<PathBuf>, save_json: bool) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            save_json,
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(&output.reports_dir, output.save_json)
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, report: &ResearchReport) -> Result<SavedReport> {
        println!("\n🖊️ 报告存储中...");
        fs::create_dir_all(&self.reports_dir)?;

        let stem = report_file_stem(report);
        let markdown_path = self.reports_dir.join(format!("{}.md", stem));
        write_atomic(&markdown_path, render_markdown(report).as_bytes())?;
        println!("💾 已保存报告: {}", markdown_path.display());

        let json_path = if self.save_json {
            let path = self.reports_dir.join(format!("{}.json", stem));
            let json = serde_json::to_string_pretty(report)?;
            write_atomic(&path, json.as_bytes())?;
            println!("💾 已保存数据: {}", path.display());
            Some(path)
        } else {
            None
        };

        Ok(SavedReport {
            markdown_path,
            json_path,
        })
    }
}

/// `competitive_research_<slug>_<YYYYMMDD>_<HHMMSS>`，时间取报告生成时间
pub fn report_file_stem(report: &ResearchReport) -> String {
    format!(
        "competitive_research_{}_{}",
        topic_slug(report.query.topic()),
        report.generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// 小写，非字母数字合并为下划线，最多40个字符
pub fn topic_slug(topic: &str) -> String {
    let lowered = topic.to_lowercase();
    let slug = NON_ALPHANUMERIC.replace_all(&lowered, "_");
    let slug: String = slug.trim_matches('_').chars().take(SLUG_MAX_CHARS).collect();
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "research".to_string()
    } else {
        slug.to_string()
    }
}

/// 先写临时文件再重命名，避免留下半截文件
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });
    fs::write(&tmp_path, contents)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_report;

    #[test]
    fn test_topic_slug() {
        assert_eq!(topic_slug("Internal Knowledge Search Tools"), "internal_knowledge_search_tools");
        assert_eq!(topic_slug("  AI/ML -- platforms!! "), "ai_ml_platforms");
        assert_eq!(topic_slug("日本語"), "research");
        let long = topic_slug("a very long research topic that keeps going well past the limit");
        assert!(long.chars().count() <= 40);
        assert!(!long.ends_with('_'));
    }

    #[test]
    fn test_report_file_stem() {
        assert_eq!(
            report_file_stem(&sample_report()),
            "competitive_research_team_chat_20260301_093000"
        );
    }

    #[tokio::test]
    async fn test_disk_outlet_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let reports_dir = dir.path().join("reports");
        let outlet = DiskOutlet::new(&reports_dir, true);
        let report = sample_report();

        let saved = outlet.save(&report).await.unwrap();

        let markdown = fs::read_to_string(&saved.markdown_path).unwrap();
        assert_eq!(markdown, render_markdown(&report));
        let json_path = saved.json_path.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["query"]["topic"], "team chat");
        assert_eq!(value["gap_analysis"]["data_quality_score"]["value"], 70.0);

        let leftovers: Vec<_> = fs::read_dir(&reports_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_json_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let outlet = DiskOutlet::new(dir.path(), false);

        let saved = outlet.save(&sample_report()).await.unwrap();
        assert!(saved.json_path.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
