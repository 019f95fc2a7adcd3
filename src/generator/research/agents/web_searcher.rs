use std::collections::BTreeSet;

use crate::error::Result;
use crate::generator::context::GeneratorContext;
use crate::generator::research::agents::competitor_extractor::{
    CompetitorExtractor, ExtractionInput,
};
use crate::generator::step_forward_agent::StepForwardAgent;
use crate::search::{SearchHit, SearchRequest};
use crate::types::competitor::{CompetitorInfo, CompetitorRoster, MergeOutcome};
use crate::types::plan::ResearchPlan;
use crate::types::query::ResearchQuery;
use crate::types::report::{PipelineStage, StageIssue};
use crate::utils::threads::do_parallel_with_limit;

/// 一个搜索任务：一次搜索调用加一次提取调用
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTask {
    pub query_text: String,
}

/// 搜索阶段的汇总结果
#[derive(Debug, Clone, Default)]
pub struct SearchFindings {
    pub competitors: Vec<CompetitorInfo>,
    pub searches_performed: usize,
    pub results_analyzed: usize,
    pub issues: Vec<StageIssue>,
    /// 成功搜索结果的主机名，已排序去重
    pub data_sources: Vec<String>,
}

/// 单个任务的执行结果，合并前只读
struct TaskOutcome {
    task: SearchTask,
    searched: bool,
    hits: Vec<SearchHit>,
    result: Result<Vec<CompetitorInfo>>,
}

/// 网络搜索员 - 按关键词搜索并提取竞争对手，合并去重
#[derive(Default, Clone)]
pub struct WebSearcher;

impl WebSearcher {
    /// 关键词按轮转方式与关注领域配对，随后是已知竞争对手的档案搜索
    pub fn build_tasks(plan: &ResearchPlan) -> Vec<SearchTask> {
        let areas = plan.focus_areas();
        let keyword_tasks = plan
            .search_keywords()
            .iter()
            .enumerate()
            .map(|(idx, keyword)| {
                let query_text = if areas.is_empty() {
                    keyword.clone()
                } else {
                    format!("{} {}", keyword, areas[idx % areas.len()].replace('_', " "))
                };
                SearchTask { query_text }
            });
        let competitor_tasks = plan.competitor_names().iter().map(|name| SearchTask {
            query_text: format!("{} company profile products pricing features", name),
        });
        keyword_tasks.chain(competitor_tasks).collect()
    }

    pub async fn execute(
        &self,
        context: &GeneratorContext,
        plan: &ResearchPlan,
        query: &ResearchQuery,
    ) -> SearchFindings {
        let tasks = Self::build_tasks(plan);
        let batch_size = context.config.research.max_concurrent_searches.max(1);
        let target_max = *query.depth().competitor_target().end();

        println!(
            "🔍 开始网络搜索: {} 个任务，并发度 {}",
            tasks.len(),
            batch_size
        );

        let mut roster = CompetitorRoster::new();
        let mut findings = SearchFindings::default();
        let mut hosts = BTreeSet::new();
        let total = tasks.len();

        for (batch_idx, batch) in tasks.chunks(batch_size).enumerate() {
            let futures = batch
                .iter()
                .cloned()
                .map(|task| self.run_task(context, plan, query, task))
                .collect::<Vec<_>>();
            let outcomes = do_parallel_with_limit(futures, batch_size).await;

            // 批次全部返回后按任务顺序合并
            for outcome in outcomes {
                if outcome.searched {
                    findings.searches_performed += 1;
                }
                // 只统计成功完成提取的结果
                if outcome.result.is_ok() {
                    findings.results_analyzed += outcome.hits.len();
                    hosts.extend(outcome.hits.iter().filter_map(SearchHit::host));
                }
                match outcome.result {
                    Ok(competitors) => {
                        for competitor in competitors {
                            if query.is_excluded(&competitor.name) {
                                continue;
                            }
                            if roster.merge(competitor) == MergeOutcome::Inserted {
                                tracing::debug!("发现新的竞争对手，当前共 {} 个", roster.len());
                            }
                        }
                    }
                    Err(e) => {
                        println!("   ⚠️ 搜索任务 '{}' 失败: {}", outcome.task.query_text, e);
                        findings.issues.push(StageIssue::new(
                            PipelineStage::Search,
                            outcome.task.query_text,
                            e.to_string(),
                        ));
                    }
                }
            }

            let done = ((batch_idx + 1) * batch_size).min(total);
            println!(
                "   📊 进度 {}/{}，已识别 {} 个竞争对手",
                done,
                total,
                roster.len()
            );
            if roster.len() >= target_max {
                println!("   ✅ 已达到目标竞争对手数量 {}，提前结束搜索", target_max);
                break;
            }
        }

        findings.competitors = roster.into_truncated(target_max);
        findings.data_sources = hosts.into_iter().collect();
        findings
    }

    async fn run_task(
        &self,
        context: &GeneratorContext,
        plan: &ResearchPlan,
        query: &ResearchQuery,
        task: SearchTask,
    ) -> TaskOutcome {
        let request = SearchRequest {
            query: task.query_text.clone(),
            max_results: query.max_results(),
            search_depth: query.depth().search_depth_flag().to_string(),
        };

        let hits = match context.search.search(&request).await {
            Ok(hits) => hits,
            Err(e) => {
                return TaskOutcome {
                    task,
                    searched: false,
                    hits: Vec::new(),
                    result: Err(e),
                };
            }
        };

        // 没有搜索结果就不调用模型
        if hits.is_empty() {
            return TaskOutcome {
                task,
                searched: true,
                hits,
                result: Ok(Vec::new()),
            };
        }

        let input = ExtractionInput {
            search_query: task.query_text.clone(),
            objective: plan.objective().to_string(),
            hits: hits.clone(),
        };
        let result = CompetitorExtractor.execute(context, &input).await;

        TaskOutcome {
            task,
            searched: true,
            hits,
            result,
        }
    }
}
