use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::utils::text::union_exact;

/// 单个竞争对手的结构化档案
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompetitorInfo {
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub products: Vec<String>,
    pub target_market: Option<String>,
    pub market_position: Option<String>,
    pub key_features: Vec<String>,
    /// 价格档位 -> 描述；None表示没有任何来源提供价格信息
    pub pricing_info: Option<BTreeMap<String, String>>,
    /// 提取该档案所依据的搜索结果URL
    pub sources: Vec<String>,
}

impl CompetitorInfo {
    /// 参与完整度统计的字段数
    pub const PROFILE_FIELDS: usize = 7;

    /// 去重用的规范化名称
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }

    /// 已填写的档案字段占比（0-100）
    pub fn completeness(&self) -> f64 {
        let filled = [
            self.website.is_some(),
            self.description.is_some(),
            !self.products.is_empty(),
            self.target_market.is_some(),
            self.market_position.is_some(),
            !self.key_features.is_empty(),
            self.pricing_info.as_ref().is_some_and(|p| !p.is_empty()),
        ]
        .iter()
        .filter(|filled| **filled)
        .count();
        filled as f64 / Self::PROFILE_FIELDS as f64 * 100.0
    }

    /// 将同一对手的另一条记录并入当前记录
    fn absorb(&mut self, other: CompetitorInfo) {
        fill_if_empty(&mut self.website, other.website);
        fill_if_empty(&mut self.description, other.description);
        fill_if_empty(&mut self.target_market, other.target_market);
        fill_if_empty(&mut self.market_position, other.market_position);
        union_exact(&mut self.products, &other.products);
        union_exact(&mut self.key_features, &other.key_features);
        union_exact(&mut self.sources, &other.sources);

        if let Some(incoming) = other.pricing_info {
            let pricing = self.pricing_info.get_or_insert_with(BTreeMap::new);
            for (tier, text) in incoming {
                pricing.entry(tier).or_insert(text);
            }
        }
    }
}

fn fill_if_empty(slot: &mut Option<String>, incoming: Option<String>) {
    if slot.as_deref().is_none_or(|v| v.trim().is_empty())
        && let Some(value) = incoming.filter(|v| !v.trim().is_empty())
    {
        *slot = Some(value);
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 合并结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Merged,
    Rejected,
}

/// 按规范化名称去重的竞争对手集合，保持首次发现的顺序
#[derive(Debug, Default, Clone)]
pub struct CompetitorRoster {
    competitors: Vec<CompetitorInfo>,
    index: HashMap<String, usize>,
}

impl CompetitorRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 确定性合并：首个非空标量字段保留，列表字段保序取并集
    pub fn merge(&mut self, competitor: CompetitorInfo) -> MergeOutcome {
        let key = competitor.key();
        if key.is_empty() {
            return MergeOutcome::Rejected;
        }

        match self.index.get(&key) {
            Some(&position) => {
                self.competitors[position].absorb(competitor);
                MergeOutcome::Merged
            }
            None => {
                let mut competitor = competitor;
                competitor.name = competitor.name.trim().to_string();
                self.index.insert(key, self.competitors.len());
                self.competitors.push(competitor);
                MergeOutcome::Inserted
            }
        }
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    pub fn competitors(&self) -> &[CompetitorInfo] {
        &self.competitors
    }

    /// 按发现顺序截断到指定数量
    pub fn into_truncated(mut self, max: usize) -> Vec<CompetitorInfo> {
        self.competitors.truncate(max);
        self.competitors
    }
}
