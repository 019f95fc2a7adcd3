use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ResearchError, Result};

/// 数据质量评分，只在存在置信度数据时计算
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum DataQualityScore {
    Calculated(f64),
    NotCalculated,
}

impl DataQualityScore {
    /// 各关注领域置信度的算术平均值
    pub fn from_confidence(levels: &BTreeMap<String, f64>) -> Self {
        if levels.is_empty() {
            return DataQualityScore::NotCalculated;
        }
        let sum: f64 = levels.values().sum();
        DataQualityScore::Calculated(sum / levels.len() as f64)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            DataQualityScore::Calculated(v) => Some(*v),
            DataQualityScore::NotCalculated => None,
        }
    }
}

impl std::fmt::Display for DataQualityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataQualityScore::Calculated(v) => write!(f, "{:.1}/100", v),
            DataQualityScore::NotCalculated => write!(f, "Not calculated"),
        }
    }
}

/// 信息缺口分析结果，构造后不可修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "GapAnalysisRecord")]
pub struct GapAnalysis {
    confidence_levels: BTreeMap<String, f64>,
    priority_gaps: Vec<String>,
    missing_information: Vec<String>,
    suggested_queries: Vec<String>,
    data_quality_score: DataQualityScore,
}

/// 反序列化时忽略存储的评分，经由 `GapAnalysis::new` 重新校验并计算
#[derive(Deserialize)]
struct GapAnalysisRecord {
    confidence_levels: BTreeMap<String, f64>,
    priority_gaps: Vec<String>,
    missing_information: Vec<String>,
    suggested_queries: Vec<String>,
}

impl TryFrom<GapAnalysisRecord> for GapAnalysis {
    type Error = ResearchError;

    fn try_from(record: GapAnalysisRecord) -> Result<Self> {
        GapAnalysis::new(
            record.confidence_levels,
            record.priority_gaps,
            record.missing_information,
            record.suggested_queries,
        )
    }
}

impl GapAnalysis {
    /// 置信度必须是 [0, 100] 区间内的有限数
    pub fn new(
        confidence_levels: BTreeMap<String, f64>,
        priority_gaps: Vec<String>,
        missing_information: Vec<String>,
        suggested_queries: Vec<String>,
    ) -> Result<Self> {
        if let Some((area, score)) = confidence_levels
            .iter()
            .find(|(_, score)| !score.is_finite() || !(0.0..=100.0).contains(*score))
        {
            return Err(ResearchError::Extraction(format!(
                "confidence level for '{}' is out of range: {}",
                area, score
            )));
        }

        let data_quality_score = DataQualityScore::from_confidence(&confidence_levels);
        Ok(Self {
            confidence_levels,
            priority_gaps,
            missing_information,
            suggested_queries,
            data_quality_score,
        })
    }

    /// 分析失败时的降级结果
    pub fn unavailable(reason: &str) -> Self {
        Self {
            confidence_levels: BTreeMap::new(),
            priority_gaps: Vec::new(),
            missing_information: vec![format!("Gap analysis unavailable: {}", reason)],
            suggested_queries: Vec::new(),
            data_quality_score: DataQualityScore::NotCalculated,
        }
    }

    pub fn confidence_levels(&self) -> &BTreeMap<String, f64> {
        &self.confidence_levels
    }

    pub fn priority_gaps(&self) -> &[String] {
        &self.priority_gaps
    }

    pub fn missing_information(&self) -> &[String] {
        &self.missing_information
    }

    pub fn suggested_queries(&self) -> &[String] {
        &self.suggested_queries
    }

    pub fn data_quality_score(&self) -> DataQualityScore {
        self.data_quality_score
    }

    /// 置信度低于阈值的关注领域
    pub fn low_confidence_areas(&self, threshold: f64) -> Vec<&str> {
        self.confidence_levels
            .iter()
            .filter(|(_, score)| **score < threshold)
            .map(|(area, _)| area.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_mean_of_confidence() {
        let levels = BTreeMap::from([("pricing".to_string(), 80.0), ("features".to_string(), 60.0)]);
        let analysis = GapAnalysis::new(levels, vec![], vec![], vec![]).unwrap();
        assert_eq!(analysis.data_quality_score(), DataQualityScore::Calculated(70.0));
    }

    #[test]
    fn test_empty_confidence_is_not_calculated() {
        let analysis = GapAnalysis::new(BTreeMap::new(), vec![], vec![], vec![]).unwrap();
        assert_eq!(analysis.data_quality_score(), DataQualityScore::NotCalculated);
        assert_eq!(analysis.data_quality_score().value(), None);
        assert_eq!(analysis.data_quality_score().to_string(), "Not calculated");
    }

    #[test]
    fn test_out_of_range_confidence_rejected() {
        let levels = BTreeMap::from([("pricing".to_string(), 120.0)]);
        let err = GapAnalysis::new(levels, vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ResearchError::Extraction(_)));

        let levels = BTreeMap::from([("pricing".to_string(), f64::NAN)]);
        assert!(GapAnalysis::new(levels, vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn test_unavailable() {
        let analysis = GapAnalysis::unavailable("model timed out");
        assert!(analysis.confidence_levels().is_empty());
        assert_eq!(analysis.data_quality_score(), DataQualityScore::NotCalculated);
        assert!(analysis.missing_information()[0].contains("model timed out"));
    }

    #[test]
    fn test_low_confidence_areas() {
        let levels = BTreeMap::from([
            ("funding".to_string(), 40.0),
            ("pricing".to_string(), 90.0),
            ("technology".to_string(), 59.9),
        ]);
        let analysis = GapAnalysis::new(levels, vec![], vec![], vec![]).unwrap();
        assert_eq!(analysis.low_confidence_areas(60.0), vec!["funding", "technology"]);
    }

    #[test]
    fn test_score_serialization() {
        let json = serde_json::to_value(DataQualityScore::Calculated(70.0)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "calculated", "value": 70.0}));
        let json = serde_json::to_value(DataQualityScore::NotCalculated).unwrap();
        assert_eq!(json, serde_json::json!({"status": "not_calculated"}));
    }

    #[test]
    fn test_deserialize_recomputes_score() {
        let json = serde_json::json!({
            "confidence_levels": {"pricing": 40.0, "features": 60.0},
            "priority_gaps": [],
            "missing_information": [],
            "suggested_queries": [],
            "data_quality_score": {"status": "calculated", "value": 99.0}
        });
        let analysis: GapAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(analysis.data_quality_score(), DataQualityScore::Calculated(50.0));

        let out_of_range = serde_json::json!({
            "confidence_levels": {"pricing": 140.0},
            "priority_gaps": [],
            "missing_information": [],
            "suggested_queries": []
        });
        assert!(serde_json::from_value::<GapAnalysis>(out_of_range).is_err());
    }
}
