use serde::de::DeserializeOwned;

use crate::config::LLMConfig;
use crate::error::{ResearchError, Result};

/// 短prompt优先使用高能效模型，并以高质量模型兜底；长prompt直接使用高质量模型
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= 32 * 1024 {
        let fallover = (llm_config.model_powerful != llm_config.model_efficient
            && !llm_config.model_powerful.is_empty())
        .then(|| llm_config.model_powerful.clone());
        return (llm_config.model_efficient.clone(), fallover);
    }
    (llm_config.model_powerful.clone(), None)
}

/// 从模型回复中提取JSON片段：优先取代码块，其次取第一个括号平衡且可解析的对象或数组
pub fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(block) = extract_fenced_block(text) {
        return Some(block);
    }

    // 正文中的引用标记如[1]、占位符如{topic}也是括号平衡的，需跳过
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .filter_map(|(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
        .find(|candidate| is_json(candidate))
}

fn extract_fenced_block(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        // 跳过语言标记，例如```json
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        let close = body.find("```")?;
        let candidate = body[..close].trim();
        if (candidate.starts_with('{') || candidate.starts_with('[')) && is_json(candidate) {
            return Some(candidate);
        }
        rest = &body[close + 3..];
    }
    None
}

fn is_json(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

/// 返回与开头括号匹配的结束位置（不含），忽略字符串中的括号
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// 将模型回复严格解析为目标结构
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let block = extract_json_block(raw).ok_or_else(|| {
        ResearchError::Extraction("model response did not contain a JSON object".to_string())
    })?;
    serde_json::from_str(block).map_err(|e| ResearchError::Extraction(e.to_string()))
}
