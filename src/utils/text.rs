use std::collections::HashSet;

/// 去除首尾空白、丢弃空串，并按大小写不敏感的方式保序去重
pub fn dedup_case_insensitive<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            result.push(trimmed.to_string());
        }
    }
    result
}

/// 精确去重的保序合并，`target`中已有的值保持原位
pub fn union_exact(target: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        let trimmed = item.trim();
        if trimmed.is_empty() || target.iter().any(|existing| existing == trimmed) {
            continue;
        }
        target.push(trimmed.to_string());
    }
}

/// 按字符截断，避免切断多字节字符
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// 空白字符串视为缺失
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
