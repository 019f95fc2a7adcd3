//! 语言模型接入层

use async_trait::async_trait;

use crate::error::Result;

pub mod client;

/// 一次模型调用的输入
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// 日志标签，一般为发起调用的Agent类型
    pub log_tag: String,
}

impl CompletionRequest {
    pub fn new(log_tag: impl Into<String>, system_prompt: String, user_prompt: String) -> Self {
        Self {
            system_prompt,
            user_prompt,
            log_tag: log_tag.into(),
        }
    }
}

/// 语言模型服务的抽象，流水线只依赖该trait
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 服务名称，用于日志和报告中的数据来源
    fn name(&self) -> String;

    /// 单轮对话，返回模型的原始文本
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
