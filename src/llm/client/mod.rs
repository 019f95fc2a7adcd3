//! LLM客户端 - 提供统一的LLM服务接口

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ResearchError, Result};
use crate::llm::client::utils::evaluate_befitting_model;
use crate::llm::{CompletionRequest, LanguageModel};

mod providers;
pub mod utils;

use providers::ProviderClient;

/// LLM客户端 - 基于rig的LanguageModel实现
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    fn provider_name(&self) -> String {
        self.config.llm.provider.to_string()
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        let request = CompletionRequest::new(
            "ConnectionCheck",
            "You are a helpful assistant.".to_string(),
            "Reply with the single word: pong".to_string(),
        );
        match self.prompt_once(&self.config.llm.model_efficient, &request).await {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let llm_config = &self.config.llm;
        retry_with_backoff(llm_config.retry_attempts, llm_config.retry_delay_ms, operation).await
    }

    /// 单次调用，带超时
    async fn prompt_once(&self, model: &str, request: &CompletionRequest) -> Result<String> {
        let llm_config = &self.config.llm;
        let agent = self
            .client
            .create_agent(model, &request.system_prompt, llm_config);
        let timeout = Duration::from_secs(llm_config.timeout_seconds);

        match tokio::time::timeout(timeout, agent.prompt(&request.user_prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ResearchError::request(self.provider_name(), e.to_string())),
            Err(_) => Err(ResearchError::timeout(
                self.provider_name(),
                llm_config.timeout_seconds,
            )),
        }
    }

    async fn prompt_inner(
        &self,
        request: &CompletionRequest,
        befitting_model: String,
        fallover_model: Option<String>,
    ) -> Result<String> {
        let err = match self
            .retry_with_backoff(|| self.prompt_once(&befitting_model, request))
            .await
        {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        let fallover_model = fallover_model.filter(|_| !err.is_auth_failure());
        let Some(model) = fallover_model else {
            tracing::error!(
                "[{}] 调用模型服务出错，尝试 {} 次均失败: {}",
                request.log_tag,
                self.config.llm.retry_attempts,
                err
            );
            return Err(err);
        };

        tracing::warn!(
            "[{}] 模型 {} 尝试 {} 次均失败，尝试使用备选模型 {}: {}",
            request.log_tag,
            befitting_model,
            self.config.llm.retry_attempts,
            model,
            err
        );
        self.retry_with_backoff(|| self.prompt_once(&model, request))
            .await
            .inspect_err(|e| {
                tracing::error!("[{}] 备选模型 {} 同样失败: {}", request.log_tag, model, e)
            })
    }
}

/// 通用重试逻辑：仅对可重试错误按固定间隔重试
async fn retry_with_backoff<T, F, Fut>(max_retries: u32, retry_delay_ms: u64, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_retries = max_retries.max(1);
    let mut retries = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                retries += 1;
                if retries >= max_retries || !err.is_transient() {
                    return Err(err);
                }
                tracing::warn!(
                    "调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                    retries,
                    max_retries,
                    err
                );
                tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
            }
        }
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    fn name(&self) -> String {
        format!("{} ({})", self.provider_name(), self.config.llm.model_efficient)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let (befitting_model, fallover_model) = evaluate_befitting_model(
            &self.config.llm,
            &request.system_prompt,
            &request.user_prompt,
        );
        tracing::debug!("[{}] 使用模型 {}", request.log_tag, befitting_model);
        self.prompt_inner(request, befitting_model, fallover_model)
            .await
    }
}
