//! 统一错误类型

use thiserror::Error;

/// 调研流水线中所有可能出现的错误
#[derive(Debug, Error)]
pub enum ResearchError {
    /// 配置缺失或无效，运行前即失败
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 用户输入不合法
    #[error("invalid research query: {0}")]
    Validation(String),

    #[error("{provider} request timed out after {timeout_secs}s")]
    ProviderTimeout { provider: String, timeout_secs: u64 },

    #[error("{provider} request failed: {message}")]
    ProviderRequest { provider: String, message: String },

    /// 模型输出无法解析为期望的结构
    #[error("could not extract structured output: {0}")]
    Extraction(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResearchError {
    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRequest {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout_secs: u64) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
            timeout_secs,
        }
    }

    /// 网络类错误，可以重试；鉴权失败除外
    pub fn is_transient(&self) -> bool {
        match self {
            ResearchError::ProviderTimeout { .. } => true,
            ResearchError::ProviderRequest { .. } => !self.is_auth_failure(),
            _ => false,
        }
    }

    /// 凭证无效或缺失，换模型或重试都不会成功
    pub fn is_auth_failure(&self) -> bool {
        let ResearchError::ProviderRequest { message, .. } = self else {
            return false;
        };
        let message = message.to_lowercase();
        [
            "401",
            "403",
            "unauthorized",
            "forbidden",
            "invalid api key",
            "invalid_api_key",
            "incorrect api key",
            "authentication",
            "credentials",
        ]
        .iter()
        .any(|marker| message.contains(marker))
    }
}

pub type Result<T, E = ResearchError> = std::result::Result<T, E>;
