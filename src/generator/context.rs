use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::llm::client::LLMClient;
use crate::search::{SearchProvider, TavilyClient};

#[derive(Clone)]
pub struct GeneratorContext {
    /// 语言模型服务
    pub llm: Arc<dyn LanguageModel>,
    /// 网络搜索服务
    pub search: Arc<dyn SearchProvider>,
    /// 配置
    pub config: Config,
}

impl GeneratorContext {
    /// 基于配置创建真实的服务客户端
    pub fn new(config: Config) -> Result<Self> {
        let llm = Arc::new(LLMClient::new(config.clone())?);
        let search = Arc::new(TavilyClient::new(&config.search)?);
        Ok(Self {
            llm,
            search,
            config,
        })
    }

    /// 使用外部注入的服务实现
    pub fn with_providers(
        config: Config,
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            llm,
            search,
            config,
        }
    }
}
