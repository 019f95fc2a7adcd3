use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::generator::context::GeneratorContext;
use crate::generator::research::types::AgentType;
use crate::llm::CompletionRequest;
use crate::llm::client::utils::parse_structured;

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
}

/// 标准的Agent Prompt构建器
pub struct GeneratorPromptBuilder {
    template: PromptTemplate,
}

impl GeneratorPromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// 构建标准的prompt（系统提示词和用户提示词）
    pub fn build_prompts(&self, material: &str, output_schema: &str) -> (String, String) {
        let system_prompt = self.template.system_prompt.clone();

        let mut prompt = String::new();
        // 开头说明性指令
        prompt.push_str(&self.template.opening_instruction);
        prompt.push_str("\n\n");

        prompt.push_str("## Research Material\n");
        prompt.push_str(material);
        prompt.push_str("\n\n");

        prompt.push_str("## Output Format\n");
        prompt.push_str(
            "Respond with a single JSON document that validates against this JSON schema. Do not add commentary.\n",
        );
        prompt.push_str("```json\n");
        prompt.push_str(output_schema);
        prompt.push_str("\n```\n");

        // 结尾强调性指令
        if !self.template.closing_instruction.is_empty() {
            prompt.push('\n');
            prompt.push_str(&self.template.closing_instruction);
        }

        (system_prompt, prompt)
    }
}

/// 极简Agent trait：组织材料 -> 调用模型 -> 严格解析草稿 -> 后处理
#[async_trait]
pub trait StepForwardAgent: Send + Sync {
    /// Agent的输入
    type Input: Send + Sync;

    /// 模型需要返回的结构，其JSON schema会写入prompt
    type Draft: JsonSchema + DeserializeOwned + Send;

    /// 后处理之后的输出
    type Output: Send;

    /// Agent类型标识
    fn agent_type(&self) -> AgentType;

    /// Prompt模板配置
    fn prompt_template(&self) -> PromptTemplate;

    /// 组织写入prompt的调研材料
    fn provide_material(&self, input: &Self::Input) -> String;

    /// 将模型草稿校验并转换为最终输出
    fn post_process(&self, draft: Self::Draft, input: &Self::Input) -> Result<Self::Output>;

    /// 默认实现的execute方法
    async fn execute(&self, context: &GeneratorContext, input: &Self::Input) -> Result<Self::Output> {
        let schema = schemars::schema_for!(Self::Draft);
        let schema_text = serde_json::to_string_pretty(&schema)?;

        let prompt_builder = GeneratorPromptBuilder::new(self.prompt_template());
        let (system_prompt, user_prompt) =
            prompt_builder.build_prompts(&self.provide_material(input), &schema_text);

        let request = CompletionRequest::new(
            self.agent_type().to_string(),
            system_prompt,
            user_prompt,
        );
        let raw = context.llm.complete(&request).await?;

        let draft: Self::Draft = parse_structured(&raw).inspect_err(|e| {
            tracing::warn!("[{}] 模型输出解析失败: {}", self.agent_type(), e);
        })?;
        let output = self.post_process(draft, input)?;
        tracing::debug!("Sub-Agent [{}]执行完成", self.agent_type());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompts_layout() {
        let builder = GeneratorPromptBuilder::new(PromptTemplate {
            system_prompt: "You are an analyst.".to_string(),
            opening_instruction: "Plan the research:".to_string(),
            closing_instruction: "Be concise.".to_string(),
        });
        let (system, user) = builder.build_prompts("Topic: CRM", "{\"type\":\"object\"}");

        assert_eq!(system, "You are an analyst.");
        assert!(user.starts_with("Plan the research:"));
        let material = user.find("Topic: CRM").unwrap();
        let schema = user.find("{\"type\":\"object\"}").unwrap();
        let closing = user.find("Be concise.").unwrap();
        assert!(material < schema && schema < closing);
    }
}
