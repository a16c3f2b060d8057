/// LLM API 客户端
///
/// 封装所有与 LLM API 相关的调用逻辑（对话、图片理解、语音转写）
///
/// ## 技术栈
/// - 使用 `async-openai` crate 进行 API 调用
/// - 兼容 OpenAI API 的服务（如 AI Pipe / OpenRouter）
/// - 每次调用只发一次请求，不自动重试，超过 `request_timeout` 即失败
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::audio::{AudioInput, CreateTranscriptionRequestArgs},
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use backoff::ExponentialBackoff;
use tracing::{debug, warn};

use crate::config::Config;

/// 单次对话请求的参数
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1024,
        }
    }
}

/// LLM 客户端
#[derive(Clone)]
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    vision_model_name: String,
    transcription_model_name: String,
    /// 单次调用的超时
    timeout: Duration,
}

/// 只尝试一次的重试策略
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..ExponentialBackoff::default()
    }
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config).with_backoff(single_attempt()),
            model_name: config.llm_model_name.clone(),
            vision_model_name: config.vision_model_name.clone(),
            transcription_model_name: config.transcription_model_name.clone(),
            timeout: config.request_timeout(),
        }
    }

    /// 给一次 API 调用加上超时
    async fn call<T, E>(&self, what: &str, fut: impl Future<Output = Result<T, E>>) -> Result<T>
    where
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("{} 调用失败: {}", what, e);
                Err(anyhow::anyhow!("{} 调用失败: {}", what, e))
            }
            Err(_) => {
                warn!("{} 调用超时 ({} 秒)", what, self.timeout.as_secs());
                Err(anyhow::anyhow!(
                    "{} 调用超时 ({} 秒)",
                    what,
                    self.timeout.as_secs()
                ))
            }
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `options`: 温度与最大 token 数
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        options: ChatOptions,
    ) -> Result<String> {
        self.complete(&self.model_name, user_message, system_message, &[], options)
            .await
    }

    /// 带图片的 LLM 调用，图片以 URL 或 data URL 形式传入
    pub async fn send_with_images(
        &self,
        user_message: &str,
        image_urls: &[String],
        options: ChatOptions,
    ) -> Result<String> {
        self.complete(&self.vision_model_name, user_message, None, image_urls, options)
            .await
    }

    async fn complete(
        &self,
        model: &str,
        user_message: &str,
        system_message: Option<&str>,
        image_urls: &[String],
        options: ChatOptions,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", model);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if image_urls.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()?
        } else {
            debug!("使用 Vision API，包含 {} 张图片", image_urls.len());

            let mut content_parts = vec![ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            )];
            content_parts.extend(image_urls.iter().map(|url| {
                ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                )
            }));

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()?
        };
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(options.temperature)
            .max_tokens(options.max_tokens)
            .build()?;

        let response = self
            .call("LLM API", self.client.chat().create(request))
            .await?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 语音转文字
    ///
    /// # 参数
    /// - `file_name`: 文件名，服务端据此判断音频格式
    /// - `bytes`: 音频内容
    pub async fn transcribe(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        debug!(
            "调用语音转写 API，模型: {}，{} 字节",
            self.transcription_model_name,
            bytes.len()
        );

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name.to_string(), bytes))
            .model(&self.transcription_model_name)
            .build()?;

        let response = self
            .call(
                "语音转写 API",
                self.client.audio().transcription().create(request),
            )
            .await?;

        Ok(response.text.trim().to_string())
    }
}
