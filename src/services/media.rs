//! 媒体解析能力 - 业务能力层
//!
//! PDF 文本提取、语音转写、图片理解都是外部能力，这里只定义接口和默认实现，
//! 测试中可以替换为假实现。

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::clients::{ChatOptions, LlmClient};

/// 语音转文字
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe_audio(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// 图片理解
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// 按指令分析图片，返回模型的原始回复
    async fn analyze_image(&self, bytes: &[u8], media_type: &str, instruction: &str)
        -> Result<String>;
}

/// PDF 文本提取
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

#[async_trait]
impl SpeechToText for LlmClient {
    async fn transcribe_audio(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        self.transcribe(file_name, bytes.to_vec()).await
    }
}

#[async_trait]
impl ImageAnalyzer for LlmClient {
    async fn analyze_image(
        &self,
        bytes: &[u8],
        media_type: &str,
        instruction: &str,
    ) -> Result<String> {
        let data_url = image_data_url(bytes, media_type);
        self.send_with_images(
            instruction,
            &[data_url],
            ChatOptions {
                temperature: 0.0,
                max_tokens: 100,
            },
        )
        .await
    }
}

/// 基于 `pdf-extract` 的文本提取，解析过程是同步的，放到阻塞线程池执行
pub struct PdfExtractor;

#[async_trait]
impl PdfTextExtractor for PdfExtractor {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let bytes = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .context("PDF 解析线程异常退出")?
            .context("PDF 文本提取失败")?;
        Ok(text)
    }
}

/// 把图片编码为 data URL，供 Vision API 使用
pub fn image_data_url(bytes: &[u8], media_type: &str) -> String {
    let media_type = if media_type.starts_with("image/") {
        media_type.split(';').next().unwrap_or("image/png").trim()
    } else {
        "image/png"
    };
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}
