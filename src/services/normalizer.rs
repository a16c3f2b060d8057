//! 附件内容整理 - 业务能力层
//!
//! 把下载的附件转换为可供 LLM 阅读的文本段落，表格数据额外解析出数字。

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::SolveError;
use crate::models::Artifact;
use crate::services::media::{PdfTextExtractor, SpeechToText};
use crate::services::{pixels, tabular};

/// 附件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Pdf,
    Csv,
    Json,
    Audio,
    Image,
    Text,
    Other,
}

impl MediaKind {
    /// 根据 Content-Type 和本地扩展名判断类型，Content-Type 优先
    pub fn classify(media_type: &str, extension: Option<&str>) -> Self {
        let media_type = media_type.to_ascii_lowercase();
        let ext = extension.unwrap_or_default();

        if media_type.contains("pdf") || ext == "pdf" {
            MediaKind::Pdf
        } else if media_type.contains("csv") || ext == "csv" {
            MediaKind::Csv
        } else if media_type.contains("json") || ext == "json" {
            MediaKind::Json
        } else if media_type.starts_with("audio/")
            || matches!(ext, "opus" | "ogg" | "mp3" | "wav" | "m4a")
        {
            MediaKind::Audio
        } else if media_type.starts_with("image/")
            || matches!(ext, "png" | "jpg" | "jpeg" | "gif" | "webp")
        {
            MediaKind::Image
        } else if media_type.is_empty()
            || media_type.starts_with("text/")
            || media_type.contains("html")
            || media_type.contains("xml")
            || matches!(ext, "txt" | "html")
        {
            MediaKind::Text
        } else {
            MediaKind::Other
        }
    }
}

/// 单个附件整理后的结果
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedData {
    pub kind: MediaKind,
    /// 带来源标记的文本段落
    pub section: String,
    /// 表格数据中逐行解析出的数字
    pub numbers: Vec<f64>,
}

/// 附件整理器
#[derive(Clone)]
pub struct ArtifactNormalizer {
    pdf: Arc<dyn PdfTextExtractor>,
    speech: Arc<dyn SpeechToText>,
}

impl ArtifactNormalizer {
    pub fn new(pdf: Arc<dyn PdfTextExtractor>, speech: Arc<dyn SpeechToText>) -> Self {
        Self { pdf, speech }
    }

    /// 整理附件
    ///
    /// # 参数
    /// - `reference`: 题目中的原始引用，用于标记段落来源
    /// - `artifact`: 已下载的附件
    pub async fn normalize(&self, reference: &str, artifact: &Artifact) -> Result<NormalizedData> {
        let extension = artifact.extension();
        let kind = MediaKind::classify(&artifact.media_type, extension.as_deref());
        debug!("附件 {} ({}) 识别为 {:?}", reference, artifact.source_url, kind);

        let mut numbers = Vec::new();
        let section = match kind {
            MediaKind::Pdf => {
                let text = self
                    .pdf
                    .extract_text(&artifact.bytes)
                    .await
                    .map_err(|e| SolveError::artifact(reference, format!("{:#}", e)))?;
                info!("📄 PDF 文本长度 {}", text.chars().count());
                format!("PDF Content ({}):\n{}", reference, text)
            }
            MediaKind::Csv => {
                let text = artifact.text();
                numbers = tabular::parse_numeric_lines(&text);
                if let Some(summary) = tabular::summarize(&numbers) {
                    info!(
                        "📊 CSV 统计: count={}, sum={}, avg={:.2}, min={}, max={}",
                        summary.count, summary.sum, summary.avg, summary.min, summary.max
                    );
                }
                format!("CSV Content ({}):\n{}", reference, text)
            }
            MediaKind::Json => {
                let value: serde_json::Value = serde_json::from_slice(&artifact.bytes)
                    .with_context(|| format!("JSON 解析失败: {}", reference))?;
                let pretty = serde_json::to_string_pretty(&value)?;
                format!("JSON Content ({}):\n{}", reference, pretty)
            }
            MediaKind::Audio => {
                let file_name = artifact
                    .location
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "audio.opus".to_string());
                let transcript = self
                    .speech
                    .transcribe_audio(&file_name, &artifact.bytes)
                    .await
                    .map_err(|e| SolveError::artifact(reference, format!("{:#}", e)))?;
                info!("🎵 转写结果: {}", transcript);
                format!("Audio Transcript ({}):\n{}", reference, transcript)
            }
            MediaKind::Image => {
                let tally = pixels::most_frequent_color(&artifact.bytes)
                    .map_err(|e| SolveError::artifact(reference, format!("{:#}", e)))?;
                format!(
                    "Image Content ({}):\nsize {}x{}, most frequent color {} ({} pixels)",
                    reference, tally.width, tally.height, tally.dominant, tally.dominant_count
                )
            }
            MediaKind::Text => format!("HTML/Text Content ({}):\n{}", reference, artifact.text()),
            MediaKind::Other => format!(
                "File downloaded: {} from {} ({})",
                reference,
                artifact.source_url,
                if artifact.media_type.is_empty() {
                    "unknown"
                } else {
                    artifact.media_type.as_str()
                }
            ),
        };

        Ok(NormalizedData {
            kind,
            section,
            numbers,
        })
    }
}
