//! 专用题型处理器
//!
//! 部分题型的页面地址信息不可靠，但题型本身事先已知：这些题目直接从固定地址
//! 获取数据、本地计算答案，并提交到固定的提交地址和题目标识。
//!
//! 处理器按固定顺序匹配，第一个匹配的处理器独占本题。提交之前出错时
//! 报告"未处理"，由通用流程接手；提交阶段出错说明答案已经发出，
//! 错误交给编排层处理，不再走通用流程。

pub mod audio_passphrase;
pub mod csv_normalize;
pub mod github_tree;
pub mod heatmap;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::is_submission_failure;
use crate::models::SubmissionResult;
use crate::workflow::TaskCtx;

pub use audio_passphrase::AudioPassphraseHandler;
pub use csv_normalize::CsvNormalizeHandler;
pub use github_tree::GithubTreeHandler;
pub use heatmap::HeatmapHandler;

/// 专用处理器使用的提交路径
pub const SUBMIT_PATH: &str = "/submit";

#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// 是否识别该题，只依赖题目地址和题干
    fn matches(&self, url: &str, question: &str) -> bool;

    /// 获取数据、计算答案并提交
    async fn solve(&self, ctx: &TaskCtx<'_>) -> Result<SubmissionResult>;
}

/// 处理器的结果
#[derive(Debug)]
pub enum HandlerOutcome {
    Handled(SubmissionResult),
    NotHandled,
    /// 提交阶段失败
    Failed(anyhow::Error),
}

/// 按优先级排列的处理器列表
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new(handlers: Vec<Box<dyn TaskHandler>>) -> Self {
        Self { handlers }
    }

    /// 默认顺序：GitHub 文件树 → 热力图 → CSV 规范化 → 音频口令
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(GithubTreeHandler),
            Box::new(HeatmapHandler),
            Box::new(CsvNormalizeHandler),
            Box::new(AudioPassphraseHandler),
        ])
    }

    /// 第一个匹配的处理器
    pub fn select(&self, url: &str, question: &str) -> Option<&dyn TaskHandler> {
        self.handlers
            .iter()
            .find(|h| h.matches(url, question))
            .map(|h| h.as_ref())
    }

    pub async fn dispatch(&self, ctx: &TaskCtx<'_>) -> HandlerOutcome {
        let Some(handler) = self.select(&ctx.task.url, &ctx.task.question) else {
            return HandlerOutcome::NotHandled;
        };

        info!("{} 🔧 识别为专用题型: {}", ctx, handler.name());
        match handler.solve(ctx).await {
            Ok(result) => HandlerOutcome::Handled(result),
            Err(e) if is_submission_failure(&e) => {
                warn!("{} ⚠️ 专用处理器 {} 提交失败: {:#}", ctx, handler.name(), e);
                HandlerOutcome::Failed(e)
            }
            Err(e) => {
                warn!(
                    "{} ⚠️ 专用处理器 {} 失败，转入通用流程: {:#}",
                    ctx,
                    handler.name(),
                    e
                );
                HandlerOutcome::NotHandled
            }
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(url: &str, question: &str) -> Option<&'static str> {
        HandlerRegistry::standard()
            .select(url, question)
            .map(|h| h.name())
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            selected("https://h.test/project2-gh-tree", ""),
            Some("github-tree")
        );
        // 同时提到 heatmap 和 audio 时热力图优先
        assert_eq!(
            selected("https://h.test/q", "heatmap and audio"),
            Some("heatmap")
        );
        assert_eq!(
            selected("https://h.test/q", "Clean messy.csv and transcribe audio"),
            Some("csv-normalize")
        );
        assert_eq!(
            selected("https://h.test/project2-audio-passphrase", ""),
            Some("audio-passphrase")
        );
        assert_eq!(selected("https://h.test/quiz/1", "Sum the column"), None);
    }
}
