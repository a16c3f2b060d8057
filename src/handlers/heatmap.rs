//! 热力图颜色题：答案为图片中出现次数最多的 RGB 颜色

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use super::{TaskHandler, SUBMIT_PATH};
use crate::models::{Answer, SubmissionResult};
use crate::services::pixels;
use crate::workflow::TaskCtx;

const IMAGE_PATH: &str = "/project2/heatmap.png";
const TASK_ID_PATH: &str = "/project2-heatmap";
const VISION_INSTRUCTION: &str = "Find the most frequent RGB color in this heatmap image and return it as a hex string like #rrggbb";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{6}\b").expect("hex pattern"));

pub struct HeatmapHandler;

/// 从模型回复中取出 `#rrggbb`，没有则使用整段回复
pub fn hex_from_reply(reply: &str) -> String {
    HEX_COLOR
        .find(reply)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| reply.trim().to_string())
}

#[async_trait]
impl TaskHandler for HeatmapHandler {
    fn name(&self) -> &'static str {
        "heatmap"
    }

    fn matches(&self, url: &str, question: &str) -> bool {
        url.contains("heatmap") || question.contains("heatmap") || question.contains("RGB color")
    }

    async fn solve(&self, ctx: &TaskCtx<'_>) -> Result<SubmissionResult> {
        let image_url = ctx.config.evaluator_url(IMAGE_PATH);
        let artifact = ctx
            .toolkit
            .fetcher
            .fetch(&image_url, Some(&ctx.task.url), ctx.artifacts)
            .await?;

        let color = match pixels::most_frequent_color(&artifact.bytes) {
            Ok(tally) => {
                info!(
                    "{} 🖼️ 图片 {}x{}，出现最多的颜色 {} ({} 像素)",
                    ctx, tally.width, tally.height, tally.dominant, tally.dominant_count
                );
                info!("{} 📊 前几种颜色: {:?}", ctx, tally.top);
                tally.dominant
            }
            Err(e) => {
                warn!("{} ⚠️ 本地解码失败，改用图片理解: {:#}", ctx, e);
                let reply = ctx
                    .toolkit
                    .vision
                    .analyze_image(&artifact.bytes, &artifact.media_type, VISION_INSTRUCTION)
                    .await?;
                hex_from_reply(&reply)
            }
        };

        info!("{} ✅ 答案: {}", ctx, color);
        ctx.submit(
            &ctx.config.evaluator_url(SUBMIT_PATH),
            &ctx.config.evaluator_url(TASK_ID_PATH),
            Answer::Text(color),
        )
        .await
    }
}
