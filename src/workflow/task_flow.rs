//! 题目处理流程 - 流程层
//!
//! 核心职责：定义没有专用处理器的题目的通用处理流程
//!
//! 流程顺序：
//! 1. LLM 分析题目（失败即本题失败）
//! 2. 收集附件：页面走浏览器渲染（失败回退为下载），数据文件直接下载
//! 3. 个性化偏移
//! 4. 确定答案：预计算 > 分析结果 > 根据数据生成
//! 5. 确定提交地址并提交

use anyhow::Result;
use tracing::{info, warn};

use crate::browser::find_submit_link;
use crate::models::{Advisory, SubmissionResult, Task};
use crate::services::{
    personalization, resolve_url, synthesize_answer, tabular, MediaKind, ReferenceKind,
};
use crate::workflow::TaskCtx;

/// 收集到的数据
#[derive(Debug, Default)]
pub struct Evidence {
    /// 所有附件整理后的文本，按来源分段
    pub text: String,
    /// 表格阈值求和的结果
    pub precomputed: Option<f64>,
}

impl Evidence {
    fn push_section(&mut self, section: &str) {
        self.text.push_str("\n\n");
        self.text.push_str(section);
    }
}

/// 通用流程
pub async fn run(ctx: &TaskCtx<'_>) -> Result<SubmissionResult> {
    let task = ctx.task;

    // ========== 1. 分析题目 ==========
    let advisory = ctx
        .toolkit
        .advisor
        .advise(&task.question, &task.markup)
        .await?;

    // ========== 2. 收集附件 ==========
    let evidence = gather_evidence(ctx, &advisory).await;

    // ========== 3. 个性化 ==========
    let offset = personalization::offset_for(&task.question, ctx.email());
    if offset != 0 {
        info!(
            "{} 📧 个性化: 邮箱长度 {} → 偏移 {}",
            ctx,
            ctx.email().chars().count(),
            offset
        );
    }

    // ========== 4. 确定答案 ==========
    let (answer, source) = synthesize_answer(
        ctx.toolkit.advisor.as_ref(),
        task,
        &advisory,
        evidence.precomputed,
        &evidence.text,
        offset,
    )
    .await?;
    info!("{} ✅ 最终答案 ({:?}): {}", ctx, source, answer);

    // ========== 5. 提交 ==========
    let endpoint = resolve_submit_endpoint(task)?;
    ctx.submit(&endpoint, &task.url, answer).await
}

/// 依次处理分析结果中列出的附件，单个附件失败只记录日志
pub async fn gather_evidence(ctx: &TaskCtx<'_>, advisory: &Advisory) -> Evidence {
    let mut evidence = Evidence::default();

    for reference in &advisory.data_needed {
        if let Err(e) = gather_one(ctx, advisory, reference, &mut evidence).await {
            warn!("{} ⚠️ 附件处理失败，已跳过 {}: {:#}", ctx, reference, e);
        }
    }

    evidence
}

async fn gather_one(
    ctx: &TaskCtx<'_>,
    advisory: &Advisory,
    reference: &str,
    evidence: &mut Evidence,
) -> Result<()> {
    let task = ctx.task;

    if ReferenceKind::classify(reference, advisory) == ReferenceKind::Renderable {
        let url = resolve_url(reference, Some(&task.url))?;
        info!("{} 🌐 使用浏览器读取 {}", ctx, url);
        match ctx.toolkit.acquirer.acquire(&url).await {
            Ok(page) => {
                evidence.push_section(&format!(
                    "Scraped Content from {}:\n{}",
                    reference, page.text
                ));
                return Ok(());
            }
            Err(e) => {
                warn!("{} ⚠️ 浏览器读取失败，改为直接下载: {:#}", ctx, e);
            }
        }
    }

    let artifact = ctx
        .toolkit
        .fetcher
        .fetch(reference, Some(&task.url), ctx.artifacts)
        .await?;
    let data = ctx.toolkit.normalizer.normalize(reference, &artifact).await?;
    evidence.push_section(&data.section);

    if data.kind == MediaKind::Csv && !data.numbers.is_empty() {
        if let Some(threshold) = tabular::extract_threshold(&task.question) {
            let sum = tabular::sum_above(&data.numbers, threshold);
            info!("{} 💡 预计算: 大于 {} 的数之和 = {}", ctx, threshold, sum);
            evidence.precomputed = Some(sum);
        }
    }

    Ok(())
}

/// 确定提交地址
///
/// 顺序：页面中发现的地址 → 题干中的 `/submit` 地址 → HTML 中的 `/submit` 地址 →
/// 题目所在站点的 `/submit`。相对地址按题目地址解析。
pub fn resolve_submit_endpoint(task: &Task) -> Result<String> {
    let found = task
        .submit_endpoint
        .clone()
        .or_else(|| find_submit_link(&task.question))
        .or_else(|| find_submit_link(&task.markup));

    match found {
        Some(endpoint) => resolve_url(&endpoint, Some(&task.url)),
        None => resolve_url("/submit", Some(&task.url)),
    }
}
