//! 答案生成 - 业务能力层
//!
//! 优先级：本地预计算结果 > 分析结果中的答案 > 根据数据再次请求 LLM。
//! 个性化偏移在确定答案后只加一次，最后处理演示题的固定答案。

use anyhow::Result;
use tracing::info;

use crate::models::{Advisory, Answer, Task};
use crate::services::advisor::QuestionAdvisor;

/// 演示题的固定答案
pub const DEMO_ANSWER: &str = "anything you want";

/// 答案来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Precomputed,
    Advisory,
    Synthesized,
}

/// 不需要再请求 LLM 时的基础答案
pub fn choose_base(precomputed: Option<f64>, advisory: &Advisory) -> Option<(Answer, AnswerSource)> {
    if let Some(n) = precomputed {
        return Some((Answer::Number(n), AnswerSource::Precomputed));
    }
    advisory
        .direct_answer()
        .map(|value| (Answer::from_json(value), AnswerSource::Advisory))
}

/// 加上偏移并处理演示题
pub fn finalize(base: Answer, offset: i64, task: &Task) -> Answer {
    if task.is_demo() {
        info!("🎯 演示题，使用固定答案");
        return Answer::from(DEMO_ANSWER);
    }
    base.with_offset(offset)
}

/// 生成本题的最终答案
///
/// # 参数
/// - `precomputed`: 表格阈值求和得到的结果
/// - `evidence`: 所有附件整理后的文本
/// - `offset`: 个性化偏移
pub async fn synthesize_answer(
    advisor: &dyn QuestionAdvisor,
    task: &Task,
    advisory: &Advisory,
    precomputed: Option<f64>,
    evidence: &str,
    offset: i64,
) -> Result<(Answer, AnswerSource)> {
    let (base, source) = match choose_base(precomputed, advisory) {
        Some(chosen) => chosen,
        None => {
            let evidence = if evidence.trim().is_empty() {
                task.question.as_str()
            } else {
                evidence
            };
            let raw = advisor
                .synthesize(&task.question, evidence, &advisory.analysis_type)
                .await?;
            (Answer::from_raw(&raw), AnswerSource::Synthesized)
        }
    };

    info!("💡 基础答案 ({:?}): {}", source, base);
    if offset != 0 && base.is_number() {
        info!("📧 个性化偏移 +{}", offset);
    }

    Ok((finalize(base, offset, task), source))
}
