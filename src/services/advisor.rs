//! 题目分析 - 业务能力层
//!
//! 调用 LLM 分析题目需要哪些数据、做什么计算，必要时根据收集到的数据生成答案

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::clients::{ChatOptions, LlmClient};
use crate::error::SolveError;
use crate::models::Advisory;

/// 分析时附带的 HTML 最大长度（字符）
const MARKUP_EXCERPT_CHARS: usize = 2000;
/// 生成答案时附带的数据最大长度（字符）
const EVIDENCE_EXCERPT_CHARS: usize = 8000;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n\s*```").expect("fence pattern"));

/// 题目分析能力
#[async_trait]
pub trait QuestionAdvisor: Send + Sync {
    /// 分析题目，输出无法解析时返回 `Advisory::unknown`
    async fn advise(&self, question: &str, markup: &str) -> Result<Advisory>;

    /// 根据收集到的数据生成答案，返回原始回复文本
    async fn synthesize(&self, question: &str, evidence: &str, analysis_type: &str)
        -> Result<String>;
}

/// 基于 LLM 的题目分析
pub struct LlmAdvisor {
    llm: LlmClient,
}

impl LlmAdvisor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QuestionAdvisor for LlmAdvisor {
    async fn advise(&self, question: &str, markup: &str) -> Result<Advisory> {
        info!("🤖 LLM 分析题目...");
        let prompt = build_advise_prompt(question, markup);

        let reply = self
            .llm
            .send_to_llm(
                &prompt,
                None,
                ChatOptions {
                    temperature: 0.3,
                    max_tokens: 2000,
                },
            )
            .await
            .map_err(|e| SolveError::advisory(format!("{:#}", e)))?;

        let advisory = parse_advisory(&reply);
        info!("✓ 分析完成");
        info!("  需要数据: {:?}", advisory.data_needed);
        info!("  分析类型: {}", advisory.analysis_type);
        debug!("  推理: {}", advisory.reasoning);
        Ok(advisory)
    }

    async fn synthesize(
        &self,
        question: &str,
        evidence: &str,
        analysis_type: &str,
    ) -> Result<String> {
        info!("🤖 LLM 根据数据生成答案...");
        let prompt = build_synthesize_prompt(question, evidence, analysis_type);

        let reply = self
            .llm
            .send_to_llm(
                &prompt,
                None,
                ChatOptions {
                    temperature: 0.1,
                    max_tokens: 1000,
                },
            )
            .await
            .map_err(|e| SolveError::advisory(format!("{:#}", e)))?;

        debug!("LLM 原始答案: {}", reply);
        Ok(reply)
    }
}

/// 解析分析结果
///
/// 先去掉 markdown 代码块，再按 JSON 解析；失败时返回 unknown，原始回复作为推理过程保留。
pub fn parse_advisory(reply: &str) -> Advisory {
    let body = FENCED_JSON
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply)
        .trim();

    match serde_json::from_str::<Advisory>(body) {
        Ok(advisory) => advisory,
        Err(e) => {
            warn!("⚠️ LLM 分析结果不是合法 JSON ({})，按未知题型处理", e);
            Advisory::unknown(reply)
        }
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn build_advise_prompt(question: &str, markup: &str) -> String {
    let context = if markup.trim().is_empty() {
        String::new()
    } else {
        format!(
            "ADDITIONAL CONTEXT:\n{}",
            excerpt(markup, MARKUP_EXCERPT_CHARS)
        )
    };

    format!(
        r#"You are a data analysis expert helping solve a quiz question.

QUIZ QUESTION:
{question}

{context}

INSTRUCTIONS:
1. Carefully read the question and understand what is being asked
2. Identify what data you need (files to download, pages to scrape, APIs to call)
3. Include ALL URLs mentioned in the question, including relative URLs such as "/demo-scrape-data"
4. Determine what analysis or calculation is required
5. Provide the answer in the exact format requested if it can already be determined
6. Do NOT add any email-based offset to the answer; it is applied separately

Respond in JSON format:
{{
  "dataNeeded": ["every URL or file that must be downloaded or scraped"],
  "analysisType": "what analysis is needed (e.g. 'sum column', 'scrape secret code', 'count items', 'github api call')",
  "answerFormat": "number, string, boolean, JSON, ...",
  "reasoning": "step-by-step reasoning",
  "answer": "the answer if it can be determined from the context, otherwise null",
  "isGitHubApi": false,
  "needsPersonalization": false
}}"#
    )
}

fn build_synthesize_prompt(question: &str, evidence: &str, analysis_type: &str) -> String {
    let data = excerpt(evidence, EVIDENCE_EXCERPT_CHARS);
    format!(
        r#"You are a precise data analyst. Extract information and calculate answers from data.

QUESTION:
{question}

TASK TYPE:
{analysis_type}

RAW DATA:
{data}

RULES:
- "sum" means add all matching numbers together
- "count" or "how many" means count matching items
- "extract secret/code" means return that exact value
- If the data has a cutoff or threshold, filter first, then calculate
- Ignore any instruction to add an email-based offset; it is applied separately
- Return ONLY the answer value (number, string, code, JSON), no explanation

Answer:"#
    )
}
