use serde::{Deserialize, Serialize};

use super::Answer;

/// 提交给评测端的请求体
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub email: String,
    pub secret: String,
    /// 题目地址（专用处理器使用固定的题目标识）
    pub url: String,
    pub answer: Answer,
}

/// 评测端的响应
///
/// `correct` 只用于日志，不影响是否继续；`url` 缺失表示题目链结束。
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubmissionResult {
    pub correct: bool,
    pub reason: Option<String>,
    pub url: Option<String>,
}

impl SubmissionResult {
    /// 下一题地址，空字符串视为没有
    pub fn next_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}
