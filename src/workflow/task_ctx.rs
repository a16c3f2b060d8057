//! 题目处理上下文
//!
//! 封装"我正在处理题目链中的第几题"以及处理它所需的资源

use std::fmt::Display;

use anyhow::Result;

use crate::config::Config;
use crate::models::{Answer, SolveRequest, SubmissionPayload, SubmissionResult, Task};
use crate::services::TaskArtifacts;
use crate::utils::logging;
use crate::workflow::Toolkit;

/// 题目处理上下文
pub struct TaskCtx<'a> {
    /// 题目在链中的序号（从 1 开始，仅用于日志）
    pub index: usize,
    pub task: &'a Task,
    pub request: &'a SolveRequest,
    pub config: &'a Config,
    pub toolkit: &'a Toolkit,
    /// 本题的附件目录
    pub artifacts: &'a TaskArtifacts,
}

impl TaskCtx<'_> {
    pub fn email(&self) -> &str {
        &self.request.email
    }

    /// 提交答案并记录结果
    ///
    /// # 参数
    /// - `endpoint`: 提交地址
    /// - `task_url`: 请求体中的题目地址
    pub async fn submit(
        &self,
        endpoint: &str,
        task_url: &str,
        answer: Answer,
    ) -> Result<SubmissionResult> {
        let payload = SubmissionPayload {
            email: self.request.email.clone(),
            secret: self.request.secret.clone(),
            url: task_url.to_string(),
            answer,
        };
        let result = self.toolkit.evaluator.submit(endpoint, &payload).await?;
        logging::log_submission(
            self.index,
            result.correct,
            result.reason.as_deref(),
            result.next_url(),
        );
        Ok(result)
    }
}

impl Display for TaskCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 #{}]", self.index)
    }
}
