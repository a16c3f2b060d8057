use thiserror::Error;

/// 解题过程中的错误分类
///
/// 流程内部统一使用 `anyhow::Result` 传播，需要被编排层识别的错误
/// 以 `SolveError` 的形式放入错误链中。
#[derive(Debug, Error)]
pub enum SolveError {
    /// 页面渲染或导航失败
    #[error("页面渲染失败 ({url}): {message}")]
    Acquisition { url: String, message: String },

    /// 单个附件下载或解析失败
    #[error("附件处理失败 ({reference}): {message}")]
    Artifact { reference: String, message: String },

    /// LLM 分析或生成答案失败
    #[error("LLM 分析失败: {0}")]
    Advisory(String),

    /// 提交失败，评测端可能在错误响应中附带了下一题地址
    #[error("提交失败 ({endpoint}): {message}")]
    Submission {
        endpoint: String,
        message: String,
        continuation: Option<String>,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 解题请求字段不合法
    #[error("请求无效: {0}")]
    InvalidRequest(String),

    /// 邮箱或密钥与配置不符
    #[error("身份校验失败")]
    Forbidden,
}

impl SolveError {
    pub fn acquisition(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SolveError::Acquisition {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn artifact(reference: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SolveError::Artifact {
            reference: reference.into(),
            message: message.to_string(),
        }
    }

    pub fn advisory(message: impl std::fmt::Display) -> Self {
        SolveError::Advisory(message.to_string())
    }

    /// 错误中携带的下一题地址
    pub fn continuation_url(&self) -> Option<&str> {
        match self {
            SolveError::Submission { continuation, .. } => continuation.as_deref(),
            _ => None,
        }
    }
}

/// 错误是否发生在提交阶段（答案已经发出）
pub fn is_submission_failure(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<SolveError>())
        .any(|e| matches!(e, SolveError::Submission { .. }))
}

/// 在错误链中查找评测端附带的下一题地址
pub fn continuation_from(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<SolveError>())
        .find_map(|e| e.continuation_url().map(str::to_string))
}
