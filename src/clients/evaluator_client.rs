/// 评测端客户端
///
/// 评测端在非 2xx 响应中也会返回 JSON（可能带下一题地址），
/// 因此只有网络错误才视为传输失败，状态码一律读取响应体。
use anyhow::Result;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::SolveError;
use crate::infrastructure::HttpClient;
use crate::models::{SubmissionPayload, SubmissionResult};
use crate::utils::logging::truncate_text;

#[derive(Clone)]
pub struct EvaluatorClient {
    http: HttpClient,
}

impl EvaluatorClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// 提交答案
    pub async fn submit(
        &self,
        endpoint: &str,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionResult> {
        info!("📤 提交到: {}", endpoint);
        info!("📝 答案: {}", truncate_text(&payload.answer.to_string(), 200));

        let response = self
            .http
            .inner()
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| SolveError::Submission {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
                continuation: None,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SolveError::Submission {
            endpoint: endpoint.to_string(),
            message: format!("读取响应失败: {}", e),
            continuation: None,
        })?;

        debug!("评测端响应 {}: {}", status, truncate_text(&body, 500));
        if !(200..300).contains(&status) {
            warn!("⚠️ 评测端返回状态码 {}，继续读取响应体", status);
        }

        Ok(parse_submission_response(endpoint, status, &body)?)
    }
}

/// 解析评测端响应
///
/// 响应不符合预期结构时返回 `SolveError::Submission`，
/// 若响应仍是带 `url` 字段的 JSON，则把它作为下一题地址带出。
pub fn parse_submission_response(
    endpoint: &str,
    status: u16,
    body: &str,
) -> Result<SubmissionResult, SolveError> {
    match serde_json::from_str::<SubmissionResult>(body) {
        Ok(result) => Ok(result),
        Err(e) => {
            let continuation = serde_json::from_str::<JsonValue>(body)
                .ok()
                .and_then(|v| v.get("url").and_then(JsonValue::as_str).map(str::to_string))
                .filter(|u| !u.trim().is_empty());
            Err(SolveError::Submission {
                endpoint: endpoint.to_string(),
                message: format!("HTTP {}，无法解析响应: {}", status, e),
                continuation,
            })
        }
    }
}
