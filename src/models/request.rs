use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use url::Url;

use crate::config::Config;
use crate::error::SolveError;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

/// 一次解题请求
#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub email: String,
    pub secret: String,
    /// 起始题目地址
    pub url: String,
}

impl SolveRequest {
    pub fn new(
        email: impl Into<String>,
        secret: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
            url: url.into(),
        }
    }

    /// 检查字段是否齐全、格式是否正确
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.email.trim().is_empty() {
            return Err(SolveError::InvalidRequest("缺少 email".into()));
        }
        if self.secret.trim().is_empty() {
            return Err(SolveError::InvalidRequest("缺少 secret".into()));
        }
        if !EMAIL_SHAPE.is_match(self.email.trim()) {
            return Err(SolveError::InvalidRequest(format!(
                "email 格式不正确: {}",
                self.email
            )));
        }
        let url = Url::parse(&self.url)
            .map_err(|e| SolveError::InvalidRequest(format!("url 无法解析: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SolveError::InvalidRequest(format!(
                "url 必须是 http(s) 地址: {}",
                self.url
            )));
        }
        Ok(())
    }

    /// 配置了学生邮箱/密钥时，请求必须与之一致
    pub fn authorize(&self, config: &Config) -> Result<(), SolveError> {
        if let Some(email) = &config.student_email {
            if email.trim() != self.email.trim() {
                return Err(SolveError::Forbidden);
            }
        }
        if let Some(secret) = &config.student_secret {
            if secret != &self.secret {
                return Err(SolveError::Forbidden);
            }
        }
        Ok(())
    }
}
