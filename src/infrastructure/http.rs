//! HTTP 客户端 - 基础设施层
//!
//! 所有对外的普通 HTTP 请求（附件下载、评测端提交、GitHub API）共用一个
//! reqwest 客户端，统一超时和 User-Agent。

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

/// GET 请求的原始响应
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(config.request_timeout(), &config.user_agent)
    }

    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .build()
            .context("无法创建 HTTP 客户端")?;
        Ok(Self { client })
    }

    /// 底层客户端，用于需要自定义请求头的调用
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// 下载原始字节，不检查状态码
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .with_context(|| format!("请求失败: {}", url))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("读取响应失败: {}", url))?
            .to_vec();

        debug!("GET {} → {} ({} 字节, {})", url, status, bytes.len(), content_type);

        Ok(HttpResponse {
            url: url.to_string(),
            status,
            content_type,
            bytes,
        })
    }
}
