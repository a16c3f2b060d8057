/// GitHub API 客户端
///
/// 只用到仓库文件树接口
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::infrastructure::HttpClient;

/// 文件树中的一项
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TreeEntry {
    pub path: String,
    /// `blob` 表示文件，`tree` 表示目录
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: "blob".to_string(),
        }
    }

    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Clone)]
pub struct GithubClient {
    http: HttpClient,
    api_base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(config: &Config, http: HttpClient) -> Self {
        Self {
            http,
            api_base_url: config.github_api_base_url.trim_end_matches('/').to_string(),
            token: config.github_token.clone(),
        }
    }

    /// 递归列出某个提交下的全部文件
    pub async fn list_tree(&self, owner: &str, repo: &str, sha: &str) -> Result<Vec<TreeEntry>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base_url, owner, repo, sha
        );
        info!("🔗 GitHub API: {}", url);

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = &self.token {
            debug!("🔑 使用 GitHub token");
            let value = HeaderValue::from_str(&format!("token {}", token))
                .context("GitHub token 含有非法字符")?;
            headers.insert(AUTHORIZATION, value);
        }

        let response = self.http.get_with_headers(&url, headers).await?;
        if !response.is_success() {
            anyhow::bail!(
                "GitHub API 返回 {}: {}",
                response.status,
                crate::utils::logging::truncate_text(&response.text(), 300)
            );
        }

        let parsed: TreeResponse =
            serde_json::from_slice(&response.bytes).context("无法解析 GitHub 文件树")?;
        debug!("📁 文件树共 {} 项", parsed.tree.len());
        Ok(parsed.tree)
    }
}
