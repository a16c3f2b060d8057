//! GitHub 文件树计数题
//!
//! 参数文件给出 owner / repo / sha / pathPrefix / extension，
//! 答案 = 文件树中匹配前缀和扩展名的文件数 + 个性化偏移。

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{TaskHandler, SUBMIT_PATH};
use crate::clients::TreeEntry;
use crate::models::{Answer, SubmissionResult};
use crate::services::PersonalizationRule;
use crate::workflow::TaskCtx;

const PARAMS_PATH: &str = "/project2/gh-tree.json";
const TASK_ID_PATH: &str = "/project2-gh-tree";
const DEFAULT_EXTENSION: &str = ".md";

/// 参数文件
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeQuery {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub sha: Option<String>,
    pub path_prefix: Option<String>,
    pub extension: Option<String>,
}

pub struct GithubTreeHandler;

/// 统计路径以 `prefix` 开头、以 `extension` 结尾的文件数，目录不计
pub fn count_matching(entries: &[TreeEntry], prefix: &str, extension: &str) -> usize {
    entries
        .iter()
        .filter(|e| e.is_blob())
        .filter(|e| prefix.is_empty() || e.path.starts_with(prefix))
        .filter(|e| e.path.ends_with(extension))
        .count()
}

#[async_trait]
impl TaskHandler for GithubTreeHandler {
    fn name(&self) -> &'static str {
        "github-tree"
    }

    fn matches(&self, url: &str, question: &str) -> bool {
        url.contains("gh-tree") || question.contains("GitHub API") || question.contains("git/trees")
    }

    async fn solve(&self, ctx: &TaskCtx<'_>) -> Result<SubmissionResult> {
        let params_url = ctx.config.evaluator_url(PARAMS_PATH);
        info!("{} 📥 下载参数文件: {}", ctx, params_url);

        let response = ctx.toolkit.http.get(&params_url).await?;
        if !response.is_success() {
            anyhow::bail!("参数文件返回 HTTP {}", response.status);
        }
        let query: TreeQuery =
            serde_json::from_slice(&response.bytes).context("参数文件不是合法 JSON")?;
        debug!("{} 📋 参数: {:?}", ctx, query);

        let (Some(owner), Some(repo), Some(sha)) = (&query.owner, &query.repo, &query.sha) else {
            anyhow::bail!("参数文件缺少 owner / repo / sha");
        };

        let entries = ctx.toolkit.github.list_tree(owner, repo, sha).await?;
        let prefix = query.path_prefix.as_deref().unwrap_or_default();
        let extension = query
            .extension
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);
        let count = count_matching(&entries, prefix, extension);
        info!(
            "{} 📄 前缀 \"{}\"、扩展名 \"{}\" 的文件数: {}",
            ctx, prefix, extension, count
        );

        // 这类题总是要求个性化
        let rule = PersonalizationRule::from_question(&ctx.task.question);
        let offset = rule.offset(ctx.email());
        info!(
            "{} 📧 个性化: 邮箱长度 mod {} = {}",
            ctx, rule.modulus, offset
        );

        let answer = Answer::from(count as i64).with_offset(offset);
        info!("{} ✅ 答案: {} + {} = {}", ctx, count, offset, answer);

        ctx.submit(
            &ctx.config.evaluator_url(SUBMIT_PATH),
            &ctx.config.evaluator_url(TASK_ID_PATH),
            answer,
        )
        .await
    }
}
