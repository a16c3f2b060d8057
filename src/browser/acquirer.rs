//! 页面内容获取
//!
//! 题目页面由脚本动态生成内容，必须通过浏览器渲染后才能读取题干。
//! 每次获取都会打开独立的标签页（或独立的无头浏览器），结束时无论成功
//! 与否都会关闭。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::Browser;
use regex::Regex;
use std::sync::LazyLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{connect_to_browser, launch_headless_browser};
use crate::config::Config;
use crate::error::SolveError;
use crate::infrastructure::JsExecutor;
use crate::utils::logging::truncate_text;

/// 渲染后的页面内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    /// 页面可见文本
    pub text: String,
    /// 页面 HTML
    pub html: String,
    /// 页面中发现的提交地址
    pub submit_url: Option<String>,
}

/// 页面内容获取能力
#[async_trait]
pub trait ContentAcquirer: Send + Sync {
    /// 渲染页面并提取内容，渲染或导航失败时返回 `SolveError::Acquisition`
    async fn acquire(&self, url: &str) -> Result<PageContent>;
}

/// 基于 Chromium 的页面获取
pub struct ChromiumAcquirer {
    config: Arc<Config>,
}

/// 一次获取所用的浏览器
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// 是否由本程序启动（连接的浏览器不关闭）
    owned: bool,
}

impl BrowserSession {
    async fn open(config: &Config) -> Result<Self> {
        match config.browser_debug_port {
            Some(port) => {
                let (browser, handler) = connect_to_browser(port).await?;
                Ok(Self {
                    browser,
                    handler,
                    owned: false,
                })
            }
            None => {
                let (browser, handler) = launch_headless_browser(config).await?;
                Ok(Self {
                    browser,
                    handler,
                    owned: true,
                })
            }
        }
    }

    async fn shutdown(mut self) {
        if self.owned {
            if let Err(e) = self.browser.close().await {
                debug!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                debug!("等待浏览器退出失败: {}", e);
            }
        }
        self.handler.abort();
    }
}

impl ChromiumAcquirer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    async fn render(&self, session: &BrowserSession, url: &str) -> Result<PageContent> {
        let page = session.browser.new_page("about:blank").await?;
        page.set_user_agent(self.config.user_agent.as_str()).await?;
        let executor = JsExecutor::new(page);

        let result = self.read_page(&executor, url).await;

        if let Err(e) = executor.close().await {
            debug!("关闭页面失败: {}", e);
        }
        result
    }

    async fn read_page(&self, executor: &JsExecutor, url: &str) -> Result<PageContent> {
        executor.goto(url, self.config.render_timeout()).await?;

        // 等待页面脚本执行
        tokio::time::sleep(self.config.render_settle()).await;

        let text = executor.body_text().await?;
        let html = executor.body_html().await?;
        let submit_url = discover_submit_url(&text, &html);

        Ok(PageContent {
            text,
            html,
            submit_url,
        })
    }
}

#[async_trait]
impl ContentAcquirer for ChromiumAcquirer {
    async fn acquire(&self, url: &str) -> Result<PageContent> {
        info!("🌐 渲染页面: {}", url);

        let session = BrowserSession::open(&self.config)
            .await
            .map_err(|e| SolveError::acquisition(url, format!("{:#}", e)))?;

        let result = self.render(&session, url).await;
        session.shutdown().await;

        match result {
            Ok(content) => {
                info!("✓ 页面内容已提取，文本长度 {}", content.text.chars().count());
                debug!("文本预览: {}", truncate_text(&content.text, 300));
                debug!(
                    "提交地址: {}",
                    content.submit_url.as_deref().unwrap_or("未找到")
                );
                Ok(content)
            }
            Err(e) => {
                warn!("⚠️ 页面渲染失败 ({}): {:#}", url, e);
                Err(SolveError::acquisition(url, format!("{:#}", e)).into())
            }
        }
    }
}

static TEXT_SUBMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+/submit\S*").expect("submit pattern"));
static MARKUP_SUBMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"']+/submit[^\s"']*"#).expect("submit pattern")
});
static FORM_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:action|data-submit)=["']([^"']+)["']"#).expect("form pattern")
});
static ANY_SUBMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"']+submit[^\s"']*"#).expect("submit pattern")
});
static SUBMIT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>]+/submit[^\s"'<>]*"#).expect("submit pattern")
});

/// 从渲染结果中寻找提交地址
///
/// 依次尝试：文本中的 `/submit` 地址、HTML 中的 `/submit` 地址、
/// 表单 `action` / `data-submit` 属性、任何包含 `submit` 的地址。
pub fn discover_submit_url(text: &str, html: &str) -> Option<String> {
    if let Some(m) = TEXT_SUBMIT.find(text).or_else(|| MARKUP_SUBMIT.find(html)) {
        return Some(trim_trailing_punctuation(m.as_str()));
    }
    if let Some(caps) = FORM_ATTRIBUTE.captures(html) {
        return Some(caps[1].to_string());
    }
    ANY_SUBMIT
        .find(html)
        .map(|m| trim_trailing_punctuation(m.as_str()))
}

/// 在一段文本中寻找 `…/submit…` 形式的绝对地址
pub fn find_submit_link(text: &str) -> Option<String> {
    SUBMIT_LINK
        .find(text)
        .map(|m| trim_trailing_punctuation(m.as_str()))
}

fn trim_trailing_punctuation(url: &str) -> String {
    url.trim_end_matches([',', ';', '.']).to_string()
}
