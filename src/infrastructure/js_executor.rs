//! 页面执行器 - 基础设施层
//!
//! 持有一次渲染所用的 Page，只暴露导航和执行 JS 的能力

use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tracing::debug;

/// 页面执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 负责导航、等待脚本执行、读取页面内容
/// - 不认识 Task，不关心提交地址
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到指定地址，超时视为失败
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!("导航到: {}", url);
        tokio::time::timeout(timeout, async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
        .with_context(|| format!("页面导航超时 ({} 秒)", timeout.as_secs()))?
        .with_context(|| format!("页面导航失败: {}", url))?;
        Ok(())
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let result = self.page.evaluate(js_code.into()).await?;
        Ok(result.into_value()?)
    }

    /// 页面可见文本
    pub async fn body_text(&self) -> Result<String> {
        self.eval_as::<Option<String>>("document.body ? document.body.innerText : ''")
            .await
            .map(Option::unwrap_or_default)
    }

    /// 页面 body 的 HTML
    pub async fn body_html(&self) -> Result<String> {
        self.eval_as::<Option<String>>("document.body ? document.body.innerHTML : ''")
            .await
            .map(Option::unwrap_or_default)
    }

    /// 关闭页面，释放标签页
    pub async fn close(self) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}
