use crate::browser::PageContent;

/// 单道题目
///
/// 访问题目地址时创建，提交后即丢弃。
#[derive(Debug, Clone)]
pub struct Task {
    /// 题目地址
    pub url: String,
    /// 渲染后的页面文本（题干）
    pub question: String,
    /// 渲染后的页面 HTML
    pub markup: String,
    /// 页面中发现的提交地址
    pub submit_endpoint: Option<String>,
}

impl Task {
    pub fn from_page(url: impl Into<String>, page: PageContent) -> Self {
        Self {
            url: url.into(),
            question: page.text,
            markup: page.html,
            submit_endpoint: page.submit_url,
        }
    }

    /// 无实际计算的演示题：地址含 `/demo` 但不是 `demo-xxx` 子题
    pub fn is_demo(&self) -> bool {
        self.url.contains("/demo") && !self.url.contains("demo-")
    }
}
