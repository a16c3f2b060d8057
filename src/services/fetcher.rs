//! 附件下载 - 业务能力层
//!
//! 负责把题目中引用的附件下载到本题的临时目录，并判断其类型

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, info};
use url::Url;

use crate::error::SolveError;
use crate::infrastructure::HttpClient;
use crate::models::{Advisory, Artifact};

/// Content-Type → 文件扩展名
static CONTENT_TYPE_EXTENSIONS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "application/pdf" => ".pdf",
    "text/csv" => ".csv",
    "application/json" => ".json",
    "text/plain" => ".txt",
    "text/html" => ".html",
    "image/png" => ".png",
    "image/jpeg" => ".jpg",
    "image/jpg" => ".jpg",
    "audio/opus" => ".opus",
    "audio/ogg" => ".ogg",
    "audio/mpeg" => ".mp3",
    "audio/wav" => ".wav",
    "audio/x-wav" => ".wav",
    "application/vnd.ms-excel" => ".xls",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
};

/// 地址中可识别的扩展名
static KNOWN_EXTENSIONS: phf::Set<&'static str> = phf::phf_set! {
    "pdf", "csv", "json", "txt", "html", "png", "jpg", "jpeg", "xls", "xlsx",
    "opus", "ogg", "mp3", "wav",
};

/// 直接下载的数据文件（不需要浏览器渲染）
static DATA_FILE_EXTENSIONS: phf::Set<&'static str> = phf::phf_set! {
    "csv", "pdf", "json", "opus", "mp3", "wav", "png", "jpg",
};

/// 附件引用的获取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// 需要浏览器执行脚本的页面
    Renderable,
    /// 直接下载
    DataFile,
}

impl ReferenceKind {
    /// 数据文件总是直接下载；其他地址含 `-data` 或分析类型提到 scrape 时走浏览器
    pub fn classify(reference: &str, advisory: &Advisory) -> Self {
        if is_data_file(reference) {
            ReferenceKind::DataFile
        } else if reference.contains("-data") || advisory.wants_scrape() {
            ReferenceKind::Renderable
        } else {
            ReferenceKind::DataFile
        }
    }
}

pub fn is_data_file(reference: &str) -> bool {
    path_extension(reference)
        .map(|ext| DATA_FILE_EXTENSIONS.contains(ext.as_str()))
        .unwrap_or(false)
}

/// 把附件引用解析为绝对地址
///
/// 已经是 http(s) 地址的直接返回；以 `/` 开头的相对地址拼接到题目地址的 origin 上。
pub fn resolve_url(reference: &str, base: Option<&str>) -> Result<String> {
    let reference = reference.trim();
    if let Ok(url) = Url::parse(reference) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url.to_string());
        }
    }

    let base = base.with_context(|| format!("相对地址缺少基准地址: {}", reference))?;
    let base = Url::parse(base).with_context(|| format!("基准地址无法解析: {}", base))?;
    let resolved = base
        .join(reference)
        .with_context(|| format!("无法解析附件地址: {}", reference))?;
    Ok(resolved.to_string())
}

/// 一道题的附件临时目录
///
/// 每道题独立一个目录，题目结束时整体删除，并发的解题请求互不影响。
pub struct TaskArtifacts {
    dir: TempDir,
    counter: AtomicUsize,
}

impl TaskArtifacts {
    pub fn create(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("无法创建临时目录: {}", root.display()))?;
        let dir = tempfile::Builder::new()
            .prefix("task-")
            .tempdir_in(root)
            .with_context(|| format!("无法创建题目临时目录: {}", root.display()))?;
        debug!("📁 题目临时目录: {}", dir.path().display());
        Ok(Self {
            dir,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 下一个下载文件的存放路径
    pub fn next_path(&self, extension: &str) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.dir.path().join(format!("download_{}{}", n, extension))
    }

    /// 删除目录及其中的所有附件
    pub fn release(self) -> Result<()> {
        let path = self.dir.path().display().to_string();
        self.dir
            .close()
            .with_context(|| format!("无法删除题目临时目录: {}", path))
    }
}

/// 附件下载器
#[derive(Clone)]
pub struct ArtifactFetcher {
    http: HttpClient,
}

impl ArtifactFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// 下载附件并保存到本题的临时目录
    ///
    /// # 参数
    /// - `reference`: 附件地址，可以是相对地址
    /// - `base`: 用于解析相对地址的题目地址
    pub async fn fetch(
        &self,
        reference: &str,
        base: Option<&str>,
        artifacts: &TaskArtifacts,
    ) -> Result<Artifact> {
        let url = resolve_url(reference, base)
            .map_err(|e| SolveError::artifact(reference, format!("{:#}", e)))?;
        if url != reference {
            debug!("相对地址 {} 解析为 {}", reference, url);
        }
        info!("📥 下载附件: {}", url);

        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| SolveError::artifact(reference, format!("{:#}", e)))?;
        if !response.is_success() {
            return Err(
                SolveError::artifact(reference, format!("HTTP {}", response.status)).into(),
            );
        }

        let extension = extension_for_content_type(&response.content_type)
            .or_else(|| extension_from_url(&url))
            .unwrap_or_default();
        let location = artifacts.next_path(&extension);
        tokio::fs::write(&location, &response.bytes)
            .await
            .with_context(|| format!("无法写入附件: {}", location.display()))?;

        info!(
            "✓ 附件已下载: {} ({} 字节, {})",
            location.display(),
            response.bytes.len(),
            if response.content_type.is_empty() {
                "未知类型"
            } else {
                response.content_type.as_str()
            }
        );

        Ok(Artifact {
            source_url: url,
            location,
            media_type: response.content_type,
            bytes: response.bytes,
        })
    }
}

fn extension_for_content_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    CONTENT_TYPE_EXTENSIONS
        .get(essence.as_str())
        .map(|ext| ext.to_string())
}

fn extension_from_url(url: &str) -> Option<String> {
    path_extension(url)
        .filter(|ext| KNOWN_EXTENSIONS.contains(ext.as_str()))
        .map(|ext| format!(".{}", ext))
}

/// 地址路径部分的扩展名（小写），忽略查询参数
fn path_extension(reference: &str) -> Option<String> {
    let path = reference.split(['?', '#']).next().unwrap_or(reference);
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}
