use std::path::PathBuf;

/// 下载得到的附件
///
/// 文件存放在本题的临时目录中，题目结束时随目录一起删除。
#[derive(Debug, Clone)]
pub struct Artifact {
    /// 下载来源（已解析为绝对地址）
    pub source_url: String,
    /// 本地存储位置
    pub location: PathBuf,
    /// 响应中声明的 Content-Type，可能为空
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// 本地文件扩展名（小写，不含点）
    pub fn extension(&self) -> Option<String> {
        self.location
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
