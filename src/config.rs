//! 程序配置
//!
//! 配置只在启动时构建一次，之后以 `Arc<Config>` 的形式只读共享，
//! 叶子组件不直接读取环境变量。
//!
//! 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量覆盖

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SolveError;

/// 默认配置文件名
const DEFAULT_CONFIG_FILE: &str = "quiz.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 图片理解使用的模型
    pub vision_model_name: String,
    /// 语音转文字使用的模型
    pub transcription_model_name: String,
    // --- GitHub API 配置 ---
    pub github_token: Option<String>,
    pub github_api_base_url: String,
    // --- 评测端配置 ---
    /// 专用处理器使用的固定地址前缀
    pub evaluator_base_url: String,
    // --- 时间预算 ---
    /// 整条题目链的总时间预算（秒）
    pub time_budget_secs: u64,
    /// 单次网络请求超时（秒）
    pub request_timeout_secs: u64,
    /// 页面导航超时（秒）
    pub render_timeout_secs: u64,
    /// 页面加载后等待脚本执行的时间（毫秒）
    pub render_settle_ms: u64,
    // --- 浏览器配置 ---
    pub chrome_executable: Option<String>,
    /// 设置后连接已运行的浏览器，而不是每次启动无头浏览器
    pub browser_debug_port: Option<u16>,
    pub user_agent: String,
    // --- 其他 ---
    /// 附件临时目录
    pub temp_dir: PathBuf,
    /// 语音转写失败时提交的固定短语
    pub audio_fallback_phrase: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 允许发起请求的学生邮箱（为空则不校验）
    pub student_email: Option<String>,
    pub student_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://aipipe.org/openrouter/v1".to_string(),
            llm_model_name: "openai/gpt-4o-mini".to_string(),
            vision_model_name: "openai/gpt-4o-mini".to_string(),
            transcription_model_name: "whisper-1".to_string(),
            github_token: None,
            github_api_base_url: "https://api.github.com".to_string(),
            evaluator_base_url: "https://tds-llm-analysis.s-anand.net".to_string(),
            time_budget_secs: 170,
            request_timeout_secs: 30,
            render_timeout_secs: 30,
            render_settle_ms: 2000,
            chrome_executable: None,
            browser_debug_port: None,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36"
                .to_string(),
            temp_dir: PathBuf::from("temp"),
            audio_fallback_phrase: "passphrase".to_string(),
            verbose_logging: false,
            student_email: None,
            student_secret: None,
        }
    }
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载配置
    pub fn load() -> Result<Self> {
        let base = match std::env::var("QUIZ_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SolveError::Config(e.to_string()).into())
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            llm_api_key: env_string("LLM_API_KEY")
                .or_else(|| env_string("AIPIPE_TOKEN"))
                .unwrap_or(default.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            vision_model_name: env_string("VISION_MODEL_NAME").unwrap_or(default.vision_model_name),
            transcription_model_name: env_string("TRANSCRIPTION_MODEL_NAME")
                .unwrap_or(default.transcription_model_name),
            github_token: env_string("GITHUB_TOKEN").or(default.github_token),
            github_api_base_url: env_string("GITHUB_API_BASE_URL")
                .unwrap_or(default.github_api_base_url),
            evaluator_base_url: env_string("EVALUATOR_BASE_URL")
                .unwrap_or(default.evaluator_base_url),
            time_budget_secs: env_parse("TIME_BUDGET_SECS").unwrap_or(default.time_budget_secs),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")
                .unwrap_or(default.request_timeout_secs),
            render_timeout_secs: env_parse("RENDER_TIMEOUT_SECS")
                .unwrap_or(default.render_timeout_secs),
            render_settle_ms: env_parse("RENDER_SETTLE_MS").unwrap_or(default.render_settle_ms),
            chrome_executable: env_string("CHROME_EXECUTABLE").or(default.chrome_executable),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(default.browser_debug_port),
            user_agent: default.user_agent,
            temp_dir: env_string("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.temp_dir),
            audio_fallback_phrase: env_string("AUDIO_FALLBACK_PHRASE")
                .unwrap_or(default.audio_fallback_phrase),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            student_email: env_string("STUDENT_EMAIL").or(default.student_email),
            student_secret: env_string("STUDENT_SECRET").or(default.student_secret),
        }
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    /// 拼接评测端固定地址
    pub fn evaluator_url(&self, path: &str) -> String {
        format!("{}{}", self.evaluator_base_url.trim_end_matches('/'), path)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
