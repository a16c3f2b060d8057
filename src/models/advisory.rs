use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// LLM 对题目的分析结果
///
/// 每道题只生成一次，生成后不再修改。
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Advisory {
    /// 需要下载或渲染的附件地址
    #[serde(deserialize_with = "null_as_default")]
    pub data_needed: Vec<String>,
    /// 分析类型，如 "sum"、"scrape"、"github api"
    #[serde(deserialize_with = "null_as_default")]
    pub analysis_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub answer_format: String,
    /// 推理过程，仅用于日志
    #[serde(deserialize_with = "null_as_default")]
    pub reasoning: String,
    /// 可直接使用的答案
    pub answer: Option<JsonValue>,
    #[serde(rename = "isGitHubApi", deserialize_with = "null_as_default")]
    pub is_github_api: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_personalization: bool,
}

impl Advisory {
    /// LLM 输出无法解析时使用的兜底分析
    pub fn unknown(reasoning: impl Into<String>) -> Self {
        Self {
            data_needed: Vec::new(),
            analysis_type: "unknown".to_string(),
            answer_format: "string".to_string(),
            reasoning: reasoning.into(),
            answer: None,
            is_github_api: false,
            needs_personalization: false,
        }
    }

    /// 直接给出的答案（`null` 与字符串 "null" 都视为没有）
    pub fn direct_answer(&self) -> Option<&JsonValue> {
        match &self.answer {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) if s.trim().is_empty() || s.trim() == "null" => None,
            Some(v) => Some(v),
        }
    }

    pub fn wants_scrape(&self) -> bool {
        self.analysis_type.to_lowercase().contains("scrape")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
