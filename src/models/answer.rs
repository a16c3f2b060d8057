//! 提交答案的类型
//!
//! 评测端接受数字、字符串、布尔值或任意 JSON，这里用枚举显式区分，
//! 并按固定规则从 LLM 的原始文本转换。

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::LazyLock;

static NUMBER_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.?\d*$").expect("number pattern"));

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Number(f64),
    Text(String),
    Boolean(bool),
    Json(JsonValue),
}

impl Answer {
    /// 将 LLM 的原始回复转换为答案
    ///
    /// 顺序：去掉 markdown 代码块 → JSON 结构 → 数字 → 布尔 → 文本
    pub fn from_raw(raw: &str) -> Self {
        let cleaned = strip_fences(raw);
        let text = cleaned.trim();

        if text.starts_with('{') || text.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<JsonValue>(text) {
                return Answer::Json(value);
            }
        }

        if text.starts_with('"') {
            if let Ok(JsonValue::String(inner)) = serde_json::from_str::<JsonValue>(text) {
                return Answer::Text(inner);
            }
        }

        if NUMBER_LITERAL.is_match(text) {
            if let Ok(n) = text.parse::<f64>() {
                return Answer::Number(n);
            }
        }

        match text {
            "true" => Answer::Boolean(true),
            "false" => Answer::Boolean(false),
            _ => Answer::Text(text.to_string()),
        }
    }

    /// 将分析结果中的 JSON 值转换为答案，字符串按原始回复处理
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Answer::Number)
                .unwrap_or_else(|| Answer::Json(value.clone())),
            JsonValue::Bool(b) => Answer::Boolean(*b),
            JsonValue::String(s) => Answer::from_raw(s),
            other => Answer::Json(other.clone()),
        }
    }

    /// 加上个性化偏移，只作用于数字答案
    pub fn with_offset(self, offset: i64) -> Self {
        match self {
            Answer::Number(n) => Answer::Number(n + offset as f64),
            other => other,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Answer::Number(_))
    }
}

impl From<i64> for Answer {
    fn from(n: i64) -> Self {
        Answer::Number(n as f64)
    }
}

impl From<String> for Answer {
    fn from(s: String) -> Self {
        Answer::Text(s)
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::Text(s.to_string())
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // 整数值按整数输出，避免 650 变成 650.0
            Answer::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            Answer::Number(n) => serializer.serialize_f64(*n),
            Answer::Text(s) => serializer.serialize_str(s),
            Answer::Boolean(b) => serializer.serialize_bool(*b),
            Answer::Json(v) => v.serialize(serializer),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}
