//! 个性化偏移
//!
//! 部分题目要求答案加上 `邮箱长度 mod N`，N 从题干中的 "mod N" 读取，默认 2。

use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_MODULUS: u32 = 2;

const MARKERS: [&str; 2] = ["email length", "personalized"];

static MODULUS_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)mod\s*(\d+)").expect("mod pattern"),
        Regex::new(r"(?i)modulo\s*(\d+)").expect("modulo pattern"),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonalizationRule {
    pub modulus: u32,
}

impl PersonalizationRule {
    /// 题干中有个性化标记时返回规则
    pub fn detect(question: &str) -> Option<Self> {
        if MARKERS.iter().any(|m| question.contains(m)) {
            Some(Self::from_question(question))
        } else {
            None
        }
    }

    /// 不检查标记，直接从题干读取模数
    pub fn from_question(question: &str) -> Self {
        Self {
            modulus: modulus_from(question),
        }
    }

    pub fn offset(&self, email: &str) -> i64 {
        (email.chars().count() as u64 % self.modulus as u64) as i64
    }
}

/// 从题干提取模数，缺失或为 0 时使用默认值
pub fn modulus_from(question: &str) -> u32 {
    MODULUS_PATTERNS
        .iter()
        .find_map(|re| re.captures(question))
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_MODULUS)
}

/// 本题的偏移量，没有个性化标记时为 0
pub fn offset_for(question: &str, email: &str) -> i64 {
    PersonalizationRule::detect(question)
        .map(|rule| rule.offset(email))
        .unwrap_or(0)
}
