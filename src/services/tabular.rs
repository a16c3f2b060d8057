//! 表格数据的数值分析
//!
//! 每一行按浮点数前缀解析（与 `parseFloat` 一致，如 `"150,abc"` 取 150），
//! 无法解析的行直接丢弃。

use regex::Regex;
use std::sync::LazyLock;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("number pattern")
});

/// 阈值标记，按顺序尝试
static THRESHOLD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)cutoff[:\s]+(\d+)",
        r"(?i)greater than[:\s]+(\d+)",
        r">\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("threshold pattern"))
    .collect()
});

/// 数值统计，仅用于日志
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// 逐行解析数字
pub fn parse_numeric_lines(text: &str) -> Vec<f64> {
    text.lines().filter_map(parse_leading_number).collect()
}

fn parse_leading_number(line: &str) -> Option<f64> {
    let m = LEADING_NUMBER.find(line.trim())?;
    m.as_str().parse::<f64>().ok()
}

/// 从题干中提取阈值（cutoff / greater than / `>`）
pub fn extract_threshold(question: &str) -> Option<f64> {
    THRESHOLD_PATTERNS
        .iter()
        .find_map(|re| re.captures(question))
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// 严格大于阈值的数之和
pub fn sum_above(numbers: &[f64], threshold: f64) -> f64 {
    numbers.iter().filter(|n| **n > threshold).sum()
}

pub fn summarize(numbers: &[f64]) -> Option<NumericSummary> {
    if numbers.is_empty() {
        return None;
    }
    let sum: f64 = numbers.iter().sum();
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(NumericSummary {
        count: numbers.len(),
        sum,
        avg: sum / numbers.len() as f64,
        min,
        max,
    })
}
