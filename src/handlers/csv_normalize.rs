//! CSV 规范化题
//!
//! 把杂乱的 CSV 转为统一格式：字段名 snake_case，日期为 ISO `YYYY-MM-DD`，
//! 按 id 升序排列，答案为序列化后的 JSON 数组字符串。

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::{TaskHandler, SUBMIT_PATH};
use crate::models::{Answer, SubmissionResult};
use crate::workflow::TaskCtx;

const CSV_PATH: &str = "/project2/messy.csv";
const TASK_ID_PATH: &str = "/project2-csv";
/// 少于该列数的行视为残缺，丢弃
const MIN_FIELDS: usize = 4;

static MONTHS: phf::Map<&'static str, u32> = phf::phf_map! {
    "jan" => 1, "feb" => 2, "mar" => 3, "apr" => 4,
    "may" => 5, "jun" => 6, "jul" => 7, "aug" => 8,
    "sep" => 9, "oct" => 10, "nov" => 11, "dec" => 12,
};

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("iso pattern"));
static SHORT_DMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})$").expect("dmy pattern"));
static DAY_MON_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\s+([A-Za-z]{3,})\.?\s+(\d{4})$").expect("d mon y pattern")
});
static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("int pattern"));

/// 通用日期格式，依次尝试
const FALLBACK_FORMATS: [&str; 8] = [
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%d",
];

/// 规范化后的一行
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedRow {
    pub id: i64,
    pub name: String,
    pub joined: Option<String>,
    pub value: Option<i64>,
}

pub struct CsvNormalizeHandler;

/// 字段名转为 snake_case
pub fn to_snake_case(header: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for c in header.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}

/// 日期转为 ISO `YYYY-MM-DD`
///
/// 支持已是 ISO、`D/M/YY`（年份补 20）、`D Mon YYYY`，其余尝试通用格式，
/// 都失败时原样返回。
pub fn normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if ISO_DATE.is_match(s) {
        return Some(s.to_string());
    }

    if let Some(caps) = SHORT_DMY.captures(s) {
        return Some(format!("20{}-{:0>2}-{:0>2}", &caps[3], &caps[2], &caps[1]));
    }

    if let Some(caps) = DAY_MON_YEAR.captures(s) {
        let month_key = caps[2].get(..3).unwrap_or_default().to_ascii_lowercase();
        if let Some(month) = MONTHS.get(month_key.as_str()) {
            return Some(format!("{}-{:02}-{:0>2}", &caps[3], month, &caps[1]));
        }
    }

    let parsed = FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .or_else(|_| chrono::DateTime::parse_from_rfc2822(s))
                .ok()
                .map(|dt| dt.date_naive())
        });

    Some(match parsed {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => s.to_string(),
    })
}

/// 空值视为 0，非数字为 null，其余取整数前缀
fn parse_value(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0);
    }
    LEADING_INT.find(s).and_then(|m| m.as_str().parse().ok())
}

/// 解析并规范化 CSV，结果按 id 稳定升序
pub fn normalize_csv(content: &str) -> Result<Vec<NormalizedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("CSV 缺少表头")?
        .iter()
        .map(to_snake_case)
        .collect();
    debug!("📋 表头: {:?}", headers);

    let column = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
    let id_col = column(&["id"]).context("CSV 缺少 id 列")?;
    let name_col = column(&["name"]);
    let joined_col = column(&["joined", "join_date", "joined_date", "joined_at"]);
    let value_col = column(&["value"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("CSV 行解析失败")?;
        if record.len() < MIN_FIELDS {
            continue;
        }
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or_default();

        let Ok(id) = field(Some(id_col)).parse::<i64>() else {
            continue;
        };
        rows.push(NormalizedRow {
            id,
            name: field(name_col).to_string(),
            joined: normalize_date(field(joined_col)),
            value: parse_value(field(value_col)),
        });
    }

    rows.sort_by_key(|row| row.id);
    Ok(rows)
}

#[async_trait]
impl TaskHandler for CsvNormalizeHandler {
    fn name(&self) -> &'static str {
        "csv-normalize"
    }

    fn matches(&self, url: &str, question: &str) -> bool {
        url.contains("project2-csv") || question.contains("messy.csv") || question.contains("snake_case")
    }

    async fn solve(&self, ctx: &TaskCtx<'_>) -> Result<SubmissionResult> {
        let csv_url = ctx.config.evaluator_url(CSV_PATH);
        info!("{} 📥 下载: {}", ctx, csv_url);

        let response = ctx.toolkit.http.get(&csv_url).await?;
        if !response.is_success() {
            anyhow::bail!("CSV 返回 HTTP {}", response.status);
        }

        let rows = normalize_csv(&response.text())?;
        info!("{} 📊 规范化后 {} 行", ctx, rows.len());

        let answer = serde_json::to_string(&rows)?;
        info!("{} ✅ 答案: {}", ctx, answer);

        ctx.submit(
            &ctx.config.evaluator_url(SUBMIT_PATH),
            &ctx.config.evaluator_url(TASK_ID_PATH),
            Answer::Text(answer),
        )
        .await
    }
}
