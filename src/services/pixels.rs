//! 像素颜色统计
//!
//! 统计图片中每种精确 RGB 颜色出现的次数，有透明通道时忽略完全透明的像素。

use std::collections::HashMap;

use anyhow::{Context, Result};

const DEFAULT_COLOR: &str = "#000000";

#[derive(Debug, Clone, PartialEq)]
pub struct ColorTally {
    pub width: u32,
    pub height: u32,
    /// 出现次数最多的颜色，`#rrggbb`
    pub dominant: String,
    pub dominant_count: usize,
    /// 按出现次数降序排列的前几种颜色
    pub top: Vec<(String, usize)>,
}

/// 解码图片并统计出现次数最多的颜色
///
/// 次数相同时取最先出现的颜色；没有可统计的像素时返回 `#000000`。
pub fn most_frequent_color(bytes: &[u8]) -> Result<ColorTally> {
    let img = image::load_from_memory(bytes).context("图片解码失败")?;
    let has_alpha = img.color().has_alpha();
    let rgba = img.to_rgba8();

    // 颜色 → (次数, 首次出现顺序)
    let mut counts: HashMap<[u8; 3], (usize, usize)> = HashMap::new();
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if has_alpha && a == 0 {
            continue;
        }
        let next_order = counts.len();
        counts.entry([r, g, b]).or_insert((0, next_order)).0 += 1;
    }

    let mut ranked: Vec<([u8; 3], usize, usize)> = counts
        .into_iter()
        .map(|(rgb, (count, order))| (rgb, count, order))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let (dominant, dominant_count) = ranked
        .first()
        .map(|(rgb, count, _)| (to_hex(*rgb), *count))
        .unwrap_or_else(|| (DEFAULT_COLOR.to_string(), 0));

    Ok(ColorTally {
        width: rgba.width(),
        height: rgba.height(),
        dominant,
        dominant_count,
        top: ranked
            .iter()
            .take(5)
            .map(|(rgb, count, _)| (to_hex(*rgb), *count))
            .collect(),
    })
}

fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}
