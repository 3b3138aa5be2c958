use fontdue::{Font, FontSettings};
use std::sync::Arc;

use crate::Error;

// =============================================================================
// Glyph Source
// =============================================================================

/// 一段文字未旋转时的覆盖率位图（每像素一个 alpha 字节，行优先）
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl Coverage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0; width as usize * height as usize],
        }
    }

    fn fill_rect(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        let x0 = left.clamp(0, self.width as i32) as usize;
        let x1 = right.clamp(0, self.width as i32) as usize;
        let y0 = top.clamp(0, self.height as i32) as usize;
        let y1 = bottom.clamp(0, self.height as i32) as usize;
        for y in y0..y1 {
            let row = y * self.width as usize;
            self.alpha[row + x0..row + x1].fill(255);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.alpha.iter().all(|&a| a == 0)
    }
}

/// 把文字渲染成覆盖率位图的字形来源
pub trait GlyphSource {
    /// 以 `size` 像素字号渲染 `text`；无法渲染时返回 `None`
    fn render_run(&self, text: &str, size: f32) -> Option<Coverage>;
}

impl<T: GlyphSource + ?Sized> GlyphSource for &T {
    fn render_run(&self, text: &str, size: f32) -> Option<Coverage> {
        (**self).render_run(text, size)
    }
}

impl<T: GlyphSource + ?Sized> GlyphSource for Box<T> {
    fn render_run(&self, text: &str, size: f32) -> Option<Coverage> {
        (**self).render_run(text, size)
    }
}

// =============================================================================
// Font Face (fontdue)
// =============================================================================

/// 由 TTF/OTF 数据加载的字体
pub struct FontFace {
    font: Font,
    family: String,
}

impl FontFace {
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let font =
            Font::from_bytes(data, FontSettings::default()).map_err(|e| Error::Font(e.into()))?;
        let family = extract_font_family_name(data)
            .or_else(|| font.name().map(String::from))
            .unwrap_or_else(|| "sans-serif".to_string());
        Ok(Self { font, family })
    }

    /// 字体族名称（SVG 输出使用）
    pub fn family(&self) -> &str {
        &self.family
    }
}

fn extract_font_family_name(font_data: &[u8]) -> Option<String> {
    let mut db = usvg::fontdb::Database::new();
    db.load_font_source(usvg::fontdb::Source::Binary(Arc::new(font_data.to_vec())));
    db.faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
}

impl GlyphSource for FontFace {
    fn render_run(&self, text: &str, size: f32) -> Option<Coverage> {
        if !(size > 0.0) || text.is_empty() {
            return None;
        }
        let metrics = self
            .font
            .horizontal_line_metrics(size)
            .unwrap_or(fontdue::LineMetrics {
                ascent: size * 0.8,
                descent: size * -0.2,
                line_gap: 0.0,
                new_line_size: size,
            });

        let mut glyphs = Vec::new();
        let mut pen = 0.0f32;
        for ch in text.chars() {
            let (glyph, bitmap) = self.font.rasterize(ch, size);
            glyphs.push((pen, glyph, bitmap));
            pen += glyph.advance_width;
        }

        let width = pen.ceil().max(1.0) as u32;
        let height = (metrics.ascent - metrics.descent).ceil().max(1.0) as u32;
        let mut coverage = Coverage::new(width, height);
        let baseline = metrics.ascent;

        for (offset, glyph, bitmap) in &glyphs {
            let left = (offset + glyph.xmin as f32).round() as i32;
            let top = (baseline - glyph.height as f32 - glyph.ymin as f32).round() as i32;
            for gy in 0..glyph.height {
                let y = top + gy as i32;
                if y < 0 || y >= height as i32 {
                    continue;
                }
                for gx in 0..glyph.width {
                    let x = left + gx as i32;
                    if x < 0 || x >= width as i32 {
                        continue;
                    }
                    let a = bitmap[gy * glyph.width + gx];
                    let slot = &mut coverage.alpha[y as usize * width as usize + x as usize];
                    *slot = (*slot).max(a);
                }
            }
        }

        Some(coverage)
    }
}

// =============================================================================
// Block Face
// =============================================================================

/// 不依赖字体文件的字形来源：每个非空白字符画成一个实心方块
///
/// 所有比例都以字号为单位。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockFace {
    /// 每个字符的前进宽度
    pub advance: f32,
    /// 方块之间的水平间隙
    pub gap: f32,
    /// 方块的上沿和下沿（相对行顶）
    pub ink_top: f32,
    pub ink_bottom: f32,
}

impl Default for BlockFace {
    fn default() -> Self {
        Self {
            advance: 0.6,
            gap: 0.1,
            ink_top: 0.2,
            ink_bottom: 0.9,
        }
    }
}

impl GlyphSource for BlockFace {
    fn render_run(&self, text: &str, size: f32) -> Option<Coverage> {
        if !(size > 0.0) || text.is_empty() {
            return None;
        }
        let count = text.chars().count() as f32;
        let width = (count * self.advance * size).ceil().max(1.0) as u32;
        let height = size.ceil() as u32;
        let mut coverage = Coverage::new(width, height);

        let half_gap = self.gap * size / 2.0;
        let top = (self.ink_top * size).round() as i32;
        let bottom = (self.ink_bottom * size).round() as i32;
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let pen = i as f32 * self.advance * size;
            let left = (pen + half_gap).round() as i32;
            let right = (pen + self.advance * size - half_gap).round() as i32;
            coverage.fill_rect(left, top, right, bottom);
        }

        Some(coverage)
    }
}
