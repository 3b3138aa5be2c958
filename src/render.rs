use std::fmt::Write as _;

use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::Error;
use crate::face::GlyphSource;
use crate::layout::{CloudLayout, Viewport};
use crate::log::debug;
use crate::sprite::coverage_pixmap;

// =============================================================================
// Output Generation
// =============================================================================

/// 输出样式：背景色、按顺序循环使用的单词颜色、SVG 字体族
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub background: String,
    pub colors: Vec<String>,
    pub font_family: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".into(),
            colors: ["#264653", "#287271", "#2a9d8f", "#8ab17d", "#e9c46a"]
                .into_iter()
                .map(String::from)
                .collect(),
            font_family: "sans-serif".into(),
        }
    }
}

impl RenderStyle {
    fn color(&self, index: usize) -> &str {
        if self.colors.is_empty() {
            "#000000"
        } else {
            &self.colors[index % self.colors.len()]
        }
    }
}

impl CloudLayout {
    /// 把布局缩放居中到 `viewport` 后输出 SVG
    pub fn to_svg(&self, viewport: Viewport, style: &RenderStyle) -> String {
        let mut svg = String::with_capacity(256 + self.placements.len() * 160);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = viewport.width,
            h = viewport.height
        );
        let _ = write!(
            svg,
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            escape_xml(&style.background)
        );
        let _ = write!(
            svg,
            r#"<style>text{{font-family:'{}',Arial,sans-serif}}</style>"#,
            escape_xml(&style.font_family)
        );

        if let Some(fit) = self.fit(viewport) {
            for (i, placement) in self.placements.iter().enumerate() {
                let (x, y) = fit.apply(placement.x as f32, placement.y as f32);
                let _ = write!(
                    svg,
                    r#"<text x="{x:.1}" y="{y:.1}" fill="{}" font-size="{:.1}" text-anchor="middle" dominant-baseline="central" transform="rotate({:.1} {x:.1} {y:.1})">{}</text>"#,
                    escape_xml(style.color(i)),
                    placement.word.font_size * fit.scale,
                    placement.rotation,
                    escape_xml(&placement.word.text)
                );
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// 用 `face` 重新绘制每个单词并编码成 PNG
    pub fn to_png<F: GlyphSource + ?Sized>(
        &self,
        face: &F,
        viewport: Viewport,
        style: &RenderStyle,
    ) -> Result<Vec<u8>, Error> {
        if viewport.is_degenerate() {
            return Err(Error::Input(format!(
                "cannot render into a {}x{} viewport",
                viewport.width, viewport.height
            )));
        }
        let (width, height) = (viewport.width.ceil() as u32, viewport.height.ceil() as u32);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::Render("Failed to create pixel buffer".into()))?;
        if let Some(color) = parse_hex_color(&style.background) {
            pixmap.fill(color);
        }

        if let Some(fit) = self.fit(viewport) {
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            let base = Transform::from_row(
                fit.scale,
                0.0,
                0.0,
                fit.scale,
                fit.translate_x,
                fit.translate_y,
            );
            for (i, placement) in self.placements.iter().enumerate() {
                let Some(coverage) = face.render_run(&placement.word.text, placement.word.font_size)
                else {
                    continue;
                };
                let rgb = parse_hex_color(style.color(i))
                    .map(|c| {
                        let c = c.to_color_u8();
                        [c.red(), c.green(), c.blue()]
                    })
                    .unwrap_or([0, 0, 0]);
                let Some(run) = coverage_pixmap(&coverage, rgb) else {
                    continue;
                };
                let transform = base
                    .pre_translate(placement.x as f32, placement.y as f32)
                    .pre_rotate(placement.rotation)
                    .pre_translate(-(coverage.width as f32) / 2.0, -(coverage.height as f32) / 2.0);
                pixmap.draw_pixmap(0, 0, run.as_ref(), &paint, transform, None);
            }
        }

        debug!(width, height, words = self.placements.len(), "encoding png");
        pixmap
            .encode_png()
            .map_err(|e| Error::Render(e.to_string()))
    }
}

fn parse_hex_color(hex: &str) -> Option<tiny_skia::Color> {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 && hex.is_ascii() {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(tiny_skia::Color::from_rgba8(r, g, b, 255))
    } else {
        None
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
