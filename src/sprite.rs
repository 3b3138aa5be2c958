use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::Error;
use crate::face::{Coverage, GlyphSource};
use crate::log::debug;

// =============================================================================
// Sprite
// =============================================================================

/// 单词墨迹的打包位图
///
/// 行优先，每行 `width / 32` 个 u32，最高位对应最左侧像素。
/// `x0..x1`、`y0..y1` 是位图相对放置锚点（单词中心）的包围盒。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sprite {
    bits: Vec<u32>,
    width: u32,
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Sprite {
    /// 无法放置的单词使用空 Sprite
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从打包好的行数据构造；`width` 必须是 32 的倍数。
    pub fn from_bits(bits: Vec<u32>, width: u32, x0: i32, y0: i32) -> Self {
        debug_assert!(width % 32 == 0);
        let words = (width >> 5) as usize;
        let rows = if words == 0 { 0 } else { bits.len() / words };
        Self {
            bits,
            width,
            x0,
            y0,
            x1: x0 + width as i32,
            y1: y0 + rows as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty() || self.height() == 0
    }

    /// 像素宽度（32 的倍数）
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        (self.y1 - self.y0).max(0) as u32
    }

    /// 每行的 u32 个数
    pub fn words_per_row(&self) -> usize {
        (self.width >> 5) as usize
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.bits.chunks_exact(self.words_per_row().max(1))
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height() {
            return false;
        }
        let word = self.bits[y as usize * self.words_per_row() + (x >> 5) as usize];
        word & (1 << (31 - (x & 31))) != 0
    }

    /// 墨迹像素总数
    pub fn ink(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }
}

// =============================================================================
// Glyph Rasterizer
// =============================================================================

/// 一次光栅化请求：文字、字号和旋转角度（度）
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub text: &'a str,
    pub size: f32,
    pub rotation: f32,
}

/// 条带里一段文字的位置
struct Slot {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// 把一批文字画进共享的离屏条带，再读回 alpha 通道生成 Sprite
pub struct GlyphRasterizer {
    strip: Pixmap,
}

impl GlyphRasterizer {
    pub fn new(strip_width: u32, strip_height: u32) -> Result<Self, Error> {
        if strip_width % 32 != 0 {
            return Err(Error::Config(format!(
                "strip width must be a multiple of 32, got {strip_width}"
            )));
        }
        let strip = Pixmap::new(strip_width, strip_height)
            .ok_or_else(|| Error::Render("Failed to create raster strip".into()))?;
        Ok(Self { strip })
    }

    /// 光栅化 `batch` 的一个前缀，返回的 Sprite 与前缀一一对应。
    ///
    /// 条带放满时停止，剩下的请求留给下一批。单独一段就放不进空条带的
    /// 文字得到空 Sprite。`batch` 非空时至少处理一项。
    pub fn rasterize<F: GlyphSource + ?Sized>(
        &mut self,
        face: &F,
        batch: &[RunRequest<'_>],
    ) -> Vec<Sprite> {
        self.strip.fill(Color::TRANSPARENT);

        let strip_w = self.strip.width();
        let strip_h = self.strip.height();
        let mut slots: Vec<Option<Slot>> = Vec::with_capacity(batch.len());
        let (mut x, mut y, mut row_height) = (0u32, 0u32, 0u32);

        for request in batch {
            let Some(coverage) = face.render_run(request.text, request.size) else {
                slots.push(None);
                continue;
            };
            let (width, height) = run_box(
                coverage.width as f32,
                coverage.height.max((request.size * 2.0).ceil() as u32) as f32,
                request.rotation,
            );

            if width > strip_w || height > strip_h {
                // 整条带都放不下
                slots.push(None);
                continue;
            }
            if x + width > strip_w {
                x = 0;
                y += row_height;
                row_height = 0;
            }
            if y + height > strip_h {
                break;
            }

            self.draw(&coverage, x, y, width, height, request.rotation);
            slots.push(Some(Slot {
                x,
                y,
                width,
                height,
            }));
            row_height = row_height.max(height);
            x += width;
        }

        debug!(
            requested = batch.len(),
            rasterized = slots.len(),
            rows_used = y + row_height,
            "rasterized glyph batch"
        );

        let pixels = self.strip.data();
        slots
            .iter()
            .map(|slot| match slot {
                Some(slot) => extract_sprite(pixels, strip_w, slot),
                None => Sprite::empty(),
            })
            .collect()
    }

    /// 以 (x, y, width, height) 盒子的中心为原点画一段（可能旋转的）文字
    fn draw(
        &mut self,
        coverage: &Coverage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        rotation: f32,
    ) {
        let Some(run) = coverage_pixmap(coverage, [0, 0, 0]) else {
            return;
        };
        let transform = Transform::from_translate(
            x as f32 + (width >> 1) as f32,
            y as f32 + (height >> 1) as f32,
        )
        .pre_rotate(rotation)
        .pre_translate(-(coverage.width as f32) / 2.0, -(coverage.height as f32) / 2.0);
        self.strip
            .draw_pixmap(0, 0, run.as_ref(), &PixmapPaint::default(), transform, None);
    }
}

/// 覆盖率位图转成单色（预乘）Pixmap
pub(crate) fn coverage_pixmap(coverage: &Coverage, rgb: [u8; 3]) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(coverage.width, coverage.height)?;
    for (px, &a) in pixmap.data_mut().chunks_exact_mut(4).zip(&coverage.alpha) {
        let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        px.copy_from_slice(&[premultiply(rgb[0]), premultiply(rgb[1]), premultiply(rgb[2]), a]);
    }
    Some(pixmap)
}

/// 旋转后的包围盒尺寸，宽度向上取整到 32 的倍数
pub fn run_box(width: f32, height: f32, rotation: f32) -> (u32, u32) {
    let (w, h) = if rotation % 360.0 != 0.0 {
        let (sin, cos) = rotation.to_radians().sin_cos();
        let (wcr, wsr, hcr, hsr) = (width * cos, width * sin, height * cos, height * sin);
        (
            (wcr + hsr).abs().max((wcr - hsr).abs()),
            (wsr + hcr).abs().max((wsr - hcr).abs()),
        )
    } else {
        (width, height)
    };
    let w = (ceil_px(w) + 31) >> 5 << 5;
    (w, ceil_px(h))
}

/// 向上取整，容忍三角函数带来的微小误差
fn ceil_px(v: f32) -> u32 {
    (v - 1e-3).ceil().max(1.0) as u32
}

/// 读回条带中 `slot` 区域的 alpha，按 32 列一个 u32 打包，并裁掉上下空行。
fn extract_sprite(pixels: &[u8], strip_width: u32, slot: &Slot) -> Sprite {
    let w32 = (slot.width >> 5) as usize;
    let mut bits = vec![0u32; w32 * slot.height as usize];
    let mut first_row = None;
    let mut last_row = 0;

    for j in 0..slot.height as usize {
        let row = &mut bits[j * w32..(j + 1) * w32];
        let src = ((slot.y as usize + j) * strip_width as usize + slot.x as usize) * 4;
        let mut seen = 0u32;
        for i in 0..slot.width as usize {
            if pixels[src + i * 4 + 3] != 0 {
                let bit = 1u32 << (31 - (i & 31));
                row[i >> 5] |= bit;
                seen |= bit;
            }
        }
        if seen != 0 {
            first_row.get_or_insert(j);
            last_row = j;
        }
    }

    let Some(first_row) = first_row else {
        return Sprite::empty();
    };
    let x0 = -((slot.width >> 1) as i32);
    let y0 = -((slot.height >> 1) as i32) + first_row as i32;
    let cropped = bits[first_row * w32..(last_row + 1) * w32].to_vec();
    Sprite::from_bits(cropped, slot.width, x0, y0)
}
