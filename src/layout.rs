use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Error;
use crate::config::{CanvasSizing, LayoutConfig};
use crate::envelope::{Bounds, Envelope, FitTransform};
use crate::face::GlyphSource;
use crate::field::CollisionField;
use crate::log::{debug, warn};
use crate::spiral::{SearchOutcome, SpiralSearch};
use crate::sprite::{GlyphRasterizer, RunRequest, Sprite};

// =============================================================================
// Public Data Types
// =============================================================================

/// 单词输入项（权重尚未换算成字号）
#[derive(Debug, Clone, PartialEq)]
pub struct WordInput {
    pub text: String,
    pub weight: f32,
    pub rotation: Option<f32>,
}

impl WordInput {
    pub fn new(text: impl Into<String>, weight: f32) -> Self {
        Self {
            text: text.into(),
            weight: weight.max(0.0),
            rotation: None,
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }
}

/// 待布局的单词：文字、权重、字号和可选的旋转角度（度）
#[derive(Debug, Clone, PartialEq)]
pub struct WordSpec {
    pub text: String,
    pub weight: f32,
    pub font_size: f32,
    pub rotation: Option<f32>,
}

impl WordSpec {
    pub fn new(text: impl Into<String>, weight: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            weight,
            font_size,
            rotation: None,
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }
}

/// 输出视口（像素）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// 零面积、负数或非有限值
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite())
    }
}

/// 工作画布的最长边（像素）。超过时按比例缩小，宽高比不变。
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// 工作画布尺寸
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// 按配置把视口换算成工作画布；退化输入返回 `None`。
    ///
    /// 结果的最长边不超过 [`MAX_CANVAS_SIDE`]。
    pub fn for_viewport(sizing: CanvasSizing, viewport: Viewport) -> Option<Self> {
        if viewport.is_degenerate() {
            return None;
        }
        let (width, height) = match sizing {
            CanvasSizing::Viewport => (viewport.width, viewport.height),
            CanvasSizing::ReferenceArea { width, height } => {
                let area = width * height;
                let ratio = (area / (viewport.width * viewport.height)).sqrt();
                if ratio.is_finite() {
                    (viewport.width * ratio, viewport.height * ratio)
                } else {
                    // 视口按 1x1 处理
                    (area.sqrt(), area.sqrt())
                }
            }
        };
        let (width, height) = clamp_to_max_side(width as f64, height as f64);
        let canvas = CanvasSize {
            width: width.floor() as u32,
            height: height.floor() as u32,
        };
        (canvas.width > 0 && canvas.height > 0).then_some(canvas)
    }
}

fn clamp_to_max_side(width: f64, height: f64) -> (f64, f64) {
    let limit = MAX_CANVAS_SIDE as f64;
    if width.max(height) <= limit {
        (width, height)
    } else if width >= height {
        (limit, height * limit / width)
    } else {
        (width * limit / height, limit)
    }
}

/// 一个成功放置的单词
///
/// 坐标相对画布中心；`index` 指回输入列表中的位置。
#[derive(Debug, Clone, PartialEq)]
pub struct WordPlacement {
    pub index: usize,
    pub word: WordSpec,
    pub x: i32,
    pub y: i32,
    pub rotation: f32,
    /// 裁剪后的 Sprite 包围盒（相对画布中心）
    pub bounds: Bounds,
}

/// 一次布局的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudLayout {
    pub canvas: CanvasSize,
    pub placements: Vec<WordPlacement>,
    /// 所有放置结果的包围盒（相对画布中心）
    pub envelope: Option<Bounds>,
    /// 实际尝试放置的单词数（截断之后）
    pub attempted: usize,
}

impl CloudLayout {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// 被丢弃的单词数
    pub fn dropped(&self) -> usize {
        self.attempted - self.placements.len()
    }

    /// 让包围盒恰好放进 `viewport` 并居中的变换
    pub fn fit(&self, viewport: Viewport) -> Option<FitTransform> {
        self.envelope?.fit_into(viewport)
    }
}

// =============================================================================
// Layouter
// =============================================================================

/// 布局驱动器：持有配置、字形来源和请求代数
pub struct CloudLayouter<F> {
    config: LayoutConfig,
    face: F,
    generation: AtomicU64,
}

impl<F: GlyphSource> CloudLayouter<F> {
    pub fn new(config: LayoutConfig, face: F) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            face,
            generation: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn face(&self) -> &F {
        &self.face
    }

    /// 最近一次 [`begin`](Self::begin) 分配的代数
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// 同步布局，一次跑完
    pub fn layout(&self, words: &[WordSpec], viewport: Viewport) -> Result<CloudLayout, Error> {
        let mut pass = self.pass(words, viewport, None)?;
        pass.run();
        Ok(pass.into_layout())
    }

    /// 开始一个可分段执行的布局。
    ///
    /// 之后再次调用 `begin` 会让这个 pass 过期：它的结果在
    /// [`LayoutPass::finish`] 时被丢弃。
    pub fn begin(
        &self,
        words: &[WordSpec],
        viewport: Viewport,
    ) -> Result<LayoutPass<'_, F>, Error> {
        let id = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.pass(
            words,
            viewport,
            Some(Ticket {
                id,
                latest: &self.generation,
            }),
        )
    }

    fn pass<'a>(
        &'a self,
        words: &[WordSpec],
        viewport: Viewport,
        ticket: Option<Ticket<'a>>,
    ) -> Result<LayoutPass<'a, F>, Error> {
        let canvas = CanvasSize::for_viewport(self.config.canvas, viewport);
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let words: Vec<PendingWord> = match canvas {
            Some(_) => words
                .iter()
                .take(self.config.max_words)
                .enumerate()
                .map(|(index, spec)| {
                    let rotation = spec.rotation.unwrap_or_else(|| {
                        let range = self.config.rotation;
                        let pick = if range.orientations > 1 {
                            rng.random_range(0..range.orientations)
                        } else {
                            0
                        };
                        range.angle(pick)
                    });
                    PendingWord {
                        index,
                        spec: spec.clone(),
                        rotation,
                        sprite: None,
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        let canvas = canvas.unwrap_or_default();
        let rasterizer = if words.is_empty() {
            None
        } else {
            Some(GlyphRasterizer::new(
                self.config.strip_width,
                self.config.strip_height,
            )?)
        };

        debug!(
            generation = ticket.as_ref().map(|t| t.id),
            words = words.len(),
            width = canvas.width,
            height = canvas.height,
            "starting layout pass"
        );

        Ok(LayoutPass {
            face: &self.face,
            ticket,
            canvas,
            field: CollisionField::new(canvas.width, canvas.height),
            envelope: Envelope::new(),
            rasterizer,
            rng,
            words,
            cursor: 0,
            placements: Vec::new(),
        })
    }
}

// =============================================================================
// Layout Pass
// =============================================================================

/// pass 所属的请求代数
struct Ticket<'a> {
    id: u64,
    latest: &'a AtomicU64,
}

impl Ticket<'_> {
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.id
    }
}

struct PendingWord {
    index: usize,
    spec: WordSpec,
    rotation: f32,
    /// `None` 表示尚未光栅化；空 Sprite 表示无法放置
    sprite: Option<Sprite>,
}

/// [`LayoutPass::step`] 之后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    Running,
    Complete,
    /// 已有更新的请求，这个 pass 的结果会被丢弃
    Superseded,
}

/// 一次布局的执行状态：碰撞位图、包围盒和已放置的单词都只属于这个 pass。
pub struct LayoutPass<'a, F> {
    face: &'a F,
    ticket: Option<Ticket<'a>>,
    canvas: CanvasSize,
    field: CollisionField,
    envelope: Envelope,
    rasterizer: Option<GlyphRasterizer>,
    rng: ChaCha8Rng,
    words: Vec<PendingWord>,
    cursor: usize,
    placements: Vec<WordPlacement>,
}

impl<F: GlyphSource> LayoutPass<'_, F> {
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// `begin` 分配的代数；同步布局没有代数
    pub fn generation(&self) -> Option<u64> {
        self.ticket.as_ref().map(|t| t.id)
    }

    pub fn is_superseded(&self) -> bool {
        self.ticket.as_ref().is_some_and(|t| !t.is_current())
    }

    /// 目前为止的包围盒（相对画布中心）
    pub fn envelope(&self) -> Option<Bounds> {
        let (half_w, half_h) = self.half_canvas();
        self.envelope.bounds().map(|b| b.translate(-half_w, -half_h))
    }

    /// 目前为止放置成功的单词
    pub fn placements(&self) -> &[WordPlacement] {
        &self.placements
    }

    fn half_canvas(&self) -> (i32, i32) {
        ((self.canvas.width >> 1) as i32, (self.canvas.height >> 1) as i32)
    }

    /// 已处理（放置或丢弃）的单词数
    pub fn processed(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.words.len() - self.cursor
    }

    /// 最多再处理 `budget` 个单词
    pub fn step(&mut self, budget: usize) -> PassStatus {
        let end = self.cursor.saturating_add(budget).min(self.words.len());
        while self.cursor < end {
            if self.is_superseded() {
                return PassStatus::Superseded;
            }
            self.place_next();
        }
        if self.is_superseded() {
            PassStatus::Superseded
        } else if self.cursor == self.words.len() {
            PassStatus::Complete
        } else {
            PassStatus::Running
        }
    }

    /// 跑完剩下的单词并交出结果；已被新请求取代时返回 `None`。
    pub fn finish(mut self) -> Option<CloudLayout> {
        if self.run() == PassStatus::Superseded {
            warn!(
                generation = self.generation(),
                processed = self.cursor,
                "layout pass superseded, discarding results"
            );
            return None;
        }
        Some(self.into_layout())
    }

    fn run(&mut self) -> PassStatus {
        loop {
            let status = self.step(usize::MAX);
            if status != PassStatus::Running {
                return status;
            }
        }
    }

    fn place_next(&mut self) {
        let cursor = self.cursor;
        if self.words[cursor].sprite.is_none() {
            self.rasterize_from(cursor);
        }
        self.cursor += 1;

        let word = &mut self.words[cursor];
        let sprite = word.sprite.take().unwrap_or_default();
        let (width, height) = (self.canvas.width, self.canvas.height);
        let search = SpiralSearch::seeded(width, height, self.words.len(), &mut self.rng);

        match search.run(sprite, &mut self.field, &mut self.envelope) {
            SearchOutcome::Accepted { x, y, bounds } => {
                let (half_w, half_h) = self.half_canvas();
                let word = &self.words[cursor];
                self.placements.push(WordPlacement {
                    index: word.index,
                    word: word.spec.clone(),
                    x: x - half_w,
                    y: y - half_h,
                    rotation: word.rotation,
                    bounds: bounds.translate(-half_w, -half_h),
                });
            }
            SearchOutcome::Dropped => {
                debug!(
                    index = self.words[cursor].index,
                    text = %self.words[cursor].spec.text,
                    "word dropped"
                );
            }
        }
    }

    /// 从 `start` 开始光栅化一批单词
    fn rasterize_from(&mut self, start: usize) {
        let Some(rasterizer) = self.rasterizer.as_mut() else {
            return;
        };
        let requests: Vec<RunRequest<'_>> = self.words[start..]
            .iter()
            .map(|w| RunRequest {
                text: &w.spec.text,
                size: w.spec.font_size,
                rotation: w.rotation,
            })
            .collect();
        let sprites = rasterizer.rasterize(self.face, &requests);
        for (word, sprite) in self.words[start..].iter_mut().zip(sprites) {
            word.sprite = Some(sprite);
        }
    }

    fn into_layout(self) -> CloudLayout {
        debug!(
            placed = self.placements.len(),
            attempted = self.words.len(),
            "layout pass complete"
        );
        CloudLayout {
            canvas: self.canvas,
            envelope: self.envelope(),
            attempted: self.words.len(),
            placements: self.placements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::BlockFace;

    #[test]
    fn reference_area_preserves_aspect() {
        let sizing = CanvasSizing::ReferenceArea {
            width: 800.0,
            height: 600.0,
        };
        let canvas = CanvasSize::for_viewport(sizing, Viewport::new(400.0, 75.0)).unwrap();
        assert_eq!(canvas, CanvasSize { width: 1600, height: 300 });
        let same = CanvasSize::for_viewport(sizing, Viewport::new(800.0, 600.0)).unwrap();
        assert_eq!(same, CanvasSize { width: 800, height: 600 });
    }

    #[test]
    fn viewport_sizing_uses_viewport() {
        let canvas = CanvasSize::for_viewport(CanvasSizing::Viewport, Viewport::new(400.5, 300.0));
        assert_eq!(canvas, Some(CanvasSize { width: 400, height: 300 }));
    }

    #[test]
    fn degenerate_viewports_have_no_canvas() {
        let sizing = CanvasSizing::default();
        assert!(CanvasSize::for_viewport(sizing, Viewport::new(0.0, 300.0)).is_none());
        assert!(CanvasSize::for_viewport(sizing, Viewport::new(300.0, -1.0)).is_none());
        assert!(CanvasSize::for_viewport(sizing, Viewport::new(f32::NAN, 10.0)).is_none());
        assert!(
            CanvasSize::for_viewport(CanvasSizing::Viewport, Viewport::new(0.5, 10.0)).is_none()
        );
    }

    #[test]
    fn tiny_viewport_falls_back_to_unit_area() {
        let sizing = CanvasSizing::ReferenceArea {
            width: 800.0,
            height: 600.0,
        };
        let canvas = CanvasSize::for_viewport(sizing, Viewport::new(1e-30, 1e-30)).unwrap();
        assert_eq!(canvas.width, canvas.height);
    }

    #[test]
    fn huge_viewport_is_capped() {
        let square = CanvasSize::for_viewport(CanvasSizing::Viewport, Viewport::new(1e9, 1e9));
        assert_eq!(
            square,
            Some(CanvasSize {
                width: MAX_CANVAS_SIDE,
                height: MAX_CANVAS_SIDE
            })
        );

        let wide =
            CanvasSize::for_viewport(CanvasSizing::Viewport, Viewport::new(32768.0, 1024.0));
        assert_eq!(
            wide,
            Some(CanvasSize {
                width: MAX_CANVAS_SIDE,
                height: 256
            })
        );

        let tall = CanvasSizing::ReferenceArea {
            width: 8192.0,
            height: 8192.0,
        };
        let canvas = CanvasSize::for_viewport(tall, Viewport::new(1.0, 4.0)).unwrap();
        assert_eq!(canvas.height, MAX_CANVAS_SIDE);
        assert_eq!(canvas.width, MAX_CANVAS_SIDE / 4);

        // Too thin to keep a whole pixel once scaled down.
        let thin = CanvasSize::for_viewport(CanvasSizing::Viewport, Viewport::new(1e9, 1.0));
        assert!(thin.is_none());
    }

    #[test]
    fn step_respects_budget() {
        let layouter = CloudLayouter::new(
            LayoutConfig::new().seed(3).canvas(CanvasSizing::Viewport),
            BlockFace::default(),
        )
        .unwrap();
        let words: Vec<WordSpec> = (0..5)
            .map(|i| WordSpec::new(format!("w{i}"), 1.0, 12.0))
            .collect();
        let mut pass = layouter.begin(&words, Viewport::new(300.0, 200.0)).unwrap();
        assert_eq!(pass.generation(), Some(1));
        assert_eq!(pass.step(2), PassStatus::Running);
        assert_eq!(pass.processed(), 2);
        assert_eq!(pass.step(2), PassStatus::Running);
        assert_eq!(pass.step(2), PassStatus::Complete);
        assert_eq!(pass.remaining(), 0);
        let layout = pass.finish().unwrap();
        assert_eq!(layout.attempted, 5);
    }

    #[test]
    fn explicit_rotation_wins_over_range() {
        let layouter = CloudLayouter::new(
            LayoutConfig::new()
                .seed(11)
                .canvas(CanvasSizing::Viewport)
                .rotation(crate::config::RotationRange::fixed(90.0)),
            BlockFace::default(),
        )
        .unwrap();
        let words = [
            WordSpec::new("upright", 2.0, 20.0),
            WordSpec::new("flat", 1.0, 20.0).with_rotation(0.0),
        ];
        let layout = layouter.layout(&words, Viewport::new(400.0, 400.0)).unwrap();
        let rotation = |index| {
            layout
                .placements
                .iter()
                .find(|p| p.index == index)
                .map(|p| p.rotation)
        };
        assert_eq!(rotation(0), Some(90.0));
        assert_eq!(rotation(1), Some(0.0));
    }
}
