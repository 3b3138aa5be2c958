use crate::Error;
use crate::layout::{WordInput, WordSpec};

// =============================================================================
// Canvas Sizing
// =============================================================================

/// 工作画布的尺寸策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasSizing {
    /// 按比例缩放视口，使画布面积接近 `width * height`（保持宽高比）
    ReferenceArea { width: f32, height: f32 },
    /// 直接使用视口尺寸
    Viewport,
}

impl Default for CanvasSizing {
    fn default() -> Self {
        CanvasSizing::ReferenceArea {
            width: 800.0,
            height: 600.0,
        }
    }
}

// =============================================================================
// Rotation
// =============================================================================

/// 未指定旋转角度的单词所使用的角度范围
///
/// `orientations <= 1` 时始终使用 `min_deg`；否则在 `[min_deg, max_deg]`
/// 上均匀取 `orientations` 个角度，每个单词随机选一个。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationRange {
    pub min_deg: f32,
    pub max_deg: f32,
    pub orientations: u32,
}

impl Default for RotationRange {
    fn default() -> Self {
        Self {
            min_deg: 0.0,
            max_deg: 0.0,
            orientations: 1,
        }
    }
}

impl RotationRange {
    pub fn fixed(angle: f32) -> Self {
        Self {
            min_deg: angle,
            max_deg: angle,
            orientations: 1,
        }
    }

    /// 第 `index` 个候选角度（`index < orientations`）
    pub fn angle(&self, index: u32) -> f32 {
        if self.orientations <= 1 {
            return self.min_deg;
        }
        let step = (self.max_deg - self.min_deg) / (self.orientations - 1) as f32;
        self.min_deg + step * index.min(self.orientations - 1) as f32
    }
}

// =============================================================================
// Font Scale
// =============================================================================

/// 权重到字号的映射：线性、单调，并钳制在 `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontScale {
    pub min: f32,
    pub max: f32,
}

impl Default for FontScale {
    fn default() -> Self {
        Self {
            min: 20.0,
            max: 100.0,
        }
    }
}

impl FontScale {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 权重 `weight` 在 `[min_weight, max_weight]` 区间内对应的字号
    pub fn size_for(&self, weight: f32, min_weight: f32, max_weight: f32) -> f32 {
        let range = max_weight - min_weight;
        let normalized = if range > 0.0 {
            ((weight - min_weight) / range).clamp(0.0, 1.0)
        } else {
            1.0
        };
        (self.min + normalized * (self.max - self.min)).clamp(self.min, self.max)
    }

    /// 过滤空白文本和非正权重，按权重从大到小排序，并计算字号。
    pub fn prepare(&self, inputs: &[WordInput]) -> Vec<WordSpec> {
        let mut valid: Vec<&WordInput> = inputs
            .iter()
            .filter(|w| !w.text.trim().is_empty() && w.weight > 0.0)
            .collect();
        valid.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        let max_weight = valid.first().map(|w| w.weight).unwrap_or(1.0);
        let min_weight = valid.last().map(|w| w.weight).unwrap_or(1.0);

        valid
            .into_iter()
            .map(|w| {
                let size = self.size_for(w.weight, min_weight, max_weight);
                let spec = WordSpec::new(w.text.clone(), w.weight, size);
                match w.rotation {
                    Some(angle) => spec.with_rotation(angle),
                    None => spec,
                }
            })
            .collect()
    }
}

// =============================================================================
// Layout Config
// =============================================================================

/// 一次布局所需的全部配置
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub canvas: CanvasSizing,
    /// 只尝试放置前 `max_words` 个单词（按调用方给定的顺序）
    pub max_words: usize,
    /// 固定种子时布局可复现
    pub seed: Option<u64>,
    /// 离屏光栅条带的宽度，必须是 32 的倍数
    pub strip_width: u32,
    pub strip_height: u32,
    pub rotation: RotationRange,
    pub font_scale: FontScale,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSizing::default(),
            max_words: 200,
            seed: None,
            strip_width: 2048,
            strip_height: 2048,
            rotation: RotationRange::default(),
            font_scale: FontScale::default(),
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canvas(mut self, canvas: CanvasSizing) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn strip_size(mut self, width: u32, height: u32) -> Self {
        self.strip_width = width;
        self.strip_height = height;
        self
    }

    pub fn rotation(mut self, rotation: RotationRange) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn font_size_range(mut self, min: f32, max: f32) -> Self {
        self.font_scale = FontScale::new(min, max);
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let CanvasSizing::ReferenceArea { width, height } = self.canvas {
            let area = width * height;
            if !area.is_finite() || width <= 0.0 || height <= 0.0 {
                return Err(Error::Config(format!(
                    "reference area must be positive, got {width}x{height}"
                )));
            }
        }
        if self.max_words == 0 {
            return Err(Error::Config("max_words must be at least 1".into()));
        }
        if self.strip_width == 0 || self.strip_width % 32 != 0 {
            return Err(Error::Config(format!(
                "strip width must be a positive multiple of 32, got {}",
                self.strip_width
            )));
        }
        if self.strip_height == 0 {
            return Err(Error::Config("strip height must be positive".into()));
        }
        if !self.rotation.min_deg.is_finite() || !self.rotation.max_deg.is_finite() {
            return Err(Error::Config("rotation bounds must be finite".into()));
        }
        let FontScale { min, max } = self.font_scale;
        if !(min > 0.0 && min.is_finite() && max.is_finite() && min <= max) {
            return Err(Error::Config(format!(
                "font size range must satisfy 0 < min <= max, got {min}..{max}"
            )));
        }
        Ok(())
    }
}
