use crate::layout::Viewport;

/// 轴对齐矩形，`x0..x1`、`y0..y1` 为半开区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Bounds {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x1 > other.x0 && self.x0 < other.x1 && self.y1 > other.y0 && self.y0 < other.y1
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Bounds {
        Bounds {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// 把这个矩形等比缩放并居中到视口中
    pub fn fit_into(&self, viewport: Viewport) -> Option<FitTransform> {
        let (w, h) = (self.width().abs() as f32, self.height().abs() as f32);
        let scale = (viewport.width / w).min(viewport.height / h);
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        let cx = (self.x0 + self.x1) as f32 / 2.0;
        let cy = (self.y0 + self.y1) as f32 / 2.0;
        Some(FitTransform {
            scale,
            translate_x: viewport.width / 2.0 - cx * scale,
            translate_y: viewport.height / 2.0 - cy * scale,
        })
    }
}

/// 先缩放再平移：`p' = p * scale + translate`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl FitTransform {
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        )
    }
}

/// 已放置单词的整体包围盒
///
/// 放置第一个单词之前不存在；之后只会增大。它是墨迹并集的宽松外框，
/// 不能代替位图探测。
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    bounds: Option<Bounds>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn extend(&mut self, placed: Bounds) {
        self.bounds = Some(match self.bounds {
            Some(current) => current.union(&placed),
            None => placed,
        });
    }

    /// 候选框是否与包围盒相交；还没有包围盒时为 `false`。
    ///
    /// 放置第一个单词之后，不相交的候选框直接跳过；相交的仍要做位图探测。
    pub fn overlaps(&self, candidate: &Bounds) -> bool {
        self.bounds.is_some_and(|bounds| bounds.overlaps(candidate))
    }
}
