use rand::Rng;

use crate::envelope::{Bounds, Envelope};
use crate::field::CollisionField;
use crate::sprite::Sprite;

// =============================================================================
// Archimedean Spiral
// =============================================================================

/// 阿基米德螺线：第 t 步的偏移为 `(aspect·0.1t·cos(0.1t), 0.1t·sin(0.1t))`
///
/// t 从 0 开始，每步先加 `dt` 再取偏移；`dt` 为 ±1，决定旋转方向。
#[derive(Debug, Clone)]
pub struct ArchimedeanSpiral {
    t: i64,
    dt: i64,
    aspect: f64,
}

impl ArchimedeanSpiral {
    pub fn new(width: u32, height: u32, dt: i64) -> Self {
        debug_assert!(dt == 1 || dt == -1);
        Self {
            t: 0,
            dt,
            aspect: width as f64 / height as f64,
        }
    }
}

impl Iterator for ArchimedeanSpiral {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.t += self.dt;
        let v = self.t as f64 * 0.1;
        Some((self.aspect * v * v.cos(), v * v.sin()))
    }
}

/// 种子区域半径的除数：单词越少，种子越靠近中心
pub fn seed_divisor(word_count: usize) -> f64 {
    match word_count {
        0..=10 => 5.0,
        11..=25 => 3.0,
        26..=75 => 1.5,
        76..=100 => 1.25,
        _ => 1.0,
    }
}

/// 在画布中心附近随机取一个种子点
///
/// 除数为 1 时落在画布中间一半的区域内，除数越大区域越小。
pub fn random_seed<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    word_count: usize,
    rng: &mut R,
) -> (i32, i32) {
    let divisor = seed_divisor(word_count);
    let jitter = |extent: u32, r: f64| {
        let half = extent as f64 / 2.0;
        (half + half * (r - 0.5) / divisor) as i32
    };
    let x = jitter(width, rng.random::<f64>());
    let y = jitter(height, rng.random::<f64>());
    (x, y)
}

// =============================================================================
// Spiral Search
// =============================================================================

/// 一个单词的搜索结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// 已写入碰撞位图，(x, y) 为画布坐标中的锚点
    Accepted { x: i32, y: i32, bounds: Bounds },
    /// 螺线超出画布对角线仍未找到位置
    Dropped,
}

/// 从种子点沿螺线向外寻找第一个可用位置
#[derive(Debug, Clone)]
pub struct SpiralSearch {
    seed: (i32, i32),
    spiral: ArchimedeanSpiral,
    width: u32,
    height: u32,
    max_delta: f64,
}

impl SpiralSearch {
    pub fn new(seed: (i32, i32), width: u32, height: u32, dt: i64) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self {
            seed,
            spiral: ArchimedeanSpiral::new(width, height, dt),
            width,
            height,
            max_delta: (w * w + h * h).sqrt(),
        }
    }

    /// 随机选择种子点和旋转方向
    pub fn seeded<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        word_count: usize,
        rng: &mut R,
    ) -> Self {
        let seed = random_seed(width, height, word_count, rng);
        let dt = if rng.random_bool(0.5) { 1 } else { -1 };
        Self::new(seed, width, height, dt)
    }

    /// 搜索并放置 `sprite`。成功时写入 `field` 并扩展 `envelope`，Sprite 随之消耗。
    pub fn run(
        mut self,
        sprite: Sprite,
        field: &mut CollisionField,
        envelope: &mut Envelope,
    ) -> SearchOutcome {
        if sprite.is_empty() {
            return SearchOutcome::Dropped;
        }

        while let Some((fx, fy)) = self.spiral.next() {
            let (dx, dy) = (fx as i32, fy as i32);
            if (dx.abs() as f64).max(dy.abs() as f64) >= self.max_delta {
                break;
            }

            let (x, y) = (self.seed.0 + dx, self.seed.1 + dy);
            let bounds = Bounds::new(x + sprite.x0, y + sprite.y0, x + sprite.x1, y + sprite.y1);
            if bounds.x0 < 0
                || bounds.y0 < 0
                || bounds.x1 > self.width as i32
                || bounds.y1 > self.height as i32
            {
                continue;
            }

            // 第一个单词直接接受；之后必须与包围盒相交，再通过位图探测
            if !envelope.is_empty()
                && (!envelope.overlaps(&bounds) || field.probe(&sprite, x, y))
            {
                continue;
            }

            field.commit(&sprite, x, y);
            envelope.extend(bounds);
            return SearchOutcome::Accepted { x, y, bounds };
        }

        SearchOutcome::Dropped
    }
}
