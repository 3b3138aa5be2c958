use crate::sprite::Sprite;

// =============================================================================
// Collision Field
// =============================================================================

/// 覆盖整个工作画布的占用位图
///
/// 每行 `stride` 个 u32，最高位对应最左侧像素。Sprite 的放置偏移不必
/// 对齐到 32 位：每个目标 u32 由上一块 Sprite 数据的低位和当前块的高位拼成。
#[derive(Debug, Clone)]
pub struct CollisionField {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u32>,
}

impl CollisionField {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = ((width + 31) >> 5) as usize;
        Self {
            width,
            height,
            stride,
            data: vec![0; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_set(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        let word = self.data[y as usize * self.stride + (x as usize >> 5)];
        word & (1 << (31 - (x & 31))) != 0
    }

    /// 已占用的像素数
    pub fn occupied(&self) -> u32 {
        self.data.iter().map(|w| w.count_ones()).sum()
    }

    /// 以 (x, y) 为锚点放置 `sprite` 时，墨迹是否与已占用的像素重叠。
    ///
    /// 落到画布外的墨迹也算碰撞。
    pub fn probe(&self, sprite: &Sprite, x: i32, y: i32) -> bool {
        let left = x + sprite.x0;
        let top = y + sprite.y0;
        let shift = (left & 31) as u32;
        let first_col = left >> 5;

        for (sy, row) in sprite.rows().enumerate() {
            let gy = top + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                if row.iter().any(|&w| w != 0) {
                    return true;
                }
                continue;
            }
            let base = gy as usize * self.stride;

            let mut carry = 0u32;
            for sx in 0..=row.len() {
                let current = row.get(sx).copied().unwrap_or(0);
                let mask = splice(carry, current, shift);
                carry = current;
                if mask == 0 {
                    continue;
                }

                let gx = first_col + sx as i32;
                if gx < 0 || gx >= self.stride as i32 {
                    return true;
                }
                if self.data[base + gx as usize] & mask != 0 {
                    return true;
                }
            }
        }
        false
    }

    /// 把 `sprite` 的墨迹写入位图；调用方应已用 [`probe`](Self::probe) 确认无碰撞。
    pub fn commit(&mut self, sprite: &Sprite, x: i32, y: i32) {
        let left = x + sprite.x0;
        let top = y + sprite.y0;
        let shift = (left & 31) as u32;
        let first_col = left >> 5;

        for (sy, row) in sprite.rows().enumerate() {
            let gy = top + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                continue;
            }
            let base = gy as usize * self.stride;

            let mut carry = 0u32;
            for sx in 0..=row.len() {
                let current = row.get(sx).copied().unwrap_or(0);
                let mask = splice(carry, current, shift);
                carry = current;

                let gx = first_col + sx as i32;
                if mask != 0 && gx >= 0 && gx < self.stride as i32 {
                    self.data[base + gx as usize] |= mask;
                }
            }
        }
    }
}

/// 偏移 `shift` 位后落在同一个目标 u32 里的位：
/// 上一块的低 `shift` 位在左，当前块的高 `32 - shift` 位在右。
#[inline]
fn splice(previous: u32, current: u32, shift: u32) -> u32 {
    debug_assert!(shift < 32);
    if shift == 0 {
        current
    } else {
        (previous << (32 - shift)) | (current >> shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 32x2 的实心 Sprite，锚点在左上角
    fn solid_sprite() -> Sprite {
        Sprite::from_bits(vec![u32::MAX, u32::MAX], 32, 0, 0)
    }

    #[test]
    fn splice_with_zero_shift_is_identity() {
        assert_eq!(splice(u32::MAX, 0x1234_5678, 0), 0x1234_5678);
    }

    #[test]
    fn splice_carries_low_bits_of_previous_word() {
        assert_eq!(splice(0b1, 0, 1), 0x8000_0000);
        assert_eq!(splice(0, 0x8000_0000, 1), 0x4000_0000);
        assert_eq!(splice(0xFF, 0xFF00_0000, 8), 0xFFFF_0000);
    }

    #[test]
    fn aligned_commit_sets_exact_pixels() {
        let mut field = CollisionField::new(96, 4);
        field.commit(&solid_sprite(), 32, 1);
        assert_eq!(field.occupied(), 64);
        assert!(field.is_set(32, 1));
        assert!(field.is_set(63, 2));
        assert!(!field.is_set(31, 1));
        assert!(!field.is_set(64, 1));
        assert!(!field.is_set(40, 0));
        assert!(!field.is_set(40, 3));
    }

    #[test]
    fn unaligned_commit_spans_two_words() {
        let mut field = CollisionField::new(96, 2);
        field.commit(&solid_sprite(), 5, 0);
        assert_eq!(field.occupied(), 64);
        assert!(!field.is_set(4, 0));
        assert!(field.is_set(5, 0));
        assert!(field.is_set(31, 0));
        assert!(field.is_set(32, 0));
        assert!(field.is_set(36, 1));
        assert!(!field.is_set(37, 1));
    }

    #[test]
    fn probe_detects_single_pixel_overlap_at_odd_offset() {
        let mut field = CollisionField::new(128, 4);
        field.commit(&solid_sprite(), 37, 0);
        // Sprite spans 37..69; a neighbour ending at 37 touches, one ending at 38 overlaps.
        assert!(!field.probe(&solid_sprite(), 5, 0));
        assert!(field.probe(&solid_sprite(), 6, 0));
        assert!(!field.probe(&solid_sprite(), 69, 0));
        assert!(field.probe(&solid_sprite(), 68, 1));
        assert!(!field.probe(&solid_sprite(), 40, 2));
    }

    #[test]
    fn probe_matches_pixelwise_check() {
        // Sparse sprite: a diagonal of single pixels across two words.
        let mut rows = Vec::new();
        for i in 0..8u32 {
            let col = i * 7;
            let mut row = [0u32; 2];
            row[(col >> 5) as usize] = 1 << (31 - (col & 31));
            rows.extend_from_slice(&row);
        }
        let sprite = Sprite::from_bits(rows, 64, 0, 0);

        let mut field = CollisionField::new(160, 16);
        field.commit(&sprite, 3, 2);
        for dx in 0..=96 {
            let expected = (0..8).any(|i| {
                let x = dx + i * 7;
                field.is_set(x, 2 + i) && sprite.is_set(i as u32 * 7, i as u32)
            });
            assert_eq!(field.probe(&sprite, dx, 2), expected, "offset {dx}");
        }
    }

    #[test]
    fn probe_treats_outside_as_occupied() {
        let field = CollisionField::new(64, 4);
        assert!(field.probe(&solid_sprite(), -1, 0));
        assert!(field.probe(&solid_sprite(), 33, 0));
        assert!(field.probe(&solid_sprite(), 0, 3));
        assert!(!field.probe(&solid_sprite(), 32, 2));
    }

    #[test]
    fn anchor_offsets_are_applied() {
        let centred = Sprite::from_bits(vec![u32::MAX], 32, -16, -1);
        let mut field = CollisionField::new(64, 4);
        field.commit(&centred, 20, 2);
        assert!(field.is_set(4, 1));
        assert!(field.is_set(35, 1));
        assert!(!field.is_set(36, 1));
        assert!(!field.is_set(20, 2));
    }
}
