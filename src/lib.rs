/*!
 * Word-cloud placement engine.
 *
 * 给定一组带字号（可选旋转）的单词，把它们依次画进离屏条带、转成打包位图，
 * 再沿阿基米德螺线为每个单词寻找不与已放置墨迹重叠的位置。
 *
 * ```no_run
 * use wordcloud_placement::{
 *     BlockFace, CloudLayouter, FontScale, LayoutConfig, Viewport, WordInput,
 * };
 *
 * let inputs = vec![WordInput::new("Rust", 100.0), WordInput::new("Cargo", 40.0)];
 * let words = FontScale::new(14.0, 80.0).prepare(&inputs);
 * let layouter = CloudLayouter::new(LayoutConfig::new().seed(42), BlockFace::default())?;
 * let layout = layouter.layout(&words, Viewport::new(800.0, 600.0))?;
 * for placed in &layout.placements {
 *     println!("{} at ({}, {})", placed.word.text, placed.x, placed.y);
 * }
 * # Ok::<(), wordcloud_placement::Error>(())
 * ```
 */

pub mod config;
pub mod envelope;
pub mod error;
pub mod face;
pub mod field;
pub mod layout;
pub mod log;
pub mod render;
pub mod spiral;
pub mod sprite;

pub use config::{CanvasSizing, FontScale, LayoutConfig, RotationRange};
pub use envelope::{Bounds, Envelope, FitTransform};
pub use error::Error;
pub use face::{BlockFace, Coverage, FontFace, GlyphSource};
pub use field::CollisionField;
pub use layout::{
    CanvasSize, CloudLayout, CloudLayouter, LayoutPass, MAX_CANVAS_SIDE, PassStatus, Viewport,
    WordInput, WordPlacement, WordSpec,
};
pub use render::RenderStyle;
pub use spiral::{ArchimedeanSpiral, SearchOutcome, SpiralSearch};
pub use sprite::{GlyphRasterizer, RunRequest, Sprite};

/// 用默认配置和方块字形生成布局
pub fn generate(words: &[(&str, f32)], viewport: Viewport) -> Result<CloudLayout, Error> {
    let inputs: Vec<WordInput> = words
        .iter()
        .map(|(text, weight)| WordInput::new(*text, *weight))
        .collect();

    let config = LayoutConfig::default();
    let words = config.font_scale.prepare(&inputs);
    CloudLayouter::new(config, BlockFace::default())?.layout(&words, viewport)
}
