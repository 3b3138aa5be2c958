//! 用真实字体布局并输出 PNG 和 SVG。
//!
//! ```text
//! cargo run --example advanced -- path/to/font.ttf
//! ```
//!
//! 不给字体路径时退回到方块字形。

use std::fs;

use tracing_subscriber::EnvFilter;
use wordcloud_placement::{
    BlockFace, CloudLayouter, FontFace, GlyphSource, LayoutConfig, RenderStyle,
    RotationRange, Viewport, WordInput,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let words = vec![
        WordInput::new("Custom", 90.0),
        WordInput::new("Colors", 80.0),
        WordInput::new("Seed", 70.0),
        WordInput::new("Fixed", 60.0),
        WordInput::new("Layout", 50.0),
        WordInput::new("Spiral", 45.0),
        WordInput::new("Sprite", 40.0),
        WordInput::new("Bitmask", 30.0),
        WordInput::new("Vertical", 25.0).with_rotation(90.0),
    ];

    let mut style = RenderStyle {
        background: "#1a1a1a".into(),
        colors: ["#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#00FFFF"]
            .into_iter()
            .map(String::from)
            .collect(),
        ..RenderStyle::default()
    };

    let face: Box<dyn GlyphSource> = match std::env::args().nth(1) {
        Some(path) => {
            let face = FontFace::from_bytes(&fs::read(path)?)?;
            style.font_family = face.family().to_string();
            Box::new(face)
        }
        None => Box::new(BlockFace::default()),
    };

    let config = LayoutConfig::new()
        .seed(42)
        .font_size_range(20.0, 100.0)
        .rotation(RotationRange {
            min_deg: -60.0,
            max_deg: 60.0,
            orientations: 5,
        });
    let words = config.font_scale.prepare(&words);

    let layouter = CloudLayouter::new(config, face)?;
    let viewport = Viewport::new(600.0, 400.0);
    let layout = layouter.layout(&words, viewport)?;

    fs::write(
        "output_advanced.png",
        layout.to_png(layouter.face(), viewport, &style)?,
    )?;
    fs::write("output_advanced.svg", layout.to_svg(viewport, &style))?;
    println!(
        "Generated advanced word cloud ({} placed, {} dropped): output_advanced.png",
        layout.placements.len(),
        layout.dropped()
    );

    Ok(())
}
