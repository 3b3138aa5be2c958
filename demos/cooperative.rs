//! 分段执行布局，并在中途用新的输入取代旧的 pass。

use std::fs;

use tracing_subscriber::EnvFilter;
use wordcloud_placement::{
    BlockFace, CloudLayouter, LayoutConfig, PassStatus, RenderStyle, Viewport, WordInput,
};

fn words(prefix: &str, count: usize) -> Vec<WordInput> {
    (0..count)
        .map(|i| WordInput::new(format!("{prefix}{i}"), (count - i) as f32))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let layouter = CloudLayouter::new(LayoutConfig::new().seed(7), BlockFace::default())?;
    let scale = layouter.config().font_scale;
    let first = scale.prepare(&words("old", 150));
    let second = scale.prepare(&words("new", 120));
    let viewport = Viewport::new(1024.0, 768.0);

    let mut stale = layouter.begin(&first, viewport)?;
    while stale.step(10) == PassStatus::Running {
        if stale.processed() >= 40 {
            break;
        }
    }
    println!(
        "first pass: {} processed, {} placed so far",
        stale.processed(),
        stale.placements().len()
    );

    // 新输入到达，旧 pass 的结果作废
    let mut fresh = layouter.begin(&second, viewport)?;
    assert_eq!(stale.step(10), PassStatus::Superseded);
    assert!(stale.finish().is_none());

    let mut slices = 0;
    while fresh.step(16) == PassStatus::Running {
        slices += 1;
        if let Some(envelope) = fresh.envelope() {
            println!(
                "slice {slices}: {} placed, envelope {}x{}",
                fresh.placements().len(),
                envelope.width(),
                envelope.height()
            );
        }
    }

    let Some(layout) = fresh.finish() else {
        return Err("second pass was superseded".into());
    };
    fs::write(
        "output_cooperative.svg",
        layout.to_svg(viewport, &RenderStyle::default()),
    )?;
    println!(
        "Placed {} of {} words: output_cooperative.svg",
        layout.placements.len(),
        layout.attempted
    );

    Ok(())
}
