use wordcloud_placement::{
    BlockFace, Bounds, CanvasSizing, CloudLayout, CloudLayouter, CollisionField, FontFace,
    GlyphRasterizer, LayoutConfig, MAX_CANVAS_SIDE, PassStatus, RotationRange, RunRequest, Sprite,
    Viewport, WordPlacement, WordSpec,
};

fn layouter(config: LayoutConfig) -> CloudLayouter<BlockFace> {
    CloudLayouter::new(config.canvas(CanvasSizing::Viewport), BlockFace::default()).unwrap()
}

fn sprite_for(placement: &WordPlacement) -> Sprite {
    let mut rasterizer = GlyphRasterizer::new(2048, 2048).unwrap();
    let request = RunRequest {
        text: &placement.word.text,
        size: placement.word.font_size,
        rotation: placement.rotation,
    };
    rasterizer.rasterize(&BlockFace::default(), &[request]).remove(0)
}

fn anchor(layout: &CloudLayout, placement: &WordPlacement) -> (i32, i32) {
    (
        placement.x + (layout.canvas.width >> 1) as i32,
        placement.y + (layout.canvas.height >> 1) as i32,
    )
}

/// 用除某个单词外的所有放置结果重建碰撞位图，再探测这个单词
fn assert_no_overlap(layout: &CloudLayout) {
    let sprites: Vec<Sprite> = layout.placements.iter().map(sprite_for).collect();
    for (placement, sprite) in layout.placements.iter().zip(&sprites) {
        let (x, y) = (placement.x, placement.y);
        assert_eq!(
            Bounds::new(x + sprite.x0, y + sprite.y0, x + sprite.x1, y + sprite.y1),
            placement.bounds,
            "re-rasterized sprite of {:?} does not match its placement",
            placement.word.text
        );
    }

    for skip in 0..layout.placements.len() {
        let mut field = CollisionField::new(layout.canvas.width, layout.canvas.height);
        for (i, (placement, sprite)) in layout.placements.iter().zip(&sprites).enumerate() {
            if i != skip {
                let (x, y) = anchor(layout, placement);
                field.commit(sprite, x, y);
            }
        }
        let (x, y) = anchor(layout, &layout.placements[skip]);
        assert!(
            !field.probe(&sprites[skip], x, y),
            "placement {skip} ({:?}) overlaps another word",
            layout.placements[skip].word.text
        );
    }
}

fn assert_in_bounds(layout: &CloudLayout) {
    let (half_w, half_h) = ((layout.canvas.width >> 1) as i32, (layout.canvas.height >> 1) as i32);
    let canvas = Bounds::new(0, 0, layout.canvas.width as i32, layout.canvas.height as i32);
    for placement in &layout.placements {
        let b = placement.bounds.translate(half_w, half_h);
        assert!(canvas.contains(&b), "{b:?} escapes {canvas:?}");
    }
}

fn union_of(placements: &[WordPlacement]) -> Option<Bounds> {
    placements
        .iter()
        .map(|p| p.bounds)
        .reduce(|a, b| a.union(&b))
}

fn mixed_words(count: usize) -> Vec<WordSpec> {
    const TEXTS: [&str; 8] = [
        "rust", "cargo", "crate", "trait", "borrow", "lifetime", "macro", "async",
    ];
    (0..count)
        .map(|i| {
            let size = 48.0 - (i as f32 * 36.0 / count as f32);
            WordSpec::new(TEXTS[i % TEXTS.len()], (count - i) as f32, size)
        })
        .collect()
}

#[test]
fn three_words_fit_in_ample_space() {
    let words = [
        WordSpec::new("alpha", 10.0, 40.0),
        WordSpec::new("beta", 5.0, 25.0),
        WordSpec::new("gamma", 1.0, 12.0),
    ];
    let layout = layouter(LayoutConfig::new().seed(42))
        .layout(&words, Viewport::new(400.0, 300.0))
        .unwrap();

    assert_eq!(layout.canvas.width, 400);
    assert_eq!(layout.canvas.height, 300);
    assert_eq!(layout.placements.len(), 3);
    assert_eq!(layout.dropped(), 0);
    assert_no_overlap(&layout);
    assert_in_bounds(&layout);

    let envelope = layout.envelope.unwrap();
    assert!(envelope.width() < 400);
    assert!(envelope.height() < 300);
}

#[test]
fn accepted_words_never_overlap() {
    let layout = layouter(LayoutConfig::new().seed(7))
        .layout(&mixed_words(40), Viewport::new(500.0, 400.0))
        .unwrap();
    assert!(layout.placements.len() > 10);
    assert_no_overlap(&layout);
    assert_in_bounds(&layout);
}

#[test]
fn rotated_words_stay_inside_canvas() {
    let config = LayoutConfig::new().seed(5).rotation(RotationRange {
        min_deg: 0.0,
        max_deg: 90.0,
        orientations: 2,
    });
    let layout = layouter(config)
        .layout(&mixed_words(30), Viewport::new(500.0, 500.0))
        .unwrap();
    assert!(!layout.is_empty());
    assert_in_bounds(&layout);
    assert!(layout.placements.iter().all(|p| p.rotation == 0.0 || p.rotation == 90.0));
    assert!(layout.placements.iter().any(|p| p.rotation == 90.0));
    for placement in layout.placements.iter().filter(|p| p.rotation == 90.0) {
        assert!(placement.bounds.height() > placement.bounds.width() / 2);
    }
}

#[test]
fn envelope_is_union_of_placed_boxes() {
    let layout = layouter(LayoutConfig::new().seed(19))
        .layout(&mixed_words(25), Viewport::new(600.0, 400.0))
        .unwrap();
    assert_eq!(layout.envelope, union_of(&layout.placements));
}

#[test]
fn envelope_only_grows() {
    let layouter = layouter(LayoutConfig::new().seed(23));
    let words = mixed_words(20);
    let mut pass = layouter.begin(&words, Viewport::new(500.0, 400.0)).unwrap();

    let mut previous: Option<Bounds> = None;
    while pass.step(1) == PassStatus::Running {
        let current = pass.envelope();
        if let Some(before) = previous {
            let after = current.unwrap();
            assert!(after.contains(&before), "{after:?} lost part of {before:?}");
        }
        assert_eq!(current, union_of(pass.placements()));
        previous = current;
    }
    let layout = pass.finish().unwrap();
    assert_eq!(layout.envelope, union_of(&layout.placements));
}

#[test]
fn fixed_seed_is_deterministic() {
    let words = mixed_words(30);
    let first = layouter(LayoutConfig::new().seed(99))
        .layout(&words, Viewport::new(450.0, 350.0))
        .unwrap();
    let second = layouter(LayoutConfig::new().seed(99))
        .layout(&words, Viewport::new(450.0, 350.0))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_input_gives_empty_layout() {
    let layout = layouter(LayoutConfig::new().seed(1))
        .layout(&[], Viewport::new(400.0, 300.0))
        .unwrap();
    assert!(layout.placements.is_empty());
    assert_eq!(layout.envelope, None);
    assert_eq!(layout.attempted, 0);
}

#[test]
fn zero_area_viewport_short_circuits() {
    let layouter = layouter(LayoutConfig::new().seed(1));
    for viewport in [Viewport::new(0.0, 300.0), Viewport::new(400.0, 0.0)] {
        let layout = layouter.layout(&mixed_words(5), viewport).unwrap();
        assert!(layout.placements.is_empty());
        assert_eq!(layout.envelope, None);
        assert_eq!(layout.attempted, 0);
    }
}

#[test]
fn input_is_truncated_to_max_words() {
    let layout = layouter(LayoutConfig::new().seed(4).max_words(3))
        .layout(&mixed_words(10), Viewport::new(600.0, 600.0))
        .unwrap();
    assert_eq!(layout.attempted, 3);
    assert!(!layout.is_empty());
    assert!(layout.placements.iter().all(|p| p.index < 3));
}

#[test]
fn crowded_canvas_drops_most_words() {
    let words: Vec<WordSpec> = (0..500).map(|_| WordSpec::new("big", 1.0, 14.0)).collect();
    let layout = layouter(LayoutConfig::new().seed(8).max_words(500))
        .layout(&words, Viewport::new(50.0, 50.0))
        .unwrap();
    assert_eq!(layout.attempted, 500);
    assert!(!layout.is_empty());
    assert!(layout.placements.len() < 50, "placed {}", layout.placements.len());
    assert_no_overlap(&layout);
    assert_in_bounds(&layout);
}

#[test]
fn oversized_words_are_dropped_silently() {
    let words = [
        WordSpec::new("enormous", 1.0, 200.0),
        WordSpec::new("ok", 1.0, 12.0),
    ];
    let layout = layouter(LayoutConfig::new().seed(2))
        .layout(&words, Viewport::new(200.0, 100.0))
        .unwrap();
    assert_eq!(layout.placements.len(), 1);
    assert_eq!(layout.placements[0].index, 1);
}

#[test]
fn newer_request_supersedes_running_pass() {
    let layouter = layouter(LayoutConfig::new().seed(12));
    let words = mixed_words(10);

    let mut stale = layouter.begin(&words, Viewport::new(400.0, 300.0)).unwrap();
    assert_eq!(stale.step(2), PassStatus::Running);

    let fresh = layouter.begin(&words, Viewport::new(400.0, 300.0)).unwrap();
    assert_eq!(layouter.latest_generation(), 2);
    assert!(stale.is_superseded());
    assert_eq!(stale.step(2), PassStatus::Superseded);
    assert_eq!(stale.processed(), 2);
    assert!(stale.finish().is_none());

    let layout = fresh.finish().unwrap();
    assert_eq!(layout.attempted, 10);
}

#[test]
fn synchronous_layout_is_never_superseded() {
    let layouter = layouter(LayoutConfig::new().seed(12));
    let words = mixed_words(6);
    let pending = layouter.begin(&words, Viewport::new(400.0, 300.0)).unwrap();
    let layout = layouter.layout(&words, Viewport::new(400.0, 300.0)).unwrap();
    assert_eq!(layout.attempted, 6);
    // `layout` does not take a generation, so the pending pass is still current.
    assert!(!pending.is_superseded());
}

#[test]
fn reference_area_sizing_and_fit() {
    let config = LayoutConfig::new().seed(31).canvas(CanvasSizing::ReferenceArea {
        width: 400.0,
        height: 400.0,
    });
    let layouter = CloudLayouter::new(config, BlockFace::default()).unwrap();
    let viewport = Viewport::new(1600.0, 400.0);
    let layout = layouter.layout(&mixed_words(15), viewport).unwrap();
    assert_eq!(layout.canvas.width, 800);
    assert_eq!(layout.canvas.height, 200);

    let envelope = layout.envelope.unwrap();
    let fit = layout.fit(viewport).unwrap();
    let (x0, y0) = fit.apply(envelope.x0 as f32, envelope.y0 as f32);
    let (x1, y1) = fit.apply(envelope.x1 as f32, envelope.y1 as f32);
    assert!(x0 >= -0.01 && y0 >= -0.01);
    assert!(x1 <= 1600.01 && y1 <= 400.01);
    // One axis fills the viewport exactly.
    assert!((x1 - x0 - 1600.0).abs() < 0.01 || (y1 - y0 - 400.0).abs() < 0.01);
}

#[test]
fn generate_uses_defaults() {
    let layout = wordcloud_placement::generate(
        &[("Rust", 100.0), ("Safety", 60.0), ("Cargo", 25.0), ("", 10.0)],
        Viewport::new(800.0, 600.0),
    )
    .unwrap();
    assert_eq!(layout.attempted, 3);
    assert_eq!(layout.placements.len(), 3);
    assert_eq!(layout.placements[0].word.text, "Rust");
}

#[test]
fn huge_viewport_is_laid_out_on_capped_canvas() {
    let layout = layouter(LayoutConfig::new().seed(6))
        .layout(&[WordSpec::new("a", 1.0, 20.0)], Viewport::new(1e9, 1e9))
        .unwrap();
    assert_eq!(layout.canvas.width, MAX_CANVAS_SIDE);
    assert_eq!(layout.canvas.height, MAX_CANVAS_SIDE);
    assert_eq!(layout.placements.len(), 1);
    assert_in_bounds(&layout);
}

#[test]
fn font_face_layout() {
    let face = FontFace::from_bytes(include_bytes!("fixtures/DejaVuSans.ttf")).unwrap();
    let layouter =
        CloudLayouter::new(LayoutConfig::new().seed(3).canvas(CanvasSizing::Viewport), face)
            .unwrap();
    let words = [
        WordSpec::new("Glyph", 3.0, 48.0),
        WordSpec::new("Kerning", 2.0, 30.0),
        WordSpec::new("Baseline", 1.0, 18.0),
    ];
    let layout = layouter.layout(&words, Viewport::new(400.0, 300.0)).unwrap();
    assert_eq!(layout.placements.len(), 3);
    assert_in_bounds(&layout);
    assert_eq!(layout.envelope, union_of(&layout.placements));
}
