use std::fs;
use std::time::Instant;

use wordcloud_placement::{RenderStyle, Viewport, generate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let words = vec![
        ("Rust", 100.0),
        ("Performance", 80.0),
        ("Safety", 70.0),
        ("Concurrency", 60.0),
        ("Fast", 50.0),
        ("Memory", 45.0),
        ("Efficient", 40.0),
        ("Reliable", 35.0),
        ("Community", 30.0),
        ("Cargo", 25.0),
        ("Crates", 20.0),
        ("Macro", 15.0),
    ];

    println!("Laying out {} words...", words.len());

    let viewport = Viewport::new(800.0, 600.0);
    let layout = generate(&words, viewport)?;
    println!(
        "Placed {} of {} words",
        layout.placements.len(),
        layout.attempted
    );

    fs::write(
        "output_simple.svg",
        layout.to_svg(viewport, &RenderStyle::default()),
    )?;

    println!("Done! Saved to output_simple.svg");
    println!("Time elapsed: {:?}", start.elapsed());

    Ok(())
}
