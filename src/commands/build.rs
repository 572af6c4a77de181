//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Generate the whole static site from scratch
pub fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let aggregator = blog.aggregator();
    let generator = Generator::new(blog)?;
    generator.generate(&aggregator)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
