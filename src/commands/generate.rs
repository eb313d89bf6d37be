//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Prerender the listing and the first page of posts into the public directory
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog.config.clone(), blog.content_source()?, &blog.i18n()?)?;
    let written = generator
        .generate(&blog.public_dir, &blog.static_dir)
        .await?;

    tracing::info!(
        "Generated {} pages in {:.2}s",
        written,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
