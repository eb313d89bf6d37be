//! List published posts

use anyhow::Result;

use crate::content::PageLoader;
use crate::helpers::DateFormatter;
use crate::Blog;

/// Print every published post, newest first
pub async fn run(blog: &Blog) -> Result<()> {
    let source = blog.content_source()?;
    let loader = PageLoader::new(source.as_ref(), &blog.config);
    let dates = DateFormatter::from_config(&blog.config);

    let home = loader.load_home(None).await?;
    let mut listing = home.posts_pagination;
    while let Some(cursor) = listing.next_page.clone() {
        listing = listing.append_page(source.fetch_page(&cursor).await?);
    }

    println!("Posts ({}):", listing.results.len());
    for post in &listing.results {
        let date = post
            .first_publication_date
            .as_deref()
            .map(|d| dates.short(d))
            .unwrap_or_default();
        println!("  {} - {} [{}]", date, post.title, post.path());
    }

    Ok(())
}
