//! Content module - post models and the page data loaders

pub mod loader;
mod post;

pub use loader::{reading_time, HomeProps, PageLoader, PostProps, MAX_LISTING_PAGES};
pub use post::{
    post_path, resolve_link, AdjacentPost, ContentBlock, PostDetail, PostPagination, PostSummary,
};
