//! Page data loaders - fetch and shape the data behind each page

use serde::Serialize;

use super::{AdjacentPost, ContentBlock, PostDetail, PostPagination};
use crate::config::SiteConfig;
use crate::prismic::{richtext, ContentSource, Ordering, Predicate, QueryOptions, Result};

/// Upper bound for listing pages folded into one server-rendered response
pub const MAX_LISTING_PAGES: usize = 20;

const PUBLICATION_DATE: &str = "document.first_publication_date";

/// Data behind the listing page
#[derive(Debug, Clone, Serialize)]
pub struct HomeProps {
    pub posts_pagination: PostPagination,
    pub preview: bool,
}

/// Data behind a post page
#[derive(Debug, Clone, Serialize)]
pub struct PostProps {
    pub post: PostDetail,
    pub preview: bool,
    /// Estimated minutes to read
    pub reading_time: usize,
    pub previous_url: Option<AdjacentPost>,
    pub next_url: Option<AdjacentPost>,
}

/// Loads page data from a content source
pub struct PageLoader<'a> {
    source: &'a dyn ContentSource,
    doc_type: String,
    page_size: usize,
    words_per_minute: usize,
}

impl<'a> PageLoader<'a> {
    /// Create a new loader
    pub fn new(source: &'a dyn ContentSource, config: &SiteConfig) -> Self {
        Self {
            source,
            doc_type: config.document_type.clone(),
            page_size: config.page_size.max(1),
            words_per_minute: config.words_per_minute,
        }
    }

    fn field(&self, name: &str) -> String {
        format!("{}.{}", self.doc_type, name)
    }

    fn listing_options(&self, ref_pin: Option<&str>) -> QueryOptions {
        QueryOptions::default()
            .page_size(self.page_size)
            .order_by(Ordering::desc(PUBLICATION_DATE))
            .fetch([self.field("title"), self.field("subtitle"), self.field("author")])
            .ref_pin(ref_pin)
    }

    /// First page of posts, newest first
    pub async fn load_home(&self, ref_pin: Option<&str>) -> Result<HomeProps> {
        let response = self
            .source
            .query(
                &[Predicate::document_type(&self.doc_type)],
                &self.listing_options(ref_pin),
            )
            .await?;

        let posts_pagination = PostPagination::from_response(response);
        tracing::debug!(
            posts = posts_pagination.results.len(),
            has_more = posts_pagination.has_more(),
            preview = ref_pin.is_some(),
            "listing loaded"
        );

        Ok(HomeProps {
            posts_pagination,
            preview: ref_pin.is_some(),
        })
    }

    /// First `pages` pages of posts, following the cursor
    pub async fn load_home_pages(&self, ref_pin: Option<&str>, pages: usize) -> Result<HomeProps> {
        let mut props = self.load_home(ref_pin).await?;
        for _ in 1..pages.clamp(1, MAX_LISTING_PAGES) {
            let Some(cursor) = props.posts_pagination.next_page.clone() else {
                break;
            };
            let response = self.source.fetch_page(&cursor).await?;
            props.posts_pagination = props.posts_pagination.append_page(response);
        }
        Ok(props)
    }

    /// The page behind a `next_page` cursor
    pub async fn load_more(&self, cursor: &str) -> Result<PostPagination> {
        let response = self.source.fetch_page(cursor).await?;
        Ok(PostPagination::from_response(response))
    }

    /// UIDs of the posts prerendered at build time
    pub async fn static_paths(&self) -> Result<Vec<String>> {
        let home = self.load_home(None).await?;
        Ok(home
            .posts_pagination
            .results
            .into_iter()
            .map(|p| p.uid)
            .filter(|uid| !uid.is_empty())
            .collect())
    }

    /// A post with its neighbours, or `None` when the slug is unknown
    pub async fn load_post(&self, slug: &str, ref_pin: Option<&str>) -> Result<Option<PostProps>> {
        let Some(doc) = self.source.get_by_uid(&self.doc_type, slug, ref_pin).await? else {
            tracing::debug!(slug = %slug, "post not found");
            return Ok(None);
        };

        let post = PostDetail::from_document(&doc)?;
        let reading_time = reading_time(&post.content, self.words_per_minute);

        let (previous_url, next_url) = match post.first_publication_date.as_deref() {
            Some(date) => (
                self.adjacent(Predicate::date_before(PUBLICATION_DATE, date), true, ref_pin)
                    .await?,
                self.adjacent(Predicate::date_after(PUBLICATION_DATE, date), false, ref_pin)
                    .await?,
            ),
            None => (None, None),
        };

        Ok(Some(PostProps {
            post,
            preview: ref_pin.is_some(),
            reading_time,
            previous_url,
            next_url,
        }))
    }

    /// Closest post on one side of the current one
    async fn adjacent(
        &self,
        bound: Predicate,
        newest_first: bool,
        ref_pin: Option<&str>,
    ) -> Result<Option<AdjacentPost>> {
        let ordering = if newest_first {
            Ordering::desc(PUBLICATION_DATE)
        } else {
            Ordering::asc(PUBLICATION_DATE)
        };
        let options = QueryOptions::default()
            .page_size(1)
            .order_by(ordering)
            .fetch([self.field("title")])
            .ref_pin(ref_pin);

        let response = self
            .source
            .query(&[Predicate::document_type(&self.doc_type), bound], &options)
            .await?;
        Ok(response.results.first().and_then(AdjacentPost::from_document))
    }
}

/// Minutes needed to read `content`, rounded up
pub fn reading_time(content: &[ContentBlock], words_per_minute: usize) -> usize {
    let words: usize = content
        .iter()
        .map(|block| richtext::as_text(&block.body).split_whitespace().count())
        .sum();
    words.div_ceil(words_per_minute.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::testing::{post_doc, FakeSource};
    use crate::prismic::RichTextBlock;

    fn blocks_with_words(counts: &[usize]) -> Vec<ContentBlock> {
        counts
            .iter()
            .map(|&n| ContentBlock {
                heading: "Heading words are not counted".to_string(),
                body: vec![RichTextBlock::paragraph(&vec!["w"; n].join("  \n"))],
            })
            .collect()
    }

    /// Seven posts, `p1` oldest to `p7` newest
    fn seven_posts() -> FakeSource {
        let docs = (1..=7)
            .map(|i| {
                post_doc(
                    &format!("p{}", i),
                    Some(&format!("2021-03-0{}T10:00:00+0000", i)),
                    &format!("Post {}", i),
                    10,
                )
            })
            .collect();
        FakeSource::new(docs)
    }

    fn uids(pagination: &PostPagination) -> Vec<&str> {
        pagination.results.iter().map(|p| p.uid.as_str()).collect()
    }

    #[test]
    fn test_reading_time_rounds_up() {
        assert_eq!(reading_time(&blocks_with_words(&[400]), 200), 2);
        assert_eq!(reading_time(&blocks_with_words(&[401]), 200), 3);
        assert_eq!(reading_time(&blocks_with_words(&[150, 150, 101]), 200), 3);
        assert_eq!(reading_time(&blocks_with_words(&[1]), 200), 1);
        assert_eq!(reading_time(&[], 200), 0);
        assert_eq!(reading_time(&blocks_with_words(&[5]), 0), 5);
    }

    #[tokio::test]
    async fn test_load_home_first_page() {
        let source = seven_posts();
        let loader = PageLoader::new(&source, &SiteConfig::default());
        let home = loader.load_home(None).await.unwrap();

        assert_eq!(uids(&home.posts_pagination), ["p7", "p6", "p5", "p4", "p3"]);
        assert!(home.posts_pagination.has_more());
        assert!(!home.preview);
        assert_eq!(
            source.queries(),
            vec![(r#"[[at(document.type, "posts")]]"#.to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_load_home_pages_follows_cursor() {
        let source = seven_posts();
        let loader = PageLoader::new(&source, &SiteConfig::default());

        let home = loader.load_home_pages(None, 2).await.unwrap();
        assert_eq!(
            uids(&home.posts_pagination),
            ["p7", "p6", "p5", "p4", "p3", "p2", "p1"]
        );
        assert!(!home.posts_pagination.has_more());

        let home = loader.load_home_pages(None, 0).await.unwrap();
        assert_eq!(home.posts_pagination.results.len(), 5);
    }

    #[tokio::test]
    async fn test_load_more_maps_cursor_page() {
        let source = seven_posts();
        let loader = PageLoader::new(&source, &SiteConfig::default());
        let first = loader.load_home(None).await.unwrap();
        let cursor = first.posts_pagination.next_page.unwrap();

        let more = loader.load_more(&cursor).await.unwrap();
        assert_eq!(uids(&more), ["p2", "p1"]);
        assert!(more.next_page.is_none());
    }

    #[tokio::test]
    async fn test_static_paths() {
        let source = seven_posts();
        let loader = PageLoader::new(&source, &SiteConfig::default());
        assert_eq!(
            loader.static_paths().await.unwrap(),
            ["p7", "p6", "p5", "p4", "p3"]
        );
    }

    #[tokio::test]
    async fn test_load_post_with_neighbours() {
        let source = seven_posts();
        let loader = PageLoader::new(&source, &SiteConfig::default());
        let props = loader.load_post("p4", None).await.unwrap().unwrap();

        assert_eq!(props.post.title, "Post 4");
        assert_eq!(props.reading_time, 1);
        assert_eq!(
            props.previous_url,
            Some(AdjacentPost {
                title: "Post 3".to_string(),
                url: "/post/p3".to_string(),
            })
        );
        assert_eq!(
            props.next_url,
            Some(AdjacentPost {
                title: "Post 5".to_string(),
                url: "/post/p5".to_string(),
            })
        );

        let queries = source.queries();
        assert_eq!(queries.len(), 3);
        assert_eq!(
            queries[1].0,
            r#"[[at(document.type, "posts")][date.before(document.first_publication_date, "2021-03-04T10:00:00+0000")]]"#
        );
    }

    #[tokio::test]
    async fn test_oldest_and_newest_posts_leave_links_unset() {
        let source = seven_posts();
        let loader = PageLoader::new(&source, &SiteConfig::default());

        let oldest = loader.load_post("p1", None).await.unwrap().unwrap();
        assert!(oldest.previous_url.is_none());
        assert_eq!(oldest.next_url.unwrap().url, "/post/p2");

        let newest = loader.load_post("p7", None).await.unwrap().unwrap();
        assert_eq!(newest.previous_url.unwrap().url, "/post/p6");
        assert!(newest.next_url.is_none());
    }

    #[tokio::test]
    async fn test_unpublished_post_skips_adjacency() {
        let source = FakeSource::new(vec![post_doc("draft", None, "Draft", 3)]);
        let loader = PageLoader::new(&source, &SiteConfig::default());
        let props = loader.load_post("draft", None).await.unwrap().unwrap();

        assert!(props.previous_url.is_none());
        assert!(props.next_url.is_none());
        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_slug_is_none() {
        let source = seven_posts();
        let loader = PageLoader::new(&source, &SiteConfig::default());
        assert!(loader.load_post("missing", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_preview_ref_is_threaded_through() {
        let draft = post_doc("new-draft", Some("2021-03-20T10:00:00+0000"), "Draft", 400);
        let source = seven_posts().with_preview("preview-token", vec![draft]);
        let loader = PageLoader::new(&source, &SiteConfig::default());

        assert!(loader.load_post("new-draft", None).await.unwrap().is_none());

        let props = loader
            .load_post("new-draft", Some("preview-token"))
            .await
            .unwrap()
            .unwrap();
        assert!(props.preview);
        assert_eq!(props.reading_time, 2);
        assert_eq!(props.previous_url.unwrap().url, "/post/p7");
        assert!(source
            .queries()
            .iter()
            .skip(1)
            .all(|(_, r)| r.as_deref() == Some("preview-token")));
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let source = FakeSource::failing();
        let loader = PageLoader::new(&source, &SiteConfig::default());
        assert!(loader.load_home(None).await.is_err());
        assert!(loader.load_post("p1", None).await.is_err());
    }
}
