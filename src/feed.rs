//! Feed composition: paginated post listings with per-viewer enrichment.
//!
//! Listings and counts always share one predicate (soft-deleted posts
//! excluded, optional topic/author match), so `totalPages` stays consistent
//! with the rows actually served. Enrichment runs strictly after pagination:
//! cost is bounded by the page size, not the match count.

use crate::error::{Error, Result};
use crate::store::{PostFilter, Store};
use crate::types::{Post, PostSummary, User, ViewerContext};

/// One page of a feed plus the pagination totals for the whole match set.
#[derive(Debug)]
pub struct FeedPage {
    pub posts: Vec<PostSummary>,
    pub total_pages: i64,
    pub count: i64,
}

/// Computes the viewer-dependent flags for a single post.
pub fn viewer_context(store: &dyn Store, post_id: &str, viewer_id: &str) -> Result<ViewerContext> {
    Ok(ViewerContext {
        bookmarked: store.has_bookmark(viewer_id, post_id)?,
        liked: store.has_like(viewer_id, post_id)?,
    })
}

/// Projects posts to summaries, attaching viewer flags when a viewer is
/// present. Evaluated per post; order is preserved.
pub fn enrich_summaries(
    store: &dyn Store,
    posts: &[Post],
    viewer: Option<&User>,
) -> Result<Vec<PostSummary>> {
    posts
        .iter()
        .map(|post| {
            let mut summary = PostSummary::from_post(post);
            if let Some(viewer) = viewer {
                summary.user_data = Some(viewer_context(store, &post.id, &viewer.id)?);
            }
            Ok(summary)
        })
        .collect()
}

/// Builds one feed page: filter, count, window, then enrich the page.
///
/// `page` is 1-based. Degenerate windows are rejected rather than silently
/// producing an empty or negative skip.
pub fn compose(
    store: &dyn Store,
    filter: &PostFilter,
    page: u32,
    limit: u32,
    viewer: Option<&User>,
) -> Result<FeedPage> {
    if page < 1 {
        return Err(Error::BadRequest("page must be at least 1".to_string()));
    }
    if limit < 1 {
        return Err(Error::BadRequest("limit must be at least 1".to_string()));
    }

    let count = store.count_posts(filter)?;
    let total_pages = (count + i64::from(limit) - 1) / i64::from(limit);

    let offset = (page - 1).saturating_mul(limit);
    let posts = store.list_posts(filter, offset, limit)?;
    let posts = enrich_summaries(store, &posts, viewer)?;

    Ok(FeedPage {
        posts,
        total_pages,
        count,
    })
}

/// Fetches a single post for a viewer. Removed and unknown posts are both
/// absent; anonymous viewers get no `userData`.
pub fn single(
    store: &dyn Store,
    post_id: &str,
    viewer: Option<&User>,
) -> Result<Option<(Post, Option<ViewerContext>)>> {
    let Some(post) = store.get_post(post_id)? else {
        return Ok(None);
    };

    let user_data = match viewer {
        Some(viewer) => Some(viewer_context(store, &post.id, &viewer.id)?),
        None => None,
    };

    Ok(Some((post, user_data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{AuthorRef, TopicRef};
    use chrono::Utc;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn make_user(store: &SqliteStore, n: u32) -> User {
        let user = User {
            id: format!("user-{n}"),
            username: format!("user{n}"),
            email: format!("user{n}@example.com"),
            password_hash: "$argon2id$test".to_string(),
            created_at: Utc::now(),
            profile_picture: None,
            about: None,
        };
        store.create_user(&user).unwrap();
        user
    }

    fn make_post(store: &SqliteStore, n: u32, author: &User, topic_name: &str) -> Post {
        let topic = store
            .find_or_create_topic(topic_name, &format!("topic-{topic_name}"))
            .unwrap();
        let post = Post {
            id: format!("post-{n:04}"),
            title: format!("Post {n}"),
            description: "desc".to_string(),
            markdown: "# body".to_string(),
            html: None,
            created_at: Utc::now(),
            last_edit: None,
            likes: 0,
            author: AuthorRef {
                id: author.id.clone(),
                username: author.username.clone(),
            },
            topic: TopicRef {
                id: topic.id,
                name: topic.name,
            },
            removed: false,
        };
        store.create_post(&post).unwrap();
        post
    }

    #[test]
    fn total_pages_is_ceil_of_count_over_limit() {
        let (_temp, store) = open_store();
        let author = make_user(&store, 1);
        for n in 1..=7 {
            make_post(&store, n, &author, "cooking");
        }

        for (limit, expected) in [(3, 3), (7, 1), (10, 1), (1, 7)] {
            let page = compose(&store, &PostFilter::default(), 1, limit, None).unwrap();
            assert_eq!(page.total_pages, expected, "limit {limit}");
            assert_eq!(page.count, 7);
        }
    }

    #[test]
    fn empty_feed_has_zero_pages() {
        let (_temp, store) = open_store();
        let page = compose(&store, &PostFilter::default(), 1, 10, None).unwrap();
        assert_eq!(page.total_pages, 0);
        assert!(page.posts.is_empty());
    }

    #[test]
    fn degenerate_windows_are_rejected() {
        let (_temp, store) = open_store();

        assert!(matches!(
            compose(&store, &PostFilter::default(), 0, 10, None),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            compose(&store, &PostFilter::default(), 1, 0, None),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn pagination_windows_do_not_overlap() {
        let (_temp, store) = open_store();
        let author = make_user(&store, 1);
        for n in 1..=5 {
            make_post(&store, n, &author, "cooking");
        }

        let first = compose(&store, &PostFilter::default(), 1, 2, None).unwrap();
        let second = compose(&store, &PostFilter::default(), 2, 2, None).unwrap();
        let third = compose(&store, &PostFilter::default(), 3, 2, None).unwrap();

        assert_eq!(first.posts.len(), 2);
        assert_eq!(second.posts.len(), 2);
        assert_eq!(third.posts.len(), 1);

        let mut seen: Vec<_> = first
            .posts
            .iter()
            .chain(&second.posts)
            .chain(&third.posts)
            .map(|p| p.id.clone())
            .collect();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn removed_posts_never_appear() {
        let (_temp, store) = open_store();
        let author = make_user(&store, 1);
        make_post(&store, 1, &author, "cooking");
        make_post(&store, 2, &author, "cooking");
        store.remove_post("post-0002", &author.id).unwrap();

        let page = compose(&store, &PostFilter::default(), 1, 10, None).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.posts[0].id, "post-0001");

        assert!(single(&store, "post-0002", None).unwrap().is_none());
    }

    #[test]
    fn topic_filter_is_exact() {
        let (_temp, store) = open_store();
        let author = make_user(&store, 1);
        make_post(&store, 1, &author, "cooking");
        make_post(&store, 2, &author, "code");

        let filter = PostFilter {
            topic_name: Some("cooking".to_string()),
            ..Default::default()
        };
        let page = compose(&store, &filter, 1, 10, None).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.posts[0].topic.name, "cooking");

        // Stored names are normalized; an unnormalized query misses.
        let filter = PostFilter {
            topic_name: Some("Cooking".to_string()),
            ..Default::default()
        };
        assert_eq!(compose(&store, &filter, 1, 10, None).unwrap().count, 0);
    }

    #[test]
    fn enrichment_reflects_viewer_state() {
        let (_temp, store) = open_store();
        let author = make_user(&store, 1);
        let viewer = make_user(&store, 2);
        make_post(&store, 1, &author, "cooking");
        make_post(&store, 2, &author, "cooking");

        store.insert_like(&viewer.id, "post-0001").unwrap();
        store.add_bookmark(&viewer.id, "post-0002").unwrap();

        let page = compose(&store, &PostFilter::default(), 1, 10, Some(&viewer)).unwrap();
        let by_id = |id: &str| {
            page.posts
                .iter()
                .find(|p| p.id == id)
                .unwrap()
                .user_data
                .unwrap()
        };

        assert_eq!(
            by_id("post-0001"),
            ViewerContext {
                bookmarked: false,
                liked: true
            }
        );
        assert_eq!(
            by_id("post-0002"),
            ViewerContext {
                bookmarked: true,
                liked: false
            }
        );
    }

    #[test]
    fn anonymous_pages_carry_no_user_data() {
        let (_temp, store) = open_store();
        let author = make_user(&store, 1);
        make_post(&store, 1, &author, "cooking");

        let page = compose(&store, &PostFilter::default(), 1, 10, None).unwrap();
        assert!(page.posts[0].user_data.is_none());

        let (_, user_data) = single(&store, "post-0001", None).unwrap().unwrap();
        assert!(user_data.is_none());
    }

    #[test]
    fn single_post_enriches_for_viewer() {
        let (_temp, store) = open_store();
        let author = make_user(&store, 1);
        let viewer = make_user(&store, 2);
        make_post(&store, 1, &author, "cooking");
        store.insert_like(&viewer.id, "post-0001").unwrap();

        let (post, user_data) = single(&store, "post-0001", Some(&viewer)).unwrap().unwrap();
        assert_eq!(post.likes, 1);
        assert!(user_data.unwrap().liked);
    }
}
