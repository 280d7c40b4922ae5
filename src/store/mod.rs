mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Filter shared by the list and count queries of a feed page. Both always
/// exclude soft-deleted posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub topic_name: Option<String>,
    pub author_id: Option<String>,
}

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn update_user_about(&self, id: &str, about: Option<&str>) -> Result<()>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session(&self, token: &str) -> Result<Option<Session>>;
    fn delete_session(&self, token: &str) -> Result<bool>;

    // Post operations. Reads treat removed posts as absent.
    fn create_post(&self, post: &Post) -> Result<()>;
    fn get_post(&self, id: &str) -> Result<Option<Post>>;
    fn list_posts(&self, filter: &PostFilter, offset: u32, limit: u32) -> Result<Vec<Post>>;
    fn count_posts(&self, filter: &PostFilter) -> Result<i64>;
    fn update_post_content(
        &self,
        id: &str,
        author_id: &str,
        title: &str,
        description: &str,
        markdown: &str,
    ) -> Result<bool>;
    fn remove_post(&self, id: &str, author_id: &str) -> Result<bool>;

    // Topic operations
    fn find_or_create_topic(&self, name: &str, candidate_id: &str) -> Result<Topic>;
    fn search_topics(&self, name_prefix: &str) -> Result<Vec<Topic>>;

    // Like toggle. Row and counter move in one transaction.
    fn insert_like(&self, user_id: &str, post_id: &str) -> Result<()>;
    fn delete_like(&self, user_id: &str, post_id: &str) -> Result<()>;
    fn has_like(&self, user_id: &str, post_id: &str) -> Result<bool>;

    // Bookmark toggle
    fn add_bookmark(&self, user_id: &str, post_id: &str) -> Result<()>;
    fn remove_bookmark(&self, user_id: &str, post_id: &str) -> Result<()>;
    fn has_bookmark(&self, user_id: &str, post_id: &str) -> Result<bool>;
    fn list_bookmarked_posts(&self, user_id: &str) -> Result<Vec<Post>>;

    // Follower graph
    fn insert_follow(&self, follower_id: &str, followed_id: &str) -> Result<()>;
    fn delete_follow(&self, follower_id: &str, followed_id: &str) -> Result<()>;
    fn has_follow(&self, follower_id: &str, followed_id: &str) -> Result<bool>;
    fn count_followers(&self, user_id: &str) -> Result<i64>;
    fn count_following(&self, user_id: &str) -> Result<i64>;
    fn list_followed_users(&self, user_id: &str) -> Result<Vec<User>>;
    fn list_follower_users(&self, user_id: &str) -> Result<Vec<User>>;

    fn close(&self) -> Result<()>;
}
