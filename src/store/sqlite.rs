use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::schema::SCHEMA;
use super::{PostFilter, Store};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Escapes LIKE wildcards so a topic search prefix matches literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, \
     profile_picture_name, profile_picture_mime, profile_picture, about";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let picture_name: Option<String> = row.get(5)?;
    let picture_mime: Option<String> = row.get(6)?;
    let picture_data: Option<Vec<u8>> = row.get(7)?;

    let profile_picture = match (picture_name, picture_mime, picture_data) {
        (Some(name), Some(content_type), Some(data)) => Some(ProfilePicture {
            name,
            content_type,
            data,
        }),
        _ => None,
    };

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        profile_picture,
        about: row.get(8)?,
    })
}

const POST_COLUMNS: &str = "id, title, description, markdown, html, created_at, last_edit, \
     likes, author_id, author_username, topic_id, topic_name, removed";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        markdown: row.get(3)?,
        html: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        last_edit: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        likes: row.get(7)?,
        author: AuthorRef {
            id: row.get(8)?,
            username: row.get(9)?,
        },
        topic: TopicRef {
            id: row.get(10)?,
            name: row.get(11)?,
        },
        removed: row.get(12)?,
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let (picture_name, picture_mime, picture_data) = match &user.profile_picture {
            Some(p) => (
                Some(p.name.as_str()),
                Some(p.content_type.as_str()),
                Some(p.data.as_slice()),
            ),
            None => (None, None, None),
        };

        let result = self.conn().execute(
            "INSERT INTO users (id, username, email, password_hash, created_at,
                                profile_picture_name, profile_picture_mime, profile_picture, about)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.id,
                user.username,
                user.email,
                user.password_hash,
                format_datetime(&user.created_at),
                picture_name,
                picture_mime,
                picture_data,
                user.about,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_user_about(&self, id: &str, about: Option<&str>) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET about = ?1 WHERE id = ?2",
            params![about, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_id,
                format_datetime(&session.created_at),
                session.expires_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                Ok(Session {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                    expires_at: row.get::<_, Option<String>>(3)?.map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, token: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(rows > 0)
    }

    // Post operations

    fn create_post(&self, post: &Post) -> Result<()> {
        self.conn().execute(
            "INSERT INTO posts (id, title, description, markdown, html, created_at, last_edit,
                                likes, author_id, author_username, topic_id, topic_name, removed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                post.id,
                post.title,
                post.description,
                post.markdown,
                post.html,
                format_datetime(&post.created_at),
                post.last_edit.as_ref().map(format_datetime),
                post.likes,
                post.author.id,
                post.author.username,
                post.topic.id,
                post.topic.name,
                post.removed,
            ],
        )?;
        Ok(())
    }

    fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1 AND removed = 0"),
            params![id],
            post_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_posts(&self, filter: &PostFilter, offset: u32, limit: u32) -> Result<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE removed = 0
               AND (?1 IS NULL OR topic_name = ?1)
               AND (?2 IS NULL OR author_id = ?2)
             ORDER BY created_at DESC, id DESC
             LIMIT ?3 OFFSET ?4"
        ))?;

        let rows = stmt.query_map(
            params![filter.topic_name, filter.author_id, limit, offset],
            post_from_row,
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_posts(&self, filter: &PostFilter) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts
             WHERE removed = 0
               AND (?1 IS NULL OR topic_name = ?1)
               AND (?2 IS NULL OR author_id = ?2)",
            params![filter.topic_name, filter.author_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn update_post_content(
        &self,
        id: &str,
        author_id: &str,
        title: &str,
        description: &str,
        markdown: &str,
    ) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE posts SET title = ?1, description = ?2, markdown = ?3, last_edit = ?4
             WHERE id = ?5 AND author_id = ?6 AND removed = 0",
            params![
                title,
                description,
                markdown,
                format_datetime(&Utc::now()),
                id,
                author_id
            ],
        )?;
        Ok(rows > 0)
    }

    fn remove_post(&self, id: &str, author_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE posts SET removed = 1 WHERE id = ?1 AND author_id = ?2 AND removed = 0",
            params![id, author_id],
        )?;
        Ok(rows > 0)
    }

    // Topic operations

    fn find_or_create_topic(&self, name: &str, candidate_id: &str) -> Result<Topic> {
        let name = name.to_lowercase();

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // INSERT OR IGNORE + re-select makes concurrent lookup-or-create for
        // the same name converge on a single row.
        tx.execute(
            "INSERT OR IGNORE INTO topics (id, name) VALUES (?1, ?2)",
            params![candidate_id, name],
        )?;

        let topic = tx.query_row(
            "SELECT id, name FROM topics WHERE name = ?1",
            params![name],
            |row| {
                Ok(Topic {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;

        tx.commit()?;
        Ok(topic)
    }

    fn search_topics(&self, name_prefix: &str) -> Result<Vec<Topic>> {
        let pattern = format!("{}%", escape_like(&name_prefix.to_lowercase()));

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name FROM topics WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name",
        )?;

        let rows = stmt.query_map(params![pattern], |row| {
            Ok(Topic {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Like toggle

    fn insert_like(&self, user_id: &str, post_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO likes (user_id, post_id) VALUES (?1, ?2)",
            params![user_id, post_id],
        )?;
        if inserted == 0 {
            return Err(Error::AlreadyExists);
        }

        tx.execute(
            "UPDATE posts SET likes = likes + 1 WHERE id = ?1",
            params![post_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_like(&self, user_id: &str, post_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound);
        }

        tx.execute(
            "UPDATE posts SET likes = likes - 1 WHERE id = ?1",
            params![post_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn has_like(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Bookmark toggle

    fn add_bookmark(&self, user_id: &str, post_id: &str) -> Result<()> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO bookmarks (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, post_id, format_datetime(&Utc::now())],
        )?;

        if rows == 0 {
            return Err(Error::AlreadyExists);
        }
        Ok(())
    }

    fn remove_bookmark(&self, user_id: &str, post_id: &str) -> Result<()> {
        let rows = self.conn().execute(
            "DELETE FROM bookmarks WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn has_bookmark(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bookmarks WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_bookmarked_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts p
             JOIN bookmarks b ON p.id = b.post_id
             WHERE b.user_id = ?1 AND p.removed = 0
             ORDER BY p.created_at DESC, p.id DESC",
            POST_COLUMNS
                .split(", ")
                .map(|c| format!("p.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        ))?;

        let rows = stmt.query_map(params![user_id], post_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Follower graph

    fn insert_follow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO followers (follower_id, followed_id) VALUES (?1, ?2)",
            params![follower_id, followed_id],
        )?;

        if rows == 0 {
            return Err(Error::AlreadyExists);
        }
        Ok(())
    }

    fn delete_follow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        let rows = self.conn().execute(
            "DELETE FROM followers WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn has_follow(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM followers WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn count_followers(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM followers WHERE followed_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_following(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM followers WHERE follower_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_followed_users(&self, user_id: &str) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users u
             JOIN followers f ON u.id = f.followed_id
             WHERE f.follower_id = ?1
             ORDER BY u.username",
            qualified_user_columns()
        ))?;

        let rows = stmt.query_map(params![user_id], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_follower_users(&self, user_id: &str) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users u
             JOIN followers f ON u.id = f.follower_id
             WHERE f.followed_id = ?1
             ORDER BY u.username",
            qualified_user_columns()
        ))?;

        let rows = stmt.query_map(params![user_id], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn qualified_user_columns() -> String {
    USER_COLUMNS
        .split(", ")
        .map(|c| format!("u.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn sample_user(n: u32) -> User {
        User {
            id: format!("user-{n}"),
            username: format!("user{n}"),
            email: format!("user{n}@example.com"),
            password_hash: "$argon2id$test".to_string(),
            created_at: Utc::now(),
            profile_picture: None,
            about: None,
        }
    }

    fn sample_post(n: u32, author: &User, topic: &Topic) -> Post {
        Post {
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
                id: topic.id.clone(),
                name: topic.name.clone(),
            },
            removed: false,
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = open_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
        assert!(tables.contains(&"posts".to_string()));
        assert!(tables.contains(&"topics".to_string()));
        assert!(tables.contains(&"likes".to_string()));
        assert!(tables.contains(&"followers".to_string()));
        assert!(tables.contains(&"bookmarks".to_string()));
    }

    #[test]
    fn test_user_crud_and_duplicates() {
        let (_temp, store) = open_store();

        let user = sample_user(1);
        store.create_user(&user).unwrap();

        let fetched = store.get_user("user-1").unwrap().unwrap();
        assert_eq!(fetched.username, "user1");

        let by_email = store.get_user_by_email("user1@example.com").unwrap();
        assert!(by_email.is_some());

        let mut dup = sample_user(2);
        dup.email = "user1@example.com".to_string();
        assert!(matches!(
            store.create_user(&dup),
            Err(Error::AlreadyExists)
        ));

        let mut dup = sample_user(2);
        dup.username = "user1".to_string();
        assert!(matches!(
            store.create_user(&dup),
            Err(Error::AlreadyExists)
        ));
    }

    #[test]
    fn test_session_lifecycle() {
        let (_temp, store) = open_store();
        store.create_user(&sample_user(1)).unwrap();

        let session = Session {
            token: "tok-1".to_string(),
            user_id: "user-1".to_string(),
            created_at: Utc::now(),
            expires_at: None,
        };
        store.create_session(&session).unwrap();

        let fetched = store.get_session("tok-1").unwrap().unwrap();
        assert_eq!(fetched.user_id, "user-1");

        assert!(store.delete_session("tok-1").unwrap());
        assert!(!store.delete_session("tok-1").unwrap());
        assert!(store.get_session("tok-1").unwrap().is_none());
    }

    #[test]
    fn test_topic_lookup_or_create_converges() {
        let (_temp, store) = open_store();

        let first = store.find_or_create_topic("Cooking", "topic-a").unwrap();
        assert_eq!(first.name, "cooking");
        assert_eq!(first.id, "topic-a");

        // A second caller with its own candidate id lands on the same row.
        let second = store.find_or_create_topic("cooking", "topic-b").unwrap();
        assert_eq!(second.id, "topic-a");
    }

    #[test]
    fn test_topic_prefix_search_escapes_wildcards() {
        let (_temp, store) = open_store();
        store.find_or_create_topic("cooking", "t-1").unwrap();
        store.find_or_create_topic("code", "t-2").unwrap();
        store.find_or_create_topic("100%organic", "t-3").unwrap();

        let hits = store.search_topics("co").unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store.search_topics("100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "100%organic");

        assert!(store.search_topics("%").unwrap().is_empty());
    }

    #[test]
    fn test_like_toggle_keeps_counter_in_sync() {
        let (_temp, store) = open_store();
        let author = sample_user(1);
        store.create_user(&author).unwrap();
        let liker = sample_user(2);
        store.create_user(&liker).unwrap();
        let topic = store.find_or_create_topic("cooking", "t-1").unwrap();
        store.create_post(&sample_post(1, &author, &topic)).unwrap();

        store.insert_like(&liker.id, "post-0001").unwrap();
        assert_eq!(store.get_post("post-0001").unwrap().unwrap().likes, 1);
        assert!(store.has_like(&liker.id, "post-0001").unwrap());

        // Repeating the same like is rejected and leaves the counter alone.
        assert!(matches!(
            store.insert_like(&liker.id, "post-0001"),
            Err(Error::AlreadyExists)
        ));
        assert_eq!(store.get_post("post-0001").unwrap().unwrap().likes, 1);

        store.delete_like(&liker.id, "post-0001").unwrap();
        assert_eq!(store.get_post("post-0001").unwrap().unwrap().likes, 0);

        assert!(matches!(
            store.delete_like(&liker.id, "post-0001"),
            Err(Error::NotFound)
        ));
        assert_eq!(store.get_post("post-0001").unwrap().unwrap().likes, 0);
    }

    #[test]
    fn test_bookmark_round_trip() {
        let (_temp, store) = open_store();
        let user = sample_user(1);
        store.create_user(&user).unwrap();
        let topic = store.find_or_create_topic("cooking", "t-1").unwrap();
        store.create_post(&sample_post(1, &user, &topic)).unwrap();

        store.add_bookmark(&user.id, "post-0001").unwrap();
        assert!(store.has_bookmark(&user.id, "post-0001").unwrap());
        assert!(matches!(
            store.add_bookmark(&user.id, "post-0001"),
            Err(Error::AlreadyExists)
        ));

        store.remove_bookmark(&user.id, "post-0001").unwrap();
        assert!(!store.has_bookmark(&user.id, "post-0001").unwrap());
        assert!(matches!(
            store.remove_bookmark(&user.id, "post-0001"),
            Err(Error::NotFound)
        ));

        // Round trip: a re-bookmark succeeds again.
        store.add_bookmark(&user.id, "post-0001").unwrap();
        assert_eq!(store.list_bookmarked_posts(&user.id).unwrap().len(), 1);
    }

    #[test]
    fn test_bookmarked_feed_hides_removed_posts() {
        let (_temp, store) = open_store();
        let user = sample_user(1);
        store.create_user(&user).unwrap();
        let topic = store.find_or_create_topic("cooking", "t-1").unwrap();
        store.create_post(&sample_post(1, &user, &topic)).unwrap();
        store.add_bookmark(&user.id, "post-0001").unwrap();

        assert!(store.remove_post("post-0001", &user.id).unwrap());
        assert!(store.list_bookmarked_posts(&user.id).unwrap().is_empty());
        // Membership itself survives the soft delete.
        assert!(store.has_bookmark(&user.id, "post-0001").unwrap());
    }

    #[test]
    fn test_post_listing_filters_and_counts() {
        let (_temp, store) = open_store();
        let author = sample_user(1);
        store.create_user(&author).unwrap();
        let cooking = store.find_or_create_topic("cooking", "t-1").unwrap();
        let code = store.find_or_create_topic("code", "t-2").unwrap();

        for n in 1..=3 {
            store.create_post(&sample_post(n, &author, &cooking)).unwrap();
        }
        store.create_post(&sample_post(4, &author, &code)).unwrap();
        assert!(store.remove_post("post-0003", &author.id).unwrap());

        let all = PostFilter::default();
        assert_eq!(store.count_posts(&all).unwrap(), 3);

        let cooking_only = PostFilter {
            topic_name: Some("cooking".to_string()),
            ..Default::default()
        };
        assert_eq!(store.count_posts(&cooking_only).unwrap(), 2);
        let posts = store.list_posts(&cooking_only, 0, 10).unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.topic.name == "cooking"));
        assert!(posts.iter().all(|p| !p.removed));

        // Removed posts are invisible to direct fetch too.
        assert!(store.get_post("post-0003").unwrap().is_none());
    }

    #[test]
    fn test_post_listing_order_is_deterministic() {
        let (_temp, store) = open_store();
        let author = sample_user(1);
        store.create_user(&author).unwrap();
        let topic = store.find_or_create_topic("cooking", "t-1").unwrap();

        // Identical creation timestamps force the id tiebreak.
        let now = Utc::now();
        for n in 1..=5 {
            let mut post = sample_post(n, &author, &topic);
            post.created_at = now;
            store.create_post(&post).unwrap();
        }

        let page1 = store.list_posts(&PostFilter::default(), 0, 2).unwrap();
        let page2 = store.list_posts(&PostFilter::default(), 2, 2).unwrap();
        let page3 = store.list_posts(&PostFilter::default(), 4, 2).unwrap();

        let ids: Vec<_> = page1
            .iter()
            .chain(&page2)
            .chain(&page3)
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(
            ids,
            vec!["post-0005", "post-0004", "post-0003", "post-0002", "post-0001"]
        );
    }

    #[test]
    fn test_author_edit_and_soft_delete_scoping() {
        let (_temp, store) = open_store();
        let author = sample_user(1);
        let stranger = sample_user(2);
        store.create_user(&author).unwrap();
        store.create_user(&stranger).unwrap();
        let topic = store.find_or_create_topic("cooking", "t-1").unwrap();
        store.create_post(&sample_post(1, &author, &topic)).unwrap();

        assert!(
            !store
                .update_post_content("post-0001", &stranger.id, "x", "y", "z")
                .unwrap()
        );
        assert!(
            store
                .update_post_content("post-0001", &author.id, "new title", "y", "z")
                .unwrap()
        );

        let post = store.get_post("post-0001").unwrap().unwrap();
        assert_eq!(post.title, "new title");
        assert!(post.last_edit.is_some());

        assert!(!store.remove_post("post-0001", &stranger.id).unwrap());
        assert!(store.remove_post("post-0001", &author.id).unwrap());
        assert!(!store.remove_post("post-0001", &author.id).unwrap());
    }

    #[test]
    fn test_follow_graph_counts() {
        let (_temp, store) = open_store();
        let a = sample_user(1);
        let b = sample_user(2);
        let c = sample_user(3);
        for u in [&a, &b, &c] {
            store.create_user(u).unwrap();
        }

        store.insert_follow(&a.id, &b.id).unwrap();
        store.insert_follow(&c.id, &b.id).unwrap();
        store.insert_follow(&a.id, &c.id).unwrap();

        assert_eq!(store.count_followers(&b.id).unwrap(), 2);
        assert_eq!(store.count_following(&a.id).unwrap(), 2);
        assert!(store.has_follow(&a.id, &b.id).unwrap());
        assert!(!store.has_follow(&b.id, &a.id).unwrap());

        assert!(matches!(
            store.insert_follow(&a.id, &b.id),
            Err(Error::AlreadyExists)
        ));

        let followed = store.list_followed_users(&a.id).unwrap();
        assert_eq!(followed.len(), 2);

        store.delete_follow(&a.id, &b.id).unwrap();
        assert!(matches!(
            store.delete_follow(&a.id, &b.id),
            Err(Error::NotFound)
        ));
        assert_eq!(store.count_followers(&b.id).unwrap(), 1);
    }
}
