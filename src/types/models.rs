use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<ProfilePicture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

/// Stored avatar. Bytes travel as base64 in JSON; resizing/validation is the
/// uploading client's problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePicture {
    pub name: String,
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// One live login. A user may hold several (one per device); sign-out
/// deletes exactly the presented token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edit: Option<DateTime<Utc>>,
    pub likes: i64,
    pub author: AuthorRef,
    pub topic: TopicRef,
    #[serde(skip)]
    pub removed: bool,
}

/// Author snapshot embedded in a post at creation time; not live-updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: String,
    pub username: String,
}

/// Topic snapshot embedded in a post at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
}

/// Per-viewer flags attached to listings for authenticated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerContext {
    pub bookmarked: bool,
    pub liked: bool,
}

/// Listing projection of a post: everything but the body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub author: AuthorRef,
    pub topic: TopicRef,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edit: Option<DateTime<Utc>>,
    pub likes: i64,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<ViewerContext>,
}

impl PostSummary {
    #[must_use]
    pub fn from_post(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            author: post.author.clone(),
            topic: post.topic.clone(),
            created_at: post.created_at,
            last_edit: post.last_edit,
            likes: post.likes,
            title: post.title.clone(),
            description: post.description.clone(),
            user_data: None,
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            profile_picture: None,
            about: None,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn session_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            user_id: "u".to_string(),
            created_at: now,
            expires_at: Some(now - Duration::hours(1)),
        };
        assert!(session.is_expired(now));

        let forever = Session {
            expires_at: None,
            ..session.clone()
        };
        assert!(!forever.is_expired(now));
    }

    #[test]
    fn summary_omits_body_and_uses_wire_names() {
        let post = Post {
            id: "p-1".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            markdown: "# body".to_string(),
            html: None,
            created_at: Utc::now(),
            last_edit: None,
            likes: 3,
            author: AuthorRef {
                id: "u-1".to_string(),
                username: "alice".to_string(),
            },
            topic: TopicRef {
                id: "topic-1".to_string(),
                name: "cooking".to_string(),
            },
            removed: false,
        };

        let json = serde_json::to_string(&PostSummary::from_post(&post)).unwrap();
        assert!(!json.contains("markdown"));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("userData"), "absent for anonymous viewers");
    }
}
