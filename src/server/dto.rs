use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Post, PostSummary, ProfilePicture, User, ViewerContext};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub description: String,
    pub markdown: String,
    pub topic_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub id: String,
}

/// Topic changes aren't currently supported; edits replace the body fields.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub description: String,
    pub markdown: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsParams {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub posts: Vec<PostSummary>,
    pub total_pages: i64,
}

/// A full post plus the viewer's flags, for single-post fetches.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<ViewerContext>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopicSearchParams {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub about: Option<String>,
}

/// Public identity card used in profile views.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    pub sign_up_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<ProfilePicture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    /// Present only for authenticated viewers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_followed: Option<bool>,
}

/// Profile view: identity card, graph counts, and one page of the author's
/// feed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_info: UserInfo,
    pub followers: i64,
    pub following: i64,
    pub posts: Vec<PostSummary>,
    pub total_pages: i64,
    pub count: i64,
}

/// Compact user projection for follower/following listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<ProfilePicture>,
}

impl UserRef {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}
