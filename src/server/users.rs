use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header, request::Parts},
    response::{AppendHeaders, IntoResponse},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{CredentialHasher, RequireUser, Viewer, cookie_value, session};
use crate::feed;
use crate::server::AppState;
use crate::server::dto::{
    ListPostsParams, ProfileResponse, SignInRequest, SignUpRequest, SignUpResponse,
    UpdateProfileRequest, UserInfo, UserRef,
};
use crate::server::response::{ApiError, StoreOptionExt};
use crate::server::validation::{resolve_page_params, validate_email, validate_username};
use crate::social;
use crate::store::PostFilter;
use crate::types::User;

// -- Cookie helpers --
//
// Identity travels as a (token, email) pair; username and id are set for the
// client's convenience and never trusted server-side.

fn set_cookie(name: &str, value: &str, http_only: bool, max_age_secs: u64) -> String {
    let flags = if http_only { "; HttpOnly" } else { "" };
    format!("{name}={value}; SameSite=Lax; Path=/; Max-Age={max_age_secs}{flags}")
}

fn clear_cookie(name: &str) -> String {
    format!("{name}=; SameSite=Lax; Path=/; Max-Age=0")
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_username(&req.username)?;
    validate_email(&req.email)?;

    let username = req.username.to_lowercase();
    let email = req.email.to_lowercase();

    // Identify the colliding field for the client. The unique indexes still
    // back this up if two sign-ups race.
    if store.get_user_by_email(&email)?.is_some() {
        return Ok((
            StatusCode::NOT_ACCEPTABLE,
            Json(json!({ "alreadyExists": "email" })),
        )
            .into_response());
    }
    if store.get_user_by_username(&username)?.is_some() {
        return Ok((
            StatusCode::NOT_ACCEPTABLE,
            Json(json!({ "alreadyExists": "username" })),
        )
            .into_response());
    }

    let password_hash = CredentialHasher::new().hash(&req.password)?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        username,
        email,
        password_hash,
        created_at: Utc::now(),
        profile_picture: None,
        about: None,
    };
    store.create_user(&user)?;

    Ok::<_, ApiError>(
        (
            StatusCode::CREATED,
            Json(SignUpResponse {
                username: user.username,
                email: user.email,
            }),
        )
            .into_response(),
    )
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    // Unknown email and wrong password produce identical responses so the
    // endpoint cannot be used to enumerate accounts.
    let denied = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response()
    };

    let Some(user) = store.get_user_by_email(&req.email)? else {
        return Ok::<_, ApiError>(denied());
    };

    if !CredentialHasher::new().verify(&req.password, &user.password_hash)? {
        return Ok(denied());
    }

    let token = session::open_session(store, &user.id, state.session_hours)?;

    // Non-expiring sessions still need a finite cookie lifetime.
    let max_age = match state.session_hours {
        0 => 60 * 60 * 24 * 365 * 10,
        hours => hours * 3600,
    };

    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                set_cookie("token", &token, true, max_age),
            ),
            (
                header::SET_COOKIE,
                set_cookie("email", &user.email, false, max_age),
            ),
            (
                header::SET_COOKIE,
                set_cookie("username", &user.username, false, max_age),
            ),
            (header::SET_COOKIE, set_cookie("id", &user.id, false, max_age)),
        ]),
        Json(json!({ "authenticated": true })),
    )
        .into_response())
}

pub async fn sign_out(State(state): State<Arc<AppState>>, parts: Parts) -> impl IntoResponse {
    // Revoke exactly the presented session; other devices stay signed in.
    if let Some(token) = cookie_value(&parts, "token") {
        session::revoke_session(state.store.as_ref(), &token)?;
    }

    Ok::<_, ApiError>((
        AppendHeaders([
            (header::SET_COOKIE, clear_cookie("token")),
            (header::SET_COOKIE, clear_cookie("email")),
            (header::SET_COOKIE, clear_cookie("username")),
            (header::SET_COOKIE, clear_cookie("id")),
        ]),
        StatusCode::OK,
    ))
}

pub async fn list_bookmarks(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let posts = store.list_bookmarked_posts(&user.id)?;
    let summaries = feed::enrich_summaries(store, &posts, Some(&user))?;

    Ok::<_, ApiError>(Json(summaries))
}

pub async fn add_bookmark(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let post = store.get_post(&post_id)?.or_not_found("Post not found")?;
    store.add_bookmark(&user.id, &post.id)?;

    Ok::<_, ApiError>(StatusCode::CREATED)
}

pub async fn remove_bookmark(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> impl IntoResponse {
    state.store.remove_bookmark(&user.id, &post_id)?;
    Ok::<_, ApiError>(StatusCode::OK)
}

pub async fn follow_user(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    social::follow(state.store.as_ref(), &user.id, &user_id)?;
    Ok::<_, ApiError>(StatusCode::CREATED)
}

pub async fn unfollow_user(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    social::unfollow(state.store.as_ref(), &user.id, &user_id)?;
    Ok::<_, ApiError>(StatusCode::OK)
}

pub async fn list_follows(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store.get_user(&id)?.or_not_found("User not found")?;
    let users = store.list_followed_users(&id)?;

    Ok::<_, ApiError>(Json(
        users.iter().map(UserRef::from_user).collect::<Vec<_>>(),
    ))
}

pub async fn list_followers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store.get_user(&id)?.or_not_found("User not found")?;
    let users = store.list_follower_users(&id)?;

    Ok::<_, ApiError>(Json(
        users.iter().map(UserRef::from_user).collect::<Vec<_>>(),
    ))
}

pub async fn get_profile(
    Viewer(viewer): Viewer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ListPostsParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store.get_user(&id)?.or_not_found("User not found")?;
    let (page, limit) = resolve_page_params(params.page, params.limit)?;

    let stats = social::profile_stats(store, &user.id, viewer.as_ref().map(|v| v.id.as_str()))?;

    let filter = PostFilter {
        topic_name: params.topic,
        author_id: Some(user.id.clone()),
    };
    let feed = feed::compose(store, &filter, page, limit, viewer.as_ref())?;

    Ok::<_, ApiError>(Json(ProfileResponse {
        user_info: UserInfo {
            username: user.username,
            sign_up_date: user.created_at,
            profile_picture: user.profile_picture,
            about: user.about,
            is_followed: stats.is_followed,
        },
        followers: stats.followers,
        following: stats.following,
        posts: feed.posts,
        total_pages: feed.total_pages,
        count: feed.count,
    }))
}

pub async fn update_profile(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    state
        .store
        .update_user_about(&user.id, req.about.as_deref())?;
    Ok::<_, ApiError>(StatusCode::OK)
}
