use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireUser, Viewer};
use crate::feed;
use crate::server::AppState;
use crate::server::dto::{
    CreatePostRequest, CreatePostResponse, FeedResponse, ListPostsParams, PostDetail,
    UpdatePostRequest,
};
use crate::server::response::{ApiError, StoreOptionExt};
use crate::server::validation::{resolve_page_params, validate_post_fields};
use crate::store::PostFilter;
use crate::types::{AuthorRef, Post, TopicRef};

pub async fn create_post(
    RequireUser(author): RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePostRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_post_fields(&req.title, &req.description, &req.markdown, Some(&req.topic_name))?;

    let topic = store.find_or_create_topic(&req.topic_name, &Uuid::new_v4().to_string())?;

    let post = Post {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        description: req.description,
        markdown: req.markdown,
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

    store.create_post(&post)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(CreatePostResponse { id: post.id }),
    ))
}

pub async fn list_posts(
    Viewer(viewer): Viewer,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPostsParams>,
) -> impl IntoResponse {
    let (page, limit) = resolve_page_params(params.page, params.limit)?;

    let filter = PostFilter {
        topic_name: params.topic,
        ..Default::default()
    };

    let feed = feed::compose(state.store.as_ref(), &filter, page, limit, viewer.as_ref())?;

    Ok::<_, ApiError>(Json(FeedResponse {
        posts: feed.posts,
        total_pages: feed.total_pages,
    }))
}

pub async fn get_post(
    Viewer(viewer): Viewer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (post, user_data) = feed::single(state.store.as_ref(), &id, viewer.as_ref())?
        .or_not_found("Post not found")?;

    Ok::<_, ApiError>(Json(PostDetail { post, user_data }))
}

pub async fn update_post(
    RequireUser(author): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> impl IntoResponse {
    validate_post_fields(&req.title, &req.description, &req.markdown, None)?;

    // Scoped to the author: editing someone else's post reads as absent.
    let updated = state.store.update_post_content(
        &id,
        &author.id,
        &req.title,
        &req.description,
        &req.markdown,
    )?;

    if !updated {
        return Err(ApiError::not_found("Post not found"));
    }
    Ok::<_, ApiError>(StatusCode::OK)
}

pub async fn delete_post(
    RequireUser(author): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !state.store.remove_post(&id, &author.id)? {
        return Err(ApiError::not_found("Post not found"));
    }
    Ok::<_, ApiError>(StatusCode::OK)
}

pub async fn like_post(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let post = store.get_post(&id)?.or_not_found("Post not found")?;
    store.insert_like(&user.id, &post.id)?;

    Ok::<_, ApiError>(StatusCode::CREATED)
}

pub async fn unlike_post(
    RequireUser(user): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let post = store.get_post(&id)?.or_not_found("Post not found")?;
    store.delete_like(&user.id, &post.id)?;

    Ok::<_, ApiError>(StatusCode::OK)
}
