use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use super::{posts, topics, users};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Session lifetime granted at sign-in, in hours. 0 = never expire.
    pub session_hours: u64,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn posts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", get(posts::get_post))
        .route("/posts/{id}", patch(posts::update_post))
        .route("/posts/{id}", delete(posts::delete_post))
        .route("/posts/{id}/likes", post(posts::like_post))
        .route("/posts/{id}/likes", delete(posts::unlike_post))
}

fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/auth/signUp", post(users::sign_up))
        .route("/users/auth/signIn", patch(users::sign_in))
        .route("/users/auth/signOut", patch(users::sign_out))
        .route("/users/bookmarks", get(users::list_bookmarks))
        .route("/users/bookmarks/{postId}", post(users::add_bookmark))
        .route("/users/bookmarks/{postId}", delete(users::remove_bookmark))
        .route("/users/follows/{userId}", post(users::follow_user))
        .route("/users/follows/{userId}", delete(users::unfollow_user))
        .route("/users/profile", patch(users::update_profile))
        .route("/users/{id}/follows", get(users::list_follows))
        .route("/users/{id}/followers", get(users::list_followers))
        .route("/users/{id}", get(users::get_profile))
}

fn topics_router() -> Router<Arc<AppState>> {
    Router::new().route("/topics", get(topics::search_topics))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", posts_router())
        .nest("/api", users_router())
        .nest("/api", topics_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
