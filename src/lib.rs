//! # Quill
//!
//! A blogging platform backend, usable both as a standalone binary and as a
//! library: accounts with cookie sessions, posts under topics, likes,
//! bookmarks, and a follower graph over a JSON API.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! quill = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use quill::server::{AppState, create_router};
//! use quill::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/quill.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     session_hours: 720,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the command-line entry point. Disable with
//!   `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod feed;
pub mod server;
pub mod social;
pub mod store;
pub mod types;
