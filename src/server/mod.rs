pub mod dto;
mod posts;
pub mod response;
mod router;
mod topics;
mod users;
pub mod validation;

pub use router::{AppState, create_router};
