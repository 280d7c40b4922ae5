mod server;

pub use server::{DEFAULT_SESSION_HOURS, ServerConfig};
