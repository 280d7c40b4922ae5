mod gate;
mod middleware;
mod password;
pub mod session;

pub use gate::{AuthOutcome, authenticate};
pub use middleware::{RequireUser, Viewer, cookie_value};
pub use password::CredentialHasher;
