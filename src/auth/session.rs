use chrono::{Duration, Utc};
use rand::Rng;

use crate::error::Result;
use crate::store::Store;
use crate::types::Session;

const TOKEN_BYTES: usize = 32;

/// Generates an opaque session token: 32 random bytes, hex-encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Opens a session for a user and returns its token. `hours = 0` means the
/// session never expires.
pub fn open_session(store: &dyn Store, user_id: &str, hours: u64) -> Result<String> {
    let now = Utc::now();
    let session = Session {
        token: generate_token(),
        user_id: user_id.to_string(),
        created_at: now,
        expires_at: (hours > 0).then(|| now + Duration::hours(hours as i64)),
    };

    store.create_session(&session)?;
    Ok(session.token)
}

/// Revokes a session by token. Unknown tokens are a no-op.
pub fn revoke_session(store: &dyn Store, token: &str) -> Result<()> {
    store.delete_session(token)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }
}
