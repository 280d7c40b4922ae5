use chrono::Utc;

use crate::error::Result;
use crate::store::Store;
use crate::types::User;

/// Result of checking a (token, email) cookie pair.
///
/// When authentication fails but the email resolved to an account, `user` is
/// still populated so callers can inspect identity without trusting it.
/// Anything gated on authentication MUST branch on `is_authenticated` alone.
#[derive(Debug)]
pub struct AuthOutcome {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

impl AuthOutcome {
    fn denied(user: Option<User>) -> Self {
        Self {
            is_authenticated: false,
            user,
        }
    }

    /// The authenticated user, if and only if authentication succeeded.
    #[must_use]
    pub fn viewer(self) -> Option<User> {
        if self.is_authenticated { self.user } else { None }
    }
}

/// Validates a session token against an account email.
///
/// Fails closed on a missing cookie. Succeeds only when the token names a
/// live, unexpired session belonging to the account the email resolves to.
/// Emails are matched exactly as supplied; sign-up stores them lowercase.
pub fn authenticate(store: &dyn Store, token: Option<&str>, email: Option<&str>) -> Result<AuthOutcome> {
    let (token, email) = match (token, email) {
        (Some(t), Some(e)) if !t.is_empty() && !e.is_empty() => (t, e),
        _ => return Ok(AuthOutcome::denied(None)),
    };

    let user = store.get_user_by_email(email)?;

    let Some(session) = store.get_session(token)? else {
        return Ok(AuthOutcome::denied(user));
    };

    match user {
        Some(user) if session.user_id == user.id && !session.is_expired(Utc::now()) => {
            Ok(AuthOutcome {
                is_authenticated: true,
                user: Some(user),
            })
        }
        other => Ok(AuthOutcome::denied(other)),
    }
}
