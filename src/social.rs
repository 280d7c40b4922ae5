//! Follower-graph resolution for profile views, plus the follow toggle.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::Store;

/// Edge counts for a profile. `is_followed` is populated only for
/// authenticated viewers; anonymous viewers get no field at all, so clients
/// can tell "unknown" apart from "not following".
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub followers: i64,
    pub following: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_followed: Option<bool>,
}

pub fn profile_stats(
    store: &dyn Store,
    target_user_id: &str,
    viewer_id: Option<&str>,
) -> Result<ProfileStats> {
    let is_followed = match viewer_id {
        Some(viewer_id) => Some(store.has_follow(viewer_id, target_user_id)?),
        None => None,
    };

    Ok(ProfileStats {
        followers: store.count_followers(target_user_id)?,
        following: store.count_following(target_user_id)?,
        is_followed,
    })
}

/// Adds a follow edge. Following yourself is rejected, following an unknown
/// user is NotFound, and re-following is AlreadyExists.
pub fn follow(store: &dyn Store, follower_id: &str, followed_id: &str) -> Result<()> {
    if follower_id == followed_id {
        return Err(Error::Validation("cannot follow yourself".to_string()));
    }
    if store.get_user(followed_id)?.is_none() {
        return Err(Error::NotFound);
    }

    store.insert_follow(follower_id, followed_id)
}

/// Removes a follow edge; NotFound when none exists.
pub fn unfollow(store: &dyn Store, follower_id: &str, followed_id: &str) -> Result<()> {
    store.delete_follow(follower_id, followed_id)
}
