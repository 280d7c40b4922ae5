use crate::server::response::{ApiError, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

const MAX_USERNAME_LEN: usize = 32;
const MAX_TITLE_LEN: usize = 200;

/// Usernames are ASCII alphanumeric only, matching what sign-up has always
/// accepted.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::not_acceptable("username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::not_acceptable(format!(
            "username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::not_acceptable(
            "forbidden characters in username",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    // Just enough structure to address mail at.
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::not_acceptable("invalid email"));
    }
    Ok(())
}

/// Required post fields; the failing field is named in the message.
pub fn validate_post_fields(
    title: &str,
    description: &str,
    markdown: &str,
    topic_name: Option<&str>,
) -> Result<(), ApiError> {
    for (field, value) in [
        ("title", title),
        ("description", description),
        ("markdown", markdown),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::not_acceptable(format!("{field} is required")));
        }
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ApiError::not_acceptable(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    if let Some(topic) = topic_name {
        if topic.trim().is_empty() {
            return Err(ApiError::not_acceptable("topicName is required"));
        }
    }
    Ok(())
}

/// Resolves optional pagination query params, rejecting degenerate windows.
pub fn resolve_page_params(
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<(u32, u32), ApiError> {
    let page = page.unwrap_or(DEFAULT_PAGE);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err(ApiError::bad_request("page must be at least 1"));
    }
    if limit < 1 {
        return Err(ApiError::bad_request("limit must be at least 1"));
    }
    Ok((page, limit))
}
