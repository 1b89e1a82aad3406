//! Client-side form constraints. A failure here never reaches the network.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::errors::ApiError;
use crate::models::models::{LoginRequest, NewComment, NewPost, PostUpdate, SignupRequest, UserUpdate};
use crate::password;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MIN_CONTENT_LENGTH: usize = 10;

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*$").expect("Regex should compile")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn check_username(username: &str) -> Result<(), ApiError> {
    require(username, "Username")?;
    if username.trim().chars().count() < MIN_USERNAME_LENGTH {
        return Err(ApiError::validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LENGTH
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), ApiError> {
    require(email, "Email")?;
    if !is_valid_email(email) {
        return Err(ApiError::validation("Email is not valid"));
    }
    Ok(())
}

fn check_password(candidate: &str) -> Result<(), ApiError> {
    let report = password::evaluate(candidate);
    if !report.satisfied {
        return Err(ApiError::validation(format!(
            "Password is too weak: {}",
            report.summary()
        )));
    }
    Ok(())
}

pub fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    require(&request.identifier, "Username or email")?;
    require(&request.password, "Password")
}

pub fn validate_signup(request: &SignupRequest) -> Result<(), ApiError> {
    check_username(&request.username)?;
    check_email(&request.email)?;
    require(&request.password, "Password")?;
    check_password(&request.password)
}

/// A missing password is fine here: the current one is kept.
pub fn validate_profile_update(update: &UserUpdate) -> Result<(), ApiError> {
    check_username(&update.username)?;
    check_email(&update.email)?;
    match update.password.as_deref() {
        Some(candidate) => check_password(candidate),
        None => Ok(()),
    }
}

fn check_title_and_content(title: &str, content: &str) -> Result<(), ApiError> {
    require(title, "Title")?;
    let title_len = title.trim().chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&title_len) {
        return Err(ApiError::validation(format!(
            "Title must be {}-{} characters",
            MIN_TITLE_LENGTH, MAX_TITLE_LENGTH
        )));
    }
    require(content, "Content")?;
    if content.trim().chars().count() < MIN_CONTENT_LENGTH {
        return Err(ApiError::validation(format!(
            "Content must be at least {} characters",
            MIN_CONTENT_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_new_post(post: &NewPost) -> Result<(), ApiError> {
    check_title_and_content(&post.title, &post.content)?;
    require(&post.theme.name, "Theme")
}

/// Same bounds as a new post; the theme cannot change.
pub fn validate_post_update(update: &PostUpdate) -> Result<(), ApiError> {
    check_title_and_content(&update.title, &update.content)
}

pub fn validate_comment(comment: &NewComment) -> Result<(), ApiError> {
    require(&comment.content, "Comment")
}
