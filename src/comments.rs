use reqwest::Method;

use crate::client::ApiClient;
use crate::core::errors::ApiError;
use crate::models::models::{Comment, NewComment};

impl ApiClient {
    /// Newest first, as the server orders them.
    pub async fn get_comments_by_post(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.get_json(&format!("comments/post/{}", post_id)).await
    }

    pub async fn create_comment(&self, post_id: i64, comment: &NewComment) -> Result<Comment, ApiError> {
        self.send_json(Method::POST, &format!("comments/post/{}", post_id), comment)
            .await
    }

    pub async fn update_comment(&self, comment_id: i64, comment: &NewComment) -> Result<Comment, ApiError> {
        self.send_json(Method::PUT, &format!("comments/{}", comment_id), comment)
            .await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &format!("comments/{}", comment_id))
            .await
    }
}
