use reqwest::Method;

use crate::client::ApiClient;
use crate::core::errors::ApiError;
use crate::models::models::{NewPost, Post, PostUpdate};

impl ApiClient {
    pub async fn get_all_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.get_json("posts").await
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Post, ApiError> {
        self.get_json(&format!("posts/{}", post_id)).await
    }

    pub async fn get_posts_by_theme(&self, theme_id: i64) -> Result<Vec<Post>, ApiError> {
        self.get_json(&format!("posts/theme/{}", theme_id)).await
    }

    pub async fn get_posts_by_user(&self, user_id: i64) -> Result<Vec<Post>, ApiError> {
        self.get_json(&format!("posts/user/{}", user_id)).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        self.send_json(Method::POST, "posts", post).await
    }

    /// Only the author may edit; anyone else gets [`ApiError::Forbidden`].
    pub async fn update_post(&self, post_id: i64, update: &PostUpdate) -> Result<Post, ApiError> {
        self.send_json(Method::PUT, &format!("posts/{}", post_id), update)
            .await
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &format!("posts/{}", post_id))
            .await
    }
}
