use reqwest::Method;

use crate::client::ApiClient;
use crate::core::errors::ApiError;
use crate::models::models::{User, UserUpdate};

impl ApiClient {
    /// The user the stored token belongs to.
    pub async fn get_current_user(&self) -> Result<User, ApiError> {
        self.get_json("users/me").await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, ApiError> {
        self.get_json(&format!("users/{}", user_id)).await
    }

    pub async fn update_user(&self, user_id: i64, update: &UserUpdate) -> Result<User, ApiError> {
        self.send_json(Method::PUT, &format!("users/{}", user_id), update)
            .await
    }
}
