use reqwest::Method;

use crate::client::ApiClient;
use crate::core::errors::ApiError;
use crate::models::models::Theme;

impl ApiClient {
    pub async fn get_all_themes(&self) -> Result<Vec<Theme>, ApiError> {
        self.get_json("themes").await
    }

    pub async fn get_theme(&self, theme_id: i64) -> Result<Theme, ApiError> {
        self.get_json(&format!("themes/{}", theme_id)).await
    }

    /// Themes the authenticated user follows.
    pub async fn get_subscriptions(&self) -> Result<Vec<Theme>, ApiError> {
        self.get_json("themes/subscriptions").await
    }

    pub async fn subscribe(&self, theme_id: i64) -> Result<(), ApiError> {
        self.send_empty(Method::POST, &format!("themes/{}/subscribe", theme_id))
            .await
    }

    pub async fn unsubscribe(&self, theme_id: i64) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &format!("themes/{}/unsubscribe", theme_id))
            .await
    }
}
