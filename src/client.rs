//! HTTP plumbing shared by every resource module.
//!
//! [`ApiClient`] owns the `reqwest` client and a handle on the token store.
//! Each request picks up the stored bearer token at send time, so a login or
//! logout performed through the session manager is visible to the very next
//! call without rebuilding the client.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::core::errors::ApiError;
use crate::core::helpers::{bearer, endpoint};
use crate::core::store::TokenStore;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = endpoint(&self.base_url, path);
        debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        match self.tokens.token() {
            Ok(Some(token)) => builder.header(reqwest::header::AUTHORIZATION, bearer(&token)),
            Ok(None) => builder,
            Err(e) => {
                warn!(error = %e, "token store unreadable, sending request anonymously");
                builder
            }
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "api request failed");
        Err(ApiError::from_status(status, &body))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.request(method, path).json(body)).await?;
        decode(response).await
    }

    /// Fire a request whose response body carries nothing of interest.
    pub(crate) async fn send_empty(&self, method: Method, path: &str) -> Result<(), ApiError> {
        let builder = self.request(method.clone(), path);
        let builder = if method == Method::POST {
            builder.json(&serde_json::json!({}))
        } else {
            builder
        };
        self.execute(builder).await?;
        Ok(())
    }

    /// Raw access for error-mapping paths that need the status and body,
    /// like registration.
    pub(crate) async fn send_raw<B>(&self, method: Method, path: &str, body: &B) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        Ok(self.request(method, path).json(body).send().await?)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
