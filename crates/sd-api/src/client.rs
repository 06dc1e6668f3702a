use sd_core::config::AppConfig;
use sd_core::error::ApiError;
use sd_core::route::Navigator;
use sd_storage::{keys, LocalStorage};
use serde_json::Value;
use std::sync::Arc;

use crate::transport::{ApiRequest, Body, EventDataStream, HttpTransport, Method, Transport};

/// Front door to the REST API: attaches the stored bearer token, turns
/// error statuses into [`ApiError`]s, and on 401 drops the token and sends
/// the user back to the login page.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    storage: LocalStorage,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: LocalStorage,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            storage,
            navigator,
        }
    }

    pub fn http(config: &AppConfig, storage: LocalStorage, navigator: Arc<dyn Navigator>) -> Self {
        Self::new(
            Arc::new(HttpTransport::new(config.api_url())),
            storage,
            navigator,
        )
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    async fn token(&self) -> Option<String> {
        match self.storage.get(keys::TOKEN).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read token from local storage");
                None
            }
        }
    }

    async fn handle_unauthorized(&self) {
        tracing::warn!("session expired or token rejected, returning to login");
        if let Err(e) = self.storage.remove(keys::TOKEN).await {
            tracing::warn!(error = %e, "could not remove token from local storage");
        }
        self.navigator.redirect_to_login();
    }

    async fn fail(&self, error: ApiError) -> ApiError {
        if matches!(error, ApiError::Unauthorized { .. }) {
            self.handle_unauthorized().await;
        }
        error
    }

    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Body,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            query,
            body,
            bearer: self.token().await,
        };
        tracing::debug!(%method, path, "api request");

        let resp = match self.transport.send(request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "no response from server");
                return Err(e);
            }
        };

        if resp.is_success() {
            return Ok(resp.body);
        }

        tracing::warn!(%method, path, status = resp.status, "api request failed");
        let error = ApiError::from_status(resp.status, resp.server_error());
        Err(self.fail(error).await)
    }

    pub(crate) async fn get(&self, path: &str, query: Vec<(String, String)>) -> Result<Value, ApiError> {
        self.request(Method::Get, path, query, Body::Empty).await
    }

    pub(crate) async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Post, path, vec![], Body::Json(body)).await
    }

    pub(crate) async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Put, path, vec![], Body::Json(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Delete, path, vec![], Body::Empty).await
    }

    /// Open a server-sent-event connection. The token is sent both as a
    /// header and as the `token` query parameter, which is what the stream
    /// endpoint reads.
    pub(crate) async fn events(
        &self,
        path: &str,
        mut query: Vec<(String, String)>,
    ) -> Result<EventDataStream, ApiError> {
        let bearer = self.token().await;
        query.push(("token".into(), bearer.clone().unwrap_or_default()));

        let request = ApiRequest {
            method: Method::Get,
            path: path.to_string(),
            query,
            body: Body::Empty,
            bearer,
        };
        tracing::debug!(path, "opening event stream");

        let mut raw = match self.transport.open_events(request).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.fail(e).await),
        };

        let client = self.clone();
        let stream = async_stream::stream! {
            use tokio_stream::StreamExt;

            while let Some(item) = raw.next().await {
                match item {
                    Ok(data) => yield Ok(data),
                    Err(e) => {
                        yield Err(client.fail(e).await);
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
