//! Authenticated request wrapper.
//!
//! Every gateway call goes through [`ApiClient`]. It attaches the bearer
//! token, turns non-2xx responses into [`ApiError`]s with display-ready
//! messages and fires the login redirect on 401.
//!
//! Auth policy is carried by the signatures: reads take
//! `Option<&AccessToken>`, writes take `&AccessToken`.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;

use babbly_core::domain::AccessToken;
use babbly_core::ports::{HttpRequest, HttpResponse, HttpTransport, Method};
use babbly_core::{ApiError, ApiResult, ErrorKind};
use babbly_shared::response::server_message;

use super::reauth::ReauthGate;

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    reauth: Arc<ReauthGate>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, reauth: Arc<ReauthGate>) -> Self {
        Self { transport, reauth }
    }

    pub fn reauth(&self) -> &ReauthGate {
        &self.reauth
    }

    /// GET with an optional token. The token is attached when present.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&'static str, String)>,
        token: Option<&AccessToken>,
    ) -> ApiResult<T> {
        let request = HttpRequest::new(Method::Get, path)
            .with_query(query)
            .with_bearer(token.cloned());
        self.execute(request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, token: &AccessToken) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::Post, path, Some(body), token).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, token: &AccessToken) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::Put, path, Some(body), token).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, token: &AccessToken) -> ApiResult<T> {
        self.write::<(), T>(Method::Delete, path, None, token).await
    }

    /// DELETE carrying a JSON body, as the likes endpoint expects.
    pub async fn delete_with<B, T>(&self, path: &str, body: &B, token: &AccessToken) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(Method::Delete, path, Some(body), token).await
    }

    async fn write<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: &AccessToken,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = HttpRequest::new(method, path).with_bearer(Some(token.clone()));
        if let Some(body) = body {
            let json = serde_json::to_value(body)
                .map_err(|e| ApiError::new(ErrorKind::ValidationFailed, None, e.to_string()))?;
            request = request.with_body(json);
        }
        self.execute(request).await
    }

    /// Send a prepared request and decode a 2xx body into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: HttpRequest) -> ApiResult<T> {
        let method = request.method;
        let path = request.path.clone();
        let authenticated = request.bearer.is_some();
        let started = Instant::now();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, %path, error = %e, "Gateway unreachable");
                return Err(ApiError::unreachable());
            }
        };

        tracing::debug!(
            %method,
            %path,
            authenticated,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gateway responded"
        );

        if !response.is_success() {
            return Err(self.translate(method, &path, &response));
        }

        decode_body(&response.body)
    }

    fn translate(&self, method: Method, path: &str, response: &HttpResponse) -> ApiError {
        let err = ApiError::from_status(response.status, server_message(&response.body));

        match err.kind {
            ErrorKind::AuthenticationRequired => {
                self.reauth.trigger();
            }
            ErrorKind::RateLimited => {
                tracing::warn!(%method, %path, "Rate limit hit. Please try again later");
            }
            ErrorKind::ServerError => {
                tracing::error!(%method, %path, status = response.status, "Gateway server error");
            }
            _ => {
                tracing::debug!(%method, %path, status = response.status, message = %err.message, "Request rejected");
            }
        }

        err
    }
}

/// Decode a success body. An empty body decodes as JSON `null`, so `()` and
/// `Option<_>` targets work for 204 responses.
fn decode_body<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(ApiError::invalid_response)
}
