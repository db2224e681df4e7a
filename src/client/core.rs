// File: src/client/core.rs
//! HTTP client for the journal backend.
//!
//! Every authenticated method takes the bearer token as an argument. The client never
//! stores one, so a token cleared by logout cannot leak into a later request.
use crate::client::error::ApiError;
use crate::client::middleware::{UserAgentLayer, UserAgentService};
use crate::config::Config;
use crate::model::{
    CreatedEntry, EntryId, ErrorBody, JournalEntry, LoginRequest, NewEntry, RegisterRequest,
    TokenResponse, UserEnvelope, UserProfile,
};

use http::{HeaderValue, Method, Request, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use tower_http::auth::AddAuthorization;
use tower_layer::Layer;

type HttpsClient = UserAgentService<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>;

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: HttpsClient,
    base_url: String,
    delete_account_path: String,
    delete_entry_path: String,
}

impl ApiClient {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, ApiError> {
        let defaults = Config::default();
        Self::build(
            base_url,
            user_agent,
            &defaults.delete_account_path,
            &defaults.delete_entry_path,
        )
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::build(
            &config.api_url,
            &config.user_agent,
            &config.delete_account_path,
            &config.delete_entry_path,
        )
    }

    fn build(
        base_url: &str,
        user_agent: &str,
        delete_account_path: &str,
        delete_entry_path: &str,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let uri: Uri = base_url
            .parse()
            .map_err(|e: http::uri::InvalidUri| ApiError::Invalid(e.to_string()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(ApiError::Invalid(format!(
                "API URL must be absolute: {}",
                base_url
            )));
        }

        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            // Plain-http backends still work; https handshakes will fail.
            log::warn!("No valid system certificates found.");
        }
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let http = UserAgentLayer::new(user_agent.to_string()).layer(http_client);

        Ok(Self {
            http,
            base_url,
            delete_account_path: delete_account_path.to_string(),
            delete_entry_path: delete_entry_path.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- TRANSPORT ---

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> Result<Vec<u8>, ApiError> {
        let uri: Uri = format!("{}{}", self.base_url, path)
            .parse()
            .map_err(|e: http::uri::InvalidUri| ApiError::Invalid(e.to_string()))?;
        let req = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(body.unwrap_or_default())
            .map_err(|e| ApiError::Invalid(e.to_string()))?;

        let response = match token {
            Some(token) => {
                // AddAuthorization panics on values that are not valid header text.
                if HeaderValue::from_str(&format!("Bearer {}", token)).is_err() {
                    return Err(ApiError::Invalid(
                        "stored token is not a valid header value".to_string(),
                    ));
                }
                AddAuthorization::bearer(self.http.clone(), token)
                    .oneshot(req)
                    .await
            }
            None => self.http.clone().oneshot(req).await,
        }
        .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .to_bytes()
            .to_vec();

        log::debug!("{} {} -> {}", method, path, status);
        check_status(status, bytes, token.is_some())
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<Vec<u8>, ApiError> {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Invalid(e.to_string()))?;
        self.send(method, path, token, Some(json)).await
    }

    // --- ACCOUNT ---

    /// `POST /user/login`; returns the issued token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let bytes = self
            .send_json(Method::POST, "/user/login", None, &body)
            .await?;
        decode::<TokenResponse>(&bytes).map(|t| t.token)
    }

    /// `POST /user/register`; returns the issued token.
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ApiError> {
        let bytes = self
            .send_json(Method::POST, "/user/register", None, request)
            .await?;
        decode::<TokenResponse>(&bytes).map(|t| t.token)
    }

    /// `GET /user`. Doubles as token validation.
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        let bytes = self.send(Method::GET, "/user", Some(token), None).await?;
        decode::<UserEnvelope>(&bytes).map(|env| env.user)
    }

    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.send(Method::POST, "/user/logout", Some(token), None)
            .await
            .map(|_| ())
    }

    pub async fn delete_account(&self, token: &str) -> Result<(), ApiError> {
        self.send(
            Method::DELETE,
            &self.delete_account_path,
            Some(token),
            None,
        )
        .await
        .map(|_| ())
    }

    // --- ENTRIES ---

    /// `GET /journal`, in server order.
    pub async fn list_entries(&self, token: &str) -> Result<Vec<JournalEntry>, ApiError> {
        let bytes = self.send(Method::GET, "/journal", Some(token), None).await?;
        decode(&bytes)
    }

    /// `POST /journal/create`. Returns the created entry when the server echoes it back.
    pub async fn create_entry(
        &self,
        token: &str,
        entry: &NewEntry,
    ) -> Result<Option<JournalEntry>, ApiError> {
        let bytes = self
            .send_json(Method::POST, "/journal/create", Some(token), entry)
            .await?;
        match serde_json::from_slice::<CreatedEntry>(&bytes) {
            Ok(created) => Ok(Some(created.into_entry())),
            Err(e) => {
                log::debug!("Create response did not contain an entry: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn delete_entry(&self, token: &str, id: &EntryId) -> Result<(), ApiError> {
        let path = self.delete_entry_path.replace("{id}", &id.to_string());
        self.send(Method::DELETE, &path, Some(token), None)
            .await
            .map(|_| ())
    }
}

fn check_status(status: StatusCode, body: Vec<u8>, authenticated: bool) -> Result<Vec<u8>, ApiError> {
    if status.is_success() {
        return Ok(body);
    }
    if authenticated && (status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND) {
        return Err(ApiError::Unauthorized(status));
    }
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty());
    Err(ApiError::Status { status, message })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Malformed(e.to_string()))
}
