//! Session/auth client for the SEAP Alerts backend
//!
//! Every protected call carries the stored credential as a bearer header.
//! A 401 triggers exactly one refresh; if that succeeds the call is retried
//! once with the new credential, otherwise the session is dropped and the
//! call reports `None` instead of failing.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroize;

use crate::credential::{Claims, Credential};
use crate::error::{ClientError, Result};
use crate::reports::{ReportQuery, ReportsResponse};
use crate::session::SessionStore;
use crate::settings::Settings;

const AUTH_ENDPOINT: &str = "auth_user";
const VERIFY_ENDPOINT: &str = "verify_jwt";
const REFRESH_ENDPOINT: &str = "refresh_jwt";
const REPORTS_ENDPOINT: &str = "get_reports";

/// Body of `POST /auth_user`
#[derive(Clone, Serialize)]
pub struct AuthRequest {
    username: String,
    email: String,
    password: String,
    /// 1 creates an account, 0 logs in
    #[serde(rename = "type")]
    kind: u8,
}

impl AuthRequest {
    /// Log in with an existing account
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: String::new(),
            email: email.into(),
            password: password.into(),
            kind: 0,
        }
    }

    /// Create a new account
    pub fn signup(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            kind: 1,
        }
    }

    pub fn is_signup(&self) -> bool {
        self.kind == 1
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl Drop for AuthRequest {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("type", &self.kind)
            .finish()
    }
}

/// Body returned by the auth and refresh endpoints
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    jwt: Option<String>,
}

/// HTTP client bound to one backend origin and one session store
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client without a request timeout
    pub fn new(base: Url, session: SessionStore) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self::with_http(http, base, session))
    }

    /// Create a client from settings
    pub fn from_settings(settings: &Settings, session: SessionStore) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self::with_http(http, settings.api_base_url()?, session))
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_http(http: Client, mut base: Url, session: SessionStore) -> Self {
        // Endpoints are joined relative to the base path
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Self {
            http,
            base,
            session,
        }
    }

    /// Backend origin
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Session store backing this client
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base
            .join(name)
            .map_err(|e| ClientError::ConfigError(format!("bad endpoint {}: {}", name, e)))
    }

    /// Log in. Stores and returns the credential on success, `None` on any
    /// non-2xx status or a response without a token.
    pub async fn login(&self, request: &AuthRequest) -> Result<Option<Credential>> {
        match self.authenticate(request).await {
            Ok(credential) => Ok(Some(credential)),
            Err(ClientError::AuthenticationFailed { status }) => {
                info!("Authentication rejected for {} (HTTP {})", request.email, status);
                Ok(None)
            }
            Err(ClientError::InvalidToken(reason)) => {
                warn!("Authentication response had no usable token: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create an account and log in with it
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Credential>> {
        self.login(&AuthRequest::signup(username, email, password))
            .await
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<Credential> {
        debug!(
            "POST {} ({})",
            AUTH_ENDPOINT,
            if request.is_signup() { "signup" } else { "login" }
        );

        let response = self
            .http
            .post(self.endpoint(AUTH_ENDPOINT)?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::AuthenticationFailed {
                status: status.as_u16(),
            });
        }

        let credential = read_token(response).await?;
        self.session.set(&credential).await?;

        info!("Logged in as {}", request.email);
        Ok(credential)
    }

    /// Ask the server whether the stored credential is still valid.
    ///
    /// A rejected credential is cleared. A network failure reports `false`
    /// and keeps the credential for a later attempt.
    pub async fn is_logged_in(&self) -> Result<bool> {
        let Some(credential) = self.session.get().await? else {
            debug!("No stored credential");
            return Ok(false);
        };

        let response = match self.post_bearer(VERIFY_ENDPOINT, &credential).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Could not verify session: {}", e);
                return Ok(false);
            }
        };

        if !response.status().is_success() {
            info!(
                "Session rejected by server (HTTP {}), logging out",
                response.status().as_u16()
            );
            self.session.clear().await?;
            return Ok(false);
        }

        Ok(true)
    }

    /// Fetch the report feed for a query.
    ///
    /// `None` means there is no session, or it expired and could not be
    /// refreshed; the caller should send the user to log in again.
    pub async fn fetch_reports(&self, query: &ReportQuery) -> Result<Option<ReportsResponse>> {
        self.call_protected(REPORTS_ENDPOINT, query).await
    }

    /// POST a JSON body to a protected endpoint and decode the JSON reply.
    ///
    /// On 401 the credential is refreshed once and the call retried once.
    /// Any other non-2xx, including a 401 on the retry, is an error.
    pub async fn call_protected<B, T>(&self, endpoint: &'static str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let Some(credential) = self.session.get().await? else {
            debug!("No stored credential for {}", endpoint);
            return Ok(None);
        };

        let mut response = self.post_json(endpoint, &credential, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("{} returned 401, refreshing credential", endpoint);

            let refreshed = match self.refresh(&credential).await {
                Ok(refreshed) => refreshed,
                Err(e) => {
                    warn!("Credential refresh failed, logging out: {}", e);
                    self.session.clear().await?;
                    return Ok(None);
                }
            };

            response = self.post_json(endpoint, &refreshed, body).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        Ok(Some(response.json().await?))
    }

    /// Exchange the credential for a new one and store it
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let response = self.post_bearer(REFRESH_ENDPOINT, credential).await?;

        if !response.status().is_success() {
            debug!("Refresh rejected (HTTP {})", response.status().as_u16());
            self.session.clear().await?;
            return Err(ClientError::SessionExpired);
        }

        let refreshed = read_token(response).await?;
        self.session.set(&refreshed).await?;

        debug!("Credential refreshed");
        Ok(refreshed)
    }

    /// Forget the stored credential. There is no server-side revocation.
    pub async fn logout(&self) -> Result<()> {
        self.session.clear().await?;
        info!("Logged out");
        Ok(())
    }

    /// Claims of the stored credential, if it decodes
    pub async fn claims(&self) -> Result<Option<Claims>> {
        Ok(self
            .session
            .get()
            .await?
            .and_then(|credential| credential.claims().ok()))
    }

    /// Username carried by the stored credential
    pub async fn username(&self) -> Result<Option<String>> {
        Ok(self.claims().await?.and_then(|claims| claims.username))
    }

    async fn post_bearer(&self, endpoint: &str, credential: &Credential) -> Result<Response> {
        debug!("POST {}", endpoint);
        Ok(self
            .http
            .post(self.endpoint(endpoint)?)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, credential.bearer())
            .send()
            .await?)
    }

    async fn post_json<B>(&self, endpoint: &str, credential: &Credential, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        debug!("POST {}", endpoint);
        Ok(self
            .http
            .post(self.endpoint(endpoint)?)
            .header(AUTHORIZATION, credential.bearer())
            .json(body)
            .send()
            .await?)
    }
}

async fn read_token(response: Response) -> Result<Credential> {
    let body: TokenResponse = response.json().await?;
    match body.jwt {
        Some(jwt) => Credential::new(jwt),
        None => Err(ClientError::InvalidToken(
            "response has no jwt field".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn client(base: &str) -> ApiClient {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        ApiClient::new(Url::parse(base).unwrap(), session).unwrap()
    }

    #[test]
    fn test_auth_request_body() {
        let body = serde_json::to_value(AuthRequest::login("ana@example.ro", "parola")).unwrap();
        assert_eq!(body["type"], 0);
        assert_eq!(body["username"], "");

        let body =
            serde_json::to_value(AuthRequest::signup("ana", "ana@example.ro", "parola")).unwrap();
        assert_eq!(body["type"], 1);
        assert_eq!(body["username"], "ana");
    }

    #[test]
    fn test_auth_request_debug_redacts_password() {
        let shown = format!("{:?}", AuthRequest::login("ana@example.ro", "parola-secreta"));
        assert!(!shown.contains("parola-secreta"));
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let api = client("http://localhost:8000");
        assert_eq!(
            api.endpoint(REPORTS_ENDPOINT).unwrap().as_str(),
            "http://localhost:8000/get_reports"
        );

        let api = client("https://example.ro/api");
        assert_eq!(
            api.endpoint(VERIFY_ENDPOINT).unwrap().as_str(),
            "https://example.ro/api/verify_jwt"
        );
    }

    #[tokio::test]
    async fn test_calls_without_session_short_circuit() {
        // Unroutable base: nothing must be sent when no credential is stored
        let api = client("http://127.0.0.1:9");

        assert!(!api.is_logged_in().await.unwrap());
        assert!(api
            .fetch_reports(&ReportQuery::default())
            .await
            .unwrap()
            .is_none());
        assert!(api.username().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_from_stored_token() {
        let api = client("http://127.0.0.1:9");
        let token = crate::credential::make_token(r#"{"id":1,"username":"ana"}"#);
        api.session()
            .set(&Credential::new(token).unwrap())
            .await
            .unwrap();

        assert_eq!(api.username().await.unwrap().as_deref(), Some("ana"));

        api.logout().await.unwrap();
        assert!(api.username().await.unwrap().is_none());
    }
}
