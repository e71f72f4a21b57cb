#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use sweet_pea::app::{self, AppState};
use sweet_pea::auth::{self, SessionKeys, SESSION_COOKIE};
use sweet_pea::config::SecurityConfig;
use sweet_pea::database::models::{Account, NewAccount, NewTestimonial, Testimonial};
use sweet_pea::database::{AccountStore, MemoryStore, TestimonialStore};
use sweet_pea::middleware::FLASH_COOKIE;

pub const PASSWORD: &str = "sweetpeas-in-bloom";

fn security(secure_cookies: bool) -> SecurityConfig {
    SecurityConfig {
        session_secret: "integration-test-secret".to_string(),
        session_ttl_hours: 1,
        secure_cookies,
        bootstrap_admin: None,
    }
}

/// The full router over a fresh in-memory store
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    router: Router,
    sessions: SessionKeys,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_secure_cookies(false)
    }

    pub fn with_secure_cookies(secure_cookies: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionKeys::new(&security(secure_cookies)).expect("test secret");
        let state = AppState::new(store.clone(), sessions.clone());

        Self {
            store,
            router: app::router(state),
            sessions,
        }
    }

    pub async fn user(&self, username: &str) -> Result<Account> {
        self.account(username, false).await
    }

    pub async fn staff(&self, username: &str) -> Result<Account> {
        self.account(username, true).await
    }

    async fn account(&self, username: &str, is_staff: bool) -> Result<Account> {
        let password_hash = auth::hash_password(PASSWORD)?;
        let account = self
            .store
            .create(NewAccount {
                is_staff,
                ..NewAccount::regular(username, password_hash)
            })
            .await?;
        Ok(account)
    }

    pub async fn testimonial(&self, author: &Account, body: &str) -> Result<Testimonial> {
        let record = self
            .store
            .insert(NewTestimonial {
                author_id: author.id,
                location: None,
                body: body.to_string(),
            })
            .await?;
        Ok(record)
    }

    /// Cookie header value carrying a session for `account`
    pub fn session_for(&self, account: &Account) -> Result<String> {
        let token = self.sessions.issue(account)?;
        Ok(format!("{}={}", SESSION_COOKIE, token))
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Result<TestResponse> {
        let mut request = Request::get(path);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty())?).await
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)], cookie: Option<&str>) -> Result<TestResponse> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();

        let mut request = Request::post(path).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body))?).await
    }

    /// POST an arbitrary body, for requests a browser form would never send
    pub async fn post_raw(
        &self,
        path: &str,
        content_type: &str,
        body: &str,
        cookie: Option<&str>,
    ) -> Result<TestResponse> {
        let mut request = Request::post(path).header(header::CONTENT_TYPE, content_type);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string()))?).await
    }

    async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = String::from_utf8(bytes.to_vec()).context("response body is not UTF-8")?;

        Ok(TestResponse { status, headers, body })
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION)?.to_str().ok()
    }

    /// `name=value` from this response's Set-Cookie for `name`, if any
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.split('=').next() == Some(name))
            .map(str::to_string)
    }

    /// Full Set-Cookie line for `name`, attributes included
    pub fn set_cookie_line(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{}=", name)))
            .map(str::to_string)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE)?.to_str().ok()
    }

    /// The notice cookie to replay on the following request
    pub fn flash(&self) -> Option<String> {
        self.cookie(FLASH_COOKIE)
    }

    /// Whether the response expires the named cookie
    pub fn clears_cookie(&self, name: &str) -> bool {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&format!("{}=", name)) && v.contains("Max-Age=0"))
    }
}

/// Join cookie pairs into one Cookie header value
pub fn cookies(pairs: &[&str]) -> String {
    pairs.join("; ")
}
