use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::SET_COOKIE, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::cookies;

/// Cookie carrying one-time notices to the next rendered page
pub const FLASH_COOKIE: &str = "sweetpea_messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: Level::Success, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { level: Level::Info, text: text.into() }
    }
}

/// Notices pending for this request. Rendering a page consumes them.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    notices: Vec<Notice>,
}

impl Flash {
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    fn decode(raw: &str) -> Self {
        let notices = serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::debug!("Discarding malformed notice cookie: {}", e);
            Vec::new()
        });
        Self { notices }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(cookies::read(&parts.headers, FLASH_COOKIE)
            .map(|raw| Flash::decode(&raw))
            .unwrap_or_default())
    }
}

/// 303 redirect that leaves a notice for the next page.
/// `secure` follows the session cookie setting.
pub fn redirect_with_notice(to: &str, notice: Notice, secure: bool) -> Result<Response, AppError> {
    redirect_with_cookies(to, notice, Vec::new(), secure)
}

/// Like [`redirect_with_notice`], with extra Set-Cookie values (e.g. the session)
pub fn redirect_with_cookies(
    to: &str,
    notice: Notice,
    mut set_cookies: Vec<axum::http::HeaderValue>,
    secure: bool,
) -> Result<Response, AppError> {
    let payload = serde_json::to_string(&vec![notice]).map_err(|e| {
        tracing::error!("Failed to serialize notice: {}", e);
        AppError::internal_server_error("Failed to record status message")
    })?;
    set_cookies.push(cookies::set(FLASH_COOKIE, payload, None, secure)?);

    let headers: Vec<_> = set_cookies.into_iter().map(|v| (SET_COOKIE, v)).collect();
    Ok((AppendHeaders(headers), Redirect::to(to)).into_response())
}
