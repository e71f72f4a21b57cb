use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue},
};
use cookie::time::Duration;

use crate::app::AppState;
use crate::auth::SESSION_COOKIE;
use crate::database::models::Account;
use crate::error::AppError;

use super::cookies;

/// The acting principal for a request
#[derive(Clone, Debug)]
pub enum Principal {
    Anonymous,
    Authenticated(Account),
}

impl Principal {
    pub fn account(&self) -> Option<&Account> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(account) => Some(account),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.account().is_some()
    }
}

/// Set-Cookie value establishing a session for the account
pub fn start_session(state: &AppState, account: &Account) -> Result<HeaderValue, AppError> {
    let token = state.sessions.issue(account)?;
    let max_age = Duration::hours(state.sessions.ttl_hours() as i64);
    cookies::set(SESSION_COOKIE, token, Some(max_age), state.sessions.secure_cookies())
}

/// Set-Cookie value destroying the session
pub fn end_session() -> Result<HeaderValue, AppError> {
    cookies::clear(SESSION_COOKIE)
}

/// Resolves the session cookie into a principal.
/// Role flags come from the store on every request, never from the token, so
/// deleted or deactivated accounts lose their sessions immediately.
#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = cookies::read(&parts.headers, SESSION_COOKIE) else {
            return Ok(Principal::Anonymous);
        };

        let claims = match state.sessions.verify(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Ignoring session cookie: {}", e);
                return Ok(Principal::Anonymous);
            }
        };

        match state.accounts.find_by_id(claims.sub).await? {
            Some(account) if account.is_active => Ok(Principal::Authenticated(account)),
            Some(_) => {
                tracing::debug!("Session for inactive account '{}' ignored", claims.username);
                Ok(Principal::Anonymous)
            }
            None => Ok(Principal::Anonymous),
        }
    }
}
