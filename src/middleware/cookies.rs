use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{time::Duration, Cookie, SameSite};

use crate::error::AppError;

/// Find a cookie by name across every Cookie header, percent-decoded
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| Cookie::split_parse_encoded(raw.to_string()))
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// Set-Cookie value for an HttpOnly, site-wide cookie
pub fn set(
    name: &'static str,
    value: String,
    max_age: Option<Duration>,
    secure: bool,
) -> Result<HeaderValue, AppError> {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);
    if let Some(age) = max_age {
        builder = builder.max_age(age);
    }
    header_value(builder.build())
}

/// Set-Cookie value that removes the cookie
pub fn clear(name: &'static str) -> Result<HeaderValue, AppError> {
    let cookie = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build();
    header_value(cookie)
}

fn header_value(cookie: Cookie<'_>) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&cookie.encoded().to_string()).map_err(|e| {
        tracing::error!("Invalid Set-Cookie value: {}", e);
        AppError::internal_server_error("Failed to set cookie")
    })
}
