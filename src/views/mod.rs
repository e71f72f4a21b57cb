//! HTML rendering. Templates are compiled into the binary and autoescaped.

use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{Html, IntoResponse, Response},
};
use once_cell::sync::Lazy;
use serde::Serialize;
use tera::{Context, Tera};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{cookies, Flash, Principal, FLASH_COOKIE};

const TEMPLATE_SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("testimonials/list.html", include_str!("../../templates/testimonials/list.html")),
    ("testimonials/form.html", include_str!("../../templates/testimonials/form.html")),
    (
        "testimonials/confirm_delete.html",
        include_str!("../../templates/testimonials/confirm_delete.html"),
    ),
    ("portal/login.html", include_str!("../../templates/portal/login.html")),
    ("portal/dashboard.html", include_str!("../../templates/portal/dashboard.html")),
    ("accounts/login.html", include_str!("../../templates/accounts/login.html")),
    ("accounts/register.html", include_str!("../../templates/accounts/register.html")),
];

static TEMPLATES: Lazy<Result<Tera, tera::Error>> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATE_SOURCES.iter().copied())?;
    Ok(tera)
});

/// Compiled template set. Fails only if a bundled template does not parse.
pub fn templates() -> Result<&'static Tera, AppError> {
    TEMPLATES.as_ref().map_err(|e| {
        tracing::error!("Template compilation failed: {:?}", e);
        AppError::internal_server_error("Failed to load templates")
    })
}

/// What pages know about the signed-in account
#[derive(Debug, Serialize)]
struct UserContext<'a> {
    id: Uuid,
    username: &'a str,
    display_name: &'a str,
    is_elevated: bool,
}

pub fn render(
    template: &str,
    context: Context,
    principal: &Principal,
    flash: &Flash,
) -> Result<Response, AppError> {
    render_with_status(StatusCode::OK, template, context, principal, flash)
}

/// Render a page, injecting `user` and `messages`. Shown notices are cleared.
pub fn render_with_status(
    status: StatusCode,
    template: &str,
    mut context: Context,
    principal: &Principal,
    flash: &Flash,
) -> Result<Response, AppError> {
    let user = principal.account().map(|account| UserContext {
        id: account.id,
        username: &account.username,
        display_name: account.display_name(),
        is_elevated: account.is_elevated(),
    });
    context.insert("user", &user);
    context.insert("messages", flash.notices());

    let html = templates()?.render(template, &context)?;
    let mut response = (status, Html(html)).into_response();

    if !flash.is_empty() {
        response
            .headers_mut()
            .append(SET_COOKIE, cookies::clear(FLASH_COOKIE)?);
    }
    Ok(response)
}

/// Error page used by `AppError`. Falls back to plain text if rendering fails.
pub fn render_error(status: StatusCode, code: &str, message: &str) -> Response {
    let mut context = Context::new();
    context.insert("status", &status.as_u16());
    context.insert("reason", status.canonical_reason().unwrap_or("Error"));
    context.insert("code", code);
    context.insert("message", message);
    context.insert("user", &Option::<()>::None);
    context.insert("messages", &Vec::<()>::new());

    match templates().and_then(|t| t.render("error.html", &context).map_err(AppError::from)) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, format!("{} {}: {}", status.as_u16(), code, message)).into_response(),
    }
}
