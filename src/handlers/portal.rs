// Staff portal: login, logout, dashboard. Testimonial management lives in
// `testimonials` under the `StaffPortal` surface.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tera::Context;
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::AppError;
use crate::forms::LoginForm;
use crate::middleware::{end_session, redirect_with_cookies, start_session, Flash, Notice, Principal};
use crate::policy::{self, Surface};
use crate::types::Operation;
use crate::views;

use super::accounts::authenticate;
use super::guard;

/// One message for every failure so callers cannot tell a wrong password
/// from a valid non-staff account.
pub const PORTAL_LOGIN_FAILED: &str =
    "Please enter the correct username and password for a staff account. Note that both fields may be case-sensitive.";

fn render_login(principal: &Principal, flash: &Flash, username: &str, error: Option<&str>) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("username", username);
    context.insert("error", &error);
    views::render("portal/login.html", context, principal, flash)
}

/// GET /portal/login/
pub async fn login_form(principal: Principal, flash: Flash) -> Result<Response, AppError> {
    if principal.account().is_some_and(policy::may_enter_portal) {
        return Ok(Redirect::to("/portal/").into_response());
    }
    render_login(&principal, &flash, "", None)
}

/// POST /portal/login/
pub async fn login(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match authenticate(&state, &form).await? {
        Some(account) if policy::may_enter_portal(&account) => {
            info!(user = %account.username, "Portal login");
            let session = start_session(&state, &account)?;
            redirect_with_cookies(
                "/portal/",
                Notice::success(format!("Welcome back, {}.", account.display_name())),
                vec![session],
                state.sessions.secure_cookies(),
            )
        }
        _ => {
            warn!(username = %form.username.trim(), "Portal login rejected");
            render_login(&principal, &flash, form.username.trim(), Some(PORTAL_LOGIN_FAILED))
        }
    }
}

/// GET|POST /portal/logout/
pub async fn logout(State(state): State<AppState>, principal: Principal) -> Result<Response, AppError> {
    if let Some(account) = principal.account() {
        info!(user = %account.username, "Portal logout");
    }
    redirect_with_cookies(
        "/portal/login/",
        Notice::info("You have been logged out."),
        vec![end_session()?],
        state.sessions.secure_cookies(),
    )
}

/// GET /portal/
pub async fn dashboard(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
) -> Result<Response, AppError> {
    guard(Surface::Portal, &principal, Operation::Dashboard, None)?;
    let testimonial_count = state.testimonials.count().await?;

    let mut context = Context::new();
    context.insert("testimonial_count", &testimonial_count);
    views::render("portal/dashboard.html", context, &principal, &flash)
}
