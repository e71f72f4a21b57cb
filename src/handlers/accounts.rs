// Public account flow: register, log in, log out

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tera::Context;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth;
use crate::database::models::{Account, NewAccount};
use crate::database::DatabaseError;
use crate::error::AppError;
use crate::forms::{LoginForm, RegisterErrors, RegisterForm};
use crate::middleware::{end_session, redirect_with_cookies, redirect_with_notice, start_session, Flash, Notice, Principal};
use crate::views;

pub const LOGIN_FAILED: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Look up the account and check its password off the async executor.
/// `None` covers unknown user, wrong password and inactive account alike, and
/// all three run the same argon2 verification.
pub(crate) async fn authenticate(state: &AppState, form: &LoginForm) -> Result<Option<Account>, AppError> {
    if !form.is_complete() {
        return Ok(None);
    }

    let account = state
        .accounts
        .find_by_username(form.username.trim())
        .await?
        .filter(|account| account.is_active);

    let hash = account.as_ref().map(|account| account.password_hash.clone());
    let password = form.password.clone();
    let verified = tokio::task::spawn_blocking(move || auth::verify_password_or_decoy(hash.as_deref(), &password))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            AppError::internal_server_error("An error occurred while processing your request")
        })?;

    Ok(account.filter(|_| verified))
}

fn render_login(principal: &Principal, flash: &Flash, username: &str, error: Option<&str>) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("username", username);
    context.insert("error", &error);
    views::render("accounts/login.html", context, principal, flash)
}

fn render_register(
    principal: &Principal,
    flash: &Flash,
    form: &RegisterForm,
    errors: &RegisterErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("username", &form.username);
    context.insert("first_name", &form.first_name);
    context.insert("errors", errors);
    views::render("accounts/register.html", context, principal, flash)
}

/// GET /accounts/login/
pub async fn login_form(principal: Principal, flash: Flash) -> Result<Response, AppError> {
    if principal.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    render_login(&principal, &flash, "", None)
}

/// POST /accounts/login/
pub async fn login(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match authenticate(&state, &form).await? {
        Some(account) => {
            info!(user = %account.username, "Login");
            let session = start_session(&state, &account)?;
            redirect_with_cookies(
                "/",
                Notice::success(format!("Welcome back, {}.", account.display_name())),
                vec![session],
                state.sessions.secure_cookies(),
            )
        }
        None => {
            warn!(username = %form.username.trim(), "Login rejected");
            render_login(&principal, &flash, form.username.trim(), Some(LOGIN_FAILED))
        }
    }
}

/// GET|POST /accounts/logout/
pub async fn logout(State(state): State<AppState>, principal: Principal) -> Result<Response, AppError> {
    if let Some(account) = principal.account() {
        info!(user = %account.username, "Logout");
    }
    redirect_with_cookies(
        "/",
        Notice::info("You have been logged out."),
        vec![end_session()?],
        state.sessions.secure_cookies(),
    )
}

/// GET /register/
pub async fn register_form(principal: Principal, flash: Flash) -> Result<Response, AppError> {
    render_register(&principal, &flash, &RegisterForm::default(), &RegisterErrors::default())
}

/// POST /register/
pub async fn register(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        return render_register(&principal, &flash, &form, &errors);
    }

    let username = form.username.trim().to_string();
    let taken = RegisterErrors {
        username: Some(USERNAME_TAKEN.to_string()),
        ..Default::default()
    };
    if state.accounts.find_by_username(&username).await?.is_some() {
        return render_register(&principal, &flash, &form, &taken);
    }

    let password = form.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            AppError::internal_server_error("An error occurred while processing your request")
        })??;

    let new = NewAccount {
        first_name: form.first_name.trim().to_string(),
        ..NewAccount::regular(username.clone(), password_hash)
    };
    match state.accounts.create(new).await {
        Ok(account) => {
            info!(user = %account.username, "Account registered");
            redirect_with_notice(
                "/accounts/login/",
                Notice::success(format!("Account created for {}! You can now log in.", account.username)),
                state.sessions.secure_cookies(),
            )
        }
        // Lost a race with another registration
        Err(DatabaseError::Conflict(_)) => render_register(&principal, &flash, &form, &taken),
        Err(e) => Err(e.into()),
    }
}
