//! Testimonial CRUD, written once and mounted twice.
//!
//! The public site and the staff portal differ only in their policy branch, URL
//! prefix, listing order and wording, all supplied by a [`CrudSurface`] type.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::Response,
    routing::get,
    Form, Router,
};
use serde::Serialize;
use tera::Context;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{NewTestimonial, Testimonial};
use crate::error::AppError;
use crate::forms::{TestimonialErrors, TestimonialForm};
use crate::middleware::{redirect_with_notice, Flash, Notice, Principal};
use crate::policy::{self, Denial, Surface};
use crate::types::{ListOrder, Operation};
use crate::views;

use super::guard;

pub trait CrudSurface: Send + Sync + 'static {
    const SURFACE: Surface;
    /// URL prefix without trailing slash; empty for the site root
    const BASE: &'static str;
    const ORDER: ListOrder;

    const LIST_HEADING: &'static str;
    const CREATE_LABEL: &'static str;
    const NEW_HEADING: &'static str;
    const EDIT_HEADING: &'static str;

    const CREATED_NOTICE: &'static str;
    const UPDATED_NOTICE: &'static str;
    const DELETED_NOTICE: &'static str;

    fn list_url() -> String {
        format!("{}/", Self::BASE)
    }

    fn new_url() -> String {
        format!("{}/new/", Self::BASE)
    }

    fn edit_url(id: Uuid) -> String {
        format!("{}/{}/edit/", Self::BASE, id)
    }

    fn delete_url(id: Uuid) -> String {
        format!("{}/{}/delete/", Self::BASE, id)
    }
}

/// Self-service surface at the site root
pub struct PublicSite;

impl CrudSurface for PublicSite {
    const SURFACE: Surface = Surface::Public;
    const BASE: &'static str = "";
    const ORDER: ListOrder = ListOrder::Created;

    const LIST_HEADING: &'static str = "What our customers say";
    const CREATE_LABEL: &'static str = "Share your experience";
    const NEW_HEADING: &'static str = "Share your experience";
    const EDIT_HEADING: &'static str = "Edit your testimonial";

    const CREATED_NOTICE: &'static str = "Thank you! Your testimonial has been published.";
    const UPDATED_NOTICE: &'static str = "Your testimonial has been updated.";
    const DELETED_NOTICE: &'static str = "Your testimonial has been deleted.";
}

/// Staff management surface under /portal/testimonials
pub struct StaffPortal;

impl CrudSurface for StaffPortal {
    const SURFACE: Surface = Surface::Portal;
    const BASE: &'static str = "/portal/testimonials";
    const ORDER: ListOrder = ListOrder::NewestFirst;

    const LIST_HEADING: &'static str = "Manage testimonials";
    const CREATE_LABEL: &'static str = "Add a testimonial";
    const NEW_HEADING: &'static str = "New testimonial";
    const EDIT_HEADING: &'static str = "Edit testimonial";

    const CREATED_NOTICE: &'static str = "Testimonial created.";
    const UPDATED_NOTICE: &'static str = "Testimonial updated.";
    const DELETED_NOTICE: &'static str = "Testimonial deleted.";
}

pub fn routes<S: CrudSurface>() -> Router<AppState> {
    Router::new()
        .route(&S::list_url(), get(list::<S>))
        .route(&S::new_url(), get(new_form::<S>).post(create::<S>))
        .route(
            &format!("{}/:id/edit/", S::BASE),
            get(edit_form::<S>).post(update::<S>),
        )
        .route(
            &format!("{}/:id/delete/", S::BASE),
            get(confirm_delete::<S>).post(destroy::<S>),
        )
}

#[derive(Serialize)]
struct Row<'a> {
    testimonial: &'a Testimonial,
    can_manage: bool,
    edit_url: String,
    delete_url: String,
}

fn surface_context<S: CrudSurface>() -> Context {
    let mut context = Context::new();
    context.insert("portal", &(S::SURFACE == Surface::Portal));
    context.insert("list_url", &S::list_url());
    context
}

fn not_found() -> AppError {
    AppError::not_found("Testimonial not found")
}

/// Malformed ids cannot name a row, so they are reported as missing
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

/// Role/authentication gate, then fetch, then ownership gate
async fn load_for<S: CrudSurface>(
    state: &AppState,
    principal: &Principal,
    operation: Operation,
    raw_id: &str,
) -> Result<Testimonial, AppError> {
    guard(S::SURFACE, principal, operation, None)?;
    let id = parse_id(raw_id)?;
    let record = state.testimonials.get(id).await?.ok_or_else(not_found)?;
    guard(S::SURFACE, principal, operation, Some(&record))?;
    Ok(record)
}

fn render_form<S: CrudSurface>(
    principal: &Principal,
    flash: &Flash,
    heading: &str,
    action: &str,
    form: &TestimonialForm,
    errors: &TestimonialErrors,
) -> Result<Response, AppError> {
    let mut context = surface_context::<S>();
    context.insert("heading", heading);
    context.insert("action", action);
    context.insert("cancel_url", &S::list_url());
    context.insert("body", &form.body);
    context.insert("location", &form.location);
    context.insert("errors", errors);
    views::render("testimonials/form.html", context, principal, flash)
}

pub async fn list<S: CrudSurface>(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
) -> Result<Response, AppError> {
    guard(S::SURFACE, &principal, Operation::List, None)?;
    let testimonials = state.testimonials.all(S::ORDER).await?;

    let rows: Vec<Row> = testimonials
        .iter()
        .map(|t| Row {
            testimonial: t,
            can_manage: policy::authorize(S::SURFACE, &principal, Operation::Update, Some(t)).is_ok(),
            edit_url: S::edit_url(t.id),
            delete_url: S::delete_url(t.id),
        })
        .collect();
    let can_create = policy::authorize(S::SURFACE, &principal, Operation::Create, None).is_ok();

    let mut context = surface_context::<S>();
    context.insert("heading", S::LIST_HEADING);
    context.insert("create_label", S::CREATE_LABEL);
    context.insert("new_url", &S::new_url());
    context.insert("can_create", &can_create);
    context.insert("rows", &rows);
    views::render("testimonials/list.html", context, &principal, &flash)
}

pub async fn new_form<S: CrudSurface>(principal: Principal, flash: Flash) -> Result<Response, AppError> {
    guard(S::SURFACE, &principal, Operation::Create, None)?;
    render_form::<S>(
        &principal,
        &flash,
        S::NEW_HEADING,
        &S::new_url(),
        &TestimonialForm::default(),
        &TestimonialErrors::default(),
    )
}

pub async fn create<S: CrudSurface>(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
    form: Result<Form<TestimonialForm>, FormRejection>,
) -> Result<Response, AppError> {
    guard(S::SURFACE, &principal, Operation::Create, None)?;
    let author = principal.account().ok_or(Denial::Unauthenticated)?;
    let Form(form) = form?;

    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(errors) => {
            return render_form::<S>(&principal, &flash, S::NEW_HEADING, &S::new_url(), &form, &errors)
        }
    };

    let record = state
        .testimonials
        .insert(NewTestimonial {
            author_id: author.id,
            location: changes.location,
            body: changes.body,
        })
        .await?;

    info!(id = %record.id, author = %author.username, surface = ?S::SURFACE, "Testimonial created");
    redirect_with_notice(
        &S::list_url(),
        Notice::success(S::CREATED_NOTICE),
        state.sessions.secure_cookies(),
    )
}

pub async fn edit_form<S: CrudSurface>(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = load_for::<S>(&state, &principal, Operation::Update, &id).await?;
    let form = TestimonialForm {
        body: record.body.clone(),
        location: record.location.clone().unwrap_or_default(),
    };
    render_form::<S>(
        &principal,
        &flash,
        S::EDIT_HEADING,
        &S::edit_url(record.id),
        &form,
        &TestimonialErrors::default(),
    )
}

pub async fn update<S: CrudSurface>(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
    Path(id): Path<String>,
    form: Result<Form<TestimonialForm>, FormRejection>,
) -> Result<Response, AppError> {
    let record = load_for::<S>(&state, &principal, Operation::Update, &id).await?;
    let Form(form) = form?;

    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(errors) => {
            return render_form::<S>(
                &principal,
                &flash,
                S::EDIT_HEADING,
                &S::edit_url(record.id),
                &form,
                &errors,
            )
        }
    };

    // Row may have been deleted since it was loaded
    let updated = state
        .testimonials
        .update(record.id, changes)
        .await?
        .ok_or_else(not_found)?;

    info!(
        id = %updated.id,
        editor = %principal.account().map(|a| a.username.as_str()).unwrap_or_default(),
        surface = ?S::SURFACE,
        "Testimonial updated"
    );
    redirect_with_notice(
        &S::list_url(),
        Notice::success(S::UPDATED_NOTICE),
        state.sessions.secure_cookies(),
    )
}

pub async fn confirm_delete<S: CrudSurface>(
    State(state): State<AppState>,
    principal: Principal,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = load_for::<S>(&state, &principal, Operation::Delete, &id).await?;

    let mut context = surface_context::<S>();
    context.insert("testimonial", &record);
    context.insert("action", &S::delete_url(record.id));
    context.insert("cancel_url", &S::list_url());
    views::render("testimonials/confirm_delete.html", context, &principal, &flash)
}

pub async fn destroy<S: CrudSurface>(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = load_for::<S>(&state, &principal, Operation::Delete, &id).await?;

    if !state.testimonials.delete(record.id).await? {
        return Err(not_found());
    }

    info!(
        id = %record.id,
        testimonial = %record,
        actor = %principal.account().map(|a| a.username.as_str()).unwrap_or_default(),
        surface = ?S::SURFACE,
        "Testimonial deleted"
    );
    redirect_with_notice(
        &S::list_url(),
        Notice::success(S::DELETED_NOTICE),
        state.sessions.secure_cookies(),
    )
}
