//! Service settings page and the platform-admin toggle forms behind it.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::csrf::generate_csrf_token;
use crate::error::AppError;
use crate::models::{Permission, Service};
use crate::settings::{SettingsPage, mutator, toggle_label, urls};
use crate::state::AppState;

use super::helpers::{
    CsrfOnlyForm, form_body, parse_form_bool, redirect_found, render_admin_template,
    require_csrf, require_login, require_platform_admin, require_platform_admin_to_change,
};

// =============================================================================
// Form data
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToggleForm {
    enabled: String,
    #[serde(rename = "_token")]
    token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InboundNumberForm {
    inbound_number: String,
    #[serde(rename = "_token")]
    token: String,
}

/// Which confirm-only action a form posts to.
#[derive(Debug, Clone, Copy)]
enum LifecycleAction {
    Archive,
    Suspend,
    Resume,
}

impl LifecycleAction {
    fn title(self) -> &'static str {
        match self {
            Self::Archive => "Archive service",
            Self::Suspend => "Suspend service",
            Self::Resume => "Resume service",
        }
    }

    fn url(self, service_id: Uuid) -> String {
        match self {
            Self::Archive => urls::archive(service_id),
            Self::Suspend => urls::suspend(service_id),
            Self::Resume => urls::resume(service_id),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_service(state: &AppState, service_id: Uuid) -> Result<Service, Response> {
    match state.services().get(service_id).await {
        Ok(Some(service)) => Ok(service),
        Ok(None) => Err(AppError::NotFound.into_response()),
        Err(e) => Err(AppError::from(e).into_response()),
    }
}

/// Render the shared yes/no toggle form.
async fn render_toggle_form(
    state: &AppState,
    session: &Session,
    service: &Service,
    title: &str,
    current: bool,
    action: String,
) -> Response {
    let csrf_token = generate_csrf_token(session).await.unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("service", service);
    context.insert("title", title);
    context.insert("current", &current);
    context.insert("action", &action);
    context.insert("back", &urls::settings(service.id));
    context.insert("csrf_token", &csrf_token);

    render_admin_template(state, "service_settings/toggle.html", context).await
}

fn into_redirect(result: Result<String, AppError>) -> Response {
    match result {
        Ok(target) => redirect_found(&target),
        Err(e) => e.into_response(),
    }
}

// =============================================================================
// Settings page
// =============================================================================

/// Show a service's settings.
///
/// GET /services/{service_id}/settings
async fn settings_page(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    if !user.belongs_to_service(service_id) {
        return AppError::Forbidden.into_response();
    }

    let service = match load_service(&state, service_id).await {
        Ok(service) => service,
        Err(resp) => return resp,
    };

    let page = SettingsPage::build(&service, user.role());
    let rows: Vec<_> = page.visible_rows().cloned().collect();

    let mut context = tera::Context::new();
    context.insert("service", &page.service);
    context.insert("rows", &rows);
    context.insert("buttons", &page.buttons);
    context.insert("can_change", &page.can_change);
    context.insert("user", &user);

    render_admin_template(&state, "service_settings/settings.html", context).await
}

// =============================================================================
// Permission toggles
// =============================================================================

/// Show the form for one permission toggle.
///
/// GET /services/{service_id}/permissions/{permission}
async fn permission_form(
    State(state): State<AppState>,
    session: Session,
    Path((service_id, permission_name)): Path<(Uuid, String)>,
) -> Response {
    if let Err(resp) = require_platform_admin(&state, &session).await {
        return resp;
    }

    let permission = match mutator::parse_toggle(&permission_name) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let service = match load_service(&state, service_id).await {
        Ok(service) => service,
        Err(resp) => return resp,
    };

    render_toggle_form(
        &state,
        &session,
        &service,
        toggle_label(permission),
        service.has_permission(permission),
        urls::set_permission(service_id, permission),
    )
    .await
}

/// Set a permission on or off.
///
/// POST /services/{service_id}/permissions/{permission}
async fn permission_submit(
    State(state): State<AppState>,
    session: Session,
    Path((service_id, permission_name)): Path<(Uuid, String)>,
    form: Result<Form<ToggleForm>, FormRejection>,
) -> Response {
    let user = match require_platform_admin_to_change(&state, &session).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let form = match form_body(form) {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let enabled = match parse_form_bool(&form.enabled) {
        Ok(v) => v,
        Err(e) => return e.into_response(),
    };

    let result = mutator::set_permission(
        state.services(),
        service_id,
        &permission_name,
        enabled,
        &user,
    )
    .await;

    if let (Ok(_), Ok(permission)) = (&result, permission_name.parse::<Permission>()) {
        state.metrics().record_permission_change(permission, enabled);
    }

    into_redirect(result)
}

/// Show the document upload form.
///
/// GET /services/{service_id}/switch-upload-document
async fn upload_document_form(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
) -> Response {
    if let Err(resp) = require_platform_admin(&state, &session).await {
        return resp;
    }

    let service = match load_service(&state, service_id).await {
        Ok(service) => service,
        Err(resp) => return resp,
    };

    render_toggle_form(
        &state,
        &session,
        &service,
        toggle_label(Permission::UploadDocument),
        service.has_permission(Permission::UploadDocument),
        urls::switch_upload_document(service_id),
    )
    .await
}

/// Turn document uploads on or off.
///
/// POST /services/{service_id}/switch-upload-document
async fn upload_document_submit(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
    form: Result<Form<ToggleForm>, FormRejection>,
) -> Response {
    let user = match require_platform_admin_to_change(&state, &session).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let form = match form_body(form) {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let enabled = match parse_form_bool(&form.enabled) {
        Ok(v) => v,
        Err(e) => return e.into_response(),
    };

    let result =
        mutator::switch_upload_document(state.services(), service_id, enabled, &user).await;
    if result.is_ok() {
        state
            .metrics()
            .record_permission_change(Permission::UploadDocument, enabled);
    }

    into_redirect(result)
}

// =============================================================================
// Live / trial mode
// =============================================================================

/// Show the live/trial form.
///
/// GET /services/{service_id}/switch-live
async fn switch_live_form(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
) -> Response {
    if let Err(resp) = require_platform_admin(&state, &session).await {
        return resp;
    }

    let service = match load_service(&state, service_id).await {
        Ok(service) => service,
        Err(resp) => return resp,
    };

    render_toggle_form(
        &state,
        &session,
        &service,
        "Live",
        service.is_live(),
        urls::switch_live(service_id),
    )
    .await
}

/// Move the service between trial mode and live.
///
/// POST /services/{service_id}/switch-live
async fn switch_live_submit(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
    form: Result<Form<ToggleForm>, FormRejection>,
) -> Response {
    let user = match require_platform_admin_to_change(&state, &session).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let form = match form_body(form) {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let live = match parse_form_bool(&form.enabled) {
        Ok(v) => v,
        Err(e) => return e.into_response(),
    };

    into_redirect(mutator::switch_live(state.services(), service_id, live, &user).await)
}

// =============================================================================
// Inbound numbers
// =============================================================================

/// Show the available inbound numbers.
///
/// GET /services/{service_id}/set-inbound-number
async fn inbound_number_form(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
) -> Response {
    if let Err(resp) = require_platform_admin(&state, &session).await {
        return resp;
    }

    let service = match load_service(&state, service_id).await {
        Ok(service) => service,
        Err(resp) => return resp,
    };

    let numbers = match state.services().available_inbound_numbers().await {
        Ok(numbers) => numbers,
        Err(e) => return AppError::from(e).into_response(),
    };

    let csrf_token = generate_csrf_token(&session).await.unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("service", &service);
    context.insert("numbers", &numbers);
    context.insert("action", &urls::set_inbound_number(service_id));
    context.insert("back", &urls::settings(service_id));
    context.insert("csrf_token", &csrf_token);

    render_admin_template(&state, "service_settings/inbound_number.html", context).await
}

/// Assign an inbound number to the service.
///
/// POST /services/{service_id}/set-inbound-number
async fn inbound_number_submit(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
    form: Result<Form<InboundNumberForm>, FormRejection>,
) -> Response {
    let user = match require_platform_admin_to_change(&state, &session).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let form = match form_body(form) {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let Ok(inbound_number_id) = form.inbound_number.trim().parse::<Uuid>() else {
        return AppError::BadRequest("choose an inbound number".to_string()).into_response();
    };

    let result =
        mutator::assign_inbound_number(state.services(), service_id, inbound_number_id, &user)
            .await;
    if result.is_ok() {
        state
            .metrics()
            .record_permission_change(Permission::InboundSms, true);
    }

    into_redirect(result)
}

// =============================================================================
// Archive / suspend / resume
// =============================================================================

async fn lifecycle_form(
    state: AppState,
    session: Session,
    service_id: Uuid,
    action: LifecycleAction,
) -> Response {
    if let Err(resp) = require_platform_admin(&state, &session).await {
        return resp;
    }

    let service = match load_service(&state, service_id).await {
        Ok(service) => service,
        Err(resp) => return resp,
    };

    let csrf_token = generate_csrf_token(&session).await.unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("service", &service);
    context.insert("title", action.title());
    context.insert("action", &action.url(service_id));
    context.insert("back", &urls::settings(service_id));
    context.insert("csrf_token", &csrf_token);

    render_admin_template(&state, "service_settings/confirm.html", context).await
}

async fn lifecycle_submit(
    state: AppState,
    session: Session,
    service_id: Uuid,
    action: LifecycleAction,
    form: Result<Form<CsrfOnlyForm>, FormRejection>,
) -> Response {
    let user = match require_platform_admin_to_change(&state, &session).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let form = match form_body(form) {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let provider = state.services();
    let result = match action {
        LifecycleAction::Archive => mutator::archive(provider, service_id, &user).await,
        LifecycleAction::Suspend => mutator::suspend(provider, service_id, &user).await,
        LifecycleAction::Resume => mutator::resume(provider, service_id, &user).await,
    };

    into_redirect(result)
}

/// GET /services/{service_id}/archive
async fn archive_form(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
) -> Response {
    lifecycle_form(state, session, service_id, LifecycleAction::Archive).await
}

/// POST /services/{service_id}/archive
async fn archive_submit(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
    form: Result<Form<CsrfOnlyForm>, FormRejection>,
) -> Response {
    lifecycle_submit(state, session, service_id, LifecycleAction::Archive, form).await
}

/// GET /services/{service_id}/suspend
async fn suspend_form(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
) -> Response {
    lifecycle_form(state, session, service_id, LifecycleAction::Suspend).await
}

/// POST /services/{service_id}/suspend
async fn suspend_submit(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
    form: Result<Form<CsrfOnlyForm>, FormRejection>,
) -> Response {
    lifecycle_submit(state, session, service_id, LifecycleAction::Suspend, form).await
}

/// GET /services/{service_id}/resume
async fn resume_form(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
) -> Response {
    lifecycle_form(state, session, service_id, LifecycleAction::Resume).await
}

/// POST /services/{service_id}/resume
async fn resume_submit(
    State(state): State<AppState>,
    session: Session,
    Path(service_id): Path<Uuid>,
    form: Result<Form<CsrfOnlyForm>, FormRejection>,
) -> Response {
    lifecycle_submit(state, session, service_id, LifecycleAction::Resume, form).await
}

// =============================================================================
// Router
// =============================================================================

/// Create the service settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/services/{service_id}/settings", get(settings_page))
        .route(
            "/services/{service_id}/permissions/{permission}",
            get(permission_form).post(permission_submit),
        )
        .route(
            "/services/{service_id}/switch-upload-document",
            get(upload_document_form).post(upload_document_submit),
        )
        .route(
            "/services/{service_id}/switch-live",
            get(switch_live_form).post(switch_live_submit),
        )
        .route(
            "/services/{service_id}/set-inbound-number",
            get(inbound_number_form).post(inbound_number_submit),
        )
        .route(
            "/services/{service_id}/archive",
            get(archive_form).post(archive_submit),
        )
        .route(
            "/services/{service_id}/suspend",
            get(suspend_form).post(suspend_submit),
        )
        .route(
            "/services/{service_id}/resume",
            get(resume_form).post(resume_submit),
        )
}
