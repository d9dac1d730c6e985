//! Shared route helpers for page rendering and access checks.

use axum::Form;
use axum::extract::rejection::FormRejection;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::csrf::verify_csrf_token;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::settings::mutator;
use crate::state::AppState;

/// Session key for the signed-in user's id.
pub const SESSION_USER_ID: &str = "user_id";

/// Form body carrying only the CSRF token.
#[derive(Debug, Default, Deserialize)]
pub struct CsrfOnlyForm {
    #[serde(rename = "_token", default)]
    pub token: String,
}

/// `302 Found` to `target`.
pub fn redirect_found(target: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, target.to_string())]).into_response()
}

/// Require a signed-in user, or redirect to sign in.
///
/// Returns the [`User`] if the session holds the id of a known user.
pub async fn require_login(state: &AppState, session: &Session) -> Result<User, Response> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();

    if let Some(id) = user_id {
        match state.users().get_user(id).await {
            Ok(Some(user)) => return Ok(user),
            Ok(None) => {
                tracing::debug!(user_id = %id, "session user no longer exists");
            }
            Err(e) => return Err(AppError::from(e).into_response()),
        }
    }

    Err(redirect_found(state.sign_in_url()))
}

/// Require a signed-in **platform admin**, or redirect/reject.
///
/// Redirects to sign in if there is no session user. Returns 403 if the user
/// exists but is not a platform admin.
pub async fn require_platform_admin(state: &AppState, session: &Session) -> Result<User, Response> {
    let user = require_login(state, session).await?;
    mutator::authorize(&user).map_err(IntoResponse::into_response)?;
    Ok(user)
}

/// [`require_platform_admin`] for POST handlers.
///
/// A refused submission is counted in the forbidden-changes metric; refused
/// form views are not.
pub async fn require_platform_admin_to_change(
    state: &AppState,
    session: &Session,
) -> Result<User, Response> {
    let user = require_login(state, session).await?;

    if let Err(e) = mutator::authorize(&user) {
        state.metrics().record_forbidden();
        return Err(e.into_response());
    }

    Ok(user)
}

/// Unwrap a form body extracted as `Result`, turning a rejection into a 400.
///
/// Call after the admin check, so a non-admin gets 403 whatever the body.
pub fn form_body<T>(form: Result<Form<T>, FormRejection>) -> Result<T, Response> {
    match form {
        Ok(Form(form)) => Ok(form),
        Err(rejection) => {
            tracing::debug!(status = %rejection.status(), "rejected form body");
            Err(AppError::BadRequest(rejection.body_text()).into_response())
        }
    }
}

/// Verify the submitted CSRF token, or reject with 403.
pub async fn require_csrf(session: &Session, token: &str) -> Result<(), Response> {
    match verify_csrf_token(session, token).await {
        Ok(true) => Ok(()),
        Ok(false) => Err((StatusCode::FORBIDDEN, Html("Invalid form token")).into_response()),
        Err(e) => {
            tracing::debug!(error = %e, "CSRF check failed");
            Err((StatusCode::FORBIDDEN, Html("Invalid form token")).into_response())
        }
    }
}

/// Parse a `True`/`False` form value.
pub fn parse_form_bool(value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AppError::BadRequest(format!(
            "expected True or False, got {value:?}"
        ))),
    }
}

/// Render an admin page template.
///
/// A template failure becomes a 500 page rather than a panic.
pub async fn render_admin_template(
    state: &AppState,
    template: &str,
    context: tera::Context,
) -> Response {
    match state.theme().render(template, &context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, template = %template, "failed to render template");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!(
                    r#"<!DOCTYPE html>
<html><head><title>Error</title></head>
<body><h1>Template Error</h1><pre>{}</pre></body></html>"#,
                    html_escape(&format!("{e:#}"))
                )),
            )
                .into_response()
        }
    }
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
