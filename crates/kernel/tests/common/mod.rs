#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! This module provides test infrastructure that uses the REAL kernel code,
//! not mock implementations: the real router, middleware, templates and
//! session layer. Records live in a fresh [`MemoryProvider`] per [`TestApp`],
//! wrapped in a [`RecordingServiceProvider`] so tests can assert on exactly
//! which mutations a request issued.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_sessions::Session;
use uuid::Uuid;

use notify_admin_kernel::AppState;
use notify_admin_kernel::models::{Service, User};
use notify_admin_kernel::provider::MemoryProvider;
use notify_admin_kernel::routes::helpers::SESSION_USER_ID;
use notify_admin_kernel::server::{RouteTable, build_app};
use notify_admin_kernel::session::{CookieOptions, create_memory_session_layer};
use notify_admin_kernel::theme::ThemeEngine;
use notify_admin_test_utils::{RecordedCall, RecordingServiceProvider};

/// Sign-in URL the test app redirects anonymous visitors to.
pub const SIGN_IN_URL: &str = "/sign-in";

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryProvider>,
    pub recorder: Arc<RecordingServiceProvider>,
    pub state: AppState,
}

/// Status, redirect target and body of a response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl TestApp {
    /// Create a new test application with an empty in-memory store.
    pub fn new() -> Self {
        // Tests run from crates/kernel/, so templates are two levels up
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        let templates_dir = std::path::Path::new(&manifest_dir)
            .parent() // crates/
            .and_then(|p| p.parent()) // project root
            .unwrap_or(std::path::Path::new("."))
            .join("templates");

        let theme = ThemeEngine::new(&templates_dir).expect("Failed to load templates");

        let store = Arc::new(MemoryProvider::new());
        let recorder = Arc::new(RecordingServiceProvider::new(store.clone()));
        let state = AppState::with_providers(recorder.clone(), store.clone(), theme, SIGN_IN_URL);

        // Same route groups as main.rs, plus a login shortcut
        let routes = RouteTable::standard().group(
            "test_login",
            Router::new().route("/test/login/{user_id}", get(test_login)),
        );

        let router = build_app(
            state.clone(),
            routes,
            create_memory_session_layer(CookieOptions::new("lax", false)),
            CorsLayer::new(),
        );

        Self {
            router,
            store,
            recorder,
            state,
        }
    }

    /// Add a service to the store and return its id.
    pub fn add_service(&self, service: Service) -> Uuid {
        let id = service.id;
        self.store.insert_service(service);
        id
    }

    /// Current snapshot of a service.
    pub async fn service(&self, service_id: Uuid) -> Service {
        use notify_admin_kernel::provider::ServiceRecordProvider;
        self.store
            .get(service_id)
            .await
            .unwrap()
            .expect("service should exist")
    }

    /// Mutations issued against `service_id` so far.
    pub fn calls_for(&self, service_id: Uuid) -> Vec<RecordedCall> {
        self.recorder.calls_for(service_id)
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Store `user` and sign them in, returning the session cookies.
    pub async fn login(&self, user: &User) -> String {
        self.store.insert_user(user.clone());

        let response = self
            .request(
                Request::get(format!("/test/login/{}", user.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        extract_cookies(&response)
    }

    /// GET `path` with the given session cookies.
    pub async fn get(&self, path: &str, cookies: &str) -> TestResponse {
        let mut request = Request::get(path).body(Body::empty()).unwrap();
        with_cookies(&mut request, cookies);
        read(self.request(request).await).await
    }

    /// POST a urlencoded form to `path`.
    pub async fn post_form(&self, path: &str, cookies: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();

        self.post_body(path, cookies, "application/x-www-form-urlencoded", body)
            .await
    }

    /// POST a raw body with an explicit content type.
    pub async fn post_body(
        &self,
        path: &str,
        cookies: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> TestResponse {
        let mut request = Request::post(path)
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap();
        with_cookies(&mut request, cookies);
        read(self.request(request).await).await
    }

    /// Render the form at `path` and return its CSRF token.
    pub async fn csrf_token(&self, path: &str, cookies: &str) -> String {
        let page = self.get(path, cookies).await;
        assert_eq!(page.status, StatusCode::OK, "form page {path} failed: {}", page.body);
        extract_csrf_token(&page.body).expect("form should carry a CSRF token")
    }

    /// Render the form at `path`, then submit it with `fields`.
    pub async fn submit_form(
        &self,
        path: &str,
        cookies: &str,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let token = self.csrf_token(path, cookies).await;
        let mut fields = fields.to_vec();
        fields.push(("_token", token.as_str()));
        self.post_form(path, cookies, &fields).await
    }
}

async fn test_login(session: Session, Path(user_id): Path<Uuid>) -> StatusCode {
    session.insert(SESSION_USER_ID, user_id).await.unwrap();
    StatusCode::NO_CONTENT
}

fn with_cookies(request: &mut Request<Body>, cookies: &str) {
    if !cookies.is_empty() {
        request.headers_mut().insert(
            header::COOKIE,
            cookies.parse().expect("Invalid cookie header"),
        );
    }
}

async fn read(response: Response) -> TestResponse {
    let status = response.status();
    let header_str = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let location = header_str(header::LOCATION);
    let content_type = header_str(header::CONTENT_TYPE);

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    TestResponse {
        status,
        location,
        content_type,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Extract Set-Cookie headers from a response for use in subsequent requests.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            // Extract just the cookie name=value, ignoring attributes
            cookie.split(';').next()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Pull the hidden `_token` value out of a rendered form.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let marker = r#"name="_token" value=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// Strip tags and collapse whitespace.
fn text_content(html: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of every settings table row, e.g. `Live Off Change`.
pub fn row_texts(html: &str) -> Vec<String> {
    html.split(r#"<tr class="table-row">"#)
        .skip(1)
        .filter_map(|chunk| chunk.split("</tr>").next())
        .map(text_content)
        .collect()
}

/// Text of the settings row starting with `label`.
pub fn row_text(html: &str, label: &str) -> Option<String> {
    row_texts(html)
        .into_iter()
        .find(|row| row.starts_with(&format!("{label} ")))
}

/// Labels of every `<a class="button">` on the page.
pub fn button_labels(html: &str) -> Vec<String> {
    html.split(r#"<a class="button""#)
        .skip(1)
        .filter_map(|chunk| {
            let start = chunk.find('>')? + 1;
            let end = chunk.find("</a>")?;
            Some(chunk[start..end].trim().to_string())
        })
        .collect()
}

/// Number of "Change" links on the page.
pub fn change_link_count(html: &str) -> usize {
    html.matches(">Change</a>").count()
}
