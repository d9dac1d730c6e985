#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the service settings page and its toggle forms.

mod common;

use axum::http::StatusCode;
use uuid::Uuid;

use common::{TestApp, button_labels, change_link_count, row_text, row_texts};
use notify_admin_kernel::models::Permission;
use notify_admin_test_utils::{
    RecordedCall, active_user_with_permissions, assert, inbound_number, platform_admin_user,
    service_one, test_service,
};

fn settings_path(service_id: Uuid) -> String {
    format!("/services/{service_id}/settings")
}

fn permission_path(service_id: Uuid, permission: &str) -> String {
    format!("/services/{service_id}/permissions/{permission}")
}

async fn admin_settings_page(app: &TestApp, service_id: Uuid) -> String {
    let cookies = app.login(&platform_admin_user()).await;
    let page = app.get(&settings_path(service_id), &cookies).await;
    assert_eq!(page.status, StatusCode::OK, "{}", page.body);
    page.body
}

// =============================================================================
// Access
// =============================================================================

#[tokio::test]
async fn test_anonymous_is_sent_to_sign_in() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());

    let response = app.get(&settings_path(service_id), "").await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location.as_deref(), Some(common::SIGN_IN_URL));
}

#[tokio::test]
async fn test_team_member_can_view_settings() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&active_user_with_permissions(service_id)).await;

    let page = app.get(&settings_path(service_id), &cookies).await;

    assert_eq!(page.status, StatusCode::OK);
    assert::contains(&page.body, "service one");
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&active_user_with_permissions(Uuid::new_v4())).await;

    let page = app.get(&settings_path(service_id), &cookies).await;

    assert_eq!(page.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_service_is_not_found() {
    let app = TestApp::new();
    let cookies = app.login(&platform_admin_user()).await;

    let page = app.get(&settings_path(Uuid::new_v4()), &cookies).await;

    assert_eq!(page.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Settings page rendering
// =============================================================================

#[tokio::test]
async fn test_live_row_follows_restricted() {
    let app = TestApp::new();
    let trial = app.add_service(service_one().build());
    let live = app.add_service(service_one().live().build());

    let body = admin_settings_page(&app, trial).await;
    assert_eq!(row_text(&body, "Live").as_deref(), Some("Live Off Change"));

    let body = admin_settings_page(&app, live).await;
    assert_eq!(row_text(&body, "Live").as_deref(), Some("Live On Change"));
}

#[tokio::test]
async fn test_precompiled_row_needs_letter() {
    let app = TestApp::new();
    let without_letter = app.add_service(
        service_one()
            .with_permission(Permission::PrecompiledLetter)
            .build(),
    );

    let body = admin_settings_page(&app, without_letter).await;
    assert!(row_text(&body, "Send precompiled letters").is_none());
}

#[tokio::test]
async fn test_precompiled_row_on_with_letter() {
    let app = TestApp::new();
    let service_id = app.add_service(
        test_service("letters")
            .with_permissions(&[Permission::Letter, Permission::PrecompiledLetter])
            .build(),
    );

    let body = admin_settings_page(&app, service_id).await;
    assert_eq!(
        row_text(&body, "Send precompiled letters").as_deref(),
        Some("Send precompiled letters On Change")
    );
}

#[tokio::test]
async fn test_inbound_row_needs_sms() {
    let app = TestApp::new();
    let service_id = app.add_service(
        test_service("email only")
            .with_permissions(&[Permission::Email, Permission::InboundSms])
            .build(),
    );

    let body = admin_settings_page(&app, service_id).await;
    assert!(row_text(&body, "Receive inbound SMS").is_none());
}

#[tokio::test]
async fn test_inbound_row_links_to_number_picker_while_off() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());

    let body = admin_settings_page(&app, service_id).await;
    assert_eq!(
        row_text(&body, "Receive inbound SMS").as_deref(),
        Some("Receive inbound SMS Off Change")
    );
    assert::contains(
        &body,
        &format!(r#"href="/services/{service_id}/set-inbound-number""#),
    );
}

#[tokio::test]
async fn test_row_order() {
    let app = TestApp::new();
    let service_id = app.add_service(
        service_one()
            .with_permission(Permission::Letter)
            .build(),
    );

    let body = admin_settings_page(&app, service_id).await;
    let labels: Vec<String> = row_texts(&body)
        .into_iter()
        .map(|row| {
            row.trim_end_matches(" Change")
                .rsplit_once(' ')
                .map(|(label, _)| label.to_string())
                .unwrap()
        })
        .collect();

    assert_eq!(
        labels,
        vec![
            "Live",
            "Send precompiled letters",
            "Uploading documents",
            "Receive inbound SMS",
            "Email authentication",
            "Edit folder permissions",
        ]
    );
}

#[tokio::test]
async fn test_active_service_buttons() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());

    let body = admin_settings_page(&app, service_id).await;
    assert_eq!(
        button_labels(&body),
        vec!["Archive service", "Suspend service"]
    );
}

#[tokio::test]
async fn test_inactive_service_buttons() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().inactive().build());

    let body = admin_settings_page(&app, service_id).await;
    assert_eq!(button_labels(&body), vec!["Resume service"]);
}

#[tokio::test]
async fn test_team_member_sees_no_actions() {
    let app = TestApp::new();
    let service_id = app.add_service(
        service_one()
            .with_permissions(&[
                Permission::Email,
                Permission::Sms,
                Permission::Letter,
                Permission::InboundSms,
            ])
            .build(),
    );
    let cookies = app.login(&active_user_with_permissions(service_id)).await;

    let page = app.get(&settings_path(service_id), &cookies).await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(button_labels(&page.body).is_empty());
    assert_eq!(change_link_count(&page.body), 0);
    assert_eq!(
        row_text(&page.body, "Live").as_deref(),
        Some("Live Off")
    );
    assert_eq!(
        row_text(&page.body, "Receive inbound SMS").as_deref(),
        Some("Receive inbound SMS On")
    );
}

// =============================================================================
// Permission mutations
// =============================================================================

#[tokio::test]
async fn test_non_admin_cannot_set_permission() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&active_user_with_permissions(service_id)).await;

    let response = app
        .post_form(
            &permission_path(service_id, "upload_document"),
            &cookies,
            &[("enabled", "True"), ("_token", "not-a-real-token")],
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.calls_for(service_id).is_empty());
    assert!(
        !app.service(service_id)
            .await
            .has_permission(Permission::UploadDocument)
    );
}

#[tokio::test]
async fn test_non_admin_json_post_is_forbidden() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&active_user_with_permissions(service_id)).await;

    for path in [
        permission_path(service_id, "upload_document"),
        format!("/services/{service_id}/switch-live"),
        format!("/services/{service_id}/archive"),
    ] {
        let response = app
            .post_body(&path, &cookies, "application/json", r#"{"enabled": true}"#)
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
    }

    assert!(app.calls_for(service_id).is_empty());
}

#[tokio::test]
async fn test_admin_json_post_is_bad_request() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .post_body(
            &permission_path(service_id, "upload_document"),
            &cookies,
            "application/json",
            r#"{"enabled": true}"#,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.calls_for(service_id).is_empty());
}

#[tokio::test]
async fn test_non_admin_cannot_open_permission_form() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&active_user_with_permissions(service_id)).await;

    let response = app
        .get(&permission_path(service_id, "inbound_sms"), &cookies)
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_turns_inbound_sms_on() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .submit_form(
            &permission_path(service_id, "inbound_sms"),
            &cookies,
            &[("enabled", "True")],
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location.as_deref(),
        Some(settings_path(service_id).as_str())
    );
    assert_eq!(
        app.calls_for(service_id),
        vec![RecordedCall::ForcePermission {
            service_id,
            permission: Permission::InboundSms,
            on: true,
        }]
    );
}

#[tokio::test]
async fn test_admin_sets_each_toggle_to_each_value() {
    for permission in Permission::PLATFORM_ADMIN_TOGGLES {
        for (value, on) in [("True", true), ("False", false)] {
            let app = TestApp::new();
            let service_id = app.add_service(service_one().build());
            let cookies = app.login(&platform_admin_user()).await;

            let response = app
                .submit_form(
                    &permission_path(service_id, permission.as_str()),
                    &cookies,
                    &[("enabled", value)],
                )
                .await;

            assert_eq!(response.status, StatusCode::FOUND, "{permission} {value}");
            assert_eq!(
                response.location.as_deref(),
                Some(settings_path(service_id).as_str())
            );
            assert_eq!(
                app.calls_for(service_id),
                vec![RecordedCall::ForcePermission {
                    service_id,
                    permission,
                    on,
                }],
                "{permission} {value}"
            );
            assert_eq!(
                app.service(service_id).await.has_permission(permission),
                on
            );
        }
    }
}

#[tokio::test]
async fn test_setting_permission_twice_is_idempotent() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;
    let path = permission_path(service_id, "email_auth");

    for _ in 0..2 {
        let response = app.submit_form(&path, &cookies, &[("enabled", "True")]).await;
        assert_eq!(response.status, StatusCode::FOUND);
    }

    let service = app.service(service_id).await;
    assert!(service.has_permission(Permission::EmailAuth));
    assert_eq!(service.permissions.len(), 3);
}

#[tokio::test]
async fn test_unknown_permission_is_not_found() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    for name in ["teleport", "sms", "email"] {
        let response = app
            .get(&permission_path(service_id, name), &cookies)
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{name}");
    }
}

#[tokio::test]
async fn test_missing_csrf_token_is_forbidden() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .post_form(
            &permission_path(service_id, "inbound_sms"),
            &cookies,
            &[("enabled", "True")],
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.calls_for(service_id).is_empty());
}

#[tokio::test]
async fn test_malformed_enabled_is_bad_request() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .submit_form(
            &permission_path(service_id, "inbound_sms"),
            &cookies,
            &[("enabled", "maybe")],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.calls_for(service_id).is_empty());
}

#[tokio::test]
async fn test_permission_form_reflects_current_value() {
    let app = TestApp::new();
    let service_id = app.add_service(
        service_one()
            .with_permission(Permission::EditFolderPermissions)
            .build(),
    );
    let cookies = app.login(&platform_admin_user()).await;

    let page = app
        .get(
            &permission_path(service_id, "edit_folder_permissions"),
            &cookies,
        )
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert::contains(&page.body, "Edit folder permissions");
    assert::contains(&page.body, r#"value="True" checked"#);
    assert::not_contains(&page.body, r#"value="False" checked"#);
}

// =============================================================================
// Other toggles
// =============================================================================

#[tokio::test]
async fn test_switch_upload_document() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .submit_form(
            &format!("/services/{service_id}/switch-upload-document"),
            &cookies,
            &[("enabled", "True")],
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        app.calls_for(service_id),
        vec![RecordedCall::ForcePermission {
            service_id,
            permission: Permission::UploadDocument,
            on: true,
        }]
    );

    let body = admin_settings_page(&app, service_id).await;
    assert_eq!(
        row_text(&body, "Uploading documents").as_deref(),
        Some("Uploading documents On Change")
    );
}

#[tokio::test]
async fn test_switch_live() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .submit_form(
            &format!("/services/{service_id}/switch-live"),
            &cookies,
            &[("enabled", "True")],
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        app.calls_for(service_id),
        vec![RecordedCall::SetRestricted {
            service_id,
            restricted: false,
        }]
    );
    assert!(app.service(service_id).await.is_live());
}

#[tokio::test]
async fn test_suspend_then_resume() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .submit_form(&format!("/services/{service_id}/suspend"), &cookies, &[])
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert!(!app.service(service_id).await.active);

    let body = admin_settings_page(&app, service_id).await;
    assert_eq!(button_labels(&body), vec!["Resume service"]);

    let response = app
        .submit_form(&format!("/services/{service_id}/resume"), &cookies, &[])
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert!(app.service(service_id).await.active);

    assert_eq!(
        app.calls_for(service_id),
        vec![
            RecordedCall::Suspend(service_id),
            RecordedCall::Resume(service_id)
        ]
    );
}

#[tokio::test]
async fn test_archive_inactive_service_is_bad_request() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().inactive().build());
    let cookies = app.login(&platform_admin_user()).await;

    let response = app
        .submit_form(&format!("/services/{service_id}/archive"), &cookies, &[])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.calls_for(service_id).is_empty());
}

#[tokio::test]
async fn test_non_admin_cannot_archive() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&active_user_with_permissions(service_id)).await;

    let response = app
        .post_form(
            &format!("/services/{service_id}/archive"),
            &cookies,
            &[("_token", "whatever")],
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.service(service_id).await.active);
}

#[tokio::test]
async fn test_set_inbound_number() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let number = inbound_number("07700900123");
    app.store.insert_inbound_number(number.clone());
    let cookies = app.login(&platform_admin_user()).await;
    let path = format!("/services/{service_id}/set-inbound-number");

    let page = app.get(&path, &cookies).await;
    assert::contains(&page.body, "07700900123");

    let number_id = number.id.to_string();
    let response = app
        .submit_form(&path, &cookies, &[("inbound_number", number_id.as_str())])
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        app.calls_for(service_id),
        vec![
            RecordedCall::AssignInboundNumber {
                service_id,
                inbound_number_id: number.id,
            },
            RecordedCall::ForcePermission {
                service_id,
                permission: Permission::InboundSms,
                on: true,
            },
        ]
    );

    assert_eq!(
        app.store
            .inbound_number_for_service(service_id)
            .map(|n| n.id),
        Some(number.id)
    );

    let body = admin_settings_page(&app, service_id).await;
    assert_eq!(
        row_text(&body, "Receive inbound SMS").as_deref(),
        Some("Receive inbound SMS On Change")
    );
    assert::contains(&body, &format!(r#"href="{}""#, permission_path(service_id, "inbound_sms")));
}

#[tokio::test]
async fn test_set_inbound_number_without_sms() {
    let app = TestApp::new();
    let service_id = app.add_service(
        test_service("email only")
            .with_permission(Permission::Email)
            .build(),
    );
    let number = inbound_number("07700900456");
    app.store.insert_inbound_number(number.clone());
    let cookies = app.login(&platform_admin_user()).await;

    let number_id = number.id.to_string();
    let response = app
        .submit_form(
            &format!("/services/{service_id}/set-inbound-number"),
            &cookies,
            &[("inbound_number", number_id.as_str())],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.calls_for(service_id).is_empty());
}

#[tokio::test]
async fn test_no_inbound_numbers_available() {
    let app = TestApp::new();
    let service_id = app.add_service(service_one().build());
    let cookies = app.login(&platform_admin_user()).await;

    let page = app
        .get(&format!("/services/{service_id}/set-inbound-number"), &cookies)
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert::contains(&page.body, "No available inbound numbers");
}
