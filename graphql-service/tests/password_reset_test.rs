//! Password reset flow over the GraphQL endpoint.

mod common;

use common::{error_code, TestApp};
use graphql_service::models::PasswordResetStatus;
use graphql_service::services::{AccountStore, MockEmailService};
use graphql_service::utils::{verify_password, Password, PasswordHashString};
use serde_json::json;

const REQUEST_RESET: &str = r#"
    mutation($input: RequestPasswordResetInput!) {
        requestPasswordReset(input: $input) { id status expiresAt }
    }
"#;

const VALIDATE_RESET: &str = r#"
    mutation($input: ValidatePasswordResetInput!) {
        validatePasswordReset(input: $input) { id status }
    }
"#;

const COMPLETE_RESET: &str = r#"
    mutation($input: CompletePasswordResetInput!) {
        completePasswordReset(input: $input) { id userId email }
    }
"#;

async fn request_reset(app: &TestApp, email: &str) -> serde_json::Value {
    app.graphql(REQUEST_RESET, json!({ "input": { "email": email } }), None)
        .await
}

async fn validate_reset(app: &TestApp, token: &str) -> serde_json::Value {
    app.graphql(VALIDATE_RESET, json!({ "input": { "token": token } }), None)
        .await
}

async fn complete_reset(app: &TestApp, token: &str, password: &str) -> serde_json::Value {
    app.graphql(
        COMPLETE_RESET,
        json!({ "input": { "token": token, "newPassword": password } }),
        None,
    )
    .await
}

#[tokio::test]
async fn full_reset_flow_changes_password_once() {
    // Arrange
    let app = TestApp::spawn();
    let (user_id, _) = app.register("user@example.com", "oldpass123").await;
    let before = app
        .store
        .find_email_provider("user@example.com")
        .await
        .unwrap()
        .unwrap();

    // Act: request
    let body = request_reset(&app, "user@example.com").await;
    assert!(body.get("errors").is_none(), "{}", body);
    assert_eq!(body["data"]["requestPasswordReset"]["status"], "SENT");
    let token = app.last_reset_token().await;
    assert_eq!(token.len(), 64);

    // Act: verify
    let body = validate_reset(&app, &token).await;
    assert!(body.get("errors").is_none(), "{}", body);
    assert_eq!(body["data"]["validatePasswordReset"]["status"], "VERIFIED");

    // Act: complete
    let body = complete_reset(&app, &token, "newpass123").await;
    assert!(body.get("errors").is_none(), "{}", body);
    assert_eq!(body["data"]["completePasswordReset"]["userId"], user_id);
    assert_eq!(
        body["data"]["completePasswordReset"]["email"],
        "user@example.com"
    );

    // Assert: hash changed and the new password verifies
    let after = app
        .store
        .find_email_provider("user@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(after.provider_password, before.provider_password);
    assert!(verify_password(
        &Password::new("newpass123"),
        &PasswordHashString::new(after.provider_password.clone())
    )
    .is_ok());

    // Assert: the token is spent
    let body = complete_reset(&app, &token, "newpass123").await;
    assert_eq!(error_code(&body), Some("VERIFIED_TOKEN_NOT_FOUND"));
    assert_eq!(
        app.store.password_resets()[0].status(),
        Some(PasswordResetStatus::Completed)
    );

    // Assert: the new password signs in
    let body = app
        .graphql(
            r#"mutation { authUser(input: { email: "user@example.com", password: "newpass123" }) { id } }"#,
            json!({}),
            None,
        )
        .await;
    assert_eq!(body["data"]["authUser"]["id"], user_id);
}

#[tokio::test]
async fn reset_never_exposes_the_token() {
    let app = TestApp::spawn();
    app.register("user@example.com", "oldpass123").await;

    let body = app
        .graphql(
            r#"mutation { requestPasswordReset(input: { email: "user@example.com" }) { passwordResetToken } }"#,
            json!({}),
            None,
        )
        .await;

    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("passwordResetToken"));
    assert!(app.store.password_resets().is_empty());
}

#[tokio::test]
async fn unknown_email_is_not_found_and_creates_no_row() {
    let app = TestApp::spawn();

    let body = request_reset(&app, "nobody@example.com").await;

    assert_eq!(error_code(&body), Some("NOT_FOUND"));
    assert_eq!(
        body["errors"][0]["message"],
        "The specified email is not found"
    );
    assert!(body["data"].is_null());
    assert!(app.store.password_resets().is_empty());
    assert!(app.sent_mail().is_empty());
}

#[tokio::test]
async fn verifying_twice_fails_the_second_time() {
    let app = TestApp::spawn();
    app.register("user@example.com", "oldpass123").await;
    request_reset(&app, "user@example.com").await;
    let token = app.last_reset_token().await;

    let first = validate_reset(&app, &token).await;
    let second = validate_reset(&app, &token).await;

    assert!(first.get("errors").is_none(), "{}", first);
    assert_eq!(error_code(&second), Some("INVALID_OR_EXPIRED_TOKEN"));
}

#[tokio::test]
async fn completing_an_unverified_token_fails() {
    let app = TestApp::spawn();
    app.register("user@example.com", "oldpass123").await;
    request_reset(&app, "user@example.com").await;
    let token = app.last_reset_token().await;

    let body = complete_reset(&app, &token, "newpass123").await;

    assert_eq!(error_code(&body), Some("VERIFIED_TOKEN_NOT_FOUND"));
    assert_eq!(
        app.store.password_resets()[0].status(),
        Some(PasswordResetStatus::Sent)
    );
}

#[tokio::test]
async fn new_password_length_boundaries() {
    let app = TestApp::spawn();
    let token = "a".repeat(64);

    for (password, accepted) in [
        ("x".repeat(5), false),
        ("x".repeat(6), true),
        ("x".repeat(1024), true),
        ("x".repeat(1025), false),
    ] {
        let body = complete_reset(&app, &token, &password).await;
        let code = error_code(&body);
        if accepted {
            // Passes validation and reaches the token lookup.
            assert_eq!(code, Some("VERIFIED_TOKEN_NOT_FOUND"), "len {}", password.len());
        } else {
            assert_eq!(code, Some("VALIDATION_FAILED"), "len {}", password.len());
            assert!(body["errors"][0]["extensions"]["fields"]["new_password"].is_string());
        }
    }
}

#[tokio::test]
async fn validation_errors_are_reported_together() {
    let app = TestApp::spawn();

    let body = complete_reset(&app, "short", "").await;

    assert_eq!(error_code(&body), Some("VALIDATION_FAILED"));
    let fields = &body["errors"][0]["extensions"]["fields"];
    assert_eq!(fields["token"], "Token: Requires 10 to 100 characters");
    assert_eq!(fields["new_password"], "New password: cannot be blank");
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn errors_follow_the_negotiated_locale() {
    let app = TestApp::spawn();

    let body = app
        .graphql_request(
            "/query",
            REQUEST_RESET,
            json!({ "input": { "email": "nobody@example.com" } }),
            None,
            Some("ja-JP,ja;q=0.9"),
        )
        .await;
    assert_eq!(
        body["errors"][0]["message"],
        "指定されたメールアドレスは見つかりません"
    );

    let body = app
        .graphql_request(
            "/query?lang=en",
            REQUEST_RESET,
            json!({ "input": { "email": "nobody@example.com" } }),
            None,
            Some("ja"),
        )
        .await;
    assert_eq!(
        body["errors"][0]["message"],
        "The specified email is not found"
    );
}

#[tokio::test]
async fn mail_failure_still_creates_the_reset() {
    let app = TestApp::with_mailer(common::test_config(), MockEmailService::failing());
    app.register("user@example.com", "oldpass123").await;

    let body = request_reset(&app, "user@example.com").await;

    assert!(body.get("errors").is_none(), "{}", body);
    assert_eq!(body["data"]["requestPasswordReset"]["status"], "SENT");
    assert_eq!(app.store.password_resets().len(), 1);
    assert!(app.mailer.wait_for(1).await.is_empty());
}

#[tokio::test]
async fn completion_mail_is_delivered_in_the_background() {
    let app = TestApp::spawn();
    app.register("user@example.com", "oldpass123").await;
    request_reset(&app, "user@example.com").await;
    let token = app.last_reset_token().await;
    validate_reset(&app, &token).await;

    let body = complete_reset(&app, &token, "newpass123").await;

    assert!(body.get("errors").is_none(), "{}", body);
    let sent = app.mailer.wait_for(2).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].recipient, "user@example.com");
    assert_eq!(sent[1].subject, "Password reset complete");
}
