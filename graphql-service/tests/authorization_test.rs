//! Field-level authorization as seen by API clients.

mod common;

use common::{error_code, TestApp};
use graphql_service::models::RoleType;
use serde_json::json;

const USERS: &str = r#"
    query($limit: Int!) {
        users(limit: $limit) { id username }
    }
"#;

const USER_BY_ID: &str = r#"
    query($id: Int!) {
        user(userId: $id) { id profile { phoneNumber } }
    }
"#;

const USER_PROVIDERS: &str = r#"
    query($id: Int!) {
        user(userId: $id) { id authenticationProviders { email providerType } }
    }
"#;

const GRANT_ROLE: &str = r#"
    mutation($id: Int!, $role: RoleType!) {
        grantRole(userId: $id, role: $role)
    }
"#;

#[tokio::test]
async fn anonymous_callers_are_unauthenticated() {
    let app = TestApp::spawn();

    let body = app.graphql("query { user { id } }", json!({}), None).await;

    assert_eq!(error_code(&body), Some("UNAUTHENTICATED"));
    assert_eq!(body["errors"][0]["message"], "Authentication is required");
    assert_eq!(body["errors"][0]["path"], json!(["user"]));
}

#[tokio::test]
async fn expired_or_forged_tokens_are_treated_as_anonymous() {
    let app = TestApp::spawn();

    let body = app
        .graphql("query { user { id } }", json!({}), Some("not.a.jwt"))
        .await;

    assert_eq!(error_code(&body), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn listing_users_needs_organization_membership() {
    let app = TestApp::spawn();
    let (_, user_token) = app.register("plain@example.com", "password123").await;
    let member_token = app.token_for(500, &[RoleType::OrganizationMember]);

    let denied = app
        .graphql(USERS, json!({ "limit": 10 }), Some(&user_token))
        .await;
    let allowed = app
        .graphql(USERS, json!({ "limit": 10 }), Some(&member_token))
        .await;

    assert_eq!(error_code(&denied), Some("INSUFFICIENT_ROLE"));
    assert!(allowed.get("errors").is_none(), "{}", allowed);
    assert_eq!(allowed["data"]["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn users_limit_is_range_checked() {
    let app = TestApp::spawn();
    let token = app.token_for(500, &[RoleType::SuperAdmin]);

    for (limit, accepted) in [(0, false), (1, true), (100, true), (101, false)] {
        let body = app
            .graphql(USERS, json!({ "limit": limit }), Some(&token))
            .await;
        if accepted {
            assert!(body.get("errors").is_none(), "limit {}: {}", limit, body);
        } else {
            assert_eq!(error_code(&body), Some("VALIDATION_FAILED"), "limit {}", limit);
            assert_eq!(
                body["errors"][0]["message"],
                "Requires a value between 1 and 100"
            );
        }
    }
}

#[tokio::test]
async fn owners_see_their_own_profile() {
    let app = TestApp::spawn();
    let (user_id, token) = app.register("me@example.com", "password123").await;

    let body = app
        .graphql(USER_BY_ID, json!({ "id": user_id }), Some(&token))
        .await;

    assert!(body.get("errors").is_none(), "{}", body);
    assert_eq!(body["data"]["user"]["profile"]["phoneNumber"], "09012345678");
}

#[tokio::test]
async fn other_users_profile_is_withheld_but_siblings_resolve() {
    let app = TestApp::spawn();
    let (owner_id, _) = app.register("owner@example.com", "password123").await;
    let (_, other_token) = app.register("other@example.com", "password123").await;

    let body = app
        .graphql(USER_BY_ID, json!({ "id": owner_id }), Some(&other_token))
        .await;

    assert_eq!(error_code(&body), Some("NOT_OWNER"));
    assert_eq!(body["errors"][0]["path"], json!(["user", "profile"]));
    assert_eq!(body["data"]["user"]["id"], owner_id);
    assert!(body["data"]["user"]["profile"].is_null());
}

#[tokio::test]
async fn providers_are_visible_to_owner_and_admins_only() {
    let app = TestApp::spawn();
    let (owner_id, owner_token) = app.register("owner@example.com", "password123").await;
    let member_token = app.token_for(500, &[RoleType::OrganizationMember]);
    let admin_token = app.token_for(501, &[RoleType::OrganizationAdmin]);

    let as_owner = app
        .graphql(USER_PROVIDERS, json!({ "id": owner_id }), Some(&owner_token))
        .await;
    let as_member = app
        .graphql(USER_PROVIDERS, json!({ "id": owner_id }), Some(&member_token))
        .await;
    let as_admin = app
        .graphql(USER_PROVIDERS, json!({ "id": owner_id }), Some(&admin_token))
        .await;

    assert!(as_owner.get("errors").is_none(), "{}", as_owner);
    assert_eq!(error_code(&as_member), Some("NOT_OWNER"));
    assert!(as_admin.get("errors").is_none(), "{}", as_admin);
    assert_eq!(
        as_admin["data"]["user"]["authenticationProviders"][0]["email"],
        "owner@example.com"
    );
    assert_eq!(
        as_admin["data"]["user"]["authenticationProviders"][0]["providerType"],
        "email"
    );
}

#[tokio::test]
async fn grant_role_needs_an_admin() {
    let app = TestApp::spawn();
    let (user_id, user_token) = app.register("target@example.com", "password123").await;

    let body = app
        .graphql(
            GRANT_ROLE,
            json!({ "id": user_id, "role": "ORGANIZATION_MEMBER" }),
            Some(&user_token),
        )
        .await;

    assert_eq!(error_code(&body), Some("INSUFFICIENT_ROLE"));
}

#[tokio::test]
async fn granted_roles_apply_from_the_next_sign_in() {
    let app = TestApp::spawn();
    let (user_id, old_token) = app.register("target@example.com", "password123").await;
    let admin_token = app.token_for(501, &[RoleType::OrganizationAdmin]);

    let granted = app
        .graphql(
            GRANT_ROLE,
            json!({ "id": user_id, "role": "ORGANIZATION_MEMBER" }),
            Some(&admin_token),
        )
        .await;
    assert!(granted.get("errors").is_none(), "{}", granted);
    let roles = granted["data"]["grantRole"].as_array().unwrap();
    assert!(roles.contains(&json!("ORGANIZATION_MEMBER")));
    assert!(roles.contains(&json!("USER")));

    // The old token still carries only USER.
    let denied = app
        .graphql(USERS, json!({ "limit": 5 }), Some(&old_token))
        .await;
    assert_eq!(error_code(&denied), Some("INSUFFICIENT_ROLE"));

    let login = app
        .graphql(
            r#"mutation { authUser(input: { email: "target@example.com", password: "password123" }) { token } }"#,
            json!({}),
            None,
        )
        .await;
    let new_token = login["data"]["authUser"]["token"].as_str().unwrap();
    let allowed = app
        .graphql(USERS, json!({ "limit": 5 }), Some(new_token))
        .await;
    assert!(allowed.get("errors").is_none(), "{}", allowed);
}

#[tokio::test]
async fn admins_cannot_grant_above_their_own_rank() {
    let app = TestApp::spawn();
    let (user_id, _) = app.register("target@example.com", "password123").await;
    let admin_token = app.token_for(501, &[RoleType::OrganizationAdmin]);

    let body = app
        .graphql(
            GRANT_ROLE,
            json!({ "id": user_id, "role": "SUPER_ADMIN" }),
            Some(&admin_token),
        )
        .await;

    assert_eq!(error_code(&body), Some("INSUFFICIENT_ROLE"));
}

#[tokio::test]
async fn authorization_messages_are_localized() {
    let app = TestApp::spawn();

    let body = app
        .graphql_request("/query", "query { user { id } }", json!({}), None, Some("ja"))
        .await;

    assert_eq!(body["errors"][0]["message"], "ログインが必要です");
}

#[tokio::test]
async fn user_lists_load_nested_fields_in_one_batch() {
    let app = TestApp::spawn();
    let mut ids = Vec::new();
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        ids.push(app.register(email, "password123").await.0);
    }
    let admin_token = app.token_for(900, &[RoleType::SuperAdmin]);
    let role_batches_before = app.store.batches("roles").len();

    let body = app
        .graphql(
            "query { users(limit: 10) { id authenticationProviders { email } roles } }",
            json!({}),
            Some(&admin_token),
        )
        .await;

    assert!(body.get("errors").is_none(), "{}", body);
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[1]["authenticationProviders"][0]["email"], "b@example.com");
    assert_eq!(users[2]["roles"], json!(["USER"]));

    ids.sort_unstable();
    assert_eq!(app.store.batches("providers"), vec![ids.clone()]);
    let role_batches = app.store.batches("roles");
    assert_eq!(role_batches.len(), role_batches_before + 1);
    assert_eq!(role_batches.last(), Some(&ids));
}
