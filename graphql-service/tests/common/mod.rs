//! Test harness for graphql-service integration tests.
//!
//! Drives the full router with `oneshot` over the in-memory store and mailer.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use graphql_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, I18nConfig, JwtConfig, MailConfig, PasswordResetConfig,
        RateLimitConfig, SecurityConfig, ServiceConfig,
    },
    models::RoleType,
    services::{Mail, MockEmailService, MockStore},
    AppState,
};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const RESET_URL: &str = "https://app.example.com/password/reset";

const CREATE_USER: &str = r#"
    mutation($input: CreateUserInput!) {
        createUser(input: $input) { id token }
    }
"#;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MockStore>,
    pub mailer: Arc<MockEmailService>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        Self::with_mailer(config, MockEmailService::new())
    }

    pub fn with_mailer(config: ServiceConfig, mailer: MockEmailService) -> Self {
        let store = Arc::new(MockStore::new());
        let mailer = Arc::new(mailer);
        let metrics = PrometheusBuilder::new().build_recorder().handle();

        let state = AppState::new(config, store.clone(), mailer.clone(), metrics)
            .expect("Failed to build app state");
        let router = build_router(state.clone());

        TestApp {
            router,
            state,
            store,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST a GraphQL operation and return the decoded response body.
    pub async fn graphql(&self, query: &str, variables: Value, token: Option<&str>) -> Value {
        self.graphql_request("/query", query, variables, token, None)
            .await
    }

    pub async fn graphql_request(
        &self,
        uri: &str,
        query: &str,
        variables: Value,
        token: Option<&str>,
        accept_language: Option<&str>,
    ) -> Value {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(lang) = accept_language {
            builder = builder.header(header::ACCEPT_LANGUAGE, lang);
        }
        let body = json!({ "query": query, "variables": variables }).to_string();

        let response = self.send(builder.body(Body::from(body)).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    /// Register through the API and return `(user_id, token)`.
    pub async fn register(&self, email: &str, password: &str) -> (i64, String) {
        let body = self
            .graphql(
                CREATE_USER,
                json!({
                    "input": {
                        "email": email,
                        "password": password,
                        "firstName": "Pat",
                        "lastName": "Doe",
                        "phoneNumber": "09012345678"
                    }
                }),
                None,
            )
            .await;
        assert!(body.get("errors").is_none(), "createUser failed: {}", body);

        let id = body["data"]["createUser"]["id"]
            .as_i64()
            .expect("createUser returned no id");
        let token = body["data"]["createUser"]["token"]
            .as_str()
            .expect("createUser returned no token")
            .to_string();
        (id, token)
    }

    /// Sign a token directly, bypassing the role table.
    pub fn token_for(&self, user_id: i64, roles: &[RoleType]) -> String {
        self.state
            .jwt
            .issue(user_id, roles)
            .expect("Failed to issue token")
            .token
    }

    pub fn sent_mail(&self) -> Vec<Mail> {
        self.mailer.sent()
    }

    /// Token carried by the reset link of the most recent mail. Mail goes
    /// out on a spawned task, so this waits for the first delivery.
    pub async fn last_reset_token(&self) -> String {
        let mail = self
            .mailer
            .wait_for(1)
            .await
            .pop()
            .expect("No mail was sent");
        let marker = format!("{}?token=", RESET_URL);
        let start = mail
            .text_body
            .find(&marker)
            .expect("Mail has no reset link")
            + marker.len();
        mail.text_body[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// First error's `extensions.code`, if any.
pub fn error_code(body: &Value) -> Option<&str> {
    body["errors"][0]["extensions"]["code"].as_str()
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "graphql-service-test".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://localhost/graphql_service_test".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new("integration-test-secret-0123456789abcdef".to_string()),
            token_lifetime_hours: 24,
        },
        mail: MailConfig {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: Secret::new(String::new()),
            from: "no-reply@example.com".to_string(),
        },
        password_reset: PasswordResetConfig {
            token_ttl_hours: 24,
            reset_url: RESET_URL.to_string(),
        },
        i18n: I18nConfig {
            default_locale: "en".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            graphql_attempts: 1000,
            graphql_window_seconds: 60,
        },
    }
}
