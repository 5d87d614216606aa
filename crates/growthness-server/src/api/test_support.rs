//! Router harness for handler tests: a fresh database per test and
//! `oneshot` requests against the full router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use growthness_core::token::{TokenConfig, issue_reset_token, issue_token};
use growthness_db::models::User;
use growthness_test_utils::{
    StubGenerator, create_test_db, create_user_with_password, drop_test_db, sample_plan,
};

use crate::serve_cmd::{AppState, build_router};

/// Password of every user made by [`TestApp::user`].
pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub pool: PgPool,
    pub generator: Arc<StubGenerator>,
    tokens: TokenConfig,
    router: Router,
    db_name: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    /// Parsed body; `Null` when the body is empty.
    pub json: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_generator(StubGenerator::returning(sample_plan())).await
    }

    pub async fn with_generator(generator: StubGenerator) -> Self {
        let (pool, db_name) = create_test_db().await;
        let tokens = TokenConfig::new(vec![7u8; 32], chrono::Duration::hours(1));
        let generator = Arc::new(generator);
        let state = AppState {
            pool: pool.clone(),
            tokens: tokens.clone(),
            generator: generator.clone(),
        };
        Self {
            pool,
            generator,
            tokens,
            router: build_router(state),
            db_name,
        }
    }

    /// Insert a user with [`PASSWORD`] and return it with a valid token.
    pub async fn user(&self, email: &str) -> (User, String) {
        let user = create_user_with_password(&self.pool, email, PASSWORD).await;
        let token = issue_token(&self.tokens, user.id, Utc::now()).token;
        (user, token)
    }

    /// The token a reset link for `user` would carry right now.
    pub fn reset_token(&self, user: &User) -> String {
        issue_reset_token(&self.tokens, user.id, user.password_hash.as_deref(), Utc::now()).token
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, json }
    }

    pub async fn finish(self) {
        drop(self.router);
        self.pool.close().await;
        drop_test_db(&self.db_name).await;
    }
}
