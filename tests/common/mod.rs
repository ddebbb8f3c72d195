#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use kmci_api::audit::MemoryAuditSink;
use kmci_api::auth::{AuthService, Role};
use kmci_api::config::AppConfig;
use kmci_api::database::models::account::CreateUserInput;
use kmci_api::database::{MemoryAccountStore, MemoryHealth, MemoryProductStore};
use kmci_api::services::ProductService;
use kmci_api::{app, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

/// One seeded account per role.
pub struct SeededUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Full router over in-memory stores, plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub config: AppConfig,
    pub products: Arc<MemoryProductStore>,
    pub accounts: Arc<MemoryAccountStore>,
    pub health: Arc<MemoryHealth>,
    pub audit: Arc<MemoryAuditSink>,
    pub users: Vec<SeededUser>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 4;
        config.security.max_login_attempts = 3;
        config.api.enable_request_logging = false;

        let products = Arc::new(MemoryProductStore::new());
        let accounts = Arc::new(MemoryAccountStore::new());
        let health = Arc::new(MemoryHealth::default());
        let audit = Arc::new(MemoryAuditSink::new());

        let auth = AuthService::new(&config.security, accounts.clone())?;
        let mut users = Vec::new();
        for role in [Role::SuperAdmin, Role::Editor, Role::Finance, Role::Viewer] {
            let email = format!("{}@kmci.test", role.as_str().replace('_', "-"));
            let created = auth
                .create_user(CreateUserInput {
                    email: Some(email.clone()),
                    password: Some(PASSWORD.to_string()),
                    display_name: Some(format!("Test {}", role)),
                    role: Some(role.as_str().to_string()),
                })
                .await?;
            users.push(SeededUser { id: created.id, email, role });
        }

        let service = ProductService::new(products.clone(), audit.clone());
        let state = AppState::new(config.clone(), auth, service, health.clone());

        Ok(Self { router: app(state), config, products, accounts, health, audit, users })
    }

    pub fn user(&self, role: Role) -> &SeededUser {
        self.users.iter().find(|u| u.role == role).expect("every role is seeded")
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok(TestResponse { status, headers, body })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TestResponse> {
        self.request(Method::POST, "/auth/login", None, Some(json!({"email": email, "password": password})))
            .await
    }

    pub async fn token_for(&self, role: Role) -> Result<String> {
        let email = self.user(role).email.clone();
        let response = self.login(&email, PASSWORD).await?;
        anyhow::ensure!(response.status == StatusCode::OK, "login failed: {}", response.body);
        response.body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carries a token")
    }

    /// Creates a product as the seeded editor and returns its JSON.
    pub async fn create_product(&self, body: Value) -> Result<Value> {
        let token = self.token_for(Role::Editor).await?;
        let response = self.request(Method::POST, "/api/products", Some(&token), Some(body)).await?;
        anyhow::ensure!(response.status == StatusCode::CREATED, "create failed: {}", response.body);
        Ok(response.body["data"].clone())
    }
}

pub fn product_body(slug: &str) -> Value {
    json!({
        "title": format!("Product {}", slug),
        "slug": slug,
        "price": "19.99",
        "category": "apparel",
        "inventory_quantity": 10,
    })
}
