//! Shared helpers for router tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use userhub_config::ServerConfig;
use userhub_core::{
    HealthCheck, HealthStatus, HubError, HubResult, NewUser, UserChanges, UserId, UserProfile,
};
use userhub_repository::{InMemoryUserRepository, UserRepository};
use userhub_rest::{create_router, AppState};
use userhub_security::PasswordHasher;
use userhub_service::{
    CreateUserRequest, MemoryCache, MessageResponse, UpdateUserRequest, UserResponse, UserService,
    UserServiceImpl,
};

/// Router wired to in-memory store and cache.
pub fn app() -> Router {
    app_with_repository(Arc::new(InMemoryUserRepository::new()))
}

/// Router whose email pre-check always passes, so duplicates are only
/// caught by the store's unique constraint.
pub fn racy_app() -> Router {
    app_with_repository(Arc::new(RacyRepository(InMemoryUserRepository::new())))
}

fn app_with_repository(repository: Arc<dyn UserRepository>) -> Router {
    let cache = Arc::new(MemoryCache::new());
    let service = UserServiceImpl::new(
        repository,
        Arc::new(PasswordHasher::with_cost(1)),
        cache.clone(),
    );
    let state = AppState::new(Arc::new(service)).with_health_check(cache);
    create_router(state, &ServerConfig::default())
}

/// Router whose service and health checks fail with backend errors.
pub fn broken_app() -> Router {
    let state = AppState::new(Arc::new(BrokenUserService)).with_health_check(Arc::new(DownCheck));
    create_router(state, &ServerConfig::default())
}

/// Sends one request through a clone of the router.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (u16, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    read(response).await
}

/// Sends a raw body with a JSON content type.
pub async fn send_raw(app: &Router, method: &str, uri: &str, body: &str) -> (u16, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    read(response).await
}

async fn read(response: Response<Body>) -> (u16, Value) {
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Store where a concurrent writer always claims the email between the
/// service's check and its write.
struct RacyRepository(InMemoryUserRepository);

#[async_trait]
impl UserRepository for RacyRepository {
    async fn find_by_id(&self, id: UserId) -> HubResult<Option<UserProfile>> {
        self.0.find_by_id(id).await
    }

    async fn find_all(&self) -> HubResult<Vec<UserProfile>> {
        self.0.find_all().await
    }

    async fn exists_by_email(&self, _email: &str) -> HubResult<bool> {
        Ok(false)
    }

    async fn insert(&self, user: &NewUser) -> HubResult<UserProfile> {
        self.0.insert(user).await
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> HubResult<Option<UserProfile>> {
        self.0.update(id, changes).await
    }

    async fn delete(&self, id: UserId) -> HubResult<bool> {
        self.0.delete(id).await
    }
}

struct BrokenUserService;

fn backend_down() -> HubError {
    HubError::Database("Connection refused (os error 111) at 10.0.0.7:3306".to_string())
}

#[async_trait]
impl UserService for BrokenUserService {
    async fn create(&self, _request: CreateUserRequest) -> HubResult<UserResponse> {
        Err(backend_down())
    }

    async fn find_all(&self) -> HubResult<Vec<UserResponse>> {
        Err(backend_down())
    }

    async fn find_one(&self, _id: UserId) -> HubResult<Option<UserResponse>> {
        Err(HubError::cache("READONLY You can't write against a read only replica"))
    }

    async fn update(&self, _id: UserId, _request: UpdateUserRequest) -> HubResult<UserResponse> {
        Err(backend_down())
    }

    async fn remove(&self, _id: UserId) -> HubResult<MessageResponse> {
        Err(backend_down())
    }
}

struct DownCheck;

#[async_trait]
impl HealthCheck for DownCheck {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        HealthStatus::Unhealthy("Connection refused".to_string())
    }
}
