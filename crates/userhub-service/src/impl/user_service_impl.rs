//! User service implementation.

use crate::cache::{cache_keys, CacheExt, CacheInterface, DEFAULT_TTL};
use crate::dto::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse};
use crate::user_service::UserService;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use userhub_core::{Email, HubError, HubResult, NewUser, UserChanges, UserId, ValidateExt};
use userhub_repository::UserRepository;
use userhub_security::PasswordHasherInterface;

/// User service with cache-aside reads and invalidation after every write.
///
/// Invalidation runs after the store write commits. A cache failure at that
/// point fails the request even though the write is already durable.
pub struct UserServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasherInterface>,
    cache: Arc<dyn CacheInterface>,
    cache_ttl: Duration,
}

impl UserServiceImpl {
    /// Creates a new user service using [`DEFAULT_TTL`] for cache entries.
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasherInterface>,
        cache: Arc<dyn CacheInterface>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            cache,
            cache_ttl: DEFAULT_TTL,
        }
    }

    /// Overrides the cache entry lifetime.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    async fn invalidate(&self, id: UserId) -> HubResult<()> {
        for key in cache_keys::invalidated_by_write(id) {
            self.cache.delete(&key).await?;
        }
        debug!("Invalidated cache entries for user: {}", id);
        Ok(())
    }
}

fn parse_email(raw: &str) -> HubResult<Email> {
    Email::new(raw).map_err(|e| HubError::Validation(e.to_string()))
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create(&self, request: CreateUserRequest) -> HubResult<UserResponse> {
        debug!("Creating user: {}", request.email);

        request.validate_request()?;

        let email = parse_email(&request.email)?;

        if self.user_repository.exists_by_email(email.as_str()).await? {
            return Err(HubError::duplicate_email());
        }

        let password_hash = self.password_hasher.hash(&request.password)?;

        let saved_user = self
            .user_repository
            .insert(&NewUser {
                name: request.name,
                email,
                password_hash,
            })
            .await?;

        self.invalidate(saved_user.id).await?;

        info!("User created: {}", saved_user.id);
        Ok(UserResponse::from(saved_user))
    }

    async fn find_all(&self) -> HubResult<Vec<UserResponse>> {
        debug!("Listing users");

        self.cache
            .get_or_set(cache_keys::ALL_USERS, self.cache_ttl, || async {
                let users = self.user_repository.find_all().await?;
                Ok(users.into_iter().map(UserResponse::from).collect::<Vec<_>>())
            })
            .await
    }

    async fn find_one(&self, id: UserId) -> HubResult<Option<UserResponse>> {
        debug!("Getting user: {}", id);

        let cache_key = cache_keys::user_by_id(id);

        if let Some(cached) = self.cache.get::<UserResponse>(&cache_key).await? {
            debug!("Cache hit for user: {}", id);
            return Ok(Some(cached));
        }

        let Some(user) = self.user_repository.find_by_id(id).await? else {
            debug!("User not found: {}", id);
            return Ok(None);
        };

        let response = UserResponse::from(user);
        self.cache.set(&cache_key, &response, self.cache_ttl).await?;

        Ok(Some(response))
    }

    async fn update(&self, id: UserId, request: UpdateUserRequest) -> HubResult<UserResponse> {
        debug!("Updating user: {}", id);

        request.validate_request()?;

        let current = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| HubError::not_found("User", id))?;

        let email = request.email.as_deref().map(parse_email).transpose()?;
        if let Some(email) = &email {
            if *email != current.email && self.user_repository.exists_by_email(email.as_str()).await? {
                return Err(HubError::duplicate_email());
            }
        }

        let password_hash = request
            .password
            .as_deref()
            .map(|password| self.password_hasher.hash(password))
            .transpose()?;

        let changes = UserChanges {
            name: request.name,
            email,
            password_hash,
        };

        let updated_user = self
            .user_repository
            .update(id, &changes)
            .await?
            .ok_or_else(|| HubError::not_found("User", id))?;

        self.invalidate(id).await?;

        info!("User updated: {}", id);
        Ok(UserResponse::from(updated_user))
    }

    async fn remove(&self, id: UserId) -> HubResult<MessageResponse> {
        debug!("Deleting user: {}", id);

        if self.user_repository.find_by_id(id).await?.is_none() {
            return Err(HubError::not_found("User", id));
        }

        // A concurrent delete can win between the read and this call.
        if !self.user_repository.delete(id).await? {
            return Err(HubError::not_found("User", id));
        }

        self.invalidate(id).await?;

        info!("User deleted: {}", id);
        Ok(MessageResponse::user_deleted(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use mockall::mock;
    use parking_lot::Mutex;
    use userhub_core::UserProfile;
    use userhub_repository::InMemoryUserRepository;
    use userhub_security::PasswordHasher;

    mock! {
        pub Repo {}

        #[async_trait]
        impl UserRepository for Repo {
            async fn find_by_id(&self, id: UserId) -> HubResult<Option<UserProfile>>;
            async fn find_all(&self) -> HubResult<Vec<UserProfile>>;
            async fn exists_by_email(&self, email: &str) -> HubResult<bool>;
            async fn insert(&self, user: &NewUser) -> HubResult<UserProfile>;
            async fn update(&self, id: UserId, changes: &UserChanges) -> HubResult<Option<UserProfile>>;
            async fn delete(&self, id: UserId) -> HubResult<bool>;
        }
    }

    /// Memory cache that records every deleted key.
    #[derive(Default)]
    struct RecordingCache {
        inner: MemoryCache,
        deleted: Mutex<Vec<String>>,
    }

    impl RecordingCache {
        fn deleted(&self) -> Vec<String> {
            self.deleted.lock().clone()
        }
    }

    #[async_trait]
    impl CacheInterface for RecordingCache {
        async fn get_raw(&self, key: &str) -> HubResult<Option<String>> {
            self.inner.get_raw(key).await
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> HubResult<()> {
            self.inner.set_raw(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> HubResult<bool> {
            self.deleted.lock().push(key.to_string());
            self.inner.delete(key).await
        }

        async fn close(&self) {
            self.inner.close().await;
        }
    }

    /// Cache whose backend is unreachable.
    struct DownCache;

    #[async_trait]
    impl CacheInterface for DownCache {
        async fn get_raw(&self, _key: &str) -> HubResult<Option<String>> {
            Err(HubError::cache("connection refused"))
        }

        async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) -> HubResult<()> {
            Err(HubError::cache("connection refused"))
        }

        async fn delete(&self, _key: &str) -> HubResult<bool> {
            Err(HubError::cache("connection refused"))
        }

        async fn close(&self) {}
    }

    struct Fixture {
        service: UserServiceImpl,
        repo: Arc<InMemoryUserRepository>,
        cache: Arc<RecordingCache>,
        hasher: Arc<PasswordHasher>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryUserRepository::new());
        let cache = Arc::new(RecordingCache::default());
        let hasher = Arc::new(PasswordHasher::with_cost(1));
        let service = UserServiceImpl::new(repo.clone(), hasher.clone(), cache.clone());
        Fixture {
            service,
            repo,
            cache,
            hasher,
        }
    }

    fn create_request(name: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: Email::new_unchecked(email),
            password_hash: "hashed_password".to_string(),
        }
    }

    // =============================================================================
    // create
    // =============================================================================

    #[tokio::test]
    async fn test_create_user_success() {
        let f = fixture();

        let user = f
            .service
            .create(create_request("Test User", "test@example.com"))
            .await
            .unwrap();

        assert_eq!(user.name, "Test User");
        assert_eq!(user.email, "test@example.com");

        let stored = f.repo.password_hash(user.id).unwrap();
        assert_ne!(stored, "password123");
        assert!(f.hasher.verify("password123", &stored).unwrap());
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() {
        let f = fixture();
        let user = f
            .service
            .create(create_request("Test User", "Test@Example.COM"))
            .await
            .unwrap();
        assert_eq!(user.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let f = fixture();
        f.service
            .create(create_request("First", "test@example.com"))
            .await
            .unwrap();

        let result = f
            .service
            .create(create_request("Second", "TEST@example.com"))
            .await;

        match result.unwrap_err() {
            HubError::Conflict(msg) => assert!(msg.contains("already exists")),
            other => panic!("Expected Conflict error, got {other:?}"),
        }
        assert_eq!(f.repo.len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_invalid_input() {
        let f = fixture();
        let request = CreateUserRequest {
            name: String::new(),
            email: "nope".to_string(),
            password: "123".to_string(),
        };

        let err = f.service.create(request).await.unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
        assert!(f.repo.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_invalidates_list_and_entity() {
        let f = fixture();
        f.service.find_all().await.unwrap();
        assert!(f.cache.get_raw(cache_keys::ALL_USERS).await.unwrap().is_some());

        let user = f
            .service
            .create(create_request("Test User", "test@example.com"))
            .await
            .unwrap();

        let deleted = f.cache.deleted();
        assert!(deleted.contains(&cache_keys::ALL_USERS.to_string()));
        assert!(deleted.contains(&cache_keys::user_by_id(user.id)));
        assert!(f.cache.get_raw(cache_keys::ALL_USERS).await.unwrap().is_none());
    }

    // =============================================================================
    // reads
    // =============================================================================

    #[tokio::test]
    async fn test_find_all_is_served_from_cache() {
        let f = fixture();
        f.service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();

        assert_eq!(f.service.find_all().await.unwrap().len(), 1);

        // Written behind the service's back, so the cached list is not invalidated.
        f.repo.insert(&new_user("B", "b@example.com")).await.unwrap();
        assert_eq!(f.service.find_all().await.unwrap().len(), 1);

        // A write through the service drops the stale list.
        f.service
            .create(create_request("C", "c@example.com"))
            .await
            .unwrap();
        assert_eq!(f.service.find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_one_caches_result() {
        let f = fixture();
        let created = f
            .service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();

        let found = f.service.find_one(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);

        let cached = f
            .cache
            .get_raw(&cache_keys::user_by_id(created.id))
            .await
            .unwrap()
            .unwrap();
        assert!(cached.contains("a@example.com"));
        assert!(!cached.contains("password"));
    }

    #[tokio::test]
    async fn test_find_one_missing_is_none_and_not_cached() {
        let f = fixture();
        assert!(f.service.find_one(UserId(999)).await.unwrap().is_none());
        assert!(f.cache.inner.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_cache_entry_is_reloaded() {
        let f = fixture();
        let created = f
            .service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();
        let key = cache_keys::user_by_id(created.id);
        f.cache
            .set_raw(&key, "{\"id\":\"garbage\"", DEFAULT_TTL)
            .await
            .unwrap();

        let found = f.service.find_one(created.id).await.unwrap().unwrap();
        assert_eq!(found.email, "a@example.com");

        let repaired: Option<UserResponse> = f.cache.get(&key).await.unwrap();
        assert_eq!(repaired, Some(found));
    }

    // =============================================================================
    // update
    // =============================================================================

    #[tokio::test]
    async fn test_update_name_only() {
        let f = fixture();
        let created = f
            .service
            .create(create_request("Test User", "test@example.com"))
            .await
            .unwrap();
        f.service.find_one(created.id).await.unwrap();

        let request = UpdateUserRequest {
            name: Some("Updated Name".to_string()),
            ..UpdateUserRequest::default()
        };
        let updated = f.service.update(created.id, request).await.unwrap();

        assert_eq!(updated.name, "Updated Name");
        assert_eq!(updated.email, "test@example.com");

        let reread = f.service.find_one(created.id).await.unwrap().unwrap();
        assert_eq!(reread.name, "Updated Name");
    }

    #[tokio::test]
    async fn test_update_invalidates_both_keys() {
        let f = fixture();
        let created = f
            .service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();
        f.service.find_all().await.unwrap();
        f.service.find_one(created.id).await.unwrap();

        let request = UpdateUserRequest {
            name: Some("B".to_string()),
            ..UpdateUserRequest::default()
        };
        f.service.update(created.id, request).await.unwrap();

        let list = f.service.find_all().await.unwrap();
        assert_eq!(list[0].name, "B");
        assert!(f
            .cache
            .deleted()
            .ends_with(&cache_keys::invalidated_by_write(created.id)));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let f = fixture();
        let request = UpdateUserRequest {
            name: Some("Nobody".to_string()),
            ..UpdateUserRequest::default()
        };
        let err = f.service.update(UserId(42), request).await.unwrap_err();
        assert!(matches!(err, HubError::NotFound { .. }));
        assert!(f.cache.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_fields() {
        let f = fixture();
        let created = f
            .service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();
        let request = UpdateUserRequest {
            password: Some("123".to_string()),
            ..UpdateUserRequest::default()
        };
        let err = f.service.update(created.id, request).await.unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_email_taken_by_other_user() {
        let f = fixture();
        f.service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();
        let b = f
            .service
            .create(create_request("B", "b@example.com"))
            .await
            .unwrap();

        let request = UpdateUserRequest {
            email: Some("a@example.com".to_string()),
            ..UpdateUserRequest::default()
        };
        let err = f.service.update(b.id, request).await.unwrap_err();
        assert!(matches!(err, HubError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_same_email_is_allowed() {
        let f = fixture();
        let a = f
            .service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();

        let request = UpdateUserRequest {
            email: Some("A@EXAMPLE.COM".to_string()),
            ..UpdateUserRequest::default()
        };
        let updated = f.service.update(a.id, request).await.unwrap();
        assert_eq!(updated.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_update_password_rehashes() {
        let f = fixture();
        let a = f
            .service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();
        let before = f.repo.password_hash(a.id).unwrap();

        let request = UpdateUserRequest {
            password: Some("new-secret".to_string()),
            ..UpdateUserRequest::default()
        };
        f.service.update(a.id, request).await.unwrap();

        let after = f.repo.password_hash(a.id).unwrap();
        assert_ne!(before, after);
        assert!(f.hasher.verify("new-secret", &after).unwrap());
    }

    // =============================================================================
    // remove
    // =============================================================================

    #[tokio::test]
    async fn test_remove_user() {
        let f = fixture();
        let created = f
            .service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap();
        f.service.find_one(created.id).await.unwrap();
        f.service.find_all().await.unwrap();

        let message = f.service.remove(created.id).await.unwrap();
        assert_eq!(message.message, format!("User {} deleted", created.id));

        assert!(f.service.find_one(created.id).await.unwrap().is_none());
        assert!(f.service.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_user() {
        let f = fixture();
        let err = f.service.remove(UserId(7)).await.unwrap_err();
        assert_eq!(err.to_string(), "User with ID 7 not found");
    }

    // =============================================================================
    // failure propagation
    // =============================================================================

    fn service_with(repo: MockRepo, cache: Arc<dyn CacheInterface>) -> UserServiceImpl {
        UserServiceImpl::new(Arc::new(repo), Arc::new(PasswordHasher::with_cost(1)), cache)
    }

    #[tokio::test]
    async fn test_store_failure_propagates_on_read() {
        let mut repo = MockRepo::new();
        repo.expect_find_all()
            .times(1)
            .returning(|| Err(HubError::Database("connection reset".to_string())));

        let service = service_with(repo, Arc::new(MemoryCache::new()));
        let err = service.find_all().await.unwrap_err();
        assert!(matches!(err, HubError::Database(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates_on_write() {
        let mut repo = MockRepo::new();
        repo.expect_exists_by_email().returning(|_| Ok(false));
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(HubError::Database("disk full".to_string())));

        let cache = Arc::new(RecordingCache::default());
        let service = service_with(repo, cache.clone());
        let err = service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, HubError::Database(_)));
        assert!(cache.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_insert_race_on_email_is_conflict() {
        let mut repo = MockRepo::new();
        repo.expect_exists_by_email().returning(|_| Ok(false));
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(HubError::duplicate_email()));

        let cache = Arc::new(RecordingCache::default());
        let service = service_with(repo, cache.clone());
        let err = service
            .create(create_request("A", "a@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Conflict: Email already exists");
        assert!(cache.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_cache_failure_propagates() {
        let mut repo = MockRepo::new();
        repo.expect_find_by_id().never();

        let service = service_with(repo, Arc::new(DownCache));
        let err = service.find_one(UserId(1)).await.unwrap_err();
        assert!(matches!(err, HubError::Cache(_)));
    }

    #[tokio::test]
    async fn test_custom_ttl_is_used() {
        let f = fixture();
        let service = UserServiceImpl::new(f.repo.clone(), f.hasher.clone(), f.cache.clone())
            .with_cache_ttl(Duration::from_millis(20));
        f.repo.insert(&new_user("A", "a@example.com")).await.unwrap();

        service.find_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(f.cache.get_raw(cache_keys::ALL_USERS).await.unwrap().is_none());
    }
}
