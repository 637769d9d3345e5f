//! In-memory user repository.

use crate::traits::UserRepository;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use userhub_core::{HubError, HubResult, NewUser, UserChanges, UserId, UserProfile};

#[derive(Debug, Clone)]
struct StoredUser {
    profile: UserProfile,
    password_hash: String,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<UserId, StoredUser>,
}

/// Map-backed repository with auto-incrementing ids and a unique email
/// constraint, mirroring the `users` table.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    state: Mutex<State>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored password hash for a user.
    #[must_use]
    pub fn password_hash(&self, id: UserId) -> Option<String> {
        self.state
            .lock()
            .users
            .get(&id)
            .map(|u| u.password_hash.clone())
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().users.len()
    }

    /// Returns true when no users are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn email_taken(state: &State, email: &str, except: Option<UserId>) -> bool {
    state
        .users
        .values()
        .any(|u| Some(u.profile.id) != except && u.profile.email.as_str() == email)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> HubResult<Option<UserProfile>> {
        Ok(self.state.lock().users.get(&id).map(|u| u.profile.clone()))
    }

    async fn find_all(&self) -> HubResult<Vec<UserProfile>> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .map(|u| u.profile.clone())
            .collect())
    }

    async fn exists_by_email(&self, email: &str) -> HubResult<bool> {
        let email = email.to_lowercase();
        Ok(email_taken(&self.state.lock(), &email, None))
    }

    async fn insert(&self, user: &NewUser) -> HubResult<UserProfile> {
        let mut state = self.state.lock();
        if email_taken(&state, user.email.as_str(), None) {
            return Err(HubError::duplicate_email());
        }

        state.next_id += 1;
        let now = Utc::now();
        let profile = UserProfile {
            id: UserId(state.next_id),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            profile.id,
            StoredUser {
                profile: profile.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(profile)
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> HubResult<Option<UserProfile>> {
        let mut state = self.state.lock();
        if let Some(email) = &changes.email {
            if email_taken(&state, email.as_str(), Some(id)) {
                return Err(HubError::duplicate_email());
            }
        }

        let Some(stored) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            stored.profile.name.clone_from(name);
        }
        if let Some(email) = &changes.email {
            stored.profile.email = email.clone();
        }
        if let Some(hash) = &changes.password_hash {
            stored.password_hash.clone_from(hash);
        }
        stored.profile.updated_at = Utc::now();
        Ok(Some(stored.profile.clone()))
    }

    async fn delete(&self, id: UserId) -> HubResult<bool> {
        Ok(self.state.lock().users.remove(&id).is_some())
    }
}
