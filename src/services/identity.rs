//! Local user identity, persisted under the "user" key.

use crate::error::{AppError, Result};
use crate::services::local_store::{LocalStore, USER_KEY};
use crate::types::StoredUser;
use tracing::info;

#[derive(Clone)]
pub struct LocalIdentity {
    store: LocalStore,
}

impl LocalIdentity {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Create and persist a local user.
    pub fn login(&self, email: &str, name: Option<&str>) -> Result<StoredUser> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::BadRequest(format!("invalid email: {:?}", email)));
        }

        let user = StoredUser::local(email, name);
        self.store.set(USER_KEY, &user)?;
        info!("Local user signed in: {}", user.email);
        Ok(user)
    }

    /// The stored user, if any. A corrupt record is dropped.
    pub fn current(&self) -> Option<StoredUser> {
        self.store.get(USER_KEY)
    }

    pub fn logout(&self) {
        self.store.remove(USER_KEY);
        info!("Local user signed out");
    }
}
