//! Cached identity of the signed-in user.

use std::sync::Arc;

use async_trait::async_trait;
use patchgate_domain::User;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiResult};
use crate::ports::{HttpClient, SessionListener};

/// Keeps the current user around so callers do not hit `/users/me` for
/// every check.
pub struct AuthSession<C: HttpClient> {
    api: Arc<ApiClient<C>>,
    user: RwLock<Option<User>>,
}

impl<C: HttpClient> AuthSession<C> {
    /// Creates a session with nothing cached.
    pub fn new(api: Arc<ApiClient<C>>) -> Self {
        Self {
            api,
            user: RwLock::new(None),
        }
    }

    /// Refetches the current user.
    ///
    /// Returns `Ok(None)` when the server says there is no session. Any
    /// failure clears the cache.
    ///
    /// # Errors
    ///
    /// Returns the API error for failures other than a missing session.
    pub async fn check_auth(&self) -> ApiResult<Option<User>> {
        match self.api.current_user().await {
            Ok(user) => {
                debug!(user_id = %user.id, "session confirmed");
                *self.user.write().await = Some(user.clone());
                Ok(Some(user))
            }
            Err(error) => {
                *self.user.write().await = None;
                if error.is_unauthenticated() {
                    debug!(%error, "no active session");
                    Ok(None)
                } else {
                    Err(error)
                }
            }
        }
    }

    /// The cached user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    /// Returns true if a user is cached.
    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// Forgets the cached user.
    pub async fn logout(&self) {
        info!("signed out");
        *self.user.write().await = None;
    }
}

#[async_trait]
impl<C: HttpClient> SessionListener for AuthSession<C> {
    async fn session_established(&self) {
        if let Err(error) = self.check_auth().await {
            warn!(%error, "could not load user after login");
        }
    }
}
