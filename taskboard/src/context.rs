//! Explicit session context for the authenticated user.
//!
//! Authentication itself happens elsewhere. Whoever performs it calls
//! [`SessionContext::init`] with the resulting user and hands a clone of
//! the context to every board session; [`SessionContext::teardown`] ends
//! the lifecycle for all of them at once.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use taskboard_proto::task::OwnerId;

/// The signed-in user as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Provider uid; becomes the owner id of every task the user creates.
    pub uid: String,
    /// Name shown in the UI.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a user with no display name.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Owner id derived from the uid.
    #[must_use]
    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.uid.clone())
    }
}

/// Shared handle to the current user. Clones observe the same lifecycle.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Arc<RwLock<Option<AuthenticatedUser>>>,
}

impl SessionContext {
    /// Creates an inactive context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that is already initialised with `user`.
    #[must_use]
    pub fn signed_in(user: AuthenticatedUser) -> Self {
        let context = Self::new();
        context.init(user);
        context
    }

    /// Starts (or restarts) the lifecycle for `user`.
    pub fn init(&self, user: AuthenticatedUser) {
        tracing::info!(uid = %user.uid, "session context initialised");
        *self.user.write() = Some(user);
    }

    /// Ends the lifecycle. Subsequent owner lookups return `None`.
    pub fn teardown(&self) {
        if let Some(user) = self.user.write().take() {
            tracing::info!(uid = %user.uid, "session context torn down");
        }
    }

    /// Owner id of the current user, if signed in.
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        self.user.read().as_ref().map(AuthenticatedUser::owner_id)
    }

    /// The current user, if signed in.
    #[must_use]
    pub fn user(&self) -> Option<AuthenticatedUser> {
        self.user.read().clone()
    }

    /// Returns `true` between `init` and `teardown`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.user.read().is_some()
    }
}
