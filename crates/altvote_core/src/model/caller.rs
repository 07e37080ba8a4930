//! Authenticated caller identity handed in by the identity provider.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a platform user.
pub type UserId = Uuid;

/// Already-authenticated caller. Core never verifies credentials itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Returns whether this caller may edit or delete a record owned by `owner`.
    pub fn can_manage(&self, owner: UserId) -> bool {
        self.is_admin || self.user_id == owner
    }
}
