use super::domain::{Role, UserId};

/// Authenticated identity passed explicitly into every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn parent(user_id: impl Into<String>) -> Self {
        Self::new(UserId(user_id.into()), Role::Parent)
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(UserId(user_id.into()), Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self, action: &'static str) -> Result<(), AccessError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AccessError::AdminOnly { action })
        }
    }

    pub fn require_owner_or_admin(
        &self,
        owner: &UserId,
        action: &'static str,
    ) -> Result<(), AccessError> {
        if self.is_admin() || &self.user_id == owner {
            Ok(())
        } else {
            Err(AccessError::NotOwner { action })
        }
    }

    pub fn require_owner(&self, owner: &UserId, action: &'static str) -> Result<(), AccessError> {
        if &self.user_id == owner {
            Ok(())
        } else {
            Err(AccessError::NotOwner { action })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("{action} requires the admin role")]
    AdminOnly { action: &'static str },
    #[error("{action} is limited to the record owner")]
    NotOwner { action: &'static str },
}
