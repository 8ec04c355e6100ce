//! Role-based access decisions.
//!
//! Every guarded route names one [`Action`]; [`authorize`] is the only place
//! that maps a caller's role to what it may do.

use crate::models::user_models::{Role, User};

/// Identity resolved from a valid bearer token.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadPolls,
    CreatePoll,
    UpdatePoll,
    DeletePoll,
    Vote,
    ListUsers,
    DeleteUser,
    ViewSummary,
    ViewFeed,
}

impl Action {
    fn needs_admin(self) -> bool {
        match self {
            Action::ReadPolls | Action::Vote | Action::ViewFeed => false,
            Action::CreatePoll
            | Action::UpdatePoll
            | Action::DeletePoll
            | Action::ListUsers
            | Action::DeleteUser
            | Action::ViewSummary => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Not authorized, no token")]
    Unauthenticated,
    #[error("Not authorized as an admin")]
    Forbidden(Action),
}

pub fn authorize(caller: Option<&Caller>, action: Action) -> Result<(), PolicyError> {
    let caller = caller.ok_or(PolicyError::Unauthenticated)?;

    if action.needs_admin() && caller.role != Role::Admin {
        return Err(PolicyError::Forbidden(action));
    }

    Ok(())
}
