use crate::error::ApiError;
use crate::ledger::Actor;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// The caller, as established by `auth_middleware` from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized("Missing token".into())),
        )
    }
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Hr | Role::Employee => Err(ApiError::forbidden("Admin only")),
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), ApiError> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(ApiError::forbidden("HR/Admin only"))
        }
    }

    /// Employees may only act on themselves; HR/Admin on anyone.
    pub fn require_self_or_manager(&self, user_id: u64) -> Result<(), ApiError> {
        if self.user_id == user_id || self.role.is_manager() {
            Ok(())
        } else {
            Err(ApiError::forbidden("You can only access your own records"))
        }
    }
}
