//! Admin authorization
//!
//! Every admin request carries three headers:
//! - `x-admin-token`: must equal the configured `ADMIN_TOKEN`
//! - `x-admin-actor`: who is acting, recorded in the audit log
//! - `x-admin-role`: one of viewer, executor, approver, admin
//!
//! The `AdminIdentity` extractor checks the token and parses the identity;
//! handlers then call [`AdminIdentity::require`] with the endpoint minimum
//! before touching any state.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use subtle::ConstantTimeEq;

use crate::api::AppState;
use crate::audit::Role;
use crate::error::{OpsError, Result};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const ADMIN_ACTOR_HEADER: &str = "x-admin-actor";
pub const ADMIN_ROLE_HEADER: &str = "x-admin-role";

/// Authenticated admin caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub actor: String,
    pub role: Role,
}

impl AdminIdentity {
    /// Rejects the caller unless their role is at least `required`.
    pub fn require(&self, required: Role) -> Result<()> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(OpsError::Forbidden {
                required,
                actual: self.role,
            })
        }
    }

    /// Validates raw header values against the configured token.
    pub fn from_headers(
        expected_token: Option<&str>,
        token: Option<&str>,
        actor: Option<&str>,
        role: Option<&str>,
    ) -> Result<Self> {
        let expected = expected_token
            .ok_or_else(|| OpsError::Unauthorized("Admin API is disabled".to_string()))?;

        match token {
            Some(token) if tokens_match(token, expected) => {}
            Some(_) => return Err(OpsError::Unauthorized("Invalid admin token".to_string())),
            None => {
                return Err(OpsError::Unauthorized(format!(
                    "Missing {} header",
                    ADMIN_TOKEN_HEADER
                )))
            }
        }

        let actor = actor.map(str::trim).filter(|a| !a.is_empty()).ok_or_else(|| {
            OpsError::Unauthorized(format!("Missing {} header", ADMIN_ACTOR_HEADER))
        })?;

        let role = role
            .ok_or_else(|| OpsError::Unauthorized(format!("Missing {} header", ADMIN_ROLE_HEADER)))?
            .parse::<Role>()
            .map_err(OpsError::Unauthorized)?;

        Ok(Self {
            actor: actor.to_string(),
            role,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = OpsError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        Self::from_headers(
            state.admin_token.as_deref(),
            header(parts, ADMIN_TOKEN_HEADER),
            header(parts, ADMIN_ACTOR_HEADER),
            header(parts, ADMIN_ROLE_HEADER),
        )
    }
}

/// Constant-time token comparison; only a length mismatch returns early.
fn tokens_match(supplied: &str, expected: &str) -> bool {
    supplied.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
