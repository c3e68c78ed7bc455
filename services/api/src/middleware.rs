//! Request authentication and ownership checks
//!
//! `auth_middleware` guards every protected route. The checks run in a
//! fixed order — token present, signature valid, not expired, subject still
//! exists — and each failure keeps its own error variant for logging while
//! the wire response stays an indistinguishable 401.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::warn;

use crate::{AppState, error::ApiError, jwt::TokenError};

/// Authenticated identity carried in request extensions
///
/// Handlers read this instead of re-inspecting headers, so ownership checks
/// always run against a verified subject.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// Authentication middleware for protected routes
///
/// Never mutates account state; running it twice on the same request yields
/// the same outcome.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(bearer)) = bearer else {
        warn!("Rejected request without bearer token");
        return Err(ApiError::Unauthenticated);
    };

    let claims = state.jwt_service.validate(bearer.token()).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        match e {
            TokenError::Expired => ApiError::ExpiredToken,
            TokenError::Invalid => ApiError::InvalidToken,
        }
    })?;

    let account = state
        .user_repository
        .find_by_username(&claims.sub)
        .await?
        .ok_or_else(|| {
            warn!("Rejected token for unknown subject: {}", claims.sub);
            ApiError::UnknownSubject
        })?;

    req.extensions_mut().insert(AuthUser {
        username: account.username,
    });

    Ok(next.run(req).await)
}

/// Check that the authenticated identity owns the addressed account
///
/// Pure comparison, no I/O. Required on every account-scoped operation.
pub fn authorize(user: &AuthUser, resource_owner: &str) -> Result<(), ApiError> {
    if user.username == resource_owner {
        Ok(())
    } else {
        warn!(
            "Denied {} access to resources of {}",
            user.username, resource_owner
        );
        Err(ApiError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_accepts_owner() {
        let user = AuthUser {
            username: "alice12".to_string(),
        };
        assert!(authorize(&user, "alice12").is_ok());
    }

    #[test]
    fn test_authorize_denies_other_accounts() {
        let user = AuthUser {
            username: "alice12".to_string(),
        };
        assert!(matches!(
            authorize(&user, "bob42"),
            Err(ApiError::PermissionDenied)
        ));
    }

    #[test]
    fn test_authorize_is_case_sensitive() {
        let user = AuthUser {
            username: "alice12".to_string(),
        };
        assert!(matches!(
            authorize(&user, "Alice12"),
            Err(ApiError::PermissionDenied)
        ));
    }
}
