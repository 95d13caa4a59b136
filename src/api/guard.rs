//! Access-control guard for protected routes.
//!
//! Every protected operation goes through [`require`]: session validation,
//! identity load, and an optional flat role check. The guard returns a
//! tagged result instead of redirecting inline; the middleware wrappers
//! translate it into responses at the boundary.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};
use crate::db::Store;
use crate::entities::users::Role;

/// Session key holding the authenticated user id. Exactly one identity per
/// session; login overwrites it, logout flushes the session.
pub const SESSION_USER_KEY: &str = "user_id";

/// Identity resolved from a valid session. Inserted into request
/// extensions so handlers can read it without re-querying.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

/// Result of an access check.
#[derive(Debug)]
pub enum AccessCheck {
    Authorized(AuthUser),
    /// No session, expired session, or a session whose user id no longer
    /// resolves. All three behave identically.
    Unauthenticated,
    /// Valid session, wrong role. Roles are a flat set compared by
    /// equality; there is no hierarchy.
    Forbidden,
}

pub async fn require(
    session: &Session,
    store: &Store,
    role: Option<Role>,
) -> Result<AccessCheck, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(user_id) = user_id else {
        return Ok(AccessCheck::Unauthenticated);
    };

    let Some(user) = store
        .get_user_by_id(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load session user: {e}")))?
    else {
        // Stale session pointing at a user row that no longer resolves.
        return Ok(AccessCheck::Unauthenticated);
    };

    if let Some(required) = role
        && user.role != required
    {
        return Ok(AccessCheck::Forbidden);
    }

    Ok(AccessCheck::Authorized(AuthUser {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}

/// Middleware requiring any authenticated session.
pub async fn session_guard(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state, &session, request, next, None).await
}

/// Middleware requiring an authenticated session with the `admin` role.
pub async fn admin_guard(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state, &session, request, next, Some(Role::Admin)).await
}

async fn enforce(
    state: &AppState,
    session: &Session,
    mut request: Request,
    next: Next,
    role: Option<Role>,
) -> Result<Response, ApiError> {
    match require(session, state.store(), role).await? {
        AccessCheck::Authorized(user) => {
            tracing::Span::current().record("user_id", user.id);
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        AccessCheck::Unauthenticated => Err(ApiError::Unauthenticated {
            next: Some(request.uri().path().to_string()),
        }),
        AccessCheck::Forbidden => Err(ApiError::Forbidden),
    }
}
