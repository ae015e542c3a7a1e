//! Bearer-token authentication.
//!
//! [`authenticate`] runs before every handler. It consults the
//! [`AccessPolicy`](super::AccessPolicy); protected paths need a valid
//! `Authorization: Bearer <token>` header, and the verified [`Principal`] is
//! stored in the request extensions for the extractors below.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::Span;

use bazaar_core::member::Member;

use super::Access;
use crate::db::Database;
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, MemberService};
use crate::state::AppState;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
}

/// Reject protected requests without a valid bearer token.
///
/// # Errors
///
/// Returns `AppError::Auth(AuthError::InvalidToken)` when a protected path is
/// requested without a verifiable token.
pub async fn authenticate<D: Database>(
    State(state): State<AppState<D>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.policy().access(request.uri().path()) == Access::Public {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers()).ok_or(AuthError::InvalidToken)?;
    let claims = state.tokens().verify(token)?;

    Span::current().record("username", claims.sub.as_str());
    set_sentry_user(&claims.sub);

    request.extensions_mut().insert(Principal {
        username: claims.sub,
    });
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor that requires an authenticated principal.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(principal): RequireAuth) -> String {
///     format!("Hello, {}!", principal.username)
/// }
/// ```
pub struct RequireAuth(pub Principal);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Self)
            .ok_or(AppError::Auth(AuthError::InvalidToken))
    }
}

/// Extractor that resolves the authenticated principal to its member record.
pub struct CurrentMember(pub Member);

impl<D: Database> FromRequestParts<AppState<D>> for CurrentMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<D>,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(principal) = RequireAuth::from_request_parts(parts, state).await?;

        let member = MemberService::new(state.db(), state.tokens())
            .me(&principal.username)
            .await
            .map_err(|e| match e {
                // Valid token for a member that no longer exists.
                AuthError::MemberNotFound => AppError::Auth(AuthError::InvalidToken),
                other => AppError::Auth(other),
            })?;

        Ok(Self(member))
    }
}
