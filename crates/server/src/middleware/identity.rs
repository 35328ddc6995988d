//! Cart-owner resolution.
//!
//! There is no authentication. The JSON API takes the owner from, in order:
//!
//! 1. A `userId` field in the request body (resolved by the handler)
//! 2. The `userId` query parameter
//! 3. The `x-user-id` header
//! 4. The configured guest id
//!
//! Storefront pages use the session's visitor id instead (see [`Visitor`]).

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use tower_sessions::Session;

use cartwheel_core::UserId;

use super::session::visitor_id;
use crate::db::Store;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Header carrying the cart owner for API clients.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Default, Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// The cart owner named by the query string, header or configuration.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(UserContext(user_id): UserContext) -> impl IntoResponse {
///     format!("cart owner: {user_id}")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct UserContext(pub UserId);

impl UserContext {
    /// Apply a `userId` taken from the request body, which wins over every
    /// other source.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the body id is present but invalid.
    pub fn with_body_override(self, body_user_id: Option<&str>) -> Result<UserId, AppError> {
        match non_blank(body_user_id) {
            Some(raw) => {
                let user_id = parse_user_id(raw)?;
                set_sentry_user(&user_id);
                Ok(user_id)
            }
            None => Ok(self.0),
        }
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for UserContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<UserQuery>::try_from_uri(&parts.uri)?;

        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok());

        let user_id = match non_blank(query.user_id.as_deref()).or_else(|| non_blank(header)) {
            Some(raw) => parse_user_id(raw)?,
            None => state.config().guest_user_id.clone(),
        };

        set_sentry_user(&user_id);
        Ok(Self(user_id))
    }
}

/// The storefront visitor, identified by a session-stored id.
#[derive(Debug, Clone)]
pub struct Visitor {
    pub user_id: UserId,
    pub session: Session,
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let user_id = visitor_id(&session)
            .await
            .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

        set_sentry_user(&user_id);
        Ok(Self { user_id, session })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    UserId::parse(raw).map_err(|e| AppError::Validation(format!("Invalid user id: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::config::ServerConfig;
    use crate::db::MemoryStore;

    fn state() -> AppState<MemoryStore> {
        AppState::new(ServerConfig::default(), MemoryStore::new())
    }

    async fn resolve(request: Request<()>) -> Result<UserId, AppError> {
        let (mut parts, ()) = request.into_parts();
        UserContext::from_request_parts(&mut parts, &state())
            .await
            .map(|ctx| ctx.0)
    }

    #[tokio::test]
    async fn test_falls_back_to_guest() {
        let user = resolve(Request::builder().uri("/api/cart").body(()).unwrap())
            .await
            .unwrap();
        assert_eq!(user, UserId::guest());

        let user = resolve(
            Request::builder()
                .uri("/api/cart?userId=%20%20")
                .body(())
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(user, UserId::guest());
    }

    #[tokio::test]
    async fn test_query_wins_over_header() {
        let user = resolve(
            Request::builder()
                .uri("/api/cart?userId=alice")
                .header(USER_ID_HEADER, "bob")
                .body(())
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(user.as_str(), "alice");

        let user = resolve(
            Request::builder()
                .uri("/api/cart")
                .header(USER_ID_HEADER, "bob")
                .body(())
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(user.as_str(), "bob");
    }

    #[tokio::test]
    async fn test_invalid_user_id_is_rejected() {
        let long = "x".repeat(UserId::MAX_LENGTH + 1);
        let err = resolve(
            Request::builder()
                .uri(format!("/api/cart?userId={long}"))
                .body(())
                .unwrap(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Invalid user id")));
    }

    #[test]
    fn test_body_override() {
        let ctx = UserContext(UserId::guest());
        assert_eq!(
            ctx.clone().with_body_override(Some(" carol ")).unwrap().as_str(),
            "carol"
        );
        assert_eq!(ctx.clone().with_body_override(Some("")).unwrap(), UserId::guest());
        assert_eq!(ctx.with_body_override(None).unwrap(), UserId::guest());
    }
}
