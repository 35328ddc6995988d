//! Session middleware configuration.
//!
//! Storefront pages identify a shopper by a random visitor id kept in a
//! cookie-backed session. Sessions live in process memory; losing them on
//! restart only detaches visitors from their carts.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use cartwheel_core::UserId;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "cartwheel_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session keys.
pub mod session_keys {
    /// Per-visitor cart owner id.
    pub const VISITOR_ID: &str = "visitor_id";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &ServerConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Get the visitor id stored in the session, assigning a new one on first
/// visit.
///
/// # Errors
///
/// Returns an error if the session store cannot be read or written.
pub async fn visitor_id(session: &Session) -> Result<UserId, tower_sessions::session::Error> {
    if let Some(id) = session.get::<UserId>(session_keys::VISITOR_ID).await? {
        return Ok(id);
    }

    let id = new_visitor_id();
    session.insert(session_keys::VISITOR_ID, &id).await?;
    tracing::debug!(visitor_id = %id, "Assigned visitor id");
    Ok(id)
}

fn new_visitor_id() -> UserId {
    // A UUID is never empty nor longer than the user id limit.
    UserId::parse(&format!("visitor-{}", Uuid::new_v4())).unwrap_or_else(|_| UserId::guest())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_new_visitor_ids_are_distinct() {
        let a = new_visitor_id();
        let b = new_visitor_id();
        assert!(a.as_str().starts_with("visitor-"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_visitor_id_is_stable_within_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let first = visitor_id(&session).await.unwrap();
        let second = visitor_id(&session).await.unwrap();

        assert_eq!(first, second);
    }
}
