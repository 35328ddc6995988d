//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (propagate or assign `x-request-id`)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. CORS (JSON API only)
//!
//! Cart-owner resolution happens in extractors ([`UserContext`], [`Visitor`])
//! rather than in a layer.

pub mod identity;
pub mod request_id;
pub mod session;

pub use identity::{USER_ID_HEADER, UserContext, Visitor};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{create_session_layer, visitor_id};
