//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server faults to Sentry
//! before responding to the client. All JSON handlers return
//! `Result<T, AppError>`.
//!
//! Every error response has the body `{"error": <summary>, "message"?: <detail>}`:
//!
//! | Variant | Status | `error` | `message` |
//! |---|---|---|---|
//! | `Validation`, `InsufficientStock` | 400 | the message | - |
//! | `InvalidBody` | 400 | `Invalid request body` | rejection text |
//! | `NotFound` | 404 | the message | - |
//! | `Failed` | 500 | the failed action | underlying error |
//! | `Internal` | 500 | `Internal server error` | detail |

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::ServiceError;

/// Application-level error type for the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// The request body could not be parsed.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Not enough stock to satisfy the request.
    #[error("{0}")]
    InsufficientStock(String),

    /// A service call failed for reasons outside the client's control.
    #[error("{action}: {source}")]
    Failed {
        /// What the handler was doing, e.g. "Failed to process checkout".
        action: &'static str,
        #[source]
        source: ServiceError,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a [`ServiceError`] raised while performing `action`.
    ///
    /// Client errors keep their message; storage and internal faults become
    /// [`AppError::Failed`] labelled with `action`.
    ///
    /// ```rust,ignore
    /// service.place_order(request, &user).await.map_err(AppError::during("Failed to process checkout"))?;
    /// ```
    pub fn during(action: &'static str) -> impl FnOnce(ServiceError) -> Self {
        move |err| match err {
            ServiceError::Validation(message) => Self::Validation(message),
            ServiceError::NotFound(message) => Self::NotFound(message),
            err @ ServiceError::InsufficientStock { .. } => {
                Self::InsufficientStock(err.to_string())
            }
            source @ (ServiceError::Storage(_) | ServiceError::Internal(_)) => {
                Self::Failed { action, source }
            }
        }
    }

    pub(crate) const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) | Self::InsufficientStock(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Failed { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        Self::during("Request failed")(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Validation(message)
            | AppError::NotFound(message)
            | AppError::InsufficientStock(message) => Self {
                error: message.clone(),
                message: None,
            },
            AppError::InvalidBody(detail) => Self {
                error: "Invalid request body".to_string(),
                message: Some(detail.clone()),
            },
            AppError::Failed { action, source } => Self {
                error: (*action).to_string(),
                message: Some(source.to_string()),
            },
            AppError::Internal(detail) => Self {
                error: "Internal server error".to_string(),
                message: Some(detail.clone()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    title: String,
    detail: Option<String>,
    cart_count: u32,
}

/// An [`AppError`] raised by a storefront page, rendered as HTML.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ServiceError> for PageError {
    fn from(err: ServiceError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body = ErrorBody::from(&self.0);

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self.0);
            tracing::error!(
                error = %self.0,
                sentry_event_id = %event_id,
                "Page error"
            );
        }

        let page = ErrorTemplate {
            status: status.as_u16(),
            title: body.error,
            // Server-side detail stays in the logs
            detail: (!status.is_server_error()).then_some(body.message).flatten(),
            cart_count: 0,
        };

        (status, page).into_response()
    }
}

/// Set the Sentry user context from the resolved cart owner.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
