use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundBody {
    pub error: String,
    pub content_id: String,
    pub searched_paths: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Payment verification failed")]
    PaymentVerification,

    #[error("Content not found")]
    NotFound {
        content_id: String,
        searched_paths: Vec<String>,
    },

    #[error("{message}")]
    Generation {
        message: String,
        details: Option<String>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn generation(err: &anyhow::Error) -> Self {
        ApiError::Generation {
            message: "Failed to generate video".to_string(),
            details: Some(format!("{:#}", err)),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::PaymentVerification => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Generation { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NotFound {
                content_id,
                searched_paths,
            } => {
                let body = NotFoundBody {
                    error: "Content not found".to_string(),
                    content_id,
                    searched_paths,
                };
                (status, Json(body)).into_response()
            }
            ApiError::Generation { message, details } => {
                tracing::error!("Generation error: {} ({:?})", message, details);
                (status, Json(ErrorBody { error: message, details })).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                let body = ErrorBody {
                    error: "Internal server error".to_string(),
                    details: None,
                };
                (status, Json(body)).into_response()
            }
            other => {
                let body = ErrorBody {
                    error: other.to_string(),
                    details: None,
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
