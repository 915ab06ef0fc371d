use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Must be logged in")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin access required")]
    Forbidden,

    #[error("{message}")]
    InvalidRequest {
        field: Option<String>,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock {
        product_id: i32,
        requested: i32,
        available: i32,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            field: None,
            message: message.into(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::InvalidCredentials => AppError::InvalidCredentials,
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::InvalidRequest { field, message } => AppError::InvalidRequest {
                message: format!("Invalid {field}: {message}"),
                field: Some(field),
            },
            DomainError::NotFound(what) => AppError::NotFound(what),
            DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidRequest { .. } | AppError::InsufficientStock { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::InvalidRequest {
                field: Some(field),
                message,
            } => json!({ "message": message, "field": field }),
            AppError::InsufficientStock {
                product_id,
                requested,
                available,
            } => json!({
                "message": self.to_string(),
                "productId": product_id,
                "requested": requested,
                "available": available,
            }),
            AppError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                json!({ "message": "Internal server error" })
            }
            _ => json!({ "message": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
