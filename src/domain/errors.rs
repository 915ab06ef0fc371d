use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Must be logged in")]
    Unauthorized,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Admin access required")]
    Forbidden,
    #[error("Invalid {field}: {message}")]
    InvalidRequest { field: String, message: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
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

impl DomainError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn product_not_found(id: i32) -> Self {
        DomainError::NotFound(format!("Product {id}"))
    }
}
