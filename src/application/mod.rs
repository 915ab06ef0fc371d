pub mod account_service;
pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod password;
pub mod wishlist_service;

use crate::domain::account::User;
use crate::domain::errors::DomainError;

pub(crate) fn require_admin(user: &User) -> Result<(), DomainError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}
