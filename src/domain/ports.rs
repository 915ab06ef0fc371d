use chrono::Duration;
use uuid::Uuid;

use super::account::{NewAccount, Role, Session, User, UserCredentials};
use super::cart::{CartLine, CartLineView, WishlistItem, WishlistItemView};
use super::catalog::{Category, NewCategory, NewProduct, Product, ProductChanges, ProductQuery};
use super::errors::DomainError;
use super::order::{ListResult, OrderScope, OrderView, PlaceOrder};

pub trait OrderRepository: Send + Sync + 'static {
    /// Places `order` atomically. Lines must already be normalized.
    fn place(&self, user_id: i32, order: PlaceOrder) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: i32) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, scope: OrderScope, page: i64, limit: i64) -> Result<ListResult, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn list_categories(&self) -> Result<Vec<Category>, DomainError>;
    fn create_category(&self, category: NewCategory) -> Result<Category, DomainError>;
    fn category_exists(&self, id: i32) -> Result<bool, DomainError>;
    fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, DomainError>;
    fn find_product(&self, id: i32) -> Result<Option<Product>, DomainError>;
    fn create_product(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn update_product(&self, id: i32, changes: ProductChanges)
        -> Result<Option<Product>, DomainError>;
    /// Returns `false` when no product had that id.
    fn delete_product(&self, id: i32) -> Result<bool, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn lines(&self, user_id: i32) -> Result<Vec<CartLineView>, DomainError>;
    /// Inserts the line or adds `quantity` to the existing one.
    fn add(&self, user_id: i32, product_id: i32, quantity: i32) -> Result<CartLine, DomainError>;
    fn set_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError>;
    fn remove(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError>;
    fn clear(&self, user_id: i32) -> Result<usize, DomainError>;
}

pub trait WishlistRepository: Send + Sync + 'static {
    fn items(&self, user_id: i32) -> Result<Vec<WishlistItemView>, DomainError>;
    /// Idempotent: an existing membership is returned unchanged.
    fn add(&self, user_id: i32, product_id: i32) -> Result<WishlistItem, DomainError>;
    fn remove(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError>;
    fn contains(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError>;
}

pub trait AccountRepository: Send + Sync + 'static {
    /// Fails with `Conflict` when the email is already registered.
    fn create_user(
        &self,
        account: &NewAccount,
        password_hash: &str,
        role: Role,
    ) -> Result<User, DomainError>;
    fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, DomainError>;
    fn create_session(&self, user_id: i32, ttl: Duration) -> Result<Session, DomainError>;
    /// Resolves a live session to its user. Expired sessions resolve to `None`.
    fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, DomainError>;
    fn delete_session(&self, session_id: Uuid) -> Result<(), DomainError>;
}
