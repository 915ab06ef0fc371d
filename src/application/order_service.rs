use crate::domain::account::User;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    normalize_lines, page_offset, ListResult, OrderLineRequest, OrderScope, OrderView,
    PaymentMethod, PlaceOrder, ShippingAddress,
};
use crate::domain::ports::OrderRepository;

pub const DEFAULT_ORDER_PAGE_SIZE: i64 = 20;
pub const MAX_ORDER_PAGE_SIZE: i64 = 100;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates the checkout request and hands it to the repository, which
    /// prices, reserves stock and writes the order in one transaction.
    ///
    /// Input errors are returned before any transaction is opened.
    pub fn place_order(
        &self,
        user_id: i32,
        lines: Vec<OrderLineRequest>,
        address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<OrderView, DomainError> {
        let lines = normalize_lines(&lines)?;
        let address = address.validated()?;

        let result = self.repo.place(
            user_id,
            PlaceOrder {
                lines,
                address,
                payment_method,
            },
        );

        match &result {
            Ok(order) => log::info!(
                "order {} placed by user {} ({} items, total {})",
                order.id,
                user_id,
                order.items.len(),
                order.total_amount
            ),
            Err(e @ (DomainError::InsufficientStock { .. } | DomainError::NotFound(_))) => {
                log::warn!("checkout rejected for user {}: {}", user_id, e)
            }
            Err(_) => {}
        }
        result
    }

    /// Customers only see their own orders; another customer's order looks
    /// exactly like a missing one.
    pub fn get_order(&self, viewer: &User, id: i32) -> Result<OrderView, DomainError> {
        match self.repo.find_by_id(id)? {
            Some(order) if viewer.is_admin() || order.user_id == viewer.id => Ok(order),
            _ => Err(DomainError::NotFound(format!("Order {id}"))),
        }
    }

    pub fn list_orders(
        &self,
        viewer: &User,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_ORDER_PAGE_SIZE);
        page_offset(page, limit)?;
        let scope = if viewer.is_admin() {
            OrderScope::All
        } else {
            OrderScope::Customer(viewer.id)
        };
        self.repo.list(scope, page, limit)
    }
}
