use chrono::{DateTime, Utc};

/// Upper bound on the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: i32,
    pub user_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

/// A cart row joined with the product it refers to.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub name: String,
    pub price: i64,
    pub image_url: String,
    pub stock: i32,
}

impl CartLineView {
    /// Display subtotal at the current product price. Saturates so an
    /// absurd stored quantity cannot panic a listing.
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistItem {
    pub id: i32,
    pub user_id: i32,
    pub product_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct WishlistItemView {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub price: i64,
    pub image_url: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}
