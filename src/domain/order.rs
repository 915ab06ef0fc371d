use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;

/// Minimum phone length accepted on a shipping address.
pub const MIN_PHONE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Internal(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
    Online,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Online => "online",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "online" => Ok(PaymentMethod::Online),
            other => Err(DomainError::Internal(format!("unknown payment method '{other}'"))),
        }
    }
}

/// Payment collection is not integrated, so every order starts `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::Internal(format!("unknown payment status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Trims every field and rejects the first one that is missing or too short.
    pub fn validated(self) -> Result<Self, DomainError> {
        let address = ShippingAddress {
            full_name: self.full_name.trim().to_string(),
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            phone: self.phone.trim().to_string(),
        };

        let required = [
            ("address.fullName", &address.full_name, "full name is required"),
            ("address.street", &address.street, "street address is required"),
            ("address.city", &address.city, "city is required"),
            ("address.state", &address.state, "state is required"),
            ("address.postalCode", &address.postal_code, "postal code is required"),
        ];
        for (field, value, message) in required {
            if value.is_empty() {
                return Err(DomainError::invalid(field, message));
            }
        }
        if address.phone.chars().count() < MIN_PHONE_LEN {
            return Err(DomainError::invalid(
                "address.phone",
                "valid phone number is required",
            ));
        }

        Ok(address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub lines: Vec<OrderLineRequest>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Validates submitted lines and merges repeated products into one line.
///
/// The result is sorted by product id so that every transaction locks
/// product rows in the same order.
pub fn normalize_lines(lines: &[OrderLineRequest]) -> Result<Vec<OrderLineRequest>, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::invalid(
            "items",
            "order must contain at least one item",
        ));
    }

    let mut merged: BTreeMap<i32, i32> = BTreeMap::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.product_id <= 0 {
            return Err(DomainError::invalid(
                format!("items[{idx}].productId"),
                "must be a positive integer",
            ));
        }
        if line.quantity <= 0 {
            return Err(DomainError::invalid(
                format!("items[{idx}].quantity"),
                "must be a positive integer",
            ));
        }
        let entry = merged.entry(line.product_id).or_insert(0);
        *entry = entry.checked_add(line.quantity).ok_or_else(|| {
            DomainError::invalid(format!("items[{idx}].quantity"), "quantity is too large")
        })?;
    }

    Ok(merged
        .into_iter()
        .map(|(product_id, quantity)| OrderLineRequest {
            product_id,
            quantity,
        })
        .collect())
}

/// A line whose unit price was read from the product row inside the
/// placement transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

pub fn order_total(lines: &[PricedLine]) -> Result<i64, DomainError> {
    lines.iter().try_fold(0i64, |acc, line| {
        line.unit_price
            .checked_mul(i64::from(line.quantity))
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or_else(|| DomainError::invalid("items", "order total is too large"))
    })
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub image_url: String,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i32,
    pub user_id: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// Which orders a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Customer(i32),
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Row offset of a 1-based page. A page too far out to address is an input
/// error.
pub fn page_offset(page: i64, limit: i64) -> Result<i64, DomainError> {
    page.checked_sub(1)
        .filter(|p| *p >= 0)
        .and_then(|p| p.checked_mul(limit))
        .ok_or_else(|| DomainError::invalid("page", "is out of range"))
}
