use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Width of the `name` columns of `products` and `categories`.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl NewCategory {
    pub fn validated(self) -> Result<Self, DomainError> {
        let name = name_text(&self.name)?;
        Ok(NewCategory {
            name,
            description: self.description,
            image_url: self.image_url,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub image_url: String,
    pub images: Vec<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category_id: Option<i32>,
    pub image_url: String,
    pub images: Vec<String>,
    pub featured: bool,
}

impl NewProduct {
    pub fn validated(self) -> Result<Self, DomainError> {
        Ok(NewProduct {
            name: name_text(&self.name)?,
            description: required_text("description", &self.description)?,
            price: non_negative_price(self.price)?,
            stock: non_negative_stock(self.stock)?,
            category_id: self.category_id,
            image_url: required_text("imageUrl", &self.image_url)?,
            images: self.images,
            featured: self.featured,
        })
    }
}

/// Partial update; `None` leaves the column untouched. `category_id` is
/// doubly optional so `Some(None)` detaches the product from its category.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub category_id: Option<Option<i32>>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl ProductChanges {
    pub fn validated(self) -> Result<Self, DomainError> {
        Ok(ProductChanges {
            name: self.name.map(|v| name_text(&v)).transpose()?,
            description: self
                .description
                .map(|v| required_text("description", &v))
                .transpose()?,
            price: self.price.map(non_negative_price).transpose()?,
            stock: self.stock.map(non_negative_stock).transpose()?,
            category_id: self.category_id,
            image_url: self
                .image_url
                .map(|v| required_text("imageUrl", &v))
                .transpose()?,
            images: self.images,
            featured: self.featured,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category_id.is_none()
            && self.image_url.is_none()
            && self.images.is_none()
            && self.featured.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category_id: Option<i32>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
    /// Admin listings also show products that are out of stock.
    pub include_out_of_stock: bool,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            category_id: None,
            featured: None,
            search: None,
            sort: ProductSort::Newest,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            include_out_of_stock: false,
        }
    }
}

impl ProductQuery {
    pub fn paginate(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.offset = offset.unwrap_or(0).max(0);
        self
    }

    /// The ILIKE pattern for `search`, or `None` when there is nothing to match.
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

fn required_text(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn name_text(value: &str) -> Result<String, DomainError> {
    let name = required_text("name", value)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::invalid(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(name)
}

fn non_negative_price(price: i64) -> Result<i64, DomainError> {
    if price < 0 {
        return Err(DomainError::invalid("price", "must not be negative"));
    }
    Ok(price)
}

fn non_negative_stock(stock: i32) -> Result<i32, DomainError> {
    if stock < 0 {
        return Err(DomainError::invalid("stock", "must not be negative"));
    }
    Ok(stock)
}
