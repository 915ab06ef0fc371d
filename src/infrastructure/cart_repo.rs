use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::db::DbPool;
use crate::domain::cart::{CartLine, CartLineView, MAX_LINE_QUANTITY};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_items, products};

use super::is_foreign_key_violation;
use super::models::{CartItemRow, NewCartItemRow};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn lines(&self, user_id: i32) -> Result<Vec<CartLineView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::user_id.eq(user_id))
            .order(cart_items::created_at.asc())
            .then_order_by(cart_items::id.asc())
            .select((
                CartItemRow::as_select(),
                products::name,
                products::price,
                products::image_url,
                products::stock,
            ))
            .load::<(CartItemRow, String, i64, String, i32)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(row, name, price, image_url, stock)| CartLineView {
                id: row.id,
                product_id: row.product_id,
                quantity: row.quantity,
                name,
                price,
                image_url,
                stock,
            })
            .collect())
    }

    /// Stored lines never exceed `MAX_LINE_QUANTITY`; an add that would push
    /// the merged quantity past it is rolled back.
    fn add(&self, user_id: i32, product_id: i32, quantity: i32) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::insert_into(cart_items::table)
                .values(&NewCartItemRow {
                    user_id,
                    product_id,
                    quantity,
                })
                .on_conflict((cart_items::user_id, cart_items::product_id))
                .do_update()
                .set((
                    cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)),
                    cart_items::updated_at.eq(Utc::now()),
                ))
                .returning(CartItemRow::as_returning())
                .get_result(conn)
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        DomainError::product_not_found(product_id)
                    } else {
                        e.into()
                    }
                })?;

            if row.quantity > MAX_LINE_QUANTITY {
                return Err(DomainError::invalid(
                    "quantity",
                    format!("a cart line holds at most {MAX_LINE_QUANTITY}"),
                ));
            }
            Ok(CartLine::from(row))
        })
    }

    fn set_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(
            cart_items::table
                .filter(cart_items::user_id.eq(user_id))
                .filter(cart_items::product_id.eq(product_id)),
        )
        .set((
            cart_items::quantity.eq(quantity),
            cart_items::updated_at.eq(Utc::now()),
        ))
        .returning(CartItemRow::as_returning())
        .get_result(&mut conn)
        .optional()?;
        Ok(row.map(CartLine::from))
    }

    fn remove(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            cart_items::table
                .filter(cart_items::user_id.eq(user_id))
                .filter(cart_items::product_id.eq(product_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn clear(&self, user_id: i32) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
            .execute(&mut conn)?;
        Ok(deleted)
    }
}
