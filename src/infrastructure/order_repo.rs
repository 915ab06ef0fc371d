use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    order_total, page_offset, ListResult, OrderItemView, OrderScope, OrderStatus, OrderView,
    PaymentStatus, PlaceOrder, PricedLine,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{cart_items, order_items, orders, products, users};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Locks the product row, checks stock and decrements it.
///
/// The row lock serializes concurrent checkouts of the same product, and the
/// decrement is conditional on `stock >= quantity` so stock can never go
/// negative even without the lock.
fn reserve_stock(
    conn: &mut PgConnection,
    product_id: i32,
    quantity: i32,
) -> Result<PricedLine, DomainError> {
    let product: Option<(i64, i32)> = products::table
        .find(product_id)
        .select((products::price, products::stock))
        .for_update()
        .first(conn)
        .optional()?;

    let Some((unit_price, available)) = product else {
        return Err(DomainError::product_not_found(product_id));
    };
    if available < quantity {
        return Err(DomainError::InsufficientStock {
            product_id,
            requested: quantity,
            available,
        });
    }

    let updated = diesel::update(
        products::table
            .filter(products::id.eq(product_id))
            .filter(products::stock.ge(quantity)),
    )
    .set((
        products::stock.eq(products::stock - quantity),
        products::updated_at.eq(Utc::now()),
    ))
    .execute(conn)?;
    if updated != 1 {
        return Err(DomainError::InsufficientStock {
            product_id,
            requested: quantity,
            available,
        });
    }

    Ok(PricedLine {
        product_id,
        quantity,
        unit_price,
    })
}

/// Attaches line items (joined with product name and image) to order rows,
/// preserving the order of `rows`.
fn with_items(
    conn: &mut PgConnection,
    rows: Vec<(OrderRow, String, String)>,
) -> Result<Vec<OrderView>, DomainError> {
    let order_rows: Vec<OrderRow> = rows.iter().map(|(order, _, _)| order.clone()).collect();
    let items: Vec<(OrderItemRow, String, String)> = OrderItemRow::belonging_to(&order_rows)
        .inner_join(products::table)
        .select((
            OrderItemRow::as_select(),
            products::name,
            products::image_url,
        ))
        .order(order_items::id.asc())
        .load(conn)?;

    let mut by_order: HashMap<i32, Vec<OrderItemView>> = HashMap::new();
    for (item, product_name, image_url) in items {
        by_order.entry(item.order_id).or_default().push(OrderItemView {
            id: item.id,
            product_id: item.product_id,
            product_name,
            image_url,
            quantity: item.quantity,
            price: item.price,
        });
    }

    rows.into_iter()
        .map(|(order, customer_name, customer_email)| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            Ok(OrderView {
                id: order.id,
                user_id: order.user_id,
                customer_name,
                customer_email,
                total_amount: order.total_amount,
                status: order.status.parse()?,
                shipping_address: serde_json::from_value(order.shipping_address)?,
                payment_method: order.payment_method.parse()?,
                payment_status: order.payment_status.parse()?,
                created_at: order.created_at,
                items,
            })
        })
        .collect()
}

fn find_order(conn: &mut PgConnection, id: i32) -> Result<Option<OrderView>, DomainError> {
    let row = orders::table
        .inner_join(users::table)
        .filter(orders::id.eq(id))
        .select((OrderRow::as_select(), users::name, users::email))
        .first::<(OrderRow, String, String)>(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };
    Ok(with_items(conn, vec![row])?.pop())
}

impl OrderRepository for DieselOrderRepository {
    fn place(&self, user_id: i32, order: PlaceOrder) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Re-read every product under a row lock and reserve its stock.
            //    Any failure aborts the transaction, undoing earlier lines.
            let priced = order
                .lines
                .iter()
                .map(|line| reserve_stock(conn, line.product_id, line.quantity))
                .collect::<Result<Vec<_>, _>>()?;

            // 2. Total from the prices read above, never from the client.
            let total_amount = order_total(&priced)?;

            // 3. Order header.
            let order_id: i32 = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    user_id,
                    total_amount,
                    status: OrderStatus::Pending.as_str().to_string(),
                    shipping_address: serde_json::to_value(&order.address)?,
                    payment_method: order.payment_method.as_str().to_string(),
                    payment_status: PaymentStatus::Pending.as_str().to_string(),
                })
                .returning(orders::id)
                .get_result(conn)?;

            // 4. Line items capture the price at this instant.
            let new_items: Vec<NewOrderItemRow> = priced
                .iter()
                .map(|line| NewOrderItemRow {
                    order_id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&new_items)
                .execute(conn)?;

            // 5. The stored cart has been turned into this order.
            diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
                .execute(conn)?;

            find_order(conn, order_id)?.ok_or_else(|| {
                DomainError::Internal(format!("order {order_id} vanished inside its transaction"))
            })
        })
    }

    fn find_by_id(&self, id: i32) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        find_order(&mut conn, id)
    }

    fn list(&self, scope: OrderScope, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page_offset(page, limit)?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let mut count_query = orders::table.into_boxed();
            let mut rows_query = orders::table
                .inner_join(users::table)
                .select((OrderRow::as_select(), users::name, users::email))
                .into_boxed();
            if let OrderScope::Customer(user_id) = scope {
                count_query = count_query.filter(orders::user_id.eq(user_id));
                rows_query = rows_query.filter(orders::user_id.eq(user_id));
            }

            let total: i64 = count_query.count().get_result(conn)?;

            let rows = rows_query
                .order((orders::created_at.desc(), orders::id.desc()))
                .limit(limit)
                .offset(offset)
                .load::<(OrderRow, String, String)>(conn)?;

            Ok(ListResult {
                items: with_items(conn, rows)?,
                total,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use diesel::prelude::*;

    use super::DieselOrderRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{
        OrderLineRequest, OrderScope, OrderStatus, PaymentMethod, PaymentStatus, PlaceOrder,
        ShippingAddress,
    };
    use crate::domain::ports::{CartRepository, OrderRepository};
    use crate::infrastructure::test_support::{insert_product, insert_user, setup_db, stock_of};
    use crate::infrastructure::DieselCartRepository;
    use crate::schema::{order_items, orders, products};

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Anita Gurung".to_string(),
            street: "New Road 5".to_string(),
            city: "Kathmandu".to_string(),
            state: "Bagmati".to_string(),
            postal_code: "44600".to_string(),
            phone: "9812345678".to_string(),
        }
    }

    fn order(lines: &[(i32, i32)]) -> PlaceOrder {
        PlaceOrder {
            lines: lines
                .iter()
                .map(|&(product_id, quantity)| OrderLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
            address: address(),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    fn order_count(pool: &crate::db::DbPool) -> (i64, i64) {
        let mut conn = pool.get().expect("Failed to get connection");
        let orders: i64 = orders::table.count().get_result(&mut conn).expect("count");
        let items: i64 = order_items::table
            .count()
            .get_result(&mut conn)
            .expect("count");
        (orders, items)
    }

    #[tokio::test]
    async fn place_captures_prices_and_decrements_stock() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = insert_user(&pool, "buyer@example.com");
        let phone = insert_product(&pool, "iPhone 15 Pro", 99_900, 10);
        let buds = insert_product(&pool, "AirPods Pro", 24_900, 20);

        let placed = repo
            .place(user_id, order(&[(phone, 2), (buds, 3)]))
            .expect("place failed");

        assert_eq!(placed.user_id, user_id);
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.payment_status, PaymentStatus::Pending);
        assert_eq!(placed.total_amount, 2 * 99_900 + 3 * 24_900);
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.items[0].product_name, "iPhone 15 Pro");
        assert_eq!(placed.shipping_address, address());
        assert_eq!(stock_of(&pool, phone), 8);
        assert_eq!(stock_of(&pool, buds), 17);
    }

    #[tokio::test]
    async fn captured_price_survives_later_price_changes() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = insert_user(&pool, "buyer@example.com");
        let laptop = insert_product(&pool, "MacBook Pro 16", 249_900, 5);

        let placed = repo.place(user_id, order(&[(laptop, 1)])).expect("place");

        {
            let mut conn = pool.get().expect("Failed to get connection");
            diesel::update(products::table.find(laptop))
                .set(products::price.eq(199_900i64))
                .execute(&mut conn)
                .expect("reprice");
        }

        let reloaded = repo
            .find_by_id(placed.id)
            .expect("find")
            .expect("order exists");
        assert_eq!(reloaded.items[0].price, 249_900);
        assert_eq!(reloaded.total_amount, 249_900);
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back_every_line() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = insert_user(&pool, "buyer@example.com");
        let plenty = insert_product(&pool, "USB-C Cable", 1_500, 50);
        let scarce = insert_product(&pool, "Steam Deck", 64_900, 1);

        let err = repo
            .place(user_id, order(&[(plenty, 5), (scarce, 2)]))
            .expect_err("should fail");

        match err {
            DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, scarce);
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(stock_of(&pool, plenty), 50, "earlier line must be rolled back");
        assert_eq!(stock_of(&pool, scarce), 1);
        assert_eq!(order_count(&pool), (0, 0));
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_and_keeps_the_cart() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let cart = DieselCartRepository::new(pool.clone());
        let user_id = insert_user(&pool, "buyer@example.com");
        let tv = insert_product(&pool, "OLED TV", 180_000, 3);
        cart.add(user_id, tv, 1).expect("add to cart");

        let err = repo
            .place(user_id, order(&[(tv, 1), (tv + 1000, 1)]))
            .expect_err("should fail");

        assert!(matches!(err, DomainError::NotFound(msg) if msg.contains(&(tv + 1000).to_string())));
        assert_eq!(stock_of(&pool, tv), 3);
        assert_eq!(order_count(&pool), (0, 0));
        assert_eq!(cart.lines(user_id).expect("cart").len(), 1);
    }

    #[tokio::test]
    async fn successful_order_clears_the_stored_cart() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let cart = DieselCartRepository::new(pool.clone());
        let user_id = insert_user(&pool, "buyer@example.com");
        let other_user = insert_user(&pool, "someone-else@example.com");
        let mouse = insert_product(&pool, "Mouse", 2_500, 10);
        let keyboard = insert_product(&pool, "Keyboard", 7_500, 10);
        cart.add(user_id, mouse, 1).expect("add");
        cart.add(user_id, keyboard, 2).expect("add");
        cart.add(other_user, mouse, 4).expect("add");

        repo.place(user_id, order(&[(mouse, 1), (keyboard, 2)]))
            .expect("place");

        assert!(cart.lines(user_id).expect("cart").is_empty());
        assert_eq!(cart.lines(other_user).expect("cart").len(), 1);
    }

    #[tokio::test]
    async fn stock_is_conserved_across_orders() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = insert_user(&pool, "buyer@example.com");
        let charger = insert_product(&pool, "Charger", 3_000, 12);

        for qty in [1, 4, 2] {
            repo.place(user_id, order(&[(charger, qty)])).expect("place");
        }

        let mut conn = pool.get().expect("Failed to get connection");
        let sold: Option<i64> = order_items::table
            .filter(order_items::product_id.eq(charger))
            .select(diesel::dsl::sum(order_items::quantity))
            .first(&mut conn)
            .expect("sum");
        assert_eq!(sold, Some(7));
        assert_eq!(stock_of(&pool, charger), 5);
    }

    #[tokio::test]
    async fn concurrent_orders_for_the_last_unit_sell_it_once() {
        let (_container, pool) = setup_db().await;
        let repo = Arc::new(DieselOrderRepository::new(pool.clone()));
        let first = insert_user(&pool, "first@example.com");
        let second = insert_user(&pool, "second@example.com");
        let console = insert_product(&pool, "PS5", 59_900, 1);

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [first, second]
            .into_iter()
            .map(|user_id| {
                let repo = Arc::clone(&repo);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    repo.place(user_id, order(&[(console, 1)]))
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let shortfalls = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::InsufficientStock { available: 0, .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(shortfalls, 1);
        assert_eq!(stock_of(&pool, console), 0);
        assert_eq!(order_count(&pool), (1, 1));
    }

    #[tokio::test]
    async fn list_is_scoped_and_paginated() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let alice = insert_user(&pool, "alice@example.com");
        let bob = insert_user(&pool, "bob@example.com");
        let cable = insert_product(&pool, "HDMI Cable", 900, 100);

        for _ in 0..3 {
            repo.place(alice, order(&[(cable, 1)])).expect("place");
        }
        repo.place(bob, order(&[(cable, 2)])).expect("place");

        let alice_page = repo
            .list(OrderScope::Customer(alice), 1, 2)
            .expect("list");
        assert_eq!(alice_page.total, 3);
        assert_eq!(alice_page.items.len(), 2);
        assert!(alice_page.items.iter().all(|o| o.user_id == alice));
        assert!(alice_page.items[0].id > alice_page.items[1].id, "newest first");
        assert_eq!(alice_page.items[0].items.len(), 1);

        let everything = repo.list(OrderScope::All, 1, 20).expect("list");
        assert_eq!(everything.total, 4);
        assert_eq!(everything.items.len(), 4);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let result = repo.find_by_id(4242).expect("find should not error");

        assert!(result.is_none());
    }
}
