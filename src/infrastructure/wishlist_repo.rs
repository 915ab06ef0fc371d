use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::cart::{WishlistItem, WishlistItemView};
use crate::domain::errors::DomainError;
use crate::domain::ports::WishlistRepository;
use crate::schema::{products, wishlist_items};

use super::is_foreign_key_violation;
use super::models::{NewWishlistItemRow, WishlistItemRow};

pub struct DieselWishlistRepository {
    pool: DbPool,
}

impl DieselWishlistRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl WishlistRepository for DieselWishlistRepository {
    fn items(&self, user_id: i32) -> Result<Vec<WishlistItemView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = wishlist_items::table
            .inner_join(products::table)
            .filter(wishlist_items::user_id.eq(user_id))
            .order(wishlist_items::created_at.desc())
            .then_order_by(wishlist_items::id.desc())
            .select((
                wishlist_items::id,
                wishlist_items::product_id,
                products::name,
                products::price,
                products::image_url,
                products::stock,
                wishlist_items::created_at,
            ))
            .load::<(i32, i32, String, i64, String, i32, DateTime<Utc>)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(
                |(id, product_id, name, price, image_url, stock, created_at)| WishlistItemView {
                    id,
                    product_id,
                    name,
                    price,
                    image_url,
                    stock,
                    created_at,
                },
            )
            .collect())
    }

    fn add(&self, user_id: i32, product_id: i32) -> Result<WishlistItem, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(wishlist_items::table)
                .values(&NewWishlistItemRow {
                    user_id,
                    product_id,
                })
                .on_conflict((wishlist_items::user_id, wishlist_items::product_id))
                .do_nothing()
                .execute(conn)
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        DomainError::product_not_found(product_id)
                    } else {
                        e.into()
                    }
                })?;

            let row = wishlist_items::table
                .filter(wishlist_items::user_id.eq(user_id))
                .filter(wishlist_items::product_id.eq(product_id))
                .select(WishlistItemRow::as_select())
                .first(conn)?;
            Ok(row.into())
        })
    }

    fn remove(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            wishlist_items::table
                .filter(wishlist_items::user_id.eq(user_id))
                .filter(wishlist_items::product_id.eq(product_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn contains(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let exists = diesel::select(diesel::dsl::exists(
            wishlist_items::table
                .filter(wishlist_items::user_id.eq(user_id))
                .filter(wishlist_items::product_id.eq(product_id)),
        ))
        .get_result(&mut conn)?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::DieselWishlistRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::WishlistRepository;
    use crate::infrastructure::test_support::{insert_product, insert_user, setup_db};

    #[tokio::test]
    async fn adding_twice_keeps_one_membership() {
        let (_container, pool) = setup_db().await;
        let repo = DieselWishlistRepository::new(pool.clone());
        let user_id = insert_user(&pool, "wish@example.com");
        let camera = insert_product(&pool, "Mirrorless Camera", 99_900, 2);

        let first = repo.add(user_id, camera).expect("add");
        let second = repo.add(user_id, camera).expect("add again");

        assert_eq!(first, second);
        let items = repo.items(user_id).expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Mirrorless Camera");
        assert!(repo.contains(user_id, camera).expect("contains"));
    }

    #[tokio::test]
    async fn remove_and_contains() {
        let (_container, pool) = setup_db().await;
        let repo = DieselWishlistRepository::new(pool.clone());
        let user_id = insert_user(&pool, "wish@example.com");
        let speaker = insert_product(&pool, "Bluetooth Speaker", 4_900, 12);

        assert!(!repo.contains(user_id, speaker).expect("contains"));
        repo.add(user_id, speaker).expect("add");
        assert!(repo.remove(user_id, speaker).expect("remove"));
        assert!(!repo.remove(user_id, speaker).expect("second remove"));
        assert!(!repo.contains(user_id, speaker).expect("contains"));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselWishlistRepository::new(pool.clone());
        let user_id = insert_user(&pool, "wish@example.com");

        let err = repo.add(user_id, 9_999).expect_err("no such product");

        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
