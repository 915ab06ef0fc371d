use crate::domain::cart::{WishlistItem, WishlistItemView};
use crate::domain::errors::DomainError;
use crate::domain::ports::WishlistRepository;

pub struct WishlistService<R> {
    repo: R,
}

impl<R: WishlistRepository> WishlistService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn items(&self, user_id: i32) -> Result<Vec<WishlistItemView>, DomainError> {
        self.repo.items(user_id)
    }

    pub fn add(&self, user_id: i32, product_id: i32) -> Result<WishlistItem, DomainError> {
        if product_id <= 0 {
            return Err(DomainError::invalid("productId", "must be a positive integer"));
        }
        self.repo.add(user_id, product_id)
    }

    pub fn remove(&self, user_id: i32, product_id: i32) -> Result<(), DomainError> {
        if self.repo.remove(user_id, product_id)? {
            Ok(())
        } else {
            Err(DomainError::NotFound("Wishlist item".to_string()))
        }
    }

    pub fn contains(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError> {
        self.repo.contains(user_id, product_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    struct FakeWishlist {
        members: Mutex<BTreeSet<(i32, i32)>>,
    }

    impl WishlistRepository for FakeWishlist {
        fn items(&self, _user_id: i32) -> Result<Vec<WishlistItemView>, DomainError> {
            Ok(vec![])
        }

        fn add(&self, user_id: i32, product_id: i32) -> Result<WishlistItem, DomainError> {
            self.members.lock().expect("lock").insert((user_id, product_id));
            Ok(WishlistItem {
                id: 1,
                user_id,
                product_id,
                created_at: Utc::now(),
            })
        }

        fn remove(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError> {
            Ok(self.members.lock().expect("lock").remove(&(user_id, product_id)))
        }

        fn contains(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError> {
            Ok(self.members.lock().expect("lock").contains(&(user_id, product_id)))
        }
    }

    #[test]
    fn non_positive_product_id_is_rejected() {
        let service = WishlistService::new(FakeWishlist::default());
        let err = service.add(1, 0).expect_err("invalid id");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "productId"));
    }

    #[test]
    fn removing_a_missing_item_is_not_found() {
        let service = WishlistService::new(FakeWishlist::default());
        service.add(1, 5).expect("add");

        service.remove(1, 5).expect("remove");
        assert!(matches!(service.remove(1, 5), Err(DomainError::NotFound(_))));
        assert!(!service.contains(1, 5).expect("contains"));
    }
}
