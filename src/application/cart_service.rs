use crate::domain::cart::{CartLine, CartLineView, MAX_LINE_QUANTITY};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

pub struct CartService<R> {
    repo: R,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn lines(&self, user_id: i32) -> Result<Vec<CartLineView>, DomainError> {
        self.repo.lines(user_id)
    }

    /// Adding a product already in the cart increases its quantity. Stock is
    /// not checked here; it is only authoritative at checkout.
    pub fn add(&self, user_id: i32, product_id: i32, quantity: i32) -> Result<CartLine, DomainError> {
        if product_id <= 0 {
            return Err(DomainError::invalid("productId", "must be a positive integer"));
        }
        if quantity <= 0 {
            return Err(DomainError::invalid("quantity", "must be a positive integer"));
        }
        check_line_limit(quantity)?;
        self.repo.add(user_id, product_id, quantity)
    }

    /// A quantity of zero or below removes the line; `Ok(None)` reports that.
    pub fn set_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError> {
        if quantity <= 0 {
            self.remove(user_id, product_id)?;
            return Ok(None);
        }
        check_line_limit(quantity)?;
        self.repo
            .set_quantity(user_id, product_id, quantity)?
            .map(Some)
            .ok_or_else(cart_item_not_found)
    }

    pub fn remove(&self, user_id: i32, product_id: i32) -> Result<(), DomainError> {
        if self.repo.remove(user_id, product_id)? {
            Ok(())
        } else {
            Err(cart_item_not_found())
        }
    }

    pub fn clear(&self, user_id: i32) -> Result<usize, DomainError> {
        self.repo.clear(user_id)
    }
}

fn check_line_limit(quantity: i32) -> Result<(), DomainError> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(DomainError::invalid(
            "quantity",
            format!("must be at most {MAX_LINE_QUANTITY}"),
        ));
    }
    Ok(())
}

fn cart_item_not_found() -> DomainError {
    DomainError::NotFound("Cart item".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeCart {
        rows: Mutex<HashMap<(i32, i32), i32>>,
    }

    impl CartRepository for FakeCart {
        fn lines(&self, _user_id: i32) -> Result<Vec<CartLineView>, DomainError> {
            Ok(vec![])
        }

        fn add(&self, user_id: i32, product_id: i32, quantity: i32) -> Result<CartLine, DomainError> {
            let mut rows = self.rows.lock().expect("lock");
            let qty = rows.entry((user_id, product_id)).or_insert(0);
            *qty += quantity;
            Ok(CartLine {
                id: 1,
                user_id,
                product_id,
                quantity: *qty,
            })
        }

        fn set_quantity(
            &self,
            user_id: i32,
            product_id: i32,
            quantity: i32,
        ) -> Result<Option<CartLine>, DomainError> {
            let mut rows = self.rows.lock().expect("lock");
            Ok(rows.get_mut(&(user_id, product_id)).map(|qty| {
                *qty = quantity;
                CartLine {
                    id: 1,
                    user_id,
                    product_id,
                    quantity,
                }
            }))
        }

        fn remove(&self, user_id: i32, product_id: i32) -> Result<bool, DomainError> {
            Ok(self
                .rows
                .lock()
                .expect("lock")
                .remove(&(user_id, product_id))
                .is_some())
        }

        fn clear(&self, user_id: i32) -> Result<usize, DomainError> {
            let mut rows = self.rows.lock().expect("lock");
            let before = rows.len();
            rows.retain(|(uid, _), _| *uid != user_id);
            Ok(before - rows.len())
        }
    }

    #[test]
    fn non_positive_add_quantity_is_rejected() {
        let service = CartService::new(FakeCart::default());
        let err = service.add(1, 2, 0).expect_err("zero quantity");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "quantity"));
    }

    #[test]
    fn quantities_above_the_line_limit_are_rejected() {
        let service = CartService::new(FakeCart::default());

        let err = service
            .add(1, 2, MAX_LINE_QUANTITY + 1)
            .expect_err("too many");
        assert!(matches!(err, DomainError::InvalidRequest { field, .. } if field == "quantity"));
        assert!(service.add(1, 2, i32::MAX).is_err());
        assert!(service.repo.rows.lock().expect("lock").is_empty());

        service.add(1, 2, 1).expect("add");
        assert!(service.set_quantity(1, 2, MAX_LINE_QUANTITY + 1).is_err());
        assert_eq!(
            service
                .set_quantity(1, 2, MAX_LINE_QUANTITY)
                .expect("at the limit")
                .map(|line| line.quantity),
            Some(MAX_LINE_QUANTITY)
        );
    }

    #[test]
    fn zero_quantity_update_removes_the_line() {
        let service = CartService::new(FakeCart::default());
        service.add(1, 2, 3).expect("add");

        assert_eq!(service.set_quantity(1, 2, 0).expect("remove"), None);
        assert!(service.repo.rows.lock().expect("lock").is_empty());
    }

    #[test]
    fn zero_quantity_update_on_missing_line_is_not_found() {
        let service = CartService::new(FakeCart::default());
        assert!(matches!(
            service.set_quantity(1, 2, -1),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn positive_update_on_missing_line_is_not_found() {
        let service = CartService::new(FakeCart::default());
        assert!(matches!(
            service.set_quantity(1, 2, 4),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn removing_twice_reports_not_found() {
        let service = CartService::new(FakeCart::default());
        service.add(1, 2, 1).expect("add");
        service.remove(1, 2).expect("first remove");
        assert!(matches!(service.remove(1, 2), Err(DomainError::NotFound(_))));
    }
}
