use super::require_admin;
use crate::domain::account::User;
use crate::domain::catalog::{
    Category, NewCategory, NewProduct, Product, ProductChanges, ProductQuery,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

pub struct CatalogService<R> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repo.list_categories()
    }

    /// Storefront listing: out-of-stock products are always hidden.
    pub fn list_products(&self, mut query: ProductQuery) -> Result<Vec<Product>, DomainError> {
        query.include_out_of_stock = false;
        self.repo.list_products(&query)
    }

    pub fn list_all_products(
        &self,
        admin: &User,
        mut query: ProductQuery,
    ) -> Result<Vec<Product>, DomainError> {
        require_admin(admin)?;
        query.include_out_of_stock = true;
        self.repo.list_products(&query)
    }

    pub fn product(&self, id: i32) -> Result<Product, DomainError> {
        self.repo
            .find_product(id)?
            .ok_or_else(|| DomainError::product_not_found(id))
    }

    pub fn create_category(
        &self,
        admin: &User,
        category: NewCategory,
    ) -> Result<Category, DomainError> {
        require_admin(admin)?;
        let category = self.repo.create_category(category.validated()?)?;
        log::info!("category {} created by admin {}", category.id, admin.id);
        Ok(category)
    }

    pub fn create_product(&self, admin: &User, product: NewProduct) -> Result<Product, DomainError> {
        require_admin(admin)?;
        let product = product.validated()?;
        if let Some(category_id) = product.category_id {
            self.ensure_category(category_id)?;
        }
        let product = self.repo.create_product(product)?;
        log::info!("product {} created by admin {}", product.id, admin.id);
        Ok(product)
    }

    pub fn update_product(
        &self,
        admin: &User,
        id: i32,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        require_admin(admin)?;
        let changes = changes.validated()?;
        if changes.is_empty() {
            return self.product(id);
        }
        if let Some(Some(category_id)) = changes.category_id {
            self.ensure_category(category_id)?;
        }
        let product = self
            .repo
            .update_product(id, changes)?
            .ok_or_else(|| DomainError::product_not_found(id))?;
        log::info!("product {} updated by admin {}", id, admin.id);
        Ok(product)
    }

    pub fn delete_product(&self, admin: &User, id: i32) -> Result<(), DomainError> {
        require_admin(admin)?;
        if !self.repo.delete_product(id)? {
            return Err(DomainError::product_not_found(id));
        }
        log::info!("product {} deleted by admin {}", id, admin.id);
        Ok(())
    }

    fn ensure_category(&self, id: i32) -> Result<(), DomainError> {
        if self.repo.category_exists(id)? {
            Ok(())
        } else {
            Err(DomainError::NotFound(format!("Category {id}")))
        }
    }
}
