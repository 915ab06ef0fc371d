use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::catalog::{
    Category, NewCategory, NewProduct, Product, ProductChanges, ProductQuery, ProductSort,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{categories, products};

use super::is_foreign_key_violation;
use super::models::{CategoryRow, NewCategoryRow, NewProductRow, ProductChangeset, ProductRow};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn category_name(conn: &mut PgConnection, category_id: Option<i32>) -> QueryResult<Option<String>> {
    let Some(id) = category_id else {
        return Ok(None);
    };
    categories::table
        .find(id)
        .select(categories::name)
        .first(conn)
        .optional()
}

impl CatalogRepository for DieselCatalogRepository {
    fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = categories::table
            .select(CategoryRow::as_select())
            .order((categories::name.asc(), categories::id.asc()))
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(categories::table)
            .values(&NewCategoryRow {
                name: category.name,
                description: category.description,
                image_url: category.image_url,
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn category_exists(&self, id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let exists = diesel::select(diesel::dsl::exists(categories::table.find(id)))
            .get_result(&mut conn)?;
        Ok(exists)
    }

    fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut sql = products::table
            .left_join(categories::table)
            .select((ProductRow::as_select(), categories::name.nullable()))
            .into_boxed();

        if !query.include_out_of_stock {
            sql = sql.filter(products::stock.gt(0));
        }
        if let Some(category_id) = query.category_id {
            sql = sql.filter(products::category_id.eq(category_id));
        }
        if let Some(featured) = query.featured {
            sql = sql.filter(products::featured.eq(featured));
        }
        if let Some(pattern) = query.search_pattern() {
            sql = sql.filter(
                products::name
                    .ilike(pattern.clone())
                    .or(products::description.ilike(pattern)),
            );
        }

        sql = match query.sort {
            ProductSort::Newest => sql.order(products::created_at.desc()),
            ProductSort::PriceAsc => sql.order(products::price.asc()),
            ProductSort::PriceDesc => sql.order(products::price.desc()),
            ProductSort::Name => sql.order(products::name.asc()),
        };

        let rows = sql
            .then_order_by(products::id.desc())
            .limit(query.limit)
            .offset(query.offset)
            .load::<(ProductRow, Option<String>)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(row, category)| row.into_product(category))
            .collect())
    }

    fn find_product(&self, id: i32) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .left_join(categories::table)
            .filter(products::id.eq(id))
            .select((ProductRow::as_select(), categories::name.nullable()))
            .first::<(ProductRow, Option<String>)>(&mut conn)
            .optional()?;
        Ok(row.map(|(row, category)| row.into_product(category)))
    }

    fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                name: product.name,
                description: product.description,
                price: product.price,
                stock: product.stock,
                category_id: product.category_id,
                image_url: product.image_url,
                images: serde_json::to_value(&product.images)?,
                featured: product.featured,
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DomainError::NotFound("Category".to_string())
                } else {
                    e.into()
                }
            })?;
        let category = category_name(&mut conn, row.category_id)?;
        Ok(row.into_product(category))
    }

    fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let changeset = ProductChangeset {
            name: changes.name,
            description: changes.description,
            price: changes.price,
            stock: changes.stock,
            category_id: changes.category_id,
            image_url: changes.image_url,
            images: changes.images.map(serde_json::to_value).transpose()?,
            featured: changes.featured,
            updated_at: Utc::now(),
        };
        let row = diesel::update(products::table.find(id))
            .set(&changeset)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DomainError::NotFound("Category".to_string())
                } else {
                    e.into()
                }
            })?;
        let Some(row) = row else {
            return Ok(None);
        };
        let category = category_name(&mut conn, row.category_id)?;
        Ok(Some(row.into_product(category)))
    }

    fn delete_product(&self, id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        match diesel::delete(products::table.find(id)).execute(&mut conn) {
            Ok(deleted) => Ok(deleted > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(DomainError::Conflict(format!(
                "Product {id} has been ordered and cannot be deleted"
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
