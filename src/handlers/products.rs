use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::session::CurrentUser;
use crate::domain::catalog::{
    Category, NewCategory, NewProduct, Product, ProductChanges, ProductQuery, ProductSort,
};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        CategoryResponse {
            id: c.id,
            name: c.name,
            description: c.description,
            image_url: c.image_url,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Minor currency units.
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

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            category_id: p.category_id,
            category_name: p.category_name,
            image_url: p.image_url,
            images: p.images,
            featured: p.featured,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub category_id: Option<i32>,
    pub image_url: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Omitted fields are left unchanged. An explicit `"categoryId": null`
/// removes the product from its category.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
}

/// Wraps any present value, `null` included, in `Some`; a missing field
/// falls back to `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListParams {
    /// Category id.
    pub category: Option<i32>,
    pub featured: Option<bool>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    /// Defaults to 50, maximum 100.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort: Option<ProductSort>,
}

impl From<ProductListParams> for ProductQuery {
    fn from(p: ProductListParams) -> Self {
        ProductQuery {
            category_id: p.category,
            featured: p.featured,
            search: p.search,
            sort: p.sort.unwrap_or_default(),
            ..ProductQuery::default()
        }
        .paginate(p.limit, p.offset)
    }
}

fn product_list(products: Vec<Product>) -> Vec<ProductResponse> {
    products.into_iter().map(ProductResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories by name", body = [CategoryResponse])),
    tag = "catalog"
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = web::block(move || state.catalog.categories())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    let body: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Admin access required"),
    ),
    tag = "admin"
)]
pub async fn create_category(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let category = NewCategory {
        name: body.name,
        description: body.description,
        image_url: body.image_url,
    };
    let created = web::block(move || state.catalog.create_category(&user.0, category))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

/// GET /api/products
///
/// Storefront listing. Products without stock are never returned here.
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListParams),
    responses((status = 200, description = "In-stock products", body = [ProductResponse])),
    tag = "catalog"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductListParams>,
) -> Result<HttpResponse, AppError> {
    let query = ProductQuery::from(query.into_inner());
    let products = web::block(move || state.catalog.list_products(query))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(product_list(products)))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(ProductListParams),
    responses(
        (status = 200, description = "All products including out of stock", body = [ProductResponse]),
        (status = 403, description = "Admin access required"),
    ),
    tag = "admin"
)]
pub async fn list_all_products(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ProductListParams>,
) -> Result<HttpResponse, AppError> {
    let query = ProductQuery::from(query.into_inner());
    let products = web::block(move || state.catalog.list_all_products(&user.0, query))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(product_list(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || state.catalog.product(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Category not found"),
    ),
    tag = "admin"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let product = NewProduct {
        name: body.name,
        description: body.description,
        price: body.price,
        stock: body.stock,
        category_id: body.category_id,
        image_url: body.image_url,
        images: body.images,
        featured: body.featured,
    };
    let created = web::block(move || state.catalog.create_product(&user.0, product))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
    ),
    tag = "admin"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = ProductChanges {
        name: body.name,
        description: body.description,
        price: body.price,
        stock: body.stock,
        category_id: body.category_id,
        image_url: body.image_url,
        images: body.images,
        featured: body.featured,
    };
    let updated = web::block(move || state.catalog.update_product(&user.0, id, changes))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product appears in orders"),
    ),
    tag = "admin"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.catalog.delete_product(&user.0, id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::NoContent().finish())
}
