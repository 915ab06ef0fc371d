use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::CurrentUser;
use crate::domain::cart::{CartLine, CartLineView};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub name: String,
    /// Current product price; the order captures its own price at checkout.
    pub price: i64,
    pub image_url: String,
    pub stock: i32,
    pub subtotal: i64,
}

impl From<CartLineView> for CartItemResponse {
    fn from(line: CartLineView) -> Self {
        CartItemResponse {
            subtotal: line.subtotal(),
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            name: line.name,
            price: line.price,
            image_url: line.image_url,
            stock: line.stock,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        CartLineResponse {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    /// Zero or below removes the line.
    pub quantity: i32,
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with current prices", body = [CartItemResponse]),
        (status = 401, description = "Not logged in"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let lines = web::block(move || state.cart.lines(user.0.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    let body: Vec<CartItemResponse> = lines.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Line added or incremented", body = CartLineResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let AddToCartRequest {
        product_id,
        quantity,
    } = body.into_inner();
    let line = web::block(move || state.cart.add(user.0.id, product_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(CartLineResponse::from(line)))
}

#[utoipa::path(
    put,
    path = "/api/cart/{productId}",
    params(("productId" = i32, Path, description = "Product id")),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Line updated; empty body when removed", body = CartLineResponse),
        (status = 404, description = "Product not in cart"),
    ),
    tag = "cart"
)]
pub async fn update_cart_item(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<UpdateCartRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    let line = web::block(move || state.cart.set_quantity(user.0.id, product_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(match line {
        Some(line) => HttpResponse::Ok().json(CartLineResponse::from(line)),
        None => HttpResponse::Ok().finish(),
    })
}

#[utoipa::path(
    delete,
    path = "/api/cart/{productId}",
    params(("productId" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Line removed"),
        (status = 404, description = "Product not in cart"),
    ),
    tag = "cart"
)]
pub async fn remove_cart_item(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    web::block(move || state.cart.remove(user.0.id, product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().finish())
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses((status = 200, description = "Cart emptied")),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    web::block(move || state.cart.clear(user.0.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().finish())
}
