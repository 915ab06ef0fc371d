use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::session::CurrentUser;
use crate::domain::cart::{WishlistItem, WishlistItemView};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub price: i64,
    pub image_url: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl From<WishlistItemView> for WishlistItemResponse {
    fn from(item: WishlistItemView) -> Self {
        WishlistItemResponse {
            id: item.id,
            product_id: item.product_id,
            name: item.name,
            price: item.price,
            image_url: item.image_url,
            stock: item.stock,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntryResponse {
    pub id: i32,
    pub product_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<WishlistItem> for WishlistEntryResponse {
    fn from(item: WishlistItem) -> Self {
        WishlistEntryResponse {
            id: item.id,
            product_id: item.product_id,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlistRequest {
    pub product_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistCheckResponse {
    pub is_in_wishlist: bool,
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses((status = 200, description = "Wishlist, newest first", body = [WishlistItemResponse])),
    tag = "wishlist"
)]
pub async fn get_wishlist(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let items = web::block(move || state.wishlist.items(user.0.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    let body: Vec<WishlistItemResponse> = items.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Adding a product that is already listed returns the existing entry.
#[utoipa::path(
    post,
    path = "/api/wishlist",
    request_body = AddToWishlistRequest,
    responses(
        (status = 201, description = "Product is on the wishlist", body = WishlistEntryResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "wishlist"
)]
pub async fn add_to_wishlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<AddToWishlistRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = body.into_inner().product_id;
    let item = web::block(move || state.wishlist.add(user.0.id, product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(WishlistEntryResponse::from(item)))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{productId}",
    params(("productId" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Removed"),
        (status = 404, description = "Product not on the wishlist"),
    ),
    tag = "wishlist"
)]
pub async fn remove_from_wishlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    web::block(move || state.wishlist.remove(user.0.id, product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(json!({ "message": "Removed from wishlist" })))
}

#[utoipa::path(
    get,
    path = "/api/wishlist/check/{productId}",
    params(("productId" = i32, Path, description = "Product id")),
    responses((status = 200, description = "Membership", body = WishlistCheckResponse)),
    tag = "wishlist"
)]
pub async fn check_wishlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let is_in_wishlist = web::block(move || state.wishlist.contains(user.0.id, product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(WishlistCheckResponse { is_in_wishlist }))
}
