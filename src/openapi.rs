use utoipa::OpenApi;

use crate::handlers::{auth, cart, orders, products, wishlist};

#[derive(OpenApi)]
#[openapi(
    info(title = "Storefront API"),
    paths(
        auth::register,
        auth::login,
        auth::logout,
        auth::current_user,
        products::list_categories,
        products::create_category,
        products::list_products,
        products::list_all_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::check_wishlist,
        orders::create_order,
        orders::get_order,
        orders::list_orders,
    ),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "catalog", description = "Public product catalog"),
        (name = "admin", description = "Product administration"),
        (name = "cart", description = "Shopping cart"),
        (name = "wishlist", description = "Wishlist"),
        (name = "orders", description = "Checkout and order history"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_checkout_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/wishlist/check/{productId}"));
    }
}
