pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use actix_web::{error, middleware::Logger, web, App, HttpRequest, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::account_service::AccountService;
use application::cart_service::CartService;
use application::catalog_service::CatalogService;
use application::order_service::OrderService;
use application::wishlist_service::WishlistService;
use errors::AppError;
use handlers::{auth, cart, orders, products, wishlist};
use infrastructure::{
    DieselAccountRepository, DieselCartRepository, DieselCatalogRepository, DieselOrderRepository,
    DieselWishlistRepository,
};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    let mut conn = pool
        .get()
        .map_err(|e| AppError::Internal(format!("no connection for migrations: {e}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| AppError::Internal(format!("migrations failed: {e}")))?;
    Ok(())
}

/// Services shared by every worker.
pub struct AppState {
    pub accounts: AccountService<DieselAccountRepository>,
    pub catalog: CatalogService<DieselCatalogRepository>,
    pub cart: CartService<DieselCartRepository>,
    pub wishlist: WishlistService<DieselWishlistRepository>,
    pub orders: OrderService<DieselOrderRepository>,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(pool: DbPool, session_ttl: chrono::Duration, cookie_secure: bool) -> Self {
        AppState {
            accounts: AccountService::new(DieselAccountRepository::new(pool.clone()), session_ttl),
            catalog: CatalogService::new(DieselCatalogRepository::new(pool.clone())),
            cart: CartService::new(DieselCartRepository::new(pool.clone())),
            wishlist: WishlistService::new(DieselWishlistRepository::new(pool.clone())),
            orders: OrderService::new(DieselOrderRepository::new(pool)),
            cookie_secure,
        }
    }
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid request body: {err}")).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid query string: {err}")).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid path parameter: {err}")).into()
}

/// Registers the `/api` routes and extractor error handlers. The caller
/// provides `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::scope("/api")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/logout", web::post().to(auth::logout))
                .route("/user", web::get().to(auth::current_user))
                .service(
                    web::resource("/categories")
                        .route(web::get().to(products::list_categories))
                        .route(web::post().to(products::create_category)),
                )
                .service(
                    web::resource("/products")
                        .route(web::get().to(products::list_products))
                        .route(web::post().to(products::create_product)),
                )
                .service(
                    web::resource("/products/{id}")
                        .route(web::get().to(products::get_product))
                        .route(web::put().to(products::update_product))
                        .route(web::delete().to(products::delete_product)),
                )
                .route("/admin/products", web::get().to(products::list_all_products))
                .service(
                    web::resource("/cart")
                        .route(web::get().to(cart::get_cart))
                        .route(web::post().to(cart::add_to_cart))
                        .route(web::delete().to(cart::clear_cart)),
                )
                .service(
                    web::resource("/cart/{productId}")
                        .route(web::put().to(cart::update_cart_item))
                        .route(web::delete().to(cart::remove_cart_item)),
                )
                .service(
                    web::resource("/wishlist")
                        .route(web::get().to(wishlist::get_wishlist))
                        .route(web::post().to(wishlist::add_to_wishlist)),
                )
                .route(
                    "/wishlist/check/{productId}",
                    web::get().to(wishlist::check_wishlist),
                )
                .route(
                    "/wishlist/{productId}",
                    web::delete().to(wishlist::remove_from_wishlist),
                )
                .service(
                    web::resource("/orders")
                        .route(web::post().to(orders::create_order))
                        .route(web::get().to(orders::list_orders)),
                )
                .route("/orders/{id}", web::get().to(orders::get_order)),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let api_doc = openapi::ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", api_doc.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
