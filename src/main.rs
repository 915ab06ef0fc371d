use actix_web::web;
use dotenvy::dotenv;
use storefront::config::Config;
use storefront::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(
        pool,
        config.session_ttl,
        config.cookie_secure,
    ));

    if let Some(admin) = &config.admin {
        let bootstrap = state.clone();
        let (email, password) = (admin.email.clone(), admin.password.clone());
        web::block(move || {
            bootstrap
                .accounts
                .ensure_admin("Administrator", &email, &password)
        })
        .await
        .map_err(std::io::Error::other)?
        .map_err(std::io::Error::other)?;
    }

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
