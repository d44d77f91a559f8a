use dotenvy::dotenv;
use marketplace_service::{build_server, create_pool, run_migrations, Settings};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().expect("invalid configuration");

    let pool = create_pool(&settings.database_url, settings.pool_size)
        .expect("Failed to create database pool");
    run_migrations(&pool).expect("Failed to run database migrations");

    log::info!(
        "Starting server at http://{}:{} ({} promo codes, first order number {})",
        settings.host,
        settings.port,
        settings.promos.len(),
        settings.checkout.first_order_number
    );

    build_server(pool, &settings)?.await
}
