pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;

use std::io;

use actix_web::{App, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use sqlx::{postgres::Postgres, Pool};

use config::Config;
use db::{init_db_pool, run_migrations};
use service::auth::jwt::TokenKeys;

type PGPool = Pool<Postgres>;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    service::log::init_logger();

    let config = Config::from_env().map_err(|err| {
        error!("invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
    })?;

    let pool: PGPool = init_db_pool(&config.database_url, config.max_connections)
        .await
        .map_err(|err| {
            error!("failed to connect to the database: {}", err);
            io::Error::new(io::ErrorKind::Other, err.to_string())
        })?;
    run_migrations(&pool).await.map_err(|err| {
        error!("failed to run migrations: {}", err);
        io::Error::new(io::ErrorKind::Other, err.to_string())
    })?;

    let keys = TokenKeys::new(&config.jwt_secret);
    info!(
        "starting server on {}:{} ({:?})",
        config.host, config.port, config.app_env
    );

    HttpServer::new(move || App::new().configure(handlers::init_routes(pool.clone(), keys.clone())))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
