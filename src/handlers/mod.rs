pub mod auth;
pub mod event;
pub mod invitation;
pub mod user;

use actix_web::{get, web, HttpResponse, Responder};
use log::debug;

use crate::{
    errors::AppError,
    service::{auth::jwt::TokenKeys, auth::AuthMiddleware, log::LoggerMiddleware},
    PGPool,
};

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("Server is running")
}

/// Full route table with its shared state. Used by `main` and by the HTTP tests.
pub fn init_routes(pool: PGPool, keys: TokenKeys) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(pool))
            .app_data(web::Data::new(keys.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                debug!("rejected request body: {}", err);
                AppError::validation("invalid request body").into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                debug!("rejected path: {}", err);
                AppError::validation("invalid identifier").into()
            }))
            .service(
                web::scope("")
                    .wrap(AuthMiddleware { keys })
                    .wrap(LoggerMiddleware)
                    .service(health)
                    .service(web::scope("/auth").configure(auth::init_routes))
                    .service(web::scope("/api").configure(user::init_routes))
                    .service(web::scope("/events").configure(event::init_routes))
                    .service(web::scope("/invitations").configure(invitation::init_routes)),
            );
    }
}
