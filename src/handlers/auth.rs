use actix_web::{post, web, HttpResponse};

use crate::{
    dto::{LoginRequest, RegisterRequest},
    errors::AppError,
    service::{self, auth::jwt::TokenKeys},
    PGPool,
};

#[post("/register")]
pub async fn register(
    dto: web::Json<RegisterRequest>,
    keys: web::Data<TokenKeys>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let response = service::user::register(dto.into_inner(), keys.get_ref(), conn).await?;
    Ok(HttpResponse::Created().json(response))
}

#[post("/login")]
pub async fn login(
    dto: web::Json<LoginRequest>,
    keys: web::Data<TokenKeys>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let response = service::user::login(dto.into_inner(), keys.get_ref(), conn).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login);
}
