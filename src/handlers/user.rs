use actix_web::{get, web, HttpResponse};

use crate::{
    dto::MessageResponse,
    errors::AppError,
    service::{self, auth::UserAuthData},
    PGPool,
};

#[get("/profile")]
pub async fn profile(user_auth_data: UserAuthData, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let user = service::user::get_by_id(user_auth_data.user_id, conn).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::with_data("This is a protected route", user)))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(profile);
}
