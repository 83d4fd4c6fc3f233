use actix_web::{get, put, web, HttpResponse};
use uuid::Uuid;

use crate::{
    dto::{DataResponse, MessageResponse, RespondToInvitationRequest, SendInvitationRequest},
    errors::AppError,
    service::{self, auth::UserAuthData},
    PGPool,
};

pub async fn send(
    user_auth_data: UserAuthData,
    dto: web::Json<SendInvitationRequest>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let invitation = service::invitation::send(dto.into_inner(), &user_auth_data, conn).await?;
    Ok(HttpResponse::Created().json(MessageResponse::with_data("invitation sent successfully", invitation)))
}

#[get("/my")]
pub async fn get_my(user_auth_data: UserAuthData, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let invitations = service::invitation::list_mine(&user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(invitations)))
}

#[put("/{id}/respond")]
pub async fn respond(
    user_auth_data: UserAuthData,
    id: web::Path<Uuid>,
    dto: web::Json<RespondToInvitationRequest>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let invitation = service::invitation::respond(id.into_inner(), dto.into_inner(), &user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::with_data(
        "invitation response recorded successfully",
        invitation,
    )))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(["", "/"]).route(web::post().to(send)))
        .service(get_my)
        .service(respond);
}
