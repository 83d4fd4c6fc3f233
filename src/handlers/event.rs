use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;

use crate::{
    dto::{
        AddAttendeeRequest, CreateEventRequest, DataResponse, MessageResponse, UpdateAttendanceRequest,
        UpdateEventRequest,
    },
    errors::AppError,
    service::{self, auth::UserAuthData},
    PGPool,
};

pub async fn create(
    user_auth_data: UserAuthData,
    dto: web::Json<CreateEventRequest>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let event = service::event::create(&user_auth_data, dto.into_inner(), conn).await?;
    Ok(HttpResponse::Created().json(MessageResponse::with_data("event created successfully", event)))
}

pub async fn get_all(pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let events = service::event::get_all(conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(events)))
}

#[get("/my/attending")]
pub async fn get_my_attending(
    user_auth_data: UserAuthData,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let events = service::event::get_attending(&user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(events)))
}

#[get("/my/organized")]
pub async fn get_my_organized(
    user_auth_data: UserAuthData,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let events = service::event::get_by_organizer(user_auth_data.user_id, conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(events)))
}

#[get("/organizer/{id}")]
pub async fn get_by_organizer(
    organizer_id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let events = service::event::get_by_organizer(organizer_id.into_inner(), conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(events)))
}

#[get("/{id}")]
pub async fn get_by_id(id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let event = service::event::get_by_id(id.into_inner(), conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(event)))
}

#[put("/{id}")]
pub async fn update(
    user_auth_data: UserAuthData,
    id: web::Path<Uuid>,
    dto: web::Json<UpdateEventRequest>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let event = service::event::update(id.into_inner(), dto.into_inner(), &user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::with_data("event updated successfully", event)))
}

#[delete("/{id}")]
pub async fn delete(
    user_auth_data: UserAuthData,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    service::event::delete(id.into_inner(), &user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("event deleted successfully")))
}

#[get("/{id}/attendees")]
pub async fn get_attendees(id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let attendees = service::attendance::get_attendees(id.into_inner(), conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(attendees)))
}

#[post("/{id}/join")]
pub async fn join(
    user_auth_data: UserAuthData,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    service::attendance::join(id.into_inner(), &user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("successfully joined event")))
}

#[post("/{id}/invite")]
pub async fn invite(
    user_auth_data: UserAuthData,
    id: web::Path<Uuid>,
    dto: web::Json<AddAttendeeRequest>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    service::attendance::invite(id.into_inner(), dto.into_inner(), &user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("user invited to event successfully")))
}

#[put("/{id}/attendance")]
pub async fn update_attendance(
    user_auth_data: UserAuthData,
    id: web::Path<Uuid>,
    dto: web::Json<UpdateAttendanceRequest>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    service::attendance::update_status(id.into_inner(), &dto.status, &user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("attendance status updated successfully")))
}

#[get("/{id}/invitations")]
pub async fn get_invitations(
    user_auth_data: UserAuthData,
    id: web::Path<Uuid>,
    pool_state: web::Data<PGPool>,
) -> Result<HttpResponse, AppError> {
    let conn: &PGPool = pool_state.get_ref();
    let invitations = service::invitation::list_for_event(id.into_inner(), &user_auth_data, conn).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(invitations)))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // both `/events` and `/events/` hit the collection
    cfg.service(
        web::resource(["", "/"])
            .route(web::get().to(get_all))
            .route(web::post().to(create)),
    );
    // fixed segments before `/{id}`
    cfg.service(get_my_attending)
        .service(get_my_organized)
        .service(get_by_organizer)
        .service(get_by_id)
        .service(update)
        .service(delete)
        .service(get_attendees)
        .service(join)
        .service(invite)
        .service(update_attendance)
        .service(get_invitations);
}
