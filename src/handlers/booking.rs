use crate::middlewares::current_identity;
use crate::models::*;
use crate::services::BookingService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/bookings/create",
    tag = "booking",
    request_body = CreateBookingRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "consultant_id, date, and time_slot are required"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User or consultant not found")
    )
)]
pub async fn create_booking(
    booking_service: web::Data<BookingService>,
    req: HttpRequest,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match booking_service
        .create_booking(&identity, request.into_inner())
        .await
    {
        Ok(booking) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            booking,
            "Booking created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/bookings",
    tag = "booking",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's bookings, newest first", body = [BookingResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_bookings(
    booking_service: web::Data<BookingService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match booking_service.list_bookings(&identity).await {
        Ok(bookings) => Ok(HttpResponse::Ok().json(ApiResponse::success(bookings))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn booking_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::get().to(list_bookings))
            .route("/create", web::post().to(create_booking)),
    );
}
