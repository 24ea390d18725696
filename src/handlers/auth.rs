use crate::middlewares::current_identity;
use crate::models::*;
use crate::services::{AuthService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/auth/me",
    tag = "auth",
    request_body(content = SyncUserRequest, description = "Optional role (applied on creation only) and phone"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Local user for the caller", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn sync_me(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: Option<web::Json<SyncUserRequest>>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    let request = request.map(web::Json::into_inner).unwrap_or_default();

    match user_service.sync_user(&identity, request).await {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/send-otp",
    tag = "auth",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP issued", body = SendOtpResponse),
        (status = 400, description = "Missing or malformed email")
    )
)]
pub async fn send_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.send_otp(request.email.as_deref()).await {
        Ok(email) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            SendOtpResponse { email },
            "OTP sent successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified", body = UserResponse),
        (status = 400, description = "Missing email or OTP"),
        (status = 401, description = "Invalid or expired OTP"),
        (status = 404, description = "User not found")
    )
)]
pub async fn verify_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    match auth_service
        .verify_otp(request.email.as_deref(), request.otp.as_deref())
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            UserResponse::from(user),
            "Email verified successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/me", web::post().to(sync_me))
            .route("/send-otp", web::post().to(send_otp))
            .route("/verify-otp", web::post().to(verify_otp)),
    );
}
