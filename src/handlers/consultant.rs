use crate::error::{AppError, AppResult};
use crate::middlewares::current_identity;
use crate::models::*;
use crate::services::{ConsultantService, ImageUpload};
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use futures_util::TryStreamExt;

pub const MAX_PROFILE_PIC_BYTES: usize = 5 * 1024 * 1024;

#[utoipa::path(
    post,
    path = "/consultant/register",
    tag = "consultant",
    request_body = RegisterConsultantRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Profile created or replaced", body = ConsultantResponse),
        (status = 400, description = "Domain and hourly_price are required"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn register(
    consultant_service: web::Data<ConsultantService>,
    req: HttpRequest,
    request: web::Json<RegisterConsultantRequest>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match consultant_service
        .register(&identity, request.into_inner())
        .await
    {
        Ok(consultant) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            consultant,
            "Consultant profile created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/consultant/profile",
    tag = "consultant",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's consultant profile", body = ConsultantResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User or profile not found")
    )
)]
pub async fn get_profile(
    consultant_service: web::Data<ConsultantService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match consultant_service.get_profile(&identity).await {
        Ok(consultant) => Ok(HttpResponse::Ok().json(ApiResponse::success(consultant))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/consultant/profile",
    tag = "consultant",
    request_body = UpdateConsultantRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile updated", body = ConsultantResponse),
        (status = 400, description = "Invalid field value"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User or profile not found")
    )
)]
pub async fn update_profile(
    consultant_service: web::Data<ConsultantService>,
    req: HttpRequest,
    request: web::Json<UpdateConsultantRequest>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match consultant_service
        .update_profile(&identity, request.into_inner())
        .await
    {
        Ok(consultant) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            consultant,
            "Profile updated successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/consultant/upload-profile-pic",
    tag = "consultant",
    request_body(content = ProfilePicUpload, content_type = "multipart/form-data"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Picture stored", body = ProfilePicResponse),
        (status = 400, description = "No file, not an image, or larger than 5 MB"),
        (status = 404, description = "Consultant profile not found"),
        (status = 502, description = "Object store rejected the upload")
    )
)]
pub async fn upload_profile_pic(
    consultant_service: web::Data<ConsultantService>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    let upload = match read_image(payload).await {
        Ok(upload) => upload,
        Err(e) => return Ok(e.error_response()),
    };

    match consultant_service.upload_profile_pic(&identity, upload).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "Profile picture uploaded successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Reads the `file` field, rejecting non-images and anything over
/// [`MAX_PROFILE_PIC_BYTES`]. Other fields are drained and ignored.
async fn read_image(mut payload: Multipart) -> AppResult<ImageUpload> {
    while let Some(mut field) = payload.try_next().await? {
        if field.name() != "file" {
            while field.try_next().await?.is_some() {}
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(AppError::ValidationError(
                "Only image files are allowed".to_string(),
            ));
        }
        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("profile-pic")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > MAX_PROFILE_PIC_BYTES {
                return Err(AppError::ValidationError(
                    "File too large (max 5MB)".to_string(),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            break;
        }
        return Ok(ImageUpload {
            bytes,
            filename,
            content_type,
        });
    }

    Err(AppError::ValidationError("No file provided".to_string()))
}

pub fn consultant_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/consultant")
            .route("/register", web::post().to(register))
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/upload-profile-pic", web::post().to(upload_profile_pic)),
    );
}
