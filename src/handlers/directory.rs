use crate::models::*;
use crate::services::ConsultantService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/consultants",
    tag = "directory",
    params(
        ("domain" = Option<String>, Query, description = "Case-insensitive substring of the consultant's domain")
    ),
    responses(
        (status = 200, description = "Verified consultants", body = [ConsultantResponse])
    )
)]
pub async fn list_consultants(
    consultant_service: web::Data<ConsultantService>,
    query: web::Query<DirectoryQuery>,
) -> Result<HttpResponse> {
    match consultant_service.list_directory(&query).await {
        Ok(consultants) => Ok(HttpResponse::Ok().json(ApiResponse::success(consultants))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/consultants/{id}",
    tag = "directory",
    params(
        ("id" = i64, Path, description = "Consultant id")
    ),
    responses(
        (status = 200, description = "Consultant", body = ConsultantResponse),
        (status = 404, description = "Consultant not found")
    )
)]
pub async fn get_consultant(
    consultant_service: web::Data<ConsultantService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match consultant_service.get_consultant(path.into_inner()).await {
        Ok(consultant) => Ok(HttpResponse::Ok().json(ApiResponse::success(consultant))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn directory_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/consultants")
            .route("", web::get().to(list_consultants))
            .route("/{id}", web::get().to(get_consultant)),
    );
}
