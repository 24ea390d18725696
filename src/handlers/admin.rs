use crate::config::AdminConfig;
use crate::error::AppError;
use crate::models::*;
use crate::services::ConsultantService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// An unset key locks the admin routes entirely.
fn check_admin_key(admin: &AdminConfig, req: &HttpRequest) -> Result<(), AppError> {
    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if !admin.api_key.is_empty() && keys_match(key, &admin.api_key) => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

/// Compares fixed-length digests in constant time so neither the key nor its
/// length leaks through timing.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.ct_eq(&expected).into()
}

#[utoipa::path(
    post,
    path = "/admin/consultants/{id}/verify",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Consultant id"),
        ("X-Admin-Key" = String, Header, description = "Admin API key")
    ),
    request_body(content = VerifyConsultantRequest, description = "Defaults to verified = true"),
    responses(
        (status = 200, description = "Verification flag updated", body = ConsultantResponse),
        (status = 403, description = "Missing or wrong admin key"),
        (status = 404, description = "Consultant not found")
    )
)]
pub async fn verify_consultant(
    consultant_service: web::Data<ConsultantService>,
    admin: web::Data<AdminConfig>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: Option<web::Json<VerifyConsultantRequest>>,
) -> Result<HttpResponse> {
    if let Err(e) = check_admin_key(&admin, &req) {
        log::warn!("Rejected admin request to {}", req.path());
        return Ok(e.error_response());
    }

    let verified = request.and_then(|r| r.verified).unwrap_or(true);
    match consultant_service
        .set_verified(path.into_inner(), verified)
        .await
    {
        Ok(consultant) => Ok(HttpResponse::Ok().json(ApiResponse::success(consultant))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin").route("/consultants/{id}/verify", web::post().to(verify_consultant)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn admin(key: &str) -> AdminConfig {
        AdminConfig {
            api_key: key.to_string(),
        }
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match("admin-secret", "admin-secret"));
        assert!(!keys_match("admin-secreT", "admin-secret"));
        assert!(!keys_match("admin", "admin-secret"));
        assert!(!keys_match("", "admin-secret"));
    }

    #[test]
    fn test_check_admin_key() {
        let req = TestRequest::default()
            .insert_header((ADMIN_KEY_HEADER, "admin-secret"))
            .to_http_request();
        assert!(check_admin_key(&admin("admin-secret"), &req).is_ok());
        assert!(matches!(
            check_admin_key(&admin("other"), &req),
            Err(AppError::Forbidden)
        ));

        // an unset key locks the route even for an empty header
        let req = TestRequest::default()
            .insert_header((ADMIN_KEY_HEADER, ""))
            .to_http_request();
        assert!(check_admin_key(&admin(""), &req).is_err());

        let req = TestRequest::default().to_http_request();
        assert!(check_admin_key(&admin("admin-secret"), &req).is_err());
    }
}
