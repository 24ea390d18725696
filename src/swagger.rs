use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{BookingStatus, ConsultantType, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::sync_me,
        handlers::auth::send_otp,
        handlers::auth::verify_otp,
        handlers::consultant::register,
        handlers::consultant::get_profile,
        handlers::consultant::update_profile,
        handlers::consultant::upload_profile_pic,
        handlers::directory::list_consultants,
        handlers::directory::get_consultant,
        handlers::booking::create_booking,
        handlers::booking::list_bookings,
        handlers::admin::verify_consultant,
    ),
    components(
        schemas(
            UserRole,
            ConsultantType,
            BookingStatus,
            UserResponse,
            SyncUserRequest,
            SendOtpRequest,
            SendOtpResponse,
            VerifyOtpRequest,
            ConsultantOwner,
            ConsultantResponse,
            RegisterConsultantRequest,
            UpdateConsultantRequest,
            ProfilePicUpload,
            ProfilePicResponse,
            VerifyConsultantRequest,
            CreateBookingRequest,
            BookingResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Identity sync and email OTP"),
        (name = "consultant", description = "Consultant's own profile"),
        (name = "directory", description = "Public consultant directory"),
        (name = "booking", description = "Consultation bookings"),
        (name = "admin", description = "Operator actions"),
        (name = "health", description = "Liveness"),
    ),
    info(
        title = "Consultly Backend API",
        version = "1.0.0",
        description = "Consultation marketplace REST API documentation"
    ),
    servers(
        (url = "/", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/health",
            "/auth/me",
            "/auth/send-otp",
            "/auth/verify-otp",
            "/consultant/register",
            "/consultant/profile",
            "/consultant/upload-profile-pic",
            "/consultants",
            "/consultants/{id}",
            "/bookings/create",
            "/bookings",
            "/admin/consultants/{id}/verify",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
