pub mod admin;
pub mod auth;
pub mod booking;
pub mod consultant;
pub mod directory;
pub mod health;

pub use admin::admin_config;
pub use auth::auth_config;
pub use booking::booking_config;
pub use consultant::consultant_config;
pub use directory::directory_config;
pub use health::health_config;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdminConfig, IdentityConfig};
    use crate::database::test_pool;
    use crate::external::{IdentityProvider, LogMailer, ObjectStore};
    use crate::middlewares::{DEV_EMAIL_HEADER, IdentityMiddleware};
    use crate::services::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use async_trait::async_trait;
    use sea_orm::DatabaseConnection;
    use serde_json::{Value, json};
    use std::sync::Arc;

    const ADMIN_KEY: &str = "admin-secret";

    struct StaticStore;

    #[async_trait]
    impl ObjectStore for StaticStore {
        async fn upload_image(
            &self,
            _bytes: Vec<u8>,
            filename: &str,
            _content_type: &str,
        ) -> anyhow::Result<String> {
            Ok(format!("https://img.example.com/{filename}"))
        }
    }

    fn routes(pool: DatabaseConnection) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg| {
            let user_service = UserService::new(pool.clone());
            cfg.app_data(web::Data::new(AuthService::new(
                pool.clone(),
                Arc::new(LogMailer),
            )))
            .app_data(web::Data::new(ConsultantService::new(
                pool.clone(),
                user_service.clone(),
                Arc::new(StaticStore),
            )))
            .app_data(web::Data::new(BookingService::new(
                pool.clone(),
                user_service.clone(),
            )))
            .app_data(web::Data::new(user_service))
            .app_data(web::Data::new(AdminConfig {
                api_key: ADMIN_KEY.to_string(),
            }))
            .configure(health_config)
            .configure(auth_config)
            .configure(consultant_config)
            .configure(directory_config)
            .configure(booking_config)
            .configure(admin_config);
        }
    }

    fn dev_identity() -> IdentityMiddleware {
        IdentityMiddleware::new(IdentityProvider::new(IdentityConfig::default()))
    }

    #[actix_web::test]
    async fn test_marketplace_flow() {
        let pool = test_pool().await;
        let app = test::init_service(App::new().wrap(dev_identity()).configure(routes(pool))).await;

        // register as a consultant
        let req = test::TestRequest::post()
            .uri("/consultant/register")
            .insert_header((DEV_EMAIL_HEADER, "c@x.com"))
            .set_json(json!({ "domain": "Corporate Tax", "hourly_price": "150" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["type"], "Individual");
        assert_eq!(body["data"]["hourly_price"], 150.0);
        let consultant_id = body["data"]["id"].as_i64().unwrap();

        // unverified consultants are hidden from the directory
        let req = test::TestRequest::get().uri("/consultants").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"], json!([]));

        let verify_uri = format!("/admin/consultants/{consultant_id}/verify");
        let req = test::TestRequest::post().uri(&verify_uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri(&verify_uri)
            .insert_header(("X-Admin-Key", ADMIN_KEY))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/consultants?domain=TAX")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["user"]["email"], "c@x.com");

        // a client books the consultant
        let req = test::TestRequest::post()
            .uri("/auth/me")
            .insert_header((DEV_EMAIL_HEADER, "client@x.com"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["role"], "USER");
        assert_eq!(body["data"]["firebase_uid"], "dev-client@x.com");
        assert!(body["data"].get("otp_code").is_none());

        let req = test::TestRequest::post()
            .uri("/bookings/create")
            .insert_header((DEV_EMAIL_HEADER, "client@x.com"))
            .set_json(json!({
                "consultant_id": consultant_id,
                "date": "2025-11-03",
                "time_slot": "10:00 AM"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], "PENDING");

        let req = test::TestRequest::get()
            .uri("/bookings")
            .insert_header((DEV_EMAIL_HEADER, "client@x.com"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["consultant"]["user"]["email"], "c@x.com");
    }

    #[actix_web::test]
    async fn test_error_envelope() {
        let pool = test_pool().await;
        let app = test::init_service(App::new().wrap(dev_identity()).configure(routes(pool))).await;

        let req = test::TestRequest::post()
            .uri("/consultant/register")
            .set_json(json!({ "domain": "Tax" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Domain and hourly_price are required");

        let req = test::TestRequest::get().uri("/consultants/404").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/consultant/profile").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "User not found");
    }

    #[actix_web::test]
    async fn test_send_and_verify_otp_endpoints() {
        let pool = test_pool().await;
        let app = test::init_service(App::new().wrap(dev_identity()).configure(routes(pool))).await;

        let req = test::TestRequest::post()
            .uri("/auth/send-otp")
            .set_json(json!({ "email": "not-an-email" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/auth/send-otp")
            .set_json(json!({ "email": "a@x.com" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "OTP sent successfully");
        assert_eq!(body["data"]["email"], "a@x.com");

        let req = test::TestRequest::post()
            .uri("/auth/verify-otp")
            .set_json(json!({ "email": "a@x.com", "otp": "000000" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Invalid OTP");
    }

    fn multipart_body(boundary: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    #[actix_web::test]
    async fn test_upload_profile_pic_endpoint() {
        let pool = test_pool().await;
        let app = test::init_service(App::new().wrap(dev_identity()).configure(routes(pool))).await;

        let req = test::TestRequest::post()
            .uri("/consultant/register")
            .set_json(json!({ "domain": "Tax", "hourly_price": 100 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let boundary = "consultly-boundary";
        let multipart = format!("multipart/form-data; boundary={boundary}");

        let req = test::TestRequest::post()
            .uri("/consultant/upload-profile-pic")
            .insert_header(("Content-Type", multipart.as_str()))
            .set_payload(multipart_body(boundary, "text/plain", b"hello"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/consultant/upload-profile-pic")
            .insert_header(("Content-Type", multipart.as_str()))
            .set_payload(multipart_body(boundary, "image/png", &[137, 80, 78, 71]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["profile_pic"], "https://img.example.com/me.png");
        assert_eq!(
            body["data"]["consultant"]["profile_pic"],
            "https://img.example.com/me.png"
        );

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
