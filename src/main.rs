use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use consultly_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{CloudinaryStore, IdentityProvider, mailer_from_config},
    handlers,
    middlewares::{IdentityMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let identity_provider = IdentityProvider::new(config.identity.clone());
    if !identity_provider.is_enabled() {
        log::warn!("Identity verification disabled, requests run as the development identity");
    }

    let mailer = mailer_from_config(&config.smtp).expect("Failed to configure SMTP mailer");
    let object_store = CloudinaryStore::new(config.storage.clone());
    if !object_store.is_configured() {
        log::warn!("Object storage not configured, profile picture uploads will fail");
    }

    let user_service = UserService::new(pool.clone());
    let auth_service = AuthService::new(pool.clone(), mailer);
    let consultant_service =
        ConsultantService::new(pool.clone(), user_service.clone(), Arc::new(object_store));
    let booking_service = BookingService::new(pool.clone(), user_service.clone());

    tasks::spawn_all(auth_service.clone());

    let admin_config = config.admin.clone();
    if admin_config.api_key.is_empty() {
        log::warn!("ADMIN_API_KEY not set, admin routes are locked");
    }

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(IdentityMiddleware::new(identity_provider.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(consultant_service.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .app_data(web::Data::new(admin_config.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .configure(handlers::auth_config)
            .configure(handlers::consultant_config)
            .configure(handlers::directory_config)
            .configure(handlers::booking_config)
            .configure(handlers::admin_config)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
