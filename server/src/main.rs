//! Barter marketplace server binary
//!
//! Wires configuration, the SQLite pool, and the HTTP surface together.
//! All routes live under `/api`; sessions are signed cookies.

use actix_cors::Cors;
use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use time::Duration;
use tracing::info;

use server::config::{ChainConfig, SessionConfig};
use server::db::{create_pool, run_migrations};
use server::handlers::{auth, escrow, orders, user};
use server::services::{EscrowService, OrderService};

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    server::logging::init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "marketplace.db".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let session_config = SessionConfig::from_env().context("Invalid session configuration")?;
    let chain_config = ChainConfig::from_env().context("Invalid chain configuration")?;

    let pool = create_pool(&database_url).context("Failed to create database pool")?;
    run_migrations(&pool).context("Failed to run database migrations")?;

    let order_service = OrderService::new(pool.clone());
    let escrow_service = EscrowService::new(pool.clone(), chain_config.clone());

    let secret_key = session_config.key.clone();
    let cookie_name = session_config.cookie_name.clone();
    let cookie_secure = session_config.cookie_secure;
    let session_ttl = Duration::seconds(session_config.ttl_seconds());

    info!(addr = %bind_addr, chain = %chain_config.chain, "Starting barter marketplace server");

    HttpServer::new(move || {
        let cors = match std::env::var("CORS_ALLOWED_ORIGIN") {
            Ok(origin) if !origin.is_empty() => Cors::default()
                .allowed_origin(&origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600),
            _ => Cors::default()
                .allowed_origin("http://localhost:3000")
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600),
        };

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_name(cookie_name.clone())
                    .cookie_secure(cookie_secure)
                    .cookie_http_only(true)
                    .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
                    .build(),
            )
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(session_config.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(escrow_service.clone()))
            .route("/api/health", web::get().to(health_check))
            .service(
                web::scope("/api/auth")
                    .service(auth::nonce)
                    .service(auth::siwe_login)
                    .service(auth::logout)
                    .service(auth::me),
            )
            .service(
                web::scope("/api/user").route("/update", web::post().to(user::update_profile)),
            )
            .service(
                web::scope("/api/order")
                    .route("/create", web::post().to(orders::create))
                    .route("/complete", web::post().to(orders::complete))
                    .route("/my-orders", web::get().to(orders::my_orders)),
            )
            .service(
                web::scope("/api/orders")
                    .route("/list", web::get().to(orders::list))
                    .route("/getList", web::get().to(orders::list))
                    .route("/get", web::get().to(orders::detail_by_query))
                    .route("/accept", web::post().to(orders::accept))
                    .route("/delete", web::post().to(orders::delete))
                    .route("/share-token", web::post().to(orders::generate_share_token))
                    .route("/revoke", web::post().to(orders::revoke_share_token))
                    .route("/{id}", web::get().to(orders::detail)),
            )
            .service(
                web::scope("/api/escrow")
                    .route("/create", web::post().to(escrow::create))
                    .route("/fund", web::post().to(escrow::fund))
                    .route("/accept", web::post().to(escrow::accept))
                    .route("/complete", web::post().to(escrow::complete))
                    .route("/status", web::get().to(escrow::status)),
            )
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {bind_addr}"))?
    .run()
    .await
    .context("Server error")
}
