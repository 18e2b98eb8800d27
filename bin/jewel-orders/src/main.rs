//! # jewel-orders Binary
//!
//! The entry point that assembles the application based on compile-time features.
//!
//! `jewel-orders` serves the API; `jewel-orders token <user-uuid> [--admin]`
//! prints a bearer token signed with the configured secret.

mod settings;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use jw_api::handlers::AppState;
use jw_api::middleware;
use jw_core::traits::AuthProvider;
use uuid::Uuid;

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use jw_db_sqlite::SqliteOrderRepo;

#[cfg(feature = "auth-simple")]
use jw_auth_simple::SimpleAuthProvider;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = settings::Settings::load()?;
    if settings.dev_secret {
        log::warn!("JEWEL_AUTH__TOKEN_SECRET is not set, signing tokens with the development secret");
    }

    // 1. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new(&settings.token_secret)
        .map_err(|e| anyhow::anyhow!("unusable token secret: {}", e))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("token") {
        return print_token(&auth, &args[1..]);
    }

    // 2. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteOrderRepo::new(&settings.database.url).await?;

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState::new(Arc::new(repo), Box::new(auth)));

    log::info!(
        "jewel-orders starting on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy())
            .wrap(middleware::standard_middleware())
            .service(web::scope("/api").configure(jw_api::configure_routes))
    })
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await?;

    Ok(())
}

fn print_token(auth: &dyn AuthProvider, args: &[String]) -> anyhow::Result<()> {
    let user = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("usage: jewel-orders token <user-uuid> [--admin]"))?;
    let user_id = Uuid::parse_str(user)?;
    let is_admin = args.iter().any(|arg| arg == "--admin");

    println!("{}", auth.issue_token(user_id, is_admin));
    Ok(())
}
