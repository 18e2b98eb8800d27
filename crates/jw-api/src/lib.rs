//! # jw-api
//!
//! The web routing and orchestration layer for jewel-orders.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the order routes.
///
/// # Developer Note
/// Paths are relative; the binary mounts them under `/api`. Body and query
/// extraction failures answer with the same `{"message"}` shape as every
/// other error.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error))
        .app_data(web::QueryConfig::default().error_handler(error::query_error))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/orders")
                // Checkout and the admin listing
                .route("", web::post().to(handlers::create_order))
                .route("", web::get().to(handlers::list_orders))
                .route("/myorders", web::get().to(handlers::my_orders))
                .route("/by-id/{id}", web::get().to(handlers::get_order))
                // Admin mutations
                .route("/status/{id}", web::put().to(handlers::update_status))
                .route("/{id}/payment", web::put().to(handlers::update_payment))
                .route("/{id}/tracking", web::put().to(handlers::update_tracking))
                .route("/{id}/notes", web::put().to(handlers::update_notes))
                .route("/{id}/cancel", web::put().to(handlers::cancel_order)),
        );
}
