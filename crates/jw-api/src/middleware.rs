//! jewel-orders/crates/jw-api/src/middleware.rs Middleware
//!
//! Access logging and CORS for the order API.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

// Standard access log:
// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// The storefront SPA is served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}
