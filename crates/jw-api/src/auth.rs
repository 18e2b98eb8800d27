//! # Request identity
//!
//! Extractors that resolve the `Authorization: Bearer <token>` header to a
//! `Requester` through the configured `AuthProvider`.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use jw_core::error::AppError;
use jw_core::models::Requester;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Any caller holding a valid token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Requester);

/// A caller holding a valid administrator token.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Requester);

fn authenticate(req: &HttpRequest) -> Result<Requester, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state is not registered".to_string()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    state.auth.verify_token(token).ok_or_else(|| {
        log::warn!("rejected bearer token from {:?}", req.peer_addr());
        AppError::Unauthorized("Not authorized, token failed".to_string()).into()
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(AuthenticatedUser))
    }
}

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let admin = authenticate(req).and_then(|requester| {
            if requester.is_admin {
                Ok(AdminUser(requester))
            } else {
                Err(AppError::Forbidden("Not authorized as an admin".to_string()).into())
            }
        });
        ready(admin)
    }
}
