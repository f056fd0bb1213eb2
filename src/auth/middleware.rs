use crate::auth::auth::AuthUser;
use crate::auth::jwt::{TokenType, verify_token};
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

fn reject(req: ServiceRequest, message: &str) -> Result<ServiceResponse<BoxBody>, Error> {
    let resp = ApiError::Unauthorized(message.to_string()).error_response();
    Ok(req.into_response(resp))
}

/// Validates the bearer access token and stores the caller as [`AuthUser`]
/// in the request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let state = req
        .app_data::<Data<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::internal(&"AppState not registered", "App state missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_owned(),
            Err(_) => return reject(req, "Invalid Authorization header encoding"),
        },
        None => return reject(req, "Missing Authorization header"),
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return reject(req, "Authorization header must start with Bearer"),
    };

    let claims = match verify_token(token, &state.config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return reject(req, "Invalid or expired token");
        }
    };

    if claims.token_type != TokenType::Access {
        return reject(req, "Access token required");
    }

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role: claims.role,
    });

    next.call(req).await
}
