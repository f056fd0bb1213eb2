use crate::{
    api::envelope,
    auth::{
        jwt::{TokenType, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    error::ApiError,
    model::user::{Profile, User},
    state::AppState,
    store::DirectoryStore,
};
use actix_web::{HttpRequest, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@hrm.local")]
    pub email: String,
    #[schema(example = "Password@123")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    #[schema(example = 900)]
    pub expires_in: usize,
    pub user: Profile,
}

fn issue_tokens(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let config = &state.config;
    let access_token = generate_access_token(
        user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| ApiError::internal(&e, "Failed to sign access token"))?;
    let refresh_token = generate_refresh_token(
        user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| ApiError::internal(&e, "Failed to sign refresh token"))?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
        user: user.into(),
    })
}

/// Exchange email and password for an access/refresh token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(state, body), fields(email = %body.email))]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, ApiError> {
    info!("Login request received");

    let email = body.email.trim().to_lowercase();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = match state.store.find_user_by_email(&email).await? {
        Some(user) if user.is_active => user,
        Some(_) => {
            info!("Invalid credentials: account disabled");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    debug!(user_id = user.id, "Verifying password");
    if let Err(e) = verify_password(&body.password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let tokens = issue_tokens(&state, user)?;
    info!("Login successful");
    Ok(envelope::ok(tokens))
}

/// Trade a refresh token (sent as the bearer token) for a new pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Tokens rotated", body = TokenResponse),
        (status = 401, description = "Missing, invalid or non-refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("No token".into()))?;

    let claims = verify_token(token, &state.config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;
    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized("Refresh token required".into()));
    }

    // role or status may have changed since the token was issued
    let user = match state.store.get_user(claims.user_id).await {
        Ok(user) if user.is_active => user,
        Ok(_) | Err(crate::store::StoreError::NotFound(_)) => {
            return Err(ApiError::Unauthorized("Account no longer active".into()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(envelope::ok(issue_tokens(&state, user)?))
}
