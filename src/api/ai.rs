//! Pass-through to the external AI insights service.
//!
//! Attrition prediction and resume scoring are computed elsewhere; these
//! endpoints forward the call and wrap the upstream JSON in the envelope.
use crate::api::envelope;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{Responder, web};
use anyhow::Context;
use serde_json::Value;
use std::time::Duration;

#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl AiClient {
    pub fn new(base_url: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build AI service HTTP client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        self.base_url
            .as_deref()
            .map(|base| format!("{base}{path}"))
            .ok_or_else(|| ApiError::ServiceUnavailable("AI insights are not configured".into()))
    }

    async fn forward(&self, request: reqwest::RequestBuilder, path: &str) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, path, "AI service unreachable");
            ApiError::BadGateway("AI service unreachable".into())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, path, "AI service returned an error");
            return Err(ApiError::BadGateway(format!(
                "AI service responded with {status}"
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::error!(error = %e, path, "AI service returned invalid JSON");
            ApiError::BadGateway("AI service returned an invalid response".into())
        })
    }

    pub async fn attrition(&self) -> Result<Value, ApiError> {
        let path = "/attrition";
        let url = self.endpoint(path)?;
        self.forward(self.http.get(url), path).await
    }

    pub async fn resume_score(&self, payload: &Value) -> Result<Value, ApiError> {
        let path = "/resume-score";
        let url = self.endpoint(path)?;
        self.forward(self.http.post(url).json(payload), path).await
    }
}

/// Attrition-risk predictions for the workforce
#[utoipa::path(
    get,
    path = "/api/ai/attrition",
    responses(
        (status = 200, description = "Upstream predictions wrapped in the envelope"),
        (status = 502, description = "AI service failed"),
        (status = 503, description = "AI service not configured")
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn attrition(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    auth.require_hr_or_admin()?;
    Ok(envelope::ok(state.ai.attrition().await?))
}

/// Score a candidate resume
#[utoipa::path(
    post,
    path = "/api/ai/resume-score",
    request_body(content = Object, description = "Forwarded unchanged to the AI service"),
    responses(
        (status = 200, description = "Upstream score wrapped in the envelope"),
        (status = 502, description = "AI service failed"),
        (status = 503, description = "AI service not configured")
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn resume_score(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> Result<impl Responder, ApiError> {
    auth.require_hr_or_admin()?;
    Ok(envelope::ok(state.ai.resume_score(&payload).await?))
}
