//! Password sign-in — POST /api/signin
//!
//! Checks the configured password and answers with a session token, both in
//! the JSON body and as an http-only cookie.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub token: String,
}

/// POST /api/signin
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignInRequest>,
) -> Result<Response, ApiError> {
    let Some(password) = state.config.password.as_deref() else {
        return Err(ApiError::Internal(
            "authentication not configured".to_string(),
        ));
    };

    if request.password != password {
        warn!("failed sign-in attempt");
        return Err(ApiError::Unauthorized("invalid password".to_string()));
    }

    let token = auth::issue_token(
        &state.config.token_secret,
        password,
        chrono::Utc::now().timestamp(),
    );
    info!("sign-in succeeded");

    let cookie = format!(
        "token={token}; HttpOnly; Path=/; Max-Age={}",
        auth::TOKEN_TTL_SECS
    );
    let mut response = Json(SignInResponse {
        token: token.clone(),
    })
    .into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|err| ApiError::Internal(format!("cookie encoding failed: {err}")))?,
    );
    Ok(response)
}
