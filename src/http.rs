//! HTTP endpoints for issuing and verifying pairing codes.
//!
//! Response bodies always carry a `success` flag. An invalid code is a
//! normal outcome for the client flow and comes back as 200 with
//! `success: false`; only a missing code (400) and server faults (500)
//! use error statuses.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::PairingError;
use crate::pairing::PairingService;

/// Pairing routes.
pub fn routes(pairing: Arc<PairingService>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/generate-code", post(generate_code))
        .route("/verify-code", post(verify_code))
        .with_state(pairing)
}

async fn liveness() -> &'static str {
    "pairlink pairing relay running"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateCodeResponse {
    success: bool,
    code: String,
    room_id: Uuid,
}

async fn generate_code(State(pairing): State<Arc<PairingService>>) -> Response {
    match pairing.generate_code().await {
        Ok(issued) => (
            StatusCode::OK,
            Json(GenerateCodeResponse {
                success: true,
                code: issued.code,
                room_id: issued.room_id,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Code generation failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeRequest {
    #[serde(default)]
    code: String,
    mobile_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeResponse {
    success: bool,
    room_id: Uuid,
    user_id: Uuid,
    name: String,
}

async fn verify_code(
    State(pairing): State<Arc<PairingService>>,
    body: Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> Response {
    // An absent or unreadable body is the same client mistake as an
    // absent code field.
    let Ok(Json(request)) = body else {
        return failure(StatusCode::BAD_REQUEST, "Code missing");
    };

    match pairing.verify_code(&request.code, request.mobile_id).await {
        Ok(verified) => (
            StatusCode::OK,
            Json(VerifyCodeResponse {
                success: true,
                room_id: verified.room_id,
                user_id: verified.user_id,
                name: verified.display_name,
            }),
        )
            .into_response(),
        Err(PairingError::MissingCode) => failure(StatusCode::BAD_REQUEST, "Code missing"),
        Err(PairingError::InvalidCode) => failure(StatusCode::OK, "Invalid code"),
        Err(e @ PairingError::UserCreation(_)) => {
            error!(error = %e, "User creation failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "User creation failed")
        }
        Err(e) => {
            error!(error = %e, "Code verification failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[derive(Debug, Serialize)]
struct FailureResponse {
    success: bool,
    message: String,
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(FailureResponse {
            success: false,
            message: message.into(),
        }),
    )
        .into_response()
}
