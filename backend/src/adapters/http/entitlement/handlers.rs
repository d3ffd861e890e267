//! HTTP handlers for token issuance, account info and verification.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{ClientOrigin, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::handlers::{GetEntitlementQuery, IssueTokenCommand, VerifyTokenCommand};
use crate::domain::entitlement::VerifyError;

use super::dto::{
    EntitlementResponse, IssueTokenRequest, IssueTokenResponse, VerifyRequest, VerifyResponse,
};

/// POST /verify - Check a token against the caller's origin and consume one credit.
///
/// Answers 200 with the remaining credit, 400 on malformed input, 401 on a
/// failed check and 403 with `remaining_credit = 0` when credit is exhausted.
pub async fn verify_token(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable verify request");
            return (
                StatusCode::BAD_REQUEST,
                Json(VerifyResponse::rejected("Invalid request body")),
            )
                .into_response();
        }
    };

    let token = request.token.trim().to_string();
    if token.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyResponse::rejected("Token is required")),
        )
            .into_response();
    }

    tracing::debug!(token_len = token.len(), origin = %origin, "Verifying token");

    let cmd = VerifyTokenCommand { token, origin };
    match state.verify_token.handle(cmd).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(VerifyResponse::verified(
                outcome.identity.to_string(),
                outcome.remaining_credit,
            )),
        )
            .into_response(),
        Err(err) => verify_error_response(err),
    }
}

fn verify_error_response(err: VerifyError) -> Response {
    let status = err.status_code();
    let body = match &err {
        VerifyError::Malformed(_) => VerifyResponse::rejected("Malformed token"),
        VerifyError::CryptographicFailure | VerifyError::NotFound => {
            VerifyResponse::rejected("Invalid token")
        }
        VerifyError::OriginMismatch => {
            VerifyResponse::rejected("Token is not valid for this origin")
        }
        VerifyError::InsufficientCredit => {
            VerifyResponse::rejected("No remaining credit").with_remaining_credit(0)
        }
        VerifyError::TransientStoreFailure(reason) => {
            tracing::error!(error = %reason, "Verification failed on store error");
            VerifyResponse::rejected("Temporarily unavailable, retry later")
        }
    };
    (status, Json(body)).into_response()
}

/// POST /api/tokens - Issue the caller's first token bound to an origin.
pub async fn issue_token(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<IssueTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = IssueTokenCommand {
        identity: caller.identity,
        origin: request.origin,
    };

    let result = state.issue_token.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueTokenResponse::from(&result.record)),
    ))
}

/// GET /api/entitlements/me - Account info for the caller.
pub async fn get_my_entitlement(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetEntitlementQuery {
        identity: caller.identity,
    };

    let record = state.get_entitlement.handle(query).await?;

    Ok(Json(EntitlementResponse::from(record)))
}
