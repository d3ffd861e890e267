//! HTTP handlers for credit codes.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{IssueCreditCodeCommand, RedeemCreditCodeCommand};

use super::dto::{
    CreditCodeResponse, IssueCreditCodeRequest, RedeemCreditCodeRequest, RedeemCreditCodeResponse,
};

/// POST /api/credit-codes - Mint a code (issuer role only).
pub async fn issue_credit_code(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<IssueCreditCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = IssueCreditCodeCommand {
        caller,
        grant_amount: request.grant_amount,
    };

    let result = state.issue_credit_code.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CreditCodeResponse::from(result.code))))
}

/// POST /api/credit-codes/redeem - Burn a code and add its credit.
pub async fn redeem_credit_code(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<RedeemCreditCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RedeemCreditCodeCommand {
        identity: caller.identity,
        code: request.code,
    };

    let result = state.redeem_credit_code.handle(cmd).await?;

    Ok(Json(RedeemCreditCodeResponse::from(result)))
}
