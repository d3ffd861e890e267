//! Request and response bodies for credit codes.

use serde::{Deserialize, Serialize};

use crate::application::handlers::RedeemCreditCodeResult;
use crate::domain::credit_code::CreditCode;

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCreditCodeRequest {
    pub grant_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCodeResponse {
    pub code: String,
    pub grant_amount: i64,
    pub created_at: String,
}

impl From<CreditCode> for CreditCodeResponse {
    fn from(code: CreditCode) -> Self {
        Self {
            code: code.code,
            grant_amount: code.grant_amount,
            created_at: code.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedeemCreditCodeRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemCreditCodeResponse {
    pub granted: i64,
    pub remaining_credit: i64,
}

impl From<RedeemCreditCodeResult> for RedeemCreditCodeResponse {
    fn from(result: RedeemCreditCodeResult) -> Self {
        Self {
            granted: result.granted,
            remaining_credit: result.remaining_credit,
        }
    }
}
