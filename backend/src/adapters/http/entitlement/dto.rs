//! Request and response bodies for token issuance and verification.

use serde::{Deserialize, Serialize};

use crate::domain::entitlement::EntitlementRecord;

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Body of every `/verify` answer, success or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_credit: Option<i64>,
}

impl VerifyResponse {
    pub fn verified(identity: impl Into<String>, remaining_credit: i64) -> Self {
        Self {
            success: true,
            message: "Token verified".to_string(),
            identity: Some(identity.into()),
            remaining_credit: Some(remaining_credit),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            identity: None,
            remaining_credit: None,
        }
    }

    pub fn with_remaining_credit(mut self, remaining_credit: i64) -> Self {
        self.remaining_credit = Some(remaining_credit);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueTokenRequest {
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTokenResponse {
    pub identity: String,
    pub token: String,
    pub remaining_credit: i64,
    /// Unix milliseconds.
    pub issuance_time: i64,
}

impl From<&EntitlementRecord> for IssueTokenResponse {
    fn from(record: &EntitlementRecord) -> Self {
        Self {
            identity: record.identity.to_string(),
            token: record.token.clone(),
            remaining_credit: record.remaining_credit,
            issuance_time: record.issuance_time.as_millis(),
        }
    }
}

/// Account info for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementResponse {
    pub identity: String,
    pub bound_origin: String,
    pub token: String,
    pub remaining_credit: i64,
    pub issuance_time: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<EntitlementRecord> for EntitlementResponse {
    fn from(record: EntitlementRecord) -> Self {
        Self {
            identity: record.identity.to_string(),
            bound_origin: record.bound_origin.to_string(),
            token: record.token,
            remaining_credit: record.remaining_credit,
            issuance_time: record.issuance_time.as_millis(),
            created_at: record.created_at.as_datetime().to_rfc3339(),
            updated_at: record.updated_at.as_datetime().to_rfc3339(),
        }
    }
}
