//! Credit limits

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Credit granted with a first token
    #[serde(default = "default_credit")]
    pub default_credit: i64,

    /// Largest grant a single credit code may carry
    #[serde(default = "default_max_code_grant")]
    pub max_code_grant: i64,
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_credit < 0 {
            return Err(ValidationError::InvalidAmount("LIMITS__DEFAULT_CREDIT"));
        }
        if self.max_code_grant < 1 {
            return Err(ValidationError::InvalidAmount("LIMITS__MAX_CODE_GRANT"));
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_credit: default_credit(),
            max_code_grant: default_max_code_grant(),
        }
    }
}

fn default_credit() -> i64 {
    3
}

fn default_max_code_grant() -> i64 {
    100_000
}
