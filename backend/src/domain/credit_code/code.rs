//! Credit code entity and code generation.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::errors::CreditCodeError;
use crate::domain::foundation::{Identity, Timestamp, ValidationError};

/// Length of a code in hex characters.
pub const CODE_LEN: usize = 32;

/// Mints credit code strings.
///
/// `code = hex(HMAC-SHA256(secret, "{unix_nanos}_{issuer}"))[..32]`. The
/// secret keeps codes unguessable even when issuer and time are known.
#[derive(Clone)]
pub struct CodeGenerator {
    secret: SecretString,
}

impl CodeGenerator {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn generate(&self, issuer: &Identity, now: Timestamp) -> Result<String, CreditCodeError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| CreditCodeError::Internal(format!("HMAC init failed: {}", e)))?;
        mac.update(format!("{}_{}", now.as_unix_nanos(), issuer.as_str()).as_bytes());

        let mut code = hex::encode(mac.finalize().into_bytes());
        code.truncate(CODE_LEN);
        Ok(code)
    }
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator").finish_non_exhaustive()
    }
}

/// Normalizes user input into the stored code form.
///
/// # Errors
///
/// `InvalidFormat` unless the trimmed input is exactly 32 hex characters.
pub fn normalize_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim().to_ascii_lowercase();
    if code.is_empty() {
        return Err(ValidationError::empty_field("code"));
    }
    if code.len() != CODE_LEN || !code.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::invalid_format(
            "code",
            format!("expected {} hex characters", CODE_LEN),
        ));
    }
    Ok(code)
}

/// A single-use code worth `grant_amount` units of credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditCode {
    pub code: String,
    pub grant_amount: i64,
    pub used: bool,
    pub used_by: Option<Identity>,
    pub issuer: Identity,
    pub created_at: Timestamp,
    pub used_at: Option<Timestamp>,
}

impl CreditCode {
    /// Creates an unused code.
    ///
    /// # Errors
    ///
    /// `InvalidGrant` unless `1 <= grant_amount <= max_grant`.
    pub fn issue(
        code: String,
        grant_amount: i64,
        max_grant: i64,
        issuer: Identity,
        now: Timestamp,
    ) -> Result<Self, CreditCodeError> {
        if grant_amount < 1 || grant_amount > max_grant {
            return Err(CreditCodeError::InvalidGrant {
                max: max_grant,
                actual: grant_amount,
            });
        }

        Ok(Self {
            code,
            grant_amount,
            used: false,
            used_by: None,
            issuer,
            created_at: now,
            used_at: None,
        })
    }

    /// Marks the code used by `identity` and returns the grant.
    ///
    /// Callers must hold the code's row lock (or equivalent) across the
    /// read and this call.
    pub fn redeem(&mut self, identity: &Identity, now: Timestamp) -> Result<i64, CreditCodeError> {
        if self.used {
            return Err(CreditCodeError::AlreadyUsed);
        }
        self.used = true;
        self.used_by = Some(identity.clone());
        self.used_at = Some(now);
        Ok(self.grant_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> CodeGenerator {
        CodeGenerator::new(SecretString::new(
            "secret-salt-0123456789abcdef0123456789".to_string(),
        ))
    }

    fn identity(value: &str) -> Identity {
        Identity::new(value).unwrap()
    }

    fn at_millis(millis: i64) -> Timestamp {
        Timestamp::from_unix_millis(millis).unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // Generation
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn generate_matches_reference_hmac() {
        let code = generator()
            .generate(&identity("7"), at_millis(1_700_000_000_000))
            .unwrap();
        assert_eq!(code, "b2e66d61d5e4356ff8bc5357e11b895b");
    }

    #[test]
    fn generate_differs_per_issuer_and_time() {
        let g = generator();
        let base = g.generate(&identity("7"), at_millis(1)).unwrap();
        assert_ne!(base, g.generate(&identity("8"), at_millis(1)).unwrap());
        assert_ne!(base, g.generate(&identity("7"), at_millis(2)).unwrap());
    }

    #[test]
    fn generated_codes_pass_normalization() {
        let code = generator().generate(&identity("7"), Timestamp::now()).unwrap();
        assert_eq!(normalize_code(&code).unwrap(), code);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        let code = normalize_code("  B2E66D61D5E4356FF8BC5357E11B895B ").unwrap();
        assert_eq!(code, "b2e66d61d5e4356ff8bc5357e11b895b");
    }

    #[test]
    fn normalize_rejects_wrong_length_and_non_hex() {
        assert!(matches!(normalize_code(""), Err(ValidationError::EmptyField { .. })));
        assert!(normalize_code("abc").is_err());
        assert!(normalize_code("zz e66d61d5e4356ff8bc5357e11b895b").is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Lifecycle
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn issue_enforces_grant_bounds() {
        let make = |grant| CreditCode::issue("c".into(), grant, 100, identity("7"), Timestamp::now());
        assert!(matches!(make(0), Err(CreditCodeError::InvalidGrant { .. })));
        assert!(matches!(make(101), Err(CreditCodeError::InvalidGrant { .. })));
        assert!(make(1).is_ok());
        assert!(make(100).is_ok());
    }

    #[test]
    fn redeem_is_single_use() {
        let mut code =
            CreditCode::issue("c".into(), 10, 100, identity("7"), Timestamp::now()).unwrap();

        assert_eq!(code.redeem(&identity("42"), Timestamp::now()).unwrap(), 10);
        assert!(code.used);
        assert_eq!(code.used_by, Some(identity("42")));
        assert!(code.used_at.is_some());

        assert_eq!(
            code.redeem(&identity("43"), Timestamp::now()),
            Err(CreditCodeError::AlreadyUsed)
        );
        assert_eq!(code.used_by, Some(identity("42")));
    }
}
