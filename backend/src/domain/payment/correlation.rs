//! Correlation parameter echoed back by the gateway.

use std::fmt;

use crate::domain::foundation::{Identity, Origin, ValidationError};

const SEPARATOR: char = '|';

/// The opaque `param` attached to a gateway order.
///
/// `"{identity}"` for credit purchases, `"{identity}|{new_origin}"` for
/// rebinds. Identities cannot contain the separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationParam {
    pub identity: Identity,
    pub target_origin: Option<Origin>,
}

impl CorrelationParam {
    pub fn new(identity: Identity, target_origin: Option<Origin>) -> Self {
        Self {
            identity,
            target_origin,
        }
    }

    /// Parses a param received from the gateway.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let (identity, origin) = match raw.split_once(SEPARATOR) {
            Some((identity, origin)) => (identity, Some(origin)),
            None => (raw, None),
        };

        let identity = Identity::new(identity)?;
        let target_origin = origin.map(Origin::parse_public).transpose()?;
        Ok(Self::new(identity, target_origin))
    }
}

impl fmt::Display for CorrelationParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target_origin {
            Some(origin) => write!(f, "{}{}{}", self.identity, SEPARATOR, origin),
            None => write!(f, "{}", self.identity),
        }
    }
}
