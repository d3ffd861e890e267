//! Network origin value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::ValidationError;

/// A public network address a token is bound to.
///
/// Only constructible from a parsable, publicly routable IPv4/IPv6 literal.
/// The stored form is the canonical `IpAddr` rendering, so two spellings of
/// the same IPv6 address compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin(String);

impl Origin {
    /// Parses and validates a public address.
    ///
    /// # Errors
    ///
    /// - `EmptyField` for blank input
    /// - `InvalidFormat` for unparsable input or a private, loopback,
    ///   link-local or unspecified address
    pub fn parse_public(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("origin"));
        }

        let addr: IpAddr = trimmed
            .parse()
            .map_err(|_| ValidationError::invalid_format("origin", "not an IP address"))?;

        if !is_public(&addr) {
            return Err(ValidationError::invalid_format(
                "origin",
                "private, loopback or reserved addresses cannot be bound",
            ));
        }

        Ok(Self(addr.to_string()))
    }

    /// Returns the canonical address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_public(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(mapped) => is_public_v4(&mapped),
            None => is_public_v6(v6),
        },
    }
}

fn is_public_v4(addr: &Ipv4Addr) -> bool {
    !(addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast())
}

fn is_public_v6(addr: &Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    !(addr.is_loopback() || addr.is_unspecified() || unique_local || link_local)
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Origin {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_public(&value)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.0
    }
}
