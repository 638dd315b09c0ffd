//! Identity and session record value types.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The (RUT, check digit) pair identifying an SII account.
///
/// Used verbatim to build cache key names, so the shape is validated on
/// construction: the RUT must be ASCII digits and the check digit a single
/// digit or `K`. Invalid input is the one caller-visible error in this
/// crate; everything downstream degrades to a cache miss instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    rut: String,
    dv: String,
}

impl Identity {
    /// Create an identity, validating its shape.
    pub fn new(rut: impl Into<String>, dv: impl Into<String>) -> Result<Self> {
        let rut = rut.into();
        let dv = dv.into();

        if rut.is_empty() || !rut.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidIdentity(format!("bad RUT: {rut:?}")));
        }
        let valid_dv = dv.len() == 1
            && dv
                .bytes()
                .all(|b| b.is_ascii_digit() || b == b'k' || b == b'K');
        if !valid_dv {
            return Err(Error::InvalidIdentity(format!("bad check digit: {dv:?}")));
        }

        Ok(Self { rut, dv })
    }

    /// The RUT without separators or check digit.
    pub fn rut(&self) -> &str {
        &self.rut
    }

    /// The check digit.
    pub fn dv(&self) -> &str {
        &self.dv
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.rut, self.dv)
    }
}

/// Cached session credentials for one identity.
///
/// Serialized as JSON under both the primary and the shadow close key; the
/// two copies are identical at write time and only ever differ in remaining
/// TTL. Field names (`csessionid` in particular) are the stored-value
/// contract, shared with whatever else reads these keys.
///
/// All fields are required: a stored payload missing any of them fails
/// deserialization and is treated as a cache miss by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The portal's `TOKEN` cookie value.
    pub token: String,

    /// The portal's `CSESSIONID` cookie value.
    pub csessionid: String,

    /// RUT of the owning identity.
    pub rut: String,

    /// Check digit of the owning identity.
    pub dv: String,
}

impl SessionRecord {
    /// Create a record for an identity.
    pub fn new(identity: &Identity, token: impl Into<String>, csessionid: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            csessionid: csessionid.into(),
            rut: identity.rut().to_string(),
            dv: identity.dv().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_accepts_digits_and_k() {
        assert!(Identity::new("12345678", "9").is_ok());
        assert!(Identity::new("7654321", "K").is_ok());
        assert!(Identity::new("7654321", "k").is_ok());
    }

    #[test]
    fn test_identity_rejects_bad_shapes() {
        assert!(Identity::new("", "9").is_err());
        assert!(Identity::new("12.345.678", "9").is_err());
        assert!(Identity::new("12345678", "").is_err());
        assert!(Identity::new("12345678", "99").is_err());
        assert!(Identity::new("12345678", "x").is_err());
    }

    #[test]
    fn test_identity_display() {
        let identity = Identity::new("12345678", "9").unwrap();
        assert_eq!(identity.to_string(), "12345678-9");
    }

    #[test]
    fn test_record_json_contract() {
        let identity = Identity::new("12345678", "9").unwrap();
        let record = SessionRecord::new(&identity, "TOK", "CS");

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"csessionid\":\"CS\""));

        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_missing_field_is_an_error() {
        // No csessionid: must fail rather than default, so the store treats
        // the payload as a miss.
        let json = r#"{"token":"TOK","rut":"12345678","dv":"9"}"#;
        assert!(serde_json::from_str::<SessionRecord>(json).is_err());
    }
}
