//! Opaque revision tokens.
//!
//! Clients treat these as opaque strings to echo back; the encoding is not
//! part of the service's stable surface and may change.

use thiserror::Error;

use permtree_domain::model::Revision;

const TOKEN_PREFIX: &str = "rev1-";

/// A revision token that could not be decoded.
#[derive(Debug, Error)]
#[error("invalid revision token")]
pub struct TokenError;

/// Encodes a revision as an opaque token.
pub fn encode_revision(revision: Revision) -> String {
    format!("{TOKEN_PREFIX}{:016x}", revision.value())
}

/// Decodes a token produced by [`encode_revision`].
pub fn decode_revision(token: &str) -> Result<Revision, TokenError> {
    let encoded = token.strip_prefix(TOKEN_PREFIX).ok_or(TokenError)?;
    if encoded.len() != 16 {
        return Err(TokenError);
    }
    u64::from_str_radix(encoded, 16)
        .map(Revision::new)
        .map_err(|_| TokenError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for value in [0, 1, 42, u64::MAX] {
            let revision = Revision::new(value);
            assert_eq!(decode_revision(&encode_revision(revision)).unwrap(), revision);
        }
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        assert!(decode_revision("").is_err());
        assert!(decode_revision("42").is_err());
        assert!(decode_revision("rev1-xyz").is_err());
        assert!(decode_revision("rev2-0000000000000001").is_err());
        assert!(decode_revision("rev1-1").is_err());
    }
}
