//! Typed entity identifiers
//!
//! Each entity kind has its own prefixed, fixed-length, lowercase
//! alphanumeric token. The prefix check guarantees an identifier of one
//! kind never validates as another kind's identifier.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Random suffix length appended to each prefix
const SUFFIX_LEN: usize = 12;

/// Id character set (lowercase alphanumeric)
const ID_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_suffix() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}

fn validate_token(kind: &str, prefix: &str, s: &str) -> Result<()> {
    let expected_len = prefix.len() + SUFFIX_LEN;
    if s.len() != expected_len
        || !s.starts_with(prefix)
        || !s.bytes().all(|b| ID_CHARSET.contains(&b))
    {
        return Err(Error::Validation(format!(
            "invalid {} id {:?}: expected {:?} prefix and {} lowercase alphanumeric characters",
            kind, s, prefix, expected_len
        )));
    }
    Ok(())
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Id prefix distinguishing this entity kind
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh random id
            pub fn generate() -> Self {
                Self(format!("{}{}", $prefix, random_suffix()))
            }

            /// Parse an id, enforcing prefix, length, and character set
            pub fn parse(s: &str) -> Result<Self> {
                validate_token($kind, $prefix, s)?;
                Ok(Self(s.to_string()))
            }

            /// Get as string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

entity_id!(
    /// Account identifier (`acct` + 12 characters)
    AcctId,
    "acct",
    "account"
);

entity_id!(
    /// Vendor identifier (`vndr` + 12 characters)
    VndrId,
    "vndr",
    "vendor"
);

entity_id!(
    /// Transaction identifier (`txn` + 12 characters)
    TxnId,
    "txn",
    "transaction"
);

entity_id!(
    /// Statement identifier (`stmt` + 12 characters)
    StmtId,
    "stmt",
    "statement"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_parses_back() {
        let id = AcctId::generate();
        assert_eq!(AcctId::parse(id.as_str()).unwrap(), id);
        assert_eq!(id.as_str().len(), 16);
    }

    #[test]
    fn test_prefix_distinguishes_kinds() {
        let acct = AcctId::generate();
        let vndr = VndrId::generate();
        assert!(VndrId::parse(acct.as_str()).is_err());
        assert!(AcctId::parse(vndr.as_str()).is_err());
        assert!(TxnId::parse(acct.as_str()).is_err());
        assert!(StmtId::parse(acct.as_str()).is_err());
    }

    #[test]
    fn test_rejects_bad_tokens() {
        assert!(AcctId::parse("acct").is_err());
        assert!(AcctId::parse("acctABCDEF012345").is_err()); // uppercase
        assert!(AcctId::parse("acct0123456789abc").is_err()); // too long
        assert!(TxnId::parse("txn-0123456789a").is_err()); // bad charset
    }

    #[test]
    fn test_txn_id_length_differs_by_prefix() {
        let txn = TxnId::generate();
        assert_eq!(txn.as_str().len(), 15);
        assert!(txn.as_str().starts_with("txn"));
    }

    #[test]
    fn test_serde_round_trip() {
        let id = StmtId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: StmtId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<StmtId>("\"acct000000000000\"").is_err());
    }
}
