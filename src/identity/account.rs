use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const ACCOUNT_PREFIX: &str = "did:fund:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid account id: expected did:fund:<base58 key>, got '{0}'")]
    InvalidFormat(String),

    #[error("Invalid account method: expected 'fund', got '{0}'")]
    InvalidMethod(String),

    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Not an Ed25519 public key: {0}")]
    InvalidPublicKey(String),
}

/// Caller identity in the format: did:fund:<base58_public_key>
///
/// Owners and backers are plain values of this type. Holding one grants
/// nothing; the core compares it against a campaign's owner, and signed
/// commands prove it with the matching key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId {
    key_part: String,
}

impl AccountId {
    pub(crate) fn from_verifying_key(key: &VerifyingKey) -> Self {
        let key_part = bs58::encode(key.as_bytes()).into_string();
        Self { key_part }
    }

    /// Parse the `did:fund:` form. The key part must name a valid Ed25519
    /// public key, so a parsed id can always be checked against a signature.
    pub fn parse(s: &str) -> Result<Self, AccountIdError> {
        let (method, key_part) = s
            .strip_prefix("did:")
            .and_then(|rest| rest.split_once(':'))
            .ok_or_else(|| AccountIdError::InvalidFormat(s.to_string()))?;
        if method != "fund" {
            return Err(AccountIdError::InvalidMethod(method.to_string()));
        }

        let id = Self {
            key_part: key_part.to_string(),
        };
        id.verifying_key()?;
        Ok(id)
    }

    /// Recover the verifying key this account id names
    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey, AccountIdError> {
        let bytes = bs58::decode(&self.key_part)
            .into_vec()
            .map_err(|e| AccountIdError::InvalidBase58(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AccountIdError::InvalidKeyLength(bytes.len()))?;

        VerifyingKey::from_bytes(&bytes).map_err(|e| AccountIdError::InvalidPublicKey(e.to_string()))
    }

    /// The base58 key part
    pub fn key_part(&self) -> &str {
        &self.key_part
    }

    /// Abbreviated form for logs and CLI output
    pub fn short(&self) -> String {
        let k = &self.key_part;
        if k.len() <= 10 {
            return k.clone();
        }
        format!("{}...{}", &k[..6], &k[k.len() - 4..])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ACCOUNT_PREFIX, self.key_part)
    }
}
