use crate::identity::AccountId;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::rngs::OsRng;

/// Secret key of one account
///
/// Owners and backers hold one of these to sign commands; the ledger itself
/// only ever sees the derived [`AccountId`].
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
    account: AccountId,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Restore an account's key from its 32-byte secret seed
    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&secret))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let account = AccountId::from_verifying_key(&signing_key.verifying_key());
        Self {
            signing_key,
            account,
        }
    }

    /// The 32-byte secret seed
    pub fn secret(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The account this key signs for
    pub fn account_id(&self) -> AccountId {
        self.account.clone()
    }

    pub(crate) fn sign_message(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("account", &self.account.to_string())
            .finish_non_exhaustive()
    }
}
