// Command signatures - Ed25519 over a domain-separated command envelope

use crate::command::{CommandEnvelope, CommandValidationError};
use crate::identity::Keypair;
use ed25519_dalek::Verifier;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefixed to every signed message
const SIGNING_DOMAIN: &[u8] = b"tierfund:command:v1";

/// A caller's signature over one command envelope
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSignature([u8; 64]);

impl CommandSignature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CommandSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandSignature({}..)", &self.to_hex()[..16])
    }
}

impl Serialize for CommandSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for CommandSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = CommandSignature;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 64-byte Ed25519 signature")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let bytes: [u8; 64] = v
                    .try_into()
                    .map_err(|_| E::invalid_length(v.len(), &self))?;
                Ok(CommandSignature(bytes))
            }
        }

        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            CommandSignature::from_hex(&s).map_err(de::Error::custom)
        } else {
            deserializer.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Signs command envelopes and checks them against their caller
pub struct Signer;

impl Signer {
    /// Sign `envelope` with `keypair`. The envelope should name the keypair's
    /// own account as caller, or it will not verify.
    pub fn sign(keypair: &Keypair, envelope: &CommandEnvelope) -> CommandSignature {
        let signature = keypair.sign_message(&signed_message(envelope));
        CommandSignature(signature.to_bytes())
    }

    /// Check that the account named as caller produced `signature`
    pub fn verify(
        envelope: &CommandEnvelope,
        signature: &CommandSignature,
    ) -> Result<(), CommandValidationError> {
        let key = envelope
            .caller()
            .verifying_key()
            .map_err(|e| CommandValidationError::InvalidCaller(e.to_string()))?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);

        key.verify(&signed_message(envelope), &signature)
            .map_err(|_| CommandValidationError::InvalidSignature)
    }
}

fn signed_message(envelope: &CommandEnvelope) -> Vec<u8> {
    let body = envelope.to_signing_bytes();
    let mut message = Vec::with_capacity(SIGNING_DOMAIN.len() + body.len());
    message.extend_from_slice(SIGNING_DOMAIN);
    message.extend_from_slice(&body);
    message
}
