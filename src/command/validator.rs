use crate::command::{SignedCommand, Signer};
use thiserror::Error;

/// Errors that can occur when validating a signed command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandValidationError {
    #[error("Invalid caller: {0}")]
    InvalidCaller(String),

    #[error("Invalid signature: signature does not match the command content")]
    InvalidSignature,

    #[error("Future timestamp: command timestamp {timestamp} is ahead of ledger time {now}")]
    FutureTimestamp { timestamp: u64, now: u64 },

    #[error("Expired: command timestamp {timestamp} is too old at ledger time {now}")]
    Expired { timestamp: u64, now: u64 },
}

/// Validator for signed commands
pub struct CommandValidator;

impl CommandValidator {
    /// Check the caller id decodes to a key and that key signed the envelope
    pub fn validate(signed: &SignedCommand) -> Result<(), CommandValidationError> {
        Signer::verify(signed.envelope(), signed.signature())
    }

    /// Signature check plus timestamp window against ledger time `now`
    pub fn validate_with_freshness(
        signed: &SignedCommand,
        now: u64,
        future_tolerance_secs: u64,
        max_age_secs: u64,
    ) -> Result<(), CommandValidationError> {
        Self::validate(signed)?;

        let timestamp = signed.envelope().timestamp();
        if timestamp > now.saturating_add(future_tolerance_secs) {
            return Err(CommandValidationError::FutureTimestamp { timestamp, now });
        }
        if timestamp.saturating_add(max_age_secs) < now {
            return Err(CommandValidationError::Expired { timestamp, now });
        }

        Ok(())
    }
}
