// Command module - Signed ledger operations
// Lets a host accept operations over an untrusted channel: the caller
// identity of each command is proven by its Ed25519 signature.

mod builder;
mod codec;
mod model;
mod signature;
mod validator;

pub use builder::CommandBuilder;
pub use codec::{CodecError, CommandCodec};
pub use model::{Command, CommandEnvelope, CommandId, SignedCommand};
pub use signature::{CommandSignature, Signer};
pub use validator::{CommandValidationError, CommandValidator};

use crate::error::LedgerError;
use thiserror::Error;

/// Errors from building or executing a signed command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Missing signer: a caller keypair is required")]
    MissingSigner,

    #[error("Missing command: an operation is required")]
    MissingCommand,

    #[error("Command validation failed: {0}")]
    Invalid(#[from] CommandValidationError),

    #[error("Command {0} was already applied")]
    Replay(CommandId),

    #[error("Command rejected: {0}")]
    Rejected(#[from] LedgerError),
}
