use crate::command::{Command, CommandEnvelope, CommandError, SignedCommand, Signer};
use crate::identity::Keypair;
use rand::Rng;

/// Builder for creating signed commands
pub struct CommandBuilder<'a> {
    signer: Option<&'a Keypair>,
    command: Option<Command>,
    nonce: Option<u64>,
    timestamp: Option<u64>,
}

impl<'a> CommandBuilder<'a> {
    pub fn new() -> Self {
        Self {
            signer: None,
            command: None,
            nonce: None,
            timestamp: None,
        }
    }

    /// Set the signing caller (required)
    pub fn signer(mut self, keypair: &'a Keypair) -> Self {
        self.signer = Some(keypair);
        self
    }

    /// Set the operation (required)
    pub fn command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Set the nonce (optional - random if not provided)
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the timestamp (optional - wall clock seconds if not provided).
    /// Set it from the ledger clock when that clock is not wall time.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build and sign the command
    pub fn build(self) -> Result<SignedCommand, CommandError> {
        let keypair = self.signer.ok_or(CommandError::MissingSigner)?;
        let command = self.command.ok_or(CommandError::MissingCommand)?;

        let nonce = self.nonce.unwrap_or_else(|| rand::thread_rng().gen::<u64>());
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0));

        let envelope = CommandEnvelope::new(keypair.account_id(), command, nonce, timestamp);
        let signature = Signer::sign(keypair, &envelope);

        Ok(SignedCommand::from_parts(envelope, signature))
    }
}

impl<'a> Default for CommandBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}
