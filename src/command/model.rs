use crate::command::{CommandSignature, Signer};
use crate::identity::AccountId;
use crate::registry::CampaignId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Unique identifier for a command (SHA256 of its signing bytes)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId([u8; 32]);

impl CommandId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A state-changing ledger operation requested by a caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    CreateCampaign {
        name: String,
        description: String,
        goal: u64,
        duration: u64,
    },
    AddTier {
        campaign: CampaignId,
        name: String,
        target_amount: u64,
    },
    RemoveTier {
        campaign: CampaignId,
        index: u32,
    },
    Fund {
        campaign: CampaignId,
        tier_index: u32,
        amount: u64,
    },
    Withdraw {
        campaign: CampaignId,
    },
    Refund {
        campaign: CampaignId,
    },
}

impl Command {
    /// Short operation name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateCampaign { .. } => "create_campaign",
            Command::AddTier { .. } => "add_tier",
            Command::RemoveTier { .. } => "remove_tier",
            Command::Fund { .. } => "fund",
            Command::Withdraw { .. } => "withdraw",
            Command::Refund { .. } => "refund",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Command::CreateCampaign { .. } => 0,
            Command::AddTier { .. } => 1,
            Command::RemoveTier { .. } => 2,
            Command::Fund { .. } => 3,
            Command::Withdraw { .. } => 4,
            Command::Refund { .. } => 5,
        }
    }

    fn write_signing_bytes(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.tag());
        match self {
            Command::CreateCampaign {
                name,
                description,
                goal,
                duration,
            } => {
                put_str(bytes, name);
                put_str(bytes, description);
                bytes.extend_from_slice(&goal.to_le_bytes());
                bytes.extend_from_slice(&duration.to_le_bytes());
            }
            Command::AddTier {
                campaign,
                name,
                target_amount,
            } => {
                bytes.extend_from_slice(campaign.as_bytes());
                put_str(bytes, name);
                bytes.extend_from_slice(&target_amount.to_le_bytes());
            }
            Command::RemoveTier { campaign, index } => {
                bytes.extend_from_slice(campaign.as_bytes());
                bytes.extend_from_slice(&index.to_le_bytes());
            }
            Command::Fund {
                campaign,
                tier_index,
                amount,
            } => {
                bytes.extend_from_slice(campaign.as_bytes());
                bytes.extend_from_slice(&tier_index.to_le_bytes());
                bytes.extend_from_slice(&amount.to_le_bytes());
            }
            Command::Withdraw { campaign } | Command::Refund { campaign } => {
                bytes.extend_from_slice(campaign.as_bytes());
            }
        }
    }
}

fn put_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

/// An unsigned command together with who sends it and when
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    caller: AccountId,
    command: Command,
    nonce: u64,
    timestamp: u64,
}

impl CommandEnvelope {
    pub fn new(caller: AccountId, command: Command, nonce: u64, timestamp: u64) -> Self {
        Self {
            caller,
            command,
            nonce,
            timestamp,
        }
    }

    pub fn caller(&self) -> &AccountId {
        &self.caller
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Compute the unique ID for this envelope
    pub fn id(&self) -> CommandId {
        let hash = Sha256::digest(self.to_signing_bytes());
        let mut id = [0u8; 32];
        id.copy_from_slice(&hash);
        CommandId(id)
    }

    /// Deterministic encoding of the envelope; signed and hashed into its id
    pub fn to_signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        put_str(&mut bytes, &self.caller.to_string());
        self.command.write_signing_bytes(&mut bytes);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes
    }
}

/// A command envelope and the caller's signature over it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCommand {
    envelope: CommandEnvelope,
    signature: CommandSignature,
}

impl SignedCommand {
    pub fn from_parts(envelope: CommandEnvelope, signature: CommandSignature) -> Self {
        Self {
            envelope,
            signature,
        }
    }

    pub fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    pub fn signature(&self) -> &CommandSignature {
        &self.signature
    }

    pub fn id(&self) -> CommandId {
        self.envelope.id()
    }

    /// Check the signature against the caller's own key
    pub fn verify(&self) -> bool {
        Signer::verify(&self.envelope, &self.signature).is_ok()
    }
}
