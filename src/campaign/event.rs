use crate::identity::AccountId;
use serde::{Deserialize, Serialize};

/// What happened to a campaign
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEventKind {
    TierAdded {
        index: usize,
        name: String,
        target_amount: u64,
    },
    TierRemoved {
        index: usize,
        name: String,
    },
    Funded {
        backer: AccountId,
        tier_index: usize,
        amount: u64,
    },
    Withdrawn {
        owner: AccountId,
        amount: u64,
    },
    Refunded {
        backer: AccountId,
        amount: u64,
    },
}

/// Append-only history entry, stamped with the logical time it was applied
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    timestamp: u64,
    kind: LedgerEventKind,
}

impl LedgerEvent {
    pub fn new(timestamp: u64, kind: LedgerEventKind) -> Self {
        Self { timestamp, kind }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn kind(&self) -> &LedgerEventKind {
        &self.kind
    }
}
