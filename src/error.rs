// Ledger error taxonomy
//
// Every failure is terminal for the call that raised it and leaves the
// ledger untouched: validation always runs before any mutation.

use crate::campaign::CampaignStatus;
use crate::identity::AccountId;
use thiserror::Error;

/// Errors returned by campaign and registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {caller} is not the campaign owner")]
    Forbidden { caller: AccountId },

    #[error("Invalid state: campaign is {actual}, operation requires {required}")]
    InvalidState {
        actual: CampaignStatus,
        required: CampaignStatus,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Amount mismatch: tier requires exactly {expected}, paid {paid}")]
    AmountMismatch { expected: u64, paid: u64 },

    #[error("Too many tiers: a campaign holds at most {max}")]
    TooManyTiers { max: usize },

    #[error("Tier index {index} out of range ({len} tiers)")]
    OutOfRange { index: usize, len: usize },

    #[error("Funds already withdrawn")]
    AlreadyWithdrawn,

    #[error("Nothing to refund")]
    NothingToRefund,

    #[error("Balance would overflow")]
    BalanceOverflow,
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
