use crate::campaign::CampaignStatus;
use crate::identity::AccountId;
use crate::registry::CampaignId;
use serde::{Deserialize, Serialize};

/// Result of an accepted fund call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundReceipt {
    pub campaign: CampaignId,
    pub backer: AccountId,
    pub tier_index: usize,
    pub amount: u64,
    pub balance_after: u64,
    /// Status right after the effect; Successful when this call reached the goal
    pub status_after: CampaignStatus,
}

/// Funds released from escrow that the host must transfer to `recipient`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub campaign: CampaignId,
    pub recipient: AccountId,
    pub amount: u64,
}
