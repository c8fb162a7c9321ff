use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a campaign, always derived and never stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignStatus {
    /// Before the deadline with the goal not yet reached
    Active,
    /// Goal reached, regardless of the deadline
    Successful,
    /// Deadline passed with the goal not reached
    Failed,
}

impl CampaignStatus {
    /// Derive the status from current values.
    ///
    /// A withdrawn campaign reads as Successful: withdrawal is only possible
    /// from Successful and empties the balance it was derived from.
    pub fn derive(balance: u64, goal: u64, deadline: u64, now: u64, withdrawn: bool) -> Self {
        if withdrawn || balance >= goal {
            CampaignStatus::Successful
        } else if now < deadline {
            CampaignStatus::Active
        } else {
            CampaignStatus::Failed
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignStatus::Active => "Active",
            CampaignStatus::Successful => "Successful",
            CampaignStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}
