// Campaign - Escrow state machine for one crowdfunding campaign
//
// Holds the pooled balance and tier ledger. Status is recomputed from
// balance, goal, deadline and the caller-supplied time on every call.
//
// Invariant: balance == tiers.contributions_total() after every operation.

use crate::campaign::event::{LedgerEvent, LedgerEventKind};
use crate::campaign::receipt::{FundReceipt, Payout};
use crate::campaign::status::CampaignStatus;
use crate::campaign::tier::{Tier, TierLedger, TierView};
use crate::error::{LedgerError, LedgerResult};
use crate::identity::AccountId;
use crate::registry::{CampaignId, CampaignSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Immutable read view of a campaign at one instant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub id: CampaignId,
    pub owner: AccountId,
    pub name: String,
    pub description: String,
    pub goal: u64,
    pub deadline: u64,
    pub creation_time: u64,
    pub balance: u64,
    pub withdrawn: bool,
    pub status: CampaignStatus,
    pub tiers: Vec<TierView>,
    /// Logical time the snapshot was taken at
    pub observed_at: u64,
}

/// A single crowdfunding campaign
#[derive(Clone, Debug)]
pub struct Campaign {
    id: CampaignId,
    owner: AccountId,
    name: String,
    description: String,
    goal: u64,
    creation_time: u64,
    deadline: u64,
    balance: u64,
    withdrawn: bool,
    tiers: TierLedger,
    history: Vec<LedgerEvent>,
}

impl Campaign {
    /// Validate creation parameters without allocating anything
    pub fn validate_params(name: &str, description: &str, goal: u64, duration: u64) -> LedgerResult<()> {
        if name.trim().is_empty() {
            return Err(LedgerError::InvalidParameters("name cannot be empty".into()));
        }
        if description.trim().is_empty() {
            return Err(LedgerError::InvalidParameters("description cannot be empty".into()));
        }
        if goal == 0 {
            return Err(LedgerError::InvalidParameters("goal must be positive".into()));
        }
        if duration == 0 {
            return Err(LedgerError::InvalidParameters(
                "duration must be at least one time unit".into(),
            ));
        }
        Ok(())
    }

    /// Create a campaign whose deadline is `now + duration`
    pub fn new(
        id: CampaignId,
        owner: AccountId,
        name: &str,
        description: &str,
        goal: u64,
        duration: u64,
        now: u64,
    ) -> LedgerResult<Self> {
        Self::validate_params(name, description, goal, duration)?;
        let deadline = now.checked_add(duration).ok_or_else(|| {
            LedgerError::InvalidParameters("deadline overflows the clock".into())
        })?;

        Ok(Self {
            id,
            owner,
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            goal,
            creation_time: now,
            deadline,
            balance: 0,
            withdrawn: false,
            tiers: TierLedger::new(),
            history: Vec::new(),
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn id(&self) -> &CampaignId {
        &self.id
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn goal(&self) -> u64 {
        self.goal
    }

    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    pub fn creation_time(&self) -> u64 {
        self.creation_time
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn withdrawn(&self) -> bool {
        self.withdrawn
    }

    pub fn tiers(&self) -> &TierLedger {
        &self.tiers
    }

    pub fn history(&self) -> &[LedgerEvent] {
        &self.history
    }

    /// Status at logical time `now`
    pub fn status(&self, now: u64) -> CampaignStatus {
        CampaignStatus::derive(self.balance, self.goal, self.deadline, now, self.withdrawn)
    }

    pub fn snapshot(&self, now: u64) -> CampaignSnapshot {
        CampaignSnapshot {
            id: self.id.clone(),
            owner: self.owner.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            goal: self.goal,
            deadline: self.deadline,
            creation_time: self.creation_time,
            balance: self.balance,
            withdrawn: self.withdrawn,
            status: self.status(now),
            tiers: self.tiers.views(),
            observed_at: now,
        }
    }

    pub fn summary(&self) -> CampaignSummary {
        CampaignSummary {
            id: self.id.clone(),
            owner: self.owner.clone(),
            name: self.name.clone(),
            creation_time: self.creation_time,
        }
    }

    // ========================================================================
    // GUARDS
    // ========================================================================

    fn require_owner(&self, caller: &AccountId) -> LedgerResult<()> {
        if caller != &self.owner {
            return Err(LedgerError::Forbidden {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn require_status(&self, required: CampaignStatus, now: u64) -> LedgerResult<()> {
        let actual = self.status(now);
        if actual != required {
            return Err(LedgerError::InvalidState { actual, required });
        }
        Ok(())
    }

    fn record(&mut self, now: u64, kind: LedgerEventKind) {
        self.history.push(LedgerEvent::new(now, kind));
        debug_assert_eq!(self.balance, self.tiers.contributions_total());
    }

    // ========================================================================
    // TIER MANAGEMENT
    // ========================================================================

    /// Append a tier. Owner only, while Active.
    pub fn add_tier(
        &mut self,
        caller: &AccountId,
        name: &str,
        target_amount: u64,
        now: u64,
    ) -> LedgerResult<usize> {
        self.require_owner(caller)?;
        self.require_status(CampaignStatus::Active, now)?;

        let index = self.tiers.add(name, target_amount)?;
        info!(campaign = %self.id, index, name = name.trim(), target_amount, "tier added");
        self.record(
            now,
            LedgerEventKind::TierAdded {
                index,
                name: name.trim().to_string(),
                target_amount,
            },
        );
        Ok(index)
    }

    /// Remove the tier at `index`. Owner only, while Active.
    pub fn remove_tier(&mut self, caller: &AccountId, index: usize, now: u64) -> LedgerResult<Tier> {
        self.require_owner(caller)?;
        self.require_status(CampaignStatus::Active, now)?;

        let tier = self.tiers.remove(index)?;
        info!(campaign = %self.id, index, name = tier.name(), "tier removed");
        self.record(
            now,
            LedgerEventKind::TierRemoved {
                index,
                name: tier.name().to_string(),
            },
        );
        Ok(tier)
    }

    // ========================================================================
    // FUNDING
    // ========================================================================

    /// Pay exactly the tier's target amount into escrow.
    ///
    /// Preconditions are checked against the state before the effect, so the
    /// call that reaches the goal succeeds and later calls see Successful.
    pub fn fund(
        &mut self,
        backer: &AccountId,
        tier_index: usize,
        paid_amount: u64,
        now: u64,
    ) -> LedgerResult<FundReceipt> {
        self.require_status(CampaignStatus::Active, now)?;

        let expected = self
            .tiers
            .get(tier_index)
            .map(|t| t.target_amount())
            .ok_or_else(|| {
                LedgerError::NotFound(format!("tier {tier_index} in campaign {}", self.id))
            })?;
        if paid_amount != expected {
            return Err(LedgerError::AmountMismatch {
                expected,
                paid: paid_amount,
            });
        }
        let balance_after = self
            .balance
            .checked_add(paid_amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        self.tiers.record_contribution(backer, tier_index, paid_amount)?;
        self.balance = balance_after;

        let status_after = self.status(now);
        info!(
            campaign = %self.id,
            backer = %backer.short(),
            tier_index,
            amount = paid_amount,
            balance = balance_after,
            status = %status_after,
            "campaign funded"
        );
        self.record(
            now,
            LedgerEventKind::Funded {
                backer: backer.clone(),
                tier_index,
                amount: paid_amount,
            },
        );

        Ok(FundReceipt {
            campaign: self.id.clone(),
            backer: backer.clone(),
            tier_index,
            amount: paid_amount,
            balance_after,
            status_after,
        })
    }

    // ========================================================================
    // RELEASE
    // ========================================================================

    /// Release the whole balance to the owner. Owner only, once, when Successful.
    pub fn withdraw(&mut self, caller: &AccountId, now: u64) -> LedgerResult<Payout> {
        self.require_owner(caller)?;
        if self.withdrawn {
            return Err(LedgerError::AlreadyWithdrawn);
        }
        self.require_status(CampaignStatus::Successful, now)?;

        let amount = self.balance;
        let settled = self.tiers.settle_all();
        debug_assert_eq!(settled, amount);
        self.balance = 0;
        self.withdrawn = true;

        info!(campaign = %self.id, amount, "funds withdrawn");
        self.record(
            now,
            LedgerEventKind::Withdrawn {
                owner: caller.clone(),
                amount,
            },
        );

        Ok(Payout {
            campaign: self.id.clone(),
            recipient: caller.clone(),
            amount,
        })
    }

    /// Return every open contribution of `backer`. Only when Failed.
    pub fn refund(&mut self, backer: &AccountId, now: u64) -> LedgerResult<Payout> {
        self.require_status(CampaignStatus::Failed, now)?;

        let owed = self.tiers.contribution_of(backer);
        if owed == 0 {
            return Err(LedgerError::NothingToRefund);
        }
        // Open records always sum to the balance
        debug_assert!(owed <= self.balance);
        let released = self.tiers.take_contributions_of(backer);
        debug_assert_eq!(released, owed);
        self.balance = self.balance.saturating_sub(owed);

        info!(campaign = %self.id, backer = %backer.short(), amount = owed, "contribution refunded");
        self.record(
            now,
            LedgerEventKind::Refunded {
                backer: backer.clone(),
                amount: owed,
            },
        );

        Ok(Payout {
            campaign: self.id.clone(),
            recipient: backer.clone(),
            amount: owed,
        })
    }
}
