// Registry - Creates campaigns and indexes them by creation order and owner
//
// Locking: one RwLock over the indexes, one RwLock per campaign. Mutations
// take the campaign's write lock for their whole validate-then-apply step,
// reads take its read lock, so every snapshot is internally consistent.
// The index lock is never held while a campaign lock is taken.

use crate::campaign::{
    Campaign, CampaignSnapshot, CampaignStatus, FundReceipt, LedgerEvent, Payout, Tier, TierView,
};
use crate::clock::Clock;
use crate::error::{LedgerError, LedgerResult};
use crate::identity::AccountId;
use crate::registry::replay::ReplayWindow;
use crate::registry::{CampaignId, RegistryId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Registry listing entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: CampaignId,
    pub owner: AccountId,
    pub name: String,
    pub creation_time: u64,
}

#[derive(Default)]
struct RegistryIndex {
    sequence: u64,
    all_campaigns: Vec<CampaignId>,
    by_owner: HashMap<AccountId, Vec<CampaignId>>,
    campaigns: HashMap<CampaignId, Arc<RwLock<Campaign>>>,
}

/// The campaign factory and sole owner of every campaign
pub struct Registry {
    id: RegistryId,
    clock: Arc<dyn Clock>,
    index: RwLock<RegistryIndex>,
    /// Signed commands applied within the freshness window
    pub(super) replay: Mutex<ReplayWindow>,
}

// A panic while holding a lock cannot leave a campaign half-mutated:
// every operation validates before it writes. Poisoned guards are usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

pub(super) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl Registry {
    /// Create an empty registry reading time from `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_id(RegistryId::generate(), clock)
    }

    /// Create an empty registry with a fixed identity
    pub fn with_id(id: RegistryId, clock: Arc<dyn Clock>) -> Self {
        Self {
            id,
            clock,
            index: RwLock::new(RegistryIndex::default()),
            replay: Mutex::new(ReplayWindow::default()),
        }
    }

    pub fn id(&self) -> &RegistryId {
        &self.id
    }

    /// Current logical time of the registry clock
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn campaign_count(&self) -> usize {
        read(&self.index).all_campaigns.len()
    }

    pub(super) fn handle(&self, id: &CampaignId) -> LedgerResult<Arc<RwLock<Campaign>>> {
        read(&self.index)
            .campaigns
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("campaign {id}")))
    }

    /// Run a read-only closure against a campaign at the current time
    fn view<R>(&self, id: &CampaignId, f: impl FnOnce(&Campaign, u64) -> R) -> LedgerResult<R> {
        let handle = self.handle(id)?;
        let campaign = read(&handle);
        Ok(f(&*campaign, self.clock.now()))
    }

    /// Run a mutation against a campaign under its write lock
    fn mutate<R>(
        &self,
        id: &CampaignId,
        op: &'static str,
        f: impl FnOnce(&mut Campaign, u64) -> LedgerResult<R>,
    ) -> LedgerResult<R> {
        let handle = self.handle(id)?;
        let mut campaign = write(&handle);
        let now = self.clock.now();
        f(&mut *campaign, now).inspect_err(|e| {
            debug!(campaign = %id, op, error = %e, "operation rejected");
        })
    }

    // ========================================================================
    // FACTORY
    // ========================================================================

    /// Create a campaign ending `duration` time units from now
    pub fn create_campaign(
        &self,
        owner: &AccountId,
        name: &str,
        description: &str,
        goal: u64,
        duration: u64,
    ) -> LedgerResult<CampaignId> {
        self.insert_campaign(owner, name, description, goal, duration, || Ok(()))
    }

    /// Create a campaign; `admit` runs under the index write lock once the
    /// campaign is built, and an error from it leaves the registry untouched.
    pub(super) fn insert_campaign<E: From<LedgerError>>(
        &self,
        owner: &AccountId,
        name: &str,
        description: &str,
        goal: u64,
        duration: u64,
        admit: impl FnOnce() -> Result<(), E>,
    ) -> Result<CampaignId, E> {
        Campaign::validate_params(name, description, goal, duration).inspect_err(|e| {
            debug!(owner = %owner.short(), error = %e, "campaign creation rejected");
        })?;

        let mut index = write(&self.index);
        let now = self.clock.now();
        let id = CampaignId::derive(&self.id, index.sequence, owner);
        let campaign = Campaign::new(id.clone(), owner.clone(), name, description, goal, duration, now)?;
        let deadline = campaign.deadline();
        admit()?;

        index.sequence += 1;
        index.all_campaigns.push(id.clone());
        index
            .by_owner
            .entry(owner.clone())
            .or_default()
            .push(id.clone());
        index
            .campaigns
            .insert(id.clone(), Arc::new(RwLock::new(campaign)));

        info!(campaign = %id, owner = %owner.short(), goal, deadline, "campaign created");
        Ok(id)
    }

    /// Every campaign id in creation order
    pub fn get_all_campaigns(&self) -> Vec<CampaignId> {
        read(&self.index).all_campaigns.clone()
    }

    /// Campaign ids created by `owner`, in creation order
    pub fn get_user_campaigns(&self, owner: &AccountId) -> Vec<CampaignId> {
        read(&self.index)
            .by_owner
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    /// Listing entries for every campaign in creation order
    pub fn campaign_summaries(&self) -> Vec<CampaignSummary> {
        self.summaries_of(&self.get_all_campaigns())
    }

    /// Listing entries for `owner`'s campaigns
    pub fn user_campaign_summaries(&self, owner: &AccountId) -> Vec<CampaignSummary> {
        self.summaries_of(&self.get_user_campaigns(owner))
    }

    fn summaries_of(&self, ids: &[CampaignId]) -> Vec<CampaignSummary> {
        ids.iter()
            .filter_map(|id| self.view(id, |c, _| c.summary()).ok())
            .collect()
    }

    // ========================================================================
    // READ PROJECTIONS
    // ========================================================================

    /// Consistent snapshot of a campaign at the current time
    pub fn get_campaign(&self, id: &CampaignId) -> LedgerResult<CampaignSnapshot> {
        self.view(id, |c, now| c.snapshot(now))
    }

    pub fn get_campaign_status(&self, id: &CampaignId) -> LedgerResult<CampaignStatus> {
        self.view(id, |c, now| c.status(now))
    }

    pub fn get_tiers(&self, id: &CampaignId) -> LedgerResult<Vec<TierView>> {
        self.view(id, |c, _| c.tiers().views())
    }

    /// Open contributions of `backer`, including those against removed tiers
    pub fn contribution_of(&self, id: &CampaignId, backer: &AccountId) -> LedgerResult<u64> {
        self.view(id, |c, _| c.tiers().contribution_of(backer))
    }

    pub fn has_funded_tier(
        &self,
        id: &CampaignId,
        backer: &AccountId,
        tier_index: usize,
    ) -> LedgerResult<bool> {
        self.view(id, |c, _| c.tiers().has_funded(backer, tier_index))
    }

    /// Balance and sum of open contribution records, read under one lock
    pub fn accounting(&self, id: &CampaignId) -> LedgerResult<(u64, u64)> {
        self.view(id, |c, _| (c.balance(), c.tiers().contributions_total()))
    }

    pub fn history(&self, id: &CampaignId) -> LedgerResult<Vec<LedgerEvent>> {
        self.view(id, |c, _| c.history().to_vec())
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn add_tier(
        &self,
        id: &CampaignId,
        caller: &AccountId,
        name: &str,
        target_amount: u64,
    ) -> LedgerResult<usize> {
        self.mutate(id, "add_tier", |c, now| c.add_tier(caller, name, target_amount, now))
    }

    pub fn remove_tier(&self, id: &CampaignId, caller: &AccountId, index: usize) -> LedgerResult<Tier> {
        self.mutate(id, "remove_tier", |c, now| c.remove_tier(caller, index, now))
    }

    pub fn fund(
        &self,
        id: &CampaignId,
        tier_index: usize,
        paid_amount: u64,
        backer: &AccountId,
    ) -> LedgerResult<FundReceipt> {
        self.mutate(id, "fund", |c, now| c.fund(backer, tier_index, paid_amount, now))
    }

    pub fn withdraw(&self, id: &CampaignId, caller: &AccountId) -> LedgerResult<Payout> {
        self.mutate(id, "withdraw", |c, now| c.withdraw(caller, now))
    }

    pub fn refund(&self, id: &CampaignId, backer: &AccountId) -> LedgerResult<Payout> {
        self.mutate(id, "refund", |c, now| c.refund(backer, now))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id.to_string())
            .field("campaigns", &self.campaign_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::identity::Keypair;

    #[test]
    fn test_create_sets_deadline_from_clock() {
        let clock = Arc::new(ManualClock::new(1_000));
        let registry = Registry::new(clock.clone());
        let owner = Keypair::generate().account_id();

        let id = registry.create_campaign(&owner, "Garden", "Seeds", 100, 30).unwrap();
        let snap = registry.get_campaign(&id).unwrap();

        assert_eq!(snap.creation_time, 1_000);
        assert_eq!(snap.deadline, 1_030);
        assert_eq!(snap.status, CampaignStatus::Active);
    }

    #[test]
    fn test_failed_creation_has_no_side_effects() {
        let registry = Registry::new(Arc::new(ManualClock::new(0)));
        let owner = Keypair::generate().account_id();

        assert!(registry.create_campaign(&owner, "Garden", "Seeds", 0, 30).is_err());
        assert_eq!(registry.campaign_count(), 0);
        assert!(registry.get_user_campaigns(&owner).is_empty());

        // The failed attempt did not consume a sequence number
        let id = registry.create_campaign(&owner, "Garden", "Seeds", 10, 30).unwrap();
        assert_eq!(id, CampaignId::derive(registry.id(), 0, &owner));
    }
}
