// Tier Ledger - Fixed-price funding tiers and the contributions made against them
//
// Tiers are listed by position, but contributions are keyed by a stable
// TierId so removing a tier never re-attributes funds to its successor.

use crate::error::{LedgerError, LedgerResult};
use crate::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of tiers a campaign may hold at once
pub const MAX_TIERS: usize = 4;

/// Stable identity of a tier within one campaign; never reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TierId(u64);

/// A fixed-price contribution option
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    id: TierId,
    name: String,
    target_amount: u64,
    backer_count: u64,
}

impl Tier {
    pub fn id(&self) -> TierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact amount a fund call against this tier must pay
    pub fn target_amount(&self) -> u64 {
        self.target_amount
    }

    /// Number of successful fund calls; not reduced by refunds
    pub fn backer_count(&self) -> u64 {
        self.backer_count
    }
}

/// Public listing entry for a tier, positioned at read time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierView {
    pub index: usize,
    pub name: String,
    pub target_amount: u64,
    pub backer_count: u64,
}

/// Ordered tiers of one campaign plus its open contribution records
#[derive(Clone, Debug, Default)]
pub struct TierLedger {
    tiers: Vec<Tier>,
    next_id: u64,
    /// (backer, tier) -> amount paid and not yet refunded or withdrawn
    contributions: BTreeMap<(AccountId, TierId), u64>,
}

impl TierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Tier at a public position
    pub fn get(&self, index: usize) -> Option<&Tier> {
        self.tiers.get(index)
    }

    /// Listing with positions computed now
    pub fn views(&self) -> Vec<TierView> {
        self.tiers
            .iter()
            .enumerate()
            .map(|(index, t)| TierView {
                index,
                name: t.name.clone(),
                target_amount: t.target_amount,
                backer_count: t.backer_count,
            })
            .collect()
    }

    // ========================================================================
    // TIER MANAGEMENT
    // ========================================================================

    /// Append a tier, returning its position
    pub fn add(&mut self, name: &str, target_amount: u64) -> LedgerResult<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidParameters("tier name cannot be empty".into()));
        }
        if target_amount == 0 {
            return Err(LedgerError::InvalidParameters(
                "tier amount must be positive".into(),
            ));
        }
        if self.tiers.len() >= MAX_TIERS {
            return Err(LedgerError::TooManyTiers { max: MAX_TIERS });
        }
        if self.tiers.iter().any(|t| t.name == name) {
            return Err(LedgerError::InvalidParameters(format!(
                "tier name '{name}' already exists"
            )));
        }

        let id = TierId(self.next_id);
        self.next_id += 1;
        self.tiers.push(Tier {
            id,
            name: name.to_string(),
            target_amount,
            backer_count: 0,
        });

        Ok(self.tiers.len() - 1)
    }

    /// Remove the tier at `index`; later tiers shift down by one.
    /// Contribution records of the removed tier stay open under its TierId.
    pub fn remove(&mut self, index: usize) -> LedgerResult<Tier> {
        if index >= self.tiers.len() {
            return Err(LedgerError::OutOfRange {
                index,
                len: self.tiers.len(),
            });
        }
        Ok(self.tiers.remove(index))
    }

    // ========================================================================
    // CONTRIBUTIONS
    // ========================================================================

    /// Record a paid contribution against the tier at `index`
    pub(crate) fn record_contribution(
        &mut self,
        backer: &AccountId,
        index: usize,
        amount: u64,
    ) -> LedgerResult<()> {
        let len = self.tiers.len();
        let tier = self
            .tiers
            .get_mut(index)
            .ok_or(LedgerError::OutOfRange { index, len })?;

        let key = (backer.clone(), tier.id);
        let updated = self
            .contributions
            .get(&key)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        self.contributions.insert(key, updated);
        tier.backer_count += 1;
        Ok(())
    }

    /// Sum of the backer's open records across all tiers, removed ones included
    pub fn contribution_of(&self, backer: &AccountId) -> u64 {
        self.contributions
            .range((backer.clone(), TierId(0))..=(backer.clone(), TierId(u64::MAX)))
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Whether the backer holds an open record against the tier at `index`
    pub fn has_funded(&self, backer: &AccountId, index: usize) -> bool {
        self.tiers
            .get(index)
            .and_then(|t| self.contributions.get(&(backer.clone(), t.id)))
            .is_some_and(|amount| *amount > 0)
    }

    /// Close every record of one backer, returning the total released
    pub(crate) fn take_contributions_of(&mut self, backer: &AccountId) -> u64 {
        let keys: Vec<(AccountId, TierId)> = self
            .contributions
            .range((backer.clone(), TierId(0))..=(backer.clone(), TierId(u64::MAX)))
            .map(|(k, _)| k.clone())
            .collect();

        keys.iter()
            .filter_map(|k| self.contributions.remove(k))
            .sum()
    }

    /// Close every record of every backer, returning the total released
    pub(crate) fn settle_all(&mut self) -> u64 {
        let total = self.contributions_total();
        self.contributions.clear();
        total
    }

    /// Sum of every open record
    pub fn contributions_total(&self) -> u64 {
        self.contributions.values().sum()
    }
}
