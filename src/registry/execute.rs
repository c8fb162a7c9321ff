// Signed command execution - authenticates the caller, then dispatches
//
// The replay check and the record of an applied id happen under the lock
// that serializes the operation itself: the campaign's write lock, or the
// index write lock for creation. Two copies of one command therefore never
// both apply, and a copy racing a failed one is not mistaken for a replay.

use crate::campaign::{Campaign, FundReceipt, Payout, Tier};
use crate::command::{Command, CommandError, CommandId, CommandValidator, SignedCommand};
use crate::config::LedgerConfig;
use crate::error::LedgerResult;
use crate::registry::factory::write;
use crate::registry::{CampaignId, Registry};
use tracing::debug;

/// Successful result of an executed command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Created(CampaignId),
    TierAdded(usize),
    TierRemoved(Tier),
    Funded(FundReceipt),
    Withdrawn(Payout),
    Refunded(Payout),
}

/// Replay bookkeeping for one command in flight
struct Admission<'a> {
    registry: &'a Registry,
    id: CommandId,
    timestamp: u64,
}

impl Admission<'_> {
    fn check(&self) -> Result<(), CommandError> {
        let window = self.registry.replay.lock().unwrap_or_else(|e| e.into_inner());
        if window.contains(&self.id) {
            return Err(CommandError::Replay(self.id.clone()));
        }
        Ok(())
    }

    fn record(&self) {
        self.registry
            .replay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(self.id.clone(), self.timestamp);
    }
}

impl Registry {
    /// Validate a signed command and apply it as its signer.
    ///
    /// A command id is consumed only when the operation succeeds, so a
    /// rejected command may be resubmitted; an applied one is a replay
    /// for as long as it would pass the freshness check.
    pub fn execute(&self, signed: &SignedCommand, config: &LedgerConfig) -> Result<Outcome, CommandError> {
        let now = self.now();
        CommandValidator::validate_with_freshness(
            signed,
            now,
            config.command_future_tolerance_secs,
            config.command_max_age_secs,
        )?;

        let pruned = self
            .replay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .prune_expired(now, config.command_max_age_secs);
        if pruned > 0 {
            debug!(pruned, "expired command ids dropped");
        }

        let admission = Admission {
            registry: self,
            id: signed.id(),
            timestamp: signed.envelope().timestamp(),
        };
        let result = self.dispatch(signed, &admission);

        debug!(command = %admission.id, op = signed.envelope().command().name(), ok = result.is_ok(), "command executed");
        result
    }

    /// Number of applied command ids still held for replay detection
    pub fn applied_command_count(&self) -> usize {
        self.replay.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn dispatch(&self, signed: &SignedCommand, admission: &Admission<'_>) -> Result<Outcome, CommandError> {
        let caller = signed.envelope().caller();
        let outcome = match signed.envelope().command() {
            Command::CreateCampaign {
                name,
                description,
                goal,
                duration,
            } => Outcome::Created(self.insert_campaign(caller, name, description, *goal, *duration, || {
                admission.check()?;
                admission.record();
                Ok::<(), CommandError>(())
            })?),
            Command::AddTier {
                campaign,
                name,
                target_amount,
            } => Outcome::TierAdded(self.apply(campaign, "add_tier", admission, |c, now| {
                c.add_tier(caller, name, *target_amount, now)
            })?),
            Command::RemoveTier { campaign, index } => {
                Outcome::TierRemoved(self.apply(campaign, "remove_tier", admission, |c, now| {
                    c.remove_tier(caller, *index as usize, now)
                })?)
            }
            Command::Fund {
                campaign,
                tier_index,
                amount,
            } => Outcome::Funded(self.apply(campaign, "fund", admission, |c, now| {
                c.fund(caller, *tier_index as usize, *amount, now)
            })?),
            Command::Withdraw { campaign } => {
                Outcome::Withdrawn(self.apply(campaign, "withdraw", admission, |c, now| c.withdraw(caller, now))?)
            }
            Command::Refund { campaign } => {
                Outcome::Refunded(self.apply(campaign, "refund", admission, |c, now| c.refund(caller, now))?)
            }
        };
        Ok(outcome)
    }

    /// Run a campaign mutation for a signed command; the replay check,
    /// the mutation and the record share one hold of the write lock
    fn apply<R>(
        &self,
        id: &CampaignId,
        op: &'static str,
        admission: &Admission<'_>,
        f: impl FnOnce(&mut Campaign, u64) -> LedgerResult<R>,
    ) -> Result<R, CommandError> {
        let handle = self.handle(id)?;
        let mut campaign = write(&handle);
        admission.check()?;

        let now = self.now();
        let result = f(&mut *campaign, now).inspect_err(|e| {
            debug!(campaign = %id, op, error = %e, "operation rejected");
        })?;
        admission.record();
        Ok(result)
    }
}
