// Replay window - Applied signed command ids, kept while they could still be replayed
//
// A command older than the freshness window is rejected as expired before
// the window is consulted, so its id can be forgotten.

use crate::command::CommandId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(super) struct ReplayWindow {
    /// command id -> envelope timestamp
    applied: HashMap<CommandId, u64>,
}

impl ReplayWindow {
    pub(super) fn contains(&self, id: &CommandId) -> bool {
        self.applied.contains_key(id)
    }

    pub(super) fn record(&mut self, id: CommandId, timestamp: u64) {
        self.applied.insert(id, timestamp);
    }

    /// Forget ids whose commands would now fail freshness validation.
    /// Returns the number pruned.
    pub(super) fn prune_expired(&mut self, now: u64, max_age_secs: u64) -> usize {
        let before = self.applied.len();
        self.applied
            .retain(|_, timestamp| timestamp.saturating_add(max_age_secs) >= now);
        before - self.applied.len()
    }

    pub(super) fn len(&self) -> usize {
        self.applied.len()
    }
}
