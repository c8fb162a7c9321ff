// Campaign module - Tiered escrow for a single campaign
// Tier ledger, derived lifecycle status, funding, withdrawal and refunds

mod escrow;
mod event;
mod receipt;
mod status;
mod tier;

pub use escrow::{Campaign, CampaignSnapshot};
pub use event::{LedgerEvent, LedgerEventKind};
pub use receipt::{FundReceipt, Payout};
pub use status::CampaignStatus;
pub use tier::{Tier, TierId, TierLedger, TierView, MAX_TIERS};
