//! Tiered crowdfunding escrow ledger.
//!
//! A [`registry::Registry`] creates campaigns and owns them. Each campaign
//! holds backer funds in escrow against up to four fixed-price tiers and
//! derives its lifecycle status (Active, Successful, Failed) from balance,
//! goal, deadline and the injected [`clock::Clock`] on every call. Funds
//! leave escrow exactly once: to the owner on success, or back to each
//! backer on failure.

pub mod campaign;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod identity;
pub mod registry;

pub use error::{LedgerError, LedgerResult};
