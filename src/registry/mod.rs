// Registry module - THE FACTORY
// Owns every campaign, assigns identities and serializes access to them

mod execute;
mod factory;
mod id;
mod replay;

pub use execute::Outcome;
pub use factory::{CampaignSummary, Registry};
pub use id::{CampaignId, RegistryId};
