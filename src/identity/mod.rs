// Identity module - Account ids and the Ed25519 keys that back them

mod account;
mod keypair;

pub use account::*;
pub use keypair::*;
