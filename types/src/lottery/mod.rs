//! Lottery domain types.
//!
//! Rounds, guesses, per-bettor ledgers, configuration, tier tables and rejection reasons shared by
//! the execution layer and clients.

mod confidential;
mod config;
mod constants;
mod ledger;
mod reject;
mod round;
mod tiers;

pub use confidential::*;
pub use config::*;
pub use constants::*;
pub use ledger::*;
pub use reject::*;
pub use round::*;
pub use tiers::*;

#[cfg(test)]
mod tests;
