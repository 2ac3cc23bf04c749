//! Sealdraw execution layer.
//!
//! This crate contains the deterministic transaction execution logic (`Layer`) for a lottery
//! whose guesses and secrets stay confidential until settlement.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; the caller supplies `now` per block.
//! - Do not branch on confidential plaintext; only the engine behind
//!   [`ConfidentialValueStore`] computes on it.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Atomicity
//! Each transaction applies against a checkpoint of the pending writes. A rejected transaction
//! restores the checkpoint and emits a single `Rejected` event. Outbound transfers happen after
//! every check that can reject, so a rejection never follows a completed transfer.
//!
//! The primary entrypoint is [`Layer`].
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! use sealdraw_execution::{Layer, State};
//!
//! # async fn example<S, E, P>(state: &mut S, engine: &mut E, bank: &mut P, now: u64,
//! #     transactions: Vec<sealdraw_types::Transaction>) -> anyhow::Result<()>
//! # where S: State, E: sealdraw_execution::ConfidentialValueStore, P: sealdraw_execution::Payments {
//! let mut layer = Layer::new(&*state, engine, bank, now);
//! let (outputs, _nonces) = layer.execute(transactions).await?;
//! let changes = layer.commit();
//! state.apply(changes).await?;
//! # let _ = outputs;
//! # Ok(())
//! # }
//! ```

pub mod confidential;
pub mod payments;
pub mod round_query;
pub mod round_scheduler;
pub mod settlement;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


mod layer;

mod state;

pub use confidential::{ConfidentialError, ConfidentialValueStore};
pub use layer::{ApplyError, Layer};
pub use payments::{Payments, TransferError};
pub use round_query::{
    query_bettor_history, query_bettor_position, query_bettor_rounds, query_current_round,
    query_guess, query_refund_eligibility, query_round_result, query_withdrawable, BettorHistory,
    BettorPosition, BettorRecord, CurrentRoundSnapshot, QueryError, RefundStatus, RoundResult,
};
pub use round_scheduler::{RoundScheduler, RoundTiming};
pub use state::{
    load_contribution, load_guess, load_lottery, load_round, locked_funds, nonce, PrepareError,
    State, Status,
};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
