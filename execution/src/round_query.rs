//! Read-only lottery queries.
//!
//! This module answers questions about rounds, guesses and bettor ledgers from stored state, and
//! reconstructs bettor history from the event log.
//!
//! ## Query Types
//!
//! - [`CurrentRoundSnapshot`]: Timing, pool and counts of the open round
//! - [`RoundResult`]: Outcome of a settled round
//! - [`BettorPosition`]: A bettor's guesses and balances in one round
//! - [`RefundStatus`]: Whether a bettor can claim a refund
//! - [`BettorRecord`]: Per-round activity reconstructed from events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sealdraw_execution::round_query::{
//!     query_current_round, query_round_result, query_bettor_history,
//! };
//!
//! let snapshot = query_current_round(&state, now).await?;
//! let result = query_round_result(&state, snapshot.round_id - 1).await?;
//! let history = query_bettor_history(&events, &bettor);
//! ```

use commonware_cryptography::ed25519::PublicKey;
use sealdraw_types::execution::Event;
use sealdraw_types::lottery::{Guess, LotteryState, Round, RoundPhase};

use crate::round_scheduler::{RoundScheduler, RoundTiming};
use crate::settlement::refund_amount;
use crate::state::{self, locked_funds, State};

/// Error during lottery queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The lottery has not been initialized.
    NotInitialized,
    /// No round with this id.
    RoundNotFound(u64),
    /// No guess at this index in the round.
    GuessNotFound { round_id: u64, index: u32 },
    /// The round has no result yet.
    NotSettled(u64),
    /// State access error.
    StateError(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "lottery not initialized"),
            Self::RoundNotFound(id) => write!(f, "round {id} not found"),
            Self::GuessNotFound { round_id, index } => {
                write!(f, "guess {index} not found in round {round_id}")
            }
            Self::NotSettled(id) => write!(f, "round {id} not settled"),
            Self::StateError(msg) => write!(f, "state error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        Self::StateError(err.to_string())
    }
}

/// Snapshot of the open round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentRoundSnapshot {
    pub round_id: u64,
    pub start_time: u64,
    /// Zero while waiting for the first guess.
    pub end_time: u64,
    pub total_pool: u64,
    pub player_count: u32,
    pub guess_count: u32,
    pub settled: bool,
    /// No guess yet, so no timer.
    pub waiting: bool,
    /// Seconds left on the timer; `None` while waiting.
    pub time_remaining: Option<u64>,
    pub phase: RoundPhase,
}

impl CurrentRoundSnapshot {
    pub fn from_round(round: &Round, scheduler: &RoundScheduler, now: u64) -> Self {
        Self {
            round_id: round.id,
            start_time: round.start_time,
            end_time: round.end_time,
            total_pool: round.total_pool,
            player_count: round.player_count,
            guess_count: round.guess_count,
            settled: round.settled,
            waiting: round.is_waiting(),
            time_remaining: scheduler.time_remaining(round, now),
            phase: scheduler.phase(round, now),
        }
    }
}

/// Outcome of a settled round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundResult {
    pub round_id: u64,
    pub settled: bool,
    pub has_exact_match: bool,
    /// `None` for skipped rounds, which are never decrypted.
    pub revealed_secret: Option<u64>,
    pub total_pool: u64,
    pub platform_fee: u64,
    pub winners: Vec<PublicKey>,
    pub payouts: Vec<u64>,
    pub skipped: bool,
}

impl RoundResult {
    pub fn from_round(round: &Round) -> Self {
        Self {
            round_id: round.id,
            settled: round.settled,
            has_exact_match: round.has_exact_match,
            revealed_secret: round.revealed_secret,
            total_pool: round.total_pool,
            platform_fee: round.platform_fee,
            winners: round.winners.clone(),
            payouts: round.payouts.clone(),
            skipped: round.skipped,
        }
    }
}

/// A bettor's stake in one round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BettorPosition {
    pub round_id: u64,
    pub bettor: PublicKey,
    /// Guess indices, in submission order.
    pub guesses: Vec<u32>,
    pub contribution: u64,
    pub refund_claimed: bool,
    pub pending_payout: u64,
}

/// Refund eligibility of a bettor for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefundStatus {
    /// The round has not settled yet.
    NotSettled,
    /// The round paid winners; nothing is refundable.
    RoundHadWinners,
    /// The bettor paid nothing into the round.
    NoContribution,
    AlreadyClaimed,
    /// Claimable now.
    Eligible { amount: u64 },
}

/// One round of a bettor's activity, from events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BettorRecord {
    pub round_id: u64,
    /// Guess indices admitted for the bettor.
    pub guesses: Vec<u32>,
    /// Rank (0 = best) if the bettor won.
    pub rank: Option<usize>,
    /// Winning payout assigned at settlement, whether or not its transfer succeeded.
    pub payout: Option<u64>,
    pub refunded: Option<u64>,
    /// Amount queued after failed transfers.
    pub payout_failed: u64,
    /// Pending amount later claimed.
    pub pending_claimed: u64,
}

/// A bettor's activity across rounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BettorHistory {
    pub bettor: PublicKey,
    /// Records in order of first appearance.
    pub records: Vec<BettorRecord>,
    pub total_guesses: usize,
    /// Sum of assigned payouts and refunds.
    pub total_received: u64,
}

// -----------------------------------------------------------------------------
// Query Functions
// -----------------------------------------------------------------------------

/// Query the open round at time `now`.
pub async fn query_current_round<S: State>(
    state: &S,
    now: u64,
) -> Result<CurrentRoundSnapshot, QueryError> {
    let lottery = load_lottery(state).await?;
    let round = load_round(state, lottery.current_round).await?;
    let scheduler = RoundScheduler::new(RoundTiming::from(&lottery.config));
    Ok(CurrentRoundSnapshot::from_round(&round, &scheduler, now))
}

/// Query the result of a round.
///
/// Fails with [`QueryError::NotSettled`] until the round settles.
pub async fn query_round_result<S: State>(
    state: &S,
    round_id: u64,
) -> Result<RoundResult, QueryError> {
    let round = load_round(state, round_id).await?;
    if !round.settled {
        return Err(QueryError::NotSettled(round_id));
    }
    Ok(RoundResult::from_round(&round))
}

/// Query a single guess. Its value and distance stay confidential handles.
pub async fn query_guess<S: State>(
    state: &S,
    round_id: u64,
    index: u32,
) -> Result<Guess, QueryError> {
    state::load_guess(state, round_id, index)
        .await?
        .ok_or(QueryError::GuessNotFound { round_id, index })
}

/// Query a bettor's guesses and balances in a round.
pub async fn query_bettor_position<S: State>(
    state: &S,
    round_id: u64,
    bettor: &PublicKey,
) -> Result<BettorPosition, QueryError> {
    load_round(state, round_id).await?;
    let contribution = state::load_contribution(state, round_id, bettor).await?;
    Ok(BettorPosition {
        round_id,
        bettor: bettor.clone(),
        guesses: contribution.guesses,
        contribution: contribution.amount,
        refund_claimed: contribution.refund_claimed,
        pending_payout: contribution.pending_payout,
    })
}

/// Query whether `bettor` can claim a refund for `round_id`, and how much.
pub async fn query_refund_eligibility<S: State>(
    state: &S,
    round_id: u64,
    bettor: &PublicKey,
) -> Result<RefundStatus, QueryError> {
    let lottery = load_lottery(state).await?;
    let round = load_round(state, round_id).await?;
    if !round.settled {
        return Ok(RefundStatus::NotSettled);
    }
    if round.has_exact_match {
        return Ok(RefundStatus::RoundHadWinners);
    }
    let contribution = state::load_contribution(state, round_id, bettor).await?;
    Ok(if contribution.amount == 0 {
        RefundStatus::NoContribution
    } else if contribution.refund_claimed {
        RefundStatus::AlreadyClaimed
    } else {
        RefundStatus::Eligible {
            amount: refund_amount(contribution.amount, lottery.config.fee_bps),
        }
    })
}

/// Query the balance an emergency withdrawal may take: everything not held by an unsettled
/// round.
pub async fn query_withdrawable<S: State>(state: &S) -> Result<u64, QueryError> {
    let lottery = load_lottery(state).await?;
    let locked = locked_funds(state, lottery.current_round).await?;
    Ok(lottery.balance.saturating_sub(locked))
}

/// Query a bettor's history from event logs.
///
/// Rejected transactions emit no lottery events, so only admitted activity appears.
pub fn query_bettor_history(events: &[Event], bettor: &PublicKey) -> BettorHistory {
    let mut records: Vec<BettorRecord> = Vec::new();

    fn record(records: &mut Vec<BettorRecord>, round_id: u64) -> &mut BettorRecord {
        let position = match records.iter().position(|r| r.round_id == round_id) {
            Some(position) => position,
            None => {
                records.push(BettorRecord {
                    round_id,
                    ..BettorRecord::default()
                });
                records.len() - 1
            }
        };
        &mut records[position]
    }

    for event in events {
        match event {
            Event::GuessSubmitted {
                round_id,
                bettor: who,
                index,
            } if who == bettor => {
                record(&mut records, *round_id).guesses.push(*index);
            }

            Event::RoundSettled {
                round_id,
                winners,
                payouts,
                ..
            } => {
                if let Some(rank) = winners.iter().position(|w| w == bettor) {
                    let entry = record(&mut records, *round_id);
                    entry.rank = Some(rank);
                    entry.payout = payouts.get(rank).copied();
                }
            }

            Event::RefundClaimed {
                round_id,
                bettor: who,
                amount,
            } if who == bettor => {
                record(&mut records, *round_id).refunded = Some(*amount);
            }

            Event::PayoutFailed {
                round_id,
                recipient,
                amount,
            } if recipient == bettor => {
                let entry = record(&mut records, *round_id);
                entry.payout_failed = entry.payout_failed.saturating_add(*amount);
            }

            Event::PendingPayoutClaimed {
                round_id,
                recipient,
                amount,
            } if recipient == bettor => {
                let entry = record(&mut records, *round_id);
                entry.pending_claimed = entry.pending_claimed.saturating_add(*amount);
            }

            _ => {}
        }
    }

    let total_guesses = records.iter().map(|r| r.guesses.len()).sum();
    let total_received = records
        .iter()
        .map(|r| r.payout.unwrap_or(0).saturating_add(r.refunded.unwrap_or(0)))
        .fold(0u64, u64::saturating_add);

    BettorHistory {
        bettor: bettor.clone(),
        records,
        total_guesses,
        total_received,
    }
}

/// Query the rounds a bettor guessed in.
///
/// # Returns
///
/// Sorted list of unique round IDs.
pub fn query_bettor_rounds(events: &[Event], bettor: &PublicKey) -> Vec<u64> {
    let mut round_ids: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            Event::GuessSubmitted {
                round_id,
                bettor: who,
                ..
            } if who == bettor => Some(*round_id),
            _ => None,
        })
        .collect();

    round_ids.sort_unstable();
    round_ids.dedup();
    round_ids
}

// -----------------------------------------------------------------------------
// Internal Helpers
// -----------------------------------------------------------------------------

async fn load_lottery<S: State>(state: &S) -> Result<LotteryState, QueryError> {
    state::load_lottery(state)
        .await?
        .ok_or(QueryError::NotInitialized)
}

async fn load_round<S: State>(state: &S, round_id: u64) -> Result<Round, QueryError> {
    state::load_round(state, round_id)
        .await?
        .ok_or(QueryError::RoundNotFound(round_id))
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Memory;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};
    use commonware_runtime::{deterministic::Runner, Runner as _};
    use sealdraw_types::execution::{Key, Value};
    use sealdraw_types::lottery::{Contribution, Handle, LotteryConfig};

    fn key(seed: u64) -> PublicKey {
        PrivateKey::from_seed(seed).public_key()
    }

    fn lottery(current_round: u64, balance: u64) -> LotteryState {
        LotteryState {
            config: LotteryConfig::default(),
            owner: key(1),
            pending_owner: None,
            fee_wallet: key(2),
            current_round,
            balance,
        }
    }

    fn settled_round(id: u64, has_exact_match: bool) -> Round {
        let mut round = Round::new(id, 100, Handle::default());
        round.end_time = 700;
        round.total_pool = 3_000_000;
        round.platform_fee = 9_000;
        round.player_count = 2;
        round.guess_count = 3;
        round.max_winners = 1;
        round.decryption_requested_at = 800;
        round.settled = true;
        round.revealed_secret = Some(50);
        round.has_exact_match = has_exact_match;
        if has_exact_match {
            round.winners = vec![key(10)];
            round.payouts = vec![2_991_000];
        }
        round
    }

    async fn seed_state(rounds: Vec<Round>, lottery: LotteryState) -> Memory {
        let mut state = Memory::default();
        for round in rounds {
            state
                .insert(Key::Round(round.id), Value::Round(round))
                .await
                .unwrap();
        }
        state
            .insert(Key::Lottery, Value::Lottery(lottery))
            .await
            .unwrap();
        state
    }

    #[test]
    fn test_current_round_snapshot() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut open = Round::new(2, 1_000, Handle::default());
            let state = seed_state(
                vec![settled_round(1, true), open.clone()],
                lottery(2, 0),
            )
            .await;

            let snapshot = query_current_round(&state, 5_000).await.unwrap();
            assert_eq!(snapshot.round_id, 2);
            assert!(snapshot.waiting);
            assert_eq!(snapshot.time_remaining, None);
            assert_eq!(snapshot.phase, RoundPhase::Waiting);

            open.end_time = 1_600;
            let scheduler = RoundScheduler::new(RoundTiming::new(600, 30));
            let snapshot = CurrentRoundSnapshot::from_round(&open, &scheduler, 1_500);
            assert!(!snapshot.waiting);
            assert_eq!(snapshot.time_remaining, Some(100));
            assert_eq!(snapshot.phase, RoundPhase::Active);
        });
    }

    #[test]
    fn test_round_result_requires_settlement() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let open = Round::new(2, 1_000, Handle::default());
            let state = seed_state(vec![settled_round(1, true), open], lottery(2, 0)).await;

            let result = query_round_result(&state, 1).await.unwrap();
            assert!(result.has_exact_match);
            assert_eq!(result.revealed_secret, Some(50));
            assert_eq!(result.winners, vec![key(10)]);
            assert_eq!(result.payouts, vec![2_991_000]);

            assert_eq!(
                query_round_result(&state, 2).await,
                Err(QueryError::NotSettled(2))
            );
            assert_eq!(
                query_round_result(&state, 9).await,
                Err(QueryError::RoundNotFound(9))
            );
        });
    }

    #[test]
    fn test_uninitialized_lottery() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let state = Memory::default();
            assert_eq!(
                query_current_round(&state, 0).await,
                Err(QueryError::NotInitialized)
            );
            assert_eq!(
                query_withdrawable(&state).await,
                Err(QueryError::NotInitialized)
            );
            assert_eq!(
                query_guess(&state, 1, 0).await,
                Err(QueryError::GuessNotFound {
                    round_id: 1,
                    index: 0
                })
            );
        });
    }

    #[test]
    fn test_refund_eligibility() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let bettor = key(10);
            let mut state = seed_state(
                vec![
                    settled_round(1, true),
                    settled_round(2, false),
                    Round::new(3, 2_000, Handle::default()),
                ],
                lottery(3, 0),
            )
            .await;
            state
                .insert(
                    Key::Contribution {
                        round: 2,
                        bettor: bettor.clone(),
                    },
                    Value::Contribution(Contribution {
                        amount: 1_000_000,
                        guesses: vec![0],
                        ..Contribution::default()
                    }),
                )
                .await
                .unwrap();

            assert_eq!(
                query_refund_eligibility(&state, 1, &bettor).await.unwrap(),
                RefundStatus::RoundHadWinners
            );
            assert_eq!(
                query_refund_eligibility(&state, 2, &bettor).await.unwrap(),
                RefundStatus::Eligible { amount: 997_000 }
            );
            assert_eq!(
                query_refund_eligibility(&state, 2, &key(11)).await.unwrap(),
                RefundStatus::NoContribution
            );
            assert_eq!(
                query_refund_eligibility(&state, 3, &bettor).await.unwrap(),
                RefundStatus::NotSettled
            );

            let position = query_bettor_position(&state, 2, &bettor).await.unwrap();
            assert_eq!(position.guesses, vec![0]);
            assert_eq!(position.contribution, 1_000_000);
            assert!(!position.refund_claimed);
        });
    }

    #[test]
    fn test_withdrawable_excludes_unsettled_pools() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut open = Round::new(2, 1_000, Handle::default());
            open.total_pool = 2_000_000;
            let state = seed_state(
                vec![settled_round(1, false), open],
                lottery(2, 5_000_000),
            )
            .await;
            assert_eq!(query_withdrawable(&state).await.unwrap(), 3_000_000);
        });
    }

    #[test]
    fn test_bettor_history_from_events() {
        let alice = key(10);
        let bob = key(11);
        let events = vec![
            Event::GuessSubmitted {
                round_id: 1,
                bettor: alice.clone(),
                index: 0,
            },
            Event::GuessSubmitted {
                round_id: 1,
                bettor: bob.clone(),
                index: 1,
            },
            Event::GuessSubmitted {
                round_id: 1,
                bettor: alice.clone(),
                index: 2,
            },
            Event::PayoutFailed {
                round_id: 1,
                recipient: alice.clone(),
                amount: 1_994_000,
            },
            Event::RoundSettled {
                round_id: 1,
                has_exact_match: true,
                secret: 7,
                winners: vec![alice.clone()],
                payouts: vec![1_994_000],
            },
            Event::GuessSubmitted {
                round_id: 2,
                bettor: bob.clone(),
                index: 0,
            },
            Event::RefundClaimed {
                round_id: 2,
                bettor: bob.clone(),
                amount: 997_000,
            },
            Event::PendingPayoutClaimed {
                round_id: 1,
                recipient: alice.clone(),
                amount: 1_994_000,
            },
        ];

        let history = query_bettor_history(&events, &alice);
        assert_eq!(history.records.len(), 1);
        let record = &history.records[0];
        assert_eq!(record.guesses, vec![0, 2]);
        assert_eq!(record.rank, Some(0));
        assert_eq!(record.payout, Some(1_994_000));
        assert_eq!(record.payout_failed, 1_994_000);
        assert_eq!(record.pending_claimed, 1_994_000);
        assert_eq!(history.total_guesses, 2);
        assert_eq!(history.total_received, 1_994_000);

        let history = query_bettor_history(&events, &bob);
        assert_eq!(history.records.len(), 2);
        assert_eq!(history.records[0].rank, None);
        assert_eq!(history.records[1].refunded, Some(997_000));
        assert_eq!(history.total_received, 997_000);

        assert_eq!(query_bettor_rounds(&events, &bob), vec![1, 2]);
        assert_eq!(query_bettor_rounds(&events, &alice), vec![1]);
        assert!(query_bettor_rounds(&events, &key(12)).is_empty());
    }
}
