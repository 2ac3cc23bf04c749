//! Settlement engine.
//!
//! Confidential distance computation happens when settlement is requested; everything else runs
//! on verified cleartexts and is pure, so ranking and payout math can be checked in isolation.

use crate::confidential::{ConfidentialError, ConfidentialValueStore};
use commonware_cryptography::ed25519::PublicKey;
use sealdraw_types::lottery::{Handle, LotteryConfig, BPS_DENOMINATOR};
use std::collections::HashSet;

/// Confidential `|guess - secret|`.
pub fn encrypted_distance<E: ConfidentialValueStore>(
    store: &mut E,
    guess: &Handle,
    secret: &Handle,
) -> Result<Handle, ConfidentialError> {
    let above = store.gt(guess, secret)?;
    let guess_minus_secret = store.sub(guess, secret)?;
    let secret_minus_guess = store.sub(secret, guess)?;
    store.select(&above, &guess_minus_secret, &secret_minus_guess)
}

/// Draw a secret uniformly enough in `[0, max_guess_value]`: sample below the secret bound and
/// fold draws above the range back down by half the bound.
pub fn draw_secret<E: ConfidentialValueStore>(
    store: &mut E,
    config: &LotteryConfig,
) -> Result<Handle, ConfidentialError> {
    let bound = config.secret_bound();
    let draw = store.random_bounded(bound)?;
    let max_handle = store.constant(config.max_guess_value);
    let half = store.constant(bound / 2);
    let out_of_range = store.gt(&draw, &max_handle)?;
    let folded = store.sub(&draw, &half)?;
    store.select(&out_of_range, &folded, &draw)
}

/// A guess with its revealed distance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedGuess {
    pub bettor: PublicKey,
    pub distance: u64,
    pub submission_order: u32,
}

/// Winners and their payouts, parallel and in rank order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub has_exact_match: bool,
    /// Positions into the ranked guess slice.
    pub winners: Vec<usize>,
    pub payouts: Vec<u64>,
}

/// Rank guesses by `(distance, submission_order)` and keep each bettor's best guess until
/// `max_winners` bettors are selected.
pub fn rank_winners(guesses: &[RankedGuess], max_winners: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..guesses.len()).collect();
    order.sort_by_key(|&i| (guesses[i].distance, guesses[i].submission_order));

    let mut seen = HashSet::new();
    let mut winners = Vec::with_capacity(max_winners);
    for i in order {
        if winners.len() == max_winners {
            break;
        }
        if seen.insert(&guesses[i].bettor) {
            winners.push(i);
        }
    }
    winners
}

/// Split `prize_pool` by `shares` (basis points) across `winners` ranks. The last rank takes the
/// remainder so the full pool is paid.
pub fn compute_payouts(prize_pool: u64, shares: &[u64], winners: usize) -> Vec<u64> {
    let mut payouts = Vec::with_capacity(winners);
    let mut paid = 0u64;
    for rank in 0..winners {
        let payout = if rank + 1 == winners {
            prize_pool - paid
        } else {
            let share = shares.get(rank).copied().unwrap_or(0);
            ((prize_pool as u128 * share as u128) / BPS_DENOMINATOR as u128) as u64
        };
        paid += payout;
        payouts.push(payout);
    }
    payouts
}

/// Settle a round from verified distances. Without an exact match nobody wins.
pub fn settle(guesses: &[RankedGuess], prize_pool: u64, shares: &[u64]) -> Outcome {
    let has_exact_match = guesses.iter().any(|guess| guess.distance == 0);
    if !has_exact_match {
        return Outcome::default();
    }
    let winners = rank_winners(guesses, shares.len());
    let payouts = compute_payouts(prize_pool, shares, winners.len());
    Outcome {
        has_exact_match,
        winners,
        payouts,
    }
}

/// Refund owed on a no-winner round.
pub fn refund_amount(contribution: u64, fee_bps: u16) -> u64 {
    let fee = (contribution as u128 * fee_bps as u128) / BPS_DENOMINATOR as u128;
    contribution - fee as u64
}

/// Guess value implied by the revealed secret and distance, if unambiguous within `[0, max]`.
pub fn implied_guess(secret: u64, distance: u64, max: u64) -> Option<u64> {
    if distance == 0 {
        return Some(secret);
    }
    let below = secret.checked_sub(distance);
    let above = secret.checked_add(distance).filter(|value| *value <= max);
    match (below, above) {
        (Some(value), None) | (None, Some(value)) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidential::PlaintextEngine;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};
    use proptest::prelude::*;
    use sealdraw_types::lottery::{payout_shares, winner_tier};

    fn bettor(seed: u64) -> PublicKey {
        PrivateKey::from_seed(seed).public_key()
    }

    fn guess(seed: u64, distance: u64, submission_order: u32) -> RankedGuess {
        RankedGuess {
            bettor: bettor(seed),
            distance,
            submission_order,
        }
    }

    #[test]
    fn test_no_exact_match_pays_nobody() {
        // Guesses 10, 52, 90 against secret 50.
        let guesses = vec![guess(1, 40, 0), guess(2, 2, 1), guess(3, 40, 2)];
        let shares = payout_shares(winner_tier(3)).unwrap();
        // `settle` pays only when some distance is 0; without an exact match the round refunds.
        assert_eq!(settle(&guesses, 2_991_000, shares), Outcome::default());

        // Ranking alone still puts the 52 guesser first.
        assert_eq!(rank_winners(&guesses, 1), vec![1]);
        assert_eq!(compute_payouts(2_991_000, shares, 1), vec![2_991_000]);
    }

    #[test]
    fn test_exact_match_settles() {
        let guesses = vec![guess(1, 40, 0), guess(2, 0, 1), guess(3, 40, 2)];
        let outcome = settle(&guesses, 1_000, payout_shares(1).unwrap());
        assert!(outcome.has_exact_match);
        assert_eq!(outcome.winners, vec![1]);
        assert_eq!(outcome.payouts, vec![1_000]);
    }

    #[test]
    fn test_tie_broken_by_submission_order() {
        let guesses = vec![guess(1, 5, 7), guess(2, 5, 3), guess(3, 0, 9)];
        assert_eq!(rank_winners(&guesses, 3), vec![2, 1, 0]);
    }

    #[test]
    fn test_one_win_per_bettor() {
        // Bettor 1 holds the two closest guesses; the second is skipped.
        let guesses = vec![
            guess(1, 0, 0),
            guess(1, 1, 1),
            guess(2, 3, 2),
            guess(3, 4, 3),
        ];
        assert_eq!(rank_winners(&guesses, 3), vec![0, 2, 3]);
    }

    #[test]
    fn test_last_winner_takes_remainder() {
        let shares = payout_shares(3).unwrap();
        let payouts = compute_payouts(1_001, shares, 3);
        assert_eq!(payouts, vec![500, 300, 201]);

        // Fewer eligible bettors than the tier: the last assigned rank absorbs the rest.
        let payouts = compute_payouts(1_000, shares, 2);
        assert_eq!(payouts, vec![500, 500]);
    }

    #[test]
    fn test_refund_amount() {
        assert_eq!(refund_amount(1_000_000, 30), 997_000);
        assert_eq!(refund_amount(0, 30), 0);
        assert_eq!(refund_amount(999, 10_000), 0);
    }

    #[test]
    fn test_implied_guess() {
        assert_eq!(implied_guess(50, 0, 100), Some(50));
        assert_eq!(implied_guess(50, 2, 100), None);
        assert_eq!(implied_guess(1, 2, 100), Some(3));
        assert_eq!(implied_guess(99, 3, 100), Some(96));
    }

    #[test]
    fn test_encrypted_distance_and_secret() {
        let mut engine = PlaintextEngine::new(11, PrivateKey::from_seed(0));
        let secret = engine.constant(50);
        for (value, expected) in [(10, 40), (52, 2), (90, 40), (50, 0)] {
            let guess = engine.constant(value);
            let distance = encrypted_distance(&mut engine, &guess, &secret).unwrap();
            assert_eq!(engine.peek(&distance), Some(expected));
        }

        for max in [1u64, 100, 127, 128] {
            let config = LotteryConfig {
                max_guess_value: max,
                ..LotteryConfig::default()
            };
            for _ in 0..32 {
                let secret = draw_secret(&mut engine, &config).unwrap();
                assert!(engine.peek(&secret).unwrap() <= max);
            }
        }
    }

    fn arb_guesses() -> impl Strategy<Value = Vec<RankedGuess>> {
        prop::collection::vec((0u64..8, 0u64..20), 1..60).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(order, (seed, distance))| guess(seed, distance, order as u32))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn payouts_sum_to_prize_pool(
            prize_pool in 0u64..=u64::MAX / 2,
            tier in prop::sample::select(vec![1u8, 3, 5, 7, 9, 11]),
            winners in 1usize..=11,
        ) {
            let shares = payout_shares(tier).unwrap();
            let winners = winners.min(shares.len());
            let payouts = compute_payouts(prize_pool, shares, winners);
            prop_assert_eq!(payouts.len(), winners);
            prop_assert_eq!(payouts.iter().map(|p| *p as u128).sum::<u128>(), prize_pool as u128);
        }

        #[test]
        fn winners_are_distinct_and_best(
            guesses in arb_guesses(),
            tier in prop::sample::select(vec![1u8, 3, 5, 7, 9, 11]),
        ) {
            let shares = payout_shares(tier).unwrap();
            let winners = rank_winners(&guesses, shares.len());
            prop_assert!(winners.len() <= shares.len());

            let bettors: HashSet<_> = winners.iter().map(|&i| &guesses[i].bettor).collect();
            prop_assert_eq!(bettors.len(), winners.len());

            // Ranked strictly by (distance, submission order).
            for pair in winners.windows(2) {
                let (a, b) = (&guesses[pair[0]], &guesses[pair[1]]);
                prop_assert!((a.distance, a.submission_order) < (b.distance, b.submission_order));
            }

            // No unselected bettor beats a winner.
            for (i, candidate) in guesses.iter().enumerate() {
                if winners.contains(&i) || bettors.contains(&candidate.bettor) {
                    continue;
                }
                if let Some(&last) = winners.last() {
                    let last = &guesses[last];
                    prop_assert!(
                        (candidate.distance, candidate.submission_order)
                            > (last.distance, last.submission_order)
                    );
                }
            }
        }
    }
}
