//! Winner tiers and payout share tables.

/// Payout shares (basis points) for each supported winner count. Each table sums to 10000.
const SHARES_1: [u64; 1] = [10_000];
const SHARES_3: [u64; 3] = [5_000, 3_000, 2_000];
const SHARES_5: [u64; 5] = [3_500, 2_500, 2_000, 1_200, 800];
const SHARES_7: [u64; 7] = [3_000, 2_000, 1_700, 1_300, 1_000, 600, 400];
const SHARES_9: [u64; 9] = [2_500, 1_800, 1_400, 1_200, 1_000, 800, 600, 400, 300];
const SHARES_11: [u64; 11] = [
    2_200, 1_600, 1_300, 1_100, 900, 800, 700, 550, 400, 300, 150,
];

/// Number of winners a round pays, by distinct player count.
pub fn winner_tier(player_count: u32) -> u8 {
    match player_count {
        0..=10 => 1,
        11..=20 => 3,
        21..=30 => 5,
        31..=40 => 7,
        41..=50 => 9,
        _ => 11,
    }
}

/// Share table for a winner tier, or `None` if `max_winners` is not a tier.
pub fn payout_shares(max_winners: u8) -> Option<&'static [u64]> {
    let shares: &'static [u64] = match max_winners {
        1 => &SHARES_1,
        3 => &SHARES_3,
        5 => &SHARES_5,
        7 => &SHARES_7,
        9 => &SHARES_9,
        11 => &SHARES_11,
        _ => return None,
    };
    Some(shares)
}
