/// Basis-point denominator for fees and payout shares.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Maximum number of guesses accepted in a single submission.
pub const MAX_BATCH_SIZE: usize = 10;

/// Upper bound on distinct players any configuration may allow.
pub const MAX_PLAYERS_LIMIT: u32 = 1_000;

/// Upper bound on guesses a single bettor may hold in one round.
pub const MAX_GUESSES_PER_PLAYER_LIMIT: u32 = 100;

/// Largest winner tier (see [`crate::lottery::winner_tier`]).
pub const MAX_WINNERS: usize = 11;

/// Maximum ciphertext length accepted for a guess.
pub const MAX_CIPHERTEXT_LENGTH: usize = 256;

/// Maximum input or reveal proof length.
pub const MAX_PROOF_LENGTH: usize = 1_024;

/// Maximum guesses in a round (bounds decoding of per-round lists).
pub const MAX_ROUND_GUESSES: usize =
    (MAX_PLAYERS_LIMIT as usize) * (MAX_GUESSES_PER_PLAYER_LIMIT as usize);

/// Default configuration values.
pub const DEFAULT_ROUND_DURATION_SECS: u64 = 10 * 60;
pub const DEFAULT_FINALITY_DELAY_SECS: u64 = 30;
pub const DEFAULT_TICKET_PRICE: u64 = 1_000_000;
pub const DEFAULT_FEE_BPS: u16 = 30; // 0.30%
pub const DEFAULT_MAX_PLAYERS: u32 = 100;
pub const DEFAULT_MAX_GUESSES_PER_PLAYER: u32 = 10;
pub const DEFAULT_MAX_GUESS_VALUE: u64 = 100;

/// Error codes carried by `Event::Rejected`.
pub const ERROR_INSUFFICIENT_PAYMENT: u8 = 1;
pub const ERROR_LENGTH_MISMATCH: u8 = 2;
pub const ERROR_INVALID_BATCH_SIZE: u8 = 3;
pub const ERROR_INVALID_INPUT_PROOF: u8 = 4;
pub const ERROR_NON_PAYABLE: u8 = 5;
pub const ERROR_INVALID_CONFIG: u8 = 6;
pub const ERROR_NOT_INITIALIZED: u8 = 10;
pub const ERROR_ALREADY_INITIALIZED: u8 = 11;
pub const ERROR_ROUND_NOT_FOUND: u8 = 12;
pub const ERROR_ROUND_ENDED: u8 = 13;
pub const ERROR_ROUND_FULL: u8 = 14;
pub const ERROR_GUESS_LIMIT: u8 = 15;
pub const ERROR_ROUND_NOT_ENDED: u8 = 16;
pub const ERROR_NO_GUESSES: u8 = 17;
pub const ERROR_ALREADY_REQUESTED: u8 = 18;
pub const ERROR_NOT_REQUESTED: u8 = 19;
pub const ERROR_FINALITY_PENDING: u8 = 20;
pub const ERROR_ALREADY_SETTLED: u8 = 21;
pub const ERROR_NOT_SETTLED: u8 = 22;
pub const ERROR_ROUND_HAD_WINNERS: u8 = 23;
pub const ERROR_NOTHING_TO_REFUND: u8 = 24;
pub const ERROR_REFUND_ALREADY_CLAIMED: u8 = 25;
pub const ERROR_NOTHING_PENDING: u8 = 26;
pub const ERROR_ROUND_STILL_ACTIVE: u8 = 27;
pub const ERROR_INSUFFICIENT_WITHDRAWABLE: u8 = 28;
pub const ERROR_DECRYPTION_PENDING: u8 = 29;
pub const ERROR_UNAUTHORIZED: u8 = 40;
pub const ERROR_NOT_PENDING_OWNER: u8 = 41;
pub const ERROR_INVALID_DECRYPTION_PROOF: u8 = 50;
pub const ERROR_TRANSFER_FAILED: u8 = 60;
