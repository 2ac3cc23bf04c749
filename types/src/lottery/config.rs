use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};

use super::constants::*;

/// Reason a [`LotteryConfig`] was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("fee_bps {0} exceeds {BPS_DENOMINATOR}")]
    FeeTooHigh(u16),
    #[error("max_players {0} exceeds {MAX_PLAYERS_LIMIT}")]
    TooManyPlayers(u32),
    #[error("max_guesses_per_player {0} exceeds {MAX_GUESSES_PER_PLAYER_LIMIT}")]
    TooManyGuesses(u32),
    #[error("max_guess_value {0} does not fit in 32 bits")]
    GuessRangeTooWide(u64),
}

/// Operator-chosen lottery parameters, fixed at initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Seconds between the first guess of a round and its end.
    pub round_duration_secs: u64,
    /// Minimum wait between a decryption request and its finalization.
    pub finality_delay_secs: u64,
    /// Price of a single guess.
    pub ticket_price: u64,
    pub fee_bps: u16,
    /// Distinct bettors admitted per round.
    pub max_players: u32,
    pub max_guesses_per_player: u32,
    /// Guesses and the secret lie in `[0, max_guess_value]`.
    pub max_guess_value: u64,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: DEFAULT_ROUND_DURATION_SECS,
            finality_delay_secs: DEFAULT_FINALITY_DELAY_SECS,
            ticket_price: DEFAULT_TICKET_PRICE,
            fee_bps: DEFAULT_FEE_BPS,
            max_players: DEFAULT_MAX_PLAYERS,
            max_guesses_per_player: DEFAULT_MAX_GUESSES_PER_PLAYER,
            max_guess_value: DEFAULT_MAX_GUESS_VALUE,
        }
    }
}

impl LotteryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_duration_secs == 0 {
            return Err(ConfigError::Zero("round_duration_secs"));
        }
        if self.finality_delay_secs == 0 {
            return Err(ConfigError::Zero("finality_delay_secs"));
        }
        if self.ticket_price == 0 {
            return Err(ConfigError::Zero("ticket_price"));
        }
        if u64::from(self.fee_bps) > BPS_DENOMINATOR {
            return Err(ConfigError::FeeTooHigh(self.fee_bps));
        }
        if self.max_players == 0 {
            return Err(ConfigError::Zero("max_players"));
        }
        if self.max_players > MAX_PLAYERS_LIMIT {
            return Err(ConfigError::TooManyPlayers(self.max_players));
        }
        if self.max_guesses_per_player == 0 {
            return Err(ConfigError::Zero("max_guesses_per_player"));
        }
        if self.max_guesses_per_player > MAX_GUESSES_PER_PLAYER_LIMIT {
            return Err(ConfigError::TooManyGuesses(self.max_guesses_per_player));
        }
        if self.max_guess_value == 0 {
            return Err(ConfigError::Zero("max_guess_value"));
        }
        if self.max_guess_value > u64::from(u32::MAX) {
            return Err(ConfigError::GuessRangeTooWide(self.max_guess_value));
        }
        Ok(())
    }

    /// Smallest power of two strictly greater than `max_guess_value`.
    pub fn secret_bound(&self) -> u64 {
        (self.max_guess_value + 1).next_power_of_two()
    }

    /// Fee withheld from `amount` at the configured rate (rounded down).
    pub fn fee_on(&self, amount: u64) -> u64 {
        ((amount as u128 * self.fee_bps as u128) / BPS_DENOMINATOR as u128) as u64
    }
}

impl Write for LotteryConfig {
    fn write(&self, writer: &mut impl BufMut) {
        self.round_duration_secs.write(writer);
        self.finality_delay_secs.write(writer);
        self.ticket_price.write(writer);
        self.fee_bps.write(writer);
        self.max_players.write(writer);
        self.max_guesses_per_player.write(writer);
        self.max_guess_value.write(writer);
    }
}

impl Read for LotteryConfig {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            round_duration_secs: u64::read(reader)?,
            finality_delay_secs: u64::read(reader)?,
            ticket_price: u64::read(reader)?,
            fee_bps: u16::read(reader)?,
            max_players: u32::read(reader)?,
            max_guesses_per_player: u32::read(reader)?,
            max_guess_value: u64::read(reader)?,
        })
    }
}

impl FixedSize for LotteryConfig {
    const SIZE: usize = u64::SIZE * 4 + u16::SIZE + u32::SIZE * 2;
}
