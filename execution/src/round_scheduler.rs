//! Round timing for the lottery.
//!
//! Pure timing logic, separate from storage and handlers. A round waits without a deadline until
//! its first guess, then runs for `round_duration_secs`. Once settlement is requested, the result
//! cannot be finalized until `finality_delay_secs` have passed.
//!
//! ## Phases
//!
//! 1. **Waiting** - no guess yet, `end_time == 0`
//! 2. **Active** - timer running, guesses admitted
//! 3. **Ended** - timer elapsed, settlement not yet requested
//! 4. **DecryptionRequested** - waiting out the finality delay
//! 5. **Settled** - terminal for the round
//!
//! All arithmetic saturates.

use sealdraw_types::lottery::{LotteryConfig, Round, RoundPhase};

/// Durations (seconds) that drive a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundTiming {
    pub round_duration_secs: u64,
    pub finality_delay_secs: u64,
}

impl RoundTiming {
    pub fn new(round_duration_secs: u64, finality_delay_secs: u64) -> Self {
        Self {
            round_duration_secs,
            finality_delay_secs,
        }
    }
}

impl From<&LotteryConfig> for RoundTiming {
    fn from(config: &LotteryConfig) -> Self {
        Self {
            round_duration_secs: config.round_duration_secs,
            finality_delay_secs: config.finality_delay_secs,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RoundScheduler {
    timing: RoundTiming,
}

impl RoundScheduler {
    pub fn new(timing: RoundTiming) -> Self {
        Self { timing }
    }

    /// Phase of `round` at `now`.
    pub fn phase(&self, round: &Round, now: u64) -> RoundPhase {
        if round.settled {
            RoundPhase::Settled
        } else if round.decryption_requested() {
            RoundPhase::DecryptionRequested
        } else if round.is_waiting() {
            RoundPhase::Waiting
        } else if now < round.end_time {
            RoundPhase::Active
        } else {
            RoundPhase::Ended
        }
    }

    /// Guesses are admitted while waiting or while the timer runs.
    pub fn is_admission_open(&self, round: &Round, now: u64) -> bool {
        matches!(
            self.phase(round, now),
            RoundPhase::Waiting | RoundPhase::Active
        )
    }

    /// End time for a timer started by a guess at `now`.
    pub fn timer_end(&self, now: u64) -> u64 {
        now.saturating_add(self.timing.round_duration_secs)
    }

    /// Settlement can be requested once the timer has elapsed. Guess count is checked by the
    /// caller.
    pub fn can_request_settlement(&self, round: &Round, now: u64) -> bool {
        self.phase(round, now) == RoundPhase::Ended
    }

    /// Earliest time a requested settlement may be finalized.
    pub fn finality_deadline(&self, round: &Round) -> u64 {
        round
            .decryption_requested_at
            .saturating_add(self.timing.finality_delay_secs)
    }

    pub fn can_finalize(&self, round: &Round, now: u64) -> bool {
        self.phase(round, now) == RoundPhase::DecryptionRequested
            && now >= self.finality_deadline(round)
    }

    /// Seconds until the timer elapses; `None` while waiting for the first guess.
    pub fn time_remaining(&self, round: &Round, now: u64) -> Option<u64> {
        if round.is_waiting() {
            return None;
        }
        Some(round.end_time.saturating_sub(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealdraw_types::lottery::Handle;

    fn scheduler() -> RoundScheduler {
        RoundScheduler::new(RoundTiming::new(600, 30))
    }

    fn round() -> Round {
        Round::new(1, 1_000, Handle::default())
    }

    #[test]
    fn test_timing_from_config() {
        assert_eq!(
            RoundTiming::from(&LotteryConfig::default()),
            RoundTiming::new(600, 30)
        );
    }

    #[test]
    fn test_waiting_round_never_ends() {
        let scheduler = scheduler();
        let round = round();
        assert_eq!(scheduler.phase(&round, u64::MAX), RoundPhase::Waiting);
        assert!(scheduler.is_admission_open(&round, u64::MAX));
        assert!(!scheduler.can_request_settlement(&round, u64::MAX));
        assert_eq!(scheduler.time_remaining(&round, 5_000), None);
    }

    #[test]
    fn test_active_to_ended_boundary() {
        let scheduler = scheduler();
        let mut round = round();
        round.end_time = scheduler.timer_end(1_100);
        assert_eq!(round.end_time, 1_700);

        assert_eq!(scheduler.phase(&round, 1_699), RoundPhase::Active);
        assert_eq!(scheduler.time_remaining(&round, 1_699), Some(1));
        assert!(!scheduler.can_request_settlement(&round, 1_699));

        assert_eq!(scheduler.phase(&round, 1_700), RoundPhase::Ended);
        assert!(!scheduler.is_admission_open(&round, 1_700));
        assert!(scheduler.can_request_settlement(&round, 1_700));
        assert_eq!(scheduler.time_remaining(&round, 2_000), Some(0));
    }

    #[test]
    fn test_finality_boundary() {
        let scheduler = scheduler();
        let mut round = round();
        round.end_time = 1_700;
        round.decryption_requested_at = 1_800;

        assert_eq!(scheduler.phase(&round, 1_800), RoundPhase::DecryptionRequested);
        assert!(!scheduler.can_request_settlement(&round, 1_900));
        assert_eq!(scheduler.finality_deadline(&round), 1_830);
        assert!(!scheduler.can_finalize(&round, 1_829));
        assert!(scheduler.can_finalize(&round, 1_830));

        round.settled = true;
        assert_eq!(scheduler.phase(&round, 1_830), RoundPhase::Settled);
        assert!(!scheduler.can_finalize(&round, 1_830));
    }

    #[test]
    fn test_saturating_deadlines() {
        let scheduler = scheduler();
        assert_eq!(scheduler.timer_end(u64::MAX - 1), u64::MAX);
        let mut round = round();
        round.decryption_requested_at = u64::MAX;
        assert_eq!(scheduler.finality_deadline(&round), u64::MAX);
    }
}
