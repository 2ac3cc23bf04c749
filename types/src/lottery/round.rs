use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{constants::MAX_WINNERS, Handle};

/// Lifecycle phase of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RoundPhase {
    /// No timed guess yet (`end_time == 0`).
    Waiting = 0,
    Active = 1,
    /// Timer elapsed, settlement not yet requested.
    Ended = 2,
    DecryptionRequested = 3,
    Settled = 4,
}

impl Write for RoundPhase {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for RoundPhase {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Waiting),
            1 => Ok(Self::Active),
            2 => Ok(Self::Ended),
            3 => Ok(Self::DecryptionRequested),
            4 => Ok(Self::Settled),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for RoundPhase {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

/// A single lottery round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    pub id: u64,
    pub start_time: u64,
    /// Zero until the first guess starts the timer.
    pub end_time: u64,
    pub secret: Handle,
    /// Set once settlement verifies the decryption proof.
    pub revealed_secret: Option<u64>,
    pub total_pool: u64,
    pub platform_fee: u64,
    /// Distinct bettors.
    pub player_count: u32,
    pub guess_count: u32,
    /// Fixed when settlement is requested.
    pub max_winners: u8,
    pub settled: bool,
    pub has_exact_match: bool,
    /// Zero until settlement is requested.
    pub decryption_requested_at: u64,
    pub winners: Vec<PublicKey>,
    /// Parallel to `winners`.
    pub payouts: Vec<u64>,
    /// Retired by the operator without decryption.
    pub skipped: bool,
}

impl Round {
    pub fn new(id: u64, start_time: u64, secret: Handle) -> Self {
        Self {
            id,
            start_time,
            end_time: 0,
            secret,
            revealed_secret: None,
            total_pool: 0,
            platform_fee: 0,
            player_count: 0,
            guess_count: 0,
            max_winners: 0,
            settled: false,
            has_exact_match: false,
            decryption_requested_at: 0,
            winners: Vec::new(),
            payouts: Vec::new(),
            skipped: false,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.end_time == 0
    }

    pub fn decryption_requested(&self) -> bool {
        self.decryption_requested_at != 0
    }

    /// Pool left for winners after the platform fee.
    pub fn prize_pool(&self) -> u64 {
        self.total_pool.saturating_sub(self.platform_fee)
    }
}

impl Write for Round {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.start_time.write(writer);
        self.end_time.write(writer);
        self.secret.write(writer);
        self.revealed_secret.write(writer);
        self.total_pool.write(writer);
        self.platform_fee.write(writer);
        self.player_count.write(writer);
        self.guess_count.write(writer);
        self.max_winners.write(writer);
        self.settled.write(writer);
        self.has_exact_match.write(writer);
        self.decryption_requested_at.write(writer);
        self.winners.write(writer);
        self.payouts.write(writer);
        self.skipped.write(writer);
    }
}

impl Read for Round {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let id = u64::read(reader)?;
        let start_time = u64::read(reader)?;
        let end_time = u64::read(reader)?;
        let secret = Handle::read(reader)?;
        let revealed_secret = Option::<u64>::read(reader)?;
        let total_pool = u64::read(reader)?;
        let platform_fee = u64::read(reader)?;
        let player_count = u32::read(reader)?;
        let guess_count = u32::read(reader)?;
        let max_winners = u8::read(reader)?;
        let settled = bool::read(reader)?;
        let has_exact_match = bool::read(reader)?;
        let decryption_requested_at = u64::read(reader)?;
        let winners = Vec::<PublicKey>::read_range(reader, 0..=MAX_WINNERS)?;
        let payouts = Vec::<u64>::read_range(reader, 0..=MAX_WINNERS)?;
        if winners.len() != payouts.len() {
            return Err(Error::Invalid("Round", "winners and payouts differ in length"));
        }
        let skipped = bool::read(reader)?;

        Ok(Self {
            id,
            start_time,
            end_time,
            secret,
            revealed_secret,
            total_pool,
            platform_fee,
            player_count,
            guess_count,
            max_winners,
            settled,
            has_exact_match,
            decryption_requested_at,
            winners,
            payouts,
            skipped,
        })
    }
}

impl EncodeSize for Round {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.start_time.encode_size()
            + self.end_time.encode_size()
            + self.secret.encode_size()
            + self.revealed_secret.encode_size()
            + self.total_pool.encode_size()
            + self.platform_fee.encode_size()
            + self.player_count.encode_size()
            + self.guess_count.encode_size()
            + self.max_winners.encode_size()
            + self.settled.encode_size()
            + self.has_exact_match.encode_size()
            + self.decryption_requested_at.encode_size()
            + self.winners.encode_size()
            + self.payouts.encode_size()
            + self.skipped.encode_size()
    }
}

/// One admitted guess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guess {
    pub bettor: PublicKey,
    /// Clamped confidential guess.
    pub value: Handle,
    /// Confidential `|value - secret|`, computed when settlement is requested.
    pub distance: Option<Handle>,
    /// Position in admission order within the round.
    pub submission_order: u32,
    pub is_winner: bool,
    pub revealed_value: Option<u64>,
}

impl Write for Guess {
    fn write(&self, writer: &mut impl BufMut) {
        self.bettor.write(writer);
        self.value.write(writer);
        self.distance.write(writer);
        self.submission_order.write(writer);
        self.is_winner.write(writer);
        self.revealed_value.write(writer);
    }
}

impl Read for Guess {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            bettor: PublicKey::read(reader)?,
            value: Handle::read(reader)?,
            distance: Option::<Handle>::read(reader)?,
            submission_order: u32::read(reader)?,
            is_winner: bool::read(reader)?,
            revealed_value: Option::<u64>::read(reader)?,
        })
    }
}

impl EncodeSize for Guess {
    fn encode_size(&self) -> usize {
        self.bettor.encode_size()
            + self.value.encode_size()
            + self.distance.encode_size()
            + self.submission_order.encode_size()
            + self.is_winner.encode_size()
            + self.revealed_value.encode_size()
    }
}
