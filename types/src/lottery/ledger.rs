use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{constants::MAX_GUESSES_PER_PLAYER_LIMIT, LotteryConfig};

/// Per-round, per-bettor bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contribution {
    /// Net amount paid in (overpayment already returned).
    pub amount: u64,
    /// Indices of this bettor's guesses in the round.
    pub guesses: Vec<u32>,
    pub refund_claimed: bool,
    /// Owed after a failed transfer; claimable with `ClaimPendingPayout`.
    pub pending_payout: u64,
}

impl Contribution {
    pub fn is_player(&self) -> bool {
        !self.guesses.is_empty()
    }
}

impl Write for Contribution {
    fn write(&self, writer: &mut impl BufMut) {
        self.amount.write(writer);
        self.guesses.write(writer);
        self.refund_claimed.write(writer);
        self.pending_payout.write(writer);
    }
}

impl Read for Contribution {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            amount: u64::read(reader)?,
            guesses: Vec::<u32>::read_range(
                reader,
                0..=MAX_GUESSES_PER_PLAYER_LIMIT as usize,
            )?,
            refund_claimed: bool::read(reader)?,
            pending_payout: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Contribution {
    fn encode_size(&self) -> usize {
        self.amount.encode_size()
            + self.guesses.encode_size()
            + self.refund_claimed.encode_size()
            + self.pending_payout.encode_size()
    }
}

/// Singleton lottery record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LotteryState {
    pub config: LotteryConfig,
    pub owner: PublicKey,
    /// Proposed owner awaiting acceptance.
    pub pending_owner: Option<PublicKey>,
    pub fee_wallet: PublicKey,
    pub current_round: u64,
    /// Funds held by the lottery.
    pub balance: u64,
}

impl Write for LotteryState {
    fn write(&self, writer: &mut impl BufMut) {
        self.config.write(writer);
        self.owner.write(writer);
        self.pending_owner.write(writer);
        self.fee_wallet.write(writer);
        self.current_round.write(writer);
        self.balance.write(writer);
    }
}

impl Read for LotteryState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            config: LotteryConfig::read(reader)?,
            owner: PublicKey::read(reader)?,
            pending_owner: Option::<PublicKey>::read(reader)?,
            fee_wallet: PublicKey::read(reader)?,
            current_round: u64::read(reader)?,
            balance: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LotteryState {
    fn encode_size(&self) -> usize {
        self.config.encode_size()
            + self.owner.encode_size()
            + self.pending_owner.encode_size()
            + self.fee_wallet.encode_size()
            + self.current_round.encode_size()
            + self.balance.encode_size()
    }
}
