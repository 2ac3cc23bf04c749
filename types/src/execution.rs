use bytes::{Buf, BufMut};
use commonware_codec::{
    EncodeSize, Error, FixedSize, RangeCfg, Read, ReadExt, ReadRangeExt, Write,
};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    Signer, Verifier,
};
use commonware_utils::union;

use crate::lottery::{
    Contribution, Guess, Handle, LotteryConfig, LotteryState, RejectReason, Round,
    MAX_BATCH_SIZE, MAX_CIPHERTEXT_LENGTH, MAX_PROOF_LENGTH, MAX_ROUND_GUESSES, MAX_WINNERS,
};

pub const NAMESPACE: &[u8] = b"_SEALDRAW";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

/// A signed call into the lottery. `value` is the payment attached to the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub value: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, value: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        value.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        Self::sign_with_value(private, nonce, 0, instruction)
    }

    pub fn sign_with_value(
        private: &ed25519::PrivateKey,
        nonce: u64,
        value: u64,
        instruction: Instruction,
    ) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &value, &instruction),
        );

        Self {
            nonce,
            value,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.value, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.value.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let value = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            value,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.value.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Create the lottery: the signer becomes owner and round 1 opens.
    /// Binary: [0] [config] [feeWallet:32]
    Initialize {
        config: LotteryConfig,
        fee_wallet: PublicKey,
    },

    /// Submit one confidential guess. Payable.
    /// Binary: [1] [ciphertext:vec] [proof:vec]
    SubmitGuess { ciphertext: Vec<u8>, proof: Vec<u8> },

    /// Submit a batch of confidential guesses. Payable.
    /// Binary: [2] [ciphertexts:vec<vec>] [proofs:vec<vec>]
    SubmitGuesses {
        ciphertexts: Vec<Vec<u8>>,
        proofs: Vec<Vec<u8>>,
    },

    /// Binary: [3] [roundId:u64 BE]
    RequestSettlement { round_id: u64 },

    /// Finalize with the oracle's cleartexts for `[secret, d0, ..]` and its proof.
    /// Binary: [4] [roundId:u64 BE] [secret:u64 BE] [distances:vec<u64>] [proof:vec]
    FinalizeSettlement {
        round_id: u64,
        secret: u64,
        distances: Vec<u64>,
        proof: Vec<u8>,
    },

    /// Binary: [5] [roundId:u64 BE]
    ClaimRefund { round_id: u64 },

    /// Binary: [6] [roundId:u64 BE]
    ClaimPendingPayout { round_id: u64 },

    // Admin instructions (tags 7-12)
    /// Binary: [7] [candidate:32]
    ProposeOwner { candidate: PublicKey },

    /// Binary: [8]
    AcceptOwnership,

    /// Binary: [9] [wallet:32]
    SetFeeWallet { wallet: PublicKey },

    /// Binary: [10] [to:32] [amount:u64 BE]
    EmergencyWithdraw { to: PublicKey, amount: u64 },

    /// Binary: [11]
    SkipStuckRound,

    /// Binary: [12]
    ForceNewRound,
}

impl Instruction {
    /// Whether the instruction may carry a payment.
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::SubmitGuess { .. } | Self::SubmitGuesses { .. })
    }
}

fn read_bytes(reader: &mut impl Buf, max: usize) -> Result<Vec<u8>, Error> {
    Vec::<u8>::read_range(reader, 0..=max)
}

fn read_byte_batch(reader: &mut impl Buf, max: usize) -> Result<Vec<Vec<u8>>, Error> {
    Vec::<Vec<u8>>::read_cfg(
        reader,
        &(
            RangeCfg::from(0..=MAX_BATCH_SIZE),
            (RangeCfg::from(0..=max), ()),
        ),
    )
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Initialize { config, fee_wallet } => {
                0u8.write(writer);
                config.write(writer);
                fee_wallet.write(writer);
            }
            Self::SubmitGuess { ciphertext, proof } => {
                1u8.write(writer);
                ciphertext.write(writer);
                proof.write(writer);
            }
            Self::SubmitGuesses {
                ciphertexts,
                proofs,
            } => {
                2u8.write(writer);
                ciphertexts.write(writer);
                proofs.write(writer);
            }
            Self::RequestSettlement { round_id } => {
                3u8.write(writer);
                round_id.write(writer);
            }
            Self::FinalizeSettlement {
                round_id,
                secret,
                distances,
                proof,
            } => {
                4u8.write(writer);
                round_id.write(writer);
                secret.write(writer);
                distances.write(writer);
                proof.write(writer);
            }
            Self::ClaimRefund { round_id } => {
                5u8.write(writer);
                round_id.write(writer);
            }
            Self::ClaimPendingPayout { round_id } => {
                6u8.write(writer);
                round_id.write(writer);
            }
            Self::ProposeOwner { candidate } => {
                7u8.write(writer);
                candidate.write(writer);
            }
            Self::AcceptOwnership => 8u8.write(writer),
            Self::SetFeeWallet { wallet } => {
                9u8.write(writer);
                wallet.write(writer);
            }
            Self::EmergencyWithdraw { to, amount } => {
                10u8.write(writer);
                to.write(writer);
                amount.write(writer);
            }
            Self::SkipStuckRound => 11u8.write(writer),
            Self::ForceNewRound => 12u8.write(writer),
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::Initialize {
                config: LotteryConfig::read(reader)?,
                fee_wallet: PublicKey::read(reader)?,
            },
            1 => Self::SubmitGuess {
                ciphertext: read_bytes(reader, MAX_CIPHERTEXT_LENGTH)?,
                proof: read_bytes(reader, MAX_PROOF_LENGTH)?,
            },
            2 => Self::SubmitGuesses {
                ciphertexts: read_byte_batch(reader, MAX_CIPHERTEXT_LENGTH)?,
                proofs: read_byte_batch(reader, MAX_PROOF_LENGTH)?,
            },
            3 => Self::RequestSettlement {
                round_id: u64::read(reader)?,
            },
            4 => Self::FinalizeSettlement {
                round_id: u64::read(reader)?,
                secret: u64::read(reader)?,
                distances: Vec::<u64>::read_range(reader, 0..=MAX_ROUND_GUESSES)?,
                proof: read_bytes(reader, MAX_PROOF_LENGTH)?,
            },
            5 => Self::ClaimRefund {
                round_id: u64::read(reader)?,
            },
            6 => Self::ClaimPendingPayout {
                round_id: u64::read(reader)?,
            },
            7 => Self::ProposeOwner {
                candidate: PublicKey::read(reader)?,
            },
            8 => Self::AcceptOwnership,
            9 => Self::SetFeeWallet {
                wallet: PublicKey::read(reader)?,
            },
            10 => Self::EmergencyWithdraw {
                to: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            11 => Self::SkipStuckRound,
            12 => Self::ForceNewRound,
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Initialize { config, fee_wallet } => {
                    config.encode_size() + fee_wallet.encode_size()
                }
                Self::SubmitGuess { ciphertext, proof } => {
                    ciphertext.encode_size() + proof.encode_size()
                }
                Self::SubmitGuesses {
                    ciphertexts,
                    proofs,
                } => ciphertexts.encode_size() + proofs.encode_size(),
                Self::RequestSettlement { round_id }
                | Self::ClaimRefund { round_id }
                | Self::ClaimPendingPayout { round_id } => round_id.encode_size(),
                Self::FinalizeSettlement {
                    round_id,
                    secret,
                    distances,
                    proof,
                } => {
                    round_id.encode_size()
                        + secret.encode_size()
                        + distances.encode_size()
                        + proof.encode_size()
                }
                Self::ProposeOwner { candidate } => candidate.encode_size(),
                Self::SetFeeWallet { wallet } => wallet.encode_size(),
                Self::EmergencyWithdraw { to, amount } => to.encode_size() + amount.encode_size(),
                Self::AcceptOwnership | Self::SkipStuckRound | Self::ForceNewRound => 0,
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),

    // Lottery keys (tags 1-4)
    Lottery,
    Round(u64),
    Guess { round: u64, index: u32 },
    Contribution { round: u64, bettor: PublicKey },
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Lottery => 1u8.write(writer),
            Self::Round(id) => {
                2u8.write(writer);
                id.write(writer);
            }
            Self::Guess { round, index } => {
                3u8.write(writer);
                round.write(writer);
                index.write(writer);
            }
            Self::Contribution { round, bettor } => {
                4u8.write(writer);
                round.write(writer);
                bettor.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Lottery,
            2 => Self::Round(u64::read(reader)?),
            3 => Self::Guess {
                round: u64::read(reader)?,
                index: u32::read(reader)?,
            },
            4 => Self::Contribution {
                round: u64::read(reader)?,
                bettor: PublicKey::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,
                Self::Lottery => 0,
                Self::Round(_) => u64::SIZE,
                Self::Guess { .. } => u64::SIZE + u32::SIZE,
                Self::Contribution { .. } => u64::SIZE + PublicKey::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    /// Account for nonce tracking (tag 0)
    Account(Account),

    // Lottery values (tags 1-4)
    Lottery(LotteryState),
    Round(Round),
    Guess(Guess),
    Contribution(Contribution),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Lottery(lottery) => {
                1u8.write(writer);
                lottery.write(writer);
            }
            Self::Round(round) => {
                2u8.write(writer);
                round.write(writer);
            }
            Self::Guess(guess) => {
                3u8.write(writer);
                guess.write(writer);
            }
            Self::Contribution(contribution) => {
                4u8.write(writer);
                contribution.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Lottery(LotteryState::read(reader)?),
            2 => Self::Round(Round::read(reader)?),
            3 => Self::Guess(Guess::read(reader)?),
            4 => Self::Contribution(Contribution::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Lottery(lottery) => lottery.encode_size(),
                Self::Round(round) => round.encode_size(),
                Self::Guess(guess) => guess.encode_size(),
                Self::Contribution(contribution) => contribution.encode_size(),
            }
    }
}

/// Notifications emitted by the lottery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Round lifecycle (tags 0-5)
    RoundStarted {
        round_id: u64,
        start_time: u64,
    },
    RoundTimerStarted {
        round_id: u64,
        end_time: u64,
    },
    GuessSubmitted {
        round_id: u64,
        bettor: PublicKey,
        index: u32,
    },
    /// `handles` is the exact order the decryption proof must cover: `[secret, d0, ..]`.
    DecryptionRequested {
        round_id: u64,
        handles: Vec<Handle>,
        platform_fee: u64,
        max_winners: u8,
    },
    RoundSettled {
        round_id: u64,
        has_exact_match: bool,
        secret: u64,
        winners: Vec<PublicKey>,
        payouts: Vec<u64>,
    },
    RoundSkipped {
        round_id: u64,
        total_pool: u64,
        platform_fee: u64,
    },

    // Ledger (tags 10-13)
    RefundClaimed {
        round_id: u64,
        bettor: PublicKey,
        amount: u64,
    },
    FeeCollected {
        round_id: u64,
        wallet: PublicKey,
        amount: u64,
    },
    PayoutFailed {
        round_id: u64,
        recipient: PublicKey,
        amount: u64,
    },
    PendingPayoutClaimed {
        round_id: u64,
        recipient: PublicKey,
        amount: u64,
    },

    // Admin (tags 20-23)
    OwnershipTransferProposed {
        owner: PublicKey,
        candidate: PublicKey,
    },
    OwnershipTransferred {
        previous: PublicKey,
        owner: PublicKey,
    },
    FeeWalletUpdated {
        previous: PublicKey,
        wallet: PublicKey,
    },
    EmergencyWithdrawal {
        to: PublicKey,
        amount: u64,
    },

    // Error event (tag 29)
    Rejected {
        account: PublicKey,
        reason: RejectReason,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::RoundStarted {
                round_id,
                start_time,
            } => {
                0u8.write(writer);
                round_id.write(writer);
                start_time.write(writer);
            }
            Self::RoundTimerStarted { round_id, end_time } => {
                1u8.write(writer);
                round_id.write(writer);
                end_time.write(writer);
            }
            Self::GuessSubmitted {
                round_id,
                bettor,
                index,
            } => {
                2u8.write(writer);
                round_id.write(writer);
                bettor.write(writer);
                index.write(writer);
            }
            Self::DecryptionRequested {
                round_id,
                handles,
                platform_fee,
                max_winners,
            } => {
                3u8.write(writer);
                round_id.write(writer);
                handles.write(writer);
                platform_fee.write(writer);
                max_winners.write(writer);
            }
            Self::RoundSettled {
                round_id,
                has_exact_match,
                secret,
                winners,
                payouts,
            } => {
                4u8.write(writer);
                round_id.write(writer);
                has_exact_match.write(writer);
                secret.write(writer);
                winners.write(writer);
                payouts.write(writer);
            }
            Self::RoundSkipped {
                round_id,
                total_pool,
                platform_fee,
            } => {
                5u8.write(writer);
                round_id.write(writer);
                total_pool.write(writer);
                platform_fee.write(writer);
            }
            Self::RefundClaimed {
                round_id,
                bettor,
                amount,
            } => {
                10u8.write(writer);
                round_id.write(writer);
                bettor.write(writer);
                amount.write(writer);
            }
            Self::FeeCollected {
                round_id,
                wallet,
                amount,
            } => {
                11u8.write(writer);
                round_id.write(writer);
                wallet.write(writer);
                amount.write(writer);
            }
            Self::PayoutFailed {
                round_id,
                recipient,
                amount,
            } => {
                12u8.write(writer);
                round_id.write(writer);
                recipient.write(writer);
                amount.write(writer);
            }
            Self::PendingPayoutClaimed {
                round_id,
                recipient,
                amount,
            } => {
                13u8.write(writer);
                round_id.write(writer);
                recipient.write(writer);
                amount.write(writer);
            }
            Self::OwnershipTransferProposed { owner, candidate } => {
                20u8.write(writer);
                owner.write(writer);
                candidate.write(writer);
            }
            Self::OwnershipTransferred { previous, owner } => {
                21u8.write(writer);
                previous.write(writer);
                owner.write(writer);
            }
            Self::FeeWalletUpdated { previous, wallet } => {
                22u8.write(writer);
                previous.write(writer);
                wallet.write(writer);
            }
            Self::EmergencyWithdrawal { to, amount } => {
                23u8.write(writer);
                to.write(writer);
                amount.write(writer);
            }
            Self::Rejected { account, reason } => {
                29u8.write(writer);
                account.write(writer);
                reason.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::RoundStarted {
                round_id: u64::read(reader)?,
                start_time: u64::read(reader)?,
            },
            1 => Self::RoundTimerStarted {
                round_id: u64::read(reader)?,
                end_time: u64::read(reader)?,
            },
            2 => Self::GuessSubmitted {
                round_id: u64::read(reader)?,
                bettor: PublicKey::read(reader)?,
                index: u32::read(reader)?,
            },
            3 => Self::DecryptionRequested {
                round_id: u64::read(reader)?,
                handles: Vec::<Handle>::read_range(reader, 1..=MAX_ROUND_GUESSES + 1)?,
                platform_fee: u64::read(reader)?,
                max_winners: u8::read(reader)?,
            },
            4 => {
                let round_id = u64::read(reader)?;
                let has_exact_match = bool::read(reader)?;
                let secret = u64::read(reader)?;
                let winners = Vec::<PublicKey>::read_range(reader, 0..=MAX_WINNERS)?;
                let payouts = Vec::<u64>::read_range(reader, 0..=MAX_WINNERS)?;
                if winners.len() != payouts.len() {
                    return Err(Error::Invalid("Event", "winners and payouts differ in length"));
                }
                Self::RoundSettled {
                    round_id,
                    has_exact_match,
                    secret,
                    winners,
                    payouts,
                }
            }
            5 => Self::RoundSkipped {
                round_id: u64::read(reader)?,
                total_pool: u64::read(reader)?,
                platform_fee: u64::read(reader)?,
            },
            10 => Self::RefundClaimed {
                round_id: u64::read(reader)?,
                bettor: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            11 => Self::FeeCollected {
                round_id: u64::read(reader)?,
                wallet: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            12 => Self::PayoutFailed {
                round_id: u64::read(reader)?,
                recipient: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            13 => Self::PendingPayoutClaimed {
                round_id: u64::read(reader)?,
                recipient: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            20 => Self::OwnershipTransferProposed {
                owner: PublicKey::read(reader)?,
                candidate: PublicKey::read(reader)?,
            },
            21 => Self::OwnershipTransferred {
                previous: PublicKey::read(reader)?,
                owner: PublicKey::read(reader)?,
            },
            22 => Self::FeeWalletUpdated {
                previous: PublicKey::read(reader)?,
                wallet: PublicKey::read(reader)?,
            },
            23 => Self::EmergencyWithdrawal {
                to: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            29 => Self::Rejected {
                account: PublicKey::read(reader)?,
                reason: RejectReason::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::RoundStarted { .. } | Self::RoundTimerStarted { .. } => u64::SIZE * 2,
                Self::GuessSubmitted { .. } => u64::SIZE + PublicKey::SIZE + u32::SIZE,
                Self::DecryptionRequested {
                    round_id,
                    handles,
                    platform_fee,
                    max_winners,
                } => {
                    round_id.encode_size()
                        + handles.encode_size()
                        + platform_fee.encode_size()
                        + max_winners.encode_size()
                }
                Self::RoundSettled {
                    round_id,
                    has_exact_match,
                    secret,
                    winners,
                    payouts,
                } => {
                    round_id.encode_size()
                        + has_exact_match.encode_size()
                        + secret.encode_size()
                        + winners.encode_size()
                        + payouts.encode_size()
                }
                Self::RoundSkipped { .. } => u64::SIZE * 3,
                Self::RefundClaimed { .. }
                | Self::FeeCollected { .. }
                | Self::PayoutFailed { .. }
                | Self::PendingPayoutClaimed { .. } => u64::SIZE * 2 + PublicKey::SIZE,
                Self::OwnershipTransferProposed { .. }
                | Self::OwnershipTransferred { .. }
                | Self::FeeWalletUpdated { .. } => PublicKey::SIZE * 2,
                Self::EmergencyWithdrawal { .. } => PublicKey::SIZE + u64::SIZE,
                Self::Rejected { reason, .. } => PublicKey::SIZE + reason.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
        }
    }
}
