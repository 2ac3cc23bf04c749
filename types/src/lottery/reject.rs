use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::constants::*;

/// Broad class of a rejected call.
///
/// Every rejection is side-effect free; the category tells the caller whether retrying can help
/// (state errors clear once the precondition holds, verification and transfer errors need a
/// corrected proof or a working recipient).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Input,
    State,
    Authorization,
    Verification,
    Transfer,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::State => "state",
            Self::Authorization => "authorization",
            Self::Verification => "verification",
            Self::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// Reason a transaction was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    // Input
    #[error("payment {provided} below required {required}")]
    InsufficientPayment { required: u64, provided: u64 },
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: u32, got: u32 },
    #[error("batch size {0} outside 1..={max}", max = MAX_BATCH_SIZE)]
    InvalidBatchSize(u32),
    #[error("input proof does not bind ciphertext to submitter")]
    InvalidInputProof,
    #[error("instruction does not accept payment")]
    NonPayable,
    #[error("invalid lottery configuration")]
    InvalidConfig,

    // State
    #[error("lottery not initialized")]
    NotInitialized,
    #[error("lottery already initialized")]
    AlreadyInitialized,
    #[error("round {0} not found")]
    RoundNotFound(u64),
    #[error("round {0} no longer admits guesses")]
    RoundEnded(u64),
    #[error("round {0} is full")]
    RoundFull(u64),
    #[error("guess limit reached in round {0}")]
    GuessLimit(u64),
    #[error("round {0} has not ended")]
    RoundNotEnded(u64),
    #[error("round {0} has no guesses")]
    NoGuesses(u64),
    #[error("decryption already requested for round {0}")]
    AlreadyRequested(u64),
    #[error("decryption not requested for round {0}")]
    NotRequested(u64),
    #[error("round {round_id} cannot finalize before {ready_at}")]
    FinalityPending { round_id: u64, ready_at: u64 },
    #[error("round {0} already settled")]
    AlreadySettled(u64),
    #[error("round {0} not settled")]
    NotSettled(u64),
    #[error("round {0} had winners")]
    RoundHadWinners(u64),
    #[error("nothing to refund in round {0}")]
    NothingToRefund(u64),
    #[error("refund already claimed in round {0}")]
    RefundAlreadyClaimed(u64),
    #[error("no pending payout in round {0}")]
    NothingPending(u64),
    #[error("round {0} is still active")]
    RoundStillActive(u64),
    #[error("decryption pending for round {0}")]
    DecryptionPending(u64),
    #[error("withdrawal of {requested} exceeds available {available}")]
    InsufficientWithdrawable { requested: u64, available: u64 },

    // Authorization
    #[error("caller is not the owner")]
    Unauthorized,
    #[error("caller is not the pending owner")]
    NotPendingOwner,

    // Verification
    #[error("decryption proof rejected for round {0}")]
    InvalidDecryptionProof(u64),

    // Transfer
    #[error("outbound transfer failed")]
    TransferFailed,
}

impl RejectReason {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InsufficientPayment { .. }
            | Self::LengthMismatch { .. }
            | Self::InvalidBatchSize(_)
            | Self::InvalidInputProof
            | Self::NonPayable
            | Self::InvalidConfig => ErrorCategory::Input,
            Self::Unauthorized | Self::NotPendingOwner => ErrorCategory::Authorization,
            Self::InvalidDecryptionProof(_) => ErrorCategory::Verification,
            Self::TransferFailed => ErrorCategory::Transfer,
            _ => ErrorCategory::State,
        }
    }

    /// Stable numeric code (also the wire tag).
    pub fn code(&self) -> u8 {
        match self {
            Self::InsufficientPayment { .. } => ERROR_INSUFFICIENT_PAYMENT,
            Self::LengthMismatch { .. } => ERROR_LENGTH_MISMATCH,
            Self::InvalidBatchSize(_) => ERROR_INVALID_BATCH_SIZE,
            Self::InvalidInputProof => ERROR_INVALID_INPUT_PROOF,
            Self::NonPayable => ERROR_NON_PAYABLE,
            Self::InvalidConfig => ERROR_INVALID_CONFIG,
            Self::NotInitialized => ERROR_NOT_INITIALIZED,
            Self::AlreadyInitialized => ERROR_ALREADY_INITIALIZED,
            Self::RoundNotFound(_) => ERROR_ROUND_NOT_FOUND,
            Self::RoundEnded(_) => ERROR_ROUND_ENDED,
            Self::RoundFull(_) => ERROR_ROUND_FULL,
            Self::GuessLimit(_) => ERROR_GUESS_LIMIT,
            Self::RoundNotEnded(_) => ERROR_ROUND_NOT_ENDED,
            Self::NoGuesses(_) => ERROR_NO_GUESSES,
            Self::AlreadyRequested(_) => ERROR_ALREADY_REQUESTED,
            Self::NotRequested(_) => ERROR_NOT_REQUESTED,
            Self::FinalityPending { .. } => ERROR_FINALITY_PENDING,
            Self::AlreadySettled(_) => ERROR_ALREADY_SETTLED,
            Self::NotSettled(_) => ERROR_NOT_SETTLED,
            Self::RoundHadWinners(_) => ERROR_ROUND_HAD_WINNERS,
            Self::NothingToRefund(_) => ERROR_NOTHING_TO_REFUND,
            Self::RefundAlreadyClaimed(_) => ERROR_REFUND_ALREADY_CLAIMED,
            Self::NothingPending(_) => ERROR_NOTHING_PENDING,
            Self::RoundStillActive(_) => ERROR_ROUND_STILL_ACTIVE,
            Self::DecryptionPending(_) => ERROR_DECRYPTION_PENDING,
            Self::InsufficientWithdrawable { .. } => ERROR_INSUFFICIENT_WITHDRAWABLE,
            Self::Unauthorized => ERROR_UNAUTHORIZED,
            Self::NotPendingOwner => ERROR_NOT_PENDING_OWNER,
            Self::InvalidDecryptionProof(_) => ERROR_INVALID_DECRYPTION_PROOF,
            Self::TransferFailed => ERROR_TRANSFER_FAILED,
        }
    }

    fn round_id(&self) -> Option<u64> {
        match self {
            Self::RoundNotFound(id)
            | Self::RoundEnded(id)
            | Self::RoundFull(id)
            | Self::GuessLimit(id)
            | Self::RoundNotEnded(id)
            | Self::NoGuesses(id)
            | Self::AlreadyRequested(id)
            | Self::NotRequested(id)
            | Self::AlreadySettled(id)
            | Self::NotSettled(id)
            | Self::RoundHadWinners(id)
            | Self::NothingToRefund(id)
            | Self::RefundAlreadyClaimed(id)
            | Self::NothingPending(id)
            | Self::RoundStillActive(id)
            | Self::DecryptionPending(id)
            | Self::InvalidDecryptionProof(id) => Some(*id),
            _ => None,
        }
    }
}

impl Write for RejectReason {
    fn write(&self, writer: &mut impl BufMut) {
        self.code().write(writer);
        match self {
            Self::InsufficientPayment { required, provided } => {
                required.write(writer);
                provided.write(writer);
            }
            Self::LengthMismatch { expected, got } => {
                expected.write(writer);
                got.write(writer);
            }
            Self::InvalidBatchSize(size) => size.write(writer),
            Self::FinalityPending { round_id, ready_at } => {
                round_id.write(writer);
                ready_at.write(writer);
            }
            Self::InsufficientWithdrawable {
                requested,
                available,
            } => {
                requested.write(writer);
                available.write(writer);
            }
            other => {
                if let Some(id) = other.round_id() {
                    id.write(writer);
                }
            }
        }
    }
}

impl Read for RejectReason {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let reason = match u8::read(reader)? {
            ERROR_INSUFFICIENT_PAYMENT => Self::InsufficientPayment {
                required: u64::read(reader)?,
                provided: u64::read(reader)?,
            },
            ERROR_LENGTH_MISMATCH => Self::LengthMismatch {
                expected: u32::read(reader)?,
                got: u32::read(reader)?,
            },
            ERROR_INVALID_BATCH_SIZE => Self::InvalidBatchSize(u32::read(reader)?),
            ERROR_INVALID_INPUT_PROOF => Self::InvalidInputProof,
            ERROR_NON_PAYABLE => Self::NonPayable,
            ERROR_INVALID_CONFIG => Self::InvalidConfig,
            ERROR_NOT_INITIALIZED => Self::NotInitialized,
            ERROR_ALREADY_INITIALIZED => Self::AlreadyInitialized,
            ERROR_ROUND_NOT_FOUND => Self::RoundNotFound(u64::read(reader)?),
            ERROR_ROUND_ENDED => Self::RoundEnded(u64::read(reader)?),
            ERROR_ROUND_FULL => Self::RoundFull(u64::read(reader)?),
            ERROR_GUESS_LIMIT => Self::GuessLimit(u64::read(reader)?),
            ERROR_ROUND_NOT_ENDED => Self::RoundNotEnded(u64::read(reader)?),
            ERROR_NO_GUESSES => Self::NoGuesses(u64::read(reader)?),
            ERROR_ALREADY_REQUESTED => Self::AlreadyRequested(u64::read(reader)?),
            ERROR_NOT_REQUESTED => Self::NotRequested(u64::read(reader)?),
            ERROR_FINALITY_PENDING => Self::FinalityPending {
                round_id: u64::read(reader)?,
                ready_at: u64::read(reader)?,
            },
            ERROR_ALREADY_SETTLED => Self::AlreadySettled(u64::read(reader)?),
            ERROR_NOT_SETTLED => Self::NotSettled(u64::read(reader)?),
            ERROR_ROUND_HAD_WINNERS => Self::RoundHadWinners(u64::read(reader)?),
            ERROR_NOTHING_TO_REFUND => Self::NothingToRefund(u64::read(reader)?),
            ERROR_REFUND_ALREADY_CLAIMED => Self::RefundAlreadyClaimed(u64::read(reader)?),
            ERROR_NOTHING_PENDING => Self::NothingPending(u64::read(reader)?),
            ERROR_ROUND_STILL_ACTIVE => Self::RoundStillActive(u64::read(reader)?),
            ERROR_DECRYPTION_PENDING => Self::DecryptionPending(u64::read(reader)?),
            ERROR_INSUFFICIENT_WITHDRAWABLE => Self::InsufficientWithdrawable {
                requested: u64::read(reader)?,
                available: u64::read(reader)?,
            },
            ERROR_UNAUTHORIZED => Self::Unauthorized,
            ERROR_NOT_PENDING_OWNER => Self::NotPendingOwner,
            ERROR_INVALID_DECRYPTION_PROOF => Self::InvalidDecryptionProof(u64::read(reader)?),
            ERROR_TRANSFER_FAILED => Self::TransferFailed,
            i => return Err(Error::InvalidEnum(i)),
        };
        Ok(reason)
    }
}

impl EncodeSize for RejectReason {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::InsufficientPayment { .. }
            | Self::FinalityPending { .. }
            | Self::InsufficientWithdrawable { .. } => 16,
            Self::LengthMismatch { .. } => 8,
            Self::InvalidBatchSize(_) => 4,
            other => {
                if other.round_id().is_some() {
                    8
                } else {
                    0
                }
            }
        }
    }
}
