//! Outbound value transfers.

use commonware_cryptography::ed25519::PublicKey;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("recipient rejected transfer")]
    Rejected,
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },
}

/// Moves funds out of the lottery.
///
/// A transfer either completes or fails without effect.
pub trait Payments {
    fn transfer(&mut self, to: &PublicKey, amount: u64) -> Result<(), TransferError>;
}
