//! Confidential value port.
//!
//! The lottery never sees plaintext guesses or the round secret. It drives an external
//! confidential-computation engine through [`ConfidentialValueStore`], receiving opaque
//! [`Handle`]s, and only accepts cleartexts together with a proof from the decryption authority.

use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::union;
use sealdraw_types::{
    lottery::{Handle, Principal},
    NAMESPACE,
};

#[cfg(any(test, feature = "mocks"))]
mod plaintext;
#[cfg(any(test, feature = "mocks"))]
pub use plaintext::{PlaintextEngine, Reveal};
#[cfg(any(test, feature = "mocks"))]
pub(crate) use plaintext::input_tag;

const INPUT_SUFFIX: &[u8] = b"_INPUT";
const REVEAL_SUFFIX: &[u8] = b"_REVEAL";

/// Context input proofs are bound to.
pub fn input_namespace() -> Vec<u8> {
    union(NAMESPACE, INPUT_SUFFIX)
}

/// Namespace the decryption authority signs reveals under.
pub fn reveal_namespace() -> Vec<u8> {
    union(NAMESPACE, REVEAL_SUFFIX)
}

/// Cleartext bytes for a reveal: each value as 8 big-endian bytes, in handle order.
pub fn encode_cleartexts(values: &[u64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfidentialError {
    #[error("input proof does not bind ciphertext to submitter")]
    InvalidProof,
    #[error("unknown handle {0}")]
    UnknownHandle(Handle),
    #[error("random bound {0} is not a power of two")]
    InvalidBound(u64),
    #[error("handle {0} is not publicly revealable")]
    NotRevealable(Handle),
    #[error("expected {expected} cleartext bytes, got {got}")]
    MalformedCleartexts { expected: usize, got: usize },
    #[error("reveal proof rejected")]
    InvalidRevealProof,
}

/// Operations on opaque confidential values.
///
/// Every operation producing a value returns a fresh handle; no operation branches on, or
/// exposes, plaintext.
pub trait ConfidentialValueStore {
    /// Admit a ciphertext whose `proof` binds it to `submitter` and this lottery.
    fn encrypt_from_proof(
        &mut self,
        ciphertext: &[u8],
        proof: &[u8],
        submitter: &PublicKey,
    ) -> Result<Handle, ConfidentialError>;

    /// Trivially encrypt a public constant.
    fn constant(&mut self, value: u64) -> Handle;

    /// `value <= max ? value : 0`.
    fn clamp_to_range(&mut self, value: &Handle, max: u64) -> Result<Handle, ConfidentialError>;

    fn add(&mut self, a: &Handle, b: &Handle) -> Result<Handle, ConfidentialError>;
    fn sub(&mut self, a: &Handle, b: &Handle) -> Result<Handle, ConfidentialError>;

    /// Encrypted boolean `a > b`.
    fn gt(&mut self, a: &Handle, b: &Handle) -> Result<Handle, ConfidentialError>;

    /// `cond ? a : b`.
    fn select(
        &mut self,
        cond: &Handle,
        a: &Handle,
        b: &Handle,
    ) -> Result<Handle, ConfidentialError>;

    /// Uniform value in `[0, bound)`; `bound` must be a power of two.
    fn random_bounded(&mut self, bound: u64) -> Result<Handle, ConfidentialError>;

    fn grant_access(
        &mut self,
        handle: &Handle,
        principal: Principal,
    ) -> Result<(), ConfidentialError>;

    fn has_access(&self, handle: &Handle, principal: &Principal) -> bool;

    /// Irreversibly allow anyone to obtain the cleartext (with proof) off-chain.
    fn mark_publicly_revealable(&mut self, handle: &Handle) -> Result<(), ConfidentialError>;

    fn is_publicly_revealable(&self, handle: &Handle) -> bool;

    /// Check that `cleartexts` opens `handles`, in exactly this order, under `proof`.
    fn verify_reveal(
        &self,
        handles: &[Handle],
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<(), ConfidentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_cleartexts_is_big_endian() {
        assert_eq!(
            encode_cleartexts(&[1, 256]),
            vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0]
        );
        assert!(encode_cleartexts(&[]).is_empty());
    }

    #[test]
    fn test_namespaces_differ() {
        assert_ne!(input_namespace(), reveal_namespace());
    }
}
