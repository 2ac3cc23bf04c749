use super::{
    encode_cleartexts, input_namespace, reveal_namespace, ConfidentialError,
    ConfidentialValueStore,
};
use commonware_codec::{DecodeExt, Encode};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey, Signature},
    sha256::{Digest, Sha256},
    Hasher, Signer, Verifier,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sealdraw_types::lottery::{Handle, Principal};
use std::collections::{HashMap, HashSet};

/// Cleartexts returned by the decryption oracle, with the authority's proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reveal {
    pub cleartexts: Vec<u64>,
    pub proof: Vec<u8>,
}

/// Tag binding a ciphertext to its submitter and the lottery.
pub(crate) fn input_tag(submitter: &PublicKey, ciphertext: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(&input_namespace());
    hasher.update(submitter.as_ref());
    hasher.update(ciphertext);
    hasher.finalize()
}

fn reveal_message(handles: &[Handle], cleartexts: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    for handle in handles {
        hasher.update(handle.as_ref());
    }
    hasher.update(cleartexts);
    hasher.finalize()
}

/// Confidential engine that computes in the clear.
///
/// Holds plaintexts behind digest handles, enforces the same input-proof and reveal-proof rules
/// as a real engine, and doubles as the decryption oracle via [`PlaintextEngine::public_decrypt`].
pub struct PlaintextEngine {
    values: HashMap<Handle, u64>,
    acl: HashSet<(Handle, Principal)>,
    revealable: HashSet<Handle>,
    counter: u64,
    rng: StdRng,
    authority: PrivateKey,
}

impl PlaintextEngine {
    pub fn new(seed: u64, authority: PrivateKey) -> Self {
        Self {
            values: HashMap::new(),
            acl: HashSet::new(),
            revealable: HashSet::new(),
            counter: 0,
            rng: StdRng::seed_from_u64(seed),
            authority,
        }
    }

    pub fn authority(&self) -> PublicKey {
        self.authority.public_key()
    }

    fn issue(&mut self, value: u64) -> Handle {
        let digest = Sha256::hash(&self.counter.to_be_bytes());
        self.counter += 1;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(digest.as_ref());
        let handle = Handle::new(bytes);
        self.values.insert(handle, value);
        handle
    }

    fn value(&self, handle: &Handle) -> Result<u64, ConfidentialError> {
        self.values
            .get(handle)
            .copied()
            .ok_or(ConfidentialError::UnknownHandle(*handle))
    }

    /// Plaintext behind a handle, for assertions in tests.
    pub fn peek(&self, handle: &Handle) -> Option<u64> {
        self.values.get(handle).copied()
    }

    /// Decrypt revealable handles, in order, and sign the result as the decryption authority.
    pub fn public_decrypt(&self, handles: &[Handle]) -> Result<Reveal, ConfidentialError> {
        let mut cleartexts = Vec::with_capacity(handles.len());
        for handle in handles {
            if !self.revealable.contains(handle) {
                return Err(ConfidentialError::NotRevealable(*handle));
            }
            cleartexts.push(self.value(handle)?);
        }
        let message = reveal_message(handles, &encode_cleartexts(&cleartexts));
        let signature = self
            .authority
            .sign(&reveal_namespace(), message.as_ref());
        Ok(Reveal {
            cleartexts,
            proof: signature.encode().to_vec(),
        })
    }
}

impl ConfidentialValueStore for PlaintextEngine {
    fn encrypt_from_proof(
        &mut self,
        ciphertext: &[u8],
        proof: &[u8],
        submitter: &PublicKey,
    ) -> Result<Handle, ConfidentialError> {
        match Digest::decode(proof) {
            Ok(tag) if tag == input_tag(submitter, ciphertext) => {}
            _ => return Err(ConfidentialError::InvalidProof),
        }
        let bytes: [u8; 8] = ciphertext
            .try_into()
            .map_err(|_| ConfidentialError::InvalidProof)?;
        Ok(self.issue(u64::from_be_bytes(bytes)))
    }

    fn constant(&mut self, value: u64) -> Handle {
        self.issue(value)
    }

    fn clamp_to_range(&mut self, value: &Handle, max: u64) -> Result<Handle, ConfidentialError> {
        let value = self.value(value)?;
        Ok(self.issue(if value <= max { value } else { 0 }))
    }

    fn add(&mut self, a: &Handle, b: &Handle) -> Result<Handle, ConfidentialError> {
        let sum = self.value(a)?.wrapping_add(self.value(b)?);
        Ok(self.issue(sum))
    }

    fn sub(&mut self, a: &Handle, b: &Handle) -> Result<Handle, ConfidentialError> {
        let difference = self.value(a)?.wrapping_sub(self.value(b)?);
        Ok(self.issue(difference))
    }

    fn gt(&mut self, a: &Handle, b: &Handle) -> Result<Handle, ConfidentialError> {
        let greater = self.value(a)? > self.value(b)?;
        Ok(self.issue(greater as u64))
    }

    fn select(
        &mut self,
        cond: &Handle,
        a: &Handle,
        b: &Handle,
    ) -> Result<Handle, ConfidentialError> {
        let cond = self.value(cond)?;
        let (a, b) = (self.value(a)?, self.value(b)?);
        Ok(self.issue(if cond != 0 { a } else { b }))
    }

    fn random_bounded(&mut self, bound: u64) -> Result<Handle, ConfidentialError> {
        if !bound.is_power_of_two() {
            return Err(ConfidentialError::InvalidBound(bound));
        }
        let value = self.rng.gen_range(0..bound);
        Ok(self.issue(value))
    }

    fn grant_access(
        &mut self,
        handle: &Handle,
        principal: Principal,
    ) -> Result<(), ConfidentialError> {
        self.value(handle)?;
        self.acl.insert((*handle, principal));
        Ok(())
    }

    fn has_access(&self, handle: &Handle, principal: &Principal) -> bool {
        self.acl.contains(&(*handle, principal.clone()))
    }

    fn mark_publicly_revealable(&mut self, handle: &Handle) -> Result<(), ConfidentialError> {
        self.value(handle)?;
        self.revealable.insert(*handle);
        Ok(())
    }

    fn is_publicly_revealable(&self, handle: &Handle) -> bool {
        self.revealable.contains(handle)
    }

    fn verify_reveal(
        &self,
        handles: &[Handle],
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<(), ConfidentialError> {
        let expected = handles.len() * 8;
        if cleartexts.len() != expected {
            return Err(ConfidentialError::MalformedCleartexts {
                expected,
                got: cleartexts.len(),
            });
        }
        if let Some(handle) = handles.iter().find(|h| !self.revealable.contains(h)) {
            return Err(ConfidentialError::NotRevealable(*handle));
        }
        let signature =
            Signature::decode(proof).map_err(|_| ConfidentialError::InvalidRevealProof)?;
        let message = reveal_message(handles, cleartexts);
        if !self.authority.public_key().verify(
            &reveal_namespace(),
            message.as_ref(),
            &signature,
        ) {
            return Err(ConfidentialError::InvalidRevealProof);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PlaintextEngine {
        PlaintextEngine::new(7, PrivateKey::from_seed(99))
    }

    fn submit(engine: &mut PlaintextEngine, submitter: &PublicKey, value: u64) -> Handle {
        let ciphertext = value.to_be_bytes();
        let proof = input_tag(submitter, &ciphertext);
        engine
            .encrypt_from_proof(&ciphertext, proof.as_ref(), submitter)
            .unwrap()
    }

    #[test]
    fn test_input_proof_binds_submitter() {
        let mut engine = engine();
        let alice = PrivateKey::from_seed(1).public_key();
        let bob = PrivateKey::from_seed(2).public_key();
        let ciphertext = 42u64.to_be_bytes();
        let proof = input_tag(&alice, &ciphertext);

        assert_eq!(
            engine.encrypt_from_proof(&ciphertext, proof.as_ref(), &bob),
            Err(ConfidentialError::InvalidProof)
        );
        let handle = engine
            .encrypt_from_proof(&ciphertext, proof.as_ref(), &alice)
            .unwrap();
        assert_eq!(engine.peek(&handle), Some(42));
    }

    #[test]
    fn test_distance_via_select() {
        let mut engine = engine();
        let alice = PrivateKey::from_seed(1).public_key();
        for (guess, secret, distance) in [(52, 50, 2), (10, 50, 40), (50, 50, 0)] {
            let g = submit(&mut engine, &alice, guess);
            let s = engine.constant(secret);
            let cond = engine.gt(&g, &s).unwrap();
            let above = engine.sub(&g, &s).unwrap();
            let below = engine.sub(&s, &g).unwrap();
            let d = engine.select(&cond, &above, &below).unwrap();
            assert_eq!(engine.peek(&d), Some(distance));
        }
    }

    #[test]
    fn test_clamp_to_range_zeroes_out_of_range() {
        let mut engine = engine();
        let inside = engine.constant(100);
        let outside = engine.constant(101);
        let clamped = engine.clamp_to_range(&inside, 100).unwrap();
        assert_eq!(engine.peek(&clamped), Some(100));
        let clamped = engine.clamp_to_range(&outside, 100).unwrap();
        assert_eq!(engine.peek(&clamped), Some(0));
    }

    #[test]
    fn test_random_bounded() {
        let mut engine = engine();
        assert_eq!(
            engine.random_bounded(100),
            Err(ConfidentialError::InvalidBound(100))
        );
        for _ in 0..64 {
            let handle = engine.random_bounded(128).unwrap();
            assert!(engine.peek(&handle).unwrap() < 128);
        }
    }

    #[test]
    fn test_handles_are_unique() {
        let mut engine = engine();
        let a = engine.constant(5);
        let b = engine.constant(5);
        assert_ne!(a, b);
        assert_eq!(
            engine.add(&a, &Handle::default()),
            Err(ConfidentialError::UnknownHandle(Handle::default()))
        );
    }

    #[test]
    fn test_reveal_round_trip_and_order_sensitivity() {
        let mut engine = engine();
        let a = engine.constant(50);
        let b = engine.constant(2);
        assert!(matches!(
            engine.public_decrypt(&[a, b]),
            Err(ConfidentialError::NotRevealable(_))
        ));
        engine.mark_publicly_revealable(&a).unwrap();
        engine.mark_publicly_revealable(&b).unwrap();

        let reveal = engine.public_decrypt(&[a, b]).unwrap();
        assert_eq!(reveal.cleartexts, vec![50, 2]);
        let bytes = encode_cleartexts(&reveal.cleartexts);
        engine.verify_reveal(&[a, b], &bytes, &reveal.proof).unwrap();

        assert_eq!(
            engine.verify_reveal(&[b, a], &bytes, &reveal.proof),
            Err(ConfidentialError::InvalidRevealProof)
        );
        assert_eq!(
            engine.verify_reveal(&[a, b], &encode_cleartexts(&[50, 3]), &reveal.proof),
            Err(ConfidentialError::InvalidRevealProof)
        );
        assert_eq!(
            engine.verify_reveal(&[a], &bytes, &reveal.proof),
            Err(ConfidentialError::MalformedCleartexts {
                expected: 8,
                got: 16
            })
        );
        assert_eq!(
            engine.verify_reveal(&[a, b], &bytes, &[0u8; 3]),
            Err(ConfidentialError::InvalidRevealProof)
        );
    }

    #[test]
    fn test_reveal_signed_by_other_authority_fails() {
        let mut engine = engine();
        let mut impostor = PlaintextEngine::new(7, PrivateKey::from_seed(100));
        let a = engine.constant(9);
        let forged = impostor.constant(9);
        assert_eq!(a, forged);
        engine.mark_publicly_revealable(&a).unwrap();
        impostor.mark_publicly_revealable(&forged).unwrap();

        let reveal = impostor.public_decrypt(&[forged]).unwrap();
        assert_eq!(
            engine.verify_reveal(&[a], &encode_cleartexts(&reveal.cleartexts), &reveal.proof),
            Err(ConfidentialError::InvalidRevealProof)
        );
    }

    #[test]
    fn test_acl() {
        let mut engine = engine();
        let alice = PrivateKey::from_seed(1).public_key();
        let handle = engine.constant(1);
        engine.grant_access(&handle, Principal::Contract).unwrap();
        assert!(engine.has_access(&handle, &Principal::Contract));
        assert!(!engine.has_access(&handle, &Principal::Account(alice)));
    }
}
