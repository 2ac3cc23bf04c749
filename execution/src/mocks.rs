use crate::confidential::{input_tag, PlaintextEngine, Reveal};
use crate::payments::{Payments, TransferError};
use crate::state::{
    load_contribution, load_guess, load_lottery, load_round, nonce, Memory, State,
};
use crate::Layer;
use commonware_cryptography::ed25519::{PrivateKey, PublicKey};
use commonware_cryptography::Signer;
use commonware_math::algebra::Random;
use rand::{rngs::StdRng, SeedableRng};
use sealdraw_types::{
    execution::{Event, Instruction, Output, Transaction},
    lottery::{Contribution, Guess, Handle, LotteryConfig, LotteryState, Round},
};
use std::collections::HashSet;

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::random(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Keypair of the simulated decryption authority
pub fn authority_keypair() -> (PrivateKey, PublicKey) {
    create_account_keypair(u64::MAX)
}

/// Ciphertext and input proof for `value`, bound to `submitter`
pub fn encrypt_guess(submitter: &PublicKey, value: u64) -> (Vec<u8>, Vec<u8>) {
    let ciphertext = value.to_be_bytes().to_vec();
    let proof = input_tag(submitter, &ciphertext).as_ref().to_vec();
    (ciphertext, proof)
}

/// Transfer sink that records every payment and can refuse chosen recipients.
#[derive(Default)]
pub struct MockBank {
    transfers: Vec<(PublicKey, u64)>,
    rejecting: HashSet<PublicKey>,
}

impl MockBank {
    pub fn reject(&mut self, recipient: &PublicKey) {
        self.rejecting.insert(recipient.clone());
    }

    pub fn accept(&mut self, recipient: &PublicKey) {
        self.rejecting.remove(recipient);
    }

    pub fn transfers(&self) -> &[(PublicKey, u64)] {
        &self.transfers
    }

    /// Total received by `recipient`.
    pub fn received(&self, recipient: &PublicKey) -> u64 {
        self.transfers
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl Payments for MockBank {
    fn transfer(&mut self, to: &PublicKey, amount: u64) -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            return Err(TransferError::Rejected);
        }
        self.transfers.push((to.clone(), amount));
        Ok(())
    }
}

/// In-memory lottery: store, plaintext engine and bank, executing one block per call.
pub struct Harness {
    pub state: Memory,
    pub engine: PlaintextEngine,
    pub bank: MockBank,
    log: Vec<Output>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// `seed` drives the engine's randomness, and so every round secret.
    pub fn with_seed(seed: u64) -> Self {
        let (authority, _) = authority_keypair();
        Self {
            state: Memory::default(),
            engine: PlaintextEngine::new(seed, authority),
            bank: MockBank::default(),
            log: Vec::new(),
        }
    }

    /// Execute `txs` as one block at time `now` and commit the result.
    pub async fn execute(&mut self, now: u64, txs: Vec<Transaction>) -> Vec<Output> {
        let mut layer = Layer::new(&self.state, &mut self.engine, &mut self.bank, now);
        let (outputs, _) = layer.execute(txs).await.expect("execution failed");
        let changes = layer.commit();
        self.state.apply(changes).await.expect("apply failed");
        self.log.extend(outputs.iter().cloned());
        outputs
    }

    /// Sign `instruction` with the signer's next nonce and execute it.
    pub async fn call(
        &mut self,
        signer: &PrivateKey,
        now: u64,
        instruction: Instruction,
    ) -> Vec<Output> {
        self.call_with_value(signer, now, 0, instruction).await
    }

    pub async fn call_with_value(
        &mut self,
        signer: &PrivateKey,
        now: u64,
        value: u64,
        instruction: Instruction,
    ) -> Vec<Output> {
        let nonce = nonce(&self.state, &signer.public_key())
            .await
            .expect("nonce lookup failed");
        let tx = Transaction::sign_with_value(signer, nonce, value, instruction);
        self.execute(now, vec![tx]).await
    }

    pub async fn initialize(
        &mut self,
        owner: &PrivateKey,
        fee_wallet: PublicKey,
        config: LotteryConfig,
    ) -> Vec<Output> {
        self.call(owner, 0, Instruction::Initialize { config, fee_wallet })
            .await
    }

    /// Submit `values` as guesses, paying exactly the ticket price for each.
    pub async fn submit(&mut self, bettor: &PrivateKey, now: u64, values: &[u64]) -> Vec<Output> {
        let price = self.lottery().await.config.ticket_price;
        self.submit_paying(bettor, now, values, price * values.len() as u64)
            .await
    }

    pub async fn submit_paying(
        &mut self,
        bettor: &PrivateKey,
        now: u64,
        values: &[u64],
        payment: u64,
    ) -> Vec<Output> {
        let public = bettor.public_key();
        let (ciphertexts, proofs): (Vec<_>, Vec<_>) = values
            .iter()
            .map(|value| encrypt_guess(&public, *value))
            .unzip();
        let instruction = if ciphertexts.len() == 1 {
            Instruction::SubmitGuess {
                ciphertext: ciphertexts[0].clone(),
                proof: proofs[0].clone(),
            }
        } else {
            Instruction::SubmitGuesses {
                ciphertexts,
                proofs,
            }
        };
        self.call_with_value(bettor, now, payment, instruction).await
    }

    /// Handles in the order a settlement reveal must cover: `[secret, d0, ..]`.
    pub async fn reveal_handles(&self, round_id: u64) -> Vec<Handle> {
        let round = self.round(round_id).await;
        let mut handles = vec![round.secret];
        for index in 0..round.guess_count {
            let guess = self.guess(round_id, index).await;
            handles.push(guess.distance.expect("distance not computed"));
        }
        handles
    }

    /// Ask the decryption oracle for a round's secret and distances.
    pub async fn reveal(&self, round_id: u64) -> Reveal {
        let handles = self.reveal_handles(round_id).await;
        self.engine
            .public_decrypt(&handles)
            .expect("round not revealable")
    }

    /// Finalize `round_id` with an honest reveal.
    pub async fn finalize(&mut self, signer: &PrivateKey, now: u64, round_id: u64) -> Vec<Output> {
        let reveal = self.reveal(round_id).await;
        let (secret, distances) = reveal
            .cleartexts
            .split_first()
            .expect("reveal carries the secret");
        let instruction = Instruction::FinalizeSettlement {
            round_id,
            secret: *secret,
            distances: distances.to_vec(),
            proof: reveal.proof.clone(),
        };
        self.call(signer, now, instruction).await
    }

    pub async fn lottery(&self) -> LotteryState {
        load_lottery(&self.state)
            .await
            .unwrap()
            .expect("lottery not initialized")
    }

    pub async fn round(&self, round_id: u64) -> Round {
        load_round(&self.state, round_id)
            .await
            .unwrap()
            .expect("round not found")
    }

    pub async fn guess(&self, round_id: u64, index: u32) -> Guess {
        load_guess(&self.state, round_id, index)
            .await
            .unwrap()
            .expect("guess not found")
    }

    pub async fn contribution(&self, round_id: u64, bettor: &PublicKey) -> Contribution {
        load_contribution(&self.state, round_id, bettor)
            .await
            .unwrap()
    }

    /// Every output executed so far, in order.
    pub fn log(&self) -> &[Output] {
        &self.log
    }
}

/// Events of `outputs`, dropping transactions.
pub fn events(outputs: &[Output]) -> Vec<Event> {
    outputs
        .iter()
        .filter_map(|output| match output {
            Output::Event(event) => Some(event.clone()),
            Output::Transaction(_) => None,
        })
        .collect()
}
