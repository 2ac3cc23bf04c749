use anyhow::{Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use sealdraw_types::{
    execution::{Event, Instruction, Key, Output, Transaction, Value},
    lottery::RejectReason,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::confidential::{ConfidentialError, ConfidentialValueStore};
use crate::payments::Payments;
use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

/// Why an instruction did not apply.
#[derive(Debug)]
pub enum ApplyError {
    /// Refused by the lottery; every write of the call is discarded.
    Rejected(RejectReason),
    /// The store or confidential engine failed; execution cannot continue.
    State(anyhow::Error),
}

impl From<RejectReason> for ApplyError {
    fn from(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}

impl From<anyhow::Error> for ApplyError {
    fn from(err: anyhow::Error) -> Self {
        Self::State(err)
    }
}

impl From<ConfidentialError> for ApplyError {
    fn from(err: ConfidentialError) -> Self {
        Self::State(anyhow::Error::new(err).context("confidential engine"))
    }
}

pub(crate) type Applied = std::result::Result<Vec<Event>, ApplyError>;

/// Staged view over a [`State`] that executes lottery transactions.
///
/// Writes accumulate in `pending` until [`Layer::commit`]. Each transaction runs against a
/// checkpoint of `pending`; a rejected transaction restores it.
pub struct Layer<'a, S: State, E: ConfidentialValueStore, P: Payments> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    confidential: &'a mut E,
    payments: &'a mut P,
    now: u64,
}

impl<'a, S: State, E: ConfidentialValueStore, P: Payments> Layer<'a, S, E, P> {
    pub fn new(state: &'a S, confidential: &'a mut E, payments: &'a mut P, now: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            confidential,
            payments,
            now,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(&*self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    async fn dispatch(&mut self, transaction: &Transaction) -> Applied {
        let instruction = &transaction.instruction;
        let public = &transaction.public;
        let value = transaction.value;

        if value > 0 && !instruction.is_payable() {
            return Err(RejectReason::NonPayable.into());
        }

        match instruction {
            Instruction::Initialize { config, fee_wallet } => {
                self.handle_initialize(public, config, fee_wallet).await
            }
            Instruction::SubmitGuess { ciphertext, proof } => {
                self.handle_submit_guesses(
                    public,
                    value,
                    std::slice::from_ref(ciphertext),
                    std::slice::from_ref(proof),
                )
                .await
            }
            Instruction::SubmitGuesses {
                ciphertexts,
                proofs,
            } => {
                self.handle_submit_guesses(public, value, ciphertexts, proofs)
                    .await
            }
            Instruction::RequestSettlement { round_id } => {
                self.handle_request_settlement(public, *round_id).await
            }
            Instruction::FinalizeSettlement {
                round_id,
                secret,
                distances,
                proof,
            } => {
                self.handle_finalize_settlement(public, *round_id, *secret, distances, proof)
                    .await
            }
            Instruction::ClaimRefund { round_id } => {
                self.handle_claim_refund(public, *round_id).await
            }
            Instruction::ClaimPendingPayout { round_id } => {
                self.handle_claim_pending_payout(public, *round_id).await
            }
            Instruction::ProposeOwner { candidate } => {
                self.handle_propose_owner(public, candidate).await
            }
            Instruction::AcceptOwnership => self.handle_accept_ownership(public).await,
            Instruction::SetFeeWallet { wallet } => {
                self.handle_set_fee_wallet(public, wallet).await
            }
            Instruction::EmergencyWithdraw { to, amount } => {
                self.handle_emergency_withdraw(public, to, *amount).await
            }
            Instruction::SkipStuckRound => self.handle_skip_stuck_round(public).await,
            Instruction::ForceNewRound => self.handle_force_new_round(public).await,
        }
    }

    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let checkpoint = self.pending.clone();
        match self.dispatch(transaction).await {
            Ok(events) => Ok(events),
            Err(ApplyError::Rejected(reason)) => {
                self.pending = checkpoint;
                warn!(
                    account = ?transaction.public,
                    nonce = transaction.nonce,
                    code = reason.code(),
                    category = %reason.category(),
                    %reason,
                    "transaction rejected"
                );
                Ok(vec![Event::Rejected {
                    account: transaction.public.clone(),
                    reason,
                }])
            }
            Err(ApplyError::State(err)) => Err(err),
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if !tx.verify() {
                debug!(public = ?tx.public, nonce = tx.nonce, "invalid signature; dropping transaction");
                continue;
            }
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await?.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State, E: ConfidentialValueStore, P: Payments> State for Layer<'a, S, E, P> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{create_account_keypair, encrypt_guess, Harness};
    use crate::state::nonce;
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use sealdraw_types::lottery::LotteryConfig;

    #[test]
    fn test_nonce_mismatch_drops_transaction() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut harness = Harness::new();
            let (owner, owner_public) = create_account_keypair(1);
            let (_, wallet) = create_account_keypair(2);

            let stale = Transaction::sign(
                &owner,
                5,
                Instruction::Initialize {
                    config: LotteryConfig::default(),
                    fee_wallet: wallet,
                },
            );
            let outputs = harness.execute(1_000, vec![stale]).await;
            assert!(outputs.is_empty());
            assert_eq!(nonce(&harness.state, &owner_public).await.unwrap(), 0);
        });
    }

    #[test]
    fn test_invalid_signature_dropped() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut harness = Harness::new();
            let (owner, _) = create_account_keypair(1);
            let (_, wallet) = create_account_keypair(2);

            let mut tx = Transaction::sign(
                &owner,
                0,
                Instruction::Initialize {
                    config: LotteryConfig::default(),
                    fee_wallet: wallet,
                },
            );
            tx.value = 1;
            let outputs = harness.execute(1_000, vec![tx]).await;
            assert!(outputs.is_empty());
        });
    }

    #[test]
    fn test_rejection_rolls_back_but_consumes_nonce() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut harness = Harness::new();
            let (owner, owner_public) = create_account_keypair(1);
            let (_, wallet) = create_account_keypair(2);
            harness.initialize(&owner, wallet, LotteryConfig::default()).await;

            // Payment on a non-payable instruction.
            let tx = Transaction::sign_with_value(
                &owner,
                1,
                100,
                Instruction::SetFeeWallet {
                    wallet: owner_public.clone(),
                },
            );
            let outputs = harness.execute(1_001, vec![tx]).await;
            assert!(matches!(
                &outputs[0],
                Output::Event(Event::Rejected {
                    reason: RejectReason::NonPayable,
                    ..
                })
            ));
            assert!(matches!(outputs[1], Output::Transaction(_)));
            assert_eq!(nonce(&harness.state, &owner_public).await.unwrap(), 2);
            assert_eq!(harness.lottery().await.fee_wallet, wallet_of(2));
        });
    }

    #[test]
    fn test_rejected_batch_leaves_no_guesses() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut harness = Harness::new();
            let (owner, _) = create_account_keypair(1);
            let (_, wallet) = create_account_keypair(2);
            let (alice, alice_public) = create_account_keypair(3);
            let config = LotteryConfig::default();
            harness.initialize(&owner, wallet, config.clone()).await;

            // Second guess carries a proof bound to someone else.
            let (good_ct, good_proof) = encrypt_guess(&alice_public, 10);
            let (bad_ct, _) = encrypt_guess(&alice_public, 11);
            let (_, foreign_proof) = encrypt_guess(&wallet_of(9), 11);
            let tx = Transaction::sign_with_value(
                &alice,
                0,
                config.ticket_price * 2,
                Instruction::SubmitGuesses {
                    ciphertexts: vec![good_ct, bad_ct],
                    proofs: vec![good_proof, foreign_proof],
                },
            );
            let outputs = harness.execute(1_010, vec![tx]).await;
            assert!(matches!(
                &outputs[0],
                Output::Event(Event::Rejected {
                    reason: RejectReason::InvalidInputProof,
                    ..
                })
            ));

            let round = harness.round(1).await;
            assert_eq!(round.guess_count, 0);
            assert_eq!(round.total_pool, 0);
            assert!(round.is_waiting());
            assert_eq!(harness.lottery().await.balance, 0);
            assert!(harness.bank.transfers().is_empty());
        });
    }

    fn wallet_of(seed: u64) -> PublicKey {
        create_account_keypair(seed).1
    }
}
