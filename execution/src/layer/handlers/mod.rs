use super::*;
use anyhow::Context as _;
use crate::payments::TransferError;
use crate::round_scheduler::{RoundScheduler, RoundTiming};
use crate::settlement::draw_secret;
use crate::state::{load_contribution, load_lottery, load_round};
use sealdraw_types::lottery::{Contribution, LotteryConfig, LotteryState, Principal, Round};
use tracing::info;

mod admin;
mod ledger;
mod rounds;

fn scheduler(config: &LotteryConfig) -> RoundScheduler {
    RoundScheduler::new(RoundTiming::from(config))
}

impl<'a, S: State, E: ConfidentialValueStore, P: Payments> Layer<'a, S, E, P> {
    // === Shared helpers ===

    async fn lottery(&self) -> Result<LotteryState, ApplyError> {
        load_lottery(self)
            .await?
            .ok_or(ApplyError::Rejected(RejectReason::NotInitialized))
    }

    async fn round(&self, round_id: u64) -> Result<Round, ApplyError> {
        load_round(self, round_id)
            .await?
            .ok_or(ApplyError::Rejected(RejectReason::RoundNotFound(round_id)))
    }

    fn put_lottery(&mut self, lottery: LotteryState) {
        self.insert(Key::Lottery, Value::Lottery(lottery));
    }

    fn put_round(&mut self, round: Round) {
        self.insert(Key::Round(round.id), Value::Round(round));
    }

    fn put_contribution(&mut self, round: u64, bettor: &PublicKey, contribution: Contribution) {
        self.insert(
            Key::Contribution {
                round,
                bettor: bettor.clone(),
            },
            Value::Contribution(contribution),
        );
    }

    /// Open the round after `lottery.current_round` with a fresh confidential secret.
    ///
    /// The caller persists `lottery`.
    async fn start_round(&mut self, lottery: &mut LotteryState) -> Result<Event, ApplyError> {
        let round_id = lottery.current_round + 1;
        let secret = draw_secret(&mut *self.confidential, &lottery.config)?;
        self.confidential
            .grant_access(&secret, Principal::Contract)?;

        self.put_round(Round::new(round_id, self.now, secret));
        lottery.current_round = round_id;

        info!(round_id, start_time = self.now, "round started");
        Ok(Event::RoundStarted {
            round_id,
            start_time: self.now,
        })
    }

    /// Transfer `amount` out of the lottery. On failure the amount is owed to `recipient` as a
    /// pending payout for `round_id` instead. Returns whether the transfer went through.
    async fn pay_or_queue(
        &mut self,
        lottery: &mut LotteryState,
        round_id: u64,
        recipient: &PublicKey,
        amount: u64,
        events: &mut Vec<Event>,
    ) -> Result<bool, ApplyError> {
        if amount == 0 {
            return Ok(true);
        }
        match self.transfer_out(lottery, recipient, amount) {
            Ok(remaining) => {
                lottery.balance = remaining;
                Ok(true)
            }
            Err(err) => {
                warn!(round_id, ?recipient, amount, %err, "payout failed; queued for claim");
                let mut contribution = load_contribution(&*self, round_id, recipient).await?;
                contribution.pending_payout = contribution
                    .pending_payout
                    .checked_add(amount)
                    .context("pending payout overflow")?;
                self.put_contribution(round_id, recipient, contribution);
                events.push(Event::PayoutFailed {
                    round_id,
                    recipient: recipient.clone(),
                    amount,
                });
                Ok(false)
            }
        }
    }

    /// Transfer `amount` out of the lottery, rejecting the whole call if the transfer fails.
    fn send(
        &mut self,
        lottery: &mut LotteryState,
        to: &PublicKey,
        amount: u64,
    ) -> Result<(), ApplyError> {
        match self.transfer_out(lottery, to, amount) {
            Ok(remaining) => {
                lottery.balance = remaining;
                Ok(())
            }
            Err(err) => {
                warn!(?to, amount, %err, "transfer failed");
                Err(RejectReason::TransferFailed.into())
            }
        }
    }

    /// Balance left after paying `amount` to `to`. The balance itself is left to the caller.
    fn transfer_out(
        &mut self,
        lottery: &LotteryState,
        to: &PublicKey,
        amount: u64,
    ) -> Result<u64, TransferError> {
        let available = lottery.balance;
        let remaining = available
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientFunds {
                requested: amount,
                available,
            })?;
        self.payments.transfer(to, amount)?;
        Ok(remaining)
    }
}
