use super::super::*;
use super::scheduler;
use crate::state::locked_funds;
use sealdraw_types::lottery::{LotteryState, RoundPhase};
use tracing::info;

impl<'a, S: State, E: ConfidentialValueStore, P: Payments> Layer<'a, S, E, P> {
    // === Admin Handlers ===

    async fn owned_lottery(&self, public: &PublicKey) -> Result<LotteryState, ApplyError> {
        let lottery = self.lottery().await?;
        if &lottery.owner != public {
            return Err(RejectReason::Unauthorized.into());
        }
        Ok(lottery)
    }

    pub(in crate::layer) async fn handle_propose_owner(
        &mut self,
        public: &PublicKey,
        candidate: &PublicKey,
    ) -> Applied {
        let mut lottery = self.owned_lottery(public).await?;
        lottery.pending_owner = Some(candidate.clone());
        self.put_lottery(lottery);

        info!(owner = ?public, ?candidate, "ownership transfer proposed");
        Ok(vec![Event::OwnershipTransferProposed {
            owner: public.clone(),
            candidate: candidate.clone(),
        }])
    }

    pub(in crate::layer) async fn handle_accept_ownership(&mut self, public: &PublicKey) -> Applied {
        let mut lottery = self.lottery().await?;
        if lottery.pending_owner.as_ref() != Some(public) {
            return Err(RejectReason::NotPendingOwner.into());
        }
        let previous = std::mem::replace(&mut lottery.owner, public.clone());
        lottery.pending_owner = None;
        self.put_lottery(lottery);

        info!(?previous, owner = ?public, "ownership transferred");
        Ok(vec![Event::OwnershipTransferred {
            previous,
            owner: public.clone(),
        }])
    }

    pub(in crate::layer) async fn handle_set_fee_wallet(
        &mut self,
        public: &PublicKey,
        wallet: &PublicKey,
    ) -> Applied {
        let mut lottery = self.owned_lottery(public).await?;
        let previous = std::mem::replace(&mut lottery.fee_wallet, wallet.clone());
        self.put_lottery(lottery);

        Ok(vec![Event::FeeWalletUpdated {
            previous,
            wallet: wallet.clone(),
        }])
    }

    /// Withdraw funds not committed to any unsettled round.
    pub(in crate::layer) async fn handle_emergency_withdraw(
        &mut self,
        public: &PublicKey,
        to: &PublicKey,
        amount: u64,
    ) -> Applied {
        let mut lottery = self.owned_lottery(public).await?;
        let locked = locked_funds(&*self, lottery.current_round).await?;
        let available = lottery.balance.saturating_sub(locked);
        if amount > available {
            return Err(RejectReason::InsufficientWithdrawable {
                requested: amount,
                available,
            }
            .into());
        }

        self.send(&mut lottery, to, amount)?;
        self.put_lottery(lottery);

        info!(?to, amount, locked, "emergency withdrawal");
        Ok(vec![Event::EmergencyWithdrawal {
            to: to.clone(),
            amount,
        }])
    }

    /// Retire the current round as a no-winner round without decrypting anything.
    pub(in crate::layer) async fn handle_skip_stuck_round(&mut self, public: &PublicKey) -> Applied {
        let mut lottery = self.owned_lottery(public).await?;
        let round_id = lottery.current_round;
        let mut round = self.round(round_id).await?;
        match scheduler(&lottery.config).phase(&round, self.now) {
            RoundPhase::Waiting | RoundPhase::Ended => {}
            RoundPhase::Active => return Err(RejectReason::RoundStillActive(round_id).into()),
            // Distances are already revealable; only finalize may settle from here.
            RoundPhase::DecryptionRequested => {
                return Err(RejectReason::DecryptionPending(round_id).into())
            }
            RoundPhase::Settled => return Err(RejectReason::AlreadySettled(round_id).into()),
        }

        round.platform_fee = lottery.config.fee_on(round.total_pool);
        round.settled = true;
        round.skipped = true;
        let (total_pool, platform_fee) = (round.total_pool, round.platform_fee);
        self.put_round(round);

        let mut events = Vec::new();
        let wallet = lottery.fee_wallet.clone();
        if platform_fee > 0
            && self
                .pay_or_queue(&mut lottery, round_id, &wallet, platform_fee, &mut events)
                .await?
        {
            events.push(Event::FeeCollected {
                round_id,
                wallet,
                amount: platform_fee,
            });
        }

        info!(round_id, total_pool, platform_fee, "round skipped");
        events.push(Event::RoundSkipped {
            round_id,
            total_pool,
            platform_fee,
        });
        events.push(self.start_round(&mut lottery).await?);
        self.put_lottery(lottery);

        Ok(events)
    }

    pub(in crate::layer) async fn handle_force_new_round(&mut self, public: &PublicKey) -> Applied {
        let mut lottery = self.owned_lottery(public).await?;
        let round_id = lottery.current_round;
        let round = self.round(round_id).await?;
        if !round.settled {
            return Err(RejectReason::NotSettled(round_id).into());
        }

        let started = self.start_round(&mut lottery).await?;
        self.put_lottery(lottery);

        Ok(vec![started])
    }
}
