use super::super::*;
use crate::settlement::refund_amount;
use crate::state::load_contribution;

impl<'a, S: State, E: ConfidentialValueStore, P: Payments> Layer<'a, S, E, P> {
    // === Claim Handlers ===

    pub(in crate::layer) async fn handle_claim_refund(
        &mut self,
        public: &PublicKey,
        round_id: u64,
    ) -> Applied {
        let mut lottery = self.lottery().await?;
        let round = self.round(round_id).await?;
        if !round.settled {
            return Err(RejectReason::NotSettled(round_id).into());
        }
        if round.has_exact_match {
            return Err(RejectReason::RoundHadWinners(round_id).into());
        }
        let mut contribution = load_contribution(&*self, round_id, public).await?;
        if contribution.amount == 0 {
            return Err(RejectReason::NothingToRefund(round_id).into());
        }
        if contribution.refund_claimed {
            return Err(RejectReason::RefundAlreadyClaimed(round_id).into());
        }

        let amount = refund_amount(contribution.amount, lottery.config.fee_bps);
        contribution.refund_claimed = true;
        self.put_contribution(round_id, public, contribution);
        self.send(&mut lottery, public, amount)?;
        self.put_lottery(lottery);

        Ok(vec![Event::RefundClaimed {
            round_id,
            bettor: public.clone(),
            amount,
        }])
    }

    pub(in crate::layer) async fn handle_claim_pending_payout(
        &mut self,
        public: &PublicKey,
        round_id: u64,
    ) -> Applied {
        let mut lottery = self.lottery().await?;
        let mut contribution = load_contribution(&*self, round_id, public).await?;
        let amount = contribution.pending_payout;
        if amount == 0 {
            return Err(RejectReason::NothingPending(round_id).into());
        }

        contribution.pending_payout = 0;
        self.put_contribution(round_id, public, contribution);
        self.send(&mut lottery, public, amount)?;
        self.put_lottery(lottery);

        Ok(vec![Event::PendingPayoutClaimed {
            round_id,
            recipient: public.clone(),
            amount,
        }])
    }
}
