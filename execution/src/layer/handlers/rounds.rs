use super::super::*;
use super::scheduler;
use crate::confidential::encode_cleartexts;
use crate::settlement::{encrypted_distance, implied_guess, settle, RankedGuess};
use crate::state::{load_contribution, load_guess, load_lottery};
use anyhow::Context as _;
use sealdraw_types::lottery::{
    payout_shares, winner_tier, Guess, LotteryConfig, LotteryState, Principal, MAX_BATCH_SIZE,
};
use tracing::info;

impl<'a, S: State, E: ConfidentialValueStore, P: Payments> Layer<'a, S, E, P> {
    // === Round Handlers ===

    pub(in crate::layer) async fn handle_initialize(
        &mut self,
        public: &PublicKey,
        config: &LotteryConfig,
        fee_wallet: &PublicKey,
    ) -> Applied {
        if load_lottery(&*self).await?.is_some() {
            return Err(RejectReason::AlreadyInitialized.into());
        }
        if let Err(err) = config.validate() {
            debug!(%err, "invalid lottery config");
            return Err(RejectReason::InvalidConfig.into());
        }

        let mut lottery = LotteryState {
            config: config.clone(),
            owner: public.clone(),
            pending_owner: None,
            fee_wallet: fee_wallet.clone(),
            current_round: 0,
            balance: 0,
        };
        let started = self.start_round(&mut lottery).await?;
        info!(owner = ?public, ?fee_wallet, "lottery initialized");
        self.put_lottery(lottery);

        Ok(vec![started])
    }

    pub(in crate::layer) async fn handle_submit_guesses(
        &mut self,
        public: &PublicKey,
        payment: u64,
        ciphertexts: &[Vec<u8>],
        proofs: &[Vec<u8>],
    ) -> Applied {
        if ciphertexts.len() != proofs.len() {
            return Err(RejectReason::LengthMismatch {
                expected: ciphertexts.len() as u32,
                got: proofs.len() as u32,
            }
            .into());
        }
        let count = ciphertexts.len();
        if count == 0 || count > MAX_BATCH_SIZE {
            return Err(RejectReason::InvalidBatchSize(count as u32).into());
        }
        let mut lottery = self.lottery().await?;
        let required = lottery
            .config
            .ticket_price
            .checked_mul(count as u64)
            .unwrap_or(u64::MAX);
        if payment < required {
            return Err(RejectReason::InsufficientPayment {
                required,
                provided: payment,
            }
            .into());
        }

        let round_id = lottery.current_round;
        let mut round = self.round(round_id).await?;
        if !scheduler(&lottery.config).is_admission_open(&round, self.now) {
            return Err(RejectReason::RoundEnded(round_id).into());
        }
        let mut contribution = load_contribution(&*self, round_id, public).await?;
        let new_player = !contribution.is_player();
        if new_player && round.player_count >= lottery.config.max_players {
            return Err(RejectReason::RoundFull(round_id).into());
        }
        if contribution.guesses.len() + count > lottery.config.max_guesses_per_player as usize {
            return Err(RejectReason::GuessLimit(round_id).into());
        }

        let mut events = Vec::with_capacity(count + 1);
        let bettor = Principal::Account(public.clone());
        for (ciphertext, proof) in ciphertexts.iter().zip(proofs) {
            let raw = match self.confidential.encrypt_from_proof(ciphertext, proof, public) {
                Ok(handle) => handle,
                Err(ConfidentialError::InvalidProof) => {
                    return Err(RejectReason::InvalidInputProof.into())
                }
                Err(err) => return Err(err.into()),
            };
            let value = self
                .confidential
                .clamp_to_range(&raw, lottery.config.max_guess_value)?;
            self.confidential.grant_access(&value, Principal::Contract)?;
            self.confidential.grant_access(&value, bettor.clone())?;

            let index = round.guess_count;
            self.insert(
                Key::Guess {
                    round: round_id,
                    index,
                },
                Value::Guess(Guess {
                    bettor: public.clone(),
                    value,
                    distance: None,
                    submission_order: index,
                    is_winner: false,
                    revealed_value: None,
                }),
            );
            round.guess_count += 1;
            contribution.guesses.push(index);

            debug!(round_id, bettor = ?public, index, "guess admitted");
            events.push(Event::GuessSubmitted {
                round_id,
                bettor: public.clone(),
                index,
            });
        }

        if new_player {
            round.player_count += 1;
        }
        round.total_pool = round
            .total_pool
            .checked_add(required)
            .context("round pool overflow")?;
        contribution.amount = contribution
            .amount
            .checked_add(required)
            .context("contribution overflow")?;
        lottery.balance = lottery
            .balance
            .checked_add(required)
            .context("lottery balance overflow")?;

        if round.is_waiting() {
            round.end_time = scheduler(&lottery.config).timer_end(self.now);
            info!(round_id, end_time = round.end_time, "round timer started");
            events.push(Event::RoundTimerStarted {
                round_id,
                end_time: round.end_time,
            });
        }

        self.put_round(round);
        self.put_contribution(round_id, public, contribution);
        self.put_lottery(lottery);

        // Overpayment goes straight back; it never enters the balance.
        let excess = payment - required;
        if excess > 0 {
            if let Err(err) = self.payments.transfer(public, excess) {
                warn!(bettor = ?public, excess, %err, "overpayment refund failed");
                return Err(RejectReason::TransferFailed.into());
            }
        }

        Ok(events)
    }

    pub(in crate::layer) async fn handle_request_settlement(
        &mut self,
        _public: &PublicKey,
        round_id: u64,
    ) -> Applied {
        let lottery = self.lottery().await?;
        let mut round = self.round(round_id).await?;
        if round.settled {
            return Err(RejectReason::AlreadySettled(round_id).into());
        }
        if round.decryption_requested() {
            return Err(RejectReason::AlreadyRequested(round_id).into());
        }
        if round.guess_count == 0 {
            return Err(RejectReason::NoGuesses(round_id).into());
        }
        if !scheduler(&lottery.config).can_request_settlement(&round, self.now) {
            return Err(RejectReason::RoundNotEnded(round_id).into());
        }

        round.platform_fee = lottery.config.fee_on(round.total_pool);
        round.max_winners = winner_tier(round.player_count);

        // Order here is the order the decryption proof must cover.
        let mut handles = Vec::with_capacity(round.guess_count as usize + 1);
        handles.push(round.secret);
        for index in 0..round.guess_count {
            let mut guess = load_guess(&*self, round_id, index)
                .await?
                .with_context(|| format!("missing guess {index} in round {round_id}"))?;
            let distance = encrypted_distance(&mut *self.confidential, &guess.value, &round.secret)?;
            self.confidential
                .grant_access(&distance, Principal::Contract)?;
            self.confidential
                .grant_access(&distance, Principal::Account(guess.bettor.clone()))?;
            self.confidential.mark_publicly_revealable(&distance)?;

            guess.distance = Some(distance);
            handles.push(distance);
            self.insert(
                Key::Guess {
                    round: round_id,
                    index,
                },
                Value::Guess(guess),
            );
        }
        self.confidential.mark_publicly_revealable(&round.secret)?;
        round.decryption_requested_at = self.now;

        info!(
            round_id,
            guesses = round.guess_count,
            platform_fee = round.platform_fee,
            max_winners = round.max_winners,
            "settlement requested"
        );
        let event = Event::DecryptionRequested {
            round_id,
            handles,
            platform_fee: round.platform_fee,
            max_winners: round.max_winners,
        };
        self.put_round(round);

        Ok(vec![event])
    }

    pub(in crate::layer) async fn handle_finalize_settlement(
        &mut self,
        _public: &PublicKey,
        round_id: u64,
        secret: u64,
        distances: &[u64],
        proof: &[u8],
    ) -> Applied {
        let mut lottery = self.lottery().await?;
        let mut round = self.round(round_id).await?;
        if round.settled {
            return Err(RejectReason::AlreadySettled(round_id).into());
        }
        if !round.decryption_requested() {
            return Err(RejectReason::NotRequested(round_id).into());
        }
        let scheduler = scheduler(&lottery.config);
        if !scheduler.can_finalize(&round, self.now) {
            return Err(RejectReason::FinalityPending {
                round_id,
                ready_at: scheduler.finality_deadline(&round),
            }
            .into());
        }
        if distances.len() != round.guess_count as usize {
            return Err(RejectReason::LengthMismatch {
                expected: round.guess_count,
                got: distances.len() as u32,
            }
            .into());
        }

        // Flag first: nothing below may observe an unsettled round once transfers start.
        round.settled = true;

        let mut guesses = Vec::with_capacity(distances.len());
        let mut handles = Vec::with_capacity(distances.len() + 1);
        handles.push(round.secret);
        for index in 0..round.guess_count {
            let guess = load_guess(&*self, round_id, index)
                .await?
                .with_context(|| format!("missing guess {index} in round {round_id}"))?;
            let distance = guess
                .distance
                .with_context(|| format!("guess {index} in round {round_id} has no distance"))?;
            handles.push(distance);
            guesses.push(guess);
        }

        let mut cleartexts = Vec::with_capacity(handles.len());
        cleartexts.push(secret);
        cleartexts.extend_from_slice(distances);
        if let Err(err) =
            self.confidential
                .verify_reveal(&handles, &encode_cleartexts(&cleartexts), proof)
        {
            warn!(round_id, %err, "decryption proof rejected");
            return Err(RejectReason::InvalidDecryptionProof(round_id).into());
        }
        round.revealed_secret = Some(secret);

        let shares = payout_shares(round.max_winners)
            .with_context(|| format!("no share table for {} winners", round.max_winners))?;
        let ranked: Vec<RankedGuess> = guesses
            .iter()
            .zip(distances)
            .map(|(guess, distance)| RankedGuess {
                bettor: guess.bettor.clone(),
                distance: *distance,
                submission_order: guess.submission_order,
            })
            .collect();
        let outcome = settle(&ranked, round.prize_pool(), shares);

        round.has_exact_match = outcome.has_exact_match;
        round.winners = outcome
            .winners
            .iter()
            .map(|&i| guesses[i].bettor.clone())
            .collect();
        round.payouts = outcome.payouts.clone();
        for &i in &outcome.winners {
            let mut guess = guesses[i].clone();
            guess.is_winner = true;
            guess.revealed_value =
                implied_guess(secret, distances[i], lottery.config.max_guess_value);
            self.insert(
                Key::Guess {
                    round: round_id,
                    index: i as u32,
                },
                Value::Guess(guess),
            );
        }
        self.put_round(round.clone());

        let mut events = Vec::new();
        for (winner, payout) in round.winners.iter().zip(&round.payouts) {
            self.pay_or_queue(&mut lottery, round_id, winner, *payout, &mut events)
                .await?;
        }
        let wallet = lottery.fee_wallet.clone();
        if round.platform_fee > 0
            && self
                .pay_or_queue(&mut lottery, round_id, &wallet, round.platform_fee, &mut events)
                .await?
        {
            events.push(Event::FeeCollected {
                round_id,
                wallet,
                amount: round.platform_fee,
            });
        }

        info!(
            round_id,
            secret,
            has_exact_match = round.has_exact_match,
            winners = round.winners.len(),
            "round settled"
        );
        events.push(Event::RoundSettled {
            round_id,
            has_exact_match: round.has_exact_match,
            secret,
            winners: round.winners,
            payouts: round.payouts,
        });

        if round_id == lottery.current_round {
            events.push(self.start_round(&mut lottery).await?);
        }
        self.put_lottery(lottery);

        Ok(events)
    }
}
