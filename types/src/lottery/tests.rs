use super::*;
use crate::execution::{Event, Instruction, Key, Transaction, Value};
use commonware_codec::{DecodeExt, Encode, EncodeSize, ReadExt};
use commonware_cryptography::{ed25519::PrivateKey, Signer};
use proptest::prelude::*;

fn public(seed: u64) -> commonware_cryptography::ed25519::PublicKey {
    PrivateKey::from_seed(seed).public_key()
}

#[test]
fn test_default_config_is_valid() {
    let config = LotteryConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.ticket_price, DEFAULT_TICKET_PRICE);
    assert_eq!(config.secret_bound(), 128);
}

#[test]
fn test_config_from_partial_yaml() {
    let config: LotteryConfig =
        serde_yaml::from_str("round_duration_secs: 120\nfee_bps: 100\n").unwrap();
    assert_eq!(config.round_duration_secs, 120);
    assert_eq!(config.fee_bps, 100);
    assert_eq!(config.max_players, DEFAULT_MAX_PLAYERS);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validate_names_field() {
    let config = LotteryConfig {
        finality_delay_secs: 0,
        ..LotteryConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::Zero("finality_delay_secs"))
    );

    let config = LotteryConfig {
        fee_bps: 10_001,
        ..LotteryConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::FeeTooHigh(10_001)));

    let config = LotteryConfig {
        max_guess_value: u64::from(u32::MAX) + 1,
        ..LotteryConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::GuessRangeTooWide(_))
    ));
}

#[test]
fn test_fee_on_matches_refund_example() {
    let config = LotteryConfig::default();
    let contribution = 1_000_000;
    assert_eq!(config.fee_on(contribution), 3_000);
    assert_eq!(contribution - config.fee_on(contribution), 997_000);
}

#[test]
fn test_winner_tiers() {
    assert_eq!(winner_tier(0), 1);
    assert_eq!(winner_tier(10), 1);
    assert_eq!(winner_tier(11), 3);
    assert_eq!(winner_tier(20), 3);
    assert_eq!(winner_tier(30), 5);
    assert_eq!(winner_tier(40), 7);
    assert_eq!(winner_tier(50), 9);
    assert_eq!(winner_tier(51), 11);
    assert_eq!(winner_tier(u32::MAX), 11);
}

#[test]
fn test_share_tables_sum_to_denominator() {
    for tier in [1u8, 3, 5, 7, 9, 11] {
        let shares = payout_shares(tier).unwrap();
        assert_eq!(shares.len(), tier as usize);
        assert_eq!(shares.iter().sum::<u64>(), BPS_DENOMINATOR);
        assert!(shares.windows(2).all(|w| w[0] >= w[1]));
    }
    assert!(payout_shares(0).is_none());
    assert!(payout_shares(2).is_none());
}

#[test]
fn test_reject_reason_categories() {
    assert_eq!(
        RejectReason::InsufficientPayment {
            required: 2,
            provided: 1
        }
        .category(),
        ErrorCategory::Input
    );
    assert_eq!(RejectReason::AlreadyRequested(1).category(), ErrorCategory::State);
    assert_eq!(RejectReason::NotPendingOwner.category(), ErrorCategory::Authorization);
    assert_eq!(
        RejectReason::InvalidDecryptionProof(1).category(),
        ErrorCategory::Verification
    );
    assert_eq!(RejectReason::TransferFailed.category(), ErrorCategory::Transfer);
}

#[test]
fn test_reject_reason_roundtrip() {
    for reason in [
        RejectReason::FinalityPending {
            round_id: 4,
            ready_at: 700,
        },
        RejectReason::InvalidBatchSize(11),
        RejectReason::RoundFull(2),
        RejectReason::DecryptionPending(3),
        RejectReason::Unauthorized,
    ] {
        let encoded = reason.encode();
        assert_eq!(encoded.len(), reason.encode_size());
        let decoded = RejectReason::read(&mut &encoded[..]).unwrap();
        assert_eq!(reason, decoded);
    }
}

#[test]
fn test_reject_reason_unknown_code() {
    let encoded = [99u8];
    assert!(RejectReason::read(&mut &encoded[..]).is_err());
}

#[test]
fn test_round_roundtrip() {
    let mut round = Round::new(3, 1_000, Handle::new([7u8; 32]));
    round.end_time = 1_600;
    round.total_pool = 3_000_000;
    round.platform_fee = 9_000;
    round.revealed_secret = Some(50);
    round.winners = vec![public(1)];
    round.payouts = vec![round.prize_pool()];
    round.settled = true;
    round.has_exact_match = true;

    let decoded = Round::decode(round.encode()).unwrap();
    assert_eq!(round, decoded);
}

#[test]
fn test_round_rejects_mismatched_payouts() {
    let mut round = Round::new(1, 0, Handle::default());
    round.winners = vec![public(1), public(2)];
    round.payouts = vec![10];
    assert!(Round::decode(round.encode()).is_err());
}

#[test]
fn test_value_roundtrip() {
    let value = Value::Contribution(Contribution {
        amount: 2_000_000,
        guesses: vec![0, 4],
        refund_claimed: false,
        pending_payout: 17,
    });
    let decoded = Value::decode(value.encode()).unwrap();
    assert_eq!(value, decoded);

    let key = Key::Contribution {
        round: 9,
        bettor: public(5),
    };
    let decoded = Key::decode(key.encode()).unwrap();
    assert_eq!(key, decoded);
}

#[test]
fn test_transaction_signature_covers_value() {
    let private = PrivateKey::from_seed(1);
    let instruction = Instruction::SubmitGuess {
        ciphertext: vec![1, 2, 3],
        proof: vec![4; 32],
    };
    let tx = Transaction::sign_with_value(&private, 0, 1_000_000, instruction);
    assert!(tx.verify());

    let decoded = Transaction::decode(tx.encode()).unwrap();
    assert_eq!(tx, decoded);
    assert!(decoded.verify());

    let mut tampered = tx;
    tampered.value = 1;
    assert!(!tampered.verify());
}

#[test]
fn test_batch_over_limit_fails_to_decode() {
    let instruction = Instruction::SubmitGuesses {
        ciphertexts: vec![vec![0u8; 8]; MAX_BATCH_SIZE + 1],
        proofs: vec![vec![0u8; 8]; MAX_BATCH_SIZE + 1],
    };
    assert!(Instruction::decode(instruction.encode()).is_err());
}

#[test]
fn test_decryption_requested_event_preserves_order() {
    let handles = vec![
        Handle::new([3u8; 32]),
        Handle::new([1u8; 32]),
        Handle::new([2u8; 32]),
    ];
    let event = Event::DecryptionRequested {
        round_id: 1,
        handles: handles.clone(),
        platform_fee: 900,
        max_winners: 1,
    };
    match Event::decode(event.encode()).unwrap() {
        Event::DecryptionRequested { handles: got, .. } => assert_eq!(got, handles),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_handle_display_is_hex() {
    let handle = Handle::new([0xab; 32]);
    assert_eq!(handle.to_string(), "ab".repeat(32));
}

proptest! {
    #[test]
    fn fee_never_exceeds_amount(amount in any::<u64>(), fee_bps in 0u16..=10_000) {
        let config = LotteryConfig { fee_bps, ..LotteryConfig::default() };
        prop_assert!(config.fee_on(amount) <= amount);
    }
}
