//! Plays one lottery round end to end against the in-memory harness.
//!
//! Bettors submit random guesses, the round is settled with an honest reveal, and a JSON summary
//! of the outcome is printed (or written to `--output`).

use clap::Parser;
use commonware_codec::Encode;
use commonware_runtime::{deterministic::Runner, Runner as _};
use commonware_utils::hex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sealdraw_execution::{
    mocks::{create_account_keypair, events, Harness},
    query_round_result,
};
use sealdraw_types::{
    execution::{Event, Instruction},
    lottery::LotteryConfig,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate a single sealdraw round")]
struct Args {
    /// YAML lottery configuration; defaults apply to omitted fields.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "10")]
    players: u64,

    #[arg(long, default_value = "1")]
    guesses_per_player: u64,

    /// Seeds both the guesses and the round secret.
    #[arg(long, default_value = "42")]
    seed: u64,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let config: LotteryConfig = match &args.config {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => LotteryConfig::default(),
    };
    config.validate()?;
    let Args {
        players,
        guesses_per_player,
        seed,
        output,
        ..
    } = args;

    let executor = Runner::default();
    let payload = executor.start(|_| async move {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut harness = Harness::with_seed(seed);
        let (owner, _) = create_account_keypair(1);
        let (_, fee_wallet) = create_account_keypair(2);
        harness
            .initialize(&owner, fee_wallet.clone(), config.clone())
            .await;

        let mut rejected = 0usize;
        let mut clock = 1;
        for player in 0..players {
            let (bettor, _) = create_account_keypair(1_000 + player);
            let values: Vec<u64> = (0..guesses_per_player)
                .map(|_| rng.gen_range(0..=config.max_guess_value))
                .collect();
            let outputs = harness.submit(&bettor, clock, &values).await;
            for event in events(&outputs) {
                if let Event::Rejected { reason, .. } = event {
                    warn!(player, %reason, "submission rejected");
                    rejected += 1;
                }
            }
            clock += 1;
        }

        let round = harness.round(1).await;
        if round.guess_count == 0 {
            info!("no guesses admitted; nothing to settle");
            return serde_json::json!({
                "seed": seed,
                "players": players,
                "rejected": rejected,
                "settled": false,
            });
        }

        harness
            .call(
                &owner,
                round.end_time,
                Instruction::RequestSettlement { round_id: 1 },
            )
            .await;
        let finalized_at = round.end_time + config.finality_delay_secs;
        harness.finalize(&owner, finalized_at, 1).await;

        let result = match query_round_result(&harness.state, 1).await {
            Ok(result) => result,
            Err(err) => {
                warn!(?err, "round did not settle");
                return serde_json::json!({
                    "seed": seed,
                    "players": players,
                    "rejected": rejected,
                    "settled": false,
                    "error": err.to_string(),
                });
            }
        };
        info!(
            secret = ?result.revealed_secret,
            winners = result.winners.len(),
            has_exact_match = result.has_exact_match,
            "round settled"
        );

        let winners: Vec<_> = result
            .winners
            .iter()
            .zip(&result.payouts)
            .map(|(winner, payout)| {
                serde_json::json!({
                    "bettor": hex(&winner.encode()),
                    "payout": payout,
                })
            })
            .collect();
        serde_json::json!({
            "seed": seed,
            "players": round.player_count,
            "guesses": round.guess_count,
            "rejected": rejected,
            "settled": true,
            "secret": result.revealed_secret,
            "has_exact_match": result.has_exact_match,
            "total_pool": result.total_pool,
            "platform_fee": result.platform_fee,
            "fee_wallet_received": harness.bank.received(&fee_wallet),
            "winners": winners,
        })
    });

    let rendered = serde_json::to_string_pretty(&payload)?;
    match output {
        Some(output) => std::fs::write(output, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}
