#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the Duelforge engine.
//!
//! `search` certifies a fair seed for the standard duel templates and prints
//! it together with its winning and losing paths and a transfer string;
//! `replay` rebuilds a session from a transfer string and plays a discrete
//! input sequence through it, reporting each round's verdict.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use duelforge_core::{level_to_input, INPUT_LEVELS};
use duelforge_session::{standard_templates, BattleSession};
use duelforge_system_seed_search::{SearchConfig, SeedCertificate};
use tracing_subscriber::EnvFilter;

mod transfer;

#[derive(Parser)]
#[command(name = "duelforge", about = "Certified-fair matrix battles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Searches for a certified-fair seed for the standard duel.
    Search {
        /// Number of battle rounds the certification covers.
        #[arg(long, default_value_t = 5)]
        rounds: u32,
        /// Edge length of the entity and rule matrices.
        #[arg(long, default_value_t = 2)]
        size: usize,
        /// Base seed for candidate derivation; random when omitted.
        #[arg(long)]
        base_seed: Option<i64>,
        /// Evaluate candidate seeds on parallel workers.
        #[arg(long)]
        parallel: bool,
        /// Overrides the candidate retry budget.
        #[arg(long)]
        max_tries: Option<usize>,
        /// Aborts the search after this many seconds.
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Replays a discrete input sequence against a certified battle.
    Replay {
        /// Transfer string produced by `search`.
        #[arg(long)]
        certificate: String,
        /// Comma-separated input levels (0-9); the certified winning path
        /// when omitted.
        #[arg(long, value_delimiter = ',')]
        inputs: Option<Vec<u8>>,
    },
}

/// Entry point for the Duelforge command-line interface.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Search {
            rounds,
            size,
            base_seed,
            parallel,
            max_tries,
            deadline_secs,
        } => search(rounds, size, base_seed, parallel, max_tries, deadline_secs),
        Command::Replay {
            certificate,
            inputs,
        } => replay(&certificate, inputs),
    }
}

fn search(
    rounds: u32,
    size: usize,
    base_seed: Option<i64>,
    parallel: bool,
    max_tries: Option<usize>,
    deadline_secs: Option<u64>,
) -> anyhow::Result<()> {
    if rounds == 0 {
        bail!("--rounds must be positive");
    }
    if size == 0 {
        bail!("--size must be positive");
    }

    let mut config = SearchConfig::for_size(size).parallel(parallel);
    if let Some(max_tries) = max_tries {
        config = config.with_max_tries(max_tries);
    }
    if let Some(seconds) = deadline_secs {
        config = config.with_deadline(Duration::from_secs(seconds));
    }

    let base_seed = base_seed.unwrap_or_else(rand::random);
    let (player, enemy) = standard_templates(size);
    let (session, certificate) = BattleSession::certify(config, rounds, player, enemy, base_seed)
        .context("seed search did not certify a fair game")?;

    println!("certified seed: {}", session.seed());
    println!("battle rounds:  {}", certificate.battle_rounds());
    println!("winning path:   {}", format_levels(certificate.winning_path()));
    println!("losing path:    {}", format_levels(certificate.losing_path()));
    println!("certificate:    {}", transfer::encode(&certificate));
    Ok(())
}

fn replay(certificate: &str, inputs: Option<Vec<u8>>) -> anyhow::Result<()> {
    let certificate: SeedCertificate =
        transfer::decode(certificate).context("could not decode the certificate string")?;
    let levels = inputs.unwrap_or_else(|| certificate.winning_path().to_vec());
    if let Some(&level) = levels.iter().find(|&&level| level >= INPUT_LEVELS) {
        bail!("input level {level} is outside the 0-{} grid", INPUT_LEVELS - 1);
    }

    let (player, enemy) = standard_templates(certificate.rule().size());
    let mut session = BattleSession::from_certificate(player, enemy, &certificate);

    println!(
        "replaying seed {} over {} rounds against {}",
        session.seed(),
        certificate.battle_rounds(),
        session.enemy_name()
    );

    let mut verdict = None;
    for &level in &levels {
        let outcome = session.resolve_round(level_to_input(level));
        println!(
            "round {:>2}: input {} -> outcome {:+.6} ({})",
            session.rounds_played(),
            level,
            outcome.outcome,
            if outcome.player_won { "win" } else { "loss" }
        );
        verdict = Some(outcome);
    }

    match verdict {
        Some(outcome) if outcome.player_won => println!("final verdict: player wins"),
        Some(_) => println!("final verdict: player loses"),
        None => println!("no rounds played"),
    }
    Ok(())
}

fn format_levels(levels: &[u8]) -> String {
    levels
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
