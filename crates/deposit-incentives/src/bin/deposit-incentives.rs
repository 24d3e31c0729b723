// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bigdecimal::BigDecimal;
use clap::{Args, Parser, Subcommand, ValueEnum};
use deposit_incentives::{
    config::files, output, run_deposit_replay, run_staking_replay, RecipientList, RewardLedger,
    RewardsConfig, DEPOSIT_INCENTIVES_APRIL_JULY, STAKING_INCENTIVES,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay the collateral deposit streams and write the reward ledger.
    Calculate(ReplayArgs),
    /// Compare a persisted ledger's total against the campaign's reward supply.
    Verify {
        #[clap(flatten)]
        ledger: LedgerArgs,
        /// Campaign whose reward supply the ledger is checked against.
        #[clap(long, value_enum, default_value = "deposit")]
        campaign: Campaign,
        #[clap(long, env = "INCENTIVES_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Write the airdrop recipient list for a persisted ledger.
    Recipients {
        #[clap(flatten)]
        ledger: LedgerArgs,
        /// Output path. Defaults to recipientList.json next to the ledger.
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Replay the governance token transfers and write the staking reward ledger.
    Staking(ReplayArgs),
}

#[derive(Args, Debug, Clone)]
struct ReplayArgs {
    /// Directory holding the queried event files.
    #[clap(short, long, env = "INCENTIVES_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,
    /// TOML file overriding the campaign's blocks or reward supply.
    #[clap(long, env = "INCENTIVES_CONFIG")]
    config: Option<PathBuf>,
    /// Ledger output path. Defaults to userTotalRewardAmounts.json in the data directory.
    #[clap(long)]
    ledger_out: Option<PathBuf>,
    /// Recipient list output path. Defaults to recipientList.json in the data directory.
    #[clap(long)]
    recipients_out: Option<PathBuf>,
    /// Only write the ledger.
    #[clap(long)]
    skip_recipients: bool,
    /// Blocks between progress logs. Zero disables them.
    #[clap(long, default_value = "10000")]
    progress_interval: u64,
}

#[derive(Args, Debug, Clone)]
struct LedgerArgs {
    /// Path to a persisted ledger.
    #[clap(long, default_value = files::USER_TOTAL_REWARD_AMOUNTS)]
    ledger: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Campaign {
    Deposit,
    Staking,
}

impl Campaign {
    fn preset(self) -> RewardsConfig {
        match self {
            Campaign::Deposit => DEPOSIT_INCENTIVES_APRIL_JULY,
            Campaign::Staking => STAKING_INCENTIVES,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment variables from {:?}", path),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => bail!("failed to load .env file: {}", e),
    }

    let args = MainArgs::parse();
    run(&args)
}

fn run(args: &MainArgs) -> Result<()> {
    match &args.command {
        Command::Calculate(replay) => replay_campaign(Campaign::Deposit, replay),
        Command::Staking(replay) => replay_campaign(Campaign::Staking, replay),
        Command::Verify { ledger, campaign, config } => {
            let config = campaign.preset().load(config.as_deref())?;
            verify(&ledger.ledger, &config)
        }
        Command::Recipients { ledger, out } => {
            let out = out.clone().unwrap_or_else(|| sibling(&ledger.ledger, files::RECIPIENT_LIST));
            write_recipients(&read_ledger(&ledger.ledger)?, &out)
        }
    }
}

fn replay_campaign(campaign: Campaign, args: &ReplayArgs) -> Result<()> {
    let config = campaign.preset().load(args.config.as_deref())?;
    let (ledger, stats) = match campaign {
        Campaign::Deposit => run_deposit_replay(&args.data_dir, config, args.progress_interval),
        Campaign::Staking => run_staking_replay(&args.data_dir, config, args.progress_interval),
    }
    .with_context(|| format!("{campaign:?} replay over {} failed", args.data_dir.display()))?;
    tracing::debug!("{campaign:?} replay stats: {stats}");

    let ledger_out = args
        .ledger_out
        .clone()
        .unwrap_or_else(|| args.data_dir.join(files::USER_TOTAL_REWARD_AMOUNTS));
    let mut staged = vec![output::stage_json(&ledger_out, &ledger.to_persisted())?];
    if !args.skip_recipients {
        let out = args
            .recipients_out
            .clone()
            .unwrap_or_else(|| args.data_dir.join(files::RECIPIENT_LIST));
        let list = RecipientList::from_ledger(&ledger);
        staged.push(output::stage_json(&out, &list)?);
        tracing::info!("Generated {} recipients", list.len());
    }
    output::commit_all(staged)?;
    report(&ledger, &config);
    Ok(())
}

fn read_ledger(path: &Path) -> Result<RewardLedger> {
    RewardLedger::read(path).with_context(|| format!("failed to read ledger {}", path.display()))
}

fn verify(path: &Path, config: &RewardsConfig) -> Result<()> {
    report(&read_ledger(path)?, config);
    Ok(())
}

fn report(ledger: &RewardLedger, config: &RewardsConfig) {
    let summary = ledger.verify(config.total_rewards);
    // Persisted totals are truncated, so only a visible overshoot is suspicious.
    let tolerance = BigDecimal::new(1.into(), 9);
    if summary.within_supply(&tolerance) {
        tracing::info!("Reward totals: {summary}");
    } else {
        tracing::warn!("Reward totals exceed the configured supply: {summary}");
    }
}

fn write_recipients(ledger: &RewardLedger, out: &Path) -> Result<()> {
    let list = RecipientList::from_ledger(ledger);
    list.write(out)?;
    tracing::info!("Generated {} recipients", list.len());
    Ok(())
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    path.parent().map(|dir| dir.join(name)).unwrap_or_else(|| PathBuf::from(name))
}
