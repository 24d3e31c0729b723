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

//! Block-by-block replay of the deposit streams into a [RewardLedger].

use std::{
    fmt,
    path::{Path, PathBuf},
};

use num_traits::Zero;

use crate::{
    collateral::{CollateralKind, CollateralMap},
    config::{files, RewardsConfig, DEFAULT_PROGRESS_INTERVAL},
    cursor::CursorSet,
    errors::IncentivesError,
    events::{read_module_events, read_price_events, PoolBalanceEvent, PriceEvent},
    ledger::RewardLedger,
    rewards::{total_usd_value, RewardEngine, RewardError},
    state::PoolState,
};

/// Where a driver is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    /// No block processed yet.
    PreInit,
    /// `block` is the last block fully processed.
    Replaying { block: u64 },
    /// The reward end block has been processed.
    Done,
}

impl ReplayPhase {
    /// The block to process next, or `None` once done.
    pub(crate) fn next_block(&self, initial_block: u64) -> Option<u64> {
        match self {
            ReplayPhase::PreInit => Some(initial_block),
            ReplayPhase::Replaying { block } => Some(block + 1),
            ReplayPhase::Done => None,
        }
    }

    pub(crate) fn after(block: u64, reward_end_block: u64) -> Self {
        if block >= reward_end_block {
            ReplayPhase::Done
        } else {
            ReplayPhase::Replaying { block }
        }
    }
}

/// Counters collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub blocks: u64,
    pub price_events: u64,
    pub pool_events: u64,
    pub transfer_events: u64,
    pub rewarded_blocks: u64,
    /// User-blocks skipped because the user held value while the pool held none.
    pub empty_pool_skips: u64,
    /// Events dated before the initial block, applied at the initial block.
    pub early_events: u64,
    pub users: usize,
}

impl fmt::Display for ReplayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blocks: {}, rewarded blocks: {}, price events: {}, pool events: {}, \
             transfer events: {}, early events: {}, empty pool skips: {}, users: {}",
            self.blocks,
            self.rewarded_blocks,
            self.price_events,
            self.pool_events,
            self.transfer_events,
            self.early_events,
            self.empty_pool_skips,
            self.users
        )
    }
}

pub(crate) fn log_progress(interval: u64, initial_block: u64, block: u64, users: usize) {
    if interval != 0 && (block - initial_block) % interval == 0 {
        tracing::info!("Replayed up to block {block}, tracking {users} users");
    }
}

/// Replays price and collateral module streams one block at a time.
///
/// Each block applies its price events first, then each module's events, and only then credits
/// rewards, so a block's reward always sees the block's final state.
#[derive(Debug)]
pub struct ReplayDriver {
    config: RewardsConfig,
    engine: RewardEngine,
    cursors: CursorSet,
    state: PoolState,
    ledger: RewardLedger,
    phase: ReplayPhase,
    stats: ReplayStats,
    progress_interval: u64,
}

impl ReplayDriver {
    pub fn new(
        config: RewardsConfig,
        prices: Vec<PriceEvent>,
        modules: CollateralMap<Vec<PoolBalanceEvent>>,
    ) -> Result<Self, IncentivesError> {
        config.validate()?;
        Ok(Self {
            engine: RewardEngine::new(config.schedule()),
            config,
            cursors: CursorSet::new(prices, modules),
            state: PoolState::new(),
            ledger: RewardLedger::new(),
            phase: ReplayPhase::PreInit,
            stats: ReplayStats::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }

    /// Log progress every `interval` blocks. Zero disables progress logs.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    /// Processes the next block. Returns the block processed, or `None` if the run is done.
    pub fn step(&mut self) -> Option<u64> {
        let block = self.phase.next_block(self.config.initial_block)?;
        if self.phase == ReplayPhase::PreInit {
            let early = self.cursors.pending_before(block);
            if early > 0 {
                tracing::warn!(
                    "{early} events are dated before the initial block {block}; \
                     applying them at the initial block"
                );
            }
            self.stats.early_events = early as u64;
        }

        self.apply_due_events(block);
        if self.engine.schedule().is_rewarded(block) {
            self.credit_block(block);
        }

        self.stats.blocks += 1;
        log_progress(
            self.progress_interval,
            self.config.initial_block,
            block,
            self.state.user_count(),
        );
        self.phase = ReplayPhase::after(block, self.config.reward_end_block);
        Some(block)
    }

    /// Replays every remaining block and returns the ledger.
    pub fn run(mut self) -> (RewardLedger, ReplayStats) {
        tracing::info!(
            "Replaying blocks {} to {} (rewards from block {})",
            self.config.initial_block,
            self.config.reward_end_block,
            self.config.reward_start_block
        );
        while self.step().is_some() {}

        self.stats.users = self.state.user_count();
        if !self.cursors.is_exhausted() {
            tracing::warn!(
                "Some events are dated after the reward end block {} and were ignored",
                self.config.reward_end_block
            );
        }
        tracing::info!("Replay done. {}", self.stats);
        (self.ledger, self.stats)
    }

    fn apply_due_events(&mut self, block: u64) {
        let prices = self.cursors.prices_due_at(block);
        self.stats.price_events += prices.len() as u64;
        for event in prices {
            self.state.apply_price(event);
        }

        for kind in CollateralKind::ALL {
            let events = self.cursors.module_due_at(kind, block);
            self.stats.pool_events += events.len() as u64;
            for event in events {
                self.state.apply_pool_event(event);
            }
        }
    }

    fn credit_block(&mut self, block: u64) {
        self.stats.rewarded_blocks += 1;
        if self.state.users.is_empty() {
            return;
        }

        let prices = &self.state.prices;
        let pool_value = total_usd_value(&self.state.pool_totals, prices);
        let mut skipped = 0u64;
        for (user, balances) in &self.state.users {
            match self.engine.reward_for_user(balances, prices, &pool_value) {
                Ok(reward) => self.ledger.credit(*user, reward),
                Err(RewardError::EmptyPool) => {
                    self.ledger.touch(*user);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            debug_assert!(pool_value.is_zero());
            tracing::warn!(
                "Block {block}: {skipped} users hold collateral value but the pool value is \
                 zero; no rewards credited for this block"
            );
            self.stats.empty_pool_skips += skipped;
        }
    }
}

/// Input files for a deposit replay.
#[derive(Debug, Clone)]
pub struct DepositInputs {
    pub prices: PathBuf,
    pub modules: CollateralMap<PathBuf>,
}

impl DepositInputs {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            prices: dir.join(files::COLLATERAL_PRICES),
            modules: CollateralMap::from_fn(|kind| dir.join(files::module_file(kind))),
        }
    }

    /// Reads every stream. Any malformed file fails the whole load.
    pub fn load(
        &self,
    ) -> Result<(Vec<PriceEvent>, CollateralMap<Vec<PoolBalanceEvent>>), IncentivesError> {
        let prices = read_price_events(&self.prices)?;
        let mut modules = CollateralMap::<Vec<PoolBalanceEvent>>::default();
        for kind in CollateralKind::ALL {
            modules[kind] = read_module_events(&self.modules[kind], kind)?;
        }
        Ok((prices, modules))
    }
}

/// Loads the deposit streams from `data_dir` and replays them under `config`.
pub fn run_deposit_replay(
    data_dir: &Path,
    config: RewardsConfig,
    progress_interval: u64,
) -> Result<(RewardLedger, ReplayStats), IncentivesError> {
    let (prices, modules) = DepositInputs::in_dir(data_dir).load()?;
    let driver = ReplayDriver::new(config, prices, modules)?;
    Ok(driver.with_progress_interval(progress_interval).run())
}
