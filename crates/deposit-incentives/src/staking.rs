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

//! Governance token holder rewards.
//!
//! Replays the token's `Transfer` stream block by block and pays each holder their share of the
//! circulating supply, on the same schedule and ledger as the deposit replay.

use std::{collections::BTreeMap, path::Path};

use alloy_primitives::{Address, U256};

use crate::{
    config::{files, RewardsConfig, DEFAULT_PROGRESS_INTERVAL},
    cursor::EventCursor,
    errors::IncentivesError,
    events::{read_transfer_events, TransferEvent},
    ledger::RewardLedger,
    replay::{log_progress, ReplayPhase, ReplayStats},
    rewards::{u256_to_decimal, RewardEngine},
};

/// Token balances per holder and the circulating supply.
///
/// The zero address is never a holder; transfers from it mint and transfers to it burn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolderBalances {
    balances: BTreeMap<Address, U256>,
    total_supply: U256,
}

impl HolderBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, holder: &Address) -> U256 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter()
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Applies one transfer. Both parties are tracked from their first transfer on.
    pub fn apply(&mut self, event: &TransferEvent) -> Result<(), IncentivesError> {
        let TransferEvent { block, from, to, amount } = *event;
        match (from.is_zero(), to.is_zero()) {
            (true, true) => {
                tracing::warn!("block {block}: ignoring transfer from and to the zero address");
            }
            (true, false) => {
                self.total_supply = self.total_supply.saturating_add(amount);
                self.credit(to, amount);
            }
            (false, true) => {
                self.debit(from, amount, block)?;
                self.total_supply = self
                    .total_supply
                    .checked_sub(amount)
                    .ok_or(IncentivesError::BalanceUnderflow { address: Address::ZERO, block })?;
            }
            (false, false) => {
                self.debit(from, amount, block)?;
                self.credit(to, amount);
            }
        }
        Ok(())
    }

    fn credit(&mut self, holder: Address, amount: U256) {
        let balance = self.balances.entry(holder).or_default();
        *balance = balance.saturating_add(amount);
    }

    fn debit(&mut self, holder: Address, amount: U256, block: u64) -> Result<(), IncentivesError> {
        let balance = self.balances.entry(holder).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or(IncentivesError::BalanceUnderflow { address: holder, block })?;
        Ok(())
    }
}

/// Replays a token transfer stream into a [RewardLedger].
#[derive(Debug)]
pub struct StakingDriver {
    config: RewardsConfig,
    engine: RewardEngine,
    transfers: EventCursor<TransferEvent>,
    holders: HolderBalances,
    ledger: RewardLedger,
    phase: ReplayPhase,
    stats: ReplayStats,
    progress_interval: u64,
}

impl StakingDriver {
    pub fn new(
        config: RewardsConfig,
        transfers: Vec<TransferEvent>,
    ) -> Result<Self, IncentivesError> {
        config.validate()?;
        Ok(Self {
            engine: RewardEngine::new(config.schedule()),
            config,
            transfers: EventCursor::new(transfers),
            holders: HolderBalances::new(),
            ledger: RewardLedger::new(),
            phase: ReplayPhase::PreInit,
            stats: ReplayStats::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn holders(&self) -> &HolderBalances {
        &self.holders
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    /// Processes the next block. Returns the block processed, or `None` if the run is done.
    pub fn step(&mut self) -> Result<Option<u64>, IncentivesError> {
        let Some(block) = self.phase.next_block(self.config.initial_block) else {
            return Ok(None);
        };
        if self.phase == ReplayPhase::PreInit {
            let early = self.transfers.pending_before(block);
            if early > 0 {
                tracing::warn!(
                    "{early} transfers are dated before the initial block {block}; \
                     applying them at the initial block"
                );
            }
            self.stats.early_events = early as u64;
        }

        let due = self.transfers.due_at(block);
        self.stats.transfer_events += due.len() as u64;
        for event in due {
            self.holders.apply(event)?;
        }

        if self.engine.schedule().is_rewarded(block) {
            self.credit_block(block);
        }

        self.stats.blocks += 1;
        log_progress(
            self.progress_interval,
            self.config.initial_block,
            block,
            self.holders.holder_count(),
        );
        self.phase = ReplayPhase::after(block, self.config.reward_end_block);
        Ok(Some(block))
    }

    /// Replays every remaining block. A balance underflow aborts the run.
    pub fn run(mut self) -> Result<(RewardLedger, ReplayStats), IncentivesError> {
        tracing::info!(
            "Replaying token transfers from block {} to {} (rewards from block {})",
            self.config.initial_block,
            self.config.reward_end_block,
            self.config.reward_start_block
        );
        while self.step()?.is_some() {}

        self.stats.users = self.holders.holder_count();
        tracing::info!("Staking replay done. {}", self.stats);
        Ok((self.ledger, self.stats))
    }

    fn credit_block(&mut self, block: u64) {
        self.stats.rewarded_blocks += 1;
        let supply = self.holders.total_supply();
        if supply.is_zero() {
            tracing::trace!("block {block}: no tokens in circulation");
            return;
        }

        let supply = u256_to_decimal(supply);
        for (holder, balance) in self.holders.holders() {
            // Balances never exceed the supply, so the pool cannot be empty here.
            match self.engine.share_of_block(&u256_to_decimal(*balance), &supply) {
                Ok(reward) => self.ledger.credit(*holder, reward),
                Err(e) => {
                    tracing::warn!("block {block}: skipping {holder}: {e}");
                    self.stats.empty_pool_skips += 1;
                }
            }
        }
    }
}

/// Loads the transfer stream from `data_dir` and replays it under `config`.
pub fn run_staking_replay(
    data_dir: &Path,
    config: RewardsConfig,
    progress_interval: u64,
) -> Result<(RewardLedger, ReplayStats), IncentivesError> {
    let transfers = read_transfer_events(&data_dir.join(files::GOV_TOKEN_TRANSFERS))?;
    StakingDriver::new(config, transfers)?.with_progress_interval(progress_interval).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");
    const BOB: Address = address!("0x00000000000000000000000000000000000000b2");

    fn transfer(block: u64, from: Address, to: Address, amount: u64) -> TransferEvent {
        TransferEvent { block, from, to, amount: U256::from(amount) }
    }

    fn config(initial: u64, start: u64, end: u64, total: u64) -> RewardsConfig {
        RewardsConfig {
            initial_block: initial,
            reward_start_block: start,
            reward_end_block: end,
            total_rewards: U256::from(total),
        }
    }

    fn run(config: RewardsConfig, transfers: Vec<TransferEvent>) -> RewardLedger {
        StakingDriver::new(config, transfers)
            .unwrap()
            .with_progress_interval(0)
            .run()
            .unwrap()
            .0
    }

    #[test]
    fn test_mint_burn_and_transfer() {
        let mut holders = HolderBalances::new();
        holders.apply(&transfer(1, Address::ZERO, ALICE, 100)).unwrap();
        holders.apply(&transfer(2, ALICE, BOB, 30)).unwrap();
        holders.apply(&transfer(3, BOB, Address::ZERO, 10)).unwrap();

        assert_eq!(holders.balance_of(&ALICE), U256::from(70));
        assert_eq!(holders.balance_of(&BOB), U256::from(20));
        assert_eq!(holders.total_supply(), U256::from(90));
        assert_eq!(holders.holder_count(), 2);
    }

    #[test]
    fn test_transfer_to_new_holder_tracks_both_parties() {
        let mut holders = HolderBalances::new();
        holders.apply(&transfer(1, Address::ZERO, ALICE, 5)).unwrap();
        holders.apply(&transfer(1, ALICE, BOB, 5)).unwrap();
        assert_eq!(holders.balance_of(&ALICE), U256::ZERO);
        assert_eq!(holders.balance_of(&BOB), U256::from(5));
        assert_eq!(holders.holders().count(), 2);
    }

    #[test]
    fn test_underflow_is_fatal() {
        let mut holders = HolderBalances::new();
        holders.apply(&transfer(1, Address::ZERO, ALICE, 10)).unwrap();
        let err = holders.apply(&transfer(7, ALICE, BOB, 11)).unwrap_err();
        assert!(matches!(
            err,
            IncentivesError::BalanceUnderflow { address, block: 7 } if address == ALICE
        ));

        let result = StakingDriver::new(config(1, 1, 2, 10), vec![transfer(2, BOB, ALICE, 1)])
            .unwrap()
            .run();
        assert!(matches!(result, Err(IncentivesError::BalanceUnderflow { .. })));
    }

    #[test]
    fn test_rewards_follow_balance_share() {
        let ledger = run(
            config(1, 2, 3, 100),
            vec![transfer(1, Address::ZERO, ALICE, 100), transfer(2, ALICE, BOB, 25)],
        );
        assert_eq!(ledger.get(&ALICE), Some(&BigDecimal::from(75)));
        assert_eq!(ledger.get(&BOB), Some(&BigDecimal::from(25)));
    }

    #[test]
    fn test_burn_shrinks_supply() {
        let ledger = run(
            config(1, 2, 2, 60),
            vec![
                transfer(1, Address::ZERO, ALICE, 100),
                transfer(1, Address::ZERO, BOB, 100),
                transfer(2, BOB, Address::ZERO, 75),
            ],
        );
        assert_eq!(ledger.get(&ALICE), Some(&BigDecimal::from(48)));
        assert_eq!(ledger.get(&BOB), Some(&BigDecimal::from(12)));
    }

    #[test]
    fn test_shares_are_exact_not_floored() {
        let ledger = run(
            config(1, 1, 1, 100),
            vec![transfer(1, Address::ZERO, ALICE, 1), transfer(1, Address::ZERO, BOB, 2)],
        );
        // Integer share math would floor Alice to 33 and Bob to 66, losing one unit per block.
        let alice = ledger.get(&ALICE).unwrap();
        assert!(*alice > BigDecimal::from(33));
        assert!(alice.with_scale(18).to_plain_string().starts_with("33.333333333333333333"));
        let diff = (ledger.total() - BigDecimal::from(100)).abs();
        assert!(diff < BigDecimal::from_str("1e-80").unwrap(), "{diff}");
    }

    #[test]
    fn test_zero_supply_pays_nothing() {
        let ledger = run(config(1, 1, 4, 400), vec![transfer(3, Address::ZERO, ALICE, 1)]);
        assert_eq!(ledger.get(&ALICE), Some(&BigDecimal::from(200)));
        assert_eq!(ledger.total(), BigDecimal::from_str("200").unwrap());
    }

    #[test]
    fn test_nothing_before_reward_start() {
        let mut driver = StakingDriver::new(
            config(1, 3, 3, 9),
            vec![transfer(1, Address::ZERO, ALICE, 1)],
        )
        .unwrap();
        assert_eq!(driver.step().unwrap(), Some(1));
        assert_eq!(driver.step().unwrap(), Some(2));
        assert!(driver.ledger().is_empty());
        assert_eq!(driver.step().unwrap(), Some(3));
        assert_eq!(driver.ledger().get(&ALICE), Some(&BigDecimal::from(9)));
        assert_eq!(driver.phase(), ReplayPhase::Done);
        assert_eq!(driver.step().unwrap(), None);
    }
}
