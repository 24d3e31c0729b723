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

//! Proportional per-block reward computation.
//!
//! A user's reward for a block is their share of the pool's USD value times the fixed emission per
//! block. All values are [BigDecimal]s; no floating point is involved at any step.

use alloy_primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::Zero;
use thiserror::Error;

use crate::{
    collateral::{CollateralKind, CollateralMap},
    errors::CodedError,
    impl_coded_debug,
};

/// USD values carry 18 decimals.
pub const USD_DECIMALS: u32 = 18;

#[derive(Error, PartialEq, Eq)]
pub enum RewardError {
    /// The user holds value but the tracked pool holds none.
    #[error("user holds collateral value but the pool total is zero")]
    EmptyPool,
}

impl_coded_debug!(RewardError);

impl CodedError for RewardError {
    fn code(&self) -> &str {
        match self {
            RewardError::EmptyPool => "[DI-RWD-001]",
        }
    }
}

/// Converts an on-chain integer to a [BigDecimal] with no fractional part.
pub fn u256_to_decimal(value: U256) -> BigDecimal {
    BigDecimal::new(u256_to_bigint(value), 0)
}

fn u256_to_bigint(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// USD value (18 decimals) of `amount` base units of `kind` at `price`.
///
/// Computes `amount * 10^18 * 10^decimals(kind) / price`. A zero amount is worth zero without
/// looking at the price. A zero price means no price has been seen yet for the kind, and its
/// value counts as zero.
pub fn usd_value(kind: CollateralKind, amount: U256, price: U256) -> BigDecimal {
    if amount.is_zero() || price.is_zero() {
        return BigDecimal::zero();
    }
    let scale = BigInt::from(10u8).pow(USD_DECIMALS + kind.decimals() as u32);
    let scaled = BigDecimal::new(u256_to_bigint(amount) * scale, 0);
    scaled / u256_to_decimal(price)
}

/// Sum of the USD values of `amounts` across every collateral.
pub fn total_usd_value(amounts: &CollateralMap<U256>, prices: &CollateralMap<U256>) -> BigDecimal {
    amounts
        .iter()
        .map(|(kind, amount)| usd_value(kind, *amount, prices[kind]))
        .fold(BigDecimal::zero(), |acc, value| acc + value)
}

/// The inclusive block range that earns rewards and the supply spread across it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSchedule {
    pub reward_start_block: u64,
    /// Inclusive.
    pub reward_end_block: u64,
    /// Total rewards, in base units.
    pub total_rewards: U256,
}

impl RewardSchedule {
    /// Number of blocks in the rewarded range.
    pub fn rewarded_blocks(&self) -> u64 {
        self.reward_end_block.saturating_sub(self.reward_start_block) + 1
    }

    pub fn is_rewarded(&self, block: u64) -> bool {
        (self.reward_start_block..=self.reward_end_block).contains(&block)
    }

    /// Total rewards divided by the number of rewarded blocks.
    pub fn reward_per_block(&self) -> BigDecimal {
        u256_to_decimal(self.total_rewards) / BigDecimal::from(self.rewarded_blocks())
    }
}

/// Computes per-user, per-block rewards against a fixed [RewardSchedule].
#[derive(Debug, Clone)]
pub struct RewardEngine {
    schedule: RewardSchedule,
    reward_per_block: BigDecimal,
}

impl RewardEngine {
    pub fn new(schedule: RewardSchedule) -> Self {
        let reward_per_block = schedule.reward_per_block();
        Self { schedule, reward_per_block }
    }

    pub fn schedule(&self) -> &RewardSchedule {
        &self.schedule
    }

    pub fn reward_per_block(&self) -> &BigDecimal {
        &self.reward_per_block
    }

    /// `part / whole` of one block's emission. A zero part earns zero; a zero whole with a
    /// non-zero part is an [RewardError::EmptyPool].
    pub fn share_of_block(
        &self,
        part: &BigDecimal,
        whole: &BigDecimal,
    ) -> Result<BigDecimal, RewardError> {
        if part.is_zero() {
            return Ok(BigDecimal::zero());
        }
        if whole.is_zero() {
            return Err(RewardError::EmptyPool);
        }
        Ok(part / whole * &self.reward_per_block)
    }

    /// Reward for a user whose pool's USD value has already been computed for this block.
    pub fn reward_for_user(
        &self,
        balances: &CollateralMap<U256>,
        prices: &CollateralMap<U256>,
        pool_value: &BigDecimal,
    ) -> Result<BigDecimal, RewardError> {
        let user_value = total_usd_value(balances, prices);
        self.share_of_block(&user_value, pool_value)
    }

    /// Reward for one user at one block, given that block's final prices and pool totals.
    ///
    /// The pool value is only computed when the user holds something.
    pub fn reward_for_user_at_block(
        &self,
        balances: &CollateralMap<U256>,
        prices: &CollateralMap<U256>,
        pool_totals: &CollateralMap<U256>,
    ) -> Result<BigDecimal, RewardError> {
        let user_value = total_usd_value(balances, prices);
        if user_value.is_zero() {
            return Ok(BigDecimal::zero());
        }
        let pool_value = total_usd_value(pool_totals, prices);
        self.share_of_block(&user_value, &pool_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    const ONE_USD_PRICE: u128 = 1_000_000_000_000_000_000;

    fn engine() -> RewardEngine {
        RewardEngine::new(RewardSchedule {
            reward_start_block: 100,
            reward_end_block: 199,
            total_rewards: U256::from(1_000_000u64),
        })
    }

    fn prices(price: u128) -> CollateralMap<U256> {
        CollateralMap::from_fn(|_| U256::from(price))
    }

    fn only(kind: CollateralKind, amount: u64) -> CollateralMap<U256> {
        let mut map = CollateralMap::default();
        map[kind] = U256::from(amount);
        map
    }

    #[test]
    fn test_reward_per_block() {
        let engine = engine();
        assert_eq!(engine.schedule().rewarded_blocks(), 100);
        assert_eq!(engine.reward_per_block(), &BigDecimal::from(10_000));
    }

    #[test]
    fn test_inclusive_range() {
        let schedule = engine().schedule().clone();
        assert!(!schedule.is_rewarded(99));
        assert!(schedule.is_rewarded(100));
        assert!(schedule.is_rewarded(199));
        assert!(!schedule.is_rewarded(200));
    }

    #[test]
    fn test_usd_value_precisions() {
        // 1 USDC at $1.00: 10^6 * 10^18 * 10^6 / 10^18.
        let value =
            usd_value(CollateralKind::USDC, U256::from(1_000_000u64), U256::from(ONE_USD_PRICE));
        assert_eq!(value, BigDecimal::from(1_000_000_000_000u64));

        // 1 WBTC at $2.00: 10^8 * 10^18 * 10^8 / (2 * 10^18).
        let price = U256::from(2 * ONE_USD_PRICE);
        let value = usd_value(CollateralKind::WBTC, U256::from(100_000_000u64), price);
        assert_eq!(value, BigDecimal::from(5_000_000_000_000_000u64));
    }

    #[test]
    fn test_usd_value_zero_amount_and_missing_price() {
        assert!(usd_value(CollateralKind::DAI, U256::ZERO, U256::from(ONE_USD_PRICE)).is_zero());
        assert!(usd_value(CollateralKind::DAI, U256::from(5), U256::ZERO).is_zero());
    }

    #[test]
    fn test_usd_value_non_terminating_division() {
        // 1 base unit of USDT priced at 3: 10^24 / 3.
        let value = usd_value(CollateralKind::USDT, U256::from(1), U256::from(3));
        let tripled = value * BigDecimal::from(3);
        let diff = (tripled - BigDecimal::from_str("1e24").unwrap()).abs();
        assert!(diff < BigDecimal::from_str("1e-60").unwrap(), "{diff}");
    }

    #[test]
    fn test_full_share_earns_whole_block() {
        let engine = engine();
        let pool = only(CollateralKind::USDC, 1_000_000);
        let reward = engine
            .reward_for_user_at_block(&pool, &prices(ONE_USD_PRICE), &pool)
            .unwrap();
        assert_eq!(&reward, engine.reward_per_block());
    }

    #[test]
    fn test_mixed_collateral_share() {
        let engine = engine();
        let mut prices = prices(ONE_USD_PRICE);
        prices[CollateralKind::DAI] = U256::from(10u64).pow(U256::from(24));
        // User value 10^12 (USDC). Pool value 10^12 (USDC) + 3 * 10^36 / 10^24 (DAI).
        let user = only(CollateralKind::USDC, 1_000_000);
        let mut pool = only(CollateralKind::USDC, 1_000_000);
        pool[CollateralKind::DAI] = U256::from(3);
        let reward = engine.reward_for_user_at_block(&user, &prices, &pool).unwrap();
        assert_eq!(reward, BigDecimal::from(2_500));
    }

    #[test]
    fn test_empty_pool() {
        let engine = engine();
        let user = only(CollateralKind::DOT, 10);
        let err = engine
            .reward_for_user_at_block(&user, &prices(ONE_USD_PRICE), &CollateralMap::default())
            .unwrap_err();
        assert_eq!(err, RewardError::EmptyPool);
        assert!(format!("{err:?}").starts_with("[DI-RWD-001]"));
    }

    #[test]
    fn test_unpriced_collateral_is_ignored() {
        let engine = engine();
        let mut prices = prices(ONE_USD_PRICE);
        prices[CollateralKind::WETH] = U256::ZERO;
        let mut user = only(CollateralKind::USDC, 1_000_000);
        user[CollateralKind::WETH] = U256::from(1_000u64);
        let mut pool = user.clone();
        pool[CollateralKind::USDC] = U256::from(2_000_000u64);
        let reward = engine.reward_for_user_at_block(&user, &prices, &pool).unwrap();
        assert_eq!(reward, BigDecimal::from(5_000));
    }

    fn balances(amounts: [u64; CollateralKind::COUNT]) -> CollateralMap<U256> {
        let mut map = CollateralMap::default();
        for (kind, amount) in CollateralKind::ALL.into_iter().zip(amounts) {
            map[kind] = U256::from(amount);
        }
        map
    }

    #[test]
    fn test_conservation_across_users() {
        let engine = engine();
        let prices = prices(1);
        // BUSD, DAI, DOT, USDC, USDT, WASTR, WBTC, WETH
        let users = [
            balances([7, 0, 11, 3, 0, 2, 5, 1]),
            balances([0, 4, 0, 9, 6, 0, 1, 13]),
            balances([1, 1, 2, 0, 17, 8, 0, 0]),
            balances([0, 0, 0, 0, 0, 0, 0, 0]),
        ];
        let pool = CollateralMap::from_fn(|kind| {
            users.iter().map(|user| user[kind]).fold(U256::ZERO, |acc, amount| acc + amount)
        });
        assert!(pool.values().all(|total| !total.is_zero()));

        let pool_value = total_usd_value(&pool, &prices);
        let rewards: Vec<_> = users
            .iter()
            .map(|user| engine.reward_for_user_at_block(user, &prices, &pool).unwrap())
            .collect();
        for (user, reward) in users.iter().zip(&rewards) {
            assert_eq!(reward, &engine.reward_for_user(user, &prices, &pool_value).unwrap());
        }
        assert!(rewards[3].is_zero());

        let total = rewards.into_iter().fold(BigDecimal::zero(), |acc, r| acc + r);
        let diff = (total - engine.reward_per_block()).abs();
        assert!(diff < BigDecimal::from_str("1e-80").unwrap(), "{diff}");
    }

    proptest! {
        #[test]
        fn prop_zero_balance_earns_zero(
            pool_amounts in prop::array::uniform8(any::<u64>()),
            price_values in prop::array::uniform8(any::<u64>()),
        ) {
            let engine = engine();
            let mut pool = CollateralMap::default();
            let mut prices = CollateralMap::default();
            for (i, kind) in CollateralKind::ALL.into_iter().enumerate() {
                pool[kind] = U256::from(pool_amounts[i]);
                prices[kind] = U256::from(price_values[i]);
            }
            let reward = engine
                .reward_for_user_at_block(&CollateralMap::default(), &prices, &pool)
                .unwrap();
            prop_assert!(reward.is_zero());
        }
    }
}
