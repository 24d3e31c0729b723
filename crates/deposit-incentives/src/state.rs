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

//! Running pool state rebuilt from replayed events.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::{
    collateral::CollateralMap,
    events::{PoolBalanceEvent, PriceEvent},
};

/// Deposited balance of one user for every collateral.
pub type UserBalances = CollateralMap<U256>;

/// Snapshot of prices, pool totals and user balances at the current block.
///
/// Every update overwrites the previous value; nothing is accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolState {
    /// Latest price per collateral, 18 decimals. Zero until the first price event.
    pub prices: CollateralMap<U256>,
    /// Latest pool total per collateral.
    pub pool_totals: CollateralMap<U256>,
    /// Users seen in any balance event, with all their balances.
    pub users: BTreeMap<Address, UserBalances>,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_price(&mut self, event: &PriceEvent) {
        tracing::trace!("block {}: {} price = {}", event.block, event.kind, event.price);
        self.prices[event.kind] = event.price;
    }

    pub fn apply_pool_event(&mut self, event: &PoolBalanceEvent) {
        match event {
            PoolBalanceEvent::PoolTotal { block, kind, amount } => {
                tracing::trace!("block {block}: {kind} pool total = {amount}");
                self.pool_totals[*kind] = *amount;
            }
            PoolBalanceEvent::UserBalance { block, kind, user, amount } => {
                tracing::trace!("block {block}: {user} {kind} balance = {amount}");
                // First sight of a user starts every balance at zero.
                self.users.entry(*user).or_default()[*kind] = *amount;
            }
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collateral::CollateralKind;
    use alloy_primitives::address;
    use proptest::prelude::*;

    const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");

    #[test]
    fn test_new_user_starts_at_zero() {
        let mut state = PoolState::new();
        state.apply_pool_event(&PoolBalanceEvent::UserBalance {
            block: 1,
            kind: CollateralKind::WBTC,
            user: ALICE,
            amount: U256::from(5),
        });
        let balances = &state.users[&ALICE];
        for (kind, amount) in balances.iter() {
            let expected = if kind == CollateralKind::WBTC { U256::from(5) } else { U256::ZERO };
            assert_eq!(*amount, expected, "{kind}");
        }
        assert_eq!(state.user_count(), 1);
    }

    #[test]
    fn test_user_balance_overwrites() {
        let mut state = PoolState::new();
        for amount in [10u64, 3] {
            state.apply_pool_event(&PoolBalanceEvent::UserBalance {
                block: 1,
                kind: CollateralKind::DAI,
                user: ALICE,
                amount: U256::from(amount),
            });
        }
        assert_eq!(state.users[&ALICE][CollateralKind::DAI], U256::from(3));
    }

    #[test]
    fn test_pool_total_does_not_touch_users() {
        let mut state = PoolState::new();
        state.apply_pool_event(&PoolBalanceEvent::PoolTotal {
            block: 1,
            kind: CollateralKind::DOT,
            amount: U256::from(42),
        });
        assert_eq!(state.pool_totals[CollateralKind::DOT], U256::from(42));
        assert!(state.users.is_empty());
    }

    proptest! {
        #[test]
        fn prop_price_equals_last_update(prices in prop::collection::vec(any::<u64>(), 1..20)) {
            let mut state = PoolState::new();
            for price in &prices {
                state.apply_price(&PriceEvent {
                    block: 7,
                    kind: CollateralKind::USDT,
                    price: U256::from(*price),
                });
            }
            let last = U256::from(*prices.last().unwrap());
            prop_assert_eq!(state.prices[CollateralKind::USDT], last);
        }

        #[test]
        fn prop_pool_total_equals_last_update(
            amounts in prop::collection::vec(any::<u64>(), 1..20)
        ) {
            let mut state = PoolState::new();
            for amount in &amounts {
                state.apply_pool_event(&PoolBalanceEvent::PoolTotal {
                    block: 7,
                    kind: CollateralKind::WASTR,
                    amount: U256::from(*amount),
                });
            }
            prop_assert_eq!(
                state.pool_totals[CollateralKind::WASTR],
                U256::from(*amounts.last().unwrap())
            );
        }
    }
}
