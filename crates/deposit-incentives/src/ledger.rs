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

//! The per-user reward ledger and its persisted form.

use std::{collections::BTreeMap, fmt, fs, path::Path, str::FromStr};

use alloy_primitives::{Address, U256};
use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde_json::Value;

use crate::{errors::IncentivesError, output::write_json_atomic, rewards::u256_to_decimal};

/// Fractional digits kept when a ledger is persisted.
pub const PERSISTED_SCALE: i64 = 18;

/// Accumulated rewards per user.
///
/// Entries only grow. Keys are ordered, so iteration and the persisted file are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardLedger {
    totals: BTreeMap<Address, BigDecimal>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `user`'s total, starting from zero for a new user.
    pub fn credit(&mut self, user: Address, amount: BigDecimal) {
        let total = self.totals.entry(user).or_insert_with(BigDecimal::zero);
        *total += amount;
    }

    /// Makes sure `user` has an entry, even if it stays zero.
    pub fn touch(&mut self, user: Address) {
        self.totals.entry(user).or_insert_with(BigDecimal::zero);
    }

    pub fn get(&self, user: &Address) -> Option<&BigDecimal> {
        self.totals.get(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &BigDecimal)> {
        self.totals.iter()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Sum of every entry.
    pub fn total(&self) -> BigDecimal {
        self.totals.values().fold(BigDecimal::zero(), |acc, v| acc + v)
    }

    /// Compares the distributed total with the configured supply.
    pub fn verify(&self, total_rewards: U256) -> LedgerSummary {
        let expected = u256_to_decimal(total_rewards);
        let actual = self.total();
        let shortfall = &expected - &actual;
        LedgerSummary { recipients: self.len(), expected, actual, shortfall }
    }

    /// The persisted form: checksummed address to plain decimal string.
    pub fn to_persisted(&self) -> BTreeMap<String, String> {
        self.totals
            .iter()
            .map(|(user, total)| (user.to_checksum(None), format_persisted(total)))
            .collect()
    }

    /// Parses a persisted ledger. Amounts may be decimal strings or JSON numbers.
    pub fn from_json(source_name: &str, json: &str) -> Result<Self, IncentivesError> {
        let entries: BTreeMap<String, Value> = serde_json::from_str(json)
            .map_err(|e| IncentivesError::malformed(source_name, e.to_string()))?;

        let mut ledger = Self::new();
        for (user, amount) in entries {
            let address = Address::from_str(&user).map_err(|e| {
                IncentivesError::malformed(source_name, format!("invalid address {user:?}: {e}"))
            })?;
            let amount = match &amount {
                Value::String(s) => BigDecimal::from_str(s).ok(),
                Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
                _ => None,
            }
            .ok_or_else(|| {
                let reason = format!("invalid amount for {user}: {amount}");
                IncentivesError::malformed(source_name, reason)
            })?;
            ledger.credit(address, amount);
        }
        Ok(ledger)
    }

    pub fn read(path: &Path) -> Result<Self, IncentivesError> {
        let json = fs::read_to_string(path).map_err(|e| IncentivesError::io(path, e))?;
        Self::from_json(&path.display().to_string(), &json)
    }

    pub fn write(&self, path: &Path) -> Result<(), IncentivesError> {
        write_json_atomic(path, &self.to_persisted())
    }
}

fn format_persisted(total: &BigDecimal) -> String {
    total.with_scale(PERSISTED_SCALE).to_plain_string()
}

/// Outcome of comparing a ledger against the configured reward supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    pub recipients: usize,
    pub expected: BigDecimal,
    pub actual: BigDecimal,
    /// `expected - actual`. Positive when some rewarded blocks had no depositors.
    pub shortfall: BigDecimal,
}

impl LedgerSummary {
    /// The ledger never hands out more than the supply, up to `tolerance`.
    pub fn within_supply(&self, tolerance: &BigDecimal) -> bool {
        -&self.shortfall <= *tolerance
    }
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recipients: {}, expected: {}, actual: {}, shortfall: {}",
            self.recipients,
            format_persisted(&self.expected),
            format_persisted(&self.actual),
            format_persisted(&self.shortfall)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");
    const BOB: Address = address!("0x00000000000000000000000000000000000000b2");

    #[test]
    fn test_credit_accumulates() {
        let mut ledger = RewardLedger::new();
        ledger.credit(ALICE, BigDecimal::from(2));
        ledger.credit(ALICE, BigDecimal::from_str("0.5").unwrap());
        ledger.touch(BOB);
        assert_eq!(ledger.get(&ALICE), Some(&BigDecimal::from_str("2.5").unwrap()));
        assert_eq!(ledger.get(&BOB), Some(&BigDecimal::zero()));
        assert_eq!(ledger.total(), BigDecimal::from_str("2.5").unwrap());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_persisted_form_truncates() {
        let mut ledger = RewardLedger::new();
        ledger.credit(ALICE, BigDecimal::from(10) / BigDecimal::from(3));
        let persisted = ledger.to_persisted();
        assert_eq!(
            persisted.get(&ALICE.to_checksum(None)).map(String::as_str),
            Some("3.333333333333333333")
        );
    }

    #[test]
    fn test_persisted_roundtrip() {
        let mut ledger = RewardLedger::new();
        ledger.credit(ALICE, BigDecimal::from_str("12345678901234567890.25").unwrap());
        ledger.credit(BOB, BigDecimal::zero());
        let json = serde_json::to_string(&ledger.to_persisted()).unwrap();
        assert_eq!(RewardLedger::from_json("ledger", &json).unwrap(), ledger);
    }

    #[test]
    fn test_from_json_accepts_numbers() {
        let json = r#"{"0x00000000000000000000000000000000000000a1": 1.5e3}"#;
        let ledger = RewardLedger::from_json("ledger", json).unwrap();
        assert_eq!(ledger.get(&ALICE), Some(&BigDecimal::from(1500)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let bad_address = r#"{"alice": "1"}"#;
        assert!(RewardLedger::from_json("ledger", bad_address).unwrap_err().is_malformed_source());
        let bad_amount = r#"{"0x00000000000000000000000000000000000000a1": "lots"}"#;
        assert!(RewardLedger::from_json("ledger", bad_amount).unwrap_err().is_malformed_source());
    }

    #[test]
    fn test_verify() {
        let mut ledger = RewardLedger::new();
        ledger.credit(ALICE, BigDecimal::from(60));
        ledger.credit(BOB, BigDecimal::from(30));
        let summary = ledger.verify(U256::from(100));
        assert_eq!(summary.recipients, 2);
        assert_eq!(summary.shortfall, BigDecimal::from(10));
        assert!(summary.within_supply(&BigDecimal::zero()));

        ledger.credit(BOB, BigDecimal::from(11));
        assert!(!ledger.verify(U256::from(100)).within_supply(&BigDecimal::zero()));
    }
}
