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

//! Reward campaign configuration.
//!
//! Each campaign ships as a built-in preset. A TOML file can override individual values:
//!
//! ```toml
//! initial_block = 910000
//! reward_start_block = 912772
//! reward_end_block = 1530000
//! total_rewards = "60000000000000000000000000"
//! ```

use std::{fs, path::Path, str::FromStr};

use alloy_primitives::{uint, U256};
use serde::Deserialize;

use crate::{errors::IncentivesError, rewards::RewardSchedule};

/// Default input and output file names inside a data directory.
pub mod files {
    pub const COLLATERAL_PRICES: &str = "collateralPrices.json";
    pub const GOV_TOKEN_TRANSFERS: &str = "govTokenTransfers.json";
    pub const USER_TOTAL_REWARD_AMOUNTS: &str = "userTotalRewardAmounts.json";
    pub const RECIPIENT_LIST: &str = "recipientList.json";

    /// File holding the module stream for `kind`, e.g. `WASTR-module.json`.
    pub fn module_file(kind: crate::collateral::CollateralKind) -> String {
        format!("{kind}-module.json")
    }
}

/// Blocks between two progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardsConfig {
    /// First block replayed.
    pub initial_block: u64,
    pub reward_start_block: u64,
    /// Inclusive. Also the last block replayed.
    pub reward_end_block: u64,
    /// Total supply handed out over the rewarded range, in 18-decimal base units.
    pub total_rewards: U256,
}

/// April to July collateral deposit campaign.
pub const DEPOSIT_INCENTIVES_APRIL_JULY: RewardsConfig = RewardsConfig {
    initial_block: 910_000,
    reward_start_block: 912_772,
    reward_end_block: 1_530_000,
    total_rewards: uint!(60000000000000000000000000_U256),
};

/// Governance token holder campaign, starting from the token deployment block.
pub const STAKING_INCENTIVES: RewardsConfig = RewardsConfig {
    initial_block: 912_772,
    reward_start_block: 915_820,
    reward_end_block: 1_738_250,
    total_rewards: uint!(3333333333333333333333333_U256),
};

/// Optional values read from a TOML file. Missing keys keep the preset's value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub initial_block: Option<u64>,
    pub reward_start_block: Option<u64>,
    pub reward_end_block: Option<u64>,
    /// Decimal or `0x`-prefixed base units. A string since TOML integers stop at 64 bits.
    pub total_rewards: Option<String>,
}

impl ConfigOverrides {
    pub fn read(path: &Path) -> Result<Self, IncentivesError> {
        let contents = fs::read_to_string(path).map_err(|e| IncentivesError::io(path, e))?;
        toml::from_str(&contents)
            .map_err(|source| IncentivesError::Toml { path: path.to_path_buf(), source })
    }
}

impl RewardsConfig {
    /// Applies `overrides` on top of `self` and validates the result.
    pub fn with_overrides(self, overrides: ConfigOverrides) -> Result<Self, IncentivesError> {
        let total_rewards = match overrides.total_rewards {
            Some(raw) => U256::from_str(raw.trim()).map_err(|e| {
                IncentivesError::InvalidConfig(format!("total_rewards {raw:?}: {e}"))
            })?,
            None => self.total_rewards,
        };
        let config = Self {
            initial_block: overrides.initial_block.unwrap_or(self.initial_block),
            reward_start_block: overrides.reward_start_block.unwrap_or(self.reward_start_block),
            reward_end_block: overrides.reward_end_block.unwrap_or(self.reward_end_block),
            total_rewards,
        };
        config.validate()?;
        Ok(config)
    }

    /// `self`, or `self` overridden by the TOML file at `path` if one is given.
    pub fn load(self, path: Option<&Path>) -> Result<Self, IncentivesError> {
        match path {
            Some(path) => {
                let config = self.with_overrides(ConfigOverrides::read(path)?)?;
                tracing::info!("Loaded config overrides from {}", path.display());
                Ok(config)
            }
            None => {
                self.validate()?;
                Ok(self)
            }
        }
    }

    pub fn validate(&self) -> Result<(), IncentivesError> {
        if self.reward_start_block > self.reward_end_block {
            return Err(IncentivesError::InvalidConfig(format!(
                "reward_start_block {} is after reward_end_block {}",
                self.reward_start_block, self.reward_end_block
            )));
        }
        if self.initial_block > self.reward_start_block {
            return Err(IncentivesError::InvalidConfig(format!(
                "initial_block {} is after reward_start_block {}",
                self.initial_block, self.reward_start_block
            )));
        }
        if self.total_rewards.is_zero() {
            return Err(IncentivesError::InvalidConfig("total_rewards must be non-zero".into()));
        }
        Ok(())
    }

    pub fn schedule(&self) -> RewardSchedule {
        RewardSchedule {
            reward_start_block: self.reward_start_block,
            reward_end_block: self.reward_end_block,
            total_rewards: self.total_rewards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collateral::CollateralKind;
    use std::io::Write;

    #[test]
    fn test_presets_are_valid() {
        DEPOSIT_INCENTIVES_APRIL_JULY.validate().unwrap();
        STAKING_INCENTIVES.validate().unwrap();
        let ether = U256::from(10).pow(U256::from(18));
        assert_eq!(DEPOSIT_INCENTIVES_APRIL_JULY.total_rewards, U256::from(60_000_000) * ether);
        assert_eq!(DEPOSIT_INCENTIVES_APRIL_JULY.schedule().rewarded_blocks(), 617_229);
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        let mut config = DEPOSIT_INCENTIVES_APRIL_JULY;
        config.reward_end_block = config.reward_start_block - 1;
        assert!(matches!(config.validate(), Err(IncentivesError::InvalidConfig(_))));

        let mut config = DEPOSIT_INCENTIVES_APRIL_JULY;
        config.initial_block = config.reward_start_block + 1;
        assert!(matches!(config.validate(), Err(IncentivesError::InvalidConfig(_))));

        let mut config = DEPOSIT_INCENTIVES_APRIL_JULY;
        config.total_rewards = U256::ZERO;
        assert!(matches!(config.validate(), Err(IncentivesError::InvalidConfig(_))));
    }

    #[test]
    fn test_single_block_range_is_valid() {
        let config = RewardsConfig {
            initial_block: 5,
            reward_start_block: 5,
            reward_end_block: 5,
            total_rewards: U256::from(1),
        };
        config.validate().unwrap();
        assert_eq!(config.schedule().rewarded_blocks(), 1);
    }

    #[test]
    fn test_partial_overrides() {
        let overrides: ConfigOverrides =
            toml::from_str("reward_end_block = 920000\ntotal_rewards = \"0x64\"").unwrap();
        let config = DEPOSIT_INCENTIVES_APRIL_JULY.with_overrides(overrides).unwrap();
        assert_eq!(config.initial_block, DEPOSIT_INCENTIVES_APRIL_JULY.initial_block);
        assert_eq!(config.reward_end_block, 920_000);
        assert_eq!(config.total_rewards, U256::from(100));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "initial_block = 1\nreward_start_block = 2\nreward_end_block = 3").unwrap();
        let config = STAKING_INCENTIVES.load(Some(file.path())).unwrap();
        assert_eq!((config.initial_block, config.reward_start_block), (1, 2));
        assert_eq!(config.total_rewards, STAKING_INCENTIVES.total_rewards);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "reward_begin = 3").unwrap();
        assert!(matches!(
            STAKING_INCENTIVES.load(Some(bad.path())),
            Err(IncentivesError::Toml { .. })
        ));
    }

    #[test]
    fn test_bad_total_rewards() {
        let overrides =
            ConfigOverrides { total_rewards: Some("lots".into()), ..Default::default() };
        assert!(matches!(
            DEPOSIT_INCENTIVES_APRIL_JULY.with_overrides(overrides),
            Err(IncentivesError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_module_file_names() {
        assert_eq!(files::module_file(CollateralKind::WASTR), "WASTR-module.json");
        assert_eq!(files::module_file(CollateralKind::USDC), "USDC-module.json");
    }
}
