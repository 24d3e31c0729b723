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

//! Deposit and staking incentive reward calculation.
//!
//! Rewards are computed by replaying on-chain event streams one block at a time. Every rewarded
//! block hands out a fixed emission, split between users in proportion to the USD value of their
//! collateral deposits (or, for the staking campaign, their governance token balance). The
//! resulting [RewardLedger] is persisted and turned into an airdrop [RecipientList].

pub mod collateral;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod output;
pub mod recipients;
pub mod replay;
pub mod rewards;
pub mod staking;
pub mod state;

pub use collateral::{CollateralKind, CollateralMap};
pub use config::{RewardsConfig, DEPOSIT_INCENTIVES_APRIL_JULY, STAKING_INCENTIVES};
pub use errors::{CodedError, IncentivesError};
pub use ledger::{LedgerSummary, RewardLedger};
pub use recipients::{RecipientInfo, RecipientList};
pub use replay::{run_deposit_replay, DepositInputs, ReplayDriver, ReplayPhase, ReplayStats};
pub use rewards::{RewardEngine, RewardSchedule};
pub use staking::{run_staking_replay, StakingDriver};
