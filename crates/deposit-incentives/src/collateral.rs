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

//! The closed set of collateral kinds accepted by the pool.
//!
//! Every kind has a fixed token precision. State that is tracked "per collateral" is held in a
//! [CollateralMap], a dense container indexed by [CollateralKind], so that summing over kinds can
//! never skip one.

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::errors::IncentivesError;

/// Collateral kinds supported by the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CollateralKind {
    BUSD,
    DAI,
    DOT,
    USDC,
    USDT,
    /// Wrapped ASTR
    WASTR,
    /// Wrapped BTC
    WBTC,
    /// Wrapped ETH
    WETH,
}

impl CollateralKind {
    /// Number of supported kinds.
    pub const COUNT: usize = 8;

    /// All kinds, in index order.
    pub const ALL: [CollateralKind; Self::COUNT] = [
        CollateralKind::BUSD,
        CollateralKind::DAI,
        CollateralKind::DOT,
        CollateralKind::USDC,
        CollateralKind::USDT,
        CollateralKind::WASTR,
        CollateralKind::WBTC,
        CollateralKind::WETH,
    ];

    /// Returns the number of decimal places of the token
    pub fn decimals(&self) -> u8 {
        match self {
            CollateralKind::BUSD => 18,
            CollateralKind::DAI => 18,
            CollateralKind::DOT => 10,
            CollateralKind::USDC => 6,
            CollateralKind::USDT => 6,
            CollateralKind::WASTR => 18,
            CollateralKind::WBTC => 8,
            CollateralKind::WETH => 18,
        }
    }

    /// Symbol used in file names and output.
    pub fn symbol(&self) -> &'static str {
        match self {
            CollateralKind::BUSD => "BUSD",
            CollateralKind::DAI => "DAI",
            CollateralKind::DOT => "DOT",
            CollateralKind::USDC => "USDC",
            CollateralKind::USDT => "USDT",
            CollateralKind::WASTR => "WASTR",
            CollateralKind::WBTC => "WBTC",
            CollateralKind::WETH => "WETH",
        }
    }

    /// Resolves an oracle pair such as `ETH/USD` to the collateral it prices.
    ///
    /// The oracle quotes the native assets, while the pool holds their wrapped tokens, so
    /// `ASTR`, `BTC` and `ETH` map to `WASTR`, `WBTC` and `WETH`. Every other base symbol must
    /// name a kind directly. The quote side is ignored.
    pub fn from_pair_symbol(pair: &str) -> Result<Self, IncentivesError> {
        let base = pair.split('/').next().unwrap_or(pair).trim();
        match base.to_uppercase().as_str() {
            "ASTR" => Ok(CollateralKind::WASTR),
            "BTC" => Ok(CollateralKind::WBTC),
            "ETH" => Ok(CollateralKind::WETH),
            _ => base.parse(),
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

impl FromStr for CollateralKind {
    type Err = IncentivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CollateralKind::ALL
            .into_iter()
            .find(|kind| kind.symbol() == upper)
            .ok_or_else(|| IncentivesError::UnknownCollateralKind(s.to_string()))
    }
}

impl fmt::Display for CollateralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A value for each [CollateralKind].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollateralMap<T>([T; CollateralKind::COUNT]);

impl<T> CollateralMap<T> {
    /// Builds a map by evaluating `f` for every kind.
    pub fn from_fn(mut f: impl FnMut(CollateralKind) -> T) -> Self {
        Self(CollateralKind::ALL.map(&mut f))
    }

    /// Iterates `(kind, value)` pairs in [CollateralKind::ALL] order.
    pub fn iter(&self) -> impl Iterator<Item = (CollateralKind, &T)> {
        CollateralKind::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T> Index<CollateralKind> for CollateralMap<T> {
    type Output = T;

    fn index(&self, kind: CollateralKind) -> &T {
        &self.0[kind.position()]
    }
}

impl<T> IndexMut<CollateralKind> for CollateralMap<T> {
    fn index_mut(&mut self, kind: CollateralKind) -> &mut T {
        &mut self.0[kind.position()]
    }
}
