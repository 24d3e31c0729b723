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

//! Error types shared by every stage of the reward computation.

use std::path::PathBuf;

use alloy_primitives::Address;
use thiserror::Error;

use crate::collateral::CollateralKind;

/// An error carrying a stable, greppable code alongside its message.
pub trait CodedError: std::error::Error {
    fn code(&self) -> &str;
}

/// Implements `Debug` as `<code> <message>` for a [CodedError].
#[macro_export]
macro_rules! impl_coded_debug {
    ($name:ident) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", $crate::errors::CodedError::code(self), self)
            }
        }
    };
}

/// Fatal errors. Any of these aborts the run before an output file is written.
#[derive(Error)]
pub enum IncentivesError {
    #[error("malformed source {source_name}: {reason}")]
    MalformedSource { source_name: String, reason: String },

    #[error("unknown collateral kind: {0}")]
    UnknownCollateralKind(String),

    #[error("source {source_name} is the {expected} module but a record names {found}")]
    CollateralMismatch { source_name: String, expected: CollateralKind, found: CollateralKind },

    #[error("balance of {address} would drop below zero at block {block}")]
    BalanceUnderflow { address: Address, block: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl_coded_debug!(IncentivesError);

impl CodedError for IncentivesError {
    fn code(&self) -> &str {
        match self {
            IncentivesError::MalformedSource { .. } => "[DI-SRC-001]",
            IncentivesError::UnknownCollateralKind(_) => "[DI-SRC-002]",
            IncentivesError::CollateralMismatch { .. } => "[DI-SRC-003]",
            IncentivesError::BalanceUnderflow { .. } => "[DI-STK-001]",
            IncentivesError::InvalidConfig(_) => "[DI-CFG-001]",
            IncentivesError::Io { .. } => "[DI-IO-001]",
            IncentivesError::Json { .. } => "[DI-IO-002]",
            IncentivesError::Toml { .. } => "[DI-CFG-002]",
        }
    }
}

impl IncentivesError {
    pub(crate) fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        IncentivesError::MalformedSource {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IncentivesError::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        IncentivesError::Json { path: path.into(), source }
    }

    /// Whether this error is one of the "malformed input" family.
    pub fn is_malformed_source(&self) -> bool {
        matches!(
            self,
            IncentivesError::MalformedSource { .. } | IncentivesError::CollateralMismatch { .. }
        )
    }
}
