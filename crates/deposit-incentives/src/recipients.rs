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

//! Airdrop recipient list derived from a [RewardLedger].

use std::path::Path;

use alloy_primitives::Address;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::{errors::IncentivesError, ledger::RewardLedger, output::write_json_atomic};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientInfo {
    pub user_address: String,
    pub recipient_id: u64,
    pub is_recipient: bool,
    /// Whole reward units, truncated toward zero.
    pub airdrop_amount: String,
    pub deployed_lockup_contract_address: String,
}

impl RecipientInfo {
    fn new(user: &Address, total: &BigDecimal) -> Self {
        Self {
            user_address: user.to_checksum(None),
            recipient_id: 0,
            is_recipient: true,
            airdrop_amount: integer_part(total),
            deployed_lockup_contract_address: Address::ZERO.to_checksum(None),
        }
    }
}

fn integer_part(value: &BigDecimal) -> String {
    let (digits, _) = value.with_scale(0).into_bigint_and_exponent();
    digits.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientList {
    pub recipients: Vec<RecipientInfo>,
}

impl RecipientList {
    /// One record per ledger entry in address order, zero totals included.
    pub fn from_ledger(ledger: &RewardLedger) -> Self {
        let recipients =
            ledger.iter().map(|(user, total)| RecipientInfo::new(user, total)).collect();
        Self { recipients }
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn write(&self, path: &Path) -> Result<(), IncentivesError> {
        write_json_atomic(path, self)
    }
}
