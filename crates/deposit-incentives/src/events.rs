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

//! Loading of queried event sources.
//!
//! Each source is a JSON document whose `queriedState` array holds one record per on-chain event,
//! as written by the query scripts. Records are decoded into typed events and stably sorted by
//! block, so events sharing a block keep the order in which they were queried.

use std::{fs, path::Path, str::FromStr};

use alloy_primitives::{Address, U256};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{collateral::CollateralKind, cursor::BlockEvent, errors::IncentivesError};

/// Event name of a pool total update inside a collateral module source.
pub const POOL_TOTAL_EVENT: &str = "ActivePoolCOLBalanceUpdated";

/// Oracle prices carry 8 decimals; this scales them to 18.
const PRICE_SCALE_EXPONENT: u64 = 10;

/// A collateral price update, scaled to 18 decimals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEvent {
    pub block: u64,
    pub kind: CollateralKind,
    pub price: U256,
}

/// An update from one collateral module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolBalanceEvent {
    /// The pool now holds `amount` of `kind`.
    PoolTotal { block: u64, kind: CollateralKind, amount: U256 },
    /// `user` now has `amount` of `kind` deposited.
    UserBalance { block: u64, kind: CollateralKind, user: Address, amount: U256 },
}

impl PoolBalanceEvent {
    pub fn kind(&self) -> CollateralKind {
        match self {
            PoolBalanceEvent::PoolTotal { kind, .. } => *kind,
            PoolBalanceEvent::UserBalance { kind, .. } => *kind,
        }
    }
}

/// A governance token `Transfer`. Mints come from, and burns go to, the zero address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub block: u64,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

impl BlockEvent for PriceEvent {
    fn block(&self) -> u64 {
        self.block
    }
}

impl BlockEvent for PoolBalanceEvent {
    fn block(&self) -> u64 {
        match self {
            PoolBalanceEvent::PoolTotal { block, .. } => *block,
            PoolBalanceEvent::UserBalance { block, .. } => *block,
        }
    }
}

impl BlockEvent for TransferEvent {
    fn block(&self) -> u64 {
        self.block
    }
}

// ============ Wire format ============

#[derive(Deserialize)]
struct QueriedState<T> {
    #[serde(rename = "queriedState")]
    queried_state: Vec<T>,
}

/// Block numbers are written as integers, but older dumps quote them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBlock {
    Number(u64),
    Text(String),
}

impl RawBlock {
    fn decode(&self) -> Result<u64, String> {
        match self {
            RawBlock::Number(n) => Ok(*n),
            RawBlock::Text(s) => {
                s.trim().parse().map_err(|_| format!("block {s:?} is not an integer"))
            }
        }
    }
}

/// Either an ethers BigNumber (`{"type": "BigNumber", "hex": "0x.."}`) or a bare hex string.
#[derive(Deserialize)]
#[serde(untagged)]
enum HexValue {
    BigNumber { hex: String },
    Plain(String),
}

impl HexValue {
    fn decode(&self) -> Result<U256, String> {
        let raw = match self {
            HexValue::BigNumber { hex } => hex,
            HexValue::Plain(hex) => hex,
        };
        decode_hex_u256(raw)
    }
}

/// Decodes a `0x`-prefixed (or bare) hexadecimal integer.
pub fn decode_hex_u256(raw: &str) -> Result<U256, String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(format!("empty hex value {raw:?}"));
    }
    U256::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value {raw:?}: {e}"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPriceRecord {
    block: RawBlock,
    collateral_pair: String,
    price: HexValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModuleRecord {
    block: RawBlock,
    event: String,
    collateral_name: Option<String>,
    coll_amount: Option<HexValue>,
    user_address: Option<String>,
    collateral_balance: Option<HexValue>,
}

#[derive(Deserialize)]
struct RawTransferRecord {
    block: RawBlock,
    from: String,
    to: String,
    amount: HexValue,
}

// ============ Decoding ============

fn parse_queried_state<T: DeserializeOwned>(
    source_name: &str,
    json: &str,
) -> Result<Vec<T>, IncentivesError> {
    let state: QueriedState<T> = serde_json::from_str(json)
        .map_err(|e| IncentivesError::malformed(source_name, e.to_string()))?;
    Ok(state.queried_state)
}

/// Decodes every record, tagging failures with the record's position.
fn decode_records<R, E>(
    source_name: &str,
    records: Vec<R>,
    decode: impl Fn(R) -> Result<E, IncentivesError>,
) -> Result<Vec<E>, IncentivesError>
where
    E: BlockEvent,
{
    let mut events = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            decode(record).map_err(|err| match err {
                IncentivesError::MalformedSource { reason, .. } => {
                    IncentivesError::malformed(source_name, format!("record {i}: {reason}"))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    // Vec::sort_by_key is stable: same-block events keep their source order.
    events.sort_by_key(|e| e.block());
    Ok(events)
}

fn parse_address(source_name: &str, raw: &str) -> Result<Address, IncentivesError> {
    Address::from_str(raw.trim()).map_err(|e| {
        IncentivesError::malformed(source_name, format!("invalid address {raw:?}: {e}"))
    })
}

fn require<T>(source_name: &str, value: Option<T>, field: &str) -> Result<T, IncentivesError> {
    value.ok_or_else(|| IncentivesError::malformed(source_name, format!("missing field `{field}`")))
}

/// Parses a price feed source.
pub fn parse_price_events(
    source_name: &str,
    json: &str,
) -> Result<Vec<PriceEvent>, IncentivesError> {
    let records: Vec<RawPriceRecord> = parse_queried_state(source_name, json)?;
    let scale = U256::from(10u64).pow(U256::from(PRICE_SCALE_EXPONENT));

    decode_records(source_name, records, |record| {
        let malformed = |reason: String| IncentivesError::malformed(source_name, reason);
        let block = record.block.decode().map_err(malformed)?;
        let kind = CollateralKind::from_pair_symbol(&record.collateral_pair)?;
        let price = record
            .price
            .decode()
            .map_err(malformed)?
            .checked_mul(scale)
            .ok_or_else(|| malformed("price overflows 256 bits once scaled".to_string()))?;
        Ok(PriceEvent { block, kind, price })
    })
}

/// Parses the source of the collateral module for `kind`.
///
/// Records named [POOL_TOTAL_EVENT] update the pool total; every other record is a user
/// balance update for the module's own collateral.
pub fn parse_module_events(
    source_name: &str,
    kind: CollateralKind,
    json: &str,
) -> Result<Vec<PoolBalanceEvent>, IncentivesError> {
    let records: Vec<RawModuleRecord> = parse_queried_state(source_name, json)?;

    decode_records(source_name, records, |record| {
        let malformed = |reason: String| IncentivesError::malformed(source_name, reason);
        let block = record.block.decode().map_err(malformed)?;

        if let Some(name) = &record.collateral_name {
            let found: CollateralKind = name.parse()?;
            if found != kind {
                return Err(IncentivesError::CollateralMismatch {
                    source_name: source_name.to_string(),
                    expected: kind,
                    found,
                });
            }
        }

        if record.event == POOL_TOTAL_EVENT {
            let amount = require(source_name, record.coll_amount, "collAmount")?
                .decode()
                .map_err(malformed)?;
            Ok(PoolBalanceEvent::PoolTotal { block, kind, amount })
        } else {
            let user = require(source_name, record.user_address, "userAddress")?;
            let user = parse_address(source_name, &user)?;
            let amount = require(source_name, record.collateral_balance, "collateralBalance")?
                .decode()
                .map_err(malformed)?;
            Ok(PoolBalanceEvent::UserBalance { block, kind, user, amount })
        }
    })
}

/// Parses a governance token transfer source.
pub fn parse_transfer_events(
    source_name: &str,
    json: &str,
) -> Result<Vec<TransferEvent>, IncentivesError> {
    let records: Vec<RawTransferRecord> = parse_queried_state(source_name, json)?;

    decode_records(source_name, records, |record| {
        let malformed = |reason: String| IncentivesError::malformed(source_name, reason);
        Ok(TransferEvent {
            block: record.block.decode().map_err(malformed)?,
            from: parse_address(source_name, &record.from)?,
            to: parse_address(source_name, &record.to)?,
            amount: record.amount.decode().map_err(malformed)?,
        })
    })
}

fn read_source(path: &Path) -> Result<(String, String), IncentivesError> {
    let json = fs::read_to_string(path).map_err(|e| IncentivesError::io(path, e))?;
    Ok((path.display().to_string(), json))
}

/// Reads and parses a price feed file.
pub fn read_price_events(path: &Path) -> Result<Vec<PriceEvent>, IncentivesError> {
    let (name, json) = read_source(path)?;
    let events = parse_price_events(&name, &json)?;
    tracing::debug!("Loaded {} price events from {}", events.len(), name);
    Ok(events)
}

/// Reads and parses the module file for `kind`.
pub fn read_module_events(
    path: &Path,
    kind: CollateralKind,
) -> Result<Vec<PoolBalanceEvent>, IncentivesError> {
    let (name, json) = read_source(path)?;
    let events = parse_module_events(&name, kind, &json)?;
    tracing::debug!("Loaded {} {} module events from {}", events.len(), kind, name);
    Ok(events)
}

/// Reads and parses a transfer file.
pub fn read_transfer_events(path: &Path) -> Result<Vec<TransferEvent>, IncentivesError> {
    let (name, json) = read_source(path)?;
    let events = parse_transfer_events(&name, &json)?;
    tracing::debug!("Loaded {} transfer events from {}", events.len(), name);
    Ok(events)
}
