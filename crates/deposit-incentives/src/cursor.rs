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

//! Cursors over block-sorted event streams.
//!
//! Every stream is consumed monotonically while the replay walks forward one block at a time,
//! which merges all streams by block without sorting them together. The total work over a replay
//! is proportional to the number of events, not to blocks times events.

use crate::{
    collateral::{CollateralKind, CollateralMap},
    events::{PoolBalanceEvent, PriceEvent},
};

/// An event positioned at a block.
pub trait BlockEvent {
    fn block(&self) -> u64;
}

/// A forward-only position in one stream sorted ascending by block.
#[derive(Debug, Clone)]
pub struct EventCursor<E> {
    events: Vec<E>,
    position: usize,
}

impl<E: BlockEvent> EventCursor<E> {
    /// Wraps a stream, stable-sorting it by block so same-block events keep their order.
    pub fn new(mut events: Vec<E>) -> Self {
        if !events.windows(2).all(|w| w[0].block() <= w[1].block()) {
            tracing::debug!("Sorting {} out-of-order events by block", events.len());
            events.sort_by_key(BlockEvent::block);
        }
        Self { events, position: 0 }
    }

    /// Returns the events due at `block` and moves past them.
    ///
    /// An event is due once its block is at or below `block`. When blocks are visited one by one
    /// from the start of the stream this yields exactly the events of `block`; events dated before
    /// the first visited block are released on that first visit. An exhausted stream yields
    /// nothing.
    pub fn due_at(&mut self, block: u64) -> &[E] {
        let start = self.position;
        let remaining = &self.events[start..];
        let due = remaining.iter().take_while(|e| e.block() <= block).count();
        self.position += due;
        &self.events[start..self.position]
    }

    /// Block of the next pending event, if any.
    pub fn peek_block(&self) -> Option<u64> {
        self.events.get(self.position).map(BlockEvent::block)
    }

    /// Number of events before `block` that have not been consumed yet.
    pub fn pending_before(&self, block: u64) -> usize {
        self.events[self.position..].iter().take_while(|e| e.block() < block).count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.events.len()
    }

    pub fn consumed(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One cursor for the price feed and one per collateral module.
#[derive(Debug, Clone)]
pub struct CursorSet {
    pub prices: EventCursor<PriceEvent>,
    pub modules: CollateralMap<EventCursor<PoolBalanceEvent>>,
}

impl CursorSet {
    pub fn new(
        prices: Vec<PriceEvent>,
        mut modules: CollateralMap<Vec<PoolBalanceEvent>>,
    ) -> Self {
        Self {
            prices: EventCursor::new(prices),
            modules: CollateralMap::from_fn(|kind| {
                EventCursor::new(std::mem::take(&mut modules[kind]))
            }),
        }
    }

    /// Price events due at `block`.
    pub fn prices_due_at(&mut self, block: u64) -> &[PriceEvent] {
        self.prices.due_at(block)
    }

    /// Module events due at `block` for one collateral module.
    pub fn module_due_at(&mut self, kind: CollateralKind, block: u64) -> &[PoolBalanceEvent] {
        self.modules[kind].due_at(block)
    }

    /// Events of any stream dated before `block` that are still pending.
    pub fn pending_before(&self, block: u64) -> usize {
        self.prices.pending_before(block)
            + self.modules.values().map(|cursor| cursor.pending_before(block)).sum::<usize>()
    }

    pub fn is_exhausted(&self) -> bool {
        self.prices.is_exhausted() && self.modules.values().all(EventCursor::is_exhausted)
    }
}
