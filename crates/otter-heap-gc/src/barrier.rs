//! Generational write barrier
//!
//! When an object outside the young space stores a reference to a young
//! object, the card covering the holder's slot is marked dirty so a minor
//! collection can find the old-to-young edge without scanning the whole heap.

use crate::space::{HeapAddress, MemSpace};
use rustc_hash::FxHashMap;

/// Size of a card in bytes (typically 512 bytes)
pub const CARD_SIZE: usize = 512;

/// Card state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    /// Card has no cross-generation pointers
    Clean = 0,
    /// Card may contain cross-generation pointers
    Dirty = 1,
}

/// Card table for one space
///
/// Grows on demand, so the space capacity does not need to be known up front.
#[derive(Debug, Default)]
pub struct CardTable {
    cards: Vec<u8>,
}

impl CardTable {
    /// Create an empty card table
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the card containing a byte offset as dirty
    pub fn mark_card(&mut self, offset: usize) {
        let card_index = offset / CARD_SIZE;
        if card_index >= self.cards.len() {
            self.cards.resize(card_index + 1, CardState::Clean as u8);
        }
        self.cards[card_index] = CardState::Dirty as u8;
    }

    /// Check if the card containing a byte offset is dirty
    pub fn is_dirty(&self, offset: usize) -> bool {
        self.cards
            .get(offset / CARD_SIZE)
            .is_some_and(|card| *card == CardState::Dirty as u8)
    }

    /// Indices of every dirty card
    pub fn dirty_cards(&self) -> impl Iterator<Item = usize> + '_ {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| **card == CardState::Dirty as u8)
            .map(|(index, _)| index)
    }

    /// Clear all cards (after GC)
    pub fn clear(&mut self) {
        self.cards.fill(CardState::Clean as u8);
    }
}

/// Write barrier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarrierStats {
    /// Stores that dirtied a card
    pub applied: u64,
    /// Stores that needed no card
    pub filtered: u64,
    /// Stores the caller explicitly skipped
    pub skipped: u64,
}

/// Remembered set for old-to-young references
#[derive(Debug, Default)]
pub struct WriteBarrier {
    tables: FxHashMap<MemSpace, CardTable>,
    stats: BarrierStats,
}

impl WriteBarrier {
    /// Create an empty barrier
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference store into `slot` of the object at `holder`
    ///
    /// `target` is the space of the stored object, `None` for primitives.
    /// Returns true when a card was dirtied.
    pub fn on_write(&mut self, holder: HeapAddress, slot: usize, target: Option<MemSpace>) -> bool {
        let needs_card = !holder.space.is_young()
            && !holder.space.is_shared()
            && target.is_some_and(MemSpace::is_young);
        if !needs_card {
            self.stats.filtered += 1;
            return false;
        }
        self.tables
            .entry(holder.space)
            .or_default()
            .mark_card(holder.offset + slot * 8);
        self.stats.applied += 1;
        true
    }

    /// Count a store that bypassed the barrier
    pub fn skip(&mut self) {
        self.stats.skipped += 1;
    }

    /// Whether the card covering `slot` of `holder` is dirty
    pub fn is_remembered(&self, holder: HeapAddress, slot: usize) -> bool {
        self.tables
            .get(&holder.space)
            .is_some_and(|table| table.is_dirty(holder.offset + slot * 8))
    }

    /// Card table for a space, if any store dirtied it
    pub fn card_table(&self, space: MemSpace) -> Option<&CardTable> {
        self.tables.get(&space)
    }

    /// Counters so far
    pub fn stats(&self) -> BarrierStats {
        self.stats
    }

    /// Clear every card (after a minor GC)
    pub fn clear(&mut self) {
        for table in self.tables.values_mut() {
            table.clear();
        }
    }
}
