//! Shared state word of the handoff buffer
//!
//! One `AtomicU32` carries four logical fields:
//!
//! | field        | width | meaning                                              |
//! |--------------|-------|------------------------------------------------------|
//! | `active`     | 1 bit | slot currently assigned for writing                  |
//! | `concurrent` | 2 bit | participants inside a write or read critical section |
//! | `full[0]`    | 1 bit | first slot holds a completed, unread window          |
//! | `full[1]`    | 1 bit | second slot holds a completed, unread window         |
//!
//! The layout is private to this module; callers only see [`State`] accessors
//! and the named transitions on [`StateWord`].

use std::sync::atomic::{AtomicU32, Ordering};

const ACTIVE: u32 = 0b0_0001;
const CONCURRENT_ONE: u32 = 0b0_0010;
const CONCURRENT: u32 = 0b0_0110;
const CONCURRENT_SHIFT: u32 = 1;
const FULL_FIRST: u32 = 0b0_1000;
const FULL_SECOND: u32 = 0b1_0000;

/// One of the two physical window slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    /// The slot holding the other role
    pub fn other(self) -> Self {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }

    /// Storage index of the slot
    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }

    fn full_flag(self) -> u32 {
        match self {
            Slot::First => FULL_FIRST,
            Slot::Second => FULL_SECOND,
        }
    }
}

/// Snapshot of the state word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State(u32);

impl State {
    /// Slot assigned for writing
    pub fn active(self) -> Slot {
        if self.0 & ACTIVE == 0 {
            Slot::First
        } else {
            Slot::Second
        }
    }

    /// Slot assigned for reading
    pub fn readable(self) -> Slot {
        self.active().other()
    }

    /// Number of participants inside a critical section (0..=2)
    pub fn concurrent(self) -> u32 {
        (self.0 & CONCURRENT) >> CONCURRENT_SHIFT
    }

    /// Whether `slot` holds a completed window that has not been read
    pub fn is_full(self, slot: Slot) -> bool {
        self.0 & slot.full_flag() != 0
    }

    /// Whether the read slot holds something new
    pub fn has_unread(self) -> bool {
        self.is_full(self.readable())
    }

    /// Same state with the slot roles swapped
    pub fn flipped(self) -> Self {
        State(self.0 ^ ACTIVE)
    }

    /// Same state with `slot` marked as not full
    pub fn emptied(self, slot: Slot) -> Self {
        State(self.0 & !slot.full_flag())
    }
}

/// The atomic state word and the transitions producer and consumer perform on it
///
/// Every transition is a single atomic read-modify-write (plus at most one
/// preceding load and one trailing compare-and-swap), so no caller ever loops.
#[derive(Debug, Default)]
pub struct StateWord(AtomicU32);

impl StateWord {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn load(&self) -> State {
        State(self.0.load(Ordering::Acquire))
    }

    /// Enter a critical section. Returns the state after entering.
    ///
    /// While `concurrent > 0` nobody flips `active`, so the returned slot roles
    /// stay valid until the matching leave.
    pub fn enter(&self) -> State {
        let previous = self.0.fetch_add(CONCURRENT_ONE, Ordering::AcqRel);
        debug_assert!(State(previous).concurrent() < 2, "more than two participants");
        State(previous.wrapping_add(CONCURRENT_ONE))
    }

    /// Producer leave: mark `slot` full (if it is not already) and leave the
    /// section in one step. Returns the state after leaving.
    ///
    /// Only the producer sets `full` on the write slot and nobody flips while
    /// it is inside, so the flag read before the add cannot go stale.
    pub fn publish_and_leave(&self, slot: Slot) -> State {
        let before = self.load();
        let mark = if before.is_full(slot) { 0 } else { slot.full_flag() };
        let delta = mark.wrapping_sub(CONCURRENT_ONE);
        let previous = self.0.fetch_add(delta, Ordering::AcqRel);
        State(previous.wrapping_add(delta))
    }

    /// Consumer leave: clear `full` of the slot just read and leave the
    /// section in one step. Returns the state after leaving.
    pub fn consume_and_leave(&self, slot: Slot) -> State {
        let delta = slot.full_flag() | CONCURRENT_ONE;
        let previous = self.0.fetch_sub(delta, Ordering::AcqRel);
        debug_assert!(State(previous).is_full(slot), "consumed a slot that was not full");
        State(previous.wrapping_sub(delta))
    }

    /// Single compare-and-swap attempt from `expected` to `next`.
    ///
    /// Returns false when the word moved on; the other side then owns the flip.
    pub fn try_transition(&self, expected: State, next: State) -> bool {
        self.0
            .compare_exchange(expected.0, next.0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
