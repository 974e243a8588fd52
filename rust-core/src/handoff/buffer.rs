//! Wait-free two-slot handoff between one producer and one consumer
//!
//! The producer always has a slot to write into and the consumer always
//! gets the newest completed window, without either side ever waiting on the
//! other. Slot ownership moves by flipping roles in the state word; window
//! contents are never copied between slots.

use super::state::{Slot, StateWord};
use std::cell::UnsafeCell;
use std::sync::Arc;

struct Shared<W> {
    slots: [UnsafeCell<W>; 2],
    state: StateWord,
}

// SAFETY: the state word hands each slot to at most one side at a time.
// The write slot is `active` and the read slot is `!active`, and `active`
// only flips while no one is inside a critical section.
unsafe impl<W: Send> Sync for Shared<W> {}

impl<W> Shared<W> {
    /// # Safety
    /// The caller must own `slot` through an open write section.
    #[allow(clippy::mut_from_ref)]
    unsafe fn slot_mut(&self, slot: Slot) -> &mut W {
        &mut *self.slots[slot.index()].get()
    }

    /// # Safety
    /// The caller must own `slot` through an open read section.
    unsafe fn slot_ref(&self, slot: Slot) -> &W {
        &*self.slots[slot.index()].get()
    }
}

/// Two-slot wait-free handoff buffer
pub struct HandoffBuffer<W> {
    shared: Arc<Shared<W>>,
}

impl<W: Send> HandoffBuffer<W> {
    /// Create a buffer from two pre-allocated windows
    ///
    /// # Arguments
    /// * `first` - Initial write target
    /// * `second` - Initial read slot (empty until the first flip)
    pub fn new(first: W, second: W) -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: [UnsafeCell::new(first), UnsafeCell::new(second)],
                state: StateWord::new(),
            }),
        }
    }

    /// Split into the producer and consumer ends
    pub fn split(self) -> (WindowProducer<W>, WindowConsumer<W>) {
        (
            WindowProducer {
                shared: Arc::clone(&self.shared),
                writing: None,
            },
            WindowConsumer {
                shared: self.shared,
                reading: None,
            },
        )
    }
}

/// Producer end (sampling task)
pub struct WindowProducer<W> {
    shared: Arc<Shared<W>>,
    writing: Option<Slot>,
}

impl<W> WindowProducer<W> {
    /// Enter the write section and return the slot assigned for writing.
    ///
    /// Always succeeds. Calling it again before [`stop_writing`](Self::stop_writing)
    /// returns the same slot.
    pub fn start_writing(&mut self) -> &mut W {
        let slot = match self.writing {
            Some(slot) => slot,
            None => {
                // No one can flip on us until we leave
                let slot = self.shared.state.enter().active();
                self.writing = Some(slot);
                slot
            }
        };

        // SAFETY: `slot` is `active` and pinned by our share of `concurrent`
        unsafe { self.shared.slot_mut(slot) }
    }

    /// Slot of the open write section, if any
    pub fn writing(&mut self) -> Option<&mut W> {
        let slot = self.writing?;
        // SAFETY: as in `start_writing`
        Some(unsafe { self.shared.slot_mut(slot) })
    }

    /// Identity of the slot being written
    pub fn write_slot(&self) -> Option<Slot> {
        self.writing
    }

    /// Publish the written slot and leave the write section.
    ///
    /// Flips the slot roles when the consumer is not inside a read; otherwise
    /// the consumer flips when it finishes.
    pub fn stop_writing(&mut self) {
        let Some(slot) = self.writing.take() else {
            return;
        };

        let state = self.shared.state.publish_and_leave(slot);
        if state.concurrent() == 0 {
            // The vacated read slot becomes the write target; drop its stale
            // content so the consumer never reads two windows out of order.
            let next = state.flipped().emptied(state.readable());
            self.shared.state.try_transition(state, next);
        }
    }
}

/// Consumer end (spectrum task)
pub struct WindowConsumer<W> {
    shared: Arc<Shared<W>>,
    reading: Option<Slot>,
}

impl<W> WindowConsumer<W> {
    /// Enter the read section and return the newest unread window.
    ///
    /// Returns `None` when nothing was published since the last read; no
    /// section is opened in that case.
    pub fn start_reading(&mut self) -> Option<&W> {
        let slot = match self.reading {
            Some(slot) => slot,
            None => {
                if !self.shared.state.load().has_unread() {
                    return None;
                }

                // The read slot stays full from here on: only we clear it, and
                // a flip in between swaps in a slot the producer just filled.
                let slot = self.shared.state.enter().readable();
                self.reading = Some(slot);
                slot
            }
        };

        // SAFETY: `slot` is `!active` and pinned by our share of `concurrent`
        Some(unsafe { self.shared.slot_ref(slot) })
    }

    /// Whether a read section is open
    pub fn is_reading(&self) -> bool {
        self.reading.is_some()
    }

    /// Release the window and leave the read section.
    ///
    /// If the producer published while we were reading and is not writing
    /// again, perform the flip it had to defer.
    pub fn end_reading(&mut self) {
        let Some(slot) = self.reading.take() else {
            return;
        };

        let state = self.shared.state.consume_and_leave(slot);
        if state.concurrent() == 0 && state.is_full(state.active()) {
            self.shared.state.try_transition(state, state.flipped());
        }
    }
}
