//! Deferred Sign Writes
//!
//! Shops never touch marker blocks mid-tick. `update_sign` enqueues a
//! [`SignWrite`] here and the tick driver applies it at the next boundary.

use std::collections::VecDeque;
use tracing::debug;

use crate::world::{BlockPos, BlockWorld};

/// Value-type command: write these four lines to the sign at `sign`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignWrite {
    pub sign: BlockPos,
    pub lines: [String; 4],
}

#[derive(Debug)]
struct Deferred {
    due_tick: u64,
    write: SignWrite,
}

/// Tick counter plus the queue of writes waiting for a tick boundary.
#[derive(Debug, Default)]
pub struct TickScheduler {
    tick: u64,
    queue: VecDeque<Deferred>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Queue a write for the next tick. A write already pending for the same
    /// sign is replaced so only the latest rendering lands.
    pub fn defer_one_tick(&mut self, write: SignWrite) {
        let due_tick = self.tick + 1;
        if let Some(existing) = self.queue.iter_mut().find(|d| d.write.sign == write.sign) {
            existing.write = write;
            existing.due_tick = due_tick;
            return;
        }
        self.queue.push_back(Deferred { due_tick, write });
    }

    /// Drop any pending write for `sign`. Returns how many were dropped.
    pub fn cancel(&mut self, sign: BlockPos) -> usize {
        let before = self.queue.len();
        self.queue.retain(|d| d.write.sign != sign);
        before - self.queue.len()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_for(&self, sign: BlockPos) -> Option<&SignWrite> {
        self.queue.iter().find(|d| d.write.sign == sign).map(|d| &d.write)
    }

    /// Advance one tick and apply every write that has come due.
    /// Returns the number of signs actually written.
    pub fn advance(&mut self, world: &mut BlockWorld) -> usize {
        self.tick += 1;
        let tick = self.tick;

        let mut applied = 0;
        let mut waiting = VecDeque::with_capacity(self.queue.len());
        for deferred in self.queue.drain(..) {
            if deferred.due_tick > tick {
                waiting.push_back(deferred);
                continue;
            }
            if world.write_sign(deferred.write.sign, deferred.write.lines) {
                applied += 1;
            }
        }
        self.queue = waiting;

        if applied > 0 {
            debug!("Tick {}: applied {} sign write(s)", tick, applied);
        }
        applied
    }
}
