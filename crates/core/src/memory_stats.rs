//! Per-thread heap cell statistics
//!
//! Provides visibility into how many heap cells (strings, symbols, pairs)
//! the current thread has allocated and how many are still alive.
//!
//! # Design
//!
//! Values are `!Send`, so every heap cell is created and freed on the same
//! thread. Each thread therefore keeps its own counters in thread-local
//! storage and no synchronisation is needed:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   HEAP_STATS (thread-local)  │
//! ├──────────────────────────────┤
//! │ allocated: u64  (monotonic)  │
//! │ live:      u64  (current)    │
//! │ peak_live: u64  (high-water) │
//! └──────────────────────────────┘
//! ```
//!
//! Every heap cell owns a [`LiveToken`]. Creating the token bumps
//! `allocated` and `live`; dropping it decrements `live`. The counters are
//! therefore exact as long as cells are only created through `Value`.

use std::cell::Cell;

thread_local! {
    static ALLOCATED: Cell<u64> = const { Cell::new(0) };
    static LIVE: Cell<u64> = const { Cell::new(0) };
    static PEAK_LIVE: Cell<u64> = const { Cell::new(0) };
}

/// Snapshot of the current thread's heap cell counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Heap cells created since the thread started
    pub allocated: u64,
    /// Heap cells not yet freed
    pub live: u64,
    /// Highest value `live` has reached
    pub peak_live: u64,
}

/// Read the current thread's heap cell counters
pub fn heap_stats() -> HeapStats {
    HeapStats {
        allocated: ALLOCATED.with(Cell::get),
        live: LIVE.with(Cell::get),
        peak_live: PEAK_LIVE.with(Cell::get),
    }
}

/// Accounting marker embedded in every heap cell.
///
/// Zero-sized; its only job is to keep the counters exact.
#[derive(Debug)]
pub(crate) struct LiveToken(());

impl LiveToken {
    pub(crate) fn new() -> Self {
        ALLOCATED.with(|a| a.set(a.get() + 1));
        let live = LIVE.with(|l| {
            let live = l.get() + 1;
            l.set(live);
            live
        });
        PEAK_LIVE.with(|p| {
            if live > p.get() {
                p.set(live);
            }
        });
        LiveToken(())
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        LIVE.with(|l| l.set(l.get().saturating_sub(1)));
    }
}
