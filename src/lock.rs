//! Concurrency wrappers for captor state
//!
//! A captor never manipulates its buffer directly; every operation goes
//! through a [`LockPolicy`] that serializes access and, for the blocking
//! variant, parks the consumer until a producer signals new data. Capture
//! policies are written against the buffer alone and stay unaware of which
//! wrapper is in effect.
//!
//! Three interchangeable variants:
//!
//! - [`NoLock`] — single-threaded, zero synchronization. The cell is a
//!   `RefCell`, which is not `Sync`, so misuse across threads is rejected
//!   at compile time.
//! - [`PollingLock`] — a mutex around the state. `capture` runs one policy
//!   attempt per call and never waits for data.
//! - [`BlockingLock`] — mutex plus condition variable. `capture` re-runs
//!   the policy whenever a producer signals, until the policy stops
//!   reporting [`State::Retry`], the deadline passes, or the captor is
//!   aborted.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::captor::State;
use crate::queue::ExtractionRange;

/// Time point at which a blocking capture stops waiting for data
///
/// `None` waits indefinitely.
pub type Deadline = Option<Instant>;

/// Concurrency wrapper applied to a captor's shared state
///
/// The generic-associated cell type lets each captor embed the wrapper it
/// was declared with at zero cost; no boxing, no virtual dispatch.
pub trait LockPolicy {
    /// Cell type guarding a captor's state
    type Cell<T>;

    /// Wrap freshly constructed captor state
    fn new_cell<T>(value: T) -> Self::Cell<T>;

    /// Run `op` inside the captor's critical section
    fn with<T, R>(cell: &Self::Cell<T>, op: impl FnOnce(&mut T) -> R) -> R;

    /// Run `op` inside the critical section, then wake any data wait
    fn with_notify<T, R>(cell: &Self::Cell<T>, op: impl FnOnce(&mut T) -> R) -> R;

    /// Disable an in-progress capture loop, run `op`, then wake the waiter
    ///
    /// An interrupted capture reports [`State::Abort`]; the loop flag is
    /// re-armed on that capture's exit, so interruption is single-shot.
    fn interrupt<T, R>(cell: &Self::Cell<T>, op: impl FnOnce(&mut T) -> R) -> R;

    /// Run capture attempts until `attempt` reports something other than
    /// [`State::Retry`], the deadline elapses, or the captor is aborted
    fn wait_for<T>(
        cell: &Self::Cell<T>,
        deadline: Deadline,
        attempt: impl FnMut(&mut T) -> (State, ExtractionRange),
    ) -> (State, ExtractionRange);
}

/// Single-threaded lock stand-in; `capture` never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLock;

impl LockPolicy for NoLock {
    type Cell<T> = RefCell<T>;

    fn new_cell<T>(value: T) -> RefCell<T> {
        RefCell::new(value)
    }

    fn with<T, R>(cell: &RefCell<T>, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut cell.borrow_mut())
    }

    fn with_notify<T, R>(cell: &RefCell<T>, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut cell.borrow_mut())
    }

    fn interrupt<T, R>(cell: &RefCell<T>, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut cell.borrow_mut())
    }

    fn wait_for<T>(
        cell: &RefCell<T>,
        _deadline: Deadline,
        mut attempt: impl FnMut(&mut T) -> (State, ExtractionRange),
    ) -> (State, ExtractionRange) {
        attempt(&mut cell.borrow_mut())
    }
}

/// Mutex-only wrapper for threaded use without data waits
///
/// Producers inject concurrently while a consumer polls `capture`; a
/// [`State::Retry`] outcome returns immediately instead of parking.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollingLock;

impl LockPolicy for PollingLock {
    type Cell<T> = Mutex<T>;

    fn new_cell<T>(value: T) -> Mutex<T> {
        Mutex::new(value)
    }

    fn with<T, R>(cell: &Mutex<T>, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut cell.lock())
    }

    fn with_notify<T, R>(cell: &Mutex<T>, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut cell.lock())
    }

    fn interrupt<T, R>(cell: &Mutex<T>, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut cell.lock())
    }

    fn wait_for<T>(
        cell: &Mutex<T>,
        _deadline: Deadline,
        mut attempt: impl FnMut(&mut T) -> (State, ExtractionRange),
    ) -> (State, ExtractionRange) {
        attempt(&mut cell.lock())
    }
}

/// Mutex + condition variable wrapper with a data-arrival wait
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingLock;

/// Shared-state cell used by [`BlockingLock`]
pub struct WaitCell<T> {
    state: Mutex<T>,
    data_ready: Condvar,
    /// Cleared by `interrupt` to break an in-progress capture wait;
    /// re-armed on capture exit so aborts never latch the captor.
    capture_enabled: AtomicBool,
}

impl LockPolicy for BlockingLock {
    type Cell<T> = WaitCell<T>;

    fn new_cell<T>(value: T) -> WaitCell<T> {
        WaitCell {
            state: Mutex::new(value),
            data_ready: Condvar::new(),
            capture_enabled: AtomicBool::new(true),
        }
    }

    fn with<T, R>(cell: &WaitCell<T>, op: impl FnOnce(&mut T) -> R) -> R {
        op(&mut cell.state.lock())
    }

    fn with_notify<T, R>(cell: &WaitCell<T>, op: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut guard = cell.state.lock();
            op(&mut guard)
        };
        cell.data_ready.notify_one();
        result
    }

    fn interrupt<T, R>(cell: &WaitCell<T>, op: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut guard = cell.state.lock();
            cell.capture_enabled.store(false, Ordering::Release);
            op(&mut guard)
        };
        cell.data_ready.notify_one();
        result
    }

    fn wait_for<T>(
        cell: &WaitCell<T>,
        deadline: Deadline,
        mut attempt: impl FnMut(&mut T) -> (State, ExtractionRange),
    ) -> (State, ExtractionRange) {
        let mut guard = cell.state.lock();

        let mut decision = (State::Abort, ExtractionRange::default());
        while cell.capture_enabled.load(Ordering::Acquire) {
            decision = attempt(&mut guard);
            if decision.0 != State::Retry {
                break;
            }
            match deadline {
                None => cell.data_ready.wait(&mut guard),
                Some(at) => {
                    if cell.data_ready.wait_until(&mut guard, at).timed_out() {
                        decision.0 = State::Timeout;
                        break;
                    }
                }
            }
        }

        if cell.capture_enabled.load(Ordering::Acquire) {
            decision
        } else {
            // Re-arm for the next capture; report the interruption unless a
            // non-retry decision had already been produced.
            cell.capture_enabled.store(true, Ordering::Release);
            match decision.0 {
                State::Retry => (State::Abort, ExtractionRange::default()),
                _ => decision,
            }
        }
    }
}
