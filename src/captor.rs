//! Captors: per-input buffers paired with a capture policy
//!
//! A captor owns one ordered dispatch buffer, one capture policy, and a
//! concurrency wrapper. Producers feed it through `inject`/`insert`;
//! the synchronizer (or a standalone consumer) asks it to `locate` the
//! elements participating in a frame and to `extract` them into an output
//! sink. The two captor kinds differ only in how the policy relates to the
//! frame range: a [`Driver`] produces the range, a [`Follower`] matches
//! against it.

use std::fmt;

use tracing::debug;

use crate::dispatch::{CaptureRange, Dispatch};
use crate::driver::DriverPolicy;
use crate::follower::FollowerPolicy;
use crate::lock::{Deadline, LockPolicy, NoLock};
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Capture decision produced by policies and surfaced by captors
///
/// These direct both the captor-internal capture loop and the
/// synchronizer's frame composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Captor should keep waiting for data after the prime attempt
    Retry,
    /// Captor has located its frame elements and is ready to extract
    Primed,
    /// Captor has requested to abandon the current capture attempt
    Abort,
    /// Captor hit its data-wait deadline
    Timeout,
    /// Driving stamp range fell below the caller-imposed lower bound
    ErrorDriverLowerBoundExceeded,
    /// Frame skipped because a queue monitor rejected the capture attempt
    SkipFrameQueuePrecondition,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Retry => "RETRY",
            State::Primed => "PRIMED",
            State::Abort => "ABORT",
            State::Timeout => "TIMEOUT",
            State::ErrorDriverLowerBoundExceeded => "ERROR_DRIVER_LOWER_BOUND_EXCEEDED",
            State::SkipFrameQueuePrecondition => "SKIP_FRAME_QUEUE_PRECONDITION",
        };
        f.write_str(name)
    }
}

/// Admission control hook attached to a follower captor
///
/// `check` runs before every follower `locate`; returning `false` makes
/// the captor report [`State::SkipFrameQueuePrecondition`] without
/// consulting its policy. `update` runs after every synchronizer frame
/// that reached a decision, letting the monitor adapt to outcomes.
pub trait QueueMonitor<D: Dispatch>: Send {
    /// Decide whether a capture attempt may proceed
    fn check(&mut self, queue: &DispatchQueue<D>, range: &CaptureRange<D::Stamp>) -> bool;

    /// Observe the outcome of a synchronizer frame
    fn update(&mut self, queue: &DispatchQueue<D>, range: &CaptureRange<D::Stamp>, state: State);
}

struct DriverCore<D, P> {
    queue: DispatchQueue<D>,
    capacity: usize,
    policy: P,
}

struct FollowerCore<D, P> {
    queue: DispatchQueue<D>,
    capacity: usize,
    policy: P,
    monitor: Option<Box<dyn QueueMonitor<D>>>,
}

/// Captor whose policy produces the frame stamp range
pub struct Driver<D, P, L: LockPolicy = NoLock> {
    cell: L::Cell<DriverCore<D, P>>,
}

/// Captor whose policy selects elements relative to a driver-produced range
pub struct Follower<D, P, L: LockPolicy = NoLock> {
    cell: L::Cell<FollowerCore<D, P>>,
}

macro_rules! captor_buffer_methods {
    ($core:ident) => {
        /// Insert one element, apply the capacity bound, wake any data wait
        pub fn inject(&self, dispatch: D) {
            L::with_notify(&self.cell, |core| {
                core.queue.insert(dispatch);
                core.queue.enforce_capacity(core.capacity);
            });
        }

        /// Bulk-insert elements under one critical section with one wakeup
        pub fn insert<I>(&self, dispatches: I)
        where
            I: IntoIterator<Item = D>,
        {
            L::with_notify(&self.cell, |core| {
                for dispatch in dispatches {
                    core.queue.insert(dispatch);
                    core.queue.enforce_capacity(core.capacity);
                }
            });
        }

        /// Number of buffered elements
        pub fn len(&self) -> usize {
            L::with(&self.cell, |core| core.queue.len())
        }

        /// Checks if no elements are buffered
        pub fn is_empty(&self) -> bool {
            L::with(&self.cell, |core| core.queue.is_empty())
        }

        /// Maximum number of buffered elements; `0` means unbounded
        pub fn capacity(&self) -> usize {
            L::with(&self.cell, |core| core.capacity)
        }

        /// Change the buffer capacity, trimming oldest elements immediately
        pub fn set_capacity(&self, capacity: usize) {
            L::with(&self.cell, |core| {
                core.capacity = capacity;
                core.queue.enforce_capacity(capacity);
            });
        }

        /// Stamp range between the oldest and newest buffered elements
        ///
        /// Returns the empty range when the buffer holds nothing.
        pub fn available_stamp_range(&self) -> CaptureRange<D::Stamp> {
            L::with(&self.cell, |core| core.queue.available_range())
        }

        /// Run `callback` over every buffered element, oldest first
        ///
        /// The buffer is immutable for the duration of the call.
        pub fn inspect(&self, mut callback: impl FnMut(&D)) {
            L::with(&self.cell, |core| {
                for dispatch in core.queue.iter() {
                    callback(dispatch);
                }
            });
        }

        /// Remove buffered elements with stamp before `t_remove`
        pub fn remove(&self, t_remove: D::Stamp) {
            L::with_notify(&self.cell, |core| core.queue.remove_before(t_remove));
        }

        /// Signal any data wait to stop and run the policy abort behavior
        pub fn abort(&self, t_abort: D::Stamp) {
            debug!(t_abort = ?t_abort, "captor abort");
            L::interrupt(&self.cell, |core| {
                let $core { queue, policy, .. } = core;
                policy.abort(queue, t_abort);
            });
        }

        /// Signal any data wait, clear the buffer, reset policy state
        pub fn reset(&self) {
            debug!("captor reset");
            L::interrupt(&self.cell, |core| {
                core.policy.reset();
                core.queue.clear();
            });
        }
    };
}

impl<D, P, L> Driver<D, P, L>
where
    D: Dispatch,
    P: DriverPolicy<D>,
    L: LockPolicy,
{
    /// Create a driver captor with an unbounded buffer
    pub fn new(policy: P) -> Self {
        Self::with_capacity(policy, 0)
    }

    /// Create a driver captor that retains at most `capacity` elements
    pub fn with_capacity(policy: P, capacity: usize) -> Self {
        Self {
            cell: L::new_cell(DriverCore {
                queue: DispatchQueue::new(),
                capacity,
                policy,
            }),
        }
    }

    captor_buffer_methods!(DriverCore);

    /// Find the elements of the next frame and produce its stamp range
    ///
    /// With a blocking lock this waits for data until `deadline` while the
    /// policy keeps reporting [`State::Retry`].
    pub fn locate(
        &self,
        range: &mut CaptureRange<D::Stamp>,
        deadline: Deadline,
    ) -> (State, ExtractionRange) {
        L::wait_for(&self.cell, deadline, |core| {
            core.policy.locate(&core.queue, range)
        })
    }

    /// Apply a locate decision to the buffer and the output sink
    pub fn extract<K>(
        &self,
        mut sink: K,
        extraction: ExtractionRange,
        range: &CaptureRange<D::Stamp>,
    ) where
        K: DispatchSink<D>,
    {
        L::with(&self.cell, |core| {
            let DriverCore { queue, policy, .. } = core;
            policy.extract(queue, &mut sink, extraction, range);
        });
    }

    /// Locate and, when primed, extract in one critical section
    pub fn capture<K>(
        &self,
        mut sink: K,
        range: &mut CaptureRange<D::Stamp>,
        deadline: Deadline,
    ) -> State
    where
        K: DispatchSink<D>,
    {
        let (state, _) = L::wait_for(&self.cell, deadline, |core| {
            let (state, extraction) = core.policy.locate(&core.queue, range);
            if state == State::Primed {
                let DriverCore { queue, policy, .. } = core;
                policy.extract(queue, &mut sink, extraction, range);
            }
            (state, extraction)
        });
        state
    }

    /// Drivers carry no queue monitor; provided for contract uniformity
    pub fn update_queue_monitor(&self, _range: &CaptureRange<D::Stamp>, _state: State) {}
}

impl<D, P, L> Follower<D, P, L>
where
    D: Dispatch,
    P: FollowerPolicy<D>,
    L: LockPolicy,
{
    /// Create a follower captor with an unbounded buffer
    pub fn new(policy: P) -> Self {
        Self::with_capacity(policy, 0)
    }

    /// Create a follower captor that retains at most `capacity` elements
    pub fn with_capacity(policy: P, capacity: usize) -> Self {
        Self {
            cell: L::new_cell(FollowerCore {
                queue: DispatchQueue::new(),
                capacity,
                policy,
                monitor: None,
            }),
        }
    }

    /// Attach a queue monitor preconditioning every capture attempt
    pub fn with_queue_monitor(self, monitor: Box<dyn QueueMonitor<D>>) -> Self {
        L::with(&self.cell, |core| core.monitor = Some(monitor));
        self
    }

    captor_buffer_methods!(FollowerCore);

    /// Decide whether and which buffered elements participate in `range`
    ///
    /// A rejecting queue monitor short-circuits the attempt with
    /// [`State::SkipFrameQueuePrecondition`]. With a blocking lock this
    /// waits for data until `deadline` while the policy keeps reporting
    /// [`State::Retry`].
    pub fn locate(
        &self,
        range: &CaptureRange<D::Stamp>,
        deadline: Deadline,
    ) -> (State, ExtractionRange) {
        L::wait_for(&self.cell, deadline, |core| {
            let FollowerCore {
                queue,
                policy,
                monitor,
                ..
            } = core;
            if let Some(monitor) = monitor {
                if !monitor.check(queue, range) {
                    return (
                        State::SkipFrameQueuePrecondition,
                        ExtractionRange::default(),
                    );
                }
            }
            policy.locate(queue, range)
        })
    }

    /// Apply a locate decision to the buffer and the output sink
    pub fn extract<K>(
        &self,
        mut sink: K,
        extraction: ExtractionRange,
        range: &CaptureRange<D::Stamp>,
    ) where
        K: DispatchSink<D>,
    {
        L::with(&self.cell, |core| {
            let FollowerCore { queue, policy, .. } = core;
            policy.extract(queue, &mut sink, extraction, range);
        });
    }

    /// Locate and, when primed, extract in one critical section
    pub fn capture<K>(&self, mut sink: K, range: &CaptureRange<D::Stamp>, deadline: Deadline) -> State
    where
        K: DispatchSink<D>,
    {
        let (state, _) = L::wait_for(&self.cell, deadline, |core| {
            let FollowerCore {
                queue,
                policy,
                monitor,
                ..
            } = core;
            if let Some(monitor) = monitor {
                if !monitor.check(queue, range) {
                    return (
                        State::SkipFrameQueuePrecondition,
                        ExtractionRange::default(),
                    );
                }
            }
            let (state, extraction) = policy.locate(queue, range);
            if state == State::Primed {
                policy.extract(queue, &mut sink, extraction, range);
            }
            (state, extraction)
        });
        state
    }

    /// Forward a frame outcome to the attached queue monitor, if any
    pub fn update_queue_monitor(&self, range: &CaptureRange<D::Stamp>, state: State) {
        L::with(&self.cell, |core| {
            let FollowerCore { queue, monitor, .. } = core;
            if let Some(monitor) = monitor {
                monitor.update(queue, range, state);
            }
        });
    }
}
