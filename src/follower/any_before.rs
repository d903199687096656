//! Unconditional prefix follower

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::follower::FollowerPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Captures whatever happens to be buffered before `range.upper - delay`
///
/// Always primes, even with nothing to contribute, so the captured set
/// depends on injection timing relative to the frame. Non-deterministic
/// by design; use [`Before`](crate::follower::Before) when the prefix
/// must be complete before the frame fires.
///
/// The inclusive mode (see [`AnyBefore::any_at_or_before`]) additionally
/// takes elements stamped exactly at the boundary.
#[derive(Debug, Clone, Copy)]
pub struct AnyBefore<S: StampType> {
    delay: S::Offset,
    inclusive: bool,
}

impl<S: StampType> AnyBefore<S> {
    /// Create a follower capturing elements strictly before the boundary
    pub fn new(delay: S::Offset) -> Self {
        Self {
            delay,
            inclusive: false,
        }
    }

    /// Create a follower capturing elements at or before the boundary
    pub fn any_at_or_before(delay: S::Offset) -> Self {
        Self {
            delay,
            inclusive: true,
        }
    }

    /// Configured boundary offset
    pub fn delay(&self) -> S::Offset {
        self.delay
    }
}

impl<D> FollowerPolicy<D> for AnyBefore<D::Stamp>
where
    D: Dispatch,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        let boundary = range.upper.retreat(self.delay);
        let last = if self.inclusive {
            queue.upper_bound_index(boundary)
        } else {
            queue.lower_bound_index(boundary)
        };
        (State::Primed, ExtractionRange::new(0, last))
    }

    fn extract<K: DispatchSink<D>>(
        &mut self,
        queue: &mut DispatchQueue<D>,
        sink: &mut K,
        extraction: ExtractionRange,
        _range: &CaptureRange<D::Stamp>,
    ) {
        queue.move_to(extraction, sink);
    }

    fn abort(&mut self, queue: &mut DispatchQueue<D>, t_abort: D::Stamp) {
        queue.remove_before(t_abort.retreat(self.delay));
    }
}
