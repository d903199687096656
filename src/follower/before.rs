//! Boundary-gated prefix follower

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::follower::FollowerPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Captures every element older than `range.upper - delay`
///
/// Primes only once an element at or past the boundary proves that the
/// prefix is complete; until then the frame is held back with
/// [`State::Retry`]. Extraction moves the whole prefix out of the buffer.
#[derive(Debug, Clone, Copy)]
pub struct Before<S: StampType> {
    delay: S::Offset,
}

impl<S: StampType> Before<S> {
    /// Create a follower with boundary offset `delay`
    pub fn new(delay: S::Offset) -> Self {
        Self { delay }
    }

    /// Configured boundary offset
    pub fn delay(&self) -> S::Offset {
        self.delay
    }
}

impl<D> FollowerPolicy<D> for Before<D::Stamp>
where
    D: Dispatch,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        let Some(newest) = queue.newest_stamp() else {
            return (State::Retry, ExtractionRange::default());
        };

        // Non-inclusive boundary between participating and retained data
        let boundary = range.upper.retreat(self.delay);
        if newest < boundary {
            return (State::Retry, ExtractionRange::default());
        }

        let last = queue.lower_bound_index(boundary);
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
