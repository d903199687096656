//! Periodic nearest-element follower

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::follower::FollowerPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Captures the element closest before `range.lower - delay` within one
/// period
///
/// Intended for inputs arriving at a known cadence: an element qualifies
/// when it lies inside the periodic window just before the boundary. If
/// the oldest in-window candidate turns out to be at or past the boundary
/// the input has already overshot and the frame aborts.
#[derive(Debug, Clone, Copy)]
pub struct ClosestBefore<S: StampType> {
    period: S::Offset,
    delay: S::Offset,
}

impl<S: StampType> ClosestBefore<S> {
    /// Create a follower for inputs arriving every `period`, offset by
    /// `delay` from the driving stamp
    pub fn new(period: S::Offset, delay: S::Offset) -> Self {
        Self { period, delay }
    }

    /// Configured input cadence
    pub fn period(&self) -> S::Offset {
        self.period
    }

    /// Configured boundary offset
    pub fn delay(&self) -> S::Offset {
        self.delay
    }
}

impl<D> FollowerPolicy<D> for ClosestBefore<D::Stamp>
where
    D: Dispatch + Clone,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        let boundary = range.lower.retreat(self.delay);

        for (index, dispatch) in queue.iter().enumerate() {
            let stamp = dispatch.stamp();
            if stamp >= boundary {
                // Oldest remaining element already overshot the window
                return (State::Abort, ExtractionRange::default());
            }
            if stamp.advance(self.period) >= boundary {
                return (State::Primed, ExtractionRange::new(index, index + 1));
            }
        }

        (State::Retry, ExtractionRange::default())
    }

    fn extract<K: DispatchSink<D>>(
        &mut self,
        queue: &mut DispatchQueue<D>,
        sink: &mut K,
        extraction: ExtractionRange,
        _range: &CaptureRange<D::Stamp>,
    ) {
        if !extraction.is_valid() {
            return;
        }
        // The chosen element stays buffered; staler elements are dropped
        queue.copy_to(
            ExtractionRange::new(extraction.first, extraction.first + 1),
            sink,
        );
        queue.remove_first_n(extraction.first);
    }

    fn abort(&mut self, queue: &mut DispatchQueue<D>, t_abort: D::Stamp) {
        queue.remove_before(t_abort.retreat(self.delay).retreat(self.period));
    }
}
