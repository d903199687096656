//! Bracketing-range follower

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::follower::FollowerPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Captures the elements spanning the offset frame range, including one
/// element on each side
///
/// With `L = range.lower - delay` and `U = range.upper - delay`, the
/// captured run starts at the last element before `L` and ends at the
/// first element after `U`, so consumers can interpolate across the whole
/// frame. Aborts when no element precedes `L` (the left bracket can never
/// exist); retries while the right bracket has not arrived.
#[derive(Debug, Clone, Copy)]
pub struct Ranged<S: StampType> {
    delay: S::Offset,
}

impl<S: StampType> Ranged<S> {
    /// Create a bracketing follower with boundary offset `delay`
    pub fn new(delay: S::Offset) -> Self {
        Self { delay }
    }

    /// Configured boundary offset
    pub fn delay(&self) -> S::Offset {
        self.delay
    }
}

impl<D> FollowerPolicy<D> for Ranged<D::Stamp>
where
    D: Dispatch + Clone,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        if queue.is_empty() {
            return (State::Retry, ExtractionRange::default());
        }

        let lower = range.lower.retreat(self.delay);
        let upper = range.upper.retreat(self.delay);

        let after_first = queue.lower_bound_index(lower);
        if after_first == 0 {
            // No element precedes the range: left bracket unobtainable
            return (State::Abort, ExtractionRange::default());
        }

        let before_last = queue.upper_bound_index(upper);
        if before_last == queue.len() {
            // Right bracket has not arrived yet
            return (State::Retry, ExtractionRange::default());
        }

        (
            State::Primed,
            ExtractionRange::new(after_first - 1, before_last + 1),
        )
    }

    fn extract<K: DispatchSink<D>>(
        &mut self,
        queue: &mut DispatchQueue<D>,
        sink: &mut K,
        extraction: ExtractionRange,
        _range: &CaptureRange<D::Stamp>,
    ) {
        queue.copy_to(extraction, sink);
        queue.remove_first_n(extraction.first);
    }

    fn abort(&mut self, _queue: &mut DispatchQueue<D>, _t_abort: D::Stamp) {}
}
