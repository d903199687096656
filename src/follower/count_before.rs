//! Fixed-count prefix follower

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::error::{Result, TributaryError};
use crate::follower::FollowerPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Captures exactly `count` elements ending just before
/// `range.upper - delay`
///
/// Primes once `count` elements precede the boundary; aborts when the
/// boundary has been passed with fewer than `count` elements available
/// (the missing history can never arrive). Extraction copies the chosen
/// elements and drops only the staler ones, so the tail of one frame can
/// seed the next.
#[derive(Debug, Clone, Copy)]
pub struct CountBefore<S: StampType> {
    count: usize,
    delay: S::Offset,
}

impl<S: StampType> CountBefore<S> {
    /// Create a follower capturing `count` elements before the boundary
    ///
    /// # Errors
    ///
    /// Returns an invalid-configuration error when `count` is zero.
    pub fn new(count: usize, delay: S::Offset) -> Result<Self> {
        if count == 0 {
            return Err(TributaryError::config("count must be greater than zero"));
        }
        Ok(Self { count, delay })
    }

    /// Configured element count
    pub fn count(&self) -> usize {
        self.count
    }

    /// Configured boundary offset
    pub fn delay(&self) -> S::Offset {
        self.delay
    }
}

impl<D> FollowerPolicy<D> for CountBefore<D::Stamp>
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

        let boundary = range.upper.retreat(self.delay);
        let before_boundary = queue.lower_bound_index(boundary);

        if before_boundary >= self.count {
            return (
                State::Primed,
                ExtractionRange::new(before_boundary - self.count, before_boundary),
            );
        }
        if before_boundary < queue.len() {
            // Boundary already witnessed with too few elements before it
            return (State::Abort, ExtractionRange::default());
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
        queue.copy_to(extraction, sink);
        queue.remove_first_n(extraction.first);
    }

    fn abort(&mut self, _queue: &mut DispatchQueue<D>, _t_abort: D::Stamp) {}
}
