//! Sample-and-hold follower

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::follower::FollowerPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Re-emits the newest element at least `min_period` older than the frame
///
/// A single-element latch holds the last matched element, so slowly
/// updating inputs (configuration, calibration, setpoints) contribute to
/// every frame once matched. A frame may never prime if no element ever
/// lands inside a bounded period; callers must impose a timeout.
#[derive(Debug, Clone)]
pub struct Latched<D: Dispatch> {
    min_period: <D::Stamp as StampType>::Offset,
    latch: Option<D>,
}

impl<D: Dispatch> Latched<D> {
    /// Create a latching follower with minimum stamp gap `min_period`
    pub fn new(min_period: <D::Stamp as StampType>::Offset) -> Self {
        Self {
            min_period,
            latch: None,
        }
    }

    /// Configured minimum gap between latch and driving stamp
    pub fn min_period(&self) -> <D::Stamp as StampType>::Offset {
        self.min_period
    }
}

impl<D> FollowerPolicy<D> for Latched<D>
where
    D: Dispatch + Clone,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        let Some(oldest) = queue.oldest_stamp() else {
            // Nothing buffered: the held latch alone can satisfy the frame
            return match self.latch {
                Some(_) => (State::Primed, ExtractionRange::default()),
                None => (State::Retry, ExtractionRange::default()),
            };
        };

        let boundary = range.lower.retreat(self.min_period);
        if oldest > boundary {
            // All buffered data is too new for this frame
            return match self.latch {
                Some(_) => (State::Primed, ExtractionRange::default()),
                None => (State::Abort, ExtractionRange::default()),
            };
        }

        let last = queue.upper_bound_index(boundary);
        (State::Primed, ExtractionRange::new(0, last))
    }

    fn extract<K: DispatchSink<D>>(
        &mut self,
        queue: &mut DispatchQueue<D>,
        sink: &mut K,
        extraction: ExtractionRange,
        _range: &CaptureRange<D::Stamp>,
    ) {
        if extraction.is_valid() {
            let index = extraction.last - 1;
            if let Some(dispatch) = queue.get(index) {
                self.latch = Some(dispatch.clone());
            }
            // The newly latched element stays buffered; older ones go
            queue.remove_first_n(index);
        }

        if let Some(latch) = &self.latch {
            sink.accept(latch.clone());
        }
    }

    fn abort(&mut self, _queue: &mut DispatchQueue<D>, _t_abort: D::Stamp) {}

    fn reset(&mut self) {
        self.latch = None;
    }
}
