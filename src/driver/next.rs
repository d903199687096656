//! Single-element driver

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch};
use crate::driver::DriverPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Drives a frame from the single oldest buffered element
///
/// Ready whenever the buffer is non-empty; the frame range collapses to
/// the oldest element's stamp, and extraction moves that element out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Next;

impl<D: Dispatch> DriverPolicy<D> for Next {
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &mut CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        match queue.oldest_stamp() {
            None => (State::Retry, ExtractionRange::default()),
            Some(stamp) => {
                range.lower = stamp;
                range.upper = stamp;
                (State::Primed, ExtractionRange::new(0, 1))
            }
        }
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
        queue.remove_before(t_abort);
    }
}
