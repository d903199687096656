//! Sliding-window driver

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch};
use crate::driver::DriverPolicy;
use crate::error::{Result, TributaryError};
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Drives overlapping frames of `size` consecutive elements
///
/// Ready once `size` elements are buffered; the frame spans the stamps of
/// the oldest `size` elements. Extraction emits the whole window but pops
/// only the oldest element, so successive frames overlap by `size - 1`
/// elements (the sliding-window counterpart of [`Chunk`](crate::driver::Chunk)).
#[derive(Debug, Clone, Copy)]
pub struct Batch {
    size: usize,
}

impl Batch {
    /// Create a sliding-window driver over `size` elements
    ///
    /// # Errors
    ///
    /// Returns an invalid-configuration error when `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(TributaryError::config(
                "batch size must be greater than zero",
            ));
        }
        Ok(Self { size })
    }

    /// Configured window length
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<D> DriverPolicy<D> for Batch
where
    D: Dispatch + Clone,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &mut CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        if queue.len() < self.size {
            return (State::Retry, ExtractionRange::default());
        }
        let (Some(lower), Some(upper)) = (queue.stamp_at(0), queue.stamp_at(self.size - 1)) else {
            return (State::Retry, ExtractionRange::default());
        };
        range.lower = lower;
        range.upper = upper;
        (State::Primed, ExtractionRange::new(0, self.size))
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
        // The window tail stays buffered for the next overlapping frame:
        // only the oldest element transfers ownership.
        if let Some(oldest) = queue.pop_oldest() {
            sink.accept(oldest);
        }
        queue.copy_to(ExtractionRange::new(0, extraction.last - 1), sink);
    }

    fn abort(&mut self, queue: &mut DispatchQueue<D>, t_abort: D::Stamp) {
        queue.remove_before(t_abort);
    }
}
