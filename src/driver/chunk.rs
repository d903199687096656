//! Tiling-window driver

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch};
use crate::driver::DriverPolicy;
use crate::error::{Result, TributaryError};
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Drives non-overlapping frames of `size` consecutive elements
///
/// Ready once `size` elements are buffered; extraction moves the whole
/// window out, so consecutive frames tile the input stream without
/// overlap (the tiling counterpart of [`Batch`](crate::driver::Batch)).
#[derive(Debug, Clone, Copy)]
pub struct Chunk {
    size: usize,
}

impl Chunk {
    /// Create a tiling driver over `size` elements
    ///
    /// # Errors
    ///
    /// Returns an invalid-configuration error when `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(TributaryError::config(
                "chunk size must be greater than zero",
            ));
        }
        Ok(Self { size })
    }

    /// Configured window length
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<D: Dispatch> DriverPolicy<D> for Chunk {
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
        queue.move_to(extraction, sink);
    }

    fn abort(&mut self, queue: &mut DispatchQueue<D>, t_abort: D::Stamp) {
        queue.remove_before(t_abort);
    }
}
