//! Driver capture policies
//!
//! A driver policy inspects its own buffer and decides when a frame
//! exists, emitting the stamp range that follower captors will match
//! against. One driver heads every synchronizer composition.

mod batch;
mod chunk;
mod next;
mod throttled;

pub use batch::Batch;
pub use chunk::Chunk;
pub use next::Next;
pub use throttled::Throttled;

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch};
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Frame-range-producing capture behavior
///
/// `locate` reads the buffer and, when ready, writes the frame range and
/// names the participating elements; `extract` applies that decision,
/// transferring or dropping buffer elements as the policy dictates.
pub trait DriverPolicy<D: Dispatch> {
    /// Decide frame readiness and produce the frame stamp range
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &mut CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange);

    /// Apply a locate decision to the buffer and output sink
    fn extract<K: DispatchSink<D>>(
        &mut self,
        queue: &mut DispatchQueue<D>,
        sink: &mut K,
        extraction: ExtractionRange,
        range: &CaptureRange<D::Stamp>,
    );

    /// Behavior on an external abort signaled at `t_abort`
    fn abort(&mut self, queue: &mut DispatchQueue<D>, t_abort: D::Stamp);

    /// Restore policy-specific state to its initial value
    fn reset(&mut self) {}
}
