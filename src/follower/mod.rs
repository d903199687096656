//! Follower capture policies
//!
//! A follower policy never produces a frame range; it receives the
//! driver's range and decides whether its own buffer holds the right
//! elements to contribute, and which ones. Unless a policy documents
//! otherwise, `locate` leaves the buffer untouched and all mutation
//! happens in `extract`.

mod any_before;
mod before;
mod closest_before;
mod count_before;
mod latched;
mod matched_stamp;
mod ranged;

pub use any_before::AnyBefore;
pub use before::Before;
pub use closest_before::ClosestBefore;
pub use count_before::CountBefore;
pub use latched::Latched;
pub use matched_stamp::MatchedStamp;
pub use ranged::Ranged;

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch};
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Range-matching capture behavior
pub trait FollowerPolicy<D: Dispatch> {
    /// Decide whether and which buffered elements participate in `range`
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &CaptureRange<D::Stamp>,
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
