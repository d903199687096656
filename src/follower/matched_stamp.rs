//! Exact-range follower

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch};
use crate::follower::FollowerPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Captures the run of elements stamped inside `[range.lower, range.upper]`
///
/// Retries while the buffer could still produce matching stamps; aborts
/// once the oldest buffered element is already past the frame, since a
/// match can no longer arrive. Extraction copies the run and drops the
/// staler prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchedStamp;

impl<D> FollowerPolicy<D> for MatchedStamp
where
    D: Dispatch + Clone,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        let Some(oldest) = queue.oldest_stamp() else {
            return (State::Retry, ExtractionRange::default());
        };
        if oldest > range.upper {
            return (State::Abort, ExtractionRange::default());
        }

        let first = queue.lower_bound_index(range.lower);
        let last = queue.upper_bound_index(range.upper);
        if first < last {
            (State::Primed, ExtractionRange::new(first, last))
        } else {
            (State::Retry, ExtractionRange::default())
        }
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

    fn abort(&mut self, queue: &mut DispatchQueue<D>, t_abort: D::Stamp) {
        queue.remove_before(t_abort);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captor::Follower;
    use crate::dispatch::Stamped;

    type Elem = Stamped<i64, i64>;

    fn elem(stamp: i64) -> Elem {
        Stamped::new(stamp, stamp * 10)
    }

    fn capture(
        captor: &Follower<Elem, MatchedStamp>,
        range: CaptureRange<i64>,
    ) -> (State, Vec<i64>) {
        let mut sink = Vec::new();
        let state = captor.capture(&mut sink, &range, None);
        (state, sink.into_iter().map(|d| d.stamp).collect())
    }

    #[test]
    fn test_retry_on_empty() {
        let captor = Follower::<Elem, MatchedStamp>::new(MatchedStamp);
        let (state, _) = capture(&captor, CaptureRange::new(0, 0));
        assert_eq!(state, State::Retry);
    }

    #[test]
    fn test_exact_stamp_match() {
        let captor = Follower::<Elem, MatchedStamp>::new(MatchedStamp);
        captor.insert((0..5).map(elem));

        let (state, stamps) = capture(&captor, CaptureRange::new(2, 2));
        assert_eq!(state, State::Primed);
        assert_eq!(stamps, vec![2]);

        // Staler prefix dropped; matched element retained
        assert_eq!(captor.available_stamp_range().lower, 2);
    }

    #[test]
    fn test_run_within_range() {
        let captor = Follower::<Elem, MatchedStamp>::new(MatchedStamp);
        captor.insert((0..8).map(elem));

        let (state, stamps) = capture(&captor, CaptureRange::new(2, 5));
        assert_eq!(state, State::Primed);
        assert_eq!(stamps, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_retry_when_match_still_possible() {
        let captor = Follower::<Elem, MatchedStamp>::new(MatchedStamp);
        captor.inject(elem(1));

        // Oldest element precedes the frame; a matching stamp may follow
        let (state, _) = capture(&captor, CaptureRange::new(5, 5));
        assert_eq!(state, State::Retry);
    }

    #[test]
    fn test_abort_when_frame_overrun() {
        let captor = Follower::<Elem, MatchedStamp>::new(MatchedStamp);
        captor.inject(elem(9));

        let (state, stamps) = capture(&captor, CaptureRange::new(5, 5));
        assert_eq!(state, State::Abort);
        assert!(stamps.is_empty());
    }

    #[test]
    fn test_abort_trims_before_stamp() {
        let captor = Follower::<Elem, MatchedStamp>::new(MatchedStamp);
        captor.insert((0..6).map(elem));
        captor.abort(4);
        assert_eq!(captor.available_stamp_range().lower, 4);
    }
}
