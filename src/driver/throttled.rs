//! Rate-limited driver

use crate::captor::State;
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::driver::DriverPolicy;
use crate::queue::{DispatchQueue, ExtractionRange};
use crate::sink::DispatchSink;

/// Drives single-element frames no closer together than `period`
///
/// Ready at the first buffered element whose stamp gap from the last
/// emitted stamp meets the period (or at any element before the first
/// emission). Extraction moves the chosen element to the sink and drops
/// the skipped-over elements in between.
#[derive(Debug, Clone, Copy)]
pub struct Throttled<S: StampType> {
    period: S::Offset,
    previous: Option<S>,
}

impl<S: StampType> Throttled<S> {
    /// Create a throttled driver emitting at most once per `period`
    pub fn new(period: S::Offset) -> Self {
        Self {
            period,
            previous: None,
        }
    }

    /// Configured minimum gap between emitted stamps
    pub fn period(&self) -> S::Offset {
        self.period
    }
}

impl<D> DriverPolicy<D> for Throttled<D::Stamp>
where
    D: Dispatch,
{
    fn locate(
        &self,
        queue: &DispatchQueue<D>,
        range: &mut CaptureRange<D::Stamp>,
    ) -> (State, ExtractionRange) {
        for (index, dispatch) in queue.iter().enumerate() {
            let stamp = dispatch.stamp();
            let due = match self.previous {
                None => true,
                Some(previous) => stamp.distance(previous) >= self.period,
            };
            if due {
                range.lower = stamp;
                range.upper = stamp;
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
        range: &CaptureRange<D::Stamp>,
    ) {
        if !extraction.is_valid() {
            return;
        }
        // Elements under the throttle threshold are dropped, not emitted
        queue.remove_first_n(extraction.first);
        queue.move_to(ExtractionRange::new(0, 1), sink);
        self.previous = Some(range.lower);
    }

    fn abort(&mut self, queue: &mut DispatchQueue<D>, t_abort: D::Stamp) {
        queue.remove_before(t_abort);
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captor::Driver;
    use crate::dispatch::Stamped;

    type Elem = Stamped<i64, i64>;

    fn elem(stamp: i64) -> Elem {
        Stamped::new(stamp, stamp * 10)
    }

    fn capture(captor: &Driver<Elem, Throttled<i64>>) -> (State, CaptureRange<i64>, Vec<Elem>) {
        let mut sink = Vec::new();
        let mut range = CaptureRange::default();
        let state = captor.capture(&mut sink, &mut range, None);
        (state, range, sink)
    }

    #[test]
    fn test_retry_on_empty() {
        let captor = Driver::<Elem, Throttled<i64>>::new(Throttled::new(4));
        let (state, _, sink) = capture(&captor);
        assert_eq!(state, State::Retry);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_first_element_emits_immediately() {
        let captor = Driver::<Elem, Throttled<i64>>::new(Throttled::new(4));
        captor.insert((1..=9).map(elem));

        let (state, range, sink) = capture(&captor);
        assert_eq!(state, State::Primed);
        assert_eq!((range.lower, range.upper), (1, 1));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_skips_elements_under_period() {
        let captor = Driver::<Elem, Throttled<i64>>::new(Throttled::new(4));
        captor.insert((1..=9).map(elem));

        let (_, first, _) = capture(&captor);
        assert_eq!(first.lower, 1);

        // 2, 3, 4 fall inside the throttle window and are dropped
        let (state, second, sink) = capture(&captor);
        assert_eq!(state, State::Primed);
        assert_eq!((second.lower, second.upper), (5, 5));
        assert_eq!(sink.len(), 1);
        assert_eq!(captor.available_stamp_range().lower, 6);
    }

    #[test]
    fn test_retry_while_gap_under_period() {
        let captor = Driver::<Elem, Throttled<i64>>::new(Throttled::new(4));
        captor.insert([elem(0)]);

        let (state, _, _) = capture(&captor);
        assert_eq!(state, State::Primed);

        captor.insert([elem(1), elem(2), elem(3)]);
        let (state, _, sink) = capture(&captor);
        assert_eq!(state, State::Retry);
        assert!(sink.is_empty());
        assert_eq!(captor.len(), 3);

        captor.inject(elem(4));
        let (state, range, _) = capture(&captor);
        assert_eq!(state, State::Primed);
        assert_eq!(range.lower, 4);
    }

    #[test]
    fn test_reset_forgets_previous_emission() {
        let captor = Driver::<Elem, Throttled<i64>>::new(Throttled::new(100));
        captor.inject(elem(0));
        let (state, _, _) = capture(&captor);
        assert_eq!(state, State::Primed);

        captor.inject(elem(1));
        let (state, _, _) = capture(&captor);
        assert_eq!(state, State::Retry);

        captor.reset();
        captor.inject(elem(1));
        let (state, range, _) = capture(&captor);
        assert_eq!(state, State::Primed);
        assert_eq!(range.lower, 1);
    }
}
