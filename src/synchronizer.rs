//! Transactional frame capture across a set of captors
//!
//! The synchronizer composes one frame driver and any number of follower
//! captors, expressed as a tuple: `(&driver, &follower_a, &follower_b)`.
//! The first slot either drives the frame range from its own buffer (a
//! [`Driver`] captor) or supplies it directly (a [`CaptureRange`] literal
//! for externally sequenced frames). Composition is checked entirely at
//! compile time: the tuple impls only accept a driver-like head, follower
//! tails, and a single stamp type across every member.

use std::convert::Infallible;
use std::marker::PhantomData;

use tracing::trace;

use crate::captor::{Driver, Follower, State};
use crate::dispatch::{CaptureRange, Dispatch, StampType};
use crate::driver::DriverPolicy;
use crate::follower::FollowerPolicy;
use crate::lock::{Deadline, LockPolicy};
use crate::queue::ExtractionRange;
use crate::sink::DispatchSink;

/// Outcome of one synchronizer frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameResult<S: StampType> {
    /// Composition state on exit
    pub state: State,
    /// Driving stamp range; meaningful only when the frame primed
    pub range: CaptureRange<S>,
}

impl<S: StampType> FrameResult<S> {
    /// Checks if the frame primed and its elements were extracted
    #[inline]
    pub fn is_primed(&self) -> bool {
        self.state == State::Primed
    }
}

impl<S: StampType> Default for FrameResult<S> {
    fn default() -> Self {
        Self {
            state: State::Retry,
            range: CaptureRange::default(),
        }
    }
}

/// Uninhabited dispatch type for frame slots that carry no elements
///
/// Used as the element type of a [`CaptureRange`] literal standing in the
/// driver position; its sink is never fed.
pub struct PhantomDispatch<S> {
    never: Infallible,
    _stamp: PhantomData<S>,
}

impl<S: StampType> Dispatch for PhantomDispatch<S> {
    type Stamp = S;
    type Value = ();

    fn stamp(&self) -> S {
        match self.never {}
    }

    fn value(&self) -> &() {
        match self.never {}
    }
}

/// First slot of a frame composition: produces the frame stamp range
pub trait FrameDriver<S: StampType> {
    /// Element type this slot extracts
    type Dispatch: Dispatch<Stamp = S>;

    /// Produce the frame range and name the participating elements
    fn drive(&self, range: &mut CaptureRange<S>, deadline: Deadline) -> (State, ExtractionRange);

    /// State reported when the produced range violates the caller's lower
    /// bound
    fn lower_bound_state(&self) -> State {
        State::ErrorDriverLowerBoundExceeded
    }

    /// Apply the locate decision to buffer and sink
    fn extract_into<K: DispatchSink<Self::Dispatch>>(
        &self,
        sink: K,
        extraction: ExtractionRange,
        range: &CaptureRange<S>,
    );

    /// Forward the frame outcome to any attached monitoring
    fn update_monitor(&self, range: &CaptureRange<S>, state: State);

    /// Reset buffered data and policy state
    fn reset_slot(&self);

    /// Abort any in-progress capture relative to `t_abort`
    fn abort_slot(&self, t_abort: S);

    /// Trim buffered data before `t_remove`
    fn remove_slot(&self, t_remove: S);
}

/// Tail slot of a frame composition: matches the driver-produced range
pub trait FrameFollower<S: StampType> {
    /// Element type this slot extracts
    type Dispatch: Dispatch<Stamp = S>;

    /// Decide participation in the driver-produced range
    fn follow(&self, range: &CaptureRange<S>, deadline: Deadline) -> (State, ExtractionRange);

    /// Apply the locate decision to buffer and sink
    fn extract_into<K: DispatchSink<Self::Dispatch>>(
        &self,
        sink: K,
        extraction: ExtractionRange,
        range: &CaptureRange<S>,
    );

    /// Forward the frame outcome to any attached monitoring
    fn update_monitor(&self, range: &CaptureRange<S>, state: State);

    /// Reset buffered data and policy state
    fn reset_slot(&self);

    /// Abort any in-progress capture relative to `t_abort`
    fn abort_slot(&self, t_abort: S);
}

impl<D, P, L> FrameDriver<D::Stamp> for Driver<D, P, L>
where
    D: Dispatch,
    P: DriverPolicy<D>,
    L: LockPolicy,
{
    type Dispatch = D;

    fn drive(
        &self,
        range: &mut CaptureRange<D::Stamp>,
        deadline: Deadline,
    ) -> (State, ExtractionRange) {
        self.locate(range, deadline)
    }

    fn extract_into<K: DispatchSink<D>>(
        &self,
        sink: K,
        extraction: ExtractionRange,
        range: &CaptureRange<D::Stamp>,
    ) {
        self.extract(sink, extraction, range);
    }

    fn update_monitor(&self, range: &CaptureRange<D::Stamp>, state: State) {
        self.update_queue_monitor(range, state);
    }

    fn reset_slot(&self) {
        self.reset();
    }

    fn abort_slot(&self, t_abort: D::Stamp) {
        self.abort(t_abort);
    }

    fn remove_slot(&self, t_remove: D::Stamp) {
        self.remove(t_remove);
    }
}

impl<S: StampType> FrameDriver<S> for CaptureRange<S> {
    type Dispatch = PhantomDispatch<S>;

    fn drive(&self, range: &mut CaptureRange<S>, _deadline: Deadline) -> (State, ExtractionRange) {
        *range = *self;
        (State::Primed, ExtractionRange::default())
    }

    fn lower_bound_state(&self) -> State {
        // An externally supplied range is not a driver error; the frame is
        // simply not composable.
        State::Abort
    }

    fn extract_into<K: DispatchSink<PhantomDispatch<S>>>(
        &self,
        _sink: K,
        _extraction: ExtractionRange,
        _range: &CaptureRange<S>,
    ) {
    }

    fn update_monitor(&self, _range: &CaptureRange<S>, _state: State) {}

    fn reset_slot(&self) {}

    fn abort_slot(&self, _t_abort: S) {}

    fn remove_slot(&self, _t_remove: S) {}
}

impl<D, P, L> FrameFollower<D::Stamp> for Follower<D, P, L>
where
    D: Dispatch,
    P: FollowerPolicy<D>,
    L: LockPolicy,
{
    type Dispatch = D;

    fn follow(
        &self,
        range: &CaptureRange<D::Stamp>,
        deadline: Deadline,
    ) -> (State, ExtractionRange) {
        self.locate(range, deadline)
    }

    fn extract_into<K: DispatchSink<D>>(
        &self,
        sink: K,
        extraction: ExtractionRange,
        range: &CaptureRange<D::Stamp>,
    ) {
        self.extract(sink, extraction, range);
    }

    fn update_monitor(&self, range: &CaptureRange<D::Stamp>, state: State) {
        self.update_queue_monitor(range, state);
    }

    fn reset_slot(&self) {
        self.reset();
    }

    fn abort_slot(&self, t_abort: D::Stamp) {
        self.abort(t_abort);
    }
}

/// Stamp-wide operations over a captor composition
pub trait FrameGraph<S: StampType> {
    /// Reset every member
    fn reset_frame(&self);

    /// Abort every member relative to `t_abort`
    fn abort_frame(&self, t_abort: S);

    /// Trim the driver before `t_remove`; followers are range-driven and
    /// unaffected
    fn remove_frame(&self, t_remove: S);
}

/// One transactional capture over a captor composition and matching sinks
pub trait CaptureFrame<S: StampType, Sinks>: FrameGraph<S> {
    /// Compose one frame, extracting into `sinks` when every member primes
    fn capture_frame(&self, sinks: Sinks, lower_bound: S, deadline: Deadline) -> FrameResult<S>;
}

macro_rules! impl_capture_frame {
    ($(($F:ident, $K:ident, $f:ident, $sink:ident, $ex:ident)),*) => {
        impl<'t, S, Drv, $($F,)*> FrameGraph<S> for (&'t Drv, $(&'t $F,)*)
        where
            S: StampType,
            Drv: FrameDriver<S>,
            $($F: FrameFollower<S>,)*
        {
            fn reset_frame(&self) {
                let (driver, $($f,)*) = *self;
                driver.reset_slot();
                $( $f.reset_slot(); )*
            }

            fn abort_frame(&self, t_abort: S) {
                let (driver, $($f,)*) = *self;
                driver.abort_slot(t_abort);
                $( $f.abort_slot(t_abort); )*
            }

            fn remove_frame(&self, t_remove: S) {
                let (driver, ..) = *self;
                driver.remove_slot(t_remove);
            }
        }

        impl<'t, S, Drv, DK, $($F, $K,)*> CaptureFrame<S, (DK, $($K,)*)> for (&'t Drv, $(&'t $F,)*)
        where
            S: StampType,
            Drv: FrameDriver<S>,
            DK: DispatchSink<Drv::Dispatch>,
            $(
                $F: FrameFollower<S>,
                $K: DispatchSink<$F::Dispatch>,
            )*
        {
            fn capture_frame(
                &self,
                sinks: (DK, $($K,)*),
                lower_bound: S,
                deadline: Deadline,
            ) -> FrameResult<S> {
                let (driver, $($f,)*) = *self;
                #[allow(unused_mut)]
                let (mut driver_sink, $(mut $sink,)*) = sinks;

                let mut result = FrameResult::default();

                let (driver_state, driver_extraction) =
                    driver.drive(&mut result.range, deadline);
                result.state = driver_state;

                // Monotonicity guard against frames older than the caller
                // already consumed
                if result.state == State::Primed && result.range.upper < lower_bound {
                    result.state = driver.lower_bound_state();
                }

                $(
                    let mut $ex = ExtractionRange::default();
                    if result.state == State::Primed {
                        let (state, extraction) = $f.follow(&result.range, deadline);
                        result.state = state;
                        $ex = extraction;
                    }
                )*

                // No partial frames: extraction only runs once every member
                // has agreed on the range
                if result.state == State::Primed {
                    driver.extract_into(&mut driver_sink, driver_extraction, &result.range);
                    $( $f.extract_into(&mut $sink, $ex, &result.range); )*
                }

                if result.state != State::Retry {
                    driver.update_monitor(&result.range, result.state);
                    $( $f.update_monitor(&result.range, result.state); )*
                }

                trace!(state = %result.state, "frame capture");
                result
            }
        }
    };
}

impl_capture_frame!();
impl_capture_frame!((F1, K1, f1, s1, e1));
impl_capture_frame!((F1, K1, f1, s1, e1), (F2, K2, f2, s2, e2));
impl_capture_frame!((F1, K1, f1, s1, e1), (F2, K2, f2, s2, e2), (F3, K3, f3, s3, e3));
impl_capture_frame!(
    (F1, K1, f1, s1, e1),
    (F2, K2, f2, s2, e2),
    (F3, K3, f3, s3, e3),
    (F4, K4, f4, s4, e4)
);
impl_capture_frame!(
    (F1, K1, f1, s1, e1),
    (F2, K2, f2, s2, e2),
    (F3, K3, f3, s3, e3),
    (F4, K4, f4, s4, e4),
    (F5, K5, f5, s5, e5)
);
impl_capture_frame!(
    (F1, K1, f1, s1, e1),
    (F2, K2, f2, s2, e2),
    (F3, K3, f3, s3, e3),
    (F4, K4, f4, s4, e4),
    (F5, K5, f5, s5, e5),
    (F6, K6, f6, s6, e6)
);
impl_capture_frame!(
    (F1, K1, f1, s1, e1),
    (F2, K2, f2, s2, e2),
    (F3, K3, f3, s3, e3),
    (F4, K4, f4, s4, e4),
    (F5, K5, f5, s5, e5),
    (F6, K6, f6, s6, e6),
    (F7, K7, f7, s7, e7)
);
impl_capture_frame!(
    (F1, K1, f1, s1, e1),
    (F2, K2, f2, s2, e2),
    (F3, K3, f3, s3, e3),
    (F4, K4, f4, s4, e4),
    (F5, K5, f5, s5, e5),
    (F6, K6, f6, s6, e6),
    (F7, K7, f7, s7, e7),
    (F8, K8, f8, s8, e8)
);

/// Composes one driver and N follower captors into transactional frames
///
/// All operations are associated functions over borrowed captor tuples;
/// the synchronizer holds no state of its own.
pub struct Synchronizer;

impl Synchronizer {
    /// Run one frame capture across `captors`, extracting into `sinks`
    ///
    /// `lower_bound` rejects frames at or below stamps the caller has
    /// already consumed; `deadline` bounds the data waits of blocking
    /// captors. Sinks advance in place on a primed frame and are left
    /// untouched otherwise.
    pub fn capture<S, C, Sinks>(
        captors: C,
        sinks: Sinks,
        lower_bound: S,
        deadline: Deadline,
    ) -> FrameResult<S>
    where
        S: StampType,
        C: CaptureFrame<S, Sinks>,
    {
        captors.capture_frame(sinks, lower_bound, deadline)
    }

    /// Reset every member captor
    pub fn reset<S: StampType>(captors: impl FrameGraph<S>) {
        captors.reset_frame();
    }

    /// Abort every member captor relative to `t_abort`
    pub fn abort<S: StampType>(captors: impl FrameGraph<S>, t_abort: S) {
        captors.abort_frame(t_abort);
    }

    /// Trim driver data before `t_remove`
    pub fn remove<S: StampType>(captors: impl FrameGraph<S>, t_remove: S) {
        captors.remove_frame(t_remove);
    }
}
