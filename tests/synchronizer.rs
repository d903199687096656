//! End-to-end frame composition tests
//!
//! Exercises the synchronizer across captor kinds, lock variants, and
//! real producer/consumer threads.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tributary::driver::{Batch, Next, Throttled};
use tributary::follower::{AnyBefore, Before, CountBefore, Latched, MatchedStamp, Ranged};
use tributary::{
    BlockingLock, CaptureRange, DispatchQueue, Driver, Follower, NoCapture, PollingLock,
    QueueMonitor, Stamped, State, Synchronizer,
};

type Elem = Stamped<i64, i64>;

fn elem(stamp: i64) -> Elem {
    Stamped::new(stamp, stamp * 10)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tributary=trace")
        .try_init();
}

#[test]
fn composed_frame_with_three_followers() {
    init_tracing();

    let driver = Driver::<Elem, Next>::new(Next);
    let before = Follower::<Elem, Before<i64>>::new(Before::new(1));
    let matched = Follower::<Elem, MatchedStamp>::new(MatchedStamp);
    let ranged = Follower::<Elem, Ranged<i64>>::new(Ranged::new(0));

    driver.inject(elem(5));
    before.insert([elem(2), elem(3), elem(6)]);
    matched.insert([elem(4), elem(5), elem(6)]);
    ranged.insert([elem(3), elem(5), elem(7)]);

    let (mut d_out, mut b_out, mut m_out, mut r_out) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let result = Synchronizer::capture(
        (&driver, &before, &matched, &ranged),
        (&mut d_out, &mut b_out, &mut m_out, &mut r_out),
        i64::MIN,
        None,
    );

    assert_eq!(result.state, State::Primed);
    assert_eq!((result.range.lower, result.range.upper), (5, 5));
    assert_eq!(d_out, vec![elem(5)]);
    // Before(1): elements with stamp < 4
    assert_eq!(b_out, vec![elem(2), elem(3)]);
    // MatchedStamp: the run inside [5, 5]
    assert_eq!(m_out, vec![elem(5)]);
    // Ranged(0): [5, 5] plus one bracket on each side
    assert_eq!(r_out, vec![elem(3), elem(5), elem(7)]);
}

#[test]
fn frame_repeats_identically_for_deterministic_policies() {
    let stamps: Vec<i64> = vec![1, 3, 4, 7, 9, 12, 15, 16, 20];

    let run = |batched: bool| -> Vec<(i64, i64, Vec<i64>)> {
        let driver = Driver::<Elem, Throttled<i64>>::new(Throttled::new(4));
        let follower = Follower::<Elem, CountBefore<i64>>::new(
            CountBefore::new(1, 0).expect("valid count"),
        );

        // Follower data leads the driver by one stamp so every frame has
        // history to count
        if batched {
            driver.insert(stamps.iter().copied().map(elem));
            follower.insert(stamps.iter().map(|&stamp| elem(stamp - 1)));
        } else {
            for &stamp in &stamps {
                driver.inject(elem(stamp));
                follower.inject(elem(stamp - 1));
            }
        }

        let mut frames = Vec::new();
        loop {
            let (mut d_out, mut f_out) = (Vec::new(), Vec::new());
            let result = Synchronizer::capture(
                (&driver, &follower),
                (&mut d_out, &mut f_out),
                i64::MIN,
                None,
            );
            if result.state != State::Primed {
                break;
            }
            frames.push((
                result.range.lower,
                result.range.upper,
                f_out.iter().map(|d| d.stamp).collect(),
            ));
        }
        frames
    };

    let incremental = run(false);
    assert_eq!(incremental, run(true));

    // Throttled(4) over the stamp sequence settles on these frames
    let lowers: Vec<i64> = incremental.iter().map(|frame| frame.0).collect();
    assert_eq!(lowers, vec![1, 7, 12, 16, 20]);
}

#[test]
fn no_capture_probe_then_real_capture() {
    let driver = Driver::<Elem, Next>::new(Next);
    let latched = Follower::<Elem, Latched<Elem>>::new(Latched::new(2));

    driver.inject(elem(10));
    latched.inject(elem(3));

    // Probe: latch updates and prefix trimming still run, elements are
    // discarded instead of delivered
    let result = Synchronizer::capture((&driver, &latched), (NoCapture, NoCapture), i64::MIN, None);
    assert_eq!(result.state, State::Primed);
    assert!(driver.is_empty());

    // The latch survives for the next frame even with its buffer drained
    latched.remove(i64::MAX);
    driver.inject(elem(20));

    let (mut d_out, mut l_out) = (Vec::new(), Vec::new());
    let result = Synchronizer::capture(
        (&driver, &latched),
        (&mut d_out, &mut l_out),
        i64::MIN,
        None,
    );
    assert_eq!(result.state, State::Primed);
    assert_eq!(l_out, vec![elem(3)]);
}

#[test]
fn lower_bound_error_leaves_all_buffers_unchanged() {
    let driver = Driver::<Elem, Next>::new(Next);
    let follower = Follower::<Elem, AnyBefore<i64>>::new(AnyBefore::new(0));

    driver.inject(elem(10));
    follower.insert([elem(1), elem(2)]);

    let (mut d_out, mut f_out) = (Vec::new(), Vec::new());
    let result = Synchronizer::capture(
        (&driver, &follower),
        (&mut d_out, &mut f_out),
        100,
        None,
    );

    assert_eq!(result.state, State::ErrorDriverLowerBoundExceeded);
    assert!(d_out.is_empty());
    assert!(f_out.is_empty());
    assert_eq!(driver.len(), 1);
    assert_eq!(follower.len(), 2);
}

struct BacklogGate {
    limit: usize,
    outcomes: Arc<Mutex<Vec<State>>>,
}

impl QueueMonitor<Elem> for BacklogGate {
    fn check(&mut self, queue: &DispatchQueue<Elem>, _range: &CaptureRange<i64>) -> bool {
        queue.len() <= self.limit
    }

    fn update(&mut self, _queue: &DispatchQueue<Elem>, _range: &CaptureRange<i64>, state: State) {
        self.outcomes.lock().unwrap().push(state);
    }
}

#[test]
fn queue_monitor_gates_frames_and_observes_outcomes() {
    let outcomes = Arc::new(Mutex::new(Vec::new()));

    let driver = Driver::<Elem, Next>::new(Next);
    let follower = Follower::<Elem, AnyBefore<i64>>::new(AnyBefore::new(0)).with_queue_monitor(
        Box::new(BacklogGate {
            limit: 2,
            outcomes: Arc::clone(&outcomes),
        }),
    );

    driver.inject(elem(5));
    follower.insert((1..5).map(elem));

    // Backlog of 4 exceeds the gate: frame skipped, nothing consumed
    let (mut d_out, mut f_out) = (Vec::new(), Vec::new());
    let result = Synchronizer::capture(
        (&driver, &follower),
        (&mut d_out, &mut f_out),
        i64::MIN,
        None,
    );
    assert_eq!(result.state, State::SkipFrameQueuePrecondition);
    assert!(d_out.is_empty());
    assert_eq!(driver.len(), 1);
    assert_eq!(follower.len(), 4);

    // Shrinking the backlog opens the gate for the next frame
    follower.set_capacity(2);
    let result = Synchronizer::capture(
        (&driver, &follower),
        (&mut d_out, &mut f_out),
        i64::MIN,
        None,
    );
    assert_eq!(result.state, State::Primed);
    assert_eq!(f_out.iter().map(|d| d.stamp).collect::<Vec<_>>(), vec![3, 4]);

    // The monitor saw both frame outcomes
    assert_eq!(
        outcomes.lock().unwrap().as_slice(),
        &[State::SkipFrameQueuePrecondition, State::Primed]
    );
}

#[test]
fn polling_lock_frames_across_producer_threads() {
    let driver = Driver::<Elem, Next, PollingLock>::new(Next);
    let follower = Follower::<Elem, AnyBefore<i64>, PollingLock>::new(AnyBefore::new(0));

    crossbeam::scope(|scope| {
        scope.spawn(|_| {
            for stamp in 0..100 {
                driver.inject(elem(stamp));
            }
        });
        scope.spawn(|_| {
            for stamp in 0..100 {
                follower.inject(elem(stamp));
            }
        });

        // Poll until every driving element has been consumed
        let mut driven = 0;
        while driven < 100 {
            let (mut d_out, mut f_out) = (Vec::new(), Vec::new());
            let result = Synchronizer::capture(
                (&driver, &follower),
                (&mut d_out, &mut f_out),
                i64::MIN,
                None,
            );
            if result.state == State::Primed {
                driven += d_out.len();
            }
        }
    })
    .expect("scope panicked");

    assert!(driver.is_empty());
}

#[test]
fn blocking_capture_times_out_when_window_never_fills() {
    let driver = Driver::<Elem, Batch, BlockingLock>::new(Batch::new(10).expect("valid size"));
    let follower = Follower::<Elem, AnyBefore<i64>, BlockingLock>::new(AnyBefore::new(0));

    crossbeam::scope(|scope| {
        let producer = scope.spawn(|_| {
            // Never enough to satisfy Batch(10)
            for stamp in 0..5 {
                driver.inject(elem(stamp));
                std::thread::sleep(Duration::from_millis(2));
            }
        });

        let deadline = Some(Instant::now() + Duration::from_millis(50));
        let (mut d_out, mut f_out) = (Vec::new(), Vec::new());
        let result = Synchronizer::capture(
            (&driver, &follower),
            (&mut d_out, &mut f_out),
            i64::MIN,
            deadline,
        );

        assert_eq!(result.state, State::Timeout);
        assert!(d_out.is_empty());
        assert!(f_out.is_empty());

        producer.join().expect("producer panicked");
    })
    .expect("scope panicked");

    assert_eq!(driver.len(), 5);
}

#[test]
fn blocking_capture_unblocks_when_data_arrives() {
    let driver = Driver::<Elem, Batch, BlockingLock>::new(Batch::new(3).expect("valid size"));
    let follower = Follower::<Elem, AnyBefore<i64>, BlockingLock>::new(AnyBefore::new(0));
    follower.insert([elem(0), elem(1)]);

    crossbeam::scope(|scope| {
        scope.spawn(|_| {
            for stamp in 0..3 {
                std::thread::sleep(Duration::from_millis(5));
                driver.inject(elem(stamp));
            }
        });

        let (mut d_out, mut f_out) = (Vec::new(), Vec::new());
        let result = Synchronizer::capture(
            (&driver, &follower),
            (&mut d_out, &mut f_out),
            i64::MIN,
            None,
        );

        assert_eq!(result.state, State::Primed);
        assert_eq!((result.range.lower, result.range.upper), (0, 2));
        assert_eq!(d_out.len(), 3);
        assert_eq!(f_out.len(), 2);
    })
    .expect("scope panicked");
}

#[test]
fn abort_wakes_blocked_consumer() {
    let driver = Driver::<Elem, Next, BlockingLock>::new(Next);

    crossbeam::scope(|scope| {
        let consumer = scope.spawn(|_| {
            let mut out = Vec::new();
            Synchronizer::capture((&driver,), (&mut out,), i64::MIN, None)
        });

        std::thread::sleep(Duration::from_millis(20));
        Synchronizer::abort((&driver,), i64::MAX);

        let result = consumer.join().expect("consumer panicked");
        assert_eq!(result.state, State::Abort);
    })
    .expect("scope panicked");

    // The abort is single-shot: the captor accepts frames again
    driver.inject(elem(1));
    let mut out = Vec::new();
    let result = Synchronizer::capture((&driver,), (&mut out,), i64::MIN, None);
    assert_eq!(result.state, State::Primed);
}

#[test]
fn capture_range_literal_with_blocking_followers() {
    let matched = Follower::<Elem, MatchedStamp, BlockingLock>::new(MatchedStamp);

    crossbeam::scope(|scope| {
        scope.spawn(|_| {
            std::thread::sleep(Duration::from_millis(5));
            matched.insert((0..6).map(elem));
        });

        let range = CaptureRange::new(2, 4);
        let mut out = Vec::new();
        let result = Synchronizer::capture((&range, &matched), (NoCapture, &mut out), i64::MIN, None);

        assert_eq!(result.state, State::Primed);
        assert_eq!(
            out.iter().map(|d| d.stamp).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    })
    .expect("scope panicked");
}
