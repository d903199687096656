//! Tributary - multi-stream frame synchronization engine
//!
//! Synchronizes independent stamped input streams (sensor feeds, periodic
//! telemetry) into coherent frames. Each input owns a *captor*: an ordered
//! buffer, a capture policy, and a concurrency wrapper. A driver captor
//! decides when a frame exists and what stamp range it spans; follower
//! captors select their own buffered elements relative to that range; the
//! [`Synchronizer`] composes them into one transactional capture with
//! well-defined retry, abort, and timeout semantics.
//!
//! ```
//! use tributary::driver::Next;
//! use tributary::follower::Before;
//! use tributary::{Driver, Follower, Stamped, Synchronizer, State};
//!
//! let pose = Driver::<Stamped<i64, &str>, Next>::new(Next);
//! let imu = Follower::<Stamped<i64, &str>, Before<i64>>::new(Before::new(1));
//!
//! pose.inject(Stamped::new(4, "pose@4"));
//! imu.insert([Stamped::new(1, "imu@1"), Stamped::new(2, "imu@2"), Stamped::new(4, "imu@4")]);
//!
//! let (mut poses, mut samples) = (Vec::new(), Vec::new());
//! let result = Synchronizer::capture(
//!     (&pose, &imu),
//!     (&mut poses, &mut samples),
//!     i64::MIN,
//!     None,
//! );
//!
//! assert_eq!(result.state, State::Primed);
//! assert_eq!(poses.len(), 1);
//! assert_eq!(samples.len(), 2); // imu elements before 4 - 1
//! ```

pub mod captor;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod follower;
pub mod lock;
pub mod queue;
pub mod sink;
pub mod synchronizer;

// Re-export main components
pub use captor::{Driver, Follower, QueueMonitor, State};
pub use dispatch::{CaptureRange, Dispatch, StampType, Stamped};
pub use driver::DriverPolicy;
pub use error::{Result, TributaryError};
pub use follower::FollowerPolicy;
pub use lock::{BlockingLock, Deadline, LockPolicy, NoLock, PollingLock};
pub use queue::{DispatchQueue, ExtractionRange};
pub use sink::{DispatchSink, NoCapture};
pub use synchronizer::{
    CaptureFrame, FrameDriver, FrameFollower, FrameGraph, FrameResult, Synchronizer,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
