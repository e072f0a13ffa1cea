//! Tracking backends for PromptLight.
//!
//! Trackers issue span ids for optimization calls and receive rewards for
//! them later. The null tracker lives in `pl-core`; these are the real ones.

mod error;
mod http;
mod logging;
#[cfg(any(test, feature = "test-util"))]
mod recording;

pub use error::{Result, SetupError};
pub use http::HttpTracker;
pub use logging::LogTracker;
#[cfg(any(test, feature = "test-util"))]
pub use recording::{RecordedReward, RecordedSpan, RecordingTracker};
