//! Recognizes directional hand swipes in a video stream.
//!
//! Each tick takes one frame from a [`FrameSource`], keeps the skin-colored
//! pixels, diffs them against the previous frame and feeds the centroid of
//! the changed pixels to a small state machine that emits at most one
//! [`MotionEvent`] swipe per burst of motion.

pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod scheduler;
pub mod service;
pub mod sink;
pub mod source;
pub mod types;

pub use config::{HsvFilterConfig, MotionThresholds, PipelineConfig};
pub use error::{CaptureError, ConfigError, MotionError};
pub use gesture::{GestureClassifier, GestureState};
pub use pipeline::{FramePipeline, TickReport};
pub use scheduler::{IntervalScheduler, ManualScheduler, Scheduler};
pub use service::{MotionService, StopHandle, TickOutcome};
pub use sink::{EventSink, Subscribers};
pub use source::{FrameSource, ReplayItem, ReplaySource};
pub use types::{Centroid, EventKind, Frame, Hsv, MotionEvent, SwipeDirection};
