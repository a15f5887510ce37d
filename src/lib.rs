//! Kinegraph is a deterministic frame-state interpolation engine for
//! procedurally animated explainer videos.
//!
//! A [`TimelineDocument`] declares diagram nodes and edges, timeline
//! events, animation tracks, and camera moves. [`Evaluator`] resolves the
//! complete visual state of every element at a frame index as a pure
//! function of `(document, frame)`, so frames may be evaluated in any
//! order and on any number of workers:
//!
//! - Load and validate a [`TimelineDocument`]
//! - Evaluate single frames with [`Evaluator::eval_frame`]
//! - Evaluate ranges with [`eval_range`], optionally on a rayon pool
#![forbid(unsafe_code)]

pub mod camera;
pub mod core;
pub mod ease;
pub mod error;
pub mod eval;
pub mod lifecycle;
pub mod model;
pub mod path;
pub mod pipeline;
pub mod scene;
pub mod segment;
pub mod tracks;

pub use crate::camera::CameraState;
pub use crate::core::{Affine, Fps, FrameIndex, FrameRange, Point, Stage, Vec2};
pub use crate::error::{KinegraphError, KinegraphResult};
pub use crate::eval::{ElementState, Evaluator, FrameState};
pub use crate::model::TimelineDocument;
pub use crate::path::PathReveal;
pub use crate::pipeline::{EvalThreading, eval_range};
