//! # Motion Triage Library
//!
//! This library provides the decision pipeline for triaging surveillance-style
//! footage: an adaptive background model classifies each pixel of a frame,
//! the resulting mask is cleaned up and grouped into contours, and a trigger
//! filter decides whether the frame is worth persisting.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use vigil::prelude::v1::*;
//! ```
//!
//! Video decoding and file persistence are external collaborators, abstracted
//! behind the [`source::FrameSource`] and [`sink::FrameSink`] traits.

pub mod background;
pub mod contour;
pub mod emit;
pub mod frame;
pub mod mask;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod trigger;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            background::{BackgroundModel, BackgroundParams},
            contour::{find_contours, Contour},
            emit::{output_path, FrameEmitter},
            frame::{Frame, Rect, Rgb},
            mask::{ForegroundMask, BINARY_CUTOFF},
            pipeline::{DriverState, Pipeline, PipelineConfig, PipelineReport},
            sink::FrameSink,
            source::{FrameSource, ReadStatus},
            trigger::should_emit,
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
