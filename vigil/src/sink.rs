//! # Frame persistence

use crate::frame::Frame;
use anyhow::Result;
use std::path::Path;

/// Durable frame storage.
///
/// Path collisions overwrite silently; there is no dedup. A write failure is
/// reported through `Err` and it is up to the caller whether to continue.
pub trait FrameSink {
    /// Persist `frame` at `path`.
    fn write_frame(&mut self, path: &Path, frame: &Frame) -> Result<()>;
}
