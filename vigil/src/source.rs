//! # Frame sources

use crate::frame::Frame;
use anyhow::Result;

/// Outcome of a single read from a [`FrameSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    /// A frame was decoded and written into the caller's buffer.
    Frame,
    /// The decoder produced no picture for this position. This is a transient
    /// gap, not the end of the stream; the caller should retry.
    Empty,
    /// The stream is exhausted. No further reads will succeed.
    EndOfStream,
}

/// Ordered, finite source of raster frames.
///
/// Implementations deliver frames in strictly increasing index and elapsed
/// time order. A decode or I/O failure is reported through `Err` and is
/// terminal for the stream.
pub trait FrameSource {
    /// Read the next frame of the stream into `frame`.
    ///
    /// `frame` is a reusable buffer: it is resized and fully overwritten when
    /// `Ok(ReadStatus::Frame)` is returned, and untouched otherwise.
    fn read_frame(&mut self, frame: &mut Frame) -> Result<ReadStatus>;

    /// Get the framerate of the stream.
    ///
    /// This will return `Some(framerate)` if it is known. On realtime streams
    /// it may not always be known. In such cases, `None` is returned.
    fn get_framerate(&self) -> Option<f64>;

    /// Get the frame dimensions of the stream.
    ///
    /// This will return `Some((width, height))` if they are known before the
    /// first frame is decoded.
    fn get_dimensions(&self) -> Option<(usize, usize)>;
}
