//! # Frame and rectangle types

use bytemuck::{Pod, Zeroable};
use nalgebra as na;

/// RGB colour structure.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Convert from a slice containing `[r, g, b]` elements.
    pub fn from_rgb_slice(rgb: &[u8]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        }
    }

    /// Colour as a float vector, used by the background model.
    pub fn to_vector(self) -> na::Vector3<f32> {
        na::Vector3::new(self.r as f32, self.g as f32, self.b as f32)
    }
}

/// A single decoded video frame together with its position in the stream.
///
/// The pixel buffer is reused across reads, so a `Frame` is only valid until
/// the next call into the source that filled it.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    data: Vec<Rgb>,
    width: usize,
    height: usize,
    /// Milliseconds elapsed since the start of the stream.
    pub elapsed_ms: u64,
    /// Ordinal position in the stream, 0-based.
    pub index: u64,
}

impl Frame {
    /// Create a zeroed frame of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![Rgb::default(); width * height],
            width,
            height,
            elapsed_ms: 0,
            index: 0,
        }
    }

    /// Get width and height of the frame.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Resize the pixel buffer, used by sources that reuse the allocation.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data.resize(width * height, Rgb::default());
    }

    pub fn data(&self) -> &[Rgb] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Rgb] {
        &mut self.data
    }

    /// View the pixel buffer as raw bytes in `r, g, b` order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Stream position in whole seconds, rounded down.
    pub fn pos_sec(&self) -> u64 {
        self.elapsed_ms / 1000
    }
}

/// Axis-aligned rectangle, used for blob bounding boxes and the region of
/// interest.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check whether two rectangles strictly overlap.
    ///
    /// Rectangles that merely touch along an edge or corner do not count as
    /// overlapping. Empty rectangles overlap nothing.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.width > 0
            && self.height > 0
            && other.width > 0
            && other.height > 0
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}
