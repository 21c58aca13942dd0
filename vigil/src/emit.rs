//! # Frame emission
//!
//! Derives the output path for a triggered frame, optionally burns a
//! timestamp overlay into it, and hands it to the persistence sink.

use crate::frame::{Frame, Rgb};
use crate::sink::FrameSink;
use anyhow::Result;
use chrono::NaiveTime;
use std::path::{Path, PathBuf};

/// Fixed overlay position, in pixels.
const LABEL_POS: (usize, usize) = (10, 40);

/// Derive the output file name for an emitted frame.
///
/// The format is `frame-<posSec>s-<frameIndex>f.jpg` with both numbers
/// zero-padded to five digits. Consumers of the output directory depend on
/// this exact shape.
pub fn output_path(out_dir: &Path, pos_sec: u64, index: u64) -> PathBuf {
    out_dir.join(format!("frame-{:05}s-{:05}f.jpg", pos_sec, index))
}

/// Emits triggered frames to a [`FrameSink`].
pub struct FrameEmitter {
    out_dir: PathBuf,
    start_time: Option<NaiveTime>,
}

impl FrameEmitter {
    /// Create an emitter writing below `out_dir`.
    ///
    /// If `start_time` is given, each emitted frame gets a burned-in overlay
    /// of the wall-clock time it corresponds to; otherwise frames are
    /// persisted untouched.
    pub fn new(out_dir: PathBuf, start_time: Option<NaiveTime>) -> Self {
        Self {
            out_dir,
            start_time,
        }
    }

    /// Persist `frame`, returning the path it was written to.
    ///
    /// The overlay, when configured, mutates the frame bytes in place, so
    /// this must run after all detection stages are done with the frame.
    pub fn emit(&self, frame: &mut Frame, sink: &mut dyn FrameSink) -> Result<PathBuf> {
        let path = output_path(&self.out_dir, frame.pos_sec(), frame.index);

        if let Some(start) = self.start_time {
            let stamp = start + chrono::Duration::seconds(frame.pos_sec() as i64);
            let text = format!(
                "{} {}s f{}",
                stamp.format("%H:%M:%S"),
                frame.pos_sec(),
                frame.index
            );
            draw_label(frame, &text, LABEL_POS.0, LABEL_POS.1);
        }

        sink.write_frame(&path, frame)?;
        Ok(path)
    }
}

/// Glyphs are 8x8, drawn at this magnification.
const GLYPH_SCALE: u32 = 2;

/// Burn `text` into the frame in white, clipped at the frame edges.
///
/// Rasterises the `font8x8` bitmap font through `imageproc`; the frame
/// buffer is rebuilt in place without cloning the pixels.
fn draw_label(frame: &mut Frame, text: &str, x: usize, y: usize) {
    let (w, h) = frame.dim();
    let mut img: image::RgbImage = match image::ImageBuffer::from_raw(
        w as u32,
        h as u32,
        bytemuck::cast_slice(frame.data()).to_vec(),
    ) {
        Some(img) => img,
        None => return,
    };

    let mut pen_x = x as i32;
    for ch in text.chars() {
        if let Some(rows) = font8x8::legacy::BASIC_LEGACY.get(ch as usize) {
            for (ry, row) in rows.iter().enumerate() {
                for rx in 0..8u32 {
                    if row & (1 << rx) == 0 {
                        continue;
                    }
                    let rect = imageproc::rect::Rect::at(
                        pen_x + (rx * GLYPH_SCALE) as i32,
                        y as i32 + (ry as u32 * GLYPH_SCALE) as i32,
                    )
                    .of_size(GLYPH_SCALE, GLYPH_SCALE);
                    imageproc::drawing::draw_filled_rect_mut(
                        &mut img,
                        rect,
                        image::Rgb([255, 255, 255]),
                    );
                }
            }
        }
        // Characters outside the font (and spaces) just advance the pen.
        pen_x += (8 * GLYPH_SCALE) as i32;
    }

    frame
        .data_mut()
        .copy_from_slice(bytemuck::cast_slice(&img.into_raw()));
}
