//! JPEG persistence for emitted frames.

use std::path::Path;
use vigil::prelude::v1::*;

/// Writes frames as JPEG stills, overwriting silently on path collision.
#[derive(Default)]
pub struct JpegSink;

impl FrameSink for JpegSink {
    fn write_frame(&mut self, path: &Path, frame: &Frame) -> Result<()> {
        let (w, h) = frame.dim();
        let img = image::RgbImage::from_raw(w as u32, h as u32, frame.as_bytes().to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", w, h))?;
        img.save(path)
            .map_err(|e| anyhow!("cannot write {}: {}", path.display(), e))
    }
}
