//! # YUV4MPEG2 frame source
//!
//! Implements [`FrameSource`] over uncompressed `.y4m` streams. Planar YUV
//! is converted to RGB on read, and each frame is tagged with elapsed
//! milliseconds derived from the stream's frame rate header.

use log::*;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use vigil::prelude::v1::*;

/// Chroma subsampling factors of a colourspace, horizontal and vertical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sampling {
    Mono,
    /// 4:2:0 - chroma halved in both directions.
    Half2x2,
    /// 4:2:2 - chroma halved horizontally.
    Half2x1,
    /// 4:4:4 - full-resolution chroma.
    Full,
}

impl Sampling {
    fn from_colorspace(cs: y4m::Colorspace) -> Result<Self> {
        use y4m::Colorspace::*;
        match cs {
            Cmono => Ok(Sampling::Mono),
            C420 | C420jpeg | C420paldv | C420mpeg2 => Ok(Sampling::Half2x2),
            C422 => Ok(Sampling::Half2x1),
            C444 => Ok(Sampling::Full),
            other => Err(anyhow!("unsupported colourspace {:?}", other)),
        }
    }
}

/// Frame source over a YUV4MPEG2 stream.
pub struct Y4mSource<R: Read> {
    decoder: y4m::Decoder<R>,
    sampling: Sampling,
    fps_num: u64,
    fps_den: u64,
    index: u64,
}

impl Y4mSource<BufReader<File>> {
    /// Open a `.y4m` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow!("cannot open {}: {}", path.display(), e))?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> Y4mSource<R> {
    /// Parse the stream header and prepare for reading frames.
    pub fn from_reader(reader: R) -> Result<Self> {
        let decoder =
            y4m::decode(reader).map_err(|e| anyhow!("not a YUV4MPEG2 stream: {:?}", e))?;
        let sampling = Sampling::from_colorspace(decoder.get_colorspace())?;
        let fps = decoder.get_framerate();

        debug!(
            "y4m stream: {}x{} {:?} {}/{} fps",
            decoder.get_width(),
            decoder.get_height(),
            decoder.get_colorspace(),
            fps.num,
            fps.den
        );

        Ok(Self {
            decoder,
            sampling,
            fps_num: fps.num as u64,
            fps_den: fps.den as u64,
            index: 0,
        })
    }
}

impl<R: Read> FrameSource for Y4mSource<R> {
    /// Read and convert the next picture of the stream.
    ///
    /// EOF maps to `EndOfStream`; any malformed frame data is a read failure
    /// and terminal for the stream.
    fn read_frame(&mut self, frame: &mut Frame) -> Result<ReadStatus> {
        let width = self.decoder.get_width();
        let height = self.decoder.get_height();

        let pic = match self.decoder.read_frame() {
            Ok(pic) => pic,
            Err(y4m::Error::EOF) => return Ok(ReadStatus::EndOfStream),
            Err(e) => return Err(anyhow!("y4m read failed: {:?}", e)),
        };

        frame.resize(width, height);
        frame.index = self.index;
        frame.elapsed_ms = if self.fps_num > 0 {
            self.index * 1000 * self.fps_den / self.fps_num
        } else {
            0
        };

        let y_plane = pic.get_y_plane();
        match self.sampling {
            Sampling::Mono => {
                for (dst, &y) in frame.data_mut().iter_mut().zip(y_plane) {
                    *dst = yuv_to_rgb(y, 128, 128);
                }
            }
            sampling => {
                let (cx, cy) = match sampling {
                    Sampling::Half2x2 => (2, 2),
                    Sampling::Half2x1 => (2, 1),
                    _ => (1, 1),
                };
                let chroma_w = (width + cx - 1) / cx;
                let u_plane = pic.get_u_plane();
                let v_plane = pic.get_v_plane();

                let data = frame.data_mut();
                for py in 0..height {
                    for px in 0..width {
                        let ci = (py / cy) * chroma_w + px / cx;
                        data[py * width + px] =
                            yuv_to_rgb(y_plane[py * width + px], u_plane[ci], v_plane[ci]);
                    }
                }
            }
        }

        self.index += 1;
        Ok(ReadStatus::Frame)
    }

    fn get_framerate(&self) -> Option<f64> {
        if self.fps_den > 0 && self.fps_num > 0 {
            Some(self.fps_num as f64 / self.fps_den as f64)
        } else {
            None
        }
    }

    fn get_dimensions(&self) -> Option<(usize, usize)> {
        Some((self.decoder.get_width(), self.decoder.get_height()))
    }
}

/// BT.601 limited-range YUV to RGB, clamped.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> Rgb {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let clamp = |v: i32| v.clamp(0, 255) as u8;

    Rgb {
        r: clamp((298 * c + 409 * e + 128) >> 8),
        g: clamp((298 * c - 100 * d - 208 * e + 128) >> 8),
        b: clamp((298 * c + 516 * d + 128) >> 8),
    }
}
