//! # Foreground mask cleanup

/// Binarisation cutoff applied to the raw foreground mask. Classifications
/// below this confidence are treated as sensor noise.
pub const BINARY_CUTOFF: u8 = 25;

/// Single-channel classification image produced by the background model.
///
/// One value per pixel: 0 means background, anything else foreground. The
/// buffer is produced fresh each frame and overwritten in place for the next
/// one; nothing is retained across frames.
#[derive(Clone, Debug, Default)]
pub struct ForegroundMask {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl ForegroundMask {
    /// Create a zeroed mask of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    /// Get width and height of the mask.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Resize the buffer. Contents are unspecified afterwards.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data.resize(width * height, 0);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Check whether a pixel is on. Out-of-bounds coordinates are off.
    pub fn is_on(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.data[y as usize * self.width + x as usize] != 0
    }

    /// Binary threshold: values at or above `cutoff` become 255, the rest 0.
    pub fn threshold(&mut self, cutoff: u8) {
        for v in &mut self.data {
            *v = if *v >= cutoff { 255 } else { 0 };
        }
    }

    /// Morphological dilation with a 3x3 rectangular structuring element.
    ///
    /// Grows on-regions by one pixel in each direction, closing small gaps so
    /// a single moving object does not fragment into multiple blobs.
    /// `scratch` is a reusable copy buffer.
    pub fn dilate3x3(&mut self, scratch: &mut Vec<u8>) {
        scratch.clear();
        scratch.extend_from_slice(&self.data);

        let (w, h) = (self.width as i64, self.height as i64);
        for y in 0..h {
            for x in 0..w {
                if scratch[(y * w + x) as usize] != 0 {
                    continue;
                }
                let mut on = false;
                'neigh: for dy in -1..=1i64 {
                    for dx in -1..=1i64 {
                        let (nx, ny) = (x + dx, y + dy);
                        if nx >= 0
                            && ny >= 0
                            && nx < w
                            && ny < h
                            && scratch[(ny * w + nx) as usize] != 0
                        {
                            on = true;
                            break 'neigh;
                        }
                    }
                }
                if on {
                    self.data[(y * w + x) as usize] = 255;
                }
            }
        }
    }
}
