//! # Pipeline driver
//!
//! Pulls frames from a source and runs each one through background
//! subtraction, mask cleanup, contour extraction and the trigger filter,
//! emitting interesting frames to a sink. Processing is a synchronous loop:
//! the background statistics are strictly ordered, so frame N+1 is never
//! read before frame N's full pass completes.

use crate::background::{BackgroundModel, BackgroundParams};
use crate::contour::{find_contours, Contour};
use crate::emit::FrameEmitter;
use crate::frame::{Frame, Rect};
use crate::mask::{ForegroundMask, BINARY_CUTOFF};
use crate::sink::FrameSink;
use crate::source::{FrameSource, ReadStatus};
use crate::trigger::should_emit;
use anyhow::Result;
use chrono::NaiveTime;
use log::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Immutable configuration of a pipeline run, constructed once at startup.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Frame width the run is locked to.
    pub width: usize,
    /// Frame height the run is locked to.
    pub height: usize,
    /// Region motion must overlap to count as interesting.
    pub roi: Rect,
    /// Minimum contour area to consider.
    pub min_area: f64,
    /// Directory emitted frames are written below.
    pub out_dir: PathBuf,
    /// Wall-clock time of the start of the stream, for the overlay.
    pub start_time: Option<NaiveTime>,
}

/// Terminal and intermediate states of the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Frames are being read and processed.
    Running,
    /// The source reported end of stream; no more frames will be read.
    Draining,
    /// An unrecoverable read error occurred. Already-emitted frames are
    /// preserved.
    Failed,
    /// Normal end of the run.
    Stopped,
}

/// Summary of a completed run.
#[derive(Clone, Copy, Debug)]
pub struct PipelineReport {
    pub frames_read: u64,
    pub frames_emitted: u64,
    /// Persistence failures. A failed write loses that frame but does not
    /// end the run.
    pub write_failures: u64,
    /// State the driver terminated in: `Stopped` or `Failed`.
    pub state: DriverState,
}

/// The motion triage pipeline.
///
/// Owns the background model and the per-frame scratch buffers (mask, label
/// map, contour list), which are reused across iterations and fully
/// overwritten each frame.
pub struct Pipeline {
    config: PipelineConfig,
    model: BackgroundModel,
    emitter: FrameEmitter,
    frame: Frame,
    mask: ForegroundMask,
    dilate_scratch: Vec<u8>,
    labels: Vec<u32>,
    contours: Vec<Contour>,
    state: DriverState,
}

impl Pipeline {
    /// Create a pipeline for the configured frame size.
    pub fn new(config: PipelineConfig, params: BackgroundParams) -> Self {
        let model = BackgroundModel::new(config.width, config.height, params);
        let emitter = FrameEmitter::new(config.out_dir.clone(), config.start_time);
        Self {
            model,
            emitter,
            frame: Frame::default(),
            mask: ForegroundMask::new(config.width, config.height),
            dilate_scratch: Vec::new(),
            labels: Vec::new(),
            contours: Vec::new(),
            state: DriverState::Stopped,
            config,
        }
    }

    /// State the driver is currently in.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Run the pipeline until the source is exhausted, a read fails, or
    /// `cancel` is raised.
    ///
    /// `cancel` is checked once per frame iteration, so raising it gives a
    /// clean flush-and-stop rather than an abrupt termination. A source read
    /// failure moves the driver to [`DriverState::Failed`], which is reported
    /// rather than returned as an error so that callers can still see how
    /// far the run got. `Err` is reserved for configuration-level faults
    /// such as a source changing frame dimensions mid-run.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        cancel: &AtomicBool,
    ) -> Result<PipelineReport> {
        self.state = DriverState::Running;

        let mut frames_read = 0;
        let mut frames_emitted = 0;
        let mut write_failures = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                info!("cancellation requested, stopping");
                self.state = DriverState::Stopped;
                break;
            }

            match source.read_frame(&mut self.frame) {
                Ok(ReadStatus::Frame) => {}
                Ok(ReadStatus::Empty) => {
                    debug!("empty decode, skipping");
                    continue;
                }
                Ok(ReadStatus::EndOfStream) => {
                    debug!("source exhausted");
                    self.state = DriverState::Draining;
                    break;
                }
                Err(e) => {
                    error!("frame read failed: {:#}", e);
                    self.state = DriverState::Failed;
                    break;
                }
            }

            frames_read += 1;

            if let Err(e) = self.model.apply(&self.frame, &mut self.mask) {
                // Terminal either way; `state()` must not claim the run is
                // still in flight after the error surfaces.
                self.state = DriverState::Failed;
                return Err(e);
            }
            self.mask.threshold(BINARY_CUTOFF);
            self.mask.dilate3x3(&mut self.dilate_scratch);
            find_contours(&self.mask, &mut self.labels, &mut self.contours);

            if should_emit(&self.contours, &self.config.roi, self.config.min_area) {
                match self.emitter.emit(&mut self.frame, sink) {
                    Ok(path) => {
                        frames_emitted += 1;
                        info!("{}", path.display());
                    }
                    Err(e) => {
                        write_failures += 1;
                        error!("failed to persist frame {}: {:#}", self.frame.index, e);
                    }
                }
            }
        }

        // Nothing is buffered between frames, so draining is immediate.
        if self.state == DriverState::Draining {
            self.state = DriverState::Stopped;
        }

        Ok(PipelineReport {
            frames_read,
            frames_emitted,
            write_failures,
            state: self.state,
        })
    }
}
