//! End-to-end pipeline runs over synthetic frame sequences.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use vigil::prelude::v1::*;

const WIDTH: usize = 320;
const HEIGHT: usize = 320;
/// 25 fps.
const FRAME_INTERVAL_MS: u64 = 40;

/// A scripted frame source. Each entry is either a full frame, a transient
/// decode gap, or a read failure.
enum Step {
    Picture(Frame),
    Gap,
    Fail,
}

struct ScriptedSource {
    steps: Vec<Step>,
    cursor: usize,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> Self {
        Self { steps, cursor: 0 }
    }

    fn from_frames(frames: Vec<Frame>) -> Self {
        Self::new(frames.into_iter().map(Step::Picture).collect())
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self, frame: &mut Frame) -> Result<ReadStatus> {
        let step = match self.steps.get(self.cursor) {
            Some(s) => s,
            None => return Ok(ReadStatus::EndOfStream),
        };
        self.cursor += 1;
        match step {
            Step::Picture(f) => {
                *frame = f.clone();
                Ok(ReadStatus::Frame)
            }
            Step::Gap => Ok(ReadStatus::Empty),
            Step::Fail => Err(anyhow!("simulated read failure")),
        }
    }

    fn get_framerate(&self) -> Option<f64> {
        Some(1000.0 / FRAME_INTERVAL_MS as f64)
    }

    fn get_dimensions(&self) -> Option<(usize, usize)> {
        Some((WIDTH, HEIGHT))
    }
}

/// Collects written paths instead of touching the filesystem.
#[derive(Default)]
struct MemorySink {
    paths: Vec<PathBuf>,
    fail_writes: bool,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, path: &Path, _frame: &Frame) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("simulated write failure"));
        }
        self.paths.push(path.to_path_buf());
        Ok(())
    }
}

fn flat_frame(index: u64, value: u8) -> Frame {
    let mut f = Frame::new(WIDTH, HEIGHT);
    f.data_mut().fill(Rgb {
        r: value,
        g: value,
        b: value,
    });
    f.index = index;
    f.elapsed_ms = index * FRAME_INTERVAL_MS;
    f
}

/// A flat frame with a bright square of the given size at `(x, y)`.
fn square_frame(index: u64, x: usize, y: usize, side: usize) -> Frame {
    let mut f = flat_frame(index, 20);
    for py in y..(y + side).min(HEIGHT) {
        for px in x..(x + side).min(WIDTH) {
            f.data_mut()[py * WIDTH + px] = Rgb {
                r: 220,
                g: 220,
                b: 220,
            };
        }
    }
    f
}

fn config(roi: Rect) -> PipelineConfig {
    PipelineConfig {
        width: WIDTH,
        height: HEIGHT,
        roi,
        min_area: 10000.0,
        out_dir: PathBuf::from("out"),
        start_time: None,
    }
}

fn run(
    source: &mut ScriptedSource,
    sink: &mut MemorySink,
    roi: Rect,
) -> (PipelineReport, Vec<PathBuf>) {
    let mut pipeline = Pipeline::new(config(roi), BackgroundParams::default());
    let cancel = AtomicBool::new(false);
    let report = pipeline.run(source, sink, &cancel).unwrap();
    (report, std::mem::take(&mut sink.paths))
}

#[test]
fn static_sequence_emits_nothing() {
    let frames = (0..100).map(|i| flat_frame(i, 20)).collect();
    let mut source = ScriptedSource::from_frames(frames);
    let mut sink = MemorySink::default();

    let (report, paths) = run(&mut source, &mut sink, Rect::new(100, 100, 50, 50));

    assert_eq!(report.state, DriverState::Stopped);
    assert_eq!(report.frames_read, 100);
    assert_eq!(report.frames_emitted, 0);
    assert!(paths.is_empty());
}

#[test]
fn appearing_square_triggers_emission() {
    // Frames 0-49 static; frames 50-99 contain a 200x200 bright square fully
    // covering the region of interest.
    let mut frames: Vec<Frame> = (0..50).map(|i| flat_frame(i, 20)).collect();
    frames.extend((50..100).map(|i| square_frame(i, 60, 60, 200)));
    let mut source = ScriptedSource::from_frames(frames);
    let mut sink = MemorySink::default();

    let (report, paths) = run(&mut source, &mut sink, Rect::new(100, 100, 50, 50));

    assert_eq!(report.state, DriverState::Stopped);
    assert!(report.frames_emitted > 0);
    // Emission begins exactly when the square appears: frame 50 at 2000 ms.
    assert_eq!(paths[0], PathBuf::from("out/frame-00002s-00050f.jpg"));
    // Every emitted filename encodes the matching (posSec, frameIndex) pair.
    for (i, path) in paths.iter().enumerate() {
        let index = 50 + i as u64;
        let pos_sec = index * FRAME_INTERVAL_MS / 1000;
        assert_eq!(
            *path,
            output_path(Path::new("out"), pos_sec, index),
            "emission {}",
            i
        );
    }
}

#[test]
fn motion_outside_roi_never_emits() {
    // Same large square, but the region of interest is elsewhere.
    let mut frames: Vec<Frame> = (0..50).map(|i| flat_frame(i, 20)).collect();
    frames.extend((50..100).map(|i| square_frame(i, 60, 60, 200)));
    let mut source = ScriptedSource::from_frames(frames);
    let mut sink = MemorySink::default();

    let (report, paths) = run(&mut source, &mut sink, Rect::new(290, 290, 20, 20));

    assert_eq!(report.frames_emitted, 0);
    assert!(paths.is_empty());
    assert_eq!(report.state, DriverState::Stopped);
}

#[test]
fn decode_gaps_are_skipped() {
    let mut steps: Vec<Step> = (0..10).map(|i| Step::Picture(flat_frame(i, 20))).collect();
    steps.insert(3, Step::Gap);
    steps.insert(7, Step::Gap);
    let mut source = ScriptedSource::new(steps);
    let mut sink = MemorySink::default();

    let (report, _) = run(&mut source, &mut sink, Rect::new(0, 0, 10, 10));

    // Gaps are not frames and not errors.
    assert_eq!(report.frames_read, 10);
    assert_eq!(report.state, DriverState::Stopped);
}

#[test]
fn read_failure_is_terminal_but_preserves_output() {
    let mut steps: Vec<Step> = (0..30).map(|i| Step::Picture(flat_frame(i, 20))).collect();
    steps.push(Step::Picture(square_frame(30, 60, 60, 200)));
    steps.push(Step::Fail);
    steps.push(Step::Picture(square_frame(31, 60, 60, 200)));
    let mut source = ScriptedSource::new(steps);
    let mut sink = MemorySink::default();

    let (report, paths) = run(&mut source, &mut sink, Rect::new(100, 100, 50, 50));

    assert_eq!(report.state, DriverState::Failed);
    // The frame emitted before the failure is preserved.
    assert_eq!(report.frames_emitted, 1);
    assert_eq!(paths.len(), 1);
    assert_eq!(report.frames_read, 31);
}

#[test]
fn write_failures_do_not_end_the_run() {
    let mut frames: Vec<Frame> = (0..20).map(|i| flat_frame(i, 20)).collect();
    frames.extend((20..30).map(|i| square_frame(i, 60, 60, 200)));
    let mut source = ScriptedSource::from_frames(frames);
    let mut sink = MemorySink {
        fail_writes: true,
        ..Default::default()
    };

    let mut pipeline = Pipeline::new(
        config(Rect::new(100, 100, 50, 50)),
        BackgroundParams::default(),
    );
    let cancel = AtomicBool::new(false);
    let report = pipeline.run(&mut source, &mut sink, &cancel).unwrap();

    assert_eq!(report.state, DriverState::Stopped);
    assert_eq!(report.frames_read, 30);
    assert_eq!(report.frames_emitted, 0);
    assert!(report.write_failures > 0);
}

#[test]
fn cancellation_stops_cleanly() {
    let frames = (0..100).map(|i| flat_frame(i, 20)).collect();
    let mut source = ScriptedSource::from_frames(frames);
    let mut sink = MemorySink::default();

    let mut pipeline = Pipeline::new(
        config(Rect::new(0, 0, 10, 10)),
        BackgroundParams::default(),
    );
    let cancel = AtomicBool::new(false);
    cancel.store(true, Ordering::Relaxed);
    let report = pipeline.run(&mut source, &mut sink, &cancel).unwrap();

    assert_eq!(report.state, DriverState::Stopped);
    assert_eq!(report.frames_read, 0);
}

#[test]
fn dimension_change_mid_run_is_fatal() {
    let mut steps: Vec<Step> = (0..5).map(|i| Step::Picture(flat_frame(i, 20))).collect();
    steps.push(Step::Picture(Frame::new(WIDTH / 2, HEIGHT / 2)));
    let mut source = ScriptedSource::new(steps);
    let mut sink = MemorySink::default();

    let mut pipeline = Pipeline::new(
        config(Rect::new(0, 0, 10, 10)),
        BackgroundParams::default(),
    );
    let cancel = AtomicBool::new(false);
    assert!(pipeline.run(&mut source, &mut sink, &cancel).is_err());
    // The driver lands in a terminal state, not a stale Running.
    assert_eq!(pipeline.state(), DriverState::Failed);
}
