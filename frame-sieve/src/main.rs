//! Scan a video for motion inside a region of interest and keep the
//! interesting frames.

use chrono::NaiveTime;
use clap::*;
use log::*;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use vigil::prelude::v1::{Result, *};
use y4m_decoder::Y4mSource;

mod sink;

use sink::JpegSink;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("frame-sieve")
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("video-file")
                .long("video-file")
                .short('i')
                .takes_value(true)
                .required(true)
                .help("video file to read (.y4m)"),
        )
        .arg(
            Arg::new("minimum-contour-area")
                .long("minimum-contour-area")
                .short('a')
                .takes_value(true)
                .default_value("10000")
                .help("minimum contour area to consider"),
        )
        .arg(
            Arg::new("video-start-time")
                .long("video-start-time")
                .short('t')
                .takes_value(true)
                .help("real start time of video, in HH:MM:SS"),
        )
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .short('o')
                .takes_value(true)
                .default_value("out")
                .help("directory to write interesting frames"),
        )
        .arg(
            Arg::new("roi")
                .long("roi")
                .short('r')
                .takes_value(true)
                .default_value("660,0,20,720")
                .help("region of interest, as x,y,width,height"),
        )
        .get_matches();

    let input = matches.value_of("video-file").unwrap();
    let min_area: f64 = matches
        .value_of("minimum-contour-area")
        .unwrap()
        .parse()
        .map_err(|e| anyhow!("bad --minimum-contour-area: {}", e))?;
    let out_dir = PathBuf::from(matches.value_of("out-dir").unwrap());
    let roi = parse_roi(matches.value_of("roi").unwrap())?;
    let start_time = matches
        .value_of("video-start-time")
        .map(|s| {
            NaiveTime::parse_from_str(s, "%H:%M:%S")
                .map_err(|e| anyhow!("bad --video-start-time {:?}: {}", s, e))
        })
        .transpose()?;

    std::fs::create_dir_all(&out_dir)
        .map_err(|e| anyhow!("error creating --out-dir {:?}: {}", out_dir, e))?;

    let mut source = Y4mSource::open(input)?;
    let (width, height) = source
        .get_dimensions()
        .ok_or_else(|| anyhow!("stream reports no dimensions"))?;

    let config = PipelineConfig {
        width,
        height,
        roi,
        min_area,
        out_dir,
        start_time,
    };

    let mut pipeline = Pipeline::new(config, BackgroundParams::default());
    let mut sink = JpegSink::default();
    let cancel = AtomicBool::new(false);

    let report = pipeline.run(&mut source, &mut sink, &cancel)?;

    info!(
        "{} frames read, {} emitted, {} write failures",
        report.frames_read, report.frames_emitted, report.write_failures
    );

    if report.state == DriverState::Failed {
        std::process::exit(2);
    }

    Ok(())
}

/// Parse a `x,y,width,height` rectangle.
fn parse_roi(s: &str) -> Result<Rect> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("bad --roi {:?}: {}", s, e))?;
    match parts[..] {
        [x, y, width, height] if width > 0 && height > 0 => Ok(Rect::new(x, y, width, height)),
        _ => Err(anyhow!(
            "bad --roi {:?}: expected x,y,width,height with positive size",
            s
        )),
    }
}
