use std::{path::PathBuf, thread};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, unbounded};
use swipe_motion::{
    FrameSource, IntervalScheduler, MotionEvent, MotionService, PipelineConfig, ReplaySource,
};

#[derive(Parser, Debug)]
#[command(name = "swipe-motion", about = "Recognize hand swipes from a camera")]
struct Args {
    /// TOML file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// List cameras and exit
    #[arg(long)]
    list: bool,

    /// Camera index to capture from
    #[arg(long, default_value_t = 0)]
    camera: u32,

    /// Replay still images instead of using a camera
    #[arg(long, num_args = 1..)]
    replay: Vec<PathBuf>,

    /// Override the downsample factor
    #[arg(long)]
    downsample: Option<u32>,

    /// Mirror frames horizontally
    #[arg(long)]
    mirror: bool,

    /// Override the tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.list {
        return list_cameras();
    }

    let config = build_config(&args)?;
    let source: Box<dyn FrameSource> = if args.replay.is_empty() {
        camera_source(args.camera)?
    } else {
        Box::new(ReplaySource::from_image_paths(&args.replay)?)
    };

    let (event_tx, event_rx) = unbounded();
    let printer = thread::spawn(move || print_events(event_rx));

    let mut scheduler = IntervalScheduler::new(config.tick_interval());
    let mut service = MotionService::new(config, source, event_tx);
    service.start().context("failed to start motion recognition")?;
    let result = service.run(&mut scheduler);
    service.stop();

    // Closing the channel ends the printer.
    drop(service);
    let _ = printer.join();

    result.context("motion recognition failed")
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(factor) = args.downsample {
        config.downsample = factor;
    }
    if args.mirror {
        config.mirror = true;
    }
    if let Some(interval) = args.interval_ms {
        config.tick_interval_ms = interval;
    }
    config.validate()?;
    log::debug!("pipeline config: {config:?}");
    Ok(config)
}

fn print_events(event_rx: Receiver<MotionEvent>) {
    for event in event_rx {
        match event {
            MotionEvent::Started => println!("listening for swipes"),
            MotionEvent::Stopped => println!("stopped"),
            MotionEvent::Error(message) => eprintln!("error: {message}"),
            other => {
                if let Some(direction) = other.swipe() {
                    println!("{} {}", direction.arrow(), direction.label());
                }
            }
        }
    }
}

#[cfg(feature = "camera-nokhwa")]
fn camera_source(index: u32) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(swipe_motion::pipeline::CameraSource::new(index)))
}

#[cfg(not(feature = "camera-nokhwa"))]
fn camera_source(_index: u32) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("built without camera support; pass --replay <images>")
}

#[cfg(feature = "camera-nokhwa")]
fn list_cameras() -> Result<()> {
    let cameras = swipe_motion::pipeline::available_cameras()?;
    if cameras.is_empty() {
        println!("no cameras found");
    }
    for camera in cameras {
        println!("{:?}: {}", camera.index, camera.label);
    }
    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn list_cameras() -> Result<()> {
    anyhow::bail!("built without camera support")
}
