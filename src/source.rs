use std::{collections::VecDeque, path::Path};

use anyhow::{Context, Result};

use crate::{error::CaptureError, types::Frame};

/// Anything that can hand the tick loop one frame at a time.
pub trait FrameSource {
    fn start(&mut self) -> Result<(), CaptureError>;

    fn stop(&mut self);

    /// Returns the frame for the current tick.
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn start(&mut self) -> Result<(), CaptureError> {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        (**self).next_frame()
    }
}

#[derive(Clone, Debug)]
pub enum ReplayItem {
    Frame(Frame),
    /// The capture surface is briefly unavailable for one tick.
    Gap,
    /// A non-recoverable failure for this tick.
    Failure(String),
}

/// Plays back a fixed sequence of frames, then reports end of stream.
#[derive(Clone, Debug, Default)]
pub struct ReplaySource {
    items: VecDeque<ReplayItem>,
    start_error: Option<CaptureError>,
    running: bool,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            items: frames.into_iter().map(ReplayItem::Frame).collect(),
            ..Self::default()
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = ReplayItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Loads still images in order; each becomes one tick.
    pub fn from_image_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let frames = paths
            .iter()
            .map(|path| load_frame(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(frames))
    }

    /// Makes the next `start` fail with `err`.
    pub fn refuse_start(mut self, err: CaptureError) -> Self {
        self.start_error = Some(err);
        self
    }

    pub fn push(&mut self, item: ReplayItem) {
        self.items.push_back(item);
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl FrameSource for ReplaySource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if let Some(err) = self.start_error.clone() {
            return Err(err);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.running {
            return Err(CaptureError::Fatal("replay source is not started".to_string()));
        }
        match self.items.pop_front() {
            Some(ReplayItem::Frame(frame)) => Ok(frame),
            Some(ReplayItem::Gap) => Err(CaptureError::TransientUnavailable),
            Some(ReplayItem::Failure(message)) => Err(CaptureError::Fatal(message)),
            None => Err(CaptureError::EndOfStream),
        }
    }
}

pub fn load_frame(path: &Path) -> Result<Frame> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Frame::new(width, height, img.into_raw())
        .with_context(|| format!("invalid image {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_in_order_then_ends() {
        let a = Frame::filled(1, 1, [1, 1, 1, 255]).unwrap();
        let b = Frame::filled(1, 1, [2, 2, 2, 255]).unwrap();
        let mut source = ReplaySource::from_items([
            ReplayItem::Frame(a),
            ReplayItem::Gap,
            ReplayItem::Frame(b),
        ]);

        source.start().unwrap();
        assert_eq!(source.next_frame().unwrap().pixel(0, 0), Some([1, 1, 1, 255]));
        assert_eq!(
            source.next_frame().unwrap_err(),
            CaptureError::TransientUnavailable
        );
        assert_eq!(source.next_frame().unwrap().pixel(0, 0), Some([2, 2, 2, 255]));
        assert_eq!(source.next_frame().unwrap_err(), CaptureError::EndOfStream);
    }

    #[test]
    fn refused_start() {
        let mut source = ReplaySource::default().refuse_start(CaptureError::AccessDenied);
        assert_eq!(source.start().unwrap_err(), CaptureError::AccessDenied);
        assert!(!source.is_running());
    }

    #[test]
    fn loads_png_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut source = ReplaySource::from_image_paths(&[&path]).unwrap();
        source.start().unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.pixel(2, 1), Some([10, 20, 30, 255]));
    }
}
