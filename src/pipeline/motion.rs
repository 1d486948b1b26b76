use rayon::prelude::*;

use crate::{
    config::MotionThresholds,
    error::MotionError,
    types::{Centroid, Frame},
};

pub const CHANGED: [u8; 4] = [0, 0, 0, 255];
pub const UNCHANGED: [u8; 4] = [255, 255, 255, 255];

/// Result of comparing one frame against its predecessor.
#[derive(Clone, Debug)]
pub struct MotionOutput {
    /// Change mask; all unchanged when there was nothing to compare against.
    pub edge: Frame,
    pub centroid: Option<Centroid>,
    /// Whether a previous frame of the same size took part.
    pub compared: bool,
}

/// Frame differencing against the last processed frame.
#[derive(Debug, Default)]
pub struct MotionDetector {
    previous: Option<Frame>,
}

impl MotionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }

    /// Compares `current` with the retained frame, then retains `current`.
    pub fn detect(
        &mut self,
        current: Frame,
        thresholds: &MotionThresholds,
    ) -> Result<MotionOutput, MotionError> {
        let previous = self.previous.take();
        let result = detect_motion(&current, previous.as_ref(), thresholds);
        self.previous = Some(current);
        result
    }
}

#[derive(Clone, Copy, Default)]
struct Accumulator {
    changed: u64,
    sum_x: u64,
    sum_y: u64,
}

impl Accumulator {
    fn merge(self, other: Self) -> Self {
        Self {
            changed: self.changed + other.changed,
            sum_x: self.sum_x + other.sum_x,
            sum_y: self.sum_y + other.sum_y,
        }
    }
}

/// Builds the change mask and centroid of `current` against `previous`.
/// A previous frame of different dimensions is treated as absent.
pub fn detect_motion(
    current: &Frame,
    previous: Option<&Frame>,
    thresholds: &MotionThresholds,
) -> Result<MotionOutput, MotionError> {
    let Some(previous) = previous.filter(|prev| prev.same_dimensions(current)) else {
        let edge = Frame::with_timestamp(
            current.width(),
            current.height(),
            UNCHANGED.repeat(current.rgba().len() / 4),
            current.timestamp(),
        )?;
        return Ok(MotionOutput {
            edge,
            centroid: None,
            compared: false,
        });
    };

    let width = current.width() as u64;
    let rgb_delta = thresholds.rgb_delta;
    let mut mask = vec![0u8; current.rgba().len()];

    let totals = mask
        .par_chunks_exact_mut(4)
        .zip(current.rgba().par_chunks_exact(4))
        .zip(previous.rgba().par_chunks_exact(4))
        .enumerate()
        .map(|(idx, ((dst, cur), prev))| {
            let delta = cur[0].abs_diff(prev[0]) as u32
                + cur[1].abs_diff(prev[1]) as u32
                + cur[2].abs_diff(prev[2]) as u32;

            if delta > rgb_delta {
                dst.copy_from_slice(&CHANGED);
                let idx = idx as u64;
                Accumulator {
                    changed: 1,
                    sum_x: idx % width,
                    sum_y: idx / width,
                }
            } else {
                dst.copy_from_slice(&UNCHANGED);
                Accumulator::default()
            }
        })
        .reduce(Accumulator::default, Accumulator::merge);

    let centroid = (totals.changed > 0).then(|| {
        let count = totals.changed as f64;
        Centroid {
            x: (totals.sum_x as f64 / count) as f32,
            y: (totals.sum_y as f64 / count) as f32,
            changed_count: totals.changed as usize,
        }
    });

    let edge = Frame::with_timestamp(
        current.width(),
        current.height(),
        mask,
        current.timestamp(),
    )?;

    Ok(MotionOutput {
        edge,
        centroid,
        compared: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> MotionThresholds {
        MotionThresholds::default()
    }

    #[test]
    fn first_frame_has_no_motion() {
        let mut detector = MotionDetector::new();
        let frame = Frame::filled(4, 3, [0, 0, 0, 255]).unwrap();

        let output = detector.detect(frame, &thresholds()).unwrap();

        assert!(!output.compared);
        assert!(output.centroid.is_none());
        assert_eq!((output.edge.width(), output.edge.height()), (4, 3));
        assert!(output.edge.rgba().chunks_exact(4).all(|px| px == UNCHANGED));
        assert!(detector.previous().is_some());
    }

    #[test]
    fn identical_frames_have_no_motion() {
        let mut detector = MotionDetector::new();
        let frame = Frame::filled(4, 3, [90, 40, 10, 255]).unwrap();

        detector.detect(frame.clone(), &thresholds()).unwrap();
        let output = detector.detect(frame, &thresholds()).unwrap();

        assert!(output.compared);
        assert!(output.centroid.is_none());
        assert!(output.edge.rgba().chunks_exact(4).all(|px| px == UNCHANGED));
    }

    #[test]
    fn full_change_centers_on_frame() {
        let mut detector = MotionDetector::new();
        detector
            .detect(Frame::filled(7, 4, [0, 0, 0, 255]).unwrap(), &thresholds())
            .unwrap();
        let output = detector
            .detect(Frame::filled(7, 4, [255, 255, 255, 0]).unwrap(), &thresholds())
            .unwrap();

        let centroid = output.centroid.unwrap();
        assert_eq!(centroid.changed_count, 28);
        assert_eq!(centroid.x, 3.0);
        assert_eq!(centroid.y, 1.5);
        assert!(output.edge.rgba().chunks_exact(4).all(|px| px == CHANGED));
    }

    #[test]
    fn delta_must_exceed_threshold() {
        let base = Frame::filled(2, 1, [100, 100, 100, 255]).unwrap();
        // 50 + 50 + 50 == 150 is not above the default threshold.
        let at_threshold = Frame::filled(2, 1, [150, 150, 150, 255]).unwrap();
        let above = Frame::filled(2, 1, [151, 150, 150, 255]).unwrap();

        let output = detect_motion(&at_threshold, Some(&base), &thresholds()).unwrap();
        assert!(output.centroid.is_none());

        let output = detect_motion(&above, Some(&base), &thresholds()).unwrap();
        assert_eq!(output.centroid.unwrap().changed_count, 2);
    }

    #[test]
    fn alpha_is_ignored() {
        let a = Frame::filled(3, 3, [10, 10, 10, 0]).unwrap();
        let b = Frame::filled(3, 3, [10, 10, 10, 255]).unwrap();
        let output = detect_motion(&b, Some(&a), &thresholds()).unwrap();
        assert!(output.centroid.is_none());
    }

    #[test]
    fn centroid_tracks_changed_block() {
        let width = 10u32;
        let height = 8u32;
        let base = Frame::filled(width, height, [255, 255, 255, 255]).unwrap();
        let mut rgba = base.rgba().to_vec();
        for y in 2..=4u32 {
            for x in 6..=8u32 {
                let idx = ((y * width + x) * 4) as usize;
                rgba[idx..idx + 4].copy_from_slice(&[0, 0, 0, 255]);
            }
        }
        let moved = Frame::new(width, height, rgba).unwrap();

        let output = detect_motion(&moved, Some(&base), &thresholds()).unwrap();

        let centroid = output.centroid.unwrap();
        assert_eq!(centroid.changed_count, 9);
        assert_eq!(centroid.x, 7.0);
        assert_eq!(centroid.y, 3.0);
        assert_eq!(output.edge.pixel(7, 3), Some(CHANGED));
        assert_eq!(output.edge.pixel(0, 0), Some(UNCHANGED));
    }

    #[test]
    fn retains_latest_frame_on_every_path() {
        let mut detector = MotionDetector::new();
        let first = Frame::filled(2, 2, [0, 0, 0, 255]).unwrap();
        let resized = Frame::filled(3, 3, [255, 255, 255, 255]).unwrap();

        detector.detect(first, &thresholds()).unwrap();
        let output = detector.detect(resized, &thresholds()).unwrap();

        assert!(!output.compared);
        assert!(output.centroid.is_none());
        assert_eq!(detector.previous().map(Frame::width), Some(3));
    }
}
