use std::{sync::Arc, time::Instant};

use crate::error::MotionError;

/// An RGBA frame in row-major order. The pixel buffer is shared and never
/// mutated after construction, so cloning a frame for an event is cheap.
#[derive(Clone, Debug)]
pub struct Frame {
    rgba: Arc<[u8]>,
    width: u32,
    height: u32,
    timestamp: Instant,
}

impl Frame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, MotionError> {
        Self::with_timestamp(width, height, rgba, Instant::now())
    }

    pub fn with_timestamp(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        timestamp: Instant,
    ) -> Result<Self, MotionError> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(MotionError::InvalidFrame {
                width,
                height,
                len: rgba.len(),
            });
        }

        Ok(Self {
            rgba: rgba.into(),
            width,
            height,
            timestamp,
        })
    }

    /// A frame where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Result<Self, MotionError> {
        let pixels = (width as usize).saturating_mul(height as usize);
        Self::new(width, height, color.repeat(pixels))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    pub fn same_dimensions(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

/// Mean position of the changed pixels of one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Centroid {
    pub x: f32,
    pub y: f32,
    pub changed_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    pub fn label(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "swipe left",
            SwipeDirection::Right => "swipe right",
            SwipeDirection::Up => "swipe up",
            SwipeDirection::Down => "swipe down",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "←",
            SwipeDirection::Right => "→",
            SwipeDirection::Up => "↑",
            SwipeDirection::Down => "↓",
        }
    }
}

#[derive(Clone, Debug)]
pub enum MotionEvent {
    Started,
    Stopped,
    Error(String),
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    RawFrame(Frame),
    SkinFrame(Frame),
    EdgeFrame(Frame),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Started,
    Stopped,
    Error,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    RawFrame,
    SkinFrame,
    EdgeFrame,
}

impl MotionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MotionEvent::Started => EventKind::Started,
            MotionEvent::Stopped => EventKind::Stopped,
            MotionEvent::Error(_) => EventKind::Error,
            MotionEvent::SwipeLeft => EventKind::SwipeLeft,
            MotionEvent::SwipeRight => EventKind::SwipeRight,
            MotionEvent::SwipeUp => EventKind::SwipeUp,
            MotionEvent::SwipeDown => EventKind::SwipeDown,
            MotionEvent::RawFrame(_) => EventKind::RawFrame,
            MotionEvent::SkinFrame(_) => EventKind::SkinFrame,
            MotionEvent::EdgeFrame(_) => EventKind::EdgeFrame,
        }
    }

    pub fn swipe(&self) -> Option<SwipeDirection> {
        match self {
            MotionEvent::SwipeLeft => Some(SwipeDirection::Left),
            MotionEvent::SwipeRight => Some(SwipeDirection::Right),
            MotionEvent::SwipeUp => Some(SwipeDirection::Up),
            MotionEvent::SwipeDown => Some(SwipeDirection::Down),
            _ => None,
        }
    }
}

impl From<SwipeDirection> for MotionEvent {
    fn from(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Left => MotionEvent::SwipeLeft,
            SwipeDirection::Right => MotionEvent::SwipeRight,
            SwipeDirection::Up => MotionEvent::SwipeUp,
            SwipeDirection::Down => MotionEvent::SwipeDown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(Frame::new(2, 2, vec![0; 15]).is_err());
        assert!(Frame::new(0, 2, Vec::new()).is_err());
        assert!(Frame::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn pixel_reads_row_major() {
        let mut rgba = vec![0u8; 3 * 2 * 4];
        // Row 1, column 2 of a 3-wide frame.
        let idx = (3 + 2) * 4;
        rgba[idx..idx + 4].copy_from_slice(&[1, 2, 3, 4]);
        let frame = Frame::new(3, 2, rgba).unwrap();
        assert_eq!(frame.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(3, 0), None);
    }

    #[test]
    fn swipe_event_round_trips_direction() {
        for direction in [
            SwipeDirection::Left,
            SwipeDirection::Right,
            SwipeDirection::Up,
            SwipeDirection::Down,
        ] {
            assert_eq!(MotionEvent::from(direction).swipe(), Some(direction));
        }
        assert_eq!(MotionEvent::Started.swipe(), None);
    }
}
