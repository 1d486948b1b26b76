use crate::{
    config::MotionThresholds,
    types::{Centroid, SwipeDirection},
};

const AVERAGE_DECAY: f32 = 0.9;
const SAMPLE_WEIGHT: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GestureState {
    /// Waiting for a burst of motion.
    #[default]
    Idle,
    /// A burst started; the next centroid decides the direction.
    Armed,
    /// Absorbing the tail of the burst.
    WaitingEnd,
}

/// Turns per-tick motion centroids into at most one swipe per burst.
#[derive(Clone, Debug, Default)]
pub struct GestureClassifier {
    state: GestureState,
    moving_average: f32,
    last_centroid: Option<Centroid>,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn moving_average(&self) -> f32 {
        self.moving_average
    }

    pub fn classify(
        &mut self,
        centroid: Centroid,
        thresholds: &MotionThresholds,
    ) -> Option<SwipeDirection> {
        let count = centroid.changed_count as f32;
        self.moving_average = AVERAGE_DECAY * self.moving_average + SAMPLE_WEIGHT * count;
        let deviation = count - self.moving_average;
        let found_gesture = deviation > thresholds.brightness_delta as f32;

        match self.state {
            GestureState::Idle => {
                if found_gesture {
                    log::debug!(
                        "motion burst of {} pixels at ({:.1}, {:.1})",
                        centroid.changed_count,
                        centroid.x,
                        centroid.y
                    );
                    self.last_centroid = Some(centroid);
                    self.state = GestureState::Armed;
                }
                None
            }
            GestureState::Armed => {
                let swipe = self
                    .last_centroid
                    .and_then(|start| swipe_direction(start, centroid, thresholds.move_margin));
                self.state = GestureState::WaitingEnd;
                swipe
            }
            GestureState::WaitingEnd => {
                if !found_gesture {
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }
}

/// A positive x displacement reads as a left swipe: the camera image is not
/// mirrored, so the hand moves the opposite way on screen.
fn swipe_direction(start: Centroid, end: Centroid, margin: u32) -> Option<SwipeDirection> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let margin = margin as f32;

    let horizontal = dy.abs() < dx.abs() - margin;
    let vertical = dx.abs() < dy.abs() - margin;

    if horizontal {
        if dx > margin {
            Some(SwipeDirection::Left)
        } else if dx < -margin {
            Some(SwipeDirection::Right)
        } else {
            None
        }
    } else if vertical {
        if dy > margin {
            Some(SwipeDirection::Down)
        } else if dy < -margin {
            Some(SwipeDirection::Up)
        } else {
            None
        }
    } else {
        None
    }
}
