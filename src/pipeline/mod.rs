#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod color;
pub mod motion;
pub mod resize;
pub mod rgba_converter;
pub mod skin;

use crate::{
    config::PipelineConfig,
    error::MotionError,
    gesture::{GestureClassifier, GestureState},
    sink::EventSink,
    types::{Centroid, Frame, MotionEvent, SwipeDirection},
};

#[cfg(feature = "camera-nokhwa")]
pub use camera::{CameraDevice, CameraSource, available_cameras};
pub use color::rgb_to_hsv;
pub use motion::{MotionDetector, MotionOutput, detect_motion};
pub use resize::Downsampler;
pub use skin::filter_skin;

/// What one tick produced, besides the events it emitted.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub centroid: Option<Centroid>,
    pub swipe: Option<SwipeDirection>,
}

/// Frame -> downsample -> skin filter -> motion -> gesture, one frame per call.
/// Owns every piece of state that survives between ticks.
pub struct FramePipeline {
    config: PipelineConfig,
    downsampler: Downsampler,
    motion: MotionDetector,
    classifier: GestureClassifier,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            downsampler: Downsampler::new(config.downsample, config.mirror),
            config,
            motion: MotionDetector::new(),
            classifier: GestureClassifier::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn gesture_state(&self) -> GestureState {
        self.classifier.state()
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    /// Runs the full pass for one frame. Events go out in the order raw,
    /// skin, edge, swipe.
    pub fn process<K: EventSink + ?Sized>(
        &mut self,
        frame: Frame,
        sink: &mut K,
    ) -> Result<TickReport, MotionError> {
        let frame = self.downsampler.apply(frame)?;
        if self.config.emit_frames {
            sink.emit(MotionEvent::RawFrame(frame.clone()));
        }

        let skin = filter_skin(&frame, &self.config.hsv)?;
        if self.config.emit_frames {
            sink.emit(MotionEvent::SkinFrame(skin.clone()));
        }

        let output = self.motion.detect(skin, &self.config.thresholds)?;
        if self.config.emit_frames && output.compared {
            sink.emit(MotionEvent::EdgeFrame(output.edge));
        }

        let swipe = output
            .centroid
            .and_then(|centroid| self.classifier.classify(centroid, &self.config.thresholds));
        if let Some(direction) = swipe {
            log::info!("recognized {}", direction.label());
            sink.emit(direction.into());
        }

        Ok(TickReport {
            centroid: output.centroid,
            swipe,
        })
    }
}
