use rayon::prelude::*;

use super::color::rgb_to_hsv;
use crate::{
    config::{HsvFilterConfig, WRAP_HUE_MAX, WRAP_HUE_MIN},
    error::MotionError,
    types::{Frame, Hsv},
};

pub const NON_SKIN: [u8; 4] = [255, 255, 255, 255];

/// All bounds are exclusive.
pub fn is_skin(hsv: Hsv, config: &HsvFilterConfig) -> bool {
    let primary_hue = hsv.hue > config.hue_min && hsv.hue < config.hue_max;
    let wrapped_hue = hsv.hue > WRAP_HUE_MIN && hsv.hue < WRAP_HUE_MAX;
    let saturation = hsv.saturation > config.sat_min && hsv.saturation < config.sat_max;
    let value = hsv.value > config.val_min && hsv.value < config.val_max;

    (primary_hue || wrapped_hue) && saturation && value
}

/// Keeps skin-colored pixels untouched and paints everything else opaque white.
pub fn filter_skin(frame: &Frame, config: &HsvFilterConfig) -> Result<Frame, MotionError> {
    let mut out = vec![0u8; frame.rgba().len()];
    out.par_chunks_exact_mut(4)
        .zip(frame.rgba().par_chunks_exact(4))
        .for_each(|(dst, src)| {
            if is_skin(rgb_to_hsv(src[0], src[1], src[2]), config) {
                dst.copy_from_slice(src);
            } else {
                dst.copy_from_slice(&NON_SKIN);
            }
        });

    Frame::with_timestamp(frame.width(), frame.height(), out, frame.timestamp())
}
