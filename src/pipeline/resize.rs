use fast_image_resize as fir;

use crate::{error::MotionError, types::Frame};

/// Shrinks `frame` by an integer factor (bilinear) and optionally flips it
/// horizontally. Output is `floor(w / factor) x floor(h / factor)`.
pub struct Downsampler {
    factor: u32,
    mirror: bool,
    resizer: fir::Resizer,
}

impl Downsampler {
    pub fn new(factor: u32, mirror: bool) -> Self {
        Self {
            factor: factor.max(1),
            mirror,
            resizer: fir::Resizer::new(),
        }
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }

    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        (width / self.factor, height / self.factor)
    }

    pub fn apply(&mut self, frame: Frame) -> Result<Frame, MotionError> {
        if self.factor == 1 && !self.mirror {
            return Ok(frame);
        }

        let (new_w, new_h) = self.output_size(frame.width(), frame.height());
        if new_w == 0 || new_h == 0 {
            return Err(MotionError::FrameTooSmall {
                width: frame.width(),
                height: frame.height(),
                factor: self.factor,
            });
        }

        let mut rgba = if self.factor == 1 {
            frame.rgba().to_vec()
        } else {
            self.resize(&frame, new_w, new_h)?
        };

        if self.mirror {
            mirror_rows(&mut rgba, new_w as usize);
        }

        Frame::with_timestamp(new_w, new_h, rgba, frame.timestamp())
    }

    fn resize(&mut self, frame: &Frame, new_w: u32, new_h: u32) -> Result<Vec<u8>, MotionError> {
        let src_image = fir::images::Image::from_vec_u8(
            frame.width(),
            frame.height(),
            frame.rgba().to_vec(),
            fir::PixelType::U8x4,
        )
        .map_err(|err| MotionError::Resize(err.to_string()))?;
        let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
        let options = fir::ResizeOptions::new()
            .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
        self.resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|err| MotionError::Resize(err.to_string()))?;

        Ok(dst_image.into_vec())
    }
}

fn mirror_rows(rgba: &mut [u8], width: usize) {
    let stride = width * 4;
    for row in rgba.chunks_exact_mut(stride) {
        for x in 0..width / 2 {
            let mirrored = width - 1 - x;
            for channel in 0..4 {
                row.swap(x * 4 + channel, mirrored * 4 + channel);
            }
        }
    }
}
