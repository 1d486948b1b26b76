use anyhow::{Result, anyhow, ensure};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

/// Byte layouts a capture device may hand us.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Bgr,
    Gray,
    Yuyv,
    Nv12,
    Mjpeg,
}

/// Decodes a raw capture buffer into tightly packed RGBA.
pub fn to_rgba(layout: PixelLayout, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    match layout {
        PixelLayout::Rgb => packed_to_rgba(data, width, height, 3, |src| {
            [src[0], src[1], src[2], 255]
        }),
        PixelLayout::Bgr => packed_to_rgba(data, width, height, 3, |src| {
            [src[2], src[1], src[0], 255]
        }),
        PixelLayout::Gray => packed_to_rgba(data, width, height, 1, |src| {
            [src[0], src[0], src[0], 255]
        }),
        PixelLayout::Yuyv => yuyv_to_rgba(data, width, height),
        PixelLayout::Nv12 => nv12_to_rgba(data, width, height),
        PixelLayout::Mjpeg => mjpeg_to_rgba(data, width, height),
    }
}

fn packed_to_rgba<F>(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    expand: F,
) -> Result<Vec<u8>>
where
    F: Fn(&[u8]) -> [u8; 4] + Sync,
{
    let pixels = width as usize * height as usize;
    let expected_len = pixels * bytes_per_pixel;
    ensure!(
        data.len() >= expected_len,
        "capture buffer too small: got {}, expected {}",
        data.len(),
        expected_len
    );

    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data[..expected_len].par_chunks_exact(bytes_per_pixel))
        .for_each(|(dst, src)| dst.copy_from_slice(&expand(src)));

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected_len = width as usize * height as usize * 2;
    ensure!(
        data.len() >= expected_len,
        "YUYV buffer too small: got {}, expected {}",
        data.len(),
        expected_len
    );

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };
    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422 to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let luma_len = width as usize * height as usize;
    let chroma_len = luma_len / 2;
    ensure!(
        data.len() >= luma_len + chroma_len,
        "NV12 buffer too small: got {}, expected {}",
        data.len(),
        luma_len + chroma_len
    );

    let mut rgba = vec![0u8; luma_len * 4];
    let image = YuvBiPlanarImage {
        y_plane: &data[..luma_len],
        y_stride: width,
        uv_plane: &data[luma_len..luma_len + chroma_len],
        uv_stride: width,
        width,
        height,
    };
    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12 to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn mjpeg_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    let expected_len = width as usize * height as usize * 4;
    ensure!(
        rgba.len() == expected_len,
        "MJPEG frame is {} bytes, expected {} for {}x{}",
        rgba.len(),
        expected_len,
        width,
        height
    );

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_swaps_red_and_blue() {
        let rgba = to_rgba(PixelLayout::Bgr, &[1, 2, 3, 4, 5, 6], 2, 1).unwrap();
        assert_eq!(rgba, vec![3, 2, 1, 255, 6, 5, 4, 255]);
    }

    #[test]
    fn gray_expands_to_opaque() {
        let rgba = to_rgba(PixelLayout::Gray, &[9, 200], 1, 2).unwrap();
        assert_eq!(rgba, vec![9, 9, 9, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(to_rgba(PixelLayout::Rgb, &[0; 5], 2, 1).is_err());
        assert!(to_rgba(PixelLayout::Yuyv, &[0; 7], 2, 2).is_err());
        assert!(to_rgba(PixelLayout::Nv12, &[0; 5], 2, 2).is_err());
    }

    #[test]
    fn garbage_mjpeg_fails() {
        assert!(to_rgba(PixelLayout::Mjpeg, &[0, 1, 2, 3], 1, 1).is_err());
    }
}
