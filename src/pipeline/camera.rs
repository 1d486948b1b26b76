use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use nokhwa::{
    Buffer, Camera,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraIndex, CameraInfo, FrameFormat, RequestedFormat, RequestedFormatType,
    },
};

use super::rgba_converter::{self, PixelLayout};
use crate::{error::CaptureError, source::FrameSource, types::Frame};

// Formats the native backends decode cheaply; MJPEG last because it costs a
// full JPEG decode per frame.
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::GRAY,
    FrameFormat::MJPEG,
];

/// How long a tick waits for the capture thread before skipping.
const FRAME_WAIT: Duration = Duration::from_millis(100);

fn requested_formats() -> [RequestedFormat<'static>; 3] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: format_camera_label(&info),
        })
        .collect())
}

fn format_camera_label(info: &CameraInfo) -> String {
    info.human_name()
}

fn open_camera(index: &CameraIndex) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats() {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
}

/// Backends report permission problems only through their message text.
fn classify_open_error(err: &anyhow::Error) -> CaptureError {
    let message = format!("{err:#}");
    let lowered = message.to_lowercase();
    if ["permission", "denied", "not authorized", "unauthorized"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        CaptureError::AccessDenied
    } else {
        CaptureError::Fatal(message)
    }
}

fn pixel_layout(format: FrameFormat) -> PixelLayout {
    match format {
        FrameFormat::RAWRGB => PixelLayout::Rgb,
        FrameFormat::RAWBGR => PixelLayout::Bgr,
        FrameFormat::GRAY => PixelLayout::Gray,
        FrameFormat::YUYV => PixelLayout::Yuyv,
        FrameFormat::NV12 => PixelLayout::Nv12,
        FrameFormat::MJPEG => PixelLayout::Mjpeg,
    }
}

fn convert_buffer(buffer: &Buffer) -> Result<Frame> {
    let resolution = buffer.resolution();
    let (width, height) = (resolution.width_x, resolution.height_y);
    let rgba = rgba_converter::to_rgba(
        pixel_layout(buffer.source_frame_format()),
        buffer.buffer(),
        width,
        height,
    )?;
    Frame::new(width, height, rgba).context("camera produced a malformed frame")
}

struct CaptureThread {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    frame_rx: Receiver<Frame>,
}

impl CaptureThread {
    fn spawn(index: CameraIndex) -> Self {
        let (frame_tx, frame_rx) = bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        // Some backends tie the device handle to the thread that opened it.
        let handle = thread::spawn(move || {
            let mut camera = match open_camera(&index) {
                Ok(camera) => camera,
                Err(err) => {
                    log::error!("failed to open camera: {err:?}");
                    return;
                }
            };
            capture_loop(&mut camera, &stop_flag, &frame_tx);
        });

        Self {
            stop,
            handle: Some(handle),
            frame_rx,
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn capture_loop(camera: &mut Camera, stop: &AtomicBool, frame_tx: &Sender<Frame>) {
    while !stop.load(Ordering::Relaxed) {
        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(err) => {
                log::warn!("camera frame read failed: {err:?}");
                continue;
            }
        };

        match convert_buffer(&buffer) {
            // Drop the frame if the tick loop has not taken the previous one.
            Ok(frame) => {
                let _ = frame_tx.try_send(frame);
            }
            Err(err) => log::warn!("failed to decode camera frame: {err:?}"),
        }
    }

    if let Err(err) = camera.stop_stream() {
        log::warn!("failed to stop camera stream: {err:?}");
    }
}

/// Live frames from a local camera, captured on a background thread.
pub struct CameraSource {
    index: CameraIndex,
    capture: Option<CaptureThread>,
}

impl CameraSource {
    pub fn new(index: u32) -> Self {
        Self::with_index(CameraIndex::Index(index))
    }

    pub fn with_index(index: CameraIndex) -> Self {
        Self {
            index,
            capture: None,
        }
    }
}

impl FrameSource for CameraSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.capture.is_some() {
            return Ok(());
        }

        let devices = available_cameras()
            .map_err(|err| CaptureError::Unsupported(format!("{err:#}")))?;
        if devices.is_empty() {
            return Err(CaptureError::Unsupported("no camera found".to_string()));
        }

        // Fail fast before spawning the capture thread.
        let camera = open_camera(&self.index).map_err(|err| classify_open_error(&err))?;
        log::info!(
            "camera {:?} streaming {:?}",
            self.index,
            camera.camera_format()
        );
        drop(camera);

        self.capture = Some(CaptureThread::spawn(self.index.clone()));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.shutdown();
            log::info!("camera {:?} released", self.index);
        }
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let Some(capture) = self.capture.as_ref() else {
            return Err(CaptureError::Fatal("camera is not started".to_string()));
        };

        match capture.frame_rx.recv_timeout(FRAME_WAIT) {
            Ok(mut frame) => {
                while let Ok(newer) = capture.frame_rx.try_recv() {
                    frame = newer;
                }
                Ok(frame)
            }
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::TransientUnavailable),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::Fatal(
                "camera capture thread exited".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_messages_map_to_access_denied() {
        let err = anyhow!("Could not open device: Permission denied (os error 13)");
        assert_eq!(classify_open_error(&err), CaptureError::AccessDenied);

        let err = anyhow!("device busy");
        assert!(matches!(classify_open_error(&err), CaptureError::Fatal(_)));
    }

    #[test]
    fn every_format_has_a_layout() {
        assert_eq!(pixel_layout(FrameFormat::RAWBGR), PixelLayout::Bgr);
        assert_eq!(pixel_layout(FrameFormat::MJPEG), PixelLayout::Mjpeg);
    }
}
