use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    config::PipelineConfig,
    error::{CaptureError, MotionError},
    gesture::GestureState,
    pipeline::{FramePipeline, TickReport},
    scheduler::Scheduler,
    sink::EventSink,
    source::FrameSource,
    types::MotionEvent,
};

/// Outcome of a single tick.
#[derive(Clone, Debug)]
pub enum TickOutcome {
    Processed(TickReport),
    /// The source had no frame this tick; pipeline memory is untouched.
    Skipped,
    /// A finite source ran out of frames.
    Finished,
}

/// Requests a stop from outside the tick loop.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives a frame source through the gesture pipeline and reports to a sink.
pub struct MotionService<S, K> {
    config: PipelineConfig,
    source: S,
    sink: K,
    pipeline: Option<FramePipeline>,
    stop: StopHandle,
}

impl<S: FrameSource, K: EventSink> MotionService<S, K> {
    pub fn new(config: PipelineConfig, source: S, sink: K) -> Self {
        Self {
            config,
            source,
            sink,
            pipeline: None,
            stop: StopHandle::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn gesture_state(&self) -> Option<GestureState> {
        self.pipeline.as_ref().map(FramePipeline::gesture_state)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Starts the source with fresh pipeline memory. A refused start is
    /// reported once through the error event and not retried.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_running() {
            return Ok(());
        }

        if let Err(err) = self.source.start() {
            if err.is_startup_refusal() {
                log::warn!("frame source refused to start: {err}");
            } else {
                log::error!("failed to start frame source: {err}");
            }
            self.sink.emit(MotionEvent::Error(err.to_string()));
            return Err(err);
        }

        self.stop.reset();
        self.pipeline = Some(FramePipeline::new(self.config.clone()));
        log::info!(
            "motion recognition started (downsample {}, mirror {})",
            self.config.downsample,
            self.config.mirror
        );
        self.sink.emit(MotionEvent::Started);
        Ok(())
    }

    /// Releases the source and discards all pipeline memory.
    pub fn stop(&mut self) {
        if self.pipeline.take().is_none() {
            return;
        }
        self.source.stop();
        log::info!("motion recognition stopped");
        self.sink.emit(MotionEvent::Stopped);
    }

    /// Pulls one frame and runs it through the pipeline. A failing tick is
    /// reported through the error event and stops the service before the
    /// error is returned.
    pub fn tick(&mut self) -> Result<TickOutcome, MotionError> {
        if !self.is_running() {
            return Err(MotionError::NotRunning);
        }

        self.step().inspect_err(|err| {
            log::error!("tick failed: {err}");
            self.sink.emit(MotionEvent::Error(err.to_string()));
            self.stop();
        })
    }

    fn step(&mut self) -> Result<TickOutcome, MotionError> {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Err(MotionError::NotRunning);
        };

        let frame = match self.source.next_frame() {
            Ok(frame) => frame,
            Err(CaptureError::TransientUnavailable) => {
                log::debug!("frame not ready, skipping tick");
                return Ok(TickOutcome::Skipped);
            }
            Err(CaptureError::EndOfStream) => return Ok(TickOutcome::Finished),
            Err(err) => return Err(err.into()),
        };

        let report = pipeline.process(frame, &mut self.sink)?;
        Ok(TickOutcome::Processed(report))
    }

    /// Ticks until the scheduler is exhausted, a stop is requested, the
    /// source ends, or a tick fails. A stop request or the end of the source
    /// stops the service; an exhausted scheduler leaves it running. A failing
    /// tick has already stopped the service when its error is returned.
    pub fn run<T: Scheduler + ?Sized>(&mut self, scheduler: &mut T) -> Result<(), MotionError> {
        if !self.is_running() {
            return Err(MotionError::NotRunning);
        }

        let mut finished = false;
        while !self.stop.is_stop_requested() && scheduler.next_tick() {
            if self.stop.is_stop_requested() {
                break;
            }
            if let TickOutcome::Finished = self.tick()? {
                log::info!("frame source finished");
                finished = true;
                break;
            }
        }

        if finished || self.stop.is_stop_requested() {
            self.stop();
        }
        Ok(())
    }
}
