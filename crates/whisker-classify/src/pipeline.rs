use crate::{
    Classification, ClassifyError, FrameBuffer, Model, PipelineConfig, Reducer, TransformPipeline,
};
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use whisker_camera::{CameraError, FrameSource, RawFrame};

/// Where completed classifications go.
///
/// The pipeline worker calls `present` once per successfully classified
/// frame, from its own thread.
pub trait ResultSink: Send {
    fn present(&mut self, result: Classification);
}

/// Bridge results into a plain channel; handy for tests and for callers
/// that marshal results onto their own display thread.
impl ResultSink for std::sync::mpsc::Sender<Classification> {
    fn present(&mut self, result: Classification) {
        let _ = self.send(result);
    }
}

/// Observable pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No frame in flight.
    Idle,
    /// One frame being transformed/inferred.
    Processing,
    /// A fatal error stopped the session; see `Pipeline::take_failure`.
    Failed,
    /// The worker has exited normally.
    Stopped,
}

impl PipelineState {
    fn as_u8(self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::Processing => 1,
            PipelineState::Failed => 2,
            PipelineState::Stopped => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => PipelineState::Idle,
            1 => PipelineState::Processing,
            2 => PipelineState::Failed,
            _ => PipelineState::Stopped,
        }
    }
}

/// What happened to an offered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// Queued for the worker.
    Accepted,
    /// Queued for the worker, displacing an older frame that was still
    /// pending. The displaced frame is discarded unprocessed.
    Replaced,
    /// The session has stopped or failed; no more frames are taken.
    Closed,
}

struct Shared {
    state: AtomicU8,
    paused: AtomicBool,
    failure: Mutex<Option<ClassifyError>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(PipelineState::Idle.as_u8()),
            paused: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PipelineState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn record_failure(&self, error: ClassifyError) {
        let mut slot = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(error);
        self.set_state(PipelineState::Failed);
    }
}

/// The pipeline coordinator.
///
/// Drives buffer copy, transform, inference, and reduction in sequence once
/// per offered frame, on a dedicated worker thread so the capture side is
/// never blocked by inference latency. Exactly one frame is in flight at a
/// time; at most one more waits in a single-slot mailbox where the newest
/// arrival wins and the older pending frame is discarded.
pub struct Pipeline {
    pending: Arc<Mutex<Option<RawFrame>>>,
    signal: Option<mpsc::Sender<()>>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    done_rx: Option<std::sync::mpsc::Receiver<()>>,
    shutdown_timeout: Duration,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state())
            .field("paused", &self.is_paused())
            .field("worker", &self.worker.is_some())
            .finish()
    }
}

impl Pipeline {
    /// Start a session: spawn the worker and hand it the loaded model.
    ///
    /// The model must already be loaded; load failure belongs to session
    /// startup and never reaches a running pipeline. The worker takes
    /// exclusive ownership of the model handle, so it is released only after
    /// the worker has stopped.
    pub fn start(
        model: Box<dyn Model>,
        sink: Box<dyn ResultSink>,
        config: PipelineConfig,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let pending = Arc::new(Mutex::new(None));
        let shared = Arc::new(Shared::new());
        let worker_pending = Arc::clone(&pending);
        let worker_shared = Arc::clone(&shared);
        let reducer = Reducer::new(config.labels().clone());

        let worker = thread::spawn(move || {
            worker_loop(signal_rx, worker_pending, model, sink, reducer, worker_shared);
            let _ = done_tx.send(());
        });

        Self {
            pending,
            signal: Some(signal_tx),
            shared,
            worker: Some(worker),
            done_rx: Some(done_rx),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }

    /// Offer one frame to the pipeline. Never blocks.
    ///
    /// The mailbox holds at most one frame; the newest offer always wins.
    /// A frame already waiting is discarded, never the one just offered.
    pub fn offer(&self, frame: RawFrame) -> OfferOutcome {
        let Some(signal) = &self.signal else {
            return OfferOutcome::Closed;
        };

        let displaced = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.replace(frame).is_some()
        };
        if displaced {
            debug!("pipeline busy: newer frame displaced the pending one");
        }

        match signal.try_send(()) {
            // Full just means a wakeup is already queued; the worker will
            // pick the mailbox frame up on that wakeup.
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {
                if displaced {
                    OfferOutcome::Replaced
                } else {
                    OfferOutcome::Accepted
                }
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                // The worker is gone and will never drain the mailbox.
                let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                pending.take();
                OfferOutcome::Closed
            }
        }
    }

    /// Pause analysis. Arriving frames are still taken out of the mailbox
    /// but discarded before the transform stage; nothing is emitted.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
        info!("pipeline paused");
    }

    /// Resume analysis after a pause.
    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
        info!("pipeline resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// Take the fatal error that ended the session, if any.
    pub fn take_failure(&self) -> Option<ClassifyError> {
        let mut slot = self.shared.failure.lock().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    /// Stop the session: close the wakeup channel, wait a bounded time for
    /// the in-flight pass, then let the worker release the model handle.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(signal) = self.signal.take() else {
            return;
        };
        drop(signal);

        if let Some(done_rx) = self.done_rx.take() {
            match done_rx.recv_timeout(self.shutdown_timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if let Some(worker) = self.worker.take() {
                        let _ = worker.join();
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Proceed regardless; the worker is left detached with
                    // whatever frame still hangs in the inference engine.
                    warn!("shutdown timed out waiting for in-flight frame");
                    self.worker.take();
                }
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drive a frame source into the pipeline until the pipeline closes.
///
/// The source's keep-only-latest discipline plus the pipeline's latest-wins
/// mailbox means production and consumption stay decoupled without any
/// unbounded queueing, and the worker never sees a stale frame.
pub async fn pump<S: FrameSource>(
    source: &mut S,
    pipeline: &Pipeline,
) -> Result<(), CameraError> {
    loop {
        let frame = source.recv().await?;
        if pipeline.offer(frame) == OfferOutcome::Closed {
            info!("pipeline closed, stopping frame pump");
            return Ok(());
        }
    }
}

fn worker_loop(
    mut rx: mpsc::Receiver<()>,
    pending: Arc<Mutex<Option<RawFrame>>>,
    mut model: Box<dyn Model>,
    mut sink: Box<dyn ResultSink>,
    reducer: Reducer,
    shared: Arc<Shared>,
) {
    info!("pipeline worker started");

    // Scratch buffer and transform geometry initialize from the first frame.
    let mut buffer = FrameBuffer::new();
    let mut transform: Option<TransformPipeline> = None;

    while rx.blocking_recv().is_some() {
        // Wakeups coalesce, so the mailbox may already be empty.
        let taken = pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(frame) = taken else {
            continue;
        };

        if shared.paused.load(Ordering::Acquire) {
            trace!("analysis paused, discarding frame");
            continue;
        }

        shared.set_state(PipelineState::Processing);
        match process_frame(&frame, &mut buffer, &mut transform, model.as_mut(), &reducer) {
            Ok(result) => {
                debug!(
                    "frame classified as {} (confidence {:.3})",
                    result.label, result.confidence
                );
                sink.present(result);
                shared.set_state(PipelineState::Idle);
            }
            Err(e) if e.is_fatal() => {
                error!("fatal pipeline error: {e}");
                shared.record_failure(e);
                rx.close();
                break;
            }
            Err(e) => {
                warn!("dropping frame: {e}");
                shared.set_state(PipelineState::Idle);
            }
        }
    }

    if shared.state() != PipelineState::Failed {
        shared.set_state(PipelineState::Stopped);
    }
    info!("pipeline worker exiting");
    // The model handle drops here, strictly after the worker has stopped.
}

/// One full pass: buffer copy, transform, inference, reduction.
fn process_frame(
    frame: &RawFrame,
    buffer: &mut FrameBuffer,
    transform: &mut Option<TransformPipeline>,
    model: &mut dyn Model,
    reducer: &Reducer,
) -> Result<Classification, ClassifyError> {
    buffer.ensure_allocated(frame.width, frame.height)?;

    if transform.is_none() {
        *transform = Some(TransformPipeline::new(
            frame.width,
            frame.height,
            frame.rotation_degrees,
            model.input_size(),
        )?);
    }
    let transform = transform
        .as_ref()
        .ok_or_else(|| ClassifyError::Internal("transform pipeline vanished".to_string()))?;

    buffer.copy_pixels_from(frame)?;
    let pixels = buffer
        .pixels()
        .ok_or_else(|| ClassifyError::Internal("scratch buffer vanished".to_string()))?;

    let tensor = transform.run(pixels)?;
    let scores = model.infer(&tensor)?;
    Ok(reducer.reduce(&scores))
}
