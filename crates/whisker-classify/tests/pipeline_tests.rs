use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use whisker_camera::{CameraConfig, PixelFormat, RawFrame, TestPatternSource};
use whisker_classify::{
    pump, BinaryClass, Classification, ClassifyError, InputTensor, Model, OfferOutcome, Pipeline,
    PipelineConfig, PipelineState, Scores,
};

const INPUT_SIZE: (usize, usize) = (16, 16);

/// Mock model that returns fixed scores and records what it was fed.
struct FixedModel {
    scores: Scores,
    calls: Arc<AtomicUsize>,
    seen_shapes: Arc<Mutex<Vec<[usize; 4]>>>,
}

impl Model for FixedModel {
    fn input_size(&self) -> (usize, usize) {
        INPUT_SIZE
    }

    fn infer(&mut self, input: &InputTensor) -> Result<Scores, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_shapes.lock().unwrap().push(input.shape());
        Ok(self.scores)
    }
}

/// Mock model whose engine always fails internally.
struct BrokenModel;

impl Model for BrokenModel {
    fn input_size(&self) -> (usize, usize) {
        INPUT_SIZE
    }

    fn infer(&mut self, _input: &InputTensor) -> Result<Scores, ClassifyError> {
        Err(ClassifyError::Inference("engine exploded".to_string()))
    }
}

/// Mock model that records each frame's fill value, then blocks until the
/// test releases it. Lets a test pin one frame in flight while it offers
/// more.
struct GatedModel {
    release: Receiver<()>,
    calls: Arc<AtomicUsize>,
    seen_fills: Arc<Mutex<Vec<u8>>>,
}

impl Model for GatedModel {
    fn input_size(&self) -> (usize, usize) {
        INPUT_SIZE
    }

    fn infer(&mut self, input: &InputTensor) -> Result<Scores, ClassifyError> {
        let fill = (input.data()[0] * 255.0).round() as u8;
        self.seen_fills.lock().unwrap().push(fill);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.release.recv_timeout(Duration::from_secs(5));
        Ok(Scores::new(0.8, 0.3))
    }
}

struct Fixture {
    pipeline: Pipeline,
    results: Receiver<Classification>,
    calls: Arc<AtomicUsize>,
    seen_shapes: Arc<Mutex<Vec<[usize; 4]>>>,
}

fn start_fixture(scores: Scores) -> Fixture {
    whisker_base::init_stdout_logger();

    let calls = Arc::new(AtomicUsize::new(0));
    let seen_shapes = Arc::new(Mutex::new(Vec::new()));
    let model = FixedModel {
        scores,
        calls: Arc::clone(&calls),
        seen_shapes: Arc::clone(&seen_shapes),
    };

    let (sink_tx, results) = std::sync::mpsc::channel();
    let pipeline = Pipeline::start(
        Box::new(model),
        Box::new(sink_tx),
        PipelineConfig::default(),
    );

    Fixture {
        pipeline,
        results,
        calls,
        seen_shapes,
    }
}

fn frame(width: u32, height: u32, rotation: i32) -> RawFrame {
    let len = width as usize * height as usize * 4;
    RawFrame::new(width, height, PixelFormat::Rgba8, vec![128u8; len], rotation)
}

fn filled_frame(fill: u8) -> RawFrame {
    RawFrame::new(64, 64, PixelFormat::Rgba8, vec![fill; 64 * 64 * 4], 0)
}

fn wait_for(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

#[test]
fn test_classify_one_frame() {
    let fixture = start_fixture(Scores::new(0.8, 0.3));

    assert_eq!(
        fixture.pipeline.offer(frame(640, 480, 90)),
        OfferOutcome::Accepted
    );

    let result = fixture.results.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(result.class, BinaryClass::Class0);
    assert_eq!(result.label, "cat");
    assert_eq!(result.confidence, 0.8);

    // The model saw exactly one tensor of its declared input shape
    assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        fixture.seen_shapes.lock().unwrap().as_slice(),
        &[[1, INPUT_SIZE.0, INPUT_SIZE.1, 3]]
    );
}

#[test]
fn test_class1_wins_scenario() {
    let fixture = start_fixture(Scores::new(0.2, 0.9));

    fixture.pipeline.offer(frame(640, 480, 0));
    let result = fixture.results.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(result.class, BinaryClass::Class1);
    assert_eq!(result.label, "dog");
    assert_eq!(result.confidence, 0.9);
}

#[test]
fn test_custom_labels() {
    let (sink_tx, results) = std::sync::mpsc::channel();
    let model = FixedModel {
        scores: Scores::new(0.6, 0.1),
        calls: Arc::new(AtomicUsize::new(0)),
        seen_shapes: Arc::new(Mutex::new(Vec::new())),
    };
    let pipeline = Pipeline::start(
        Box::new(model),
        Box::new(sink_tx),
        PipelineConfig::default().with_labels("empty".to_string(), "occupied".to_string()),
    );

    pipeline.offer(frame(64, 64, 0));
    let result = results.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(result.label, "empty");
}

#[test]
fn test_pause_discards_frames() {
    let fixture = start_fixture(Scores::new(0.8, 0.3));

    // Pipeline works before the pause
    fixture.pipeline.offer(frame(64, 64, 0));
    fixture.results.recv_timeout(Duration::from_secs(2)).unwrap();
    let calls_before = fixture.calls.load(Ordering::SeqCst);

    fixture.pipeline.pause();
    assert!(fixture.pipeline.is_paused());

    for _ in 0..3 {
        fixture.pipeline.offer(frame(64, 64, 0));
        thread::sleep(Duration::from_millis(30));
    }

    // Nothing was inferred, nothing was emitted
    assert_eq!(
        fixture.results.recv_timeout(Duration::from_millis(150)),
        Err(RecvTimeoutError::Timeout)
    );
    assert_eq!(fixture.calls.load(Ordering::SeqCst), calls_before);

    // Resume restores normal flow
    fixture.pipeline.resume();
    assert!(!fixture.pipeline.is_paused());
    fixture.pipeline.offer(frame(64, 64, 0));
    fixture.results.recv_timeout(Duration::from_secs(2)).unwrap();
}

#[test]
fn test_dimension_mismatch_aborts_session() {
    let fixture = start_fixture(Scores::new(0.8, 0.3));

    fixture.pipeline.offer(frame(640, 480, 0));
    fixture.results.recv_timeout(Duration::from_secs(2)).unwrap();

    fixture.pipeline.offer(frame(320, 240, 0));
    assert!(wait_for(
        || fixture.pipeline.state() == PipelineState::Failed,
        Duration::from_secs(2)
    ));

    match fixture.pipeline.take_failure() {
        Some(ClassifyError::DimensionMismatch { expected, got }) => {
            assert_eq!(expected, (640, 480));
            assert_eq!(got, (320, 240));
        }
        other => panic!("expected DimensionMismatch, got {:?}", other),
    }

    // The worker is gone; later offers are refused
    assert!(wait_for(
        || fixture.pipeline.offer(frame(640, 480, 0)) == OfferOutcome::Closed,
        Duration::from_secs(2)
    ));
}

#[test]
fn test_unsupported_rotation_aborts_session() {
    let fixture = start_fixture(Scores::new(0.8, 0.3));

    fixture.pipeline.offer(frame(640, 480, 45));
    assert!(wait_for(
        || fixture.pipeline.state() == PipelineState::Failed,
        Duration::from_secs(2)
    ));
    assert!(matches!(
        fixture.pipeline.take_failure(),
        Some(ClassifyError::UnsupportedRotation(45))
    ));
    assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_underrun_drops_frame_and_continues() {
    let fixture = start_fixture(Scores::new(0.8, 0.3));

    // Short pixel buffer: dropped, logged, session survives
    let short = RawFrame::new(64, 64, PixelFormat::Rgba8, vec![0u8; 100], 0);
    fixture.pipeline.offer(short);
    assert_eq!(
        fixture.results.recv_timeout(Duration::from_millis(300)),
        Err(RecvTimeoutError::Timeout)
    );
    assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);

    // A complete frame of the same dimensions still classifies
    fixture.pipeline.offer(frame(64, 64, 0));
    fixture.results.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_inference_error_drops_frame_and_continues() {
    let (sink_tx, results) = std::sync::mpsc::channel();
    let pipeline = Pipeline::start(
        Box::new(BrokenModel),
        Box::new(sink_tx),
        PipelineConfig::default(),
    );

    pipeline.offer(frame(64, 64, 0));
    pipeline.offer(frame(64, 64, 0));

    assert_eq!(
        results.recv_timeout(Duration::from_millis(300)),
        Err(RecvTimeoutError::Timeout)
    );
    // Recoverable failure: the session is still accepting frames
    assert_ne!(pipeline.state(), PipelineState::Failed);
    assert!(wait_for(
        || pipeline.offer(frame(64, 64, 0)) == OfferOutcome::Accepted,
        Duration::from_secs(2)
    ));
}

#[test]
fn test_shutdown_finishes_in_flight_frame() {
    let fixture = start_fixture(Scores::new(0.8, 0.3));

    fixture.pipeline.offer(frame(64, 64, 0));
    fixture.pipeline.shutdown();

    // The pass that was in flight when shutdown began still completed
    let result = fixture.results.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(result.label, "cat");
}

#[test]
fn test_newest_frame_displaces_pending() {
    whisker_base::init_stdout_logger();

    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen_fills = Arc::new(Mutex::new(Vec::new()));
    let model = GatedModel {
        release: release_rx,
        calls: Arc::clone(&calls),
        seen_fills: Arc::clone(&seen_fills),
    };

    let (sink_tx, results) = std::sync::mpsc::channel();
    let pipeline = Pipeline::start(
        Box::new(model),
        Box::new(sink_tx),
        PipelineConfig::default(),
    );

    // Pin the first frame in flight inside the model
    assert_eq!(pipeline.offer(filled_frame(10)), OfferOutcome::Accepted);
    assert!(wait_for(
        || calls.load(Ordering::SeqCst) == 1,
        Duration::from_secs(2)
    ));

    // While busy, a newer offer replaces the waiting frame, never the
    // other way round
    assert_eq!(pipeline.offer(filled_frame(20)), OfferOutcome::Accepted);
    assert_eq!(pipeline.offer(filled_frame(30)), OfferOutcome::Replaced);

    release_tx.send(()).unwrap();
    results.recv_timeout(Duration::from_secs(2)).unwrap();
    release_tx.send(()).unwrap();
    results.recv_timeout(Duration::from_secs(2)).unwrap();

    // The model saw the first and the newest frame; the stale middle one
    // was discarded unprocessed
    assert_eq!(seen_fills.lock().unwrap().as_slice(), &[10, 30]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_flooded_pipeline_keeps_only_latest() {
    whisker_base::init_stdout_logger();

    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen_fills = Arc::new(Mutex::new(Vec::new()));
    let model = GatedModel {
        release: release_rx,
        calls: Arc::clone(&calls),
        seen_fills: Arc::clone(&seen_fills),
    };

    let (sink_tx, results) = std::sync::mpsc::channel();
    let pipeline = Pipeline::start(
        Box::new(model),
        Box::new(sink_tx),
        PipelineConfig::default(),
    );

    pipeline.offer(filled_frame(100));
    assert!(wait_for(
        || calls.load(Ordering::SeqCst) == 1,
        Duration::from_secs(2)
    ));

    // Flood while busy: the first offer fills the empty mailbox, every
    // later one displaces its predecessor
    let outcomes: Vec<OfferOutcome> = (0..10)
        .map(|i| pipeline.offer(filled_frame(110 + i)))
        .collect();
    assert_eq!(outcomes[0], OfferOutcome::Accepted);
    assert!(outcomes[1..].iter().all(|o| *o == OfferOutcome::Replaced));

    release_tx.send(()).unwrap();
    results.recv_timeout(Duration::from_secs(2)).unwrap();
    release_tx.send(()).unwrap();
    results.recv_timeout(Duration::from_secs(2)).unwrap();

    // Of the whole flood, only the newest frame reached the model
    assert_eq!(seen_fills.lock().unwrap().as_slice(), &[100, 119]);
}

#[tokio::test]
async fn test_pump_stops_when_pipeline_closes() {
    let (sink_tx, _results) = std::sync::mpsc::channel();
    let model = FixedModel {
        scores: Scores::new(0.8, 0.3),
        calls: Arc::new(AtomicUsize::new(0)),
        seen_shapes: Arc::new(Mutex::new(Vec::new())),
    };
    let pipeline = Pipeline::start(
        Box::new(model),
        Box::new(sink_tx),
        PipelineConfig::default(),
    );

    // An invalid rotation hint fails the session on its first frame; the
    // pump must then observe the closed pipeline and return
    let config = CameraConfig::default()
        .with_width(64)
        .with_height(64)
        .with_fps(100)
        .with_rotation_degrees(45);
    let mut source = TestPatternSource::new(config);
    pump(&mut source, &pipeline).await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Failed);
}
