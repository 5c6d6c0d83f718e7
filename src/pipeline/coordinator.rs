//! The pipeline coordinator.
//!
//! A [`PipelineCoordinator`] owns the segmenter and runs one request at a time
//! on a background thread:
//!
//! 1. Validation: the request is checked and the image loaded
//! 2. Segmentation: the segmenter produces a label mask
//! 3. Metrics: count and areas are derived from the mask
//! 4. Overlay: the mask is drawn over the image
//! 5. Export: artifacts are written when the request has an output directory
//!
//! The coordinator moves `Idle -> Running -> Completed | Failed`. While a run is
//! in flight further `start` calls are rejected with [`CellError::Busy`]. The
//! state is updated before the outcome is delivered, so a caller reacting to
//! the outcome can start the next run straight away.

use super::config::PipelineConfig;
use super::export::{ExportInput, export_artifacts};
use super::result::{ExportedArtifacts, ImageSource, PipelineRequest, PipelineResult, PipelineState};
use super::stats::{PipelineStats, StatsManager};
use crate::core::config::ConfigValidator;
use crate::core::{CellError, PipelineStep};
use crate::domain::MicroscopyImage;
use crate::models::{Segmenter, SharedSegmenter};
use crate::processors::{compute_metrics, per_label_areas, render_overlay};
use crate::utils::load_image;
use std::any::Any;
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome delivered for every run.
pub type RunOutcome = Result<PipelineResult, CellError>;

/// Called on the worker thread once a run has finished.
pub type CompletionCallback = Box<dyn FnOnce(&RunOutcome) + Send + 'static>;

#[derive(Debug)]
struct SharedState {
    state: Mutex<PipelineState>,
    stats: StatsManager,
}

impl SharedState {
    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs segmentation, metrics, overlay and export for one image at a time.
pub struct PipelineCoordinator {
    segmenter: Arc<dyn Segmenter>,
    config: Arc<PipelineConfig>,
    shared: Arc<SharedState>,
    run_counter: AtomicUsize,
}

impl std::fmt::Debug for PipelineCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineCoordinator")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PipelineCoordinator {
    /// Creates a coordinator around `segmenter` with default settings.
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self::build(segmenter, PipelineConfig::default())
    }

    /// Creates a coordinator around `segmenter` with the given settings.
    ///
    /// # Errors
    ///
    /// Fails when `config` does not validate.
    pub fn with_config(
        segmenter: Arc<dyn Segmenter>,
        config: PipelineConfig,
    ) -> Result<Self, CellError> {
        config.validate()?;
        Ok(Self::build(segmenter, config))
    }

    /// Creates a coordinator whose Cellpose model is loaded on the first run.
    pub fn from_config(config: PipelineConfig) -> Result<Self, CellError> {
        let segmenter = Arc::new(SharedSegmenter::new(config.model.clone()));
        Self::with_config(segmenter, config)
    }

    fn build(segmenter: Arc<dyn Segmenter>, config: PipelineConfig) -> Self {
        Self {
            segmenter,
            config: Arc::new(config),
            shared: Arc::new(SharedState {
                state: Mutex::new(PipelineState::Idle),
                stats: StatsManager::new(),
            }),
            run_counter: AtomicUsize::new(0),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        *self.shared.lock()
    }

    /// Settings used for every run.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Statistics over all finished runs.
    pub fn stats(&self) -> PipelineStats {
        self.shared.stats.get_stats()
    }

    /// Starts a run in the background.
    ///
    /// # Errors
    ///
    /// - [`CellError::Busy`] while another run is in flight; that run is not affected
    /// - a [`PipelineStep::Validation`] error when the request is malformed; the
    ///   state is left unchanged
    /// - [`CellError::Io`] when the worker thread cannot be spawned
    pub fn start(&self, request: PipelineRequest) -> Result<RunHandle, CellError> {
        self.spawn_run(request, None)
    }

    /// Like [`start`](Self::start), and calls `callback` on the worker thread
    /// once the run has finished. The coordinator state is already terminal
    /// when the callback runs.
    pub fn start_with_callback(
        &self,
        request: PipelineRequest,
        callback: impl FnOnce(&RunOutcome) + Send + 'static,
    ) -> Result<RunHandle, CellError> {
        self.spawn_run(request, Some(Box::new(callback)))
    }

    /// Starts a run and blocks until it finishes.
    pub fn run_blocking(&self, request: PipelineRequest) -> RunOutcome {
        self.start(request)?.wait()
    }

    /// Returns a finished coordinator to `Idle`.
    ///
    /// # Errors
    ///
    /// [`CellError::Busy`] while a run is in flight.
    pub fn reset(&self) -> Result<(), CellError> {
        let mut state = self.shared.lock();
        if *state == PipelineState::Running {
            return Err(CellError::Busy);
        }
        *state = PipelineState::Idle;
        Ok(())
    }

    fn spawn_run(
        &self,
        request: PipelineRequest,
        callback: Option<CompletionCallback>,
    ) -> Result<RunHandle, CellError> {
        let previous = {
            let mut state = self.shared.lock();
            if !state.accepts_new_run() {
                warn!("rejecting run for {}: coordinator busy", request.source.describe());
                return Err(CellError::Busy);
            }
            validate_request(&request).map_err(|e| e.in_step(PipelineStep::Validation))?;
            std::mem::replace(&mut *state, PipelineState::Running)
        };

        let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();

        let worker = Worker {
            segmenter: Arc::clone(&self.segmenter),
            config: Arc::clone(&self.config),
            shared: Arc::clone(&self.shared),
            cancel: Arc::clone(&cancel),
        };

        let spawned = thread::Builder::new()
            .name(format!("cell-count-run-{}", run_id))
            .spawn(move || {
                let outcome = worker.run(run_id, request);
                if let Some(callback) = callback {
                    callback(&outcome);
                }
                // The handle may have been dropped; the outcome is then discarded.
                let _ = sender.send(outcome);
            });

        if let Err(e) = spawned {
            *self.shared.lock() = previous;
            error!("failed to spawn worker thread: {}", e);
            return Err(CellError::Io(e));
        }

        Ok(RunHandle { receiver, cancel })
    }
}

/// Handle to a run started by [`PipelineCoordinator::start`].
#[derive(Debug)]
pub struct RunHandle {
    receiver: Receiver<RunOutcome>,
    cancel: Arc<AtomicBool>,
}

impl RunHandle {
    /// Asks the run to stop.
    ///
    /// The flag is checked between steps: a step already executing finishes
    /// first, then the run ends `Failed` with [`CellError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Blocks until the run finishes and returns its outcome.
    pub fn wait(self) -> RunOutcome {
        self.receiver.recv().unwrap_or_else(|_| Err(worker_lost()))
    }

    /// Returns the outcome if the run has finished, without blocking.
    ///
    /// The outcome is handed out once; later calls return `None`.
    pub fn try_outcome(&self) -> Option<RunOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_lost())),
        }
    }
}

fn worker_lost() -> CellError {
    CellError::Io(std::io::Error::other(
        "worker thread exited without reporting an outcome",
    ))
}

fn validate_request(request: &PipelineRequest) -> Result<(), CellError> {
    if let ImageSource::Path(path) = &request.source
        && !path.is_file()
    {
        return Err(CellError::invalid_input(format!(
            "image file not found: {}",
            path.display()
        )));
    }
    if let Some(dir) = &request.output_dir
        && !dir.is_dir()
    {
        return Err(CellError::invalid_input(format!(
            "output folder is not a directory: {}",
            dir.display()
        )));
    }
    Ok(())
}

struct Worker {
    segmenter: Arc<dyn Segmenter>,
    config: Arc<PipelineConfig>,
    shared: Arc<SharedState>,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    fn run(&self, run_id: usize, request: PipelineRequest) -> RunOutcome {
        let started = Instant::now();
        info!("run {} started for {}", run_id, request.source.describe());

        let current_step = Cell::new(PipelineStep::Validation);
        let outcome = catch_unwind(AssertUnwindSafe(|| self.execute(&request, &current_step)))
            .unwrap_or_else(|payload| {
                let step = current_step.get();
                Err(CellError::segmentation_msg(format!(
                    "worker panicked: {}",
                    panic_message(payload.as_ref())
                ))
                .in_step(step))
            });

        let elapsed = started.elapsed();
        let final_state = if outcome.is_ok() {
            PipelineState::Completed
        } else {
            PipelineState::Failed
        };
        *self.shared.lock() = final_state;
        self.shared
            .stats
            .record_run(outcome.is_ok(), elapsed.as_secs_f64() * 1000.0);

        match &outcome {
            Ok(result) => info!(
                "run {} completed in {:.2?}: {}",
                run_id, elapsed, result.metrics
            ),
            Err(CellError::Cancelled) => warn!("run {} cancelled after {:.2?}", run_id, elapsed),
            Err(e) => error!("run {} failed after {:.2?}: {}", run_id, elapsed, e.report()),
        }
        outcome
    }

    fn execute(&self, request: &PipelineRequest, step: &Cell<PipelineStep>) -> RunOutcome {
        let started = Instant::now();

        step.set(PipelineStep::Validation);
        let image = load_source(&request.source).map_err(|e| e.in_step(PipelineStep::Validation))?;
        self.check_cancelled()?;

        step.set(PipelineStep::Segmentation);
        let kind = request.model_kind.unwrap_or(self.config.model_kind);
        let mask = self
            .segmenter
            .segment(&image, kind)
            .and_then(|mask| {
                if mask.dimensions() == image.dimensions() {
                    Ok(mask)
                } else {
                    Err(CellError::DimensionMismatch {
                        image: image.dimensions(),
                        mask: mask.dimensions(),
                    })
                }
            })
            .map_err(|e| e.in_step(PipelineStep::Segmentation))?;
        debug!("segmentation produced {} labels", mask.max_label());
        self.check_cancelled()?;

        step.set(PipelineStep::Metrics);
        let metrics = compute_metrics(&mask, request.pixel_size);
        let cells = per_label_areas(&mask, request.pixel_size);
        debug!("metrics: {}", metrics);
        self.check_cancelled()?;

        step.set(PipelineStep::Overlay);
        let overlay = render_overlay(&image, &mask, &self.config.overlay)
            .map_err(|e| e.in_step(PipelineStep::Overlay))?;
        self.check_cancelled()?;

        step.set(PipelineStep::Export);
        let artifacts = match &request.output_dir {
            Some(dir) => {
                let stem = request.source.stem();
                let input = ExportInput {
                    stem: &stem,
                    mask: &mask,
                    metrics: &metrics,
                    cells: &cells,
                    overlay: &overlay,
                    pixel_size: request.pixel_size,
                };
                export_artifacts(dir, &input, &self.config.export)
                    .map_err(|e| e.in_step(PipelineStep::Export))?
            }
            None => ExportedArtifacts::default(),
        };

        Ok(PipelineResult {
            mask,
            metrics,
            overlay,
            artifacts,
            elapsed: started.elapsed(),
        })
    }

    fn check_cancelled(&self) -> Result<(), CellError> {
        if self.cancel.load(Ordering::SeqCst) {
            Err(CellError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn load_source(source: &ImageSource) -> Result<Arc<MicroscopyImage>, CellError> {
    match source {
        ImageSource::Path(path) => load_image(path).map(Arc::new),
        ImageSource::InMemory { image, .. } => Ok(Arc::clone(image)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LabelMask, PixelSize, SampleFormat};
    use crate::models::{CellposeConfig, ModelKind};
    use ndarray::Array2;
    use std::sync::mpsc::{Sender, channel};
    use std::time::Duration;

    struct FixedSegmenter(LabelMask);

    impl Segmenter for FixedSegmenter {
        fn segment(&self, _: &MicroscopyImage, _: ModelKind) -> Result<LabelMask, CellError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSegmenter(Mutex<Vec<ModelKind>>);

    impl Segmenter for RecordingSegmenter {
        fn segment(&self, _: &MicroscopyImage, kind: ModelKind) -> Result<LabelMask, CellError> {
            self.0.lock().unwrap().push(kind);
            Ok(scenario_mask())
        }
    }

    struct FailingSegmenter;

    impl Segmenter for FailingSegmenter {
        fn segment(&self, _: &MicroscopyImage, _: ModelKind) -> Result<LabelMask, CellError> {
            Err(CellError::segmentation_msg("network output malformed"))
        }
    }

    struct PanickingSegmenter;

    impl Segmenter for PanickingSegmenter {
        fn segment(&self, _: &MicroscopyImage, _: ModelKind) -> Result<LabelMask, CellError> {
            panic!("boom")
        }
    }

    /// Signals when segmentation starts, then waits for a release message.
    struct BlockingSegmenter {
        mask: LabelMask,
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl Segmenter for BlockingSegmenter {
        fn segment(&self, _: &MicroscopyImage, _: ModelKind) -> Result<LabelMask, CellError> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(self.mask.clone())
        }
    }

    fn blocking(mask: LabelMask) -> (Arc<BlockingSegmenter>, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let segmenter = Arc::new(BlockingSegmenter {
            mask,
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        (segmenter, entered_rx, release_tx)
    }

    fn scenario_mask() -> LabelMask {
        LabelMask::from_rows(&[vec![0, 1], vec![1, 2]]).unwrap()
    }

    fn scenario_request() -> PipelineRequest {
        let image = MicroscopyImage::from_gray(
            ndarray::array![[10.0, 20.0], [30.0, 40.0]],
            SampleFormat::U8,
        )
        .unwrap();
        PipelineRequest::from_image(image, "scenario")
    }

    #[test]
    fn test_successful_run_reports_metrics() {
        let coordinator = PipelineCoordinator::new(Arc::new(FixedSegmenter(scenario_mask())));
        assert_eq!(coordinator.state(), PipelineState::Idle);

        let request = scenario_request().with_pixel_size(Some(PixelSize::new(0.5).unwrap()));
        let result = coordinator.run_blocking(request).unwrap();

        assert_eq!(result.metrics.cell_count, 2);
        assert_eq!(result.metrics.mean_area_pixels, 1.5);
        assert_eq!(result.metrics.mean_area_microns, Some(0.375));
        assert_eq!(result.overlay.dimensions(), (2, 2));
        assert_eq!(result.mask, scenario_mask());
        assert_eq!(result.artifacts, ExportedArtifacts::default());
        assert_eq!(coordinator.state(), PipelineState::Completed);
        assert_eq!(coordinator.stats().completed_runs, 1);
    }

    #[test]
    fn test_configured_model_kind_used_by_default() {
        let segmenter = Arc::new(RecordingSegmenter::default());
        let config = PipelineConfig {
            model_kind: ModelKind::Cyto,
            ..PipelineConfig::default()
        };
        let coordinator = PipelineCoordinator::with_config(segmenter.clone(), config).unwrap();

        coordinator.run_blocking(scenario_request()).unwrap();
        coordinator
            .run_blocking(scenario_request().with_model_kind(ModelKind::Cyto))
            .unwrap();
        assert_eq!(
            *segmenter.0.lock().unwrap(),
            vec![ModelKind::Cyto, ModelKind::Cyto]
        );
    }

    #[test]
    fn test_second_start_while_running_is_busy() {
        let (segmenter, entered, release) = blocking(scenario_mask());
        let coordinator = PipelineCoordinator::new(segmenter);

        let first = coordinator.start(scenario_request()).unwrap();
        entered.recv().unwrap();
        assert_eq!(coordinator.state(), PipelineState::Running);

        let second = coordinator.start(scenario_request());
        assert!(matches!(second, Err(CellError::Busy)));
        let malformed = coordinator.start(PipelineRequest::from_path("no/such/file.tif"));
        assert!(matches!(malformed, Err(CellError::Busy)));
        assert!(matches!(coordinator.reset(), Err(CellError::Busy)));
        assert_eq!(coordinator.state(), PipelineState::Running);
        assert!(first.try_outcome().is_none());

        release.send(()).unwrap();
        let result = first.wait().unwrap();
        assert_eq!(result.metrics.cell_count, 2);
        assert_eq!(coordinator.state(), PipelineState::Completed);
        assert_eq!(coordinator.stats().total_runs, 1);
    }

    #[test]
    fn test_segmentation_failure_is_tagged_and_recoverable() {
        let coordinator = PipelineCoordinator::new(Arc::new(FailingSegmenter));
        let error = coordinator.run_blocking(scenario_request()).unwrap_err();

        assert_eq!(error.step(), Some(PipelineStep::Segmentation));
        assert!(matches!(error.root(), CellError::Segmentation { .. }));
        assert_eq!(coordinator.state(), PipelineState::Failed);
        assert_eq!(coordinator.stats().failed_runs, 1);

        coordinator.reset().unwrap();
        assert_eq!(coordinator.state(), PipelineState::Idle);
    }

    #[test]
    fn test_new_run_accepted_after_failure() {
        let coordinator = PipelineCoordinator::new(Arc::new(FailingSegmenter));
        assert!(coordinator.run_blocking(scenario_request()).is_err());
        assert!(coordinator.run_blocking(scenario_request()).is_err());
        assert_eq!(coordinator.stats().total_runs, 2);
    }

    #[test]
    fn test_missing_model_fails_in_segmentation_step() {
        let config = PipelineConfig {
            model: CellposeConfig::with_model_path("no/such/cyto.onnx"),
            ..PipelineConfig::default()
        };
        let coordinator = PipelineCoordinator::from_config(config).unwrap();
        let error = coordinator.run_blocking(scenario_request()).unwrap_err();

        assert_eq!(error.step(), Some(PipelineStep::Segmentation));
        assert!(matches!(error.root(), CellError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_mask_of_wrong_size_is_rejected() {
        let wrong = LabelMask::background(3, 3).unwrap();
        let coordinator = PipelineCoordinator::new(Arc::new(FixedSegmenter(wrong)));
        let error = coordinator.run_blocking(scenario_request()).unwrap_err();
        assert!(matches!(
            error.root(),
            CellError::DimensionMismatch {
                image: (2, 2),
                mask: (3, 3)
            }
        ));
    }

    #[test]
    fn test_panicking_segmenter_becomes_failure() {
        let coordinator = PipelineCoordinator::new(Arc::new(PanickingSegmenter));
        let error = coordinator.run_blocking(scenario_request()).unwrap_err();
        assert_eq!(error.step(), Some(PipelineStep::Segmentation));
        assert!(error.report().contains("boom"));
        assert_eq!(coordinator.state(), PipelineState::Failed);
    }

    #[test]
    fn test_cancel_between_steps() {
        let (segmenter, entered, release) = blocking(scenario_mask());
        let coordinator = PipelineCoordinator::new(segmenter);

        let handle = coordinator.start(scenario_request()).unwrap();
        entered.recv().unwrap();
        handle.cancel();
        assert!(handle.is_cancel_requested());
        release.send(()).unwrap();

        assert!(matches!(handle.wait(), Err(CellError::Cancelled)));
        assert_eq!(coordinator.state(), PipelineState::Failed);
    }

    #[test]
    fn test_invalid_request_rejected_before_running() {
        let coordinator = PipelineCoordinator::new(Arc::new(FixedSegmenter(scenario_mask())));

        let missing = PipelineRequest::from_path("no/such/image.tif");
        let error = coordinator.start(missing).unwrap_err();
        assert_eq!(error.step(), Some(PipelineStep::Validation));
        assert!(matches!(error.root(), CellError::InvalidInput { .. }));

        let bad_dir = scenario_request().with_output_dir("no/such/folder");
        assert!(coordinator.start(bad_dir).is_err());
        assert_eq!(coordinator.state(), PipelineState::Idle);
        assert_eq!(coordinator.stats().total_runs, 0);
    }

    #[test]
    fn test_export_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = PipelineCoordinator::new(Arc::new(FixedSegmenter(scenario_mask())));
        let result = coordinator
            .run_blocking(scenario_request().with_output_dir(dir.path()))
            .unwrap();

        assert_eq!(
            result.artifacts.overlay.as_deref(),
            Some(dir.path().join("scenario_overlay.png").as_path())
        );
        assert!(dir.path().join("scenario_metrics.json").is_file());
        assert!(result.artifacts.mask.is_none());
    }

    #[test]
    fn test_loads_image_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.png");
        image::GrayImage::from_pixel(2, 2, image::Luma([90])).save(&path).unwrap();

        let coordinator = PipelineCoordinator::new(Arc::new(FixedSegmenter(scenario_mask())));
        let result = coordinator
            .run_blocking(PipelineRequest::from_path(&path).with_output_dir(dir.path()))
            .unwrap();
        assert!(dir.path().join("plate_overlay.png").is_file());
        assert_eq!(result.metrics.cell_count, 2);
    }

    #[test]
    fn test_callback_sees_terminal_state() {
        let coordinator = Arc::new(PipelineCoordinator::new(Arc::new(FixedSegmenter(
            scenario_mask(),
        ))));
        let (tx, rx) = channel();
        let observer = Arc::clone(&coordinator);

        let handle = coordinator
            .start_with_callback(scenario_request(), move |outcome| {
                tx.send((observer.state(), outcome.is_ok())).unwrap();
            })
            .unwrap();

        let (state, ok) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(state, PipelineState::Completed);
        assert!(ok);
        assert!(handle.wait().is_ok());

        // The next run can be started from the reaction to the previous one.
        assert!(coordinator.run_blocking(scenario_request()).is_ok());
    }

    #[test]
    fn test_try_outcome_eventually_returns() {
        let coordinator = PipelineCoordinator::new(Arc::new(FixedSegmenter(scenario_mask())));
        let handle = coordinator.start(scenario_request()).unwrap();

        let mut outcome = None;
        for _ in 0..1000 {
            outcome = handle.try_outcome();
            if outcome.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(outcome, Some(Ok(_))));
    }

    #[test]
    fn test_empty_mask_runs_to_completion() {
        let coordinator = PipelineCoordinator::new(Arc::new(FixedSegmenter(
            LabelMask::new(Array2::zeros((2, 2))).unwrap(),
        )));
        let result = coordinator
            .run_blocking(scenario_request().with_pixel_size(Some(PixelSize::new(1.0).unwrap())))
            .unwrap();
        assert_eq!(result.metrics.cell_count, 0);
        assert_eq!(result.metrics.mean_area_microns, Some(0.0));
    }
}
