use std::sync::{
    Arc, Mutex, MutexGuard, TryLockError,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    assets::lifecycle::{AssetLifecycleManager, ResourceKind},
    config::EngineConfig,
    duration::TargetDuration,
    engine::{MANIFEST_FILE, OUTPUT_FILE, TranscodeEngine, transcode_args},
    foundation::error::{ReelError, ReelResult},
    manifest::{build_manifest, timeline_entries},
    output::{OutputArtifact, OutputRef},
    timeline::SceneTimeline,
};

pub const EMPTY_TIMELINE_MESSAGE: &str = "Add at least one image scene first.";

/// Where the orchestrator is in its load → stage → execute lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    EngineLoading,
    Ready,
    Staging,
    Executing,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn status_message(self) -> &'static str {
        match self {
            Phase::Idle | Phase::Ready => "",
            Phase::EngineLoading => "Loading the transcoding engine...",
            Phase::Staging => "Writing scenes...",
            Phase::Executing => "Composing the video (this may take a minute)...",
            Phase::Succeeded => "Video created successfully!",
            Phase::Failed => "Something went wrong while exporting. Please try again.",
        }
    }

    pub fn is_busy(self) -> bool {
        matches!(self, Phase::EngineLoading | Phase::Staging | Phase::Executing)
    }
}

type PhaseObserver = Box<dyn Fn(Phase) + Send + Sync>;

struct State {
    phase: Phase,
    status: String,
    output: Option<OutputArtifact>,
}

/// Drives a [`TranscodeEngine`] through load, staging, execution and output retrieval.
///
/// The orchestrator owns the engine and the current [`OutputArtifact`]. All methods take `&self`
/// so one instance can be shared (`Arc`) between a warm-up thread and the caller; a second
/// [`generate`](Self::generate) while one is in flight is rejected with [`ReelError::Busy`].
pub struct TranscodeOrchestrator<E> {
    engine: Mutex<E>,
    config: EngineConfig,
    lifecycle: AssetLifecycleManager,
    state: Mutex<State>,
    generating: AtomicBool,
    loaded: AtomicBool,
    observer: Option<PhaseObserver>,
}

impl<E: TranscodeEngine> TranscodeOrchestrator<E> {
    pub fn new(engine: E, config: EngineConfig, lifecycle: AssetLifecycleManager) -> Self {
        let loaded = engine.is_loaded();
        Self {
            engine: Mutex::new(engine),
            config,
            lifecycle,
            state: Mutex::new(State {
                phase: if loaded { Phase::Ready } else { Phase::Idle },
                status: String::new(),
                output: None,
            }),
            generating: AtomicBool::new(false),
            loaded: AtomicBool::new(loaded),
            observer: None,
        }
    }

    /// Called on every phase transition, with the state lock released.
    ///
    /// A transition raised by `generate` or `warm_up` is delivered while that call still owns the
    /// engine. Reading phase, status or output from the observer is fine; engine access through
    /// [`with_engine`](Self::with_engine) or [`warm_up`](Self::warm_up) reports
    /// [`ReelError::Busy`] instead of blocking.
    pub fn with_phase_observer(
        mut self,
        observer: impl Fn(Phase) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Engine loaded and usable.
    pub fn is_ready(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().map(|s| s.phase).unwrap_or(Phase::Failed)
    }

    /// Most recent user-facing status line.
    pub fn last_status(&self) -> String {
        self.lock_state().map(|s| s.status.clone()).unwrap_or_default()
    }

    pub fn clear_status(&self) {
        if let Ok(mut state) = self.lock_state() {
            state.status.clear();
        }
    }

    pub fn current_output(&self) -> Option<OutputRef> {
        self.lock_state()
            .ok()
            .and_then(|s| s.output.as_ref().map(OutputArtifact::to_ref))
    }

    /// Release the current output, if any. Returns whether one was held.
    pub fn release_output(&self) -> ReelResult<bool> {
        let previous = self.lock_state()?.output.take();
        Ok(previous.is_some())
    }

    pub fn lifecycle(&self) -> &AssetLifecycleManager {
        &self.lifecycle
    }

    /// Run `f` against the engine. Fails with [`ReelError::Busy`] while another call owns it.
    pub fn with_engine<R>(&self, f: impl FnOnce(&E) -> R) -> ReelResult<R> {
        let engine = self.try_lock_engine()?;
        Ok(f(&engine))
    }

    /// Load the engine now so the first generate does not pay for it.
    ///
    /// Returns [`ReelError::Busy`] without waiting if a generate already owns the engine; that
    /// call loads it on its own.
    pub fn warm_up(&self) -> ReelResult<()> {
        let result = self
            .try_lock_engine()
            .and_then(|mut engine| self.ensure_loaded(&mut engine));
        if let Err(e) = &result {
            self.record_failure(e);
        }
        result
    }

    /// Run [`warm_up`](Self::warm_up) on a background thread.
    pub fn spawn_warm_up(
        self: &Arc<Self>,
    ) -> ReelResult<std::thread::JoinHandle<ReelResult<()>>>
    where
        E: 'static,
    {
        let this = Arc::clone(self);
        let handle = std::thread::Builder::new()
            .name("scenereel-warmup".to_string())
            .spawn(move || this.warm_up())
            .map_err(|e| ReelError::engine_unavailable(format!("spawn warm-up thread: {e}")))?;
        Ok(handle)
    }

    /// Turn `timeline` into a video of length `target`.
    ///
    /// On failure the previous output (if any) is left untouched and the error is recorded as
    /// the status line. Validation failures keep the phase at `Ready`; every other failure moves
    /// it to `Failed`, from which the next call restarts cleanly.
    #[tracing::instrument(skip_all, fields(scenes = timeline.len(), target_secs = target.as_secs_f64()))]
    pub fn generate(
        &self,
        timeline: &SceneTimeline,
        target: TargetDuration,
    ) -> ReelResult<OutputRef> {
        let Some(_busy) = BusyGuard::acquire(&self.generating) else {
            return Err(ReelError::busy("already generating"));
        };

        let result = self.run(timeline, target);
        match &result {
            Ok(out) => {
                tracing::info!(id = %out.id, bytes = out.bytes.len(), "video generated");
            }
            Err(e) => self.record_failure(e),
        }
        result
    }

    fn run(&self, timeline: &SceneTimeline, target: TargetDuration) -> ReelResult<OutputRef> {
        let mut engine = self.lock_engine()?;
        self.ensure_loaded(&mut engine)?;
        self.set_phase(Phase::Ready)?;

        if timeline.is_empty() {
            return Err(ReelError::validation(EMPTY_TIMELINE_MESSAGE));
        }
        let entries = timeline_entries(timeline, target)?;

        self.set_phase(Phase::Staging)?;
        for (scene, entry) in timeline.iter().zip(&entries) {
            let file_name = entry.file_name.as_str();
            engine
                .write_file(file_name, scene.source_bytes())
                .map_err(|e| ReelError::staging(format!("write '{file_name}': {e}")))?;
            tracing::debug!(%file_name, bytes = scene.source_bytes().len(), "staged scene");
        }

        let manifest = build_manifest(&entries)?;
        engine
            .write_file(MANIFEST_FILE, manifest.as_bytes())
            .map_err(|e| ReelError::staging(format!("write '{MANIFEST_FILE}': {e}")))?;

        if let Err(e) = engine.delete_file(OUTPUT_FILE) {
            tracing::debug!(error = %e, "no previous output to delete");
        }

        self.set_phase(Phase::Executing)?;
        engine
            .execute(&transcode_args())
            .map_err(|e| ReelError::execution(format!("transcode: {e}")))?;
        let bytes = engine
            .read_file(OUTPUT_FILE)
            .map_err(|e| ReelError::execution(format!("read '{OUTPUT_FILE}': {e}")))?;
        drop(engine);

        if bytes.is_empty() {
            return Err(ReelError::execution("transcode produced an empty output"));
        }

        let out = {
            let mut state = self.lock_state()?;
            // Release the superseded output before the new one goes live.
            drop(state.output.take());
            let handle = self.lifecycle.acquire(ResourceKind::Output)?;
            let artifact = OutputArtifact::new(handle, bytes);
            let out = artifact.to_ref();
            state.output = Some(artifact);
            state.status = Phase::Succeeded.status_message().to_string();
            out
        };
        self.set_phase(Phase::Succeeded)?;
        Ok(out)
    }

    fn ensure_loaded(&self, engine: &mut E) -> ReelResult<()> {
        if engine.is_loaded() {
            self.loaded.store(true, Ordering::Release);
            return Ok(());
        }

        self.set_phase(Phase::EngineLoading)?;
        engine.load(&self.config).map_err(|e| match e {
            ReelError::EngineUnavailable(_) => e,
            other => ReelError::engine_unavailable(other.to_string()),
        })?;
        self.loaded.store(true, Ordering::Release);
        self.set_phase(Phase::Ready)?;
        Ok(())
    }

    fn record_failure(&self, err: &ReelError) {
        let next = match err {
            ReelError::Validation(_) => None,
            // A rejected reentrant call must not disturb the call in flight.
            ReelError::Busy(_) => return,
            _ => Some(Phase::Failed),
        };
        tracing::warn!(error = %err, kind = ?err.kind(), "generate failed");

        let Ok(mut state) = self.lock_state() else {
            return;
        };
        state.status = err.status_message();
        if let Some(phase) = next {
            state.phase = phase;
            drop(state);
            self.notify(phase);
        }
    }

    fn set_phase(&self, phase: Phase) -> ReelResult<()> {
        {
            let mut state = self.lock_state()?;
            if state.phase == phase {
                return Ok(());
            }
            state.phase = phase;
            if phase.is_busy() {
                state.status = phase.status_message().to_string();
            }
        }
        tracing::info!(?phase, "phase");
        self.notify(phase);
        Ok(())
    }

    fn notify(&self, phase: Phase) {
        if let Some(observer) = &self.observer {
            observer(phase);
        }
    }

    fn lock_state(&self) -> ReelResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ReelError::Other(anyhow::anyhow!("orchestrator state lock poisoned")))
    }

    fn lock_engine(&self) -> ReelResult<MutexGuard<'_, E>> {
        self.engine
            .lock()
            .map_err(|_| ReelError::engine_unavailable("engine lock poisoned"))
    }

    fn try_lock_engine(&self) -> ReelResult<MutexGuard<'_, E>> {
        self.engine.try_lock().map_err(|e| match e {
            TryLockError::WouldBlock => ReelError::busy("engine in use"),
            TryLockError::Poisoned(_) => ReelError::engine_unavailable("engine lock poisoned"),
        })
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
