use std::{sync::Arc, thread::JoinHandle};

use crate::{
    assets::lifecycle::AssetLifecycleManager,
    config::StudioConfig,
    duration::TargetDuration,
    engine::TranscodeEngine,
    foundation::error::{FailureKind, ReelError, ReelResult},
    orchestrator::TranscodeOrchestrator,
    output::OutputRef,
    timeline::{MoveDirection, SceneId, SceneSource, SceneTimeline},
};

/// One editing session: the timeline, the requested length and the orchestrator.
///
/// Dropping the studio releases every preview and output handle it still holds.
pub struct Studio<E> {
    lifecycle: AssetLifecycleManager,
    timeline: SceneTimeline,
    target: TargetDuration,
    orchestrator: Arc<TranscodeOrchestrator<E>>,
    warm_up: Option<JoinHandle<ReelResult<()>>>,
}

impl<E: TranscodeEngine> Studio<E> {
    pub fn new(engine: E, config: &StudioConfig) -> ReelResult<Self> {
        let lifecycle = AssetLifecycleManager::new();
        let orchestrator =
            TranscodeOrchestrator::new(engine, config.engine.clone(), lifecycle.clone());
        Ok(Self::from_parts(
            lifecycle,
            Arc::new(orchestrator),
            config.default_duration()?,
        ))
    }

    /// Assemble a studio around an already configured orchestrator. `lifecycle` should be the
    /// manager the orchestrator was built with.
    pub fn from_parts(
        lifecycle: AssetLifecycleManager,
        orchestrator: Arc<TranscodeOrchestrator<E>>,
        target: TargetDuration,
    ) -> Self {
        Self {
            timeline: SceneTimeline::new(lifecycle.clone()),
            lifecycle,
            target,
            orchestrator,
            warm_up: None,
        }
    }

    pub fn add_sources(
        &mut self,
        sources: impl IntoIterator<Item = SceneSource>,
    ) -> ReelResult<Vec<SceneId>> {
        self.timeline.append(sources)
    }

    pub fn remove_scene(&mut self, id: &SceneId) -> bool {
        self.timeline.remove(id)
    }

    pub fn move_scene(&mut self, id: &SceneId, direction: MoveDirection) -> bool {
        self.timeline.move_scene(id, direction)
    }

    /// The value is kept even while the timeline is empty.
    pub fn set_target_duration(&mut self, secs: f64) -> ReelResult<TargetDuration> {
        self.target = TargetDuration::new(secs)?;
        Ok(self.target)
    }

    pub fn target_duration(&self) -> TargetDuration {
        self.target
    }

    pub fn generate(&self) -> ReelResult<OutputRef> {
        self.orchestrator.generate(&self.timeline, self.target)
    }

    /// Empty the timeline and discard the current video.
    pub fn clear_all(&mut self) -> ReelResult<()> {
        self.timeline.clear();
        self.orchestrator.release_output()?;
        self.orchestrator.clear_status();
        Ok(())
    }

    pub fn status(&self) -> String {
        self.orchestrator.last_status()
    }

    pub fn timeline(&self) -> &SceneTimeline {
        &self.timeline
    }

    pub fn orchestrator(&self) -> &Arc<TranscodeOrchestrator<E>> {
        &self.orchestrator
    }

    pub fn lifecycle(&self) -> &AssetLifecycleManager {
        &self.lifecycle
    }
}

impl<E: TranscodeEngine + 'static> Studio<E> {
    /// Like [`new`](Self::new), but starts loading the engine on a background thread right away.
    ///
    /// Editing is not blocked. A generate issued before loading finishes waits for it, and a
    /// load failure is surfaced through [`status`](Self::status) and the orchestrator's phase.
    pub fn start(engine: E, config: &StudioConfig) -> ReelResult<Self> {
        let mut studio = Self::new(engine, config)?;
        studio.warm_up = Some(studio.orchestrator.spawn_warm_up()?);
        Ok(studio)
    }

    /// Block until the warm-up started by [`start`](Self::start) has finished.
    pub fn wait_for_engine(&mut self) -> ReelResult<()> {
        let Some(handle) = self.warm_up.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(Err(e)) if e.kind() == FailureKind::Busy => {
                // A generate got the engine first and loaded it itself.
                tracing::debug!("warm-up skipped, engine already in use");
                Ok(())
            }
            Ok(result) => result,
            Err(_) => Err(ReelError::Other(anyhow::anyhow!("warm-up thread panicked"))),
        }
    }
}
