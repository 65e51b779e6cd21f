mod support;

use std::{
    sync::{Arc, Mutex, mpsc},
    time::Duration,
};

use scenereel::{
    AssetLifecycleManager, EMPTY_TIMELINE_MESSAGE, EngineConfig, FailureKind, MANIFEST_FILE,
    OUTPUT_FILE, Phase, ReelError, ResourceKind, SceneSource, SceneTimeline, TargetDuration,
    TranscodeEngine, TranscodeOrchestrator, transcode_args,
};
use support::{FakeEngine, FakeState, image_source};

fn setup() -> (
    TranscodeOrchestrator<FakeEngine>,
    Arc<Mutex<FakeState>>,
    SceneTimeline,
) {
    let (engine, state) = FakeEngine::new();
    let lifecycle = AssetLifecycleManager::new();
    let orch = TranscodeOrchestrator::new(engine, EngineConfig::default(), lifecycle.clone());
    (orch, state, SceneTimeline::new(lifecycle))
}

fn target(secs: f64) -> TargetDuration {
    TargetDuration::new(secs).unwrap()
}

#[test]
fn zero_scenes_is_a_validation_failure_without_staging() {
    let (orch, state, timeline) = setup();

    let err = orch.generate(&timeline, target(18.0)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert_eq!(err.kind(), FailureKind::Validation);
    assert_eq!(orch.phase(), Phase::Ready);
    assert_eq!(orch.last_status(), EMPTY_TIMELINE_MESSAGE);

    let st = state.lock().unwrap();
    assert!(st.files.is_empty());
    assert!(st.executed.is_empty());
    assert_eq!(st.ops, vec!["load".to_string()]);
}

#[test]
fn three_scenes_stage_manifest_and_run_fixed_command() {
    let (orch, state, mut timeline) = setup();
    let a = SceneSource::new(vec![1u8, 1], "image/png", "a.png");
    let b = SceneSource::new(vec![2u8, 2], "image/jpeg", "b.jpg");
    let c = SceneSource::new(vec![3u8, 3], "image/webp", "c.webp");
    timeline.append([a, b, c]).unwrap();

    let out = orch.generate(&timeline, target(18.0)).unwrap();
    assert_eq!(&*out.bytes, b"mp4#1");
    assert_eq!(orch.phase(), Phase::Succeeded);
    assert_eq!(orch.last_status(), Phase::Succeeded.status_message());

    let st = state.lock().unwrap();
    assert_eq!(st.files["scene_00.png"], vec![1u8, 1]);
    assert_eq!(st.files["scene_01.jpeg"], vec![2u8, 2]);
    assert_eq!(st.files["scene_02.webp"], vec![3u8, 3]);
    assert_eq!(
        String::from_utf8(st.files[MANIFEST_FILE].clone()).unwrap(),
        "ffconcat version 1.0\n\
         file 'scene_00.png'\n\
         duration 6.000\n\
         file 'scene_01.jpeg'\n\
         duration 6.000\n\
         file 'scene_02.webp'"
    );
    assert_eq!(st.executed, vec![transcode_args()]);
    assert_eq!(
        st.ops,
        vec![
            "load",
            "write scene_00.png",
            "write scene_01.jpeg",
            "write scene_02.webp",
            "write inputs.txt",
            "delete output.mp4",
            "execute",
            "read output.mp4",
        ]
    );
}

#[test]
fn back_to_back_generates_keep_one_live_output() {
    let (orch, _state, mut timeline) = setup();
    timeline
        .append([image_source("a.png"), image_source("b.png")])
        .unwrap();
    let lifecycle = orch.lifecycle().clone();

    let first = orch.generate(&timeline, target(15.0)).unwrap();
    assert!(lifecycle.is_live(first.id));
    assert_eq!(lifecycle.live_count(ResourceKind::Output), 1);

    let second = orch.generate(&timeline, target(20.0)).unwrap();
    assert_ne!(first.id, second.id);
    assert!(!lifecycle.is_live(first.id));
    assert!(lifecycle.is_live(second.id));
    assert_eq!(lifecycle.live_count(ResourceKind::Output), 1);
    assert_eq!(orch.current_output().unwrap().id, second.id);
}

#[test]
fn prior_output_deletion_is_attempted_and_absence_is_not_an_error() {
    let (orch, state, mut timeline) = setup();
    timeline.append([image_source("a.png")]).unwrap();

    orch.generate(&timeline, target(18.0)).unwrap();
    orch.generate(&timeline, target(18.0)).unwrap();

    let st = state.lock().unwrap();
    let deletes = st
        .ops
        .iter()
        .filter(|op| *op == &format!("delete {OUTPUT_FILE}"))
        .count();
    assert_eq!(deletes, 2);
}

#[test]
fn staging_failure_preserves_previous_output() {
    let (orch, state, mut timeline) = setup();
    timeline
        .append([image_source("a.png"), image_source("b.png")])
        .unwrap();
    let good = orch.generate(&timeline, target(18.0)).unwrap();

    state.lock().unwrap().fail_write = Some("scene_01.png".to_string());
    let err = orch.generate(&timeline, target(18.0)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Staging);
    assert_eq!(orch.phase(), Phase::Failed);
    assert_eq!(orch.last_status(), err.status_message());

    let current = orch.current_output().unwrap();
    assert_eq!(current.id, good.id);
    assert!(orch.lifecycle().is_live(good.id));
    assert_eq!(state.lock().unwrap().executed.len(), 1);
}

#[test]
fn execution_failure_then_retry_restarts_from_staging() {
    let (orch, state, mut timeline) = setup();
    timeline.append([image_source("a.png")]).unwrap();

    state.lock().unwrap().fail_execute = true;
    let err = orch.generate(&timeline, target(18.0)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Execution);
    assert_eq!(orch.phase(), Phase::Failed);
    assert!(orch.current_output().is_none());
    assert!(orch.is_ready());

    state.lock().unwrap().fail_execute = false;
    orch.generate(&timeline, target(18.0)).unwrap();
    assert_eq!(orch.phase(), Phase::Succeeded);
    assert_eq!(state.lock().unwrap().load_calls, 1);
}

#[test]
fn empty_output_is_an_execution_failure() {
    let (orch, state, mut timeline) = setup();
    timeline.append([image_source("a.png")]).unwrap();
    state.lock().unwrap().empty_output = true;

    let err = orch.generate(&timeline, target(18.0)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Execution);
    assert_eq!(orch.lifecycle().live_count(ResourceKind::Output), 0);
}

#[test]
fn load_failure_is_engine_unavailable_and_retried_next_time() {
    let (orch, state, mut timeline) = setup();
    timeline.append([image_source("a.png")]).unwrap();
    state.lock().unwrap().load_failures_left = 1;

    let err = orch.generate(&timeline, target(18.0)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::EngineUnavailable);
    assert_eq!(orch.phase(), Phase::Failed);
    assert!(!orch.is_ready());

    orch.generate(&timeline, target(18.0)).unwrap();
    assert!(orch.is_ready());
    assert_eq!(state.lock().unwrap().load_calls, 2);
}

#[test]
fn warm_up_loads_once_and_reports_phases() {
    let (engine, state) = FakeEngine::new();
    let lifecycle = AssetLifecycleManager::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let orch = Arc::new(
        TranscodeOrchestrator::new(engine, EngineConfig::default(), lifecycle.clone())
            .with_phase_observer(move |p| sink.lock().unwrap().push(p)),
    );
    assert_eq!(orch.phase(), Phase::Idle);
    assert!(!orch.is_ready());

    orch.spawn_warm_up().unwrap().join().unwrap().unwrap();
    assert!(orch.is_ready());
    assert_eq!(orch.phase(), Phase::Ready);

    let mut timeline = SceneTimeline::new(lifecycle);
    timeline.append([image_source("a.png")]).unwrap();
    orch.generate(&timeline, target(18.0)).unwrap();

    assert_eq!(state.lock().unwrap().load_calls, 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Phase::EngineLoading,
            Phase::Ready,
            Phase::Staging,
            Phase::Executing,
            Phase::Succeeded,
        ]
    );
}

#[test]
fn reentrant_generate_is_rejected_while_busy() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let (engine, state) = FakeEngine::new();
    let engine = engine.gated(started_tx, release_rx);
    let lifecycle = AssetLifecycleManager::new();
    let orch = TranscodeOrchestrator::new(engine, EngineConfig::default(), lifecycle.clone());
    let mut timeline = SceneTimeline::new(lifecycle);
    timeline.append([image_source("a.png")]).unwrap();

    std::thread::scope(|s| {
        let first = s.spawn(|| orch.generate(&timeline, target(18.0)));

        started_rx.recv().unwrap();
        assert!(orch.is_generating());
        assert_eq!(orch.phase(), Phase::Executing);

        let err = orch.generate(&timeline, target(18.0)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Busy);
        assert_eq!(orch.phase(), Phase::Executing);

        release_tx.send(()).unwrap();
        first.join().unwrap().unwrap();
    });

    assert!(!orch.is_generating());
    assert_eq!(orch.phase(), Phase::Succeeded);
    assert_eq!(state.lock().unwrap().executed.len(), 1);
}

#[test]
fn observer_can_call_back_into_the_orchestrator_mid_generate() {
    let (engine, _state) = FakeEngine::new();
    let lifecycle = AssetLifecycleManager::new();
    let engine_calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&engine_calls);
    let orch = Arc::new_cyclic(|weak: &std::sync::Weak<TranscodeOrchestrator<FakeEngine>>| {
        let weak = weak.clone();
        TranscodeOrchestrator::new(engine, EngineConfig::default(), lifecycle.clone())
            .with_phase_observer(move |p| {
                if p != Phase::Staging {
                    return;
                }
                let Some(o) = weak.upgrade() else { return };
                assert_eq!(o.phase(), Phase::Staging);
                let engine = o.with_engine(|e| e.is_loaded()).map_err(|e| e.kind());
                let warm = o.warm_up().map_err(|e| e.kind());
                sink.lock().unwrap().push((engine, warm));
            })
    });
    let mut timeline = SceneTimeline::new(lifecycle);
    timeline.append([image_source("a.png")]).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let worker = {
        let orch = Arc::clone(&orch);
        std::thread::spawn(move || {
            let result = orch.generate(&timeline, target(18.0)).map(|_| ());
            done_tx.send(result).unwrap();
        })
    };

    let result = done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("generate returned");
    worker.join().unwrap();
    result.unwrap();

    assert_eq!(
        *engine_calls.lock().unwrap(),
        vec![(Err(FailureKind::Busy), Err(FailureKind::Busy))]
    );
    assert_eq!(orch.phase(), Phase::Succeeded);
    assert!(orch.with_engine(|e| e.is_loaded()).unwrap());
}

#[test]
fn warm_up_reports_busy_while_generate_owns_the_engine() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let (engine, state) = FakeEngine::new();
    let engine = engine.gated(started_tx, release_rx);
    let lifecycle = AssetLifecycleManager::new();
    let orch = TranscodeOrchestrator::new(engine, EngineConfig::default(), lifecycle.clone());
    let mut timeline = SceneTimeline::new(lifecycle);
    timeline.append([image_source("a.png")]).unwrap();

    std::thread::scope(|s| {
        let first = s.spawn(|| orch.generate(&timeline, target(18.0)));
        started_rx.recv().unwrap();

        assert_eq!(orch.warm_up().unwrap_err().kind(), FailureKind::Busy);
        assert_eq!(orch.phase(), Phase::Executing);

        release_tx.send(()).unwrap();
        first.join().unwrap().unwrap();
    });

    assert_eq!(state.lock().unwrap().load_calls, 1);
    orch.warm_up().unwrap();
}
