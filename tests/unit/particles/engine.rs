use super::*;
use crate::render::surface::{RecordingSurface, SurfaceOp};

#[test]
fn burst_spawns_and_schedules_once() {
    let mut engine = ParticleEngine::new();
    let mut frames = FrameScheduler::new();
    let (surface, _) = RecordingSurface::new(100, 100);
    let id = engine
        .create(ParticleConfig::default(), Box::new(surface))
        .unwrap();

    assert_eq!(engine.burst(id, 50, &mut frames), 50);
    assert_eq!(engine.burst(id, 50, &mut frames), 30);
    assert_eq!(frames.pending_len(), 1);
    assert!(engine.get(id).unwrap().is_running());
}

#[test]
fn destroy_is_idempotent_and_cancels_frames() {
    let mut engine = ParticleEngine::new();
    let mut frames = FrameScheduler::new();
    let (surface, _) = RecordingSurface::new(100, 100);
    let id = engine
        .create(ParticleConfig::default(), Box::new(surface))
        .unwrap();
    engine.burst(id, 10, &mut frames);

    assert!(engine.destroy(id, &mut frames));
    assert!(!engine.destroy(id, &mut frames));
    assert_eq!(frames.pending_len(), 0);
    assert!(engine.is_empty());
    assert_eq!(engine.burst(id, 10, &mut frames), 0);
}

#[test]
fn populate_draws_once_without_a_loop() {
    let mut engine = ParticleEngine::new();
    let mut frames = FrameScheduler::new();
    let (surface, log) = RecordingSurface::new(100, 100);
    let id = engine
        .create(ParticleConfig::default(), Box::new(surface))
        .unwrap();

    assert_eq!(engine.populate(id, 12).unwrap(), 12);
    assert!(!engine.get(id).unwrap().is_running());
    assert_eq!(frames.pending_len(), 0);
    assert_eq!(log.borrow().ops.last(), Some(&SurfaceOp::Present));
    assert!(engine.destroy(id, &mut frames));
    assert_eq!(engine.populate(id, 12).unwrap(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let mut engine = ParticleEngine::new();
    let (surface, _) = RecordingSurface::new(10, 10);
    let cfg = ParticleConfig {
        max_count: 5000,
        ..ParticleConfig::default()
    };
    assert!(engine.create(cfg, Box::new(surface)).is_err());
}
