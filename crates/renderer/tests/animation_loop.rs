mod common;

use std::time::Instant;

use renderer::{LoopState, PixelSize, TIME_STEP};

use common::{cached_preview, preview};

#[test]
fn start_then_stop_leaves_uniforms_untouched() {
    let mut preview = preview(800, 600);
    preview.start();
    preview.stop();
    let before = preview.engine().stats();
    let draws_before = preview.engine().backend().draws.len();

    let now = Instant::now();
    for _ in 0..5 {
        assert_eq!(preview.frame(now).unwrap(), 0);
    }

    assert_eq!(preview.engine().stats(), before);
    assert_eq!(preview.engine().backend().draws.len(), draws_before);
    assert_eq!(preview.loop_state(), LoopState::Stopped);
    assert_eq!(preview.animation().ticks(), 0);
}

#[test]
fn starting_twice_keeps_a_single_scheduled_task() {
    let mut preview = preview(800, 600);
    preview.start();
    let first = preview.animation().token();
    preview.start();
    let second = preview.animation().token();

    assert_eq!(preview.scheduler().outstanding(), 1);
    assert_ne!(first, second);
    assert!(!preview.scheduler().is_scheduled(first.unwrap()));

    assert_eq!(preview.frame(Instant::now()).unwrap(), 1);
    assert_eq!(preview.animation().ticks(), 1);
}

#[test]
fn each_tick_advances_time_and_relaxes_the_field() {
    let mut preview = preview(800, 600);
    preview.start();
    assert_eq!(preview.engine().time(), 0.0);
    let initial = preview.engine().field().clone();

    let now = Instant::now();
    preview.frame(now).unwrap();
    preview.frame(now).unwrap();

    assert!((preview.engine().time() - 2.0 * TIME_STEP).abs() < 1e-6);
    let expected = 0.9f32 * 0.9;
    for (before, after) in initial.cells().zip(preview.engine().field().cells()) {
        assert!((after[0] - before[0] * expected).abs() < 1e-3);
        assert!((after[1] - before[1] * expected).abs() < 1e-3);
        assert_eq!(after[2], before[2]);
    }

    let draws = &preview.engine().backend().draws;
    assert_eq!(draws.len(), 2);
    assert!((draws[1].time - 2.0 * TIME_STEP).abs() < 1e-6);
    assert_eq!(draws[1].strength, 1.0);
}

#[test]
fn restart_resets_time_and_draws_a_new_field() {
    let mut preview = preview(800, 600);
    preview.start();
    let now = Instant::now();
    for _ in 0..3 {
        preview.frame(now).unwrap();
    }
    let relaxed = preview.engine().field().clone();
    let generations = preview.engine().stats().field_generations;

    preview.start();
    assert_eq!(preview.engine().time(), 0.0);
    assert_eq!(preview.engine().stats().field_generations, generations + 1);
    assert_ne!(preview.engine().field(), &relaxed);
    assert_eq!(preview.loop_state(), LoopState::Running);
}

#[test]
fn resize_regenerates_once_and_updates_resolution_once() {
    let mut preview = cached_preview(640, 480, &["/200x100.png"]);
    assert!(preview.show_image("/200x100.png"));
    assert!((preview.engine().image_aspect() - 0.5).abs() < 1e-6);

    let before = preview.engine().stats();
    preview.resize(PixelSize::new(800, 400));
    let after = preview.engine().stats();

    assert_eq!(after.field_generations, before.field_generations + 1);
    assert_eq!(after.resolution_updates, before.resolution_updates + 1);
    assert_eq!(preview.engine().resolution(), [800.0, 400.0, 1.0, 1.0]);
    assert_eq!(
        preview.engine().backend().configured.last(),
        Some(&PixelSize::new(800, 400))
    );
}

#[test]
fn zero_sized_surface_is_clamped() {
    let mut preview = preview(800, 600);
    preview.resize(PixelSize::new(0, 0));
    let resolution = preview.engine().resolution();
    assert_eq!(resolution, [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn field_matches_configured_grid() {
    let preview = preview(800, 600);
    assert_eq!(preview.engine().field().size(), 34);
    assert_eq!(preview.engine().backend().last_field_size, Some(34));
    assert_eq!(preview.engine().backend().quads, 1);
}
