mod common;

use renderer::{InteractionDispatcher, InteractionMode, LoopState, PreviewPhase};

use common::{cached_preview, link, preview};

#[test]
fn pointer_hover_shows_and_hides_the_preview() {
    let mut preview = cached_preview(800, 600, &["/a.jpg"]);
    let mut dispatcher = InteractionDispatcher::new(InteractionMode::Pointer);
    let link = link("/a.jpg", Some("https://example.com/a"));
    let field_before = preview.engine().field().clone();

    dispatcher.hover_enter(&mut preview, &link);

    assert!(dispatcher.canvas_visible());
    assert_eq!(dispatcher.phase(), PreviewPhase::Previewing);
    assert_eq!(preview.loop_state(), LoopState::Running);
    assert_eq!(preview.engine().time(), 0.0);
    assert_ne!(preview.engine().field(), &field_before);
    assert_eq!(
        preview.engine().active_image().copied(),
        preview.lookup("/a.jpg").map(|image| image.handle)
    );

    dispatcher.hover_leave(&mut preview);

    assert!(!dispatcher.canvas_visible());
    assert_eq!(dispatcher.phase(), PreviewPhase::Idle);
    assert_eq!(preview.loop_state(), LoopState::Stopped);
    assert_eq!(preview.scheduler().outstanding(), 0);
}

#[test]
fn touch_tap_remembers_target_and_outside_tap_clears_it() {
    let mut preview = cached_preview(800, 600, &["/a.jpg"]);
    let mut dispatcher = InteractionDispatcher::new(InteractionMode::Touch);
    let link = link("/a.jpg", Some("https://example.com/a"));

    dispatcher.tap(&mut preview, &link);

    assert_eq!(dispatcher.phase(), PreviewPhase::Previewing);
    assert!(dispatcher.canvas_visible());
    assert!(dispatcher.confirm_visible());
    assert_eq!(dispatcher.remembered(), Some("https://example.com/a"));
    assert_eq!(preview.loop_state(), LoopState::Running);

    dispatcher.tap_outside(&mut preview);

    assert_eq!(dispatcher.phase(), PreviewPhase::Idle);
    assert!(!dispatcher.canvas_visible());
    assert!(!dispatcher.confirm_visible());
    assert_eq!(dispatcher.remembered(), None);
    assert_eq!(preview.loop_state(), LoopState::Stopped);
}

#[test]
fn confirm_requests_navigation_and_keeps_state() {
    let mut preview = cached_preview(800, 600, &["/a.jpg"]);
    let mut dispatcher = InteractionDispatcher::new(InteractionMode::Touch);
    assert!(dispatcher.tap_confirm().is_none());

    dispatcher.tap(&mut preview, &link("/a.jpg", Some("https://example.com/a")));
    let request = dispatcher.tap_confirm().expect("navigation request");

    assert_eq!(request.url, "https://example.com/a");
    assert!(request.new_context);
    assert_eq!(dispatcher.phase(), PreviewPhase::Previewing);
    assert!(dispatcher.confirm_visible());
    assert_eq!(preview.loop_state(), LoopState::Running);
}

#[test]
fn events_from_the_other_mode_are_ignored() {
    let mut preview = cached_preview(800, 600, &["/a.jpg"]);
    let link = link("/a.jpg", Some("https://example.com/a"));

    let mut pointer = InteractionDispatcher::new(InteractionMode::Pointer);
    pointer.tap(&mut preview, &link);
    assert_eq!(pointer.phase(), PreviewPhase::Idle);
    assert_eq!(preview.loop_state(), LoopState::Stopped);
    assert!(pointer.tap_confirm().is_none());

    let mut touch = InteractionDispatcher::new(InteractionMode::Touch);
    touch.hover_enter(&mut preview, &link);
    assert_eq!(touch.phase(), PreviewPhase::Idle);
    assert!(!touch.canvas_visible());
    assert_eq!(preview.loop_state(), LoopState::Stopped);
}

#[test]
fn missing_image_keeps_previous_texture_but_still_animates() {
    let mut preview = cached_preview(800, 600, &["/a.jpg"]);
    let mut dispatcher = InteractionDispatcher::new(InteractionMode::Pointer);

    dispatcher.hover_enter(&mut preview, &link("/a.jpg", None));
    let shown = preview.engine().active_image().copied();
    dispatcher.hover_leave(&mut preview);

    dispatcher.hover_enter(&mut preview, &link("/not-loaded.jpg", None));
    assert_eq!(preview.engine().active_image().copied(), shown);
    assert!(dispatcher.canvas_visible());
    assert_eq!(preview.loop_state(), LoopState::Running);
}

#[test]
fn touch_tap_without_href_remembers_nothing() {
    let mut preview = preview(800, 600);
    let mut dispatcher = InteractionDispatcher::new(InteractionMode::Touch);
    dispatcher.tap(&mut preview, &link("/a.jpg", None));
    assert_eq!(dispatcher.phase(), PreviewPhase::Previewing);
    assert_eq!(dispatcher.remembered(), None);
    assert!(dispatcher.tap_confirm().is_none());
    // No image was cached, so the placeholder stays bound.
    assert_eq!(preview.engine().backend().bound, None);
}
