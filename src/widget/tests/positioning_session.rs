use super::helpers::*;
use crate::store::InMemoryStore;
use crate::theme::fetch_layout;
use crate::widget::model::{BoxPosition, DragMode};
use crate::widget::positioning::{Point, PositionCommit, PressOutcome, PressRejection};
use crate::widget::render::{LayoutSource, WidgetEvent};
use crate::widget::spin::SpinPhase;
use serde_json::json;
use std::sync::Arc;

async fn positioning_session() -> (crate::widget::WidgetSession, Arc<RecordingRenderer>) {
    let (session, renderer) = stocked_session().await;
    session.set_container(CONTAINER, grid_rects(10)).await;
    assert_eq!(session.toggle_positioning().await, DragMode::FreePositioning);
    (session, renderer)
}

#[tokio::test]
async fn released_drag_persists_only_that_box() {
    let store = Arc::new(InMemoryStore::with_root(json!({
        "settings": { "layout": {
            "accentColor": "#22d3ee",
            "roulette": { "design": "grid", "customPositions": [{ "left": 33, "top": 44 }] }
        } }
    })));
    let (session, renderer) = positioning_session().await;
    let session = session.with_store(store.clone());

    assert_eq!(session.press_box(2, Point::new(400.0, 100.0)).await, PressOutcome::Started);
    session.drag_box(Point::new(430.0, 140.0)).await;
    let commit = session.release_box().await.unwrap();

    // Box 2 starts at (400, 20) in the rendered grid.
    assert_eq!(
        commit,
        PositionCommit { index: 2, position: BoxPosition::new(430.0, 60.0) }
    );
    let layout = fetch_layout(store.as_ref()).await.unwrap().unwrap();
    assert_eq!(layout.custom_position(2), Some(BoxPosition::new(430.0, 60.0)));
    assert_eq!(layout.custom_position(0), Some(BoxPosition::new(33.0, 44.0)));
    assert_eq!(layout.custom_position(1), None);
    assert_eq!(layout.accent_color.as_deref(), Some("#22d3ee"));
    assert_eq!(
        renderer.count(|e| matches!(e, WidgetEvent::PositionChanged { index: 2, .. })),
        1
    );
}

#[tokio::test]
async fn drag_is_clamped_to_the_padded_container() {
    let (session, _) = positioning_session().await;
    session.press_box(9, Point::new(0.0, 0.0)).await;
    let pos = session.drag_box(Point::new(10_000.0, 10_000.0)).await.unwrap();
    assert_eq!(pos, BoxPosition::new(1000.0 - 180.0 - 20.0, 600.0 - 180.0 - 20.0));
}

#[tokio::test]
async fn layout_enabled_positioning_clamps_with_measured_sizes() {
    let store = Arc::new(InMemoryStore::with_root(json!({
        "settings": { "layout": { "roulette": {
            "design": "grid",
            "enablePositioning": true,
            "customPositions": { "3": { "left": 300, "top": 250 } }
        } } }
    })));
    let (session, _) = stocked_session().await;
    let session = session.with_store(store);

    // Layout arrives before the grid has been measured.
    assert_eq!(session.load_layout().await, LayoutSource::Remote);
    assert_eq!(session.drag_mode().await, DragMode::FreePositioning);
    session.set_container(CONTAINER, grid_rects(10)).await;

    let boxes = session.boxes().await;
    assert_eq!(boxes[0].position, Some(BoxPosition::new(20.0, 20.0)));
    assert_eq!(boxes[9].position, Some(BoxPosition::new(780.0, 210.0)));
    assert_eq!(boxes[3].position, Some(BoxPosition::new(300.0, 250.0)));

    assert_eq!(session.press_box(9, Point::new(0.0, 0.0)).await, PressOutcome::Started);
    let pos = session.drag_box(Point::new(10_000.0, 10_000.0)).await.unwrap();
    assert_eq!(pos, BoxPosition::new(800.0, 400.0));
}

#[tokio::test]
async fn persisted_drag_is_restored_by_a_fresh_session() {
    let store = Arc::new(InMemoryStore::with_root(json!({
        "settings": { "layout": { "roulette": { "design": "grid", "enablePositioning": true } } }
    })));
    let (first, _) = stocked_session().await;
    let first = first.with_store(store.clone());
    first.load_layout().await;
    first.set_container(CONTAINER, grid_rects(10)).await;
    first.press_box(2, Point::new(400.0, 100.0)).await;
    first.drag_box(Point::new(430.0, 140.0)).await;
    first.release_box().await.unwrap();

    let (second, _) = stocked_session().await;
    let second = second.with_store(store);
    assert_eq!(second.load_layout().await, LayoutSource::Remote);
    assert_eq!(second.boxes().await[2].position, Some(BoxPosition::new(430.0, 60.0)));

    second.set_container(CONTAINER, grid_rects(10)).await;
    let boxes = second.boxes().await;
    assert_eq!(boxes[2].position, Some(BoxPosition::new(430.0, 60.0)));
    assert_eq!(boxes[1].position, Some(BoxPosition::new(210.0, 20.0)));
}

#[tokio::test(start_paused = true)]
async fn press_is_rejected_while_spinning() {
    let (session, _) = positioning_session().await;
    let spinner = session.clone();
    let handle = tokio::spawn(async move { spinner.spin().await });
    while session.spin_phase().await != SpinPhase::Running {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        session.press_box(0, Point::default()).await,
        PressOutcome::Rejected(PressRejection::Spinning)
    );
    handle.await.unwrap().unwrap();
    assert_eq!(session.press_box(0, Point::default()).await, PressOutcome::Started);
}

#[tokio::test]
async fn positioning_suspends_swap_and_clicks() {
    let (session, _) = positioning_session().await;
    assert!(!session.begin_swap_drag(0).await);
    session.pointer_down(1, Point::default(), 0).await;
    assert_eq!(session.pointer_up(20).await, None);

    assert_eq!(session.toggle_positioning().await, DragMode::Swap);
    assert!(session.boxes().await.iter().all(|b| b.position.is_none()));
    assert!(session.begin_swap_drag(0).await);
    assert_eq!(session.drop_swap(1).await, Some((0, 1)));
    let boxes = session.boxes().await;
    assert_eq!(boxes[0].image.as_deref(), Some(image_url(1).as_str()));
    assert_eq!(boxes[1].image.as_deref(), Some(image_url(0).as_str()));
}

#[tokio::test]
async fn switching_mode_mid_drag_drops_the_gesture() {
    let store = Arc::new(InMemoryStore::new());
    let (session, _) = positioning_session().await;
    let session = session.with_store(store.clone());

    session.press_box(4, Point::new(0.0, 0.0)).await;
    session.drag_box(Point::new(-50.0, 30.0)).await;
    session.set_drag_mode(DragMode::Swap).await;

    assert_eq!(session.release_box().await, None);
    assert!(fetch_layout(store.as_ref()).await.unwrap().is_none());
}

#[tokio::test]
async fn cancel_puts_the_box_back() {
    let (session, _) = positioning_session().await;
    let before = session.boxes().await[6].position;
    session.press_box(6, Point::new(0.0, 0.0)).await;
    session.drag_box(Point::new(80.0, 80.0)).await;
    assert_eq!(session.cancel_drag().await, Some(6));
    assert_eq!(session.boxes().await[6].position, before);
    assert_eq!(session.release_box().await, None);
}
