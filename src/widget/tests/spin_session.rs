use super::helpers::*;
use crate::player::{PlayerLookup, PLAYER_NOT_FOUND};
use crate::store::{selected_item_path, InMemoryStore, ThemeStore};
use crate::theme::LayoutDocument;
use crate::widget::model::{RevealedBox, SpinConfig, SpinResult};
use crate::widget::positioning::Point;
use crate::widget::render::{LayoutSource, WidgetEvent};
use crate::widget::session::SpinOutcome;
use crate::widget::spin::{SpinError, SpinPhase};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn linear(duration_ms: u64, step_interval_ms: u64) -> LayoutDocument {
    LayoutDocument {
        spin: Some(SpinConfig {
            duration_ms,
            step_interval_ms,
            deceleration: false,
        }),
        ..Default::default()
    }
}

// ── Timing ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn linear_spin_takes_ten_ticks() {
    let (session, renderer) = stocked_session().await;
    session.apply_layout(linear(1000, 100), LayoutSource::Defaults).await;

    let started = Instant::now();
    let outcome = session.spin().await.unwrap();
    let elapsed = started.elapsed();

    assert!(matches!(outcome, SpinOutcome::Completed(SpinResult::Chosen(_))));
    assert_eq!(renderer.highlights(), (0..10).collect::<Vec<_>>());
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed <= Duration::from_millis(1100));
}

#[tokio::test(start_paused = true)]
async fn finished_spin_leaves_one_highlight_on_the_winner() {
    let (session, renderer) = stocked_session().await;
    let outcome = session.spin().await.unwrap();
    let SpinOutcome::Completed(SpinResult::Chosen(winner)) = outcome else {
        panic!("expected a random reveal, got {:?}", outcome);
    };

    let boxes = session.boxes().await;
    let lit: Vec<usize> = boxes.iter().filter(|b| b.highlighted).map(|b| b.index).collect();
    assert_eq!(lit, vec![winner.index]);
    assert_eq!(winner.content, image_url(winner.index));
    assert_eq!(session.spin_phase().await, SpinPhase::Idle);
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::SpinSettled { .. })), 1);
}

#[tokio::test(start_paused = true)]
async fn default_config_stays_within_duration_plus_one_step() {
    let (session, _) = stocked_session().await;
    let started = Instant::now();
    session.spin().await.unwrap();
    assert!(started.elapsed() <= Duration::from_millis(5000 + 100));
}

// ── Concurrency ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn second_spin_while_running_is_ignored() {
    let (session, renderer) = stocked_session().await;
    let (a, b) = tokio::join!(session.spin(), session.spin());
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(
        outcomes.iter().filter(|o| matches!(o, SpinOutcome::Ignored)).count(),
        1
    );
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::SpinSettled { .. })), 1);
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::SpinStarted)), 1);
}

#[tokio::test(start_paused = true)]
async fn abandoned_spin_settles_and_frees_the_controller() {
    let (session, renderer) = stocked_session().await;
    session.apply_layout(linear(1000, 100), LayoutSource::Defaults).await;

    let cut_short = tokio::time::timeout(Duration::from_millis(250), session.spin()).await;
    assert!(cut_short.is_err());
    assert_eq!(session.spin_phase().await, SpinPhase::Running);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(session.spin_phase().await, SpinPhase::Idle);
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::SpinSettled { .. })), 1);

    let again = session.spin().await.unwrap();
    assert!(matches!(again, SpinOutcome::Completed(SpinResult::Chosen(_))));
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::SpinSettled { .. })), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_speed_from_the_store_still_spins() {
    let store = Arc::new(InMemoryStore::with_root(json!({
        "settings": { "layout": { "spin": { "duration": 300, "speed": 0 } } }
    })));
    let (session, _) = stocked_session().await;
    let session = session.with_store(store);

    assert_eq!(session.load_layout().await, LayoutSource::Remote);
    assert_eq!(session.spin_config().await.step_interval_ms, 100);
    let outcome = session.spin().await.unwrap();
    assert!(matches!(outcome, SpinOutcome::Completed(SpinResult::Chosen(_))));
}

// ── Failure & pre-selection ─────────────────────────────────

#[tokio::test(start_paused = true)]
async fn empty_grid_fails_without_result() {
    let (session, renderer) = empty_session();
    let err = session.spin().await.unwrap_err();
    assert_eq!(err, SpinError::NoContent);
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::SpinSettled { .. })), 0);
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::SpinFailed { .. })), 1);
    assert_eq!(session.spin_phase().await, SpinPhase::Idle);

    // Recovers once content exists.
    session.set_image(4, &image_url(4)).await.unwrap();
    let outcome = session.spin().await.unwrap();
    assert_eq!(
        outcome,
        SpinOutcome::Completed(SpinResult::Chosen(RevealedBox {
            index: 4,
            content: image_url(4)
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn preselected_box_is_revealed_without_animation() {
    let (session, renderer) = stocked_session().await;
    session.pointer_down(3, Point::new(50.0, 50.0), 1_000).await;
    assert_eq!(session.pointer_up(1_080).await, Some((3, true)));

    let started = Instant::now();
    let outcome = session.spin().await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(
        outcome,
        SpinOutcome::Completed(SpinResult::Manual(vec![RevealedBox {
            index: 3,
            content: image_url(3)
        }]))
    );
    assert!(renderer.highlights().is_empty());
    assert!(session.boxes().await.iter().all(|b| !b.selected));
}

// ── Collaborators ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn random_reveal_bumps_the_selection_counter() {
    let store = Arc::new(InMemoryStore::with_root(json!({
        "analytics": { "selectedItems": { "0": 4, "1": 4, "2": 4, "3": 4, "4": 4,
                                          "5": 4, "6": 4, "7": 4, "8": 4, "9": 4 } }
    })));
    let (session, _) = stocked_session().await;
    let session = session.with_store(store.clone());

    let SpinOutcome::Completed(SpinResult::Chosen(winner)) = session.spin().await.unwrap() else {
        panic!("expected a random reveal");
    };
    assert_eq!(
        store.get(&selected_item_path(winner.index)).await.unwrap(),
        Some(json!(5))
    );
}

#[tokio::test]
async fn player_card_follows_the_reveal() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (session, renderer) = stocked_session().await;
    session.apply_layout(linear(50, 10), LayoutSource::Defaults).await;
    let session = session.with_player_lookup(Arc::new(PlayerLookup::new(
        format!("{}/api/freefire", server.uri()),
        Duration::from_secs(5),
    )));

    session.spin_with_player("1234").await.unwrap();
    assert_eq!(renderer.count(|e| matches!(e, WidgetEvent::PlayerResolved { .. })), 0);

    session.spin_with_player("123456789").await.unwrap();
    let cards: Vec<_> = renderer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            WidgetEvent::PlayerResolved { card } => Some(card),
            _ => None,
        })
        .collect();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].nickname, PLAYER_NOT_FOUND);
}
