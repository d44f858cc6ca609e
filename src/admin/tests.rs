use super::*;
use crate::store::InMemoryStore;
use crate::widget::model::BoxPosition;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

fn config() -> AdminConfig {
    AdminConfig {
        password_env: None,
        ..AdminConfig::default()
    }
}

fn console_with(store: Option<Arc<dyn ThemeStore>>) -> (AdminConsole, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (AdminConsole::new(&config(), dir.path(), store), dir)
}

async fn logged_in(store: Option<Arc<dyn ThemeStore>>) -> (AdminConsole, tempfile::TempDir) {
    let (console, dir) = console_with(store);
    console.login("admin", "admin123").await.unwrap();
    (console, dir)
}

fn log_actions(snapshot: &Value) -> Vec<String> {
    let mut entries: Vec<(i64, String)> = snapshot["admin_logs"]
        .as_object()
        .map(|logs| {
            logs.values()
                .map(|e| (e["timestamp"].as_i64().unwrap_or(0), e["action"].as_str().unwrap_or("").to_string()))
                .collect()
        })
        .unwrap_or_default();
    entries.sort();
    entries.into_iter().map(|(_, a)| a).collect()
}

// ── Session ─────────────────────────────────────────────────

#[tokio::test]
async fn everything_needs_a_login() {
    let (console, _dir) = console_with(Some(Arc::new(InMemoryStore::new())));
    assert!(matches!(console.dashboard().await, Err(AdminError::NotAuthenticated)));
    assert!(matches!(
        console.save_background_color("#000000").await,
        Err(AdminError::NotAuthenticated)
    ));
    assert!(matches!(console.login("admin", "wrong").await, Err(AdminError::InvalidCredentials)));
    assert_err!(console.recent_activity().await);
    assert!(!console.is_authenticated().await);
}

#[tokio::test]
async fn login_is_logged_and_restorable() {
    let store = Arc::new(InMemoryStore::new());
    let (console, dir) = logged_in(Some(store.clone())).await;
    assert!(console.is_authenticated().await);
    assert_eq!(log_actions(&store.snapshot().await), vec!["login"]);

    let reopened = AdminConsole::new(&config(), dir.path(), Some(store.clone()));
    assert!(reopened.restore_session().await);
    assert!(reopened.is_authenticated().await);

    reopened.logout().await;
    assert!(!reopened.is_authenticated().await);
    assert!(!console_with(None).0.restore_session().await);
}

// ── Settings ────────────────────────────────────────────────

#[tokio::test]
async fn saves_go_to_the_store_and_keep_positions() {
    let store = Arc::new(InMemoryStore::with_root(json!({
        "settings": { "layout": {
            "roulette": { "design": "grid", "customPositions": [{ "left": 12, "top": 34 }] }
        } }
    })));
    let (console, _dir) = logged_in(Some(store.clone())).await;

    assert_eq!(console.save_background_color("#101010").await.unwrap(), SavedTo::Store);
    let roulette = RouletteForm {
        animation: "bounce".into(),
        enable_positioning: true,
        ..RouletteForm::default()
    };
    assert_eq!(console.save_roulette(&roulette).await.unwrap(), SavedTo::Store);

    let layout = fetch_layout(store.as_ref()).await.unwrap().unwrap();
    assert_eq!(layout.background_color.as_deref(), Some("#101010"));
    assert_eq!(layout.custom_position(0), Some(BoxPosition::new(12.0, 34.0)));
    assert!(layout.roulette.as_ref().unwrap().positioning_active());
    assert!(layout.last_update.is_some());

    let form = console.load_settings().await.unwrap();
    assert_eq!(form.colors.background_color, "#101010");
    assert_eq!(form.roulette.animation, "bounce");
    assert_eq!(
        log_actions(&store.snapshot().await),
        vec!["login", "save_layout", "save_roulette"]
    );
}

#[tokio::test]
async fn without_a_store_saves_stay_local() {
    let (console, dir) = logged_in(None).await;
    let mut form = SettingsForm::default();
    form.hero.title = "Teste".into();

    assert_eq!(console.save_all(&form).await.unwrap(), SavedTo::LocalMirror);
    let mirrored = LocalMirror::new(dir.path()).load_layout().unwrap();
    assert_eq!(mirrored.hero_title.as_deref(), Some("Teste"));
    assert_eq!(console.load_settings().await.unwrap().hero.title, "Teste");
    assert!(matches!(console.devices().await, Err(AdminError::NotConfigured)));
}

#[tokio::test]
async fn reset_positions_needs_a_roulette_section() {
    let store = Arc::new(InMemoryStore::with_root(json!({
        "settings": { "layout": { "heroTitle": "Sem roleta" } }
    })));
    let (console, _dir) = logged_in(Some(store.clone())).await;
    assert!(!console.reset_positions().await.unwrap());

    store
        .set(
            crate::store::LAYOUT_PATH,
            json!({ "roulette": {
                "design": "grid",
                "positions": { "0": 1 },
                "customPositions": [{ "left": 1, "top": 1 }]
            } }),
        )
        .await
        .unwrap();
    assert!(console.reset_positions().await.unwrap());

    let raw = store.get("settings/layout/roulette").await.unwrap().unwrap();
    assert!(raw.get("customPositions").is_none());
    assert!(raw.get("positions").is_none());
    assert_eq!(raw["design"], "grid");
}

// ── Dashboard ───────────────────────────────────────────────

#[tokio::test]
async fn dashboard_reads_the_analytics_nodes() {
    let now = Utc::now().timestamp_millis();
    let store = Arc::new(InMemoryStore::with_root(json!({
        "analytics": {
            "newDevices": { "count": 2 },
            "selectedItems": { "4": 11, "1": 3 }
        },
        "devices": {
            "device_a": { "deviceId": "device_a", "deviceName": "iPhone", "lastAccess": now },
            "device_b": { "deviceId": "device_b", "deviceName": "Windows PC", "lastAccess": 1 }
        }
    })));
    let (console, _dir) = logged_in(Some(store)).await;

    let stats = assert_ok!(console.dashboard().await);
    assert_eq!(stats.new_devices, 2);
    assert_eq!(stats.unique_devices, 2);
    assert_eq!(stats.today_visits, 1);

    let ranking = console.item_ranking().await.unwrap();
    assert_eq!((ranking[0].label.as_str(), ranking[0].count), ("Item 5", 11));

    let devices = console.devices().await.unwrap();
    assert_eq!(devices[0].device_id, "device_a");

    let activity = console.recent_activity().await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!((activity[0].username.as_str(), activity[0].action.as_str()), ("admin", "login"));
}
