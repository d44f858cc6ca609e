pub mod admin;
pub mod config;
pub mod device;
pub mod logging;
pub mod nick;
pub mod player;
pub mod store;
pub mod theme;
pub mod utils;
pub mod widget;

use crate::config::{EngineConfig, StoreConfig, ENGINE_CONFIG_FILE};
use crate::device::{ClientEnvironment, DeviceRegistry};
use crate::player::PlayerLookup;
use crate::store::{FirebaseStore, InMemoryStore, ThemeStore};
use crate::theme::LocalMirror;
use crate::utils::RetryPolicy;
use crate::widget::{LogRenderer, SpinOutcome, WidgetSession};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Realtime store for `config`: the remote database when a URL is
/// configured, otherwise a process-local store.
pub fn build_store(config: &StoreConfig) -> Arc<dyn ThemeStore> {
    match config.resolved_url() {
        Some(url) => {
            tracing::info!("[Engine] Using realtime store at {}", url);
            let retry = RetryPolicy {
                max_retries: config.max_retries,
                ..RetryPolicy::default()
            };
            Arc::new(
                FirebaseStore::new(url, config.resolved_token(), Duration::from_secs(config.timeout_secs))
                    .with_retry(retry),
            )
        }
        None => {
            tracing::info!("[Engine] No database URL configured, running in offline mode");
            Arc::new(InMemoryStore::new())
        }
    }
}

/// Everything one widget page needs, wired from a single config file.
pub struct Engine {
    pub config: EngineConfig,
    pub data_dir: PathBuf,
    pub store: Arc<dyn ThemeStore>,
    pub player: Arc<PlayerLookup>,
}

impl Engine {
    /// Load `engine_config.json` from `config_path` (or the data directory).
    pub fn from_config_file(config_path: Option<PathBuf>) -> Self {
        let default_path = config::default_data_dir().join(ENGINE_CONFIG_FILE);
        let config = EngineConfig::load(&config_path.unwrap_or(default_path));
        Self::new(config)
    }

    pub fn new(config: EngineConfig) -> Self {
        let data_dir = config.data_dir();
        let store = build_store(&config.store);
        let player = Arc::new(PlayerLookup::new(
            config.player.endpoint.clone(),
            Duration::from_secs(config.player.timeout_secs),
        ));
        Self {
            config,
            data_dir,
            store,
            player,
        }
    }

    /// Widget session with store, mirror and player lookup attached, layout loaded.
    pub async fn widget(&self, box_count: usize) -> WidgetSession {
        let session = WidgetSession::new(box_count, Arc::new(LogRenderer))
            .with_store(self.store.clone())
            .with_mirror(LocalMirror::new(self.data_dir.clone()))
            .with_player_lookup(self.player.clone());
        let source = session.load_layout().await;
        tracing::info!("[Engine] Widget ready ({:?} layout)", source);
        session
    }

    /// Register this machine in the device registry. Failures are logged only.
    pub async fn register_device(&self, env: &ClientEnvironment) {
        let device_id = match device::load_or_create_device_id(&self.data_dir) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("[Engine] Could not persist device id: {}", e);
                return;
            }
        };
        let registry = DeviceRegistry::new(self.store.clone(), &self.config.device);
        match registry.register(&device_id, env).await {
            Ok(record) => tracing::info!(
                "[Engine] Device {} registered (new: {})",
                record.device_id,
                record.is_new
            ),
            Err(e) => tracing::warn!("[Engine] Device registration failed: {}", e),
        }
    }

    pub fn admin(&self) -> admin::AdminConsole {
        admin::AdminConsole::new(&self.config.admin, self.data_dir.clone(), Some(self.store.clone()))
    }
}

/// One spin with an optional player reveal, logged through the renderer.
pub async fn run_spin(engine: &Engine, player_id: Option<&str>) -> anyhow::Result<SpinOutcome> {
    let session = engine.widget(widget::model::DEFAULT_BOX_COUNT).await;
    let outcome = match player_id {
        Some(id) => session.spin_with_player(id).await?,
        None => session.spin().await?,
    };
    Ok(outcome)
}
