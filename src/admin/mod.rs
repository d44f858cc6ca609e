//! Admin console: login, theme editing and the analytics dashboard.

pub mod analytics;
pub mod auth;
pub mod settings;

#[cfg(test)]
mod tests;

pub use analytics::{Activity, DashboardStats, DeviceRow, ItemCount};
pub use auth::{AdminAuth, AdminSession};
pub use settings::{ColorSettings, HeroSettings, RouletteForm, SettingsForm};

use crate::config::AdminConfig;
use crate::store::{
    StoreError, ThemeStore, ADMIN_LOGS_PATH, DEVICES_PATH, NEW_DEVICES_PATH, SELECTED_ITEMS_PATH,
};
use crate::theme::{fetch_layout, update_layout, LayoutDocument, LocalMirror};
use chrono::Utc;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("not logged in")]
    NotAuthenticated,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("local storage: {0}")]
    Local(String),
    /// The operation needs the realtime store and none is configured.
    #[error("no store configured")]
    NotConfigured,
}

/// Where a settings save ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedTo {
    Store,
    /// No store configured; the change only exists on this machine.
    LocalMirror,
}

pub struct AdminConsole {
    auth: AdminAuth,
    store: Option<Arc<dyn ThemeStore>>,
    mirror: LocalMirror,
    session: RwLock<Option<AdminSession>>,
}

impl AdminConsole {
    pub fn new(
        config: &AdminConfig,
        data_dir: impl Into<PathBuf>,
        store: Option<Arc<dyn ThemeStore>>,
    ) -> Self {
        let data_dir = data_dir.into();
        Self {
            auth: AdminAuth::new(config, data_dir.clone()),
            store,
            mirror: LocalMirror::new(data_dir),
            session: RwLock::new(None),
        }
    }

    // ── Session ────────────────────────────────────────

    /// Pick up a still-valid session left by a previous login.
    pub async fn restore_session(&self) -> bool {
        let restored = self.auth.current(Utc::now());
        let found = restored.is_some();
        *self.session.write().await = restored;
        found
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AdminSession, AdminError> {
        let session = self.auth.login(username, password, Utc::now())?;
        *self.session.write().await = Some(session.clone());
        self.log_action(&session.username, "login").await;
        Ok(session)
    }

    pub async fn logout(&self) {
        self.auth.logout();
        *self.session.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.require_session().await.is_ok()
    }

    /// Username of the active session.
    async fn require_session(&self) -> Result<String, AdminError> {
        let mut guard = self.session.write().await;
        match guard.as_ref() {
            Some(s) if s.is_valid_at(Utc::now()) => Ok(s.username.clone()),
            Some(_) => {
                tracing::info!("[AdminConsole] Session expired");
                *guard = None;
                self.auth.logout();
                Err(AdminError::NotAuthenticated)
            }
            None => Err(AdminError::NotAuthenticated),
        }
    }

    fn require_store(&self) -> Result<&dyn ThemeStore, AdminError> {
        self.store.as_deref().ok_or(AdminError::NotConfigured)
    }

    /// Append to `admin_logs`. Failures are logged and otherwise ignored.
    async fn log_action(&self, username: &str, action: &str) {
        let Some(store) = self.store.as_deref() else {
            return;
        };
        let entry = json!({
            "username": username,
            "action": action,
            "timestamp": store.server_timestamp(),
        });
        if let Err(e) = store.push(ADMIN_LOGS_PATH, entry).await {
            tracing::warn!("[AdminConsole] Failed to record '{}': {}", action, e);
        }
    }

    // ── Theme settings ─────────────────────────────────

    /// Current settings, for pre-filling the forms.
    pub async fn load_settings(&self) -> Result<SettingsForm, AdminError> {
        self.require_session().await?;
        let layout = match self.store.as_deref() {
            Some(store) => fetch_layout(store).await?,
            None => self.mirror.load_layout(),
        };
        Ok(SettingsForm::from_layout(&layout.unwrap_or_default()))
    }

    pub async fn save_background_color(&self, color: &str) -> Result<SavedTo, AdminError> {
        let color = color.to_string();
        self.edit_layout("save_layout", move |layout| {
            layout.background_color = Some(color);
        })
        .await
    }

    pub async fn save_roulette(&self, form: &RouletteForm) -> Result<SavedTo, AdminError> {
        self.edit_layout("save_roulette", |layout| form.apply(layout.roulette_mut()))
            .await
    }

    pub async fn save_all(&self, form: &SettingsForm) -> Result<SavedTo, AdminError> {
        self.edit_layout("save_all_settings", |layout| form.apply(layout))
            .await
    }

    /// Drop every stored box position. Returns `false` when the document has
    /// no roulette section, in which case nothing is written.
    pub async fn reset_positions(&self) -> Result<bool, AdminError> {
        let username = self.require_session().await?;
        let current = match self.store.as_deref() {
            Some(store) => fetch_layout(store).await?,
            None => self.mirror.load_layout(),
        };
        if current.as_ref().and_then(|l| l.roulette.as_ref()).is_none() {
            tracing::info!("[AdminConsole] No roulette settings, nothing to reset");
            return Ok(false);
        }

        self.write_layout(&username, "reset_positions", LayoutDocument::clear_custom_positions)
            .await?;
        Ok(true)
    }

    async fn edit_layout<F>(&self, action: &str, edit: F) -> Result<SavedTo, AdminError>
    where
        F: FnOnce(&mut LayoutDocument),
    {
        let username = self.require_session().await?;
        self.write_layout(&username, action, edit).await
    }

    async fn write_layout<F>(&self, username: &str, action: &str, edit: F) -> Result<SavedTo, AdminError>
    where
        F: FnOnce(&mut LayoutDocument),
    {
        match self.store.as_deref() {
            Some(store) => {
                let layout = update_layout(store, edit).await?;
                if let Err(e) = self.mirror.save_layout(&layout) {
                    tracing::warn!("[AdminConsole] Failed to mirror layout: {}", e);
                }
                self.log_action(username, action).await;
                tracing::info!("[AdminConsole] {} saved to store", action);
                Ok(SavedTo::Store)
            }
            None => {
                let mut layout = self.mirror.load_layout().unwrap_or_default();
                edit(&mut layout);
                layout.last_update = Some(json!(Utc::now().timestamp_millis()));
                self.mirror.save_layout(&layout).map_err(AdminError::Local)?;
                tracing::info!("[AdminConsole] {} saved locally (no store)", action);
                Ok(SavedTo::LocalMirror)
            }
        }
    }

    // ── Dashboard ──────────────────────────────────────

    pub async fn dashboard(&self) -> Result<DashboardStats, AdminError> {
        self.require_session().await?;
        let store = self.require_store()?;
        let (new_devices, devices) =
            tokio::try_join!(store.get(NEW_DEVICES_PATH), store.get(DEVICES_PATH))?;
        Ok(analytics::dashboard_stats(
            new_devices.as_ref(),
            devices.as_ref(),
            analytics::local_midnight_ms(Utc::now()),
        ))
    }

    pub async fn item_ranking(&self) -> Result<Vec<ItemCount>, AdminError> {
        self.require_session().await?;
        let items = self.require_store()?.get(SELECTED_ITEMS_PATH).await?;
        Ok(analytics::item_ranking(items.as_ref()))
    }

    pub async fn devices(&self) -> Result<Vec<DeviceRow>, AdminError> {
        self.require_session().await?;
        let devices = self.require_store()?.get(DEVICES_PATH).await?;
        Ok(analytics::device_rows(devices.as_ref()))
    }

    pub async fn recent_activity(&self) -> Result<Vec<Activity>, AdminError> {
        self.require_session().await?;
        let logs = self.require_store()?.get(ADMIN_LOGS_PATH).await?;
        Ok(analytics::recent_activity(logs.as_ref()))
    }
}
