//! Admin login against configured credentials, with a session file that
//! expires after a fixed number of hours.

use super::AdminError;
use crate::config::{read_json_file, save_json_config, AdminConfig};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SESSION_FILE: &str = "admin_session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub username: String,
    /// Unix milliseconds.
    pub expires: i64,
}

impl AdminSession {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now.timestamp_millis()
    }
}

pub struct AdminAuth {
    username: String,
    password: Option<String>,
    session_hours: i64,
    session_path: PathBuf,
}

impl AdminAuth {
    pub fn new(config: &AdminConfig, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            username: config.username.clone(),
            password: config.resolved_password(),
            session_hours: config.session_hours,
            session_path: data_dir.into().join(SESSION_FILE),
        }
    }

    /// Check credentials and persist a fresh session.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminSession, AdminError> {
        let Some(expected) = self.password.as_deref() else {
            tracing::warn!("[AdminAuth] No admin password configured, login refused");
            return Err(AdminError::InvalidCredentials);
        };
        if username != self.username || password != expected {
            tracing::warn!("[AdminAuth] Failed login for {:?}", username);
            return Err(AdminError::InvalidCredentials);
        }

        let session = AdminSession {
            username: username.to_string(),
            expires: (now + Duration::hours(self.session_hours)).timestamp_millis(),
        };
        save_json_config(&self.session_path, &session, "AdminAuth").map_err(AdminError::Local)?;
        tracing::info!("[AdminAuth] {} logged in", username);
        Ok(session)
    }

    /// The stored session if it has not expired. Expired sessions are removed.
    pub fn current(&self, now: DateTime<Utc>) -> Option<AdminSession> {
        let session: AdminSession = read_json_file(&self.session_path, "AdminAuth")?;
        if session.is_valid_at(now) {
            Some(session)
        } else {
            tracing::info!("[AdminAuth] Session for {} expired", session.username);
            self.logout();
            None
        }
    }

    pub fn logout(&self) {
        match std::fs::remove_file(&self.session_path) {
            Ok(()) => tracing::info!("[AdminAuth] Logged out"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("[AdminAuth] Failed to remove session file: {}", e),
        }
    }
}
