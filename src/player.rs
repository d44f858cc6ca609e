//! Game profile lookup shown next to a reveal.

use crate::device::LookupError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const PLAYER_NOT_FOUND: &str = "Player not found";
const MIN_ID_LEN: usize = 5;
const MAX_ID_LEN: usize = 13;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCard {
    pub player_id: String,
    pub nickname: String,
    pub level: Option<u32>,
    pub avatar_url: Option<String>,
    /// False for the placeholder card.
    pub found: bool,
}

impl PlayerCard {
    pub fn placeholder(player_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            nickname: PLAYER_NOT_FOUND.to_string(),
            level: None,
            avatar_url: None,
            found: false,
        }
    }
}

/// Trim and check a player id: 5 to 13 ASCII digits.
pub fn validate_player_id(raw: &str) -> Result<String, LookupError> {
    let id = raw.trim();
    let ok = (MIN_ID_LEN..=MAX_ID_LEN).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit());
    if ok {
        Ok(id.to_string())
    } else {
        Err(LookupError::InvalidPlayerId(id.to_string()))
    }
}

fn non_empty_str(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn level(data: &Value) -> Option<u32> {
    match data.get("level")? {
        Value::Number(n) => n.as_u64().and_then(|l| u32::try_from(l).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct PlayerLookup {
    client: Client,
    endpoint: String,
}

impl PlayerLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
        }
    }

    pub async fn lookup(&self, raw_id: &str) -> Result<PlayerCard, LookupError> {
        let player_id = validate_player_id(raw_id)?;
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("uid", player_id.as_str())])
            .send()
            .await
            .map_err(|e| LookupError::Request {
                provider: "player".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                provider: "player".to_string(),
                status: status.as_u16(),
            });
        }

        let data: Value = response.json().await.map_err(|e| LookupError::InvalidResponse {
            provider: "player".to_string(),
            reason: e.to_string(),
        })?;
        let nickname = non_empty_str(&data, "nickname").ok_or(LookupError::InvalidResponse {
            provider: "player".to_string(),
            reason: "no nickname".to_string(),
        })?;

        Ok(PlayerCard {
            player_id,
            nickname,
            level: level(&data),
            avatar_url: non_empty_str(&data, "avatar").or_else(|| non_empty_str(&data, "avatarUrl")),
            found: true,
        })
    }

    /// Never fails: any error becomes the "Player not found" card.
    pub async fn lookup_or_placeholder(&self, raw_id: &str) -> PlayerCard {
        match self.lookup(raw_id).await {
            Ok(card) => card,
            Err(e) => {
                tracing::warn!("[PlayerLookup] {}", e);
                PlayerCard::placeholder(raw_id.trim())
            }
        }
    }
}
