//! Read-modify-write helpers for the theme document in the store.

use super::layout::LayoutDocument;
use crate::store::{StoreError, ThemeStore, LAYOUT_PATH};
use crate::widget::positioning::PositionCommit;

/// Fetch and decode the theme document. `Ok(None)` when nothing is stored.
pub async fn fetch_layout(store: &dyn ThemeStore) -> Result<Option<LayoutDocument>, StoreError> {
    match store.get(LAYOUT_PATH).await? {
        Some(raw) => serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| StoreError::Payload(e.to_string())),
        None => Ok(None),
    }
}

/// Load the current document (or an empty one), apply `edit`, stamp
/// `lastUpdate` with the server clock and write the whole document back.
pub async fn update_layout<F>(store: &dyn ThemeStore, edit: F) -> Result<LayoutDocument, StoreError>
where
    F: FnOnce(&mut LayoutDocument),
{
    let mut layout = fetch_layout(store).await?.unwrap_or_default();
    edit(&mut layout);
    layout.last_update = Some(store.server_timestamp());

    let raw = serde_json::to_value(&layout).map_err(|e| StoreError::Payload(e.to_string()))?;
    store.set(LAYOUT_PATH, raw).await?;
    Ok(layout)
}

/// Persist a finished drag into `roulette.customPositions[index]`.
pub async fn persist_position(
    store: &dyn ThemeStore,
    commit: PositionCommit,
) -> Result<LayoutDocument, StoreError> {
    update_layout(store, |layout| {
        layout.set_custom_position(commit.index, commit.position)
    })
    .await
}
