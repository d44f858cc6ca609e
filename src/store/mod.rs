pub mod firebase;
pub mod interface;
pub mod memory;
pub mod tree;

pub use firebase::FirebaseStore;
pub use interface::{StoreError, ThemeStore, ValueStream};
pub use memory::InMemoryStore;

// ── Well-known paths ───────────────────────────────────

pub const LAYOUT_PATH: &str = "settings/layout";
pub const SELECTED_ITEMS_PATH: &str = "analytics/selectedItems";
pub const NEW_DEVICES_PATH: &str = "analytics/newDevices";
pub const NEW_DEVICES_COUNT_PATH: &str = "analytics/newDevices/count";
pub const NEW_DEVICES_UPDATED_PATH: &str = "analytics/newDevices/lastUpdate";
pub const ADMIN_LOGS_PATH: &str = "admin_logs";
pub const DEVICES_PATH: &str = "devices";

pub fn selected_item_path(index: usize) -> String {
    format!("{}/{}", SELECTED_ITEMS_PATH, index)
}

pub fn device_path(device_id: &str) -> String {
    format!("{}/{}", DEVICES_PATH, device_id)
}
