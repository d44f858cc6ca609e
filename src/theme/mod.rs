pub mod layout;
pub mod mirror;
pub mod remote;

pub use layout::{
    BackgroundAnimation, BackgroundMedia, ContainerStyle, LayoutDocument, RouletteSettings,
    SpacingSettings,
};
pub use mirror::LocalMirror;
pub use remote::{fetch_layout, persist_position, update_layout};
