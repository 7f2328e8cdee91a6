// Dashboard core
//
// Everything the touch panel needs except the terminal: role detection, the
// polling store, persisted preferences and the pure interaction models
// (reorder, tap/long-press, modal sliders).

pub mod backend;
pub mod controls;
pub mod detect;
pub mod gesture;
pub mod storage;
pub mod store;
pub mod tiles;

pub use backend::{DashboardBackend, ProxyClient};
pub use detect::{detect_entities, detect_entities_in, Role, RoleMapping};
pub use store::{spawn_polling, Phase, PollingHandle, PollingStore, StoreStatus};
pub use tiles::{move_item, TileOrder};
