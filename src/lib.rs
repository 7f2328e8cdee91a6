// Entity records and service call descriptors
pub mod entity;

// Webhook signature verification
pub mod signature;

// Upstream automation hub client
pub mod upstream;

// HTTP proxy API (states, service calls, webhook, app shell)
pub mod api;

// File and environment configuration
pub mod config;

// Dashboard core: role detection, polling store, tiles, gestures, modals
pub mod dashboard;

pub use entity::{EntityRecord, ServiceCall};
