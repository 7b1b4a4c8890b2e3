//! Domain models for Quarry configuration

mod settings;
mod system;
mod types;

pub use settings::Settings;
pub use system::SystemConfig;
pub use types::{CacheConfig, LifecycleConfig};
