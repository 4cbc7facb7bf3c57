pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, resolve_config, CONFIG_ENV_VAR};
pub use tracing::init_tracing_subscriber;
pub use wiring::{wire_dependencies, AppRuntime};
