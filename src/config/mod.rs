//! Frame configuration.
//!
//! Settings are read from a TOML or YAML file. Without one, built-in
//! defaults describe a 720×1280 portrait frame with one primary and six side
//! slots, rotating every five seconds.

mod loader;
mod path;
mod schema;

pub use loader::{
    ConfigFormat, LoadedConfig, load_config, load_config_from_str, load_or_default, save_config,
};
pub use path::{APP_DIR, PathResolver, default_config_path, home_dir, resolve_path};
pub use schema::{CanvasConfig, DEFAULT_INTERVAL_MS, DEFAULT_SLOTS, FrameConfig};
