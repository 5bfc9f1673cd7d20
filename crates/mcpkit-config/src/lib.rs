pub mod loader;
pub mod schema;

pub use loader::{
    find_config_file, find_config_file_in, load_config, load_config_from_file, resolve_config,
    ConfigFormat, ResolvedConfig, CONFIG_CANDIDATES,
};
pub use schema::McpkitConfig;
