use mcpkit_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Main mcpkit configuration
///
/// Configuration is loaded from (in priority order):
/// 1. `mcpkit.jsonc` - JSON with comments
/// 2. `mcpkit.json` - Standard JSON
/// 3. `mcpkit.yml` / `mcpkit.yaml` - YAML format
///
/// Also checks hidden variants (`.mcpkit.*`) and `~/.config/mcpkit/` for global config.
///
/// # Example
///
/// ```yaml
/// target:
///   type: registry
///   name: dynamic
///   registry_url: https://registry.internal/resolve
///   context:
///     tenant: ${TENANT_ID}
/// telemetry:
///   level: info
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpkitConfig {
    /// Target configuration record, handed to the target factory as is
    pub target: Value,

    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl McpkitConfig {
    /// Name of the configured target, if the record has one
    pub fn target_name(&self) -> Option<&str> {
        self.target.get("name").and_then(Value::as_str)
    }

    /// Discriminator of the configured target, if the record has one
    pub fn target_kind(&self) -> Option<&str> {
        self.target.get("type").and_then(Value::as_str)
    }
}
