use crate::schema::McpkitConfig;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Jsonc,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "jsonc" => Some(Self::Jsonc),
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> Result<McpkitConfig> {
        match self {
            Self::Jsonc => json5::from_str(content).context("Failed to parse JSONC"),
            Self::Json => serde_json::from_str(content).context("Failed to parse JSON"),
            Self::Yaml => serde_yaml_ng::from_str(content).context("Failed to parse YAML"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: McpkitConfig,
    pub path: PathBuf,
    pub format: ConfigFormat,
}

/// File names tried in each search directory, highest priority first
pub const CONFIG_CANDIDATES: &[&str] = &[
    "mcpkit.jsonc",
    "mcpkit.json",
    "mcpkit.yml",
    "mcpkit.yaml",
    ".mcpkit.jsonc",
    ".mcpkit.json",
    ".mcpkit.yml",
    ".mcpkit.yaml",
];

pub fn load_config(config_path: Option<&Path>) -> Result<McpkitConfig> {
    resolve_config(config_path).map(|r| r.config)
}

pub fn resolve_config(config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(find_config_file)
        .ok_or_else(|| {
            anyhow!(
                "No configuration file found (looked for {} in the current directory and ~/.config/mcpkit)",
                CONFIG_CANDIDATES.join(", ")
            )
        })?;

    load_config_from_file(&path)
}

pub fn load_config_from_file(path: &Path) -> Result<ResolvedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| anyhow!("Unknown config format for: {}", path.display()))?;

    let mut config = format
        .parse(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    if !config.target.is_object() {
        bail!(
            "Invalid config file: {}: 'target' must be a mapping",
            path.display()
        );
    }
    expand_env_vars(&mut config.target);

    Ok(ResolvedConfig {
        config,
        path: path.to_path_buf(),
        format,
    })
}

/// Search the working directory, then `~/.config/mcpkit`
pub fn find_config_file() -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    let global = dirs::home_dir().map(|home| home.join(".config").join("mcpkit"));
    find_config_file_in(&cwd, global.as_deref())
}

pub fn find_config_file_in(dir: &Path, global_dir: Option<&Path>) -> Option<PathBuf> {
    std::iter::once(dir)
        .chain(global_dir)
        .flat_map(|base| CONFIG_CANDIDATES.iter().map(move |name| base.join(name)))
        .find(|path| path.is_file())
}

/// Expand environment references in every string of a target record, keys excluded
fn expand_env_vars(value: &mut Value) {
    match value {
        Value::String(s) => *s = expand_env_string(s),
        Value::Array(items) => items.iter_mut().for_each(expand_env_vars),
        Value::Object(map) => map.values_mut().for_each(expand_env_vars),
        _ => {}
    }
}

fn expand_env_string(s: &str) -> String {
    expand_with(s, |name| env::var(name).ok())
}

/// Replace `$VAR` and `${VAR}` using `lookup`; unresolved references are kept as written
fn expand_with(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find('$') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let (name, reference_len) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 3),
                None => ("", 1),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end + 1)
        };

        let reference = &rest[start..start + reference_len];
        let resolvable = !name.is_empty() && !name.contains(['=', '\0']);
        match resolvable.then(|| lookup(name)).flatten() {
            Some(value) => result.push_str(&value),
            None => result.push_str(reference),
        }
        rest = &rest[start + reference_len..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "TENANT" => Some("acme".to_string()),
            "REGISTRY_HOST" => Some("registry.internal".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_with_braces() {
        assert_eq!(
            expand_with("https://${REGISTRY_HOST}/resolve", lookup),
            "https://registry.internal/resolve"
        );
    }

    #[test]
    fn test_expand_without_braces() {
        assert_eq!(expand_with("tenant-$TENANT", lookup), "tenant-acme");
        assert_eq!(expand_with("$TENANT/eu", lookup), "acme/eu");
    }

    #[test]
    fn test_expand_keeps_unresolved_references() {
        assert_eq!(expand_with("${NOPE}-$NOPE", lookup), "${NOPE}-$NOPE");
        assert_eq!(expand_with("cost: $5 and $", lookup), "cost: $5 and $");
        assert_eq!(expand_with("${TENANT", lookup), "${TENANT");
        assert_eq!(expand_with("${}", lookup), "${}");
    }

    #[test]
    fn test_expand_without_references() {
        assert_eq!(expand_with("plain text", lookup), "plain text");
        assert_eq!(expand_with("", lookup), "");
    }

    #[test]
    fn test_expand_env_string_reads_process_env() {
        env::set_var("MCPKIT_TEST_EXPAND", "from-env");
        assert_eq!(
            expand_env_string("value=${MCPKIT_TEST_EXPAND}"),
            "value=from-env"
        );
    }

    #[test]
    fn test_expand_env_vars_walks_nested_values() {
        env::set_var("MCPKIT_TEST_NESTED", "eu-west-1");
        let mut target = json!({
            "type": "registry",
            "context": {"region": "$MCPKIT_TEST_NESTED", "$MCPKIT_TEST_NESTED": 1},
            "args": ["--region", "${MCPKIT_TEST_NESTED}"],
            "timeout_secs": 5
        });
        expand_env_vars(&mut target);

        assert_eq!(target["context"]["region"], "eu-west-1");
        assert_eq!(target["context"]["$MCPKIT_TEST_NESTED"], 1);
        assert_eq!(target["args"][1], "eu-west-1");
        assert_eq!(target["timeout_secs"], 5);
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("mcpkit.jsonc")),
            Some(ConfigFormat::Jsonc)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("mcpkit.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("mcpkit.yml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("mcpkit.yaml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("mcpkit.toml")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("mcpkit")), None);
    }

    #[test]
    fn test_load_jsonc_with_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcpkit.jsonc");
        fs::write(
            &path,
            r#"{
  // resolved at startup
  "target": {
    "type": "registry",
    "name": "dynamic",
    "registry_url": "http://localhost:8080/resolve", /* local */
    "context": {"tenant": "acme"},
  },
}"#,
        )
        .unwrap();

        let resolved = load_config_from_file(&path).unwrap();
        assert_eq!(resolved.format, ConfigFormat::Jsonc);
        assert_eq!(resolved.config.target_kind(), Some("registry"));
        assert_eq!(resolved.config.target_name(), Some("dynamic"));
        assert_eq!(resolved.config.telemetry.level, "warn");
    }

    #[test]
    fn test_load_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcpkit.json");
        fs::write(
            &path,
            r#"{"target": {"type": "static", "name": "local"}, "telemetry": {"level": "debug", "json_output": true}}"#,
        )
        .unwrap();

        let resolved = load_config_from_file(&path).unwrap();
        assert_eq!(resolved.format, ConfigFormat::Json);
        assert_eq!(resolved.path, path);
        assert_eq!(resolved.config.telemetry.level, "debug");
        assert!(resolved.config.telemetry.json_output);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcpkit.yaml");
        fs::write(
            &path,
            r#"
target:
  type: static
  name: helpdesk
  tools:
    - name: lookup_ticket
  prompts:
    - name: welcome
  prompt_engine:
    type: interpolation
    prompts:
      welcome: "Hello {customer_name}!"
"#,
        )
        .unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.target_name(), Some("helpdesk"));
        assert_eq!(
            config.target["prompt_engine"]["prompts"]["welcome"],
            "Hello {customer_name}!"
        );
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcpkit.json");
        fs::write(&path, r#"{"telemetry": {"level": "info"}}"#).unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("target"), "{message}");
        assert!(message.contains("mcpkit.json"), "{message}");
    }

    #[test]
    fn test_non_mapping_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcpkit.yml");
        fs::write(&path, "target: registry\n").unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("must be a mapping"), "{err}");
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcpkit.toml");
        fs::write(&path, "target = 1\n").unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown config format"), "{err}");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(dir.path().join("absent.json").as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"), "{err}");
    }

    #[test]
    fn test_config_priority_order() {
        assert_eq!(CONFIG_CANDIDATES[0], "mcpkit.jsonc");
        assert_eq!(CONFIG_CANDIDATES[3], "mcpkit.yaml");
        assert_eq!(CONFIG_CANDIDATES[4], ".mcpkit.jsonc");
        assert_eq!(CONFIG_CANDIDATES.len(), 8);
    }

    #[test]
    fn test_find_prefers_earlier_candidates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".mcpkit.json"), "{}").unwrap();
        fs::write(dir.path().join("mcpkit.yml"), "").unwrap();

        assert_eq!(
            find_config_file_in(dir.path(), None),
            Some(dir.path().join("mcpkit.yml"))
        );
    }

    #[test]
    fn test_find_falls_back_to_global_dir() {
        let local = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        assert_eq!(find_config_file_in(local.path(), Some(global.path())), None);

        fs::write(global.path().join("mcpkit.jsonc"), "{}").unwrap();
        assert_eq!(
            find_config_file_in(local.path(), Some(global.path())),
            Some(global.path().join("mcpkit.jsonc"))
        );

        fs::write(local.path().join(".mcpkit.yaml"), "").unwrap();
        assert_eq!(
            find_config_file_in(local.path(), Some(global.path())),
            Some(local.path().join(".mcpkit.yaml"))
        );
    }

    #[test]
    fn test_directories_named_like_candidates_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("mcpkit.json")).unwrap();
        assert_eq!(find_config_file_in(dir.path(), None), None);
    }
}
