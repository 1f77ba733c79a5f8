//! Configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyduel_core::arena::ArenaTable;
use studyduel_core::model::DuelRules;
use studyduel_core::traits::ProfileStore;

use crate::file::JsonFileStore;
use crate::http::HttpStore;
use crate::memory::MemoryStore;

/// Where rank profiles are kept.
///
/// Note: Custom Debug impl masks the HTTP API key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local; profiles are lost on exit.
    Memory,
    File {
        #[serde(default = "default_profiles_path")]
        path: PathBuf,
    },
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory => f.write_str("Memory"),
            StoreConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
            StoreConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_profiles_path(),
        }
    }
}

fn default_profiles_path() -> PathBuf {
    PathBuf::from("studyduel-profiles.json")
}

/// Top-level studyduel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyduelConfig {
    /// Account used when a command is not given one.
    #[serde(default = "default_account")]
    pub default_account: String,
    /// Question-set file or directory.
    #[serde(default = "default_questions")]
    pub questions: PathBuf,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub rules: DuelRules,
    /// Arena tier table; the standard table when omitted.
    #[serde(default)]
    pub tiers: ArenaTable,
}

fn default_account() -> String {
    "player".to_string()
}
fn default_questions() -> PathBuf {
    PathBuf::from("questions")
}

impl Default for StudyduelConfig {
    fn default() -> Self {
        Self {
            default_account: default_account(),
            questions: default_questions(),
            store: StoreConfig::default(),
            rules: DuelRules::default(),
            tiers: ArenaTable::standard(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(start) = result[from..].find("${").map(|i| i + from) {
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + len + 1..]);
        from = start + value.len();
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Memory => StoreConfig::Memory,
        StoreConfig::File { path } => StoreConfig::File {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
        StoreConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => StoreConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key.as_ref().map(|k| resolve_env_vars(k)),
            timeout_secs: *timeout_secs,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studyduel.toml` in the current directory
/// 2. `~/.config/studyduel/config.toml`
///
/// Environment variable override: `STUDYDUEL_API_KEY` (HTTP store only).
pub fn load_config() -> Result<StudyduelConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudyduelConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("studyduel.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StudyduelConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudyduelConfig::default(),
    };

    config.store = resolve_store_config(&config.store);
    if let Ok(key) = std::env::var("STUDYDUEL_API_KEY") {
        if let StoreConfig::Http { api_key, .. } = &mut config.store {
            *api_key = Some(key);
        }
    }

    config
        .rules
        .validate()
        .context("invalid [rules] section")?;

    tracing::debug!(
        path = ?config_path,
        store = ?config.store,
        "configuration loaded"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studyduel"))
}

/// Create a profile store from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ProfileStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::File { path } => Ok(Arc::new(JsonFileStore::new(path))),
        StoreConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => {
            let store = HttpStore::new(base_url, api_key.clone(), *timeout_secs)
                .context("failed to create HTTP profile store")?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_STUDYDUEL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_STUDYDUEL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_STUDYDUEL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no vars here"), "no vars here");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_STUDYDUEL_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = StudyduelConfig::default();
        assert_eq!(config.default_account, "player");
        assert!(matches!(config.store, StoreConfig::File { .. }));
        assert_eq!(config.tiers.tiers().len(), 6);
        assert_eq!(config.rules, DuelRules::default());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
default_account = "ada"
questions = "decks"

[store]
type = "http"
base_url = "https://ranks.example.com/api"
api_key = "sk-test"

[rules]
attack_damage = 25
think_delay_ms = 500

[[tiers]]
name = "Novice"
min_points = 0
win_bonus = 50
lose_penalty = 5

[[tiers]]
name = "Expert"
min_points = 300
win_bonus = 20
lose_penalty = 30
"#;
        let config: StudyduelConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_account, "ada");
        assert_eq!(config.questions, PathBuf::from("decks"));
        assert!(matches!(config.store, StoreConfig::Http { .. }));
        assert_eq!(config.rules.attack_damage, 25);
        assert_eq!(config.rules.king_hp_start, 100);
        assert_eq!(config.tiers.tier_for(310).name, "Expert");
    }

    #[test]
    fn invalid_tier_table_rejected() {
        let toml_str = r#"
[[tiers]]
name = "Silver"
min_points = 500
win_bonus = 10
lose_penalty = 10
"#;
        assert!(toml::from_str::<StudyduelConfig>(toml_str).is_err());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyduel.toml");
        std::fs::write(
            &path,
            "[store]\ntype = \"memory\"\n\n[rules]\nminor_reward = 0\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert!(matches!(config.store, StoreConfig::Memory));
        assert_eq!(config.rules.minor_reward, 0);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn invalid_rules_fail_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyduel.toml");
        std::fs::write(&path, "[rules]\nenergy_start = 10\nenergy_cap = 5\n").unwrap();

        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("energy_cap"));
    }

    #[test]
    fn debug_masks_api_key() {
        let config = StoreConfig::Http {
            base_url: "https://ranks.example.com".into(),
            api_key: Some("sk-very-secret".into()),
            timeout_secs: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("***"));
    }

    #[tokio::test]
    async fn create_store_builds_each_adapter() {
        let memory = create_store(&StoreConfig::Memory).unwrap();
        assert_eq!(memory.name(), "memory");

        let dir = tempfile::tempdir().unwrap();
        let file = create_store(&StoreConfig::File {
            path: dir.path().join("profiles.json"),
        })
        .unwrap();
        file.create_profile("ada").await.unwrap();
        assert_eq!(file.get_points("ada").await.unwrap(), 0);

        let http = create_store(&StoreConfig::Http {
            base_url: "http://localhost:8080".into(),
            api_key: None,
            timeout_secs: Some(1),
        })
        .unwrap();
        assert_eq!(http.name(), "http");

        assert!(create_store(&StoreConfig::Http {
            base_url: "::nope::".into(),
            api_key: None,
            timeout_secs: None,
        })
        .is_err());
    }
}
