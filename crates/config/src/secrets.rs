//! Secrets file and API-key resolution.
//!
//! The secrets file is a flat TOML table of `NAME = "value"` pairs, kept
//! apart from `config.toml` so the config can be shared without leaking
//! keys. Resolution order for a key name: secrets file, then environment.

use std::collections::HashMap;
use std::path::Path;

/// Key/value secrets loaded from disk.
#[derive(Clone, Default)]
pub struct SecretStore {
    values: HashMap<String, String>,
}

impl SecretStore {
    /// Load secrets from `path`. A missing or unparseable file is an empty
    /// store; the caller falls back to the environment.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => {
                tracing::debug!("No secrets file at {}", path.display());
                return Self::default();
            }
        };

        match toml::from_str::<HashMap<String, toml::Value>>(&content) {
            Ok(table) => Self {
                values: table
                    .into_iter()
                    .filter_map(|(k, v)| match v {
                        toml::Value::String(s) => Some((k, s)),
                        _ => None,
                    })
                    .collect(),
            },
            Err(e) => {
                tracing::warn!("Ignoring unparseable secrets file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|s| s.as_str())
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("SecretStore").field("keys", &keys).finish()
    }
}

/// Resolve `key_name` from the secrets store, then from `env`.
///
/// Empty values count as absent.
pub fn resolve_api_key<F>(secrets: &SecretStore, key_name: &str, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    secrets
        .get(key_name)
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or_else(|| env(key_name).filter(|k| !k.trim().is_empty()))
}
