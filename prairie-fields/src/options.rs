//! Engine options, loadable with Figment.
//!
//! Precedence, later sources overriding earlier ones:
//! 1. Default values
//! 2. The options file (format chosen by extension: yaml, yml, json, toml)
//! 3. Environment variables with the `PRAIRIE_` prefix

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FieldsError, Result};

/// Record keys probed, in order, when no identity key is given.
pub const DEFAULT_IDENTITY_KEYS: [&str; 4] = ["id", "_id", "path", "pk"];

/// Specification key that requests directory decomposition.
pub const DEFAULT_DIR_DIRECTIVE: &str = "dir_i";

/// Environment prefix for option overrides.
pub const ENV_PREFIX: &str = "PRAIRIE_";

/// Options controlling how specifications are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowOptions {
    /// Keys probed for the identity key, first truthy one wins.
    pub identity_keys: Vec<String>,
    /// Also honor the `value` sub-argument convention, not only `string`.
    pub value_sentinel: bool,
    /// Name of the directory decomposition directive.
    pub dir_directive: String,
}

impl Default for GrowOptions {
    fn default() -> Self {
        Self {
            identity_keys: DEFAULT_IDENTITY_KEYS.iter().map(|k| k.to_string()).collect(),
            value_sentinel: true,
            dir_directive: DEFAULT_DIR_DIRECTIVE.to_string(),
        }
    }
}

impl GrowOptions {
    /// Options that only honor the `string` sub-argument convention.
    pub fn string_sentinel_only() -> Self {
        Self {
            value_sentinel: false,
            ..Self::default()
        }
    }

    /// Defaults overridden by `PRAIRIE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let options: GrowOptions = Self::base_figment().merge(env_provider()).extract()?;
        debug!(?options, "loaded grow options from environment");
        Ok(options)
    }

    /// Defaults, then the file at `path`, then `PRAIRIE_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FieldsError::OptionsNotFound {
                path: path.to_path_buf(),
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let figment = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::base_figment().merge(Yaml::file(path)),
            Some("json") => Self::base_figment().merge(Json::file(path)),
            Some("toml") => Self::base_figment().merge(Toml::file(path)),
            _ => {
                return Err(FieldsError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let options: GrowOptions = figment.merge(env_provider()).extract()?;
        debug!(path = %path.display(), ?options, "loaded grow options");
        Ok(options)
    }

    fn base_figment() -> Figment {
        Figment::new().merge(Serialized::defaults(GrowOptions::default()))
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into())
}
